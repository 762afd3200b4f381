use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::utils;

/// Filesystem-backed media library: a flat directory of image files plus
/// the base URL they are served under.
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub filename: String,
    pub path: PathBuf,
}

impl MediaStore {
    pub fn open_default(base_url: &str) -> Result<Self> {
        Self::open(utils::media_root(), base_url)
    }

    pub fn open(root: PathBuf, base_url: &str) -> Result<Self> {
        fs::create_dir_all(&root)
            .with_context(|| format!("unable to create media root {:?}", root))?;
        Ok(Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// All stored assets whose filename contains `name`. An empty probe
    /// matches nothing rather than everything.
    pub fn find_by_filename_like(&self, name: &str) -> Result<Vec<Asset>> {
        let mut out = Vec::new();
        if name.is_empty() {
            return Ok(out);
        }
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("unable to read media root {:?}", self.root))?;
        for entry in entries {
            let entry = entry.context("unable to read media entry")?;
            if !entry.file_type().context("media entry type")?.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().to_string();
            if filename.contains(name) {
                out.push(Asset {
                    filename,
                    path: entry.path(),
                });
            }
        }
        out.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(out)
    }

    /// Register a new asset. An existing file with the same name is never
    /// overwritten; the new file gets a `-1`, `-2`, ... suffix instead.
    pub fn store_from_bytes(&self, name: &str, bytes: &[u8]) -> Result<Asset> {
        let safe = sanitize_filename(name);
        if safe.is_empty() {
            bail!("media filename {name:?} is empty after sanitizing");
        }
        let filename = self.unique_filename(&safe);
        let path = self.root.join(&filename);
        fs::write(&path, bytes)
            .with_context(|| format!("unable to write media file {:?}", path))?;
        Ok(Asset { filename, path })
    }

    pub fn canonical_url(&self, asset: &Asset) -> String {
        format!("{}/{}", self.base_url, asset.filename)
    }

    fn unique_filename(&self, name: &str) -> String {
        if !self.root.join(name).exists() {
            return name.to_string();
        }
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (name, None),
        };
        let mut suffix = 1u32;
        loop {
            let candidate = match ext {
                Some(ext) => format!("{stem}-{suffix}.{ext}"),
                None => format!("{stem}-{suffix}"),
            };
            if !self.root.join(&candidate).exists() {
                return candidate;
            }
            suffix += 1;
        }
    }
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '-'
            }
        })
        .collect();
    cleaned.trim_matches(|ch| ch == '-' || ch == '.').to_string()
}
