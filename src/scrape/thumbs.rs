use reqwest::blocking::Client;

use super::base;
use crate::media::MediaStore;

/// Resolve a candidate image URL to a stored media URL, reusing an
/// existing asset when one with the same basename is already in the
/// library. Returns the stored URL (or "") plus an optional warning for
/// the run summary.
pub fn resolve(
    client: &Client,
    media: &MediaStore,
    candidate_url: &str,
    event_title: &str,
) -> (String, Option<String>) {
    if candidate_url.is_empty() {
        return (String::new(), None);
    }

    let basename = file_basename(candidate_url);
    if !basename.is_empty() {
        match media.find_by_filename_like(&basename) {
            Ok(existing) if !existing.is_empty() => {
                return (media.canonical_url(&existing[0]), None);
            }
            Ok(_) => {}
            Err(err) => {
                // Lookup trouble degrades to a fresh fetch.
                eprintln!("media lookup failed for {basename}: {err}");
            }
        }
    }

    let bytes = match base::fetch_bytes(client, candidate_url) {
        Ok(bytes) => bytes,
        Err(_) => {
            return (
                String::new(),
                Some(format!("Failed to download image for event '{event_title}'.")),
            )
        }
    };

    match media.store_from_bytes(&basename, &bytes) {
        Ok(asset) => (media.canonical_url(&asset), None),
        Err(err) => {
            eprintln!("media store failed for {basename}: {err}");
            (
                String::new(),
                Some(format!("Failed to store image for event '{event_title}'.")),
            )
        }
    }
}

/// Last path segment of the URL, query and fragment stripped.
fn file_basename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        return parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or_default()
            .to_string();
    }
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
        .to_string()
}
