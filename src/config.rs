use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::utils;

const DEFAULT_EVENTS_URL: &str = "https://615cb23714593.site123.me/events";
const DEFAULT_MEDIA_BASE_URL: &str = "/media";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub events_url: String,
    pub media_base_url: String,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            events_url: DEFAULT_EVENTS_URL.to_string(),
            media_base_url: DEFAULT_MEDIA_BASE_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Load the config file from the data directory, falling back to
    /// defaults when it is missing or unreadable.
    pub fn load_default() -> Self {
        Self::load_from(&utils::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match read_config(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to read config {:?}: {err}", path);
                AppConfig::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                return Err(err.to_string());
            }
        }
        let contents = serde_json::to_string_pretty(self).map_err(|err| err.to_string())?;
        fs::write(path, contents).map_err(|err| err.to_string())
    }
}

fn read_config(path: &Path) -> Result<AppConfig, String> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| err.to_string())?;
    serde_json::from_str(&contents).map_err(|err| err.to_string())
}
