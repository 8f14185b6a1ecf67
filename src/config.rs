use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::normalize::DateFormatter;

pub const DEFAULT_API_URL: &str = "https://app.ticketmaster.com/discovery/v2";
pub const STORE_FILE: &str = "store.json";
pub const LOG_FILE: &str = "event-explorer.log";

/// Runtime settings, validated once at startup and passed around by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    api_key: Option<String>,
    pub timeout_secs: u64,
    pub data_dir: PathBuf,
    pub page_size: u32,
    pub date_format: String,
    pub log_level: String,
}

impl Config {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        timeout_secs: u64,
        data_dir: Option<PathBuf>,
        page_size: u32,
        date_format: String,
        log_level: String,
    ) -> Result<Self> {
        if page_size == 0 || page_size > 200 {
            bail!("page size must be between 1 and 200, got {}", page_size);
        }
        if timeout_secs == 0 {
            bail!("timeout must be at least one second");
        }

        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir().context("Could not determine a data directory; pass --data-dir")?,
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
            timeout_secs,
            data_dir,
            page_size,
            date_format,
            log_level,
        })
    }

    /// The API key, or an error explaining how to provide one.
    pub fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) => Ok(key),
            None => bail!("No Ticketmaster API key configured; set TICKETMASTER_API_KEY or pass --api-key"),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    pub fn date_formatter(&self) -> DateFormatter {
        DateFormatter::new(self.date_format.clone())
    }
}

fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("event-explorer"))
}
