use std::env;
use std::time::Duration;

use log::LevelFilter;

use crate::catalog::{CatalogConfig, DEFAULT_CATALOG_API_URL};
use crate::matcher::MatchConfig;
use crate::uploader::{UploadConfig, MAX_BATCH_SIZE};

pub struct Config {
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub search_stagger_ms: u64,
    pub upload_batch_size: usize,
    pub upload_delay_ms: u64,
    pub show_progress: bool,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|value| value.trim().parse().ok());

        Self {
            api_url: lookup("CATALOG_API_URL").unwrap_or_else(|| DEFAULT_CATALOG_API_URL.to_string()),
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS").unwrap_or(30),
            search_stagger_ms: parsed("SEARCH_STAGGER_MS").unwrap_or(100),
            upload_batch_size: lookup("UPLOAD_BATCH_SIZE")
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(MAX_BATCH_SIZE)
                .clamp(1, MAX_BATCH_SIZE),
            upload_delay_ms: parsed("UPLOAD_DELAY_MS").unwrap_or(100),
            show_progress: lookup("SHOW_PROGRESS")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(true),
            log_level: lookup("LOG_LEVEL")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(LevelFilter::Info),
        }
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            api_url: self.api_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            search_stagger: Duration::from_millis(self.search_stagger_ms),
            show_progress: self.show_progress,
        }
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            batch_size: self.upload_batch_size,
            batch_delay: Duration::from_millis(self.upload_delay_ms),
        }
    }
}
