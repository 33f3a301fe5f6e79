use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use feed_logging::feed_info;
use serde::{Deserialize, Serialize};
use threadfeed_core::RetryPolicy;
use threadfeed_engine::{FetchSettings, ListingSelectors};

use crate::logging::LogDestination;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILENAME: &str = "threadfeed.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Location of the persistent ignore list.
    pub store_path: PathBuf,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_page_bytes: u64,
    /// `None` retries a failing page forever.
    pub max_consecutive_failures: Option<u32>,
    pub selectors: SelectorConfig,
    pub log_destination: LogDestination,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            store_path: PathBuf::from("threadfeed_data").join("ignored.ron"),
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            redirect_limit: fetch.redirect_limit,
            max_page_bytes: fetch.max_bytes,
            max_consecutive_failures: RetryPolicy::default().max_consecutive_failures,
            selectors: SelectorConfig::default(),
            log_destination: LogDestination::Terminal,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub row: String,
    pub topic: String,
    pub title_link: String,
    pub next_page: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        let defaults = ListingSelectors::default();
        Self {
            row: defaults.row,
            topic: defaults.topic,
            title_link: defaults.title_link,
            next_page: defaults.next_page,
        }
    }
}

impl AppConfig {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_page_bytes,
            ..FetchSettings::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_consecutive_failures: self.max_consecutive_failures,
        }
    }

    pub fn listing_selectors(&self) -> ListingSelectors {
        ListingSelectors {
            row: self.selectors.row.clone(),
            topic: self.selectors.topic.clone(),
            title_link: self.selectors.title_link.clone(),
            next_page: self.selectors.next_page.clone(),
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Load configuration. An explicit path must exist; the default file is
/// optional and its absence yields defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILENAME), false),
    };

    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
            return Ok(AppConfig::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.clone(),
        message: err.to_string(),
    })?;
    feed_info!("Loaded config from {:?}", path);
    Ok(config)
}
