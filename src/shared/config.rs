//! Application configuration. API endpoints, refresh tuning, paths.

use serde::Deserialize;

/// Default minutes between scheduled refresh runs.
pub const DEFAULT_REFRESH_INTERVAL_MINUTES: u64 = 30;

/// Default number of users refreshed concurrently per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Region API base URL. Read from WOW_SYNC_API_BASE_URL.
    pub api_base_url: Option<String>,

    /// Profile namespace matching the region. Read from WOW_SYNC_API_NAMESPACE.
    #[serde(default)]
    pub api_namespace: Option<String>,

    /// Directory holding the SQLite database. Read from WOW_SYNC_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Minutes between scheduled refresh runs. Read from WOW_SYNC_REFRESH_INTERVAL_MINUTES.
    #[serde(default)]
    pub refresh_interval_minutes: Option<u64>,

    /// Users refreshed concurrently per batch. Read from WOW_SYNC_BATCH_SIZE.
    #[serde(default)]
    pub batch_size: Option<usize>,

    /// Delay in ms between batches (rate limiting against the API). Read from WOW_SYNC_BATCH_DELAY_MS.
    #[serde(default)]
    pub batch_delay_ms: Option<u64>,

    /// Seconds between weekly-reset detection checks. Read from WOW_SYNC_RESET_CHECK_SECS.
    #[serde(default)]
    pub reset_check_secs: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("WOW_SYNC"));
        if let Ok(path) = std::env::var("WOW_SYNC_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Region API base URL. Defaults to the US region.
    pub fn api_base_url_or_default(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| "https://us.api.blizzard.com".to_string())
    }

    /// Profile namespace. Defaults to profile-us.
    pub fn api_namespace_or_default(&self) -> String {
        self.api_namespace
            .clone()
            .unwrap_or_else(|| "profile-us".to_string())
    }

    /// Data directory. Defaults to ./data.
    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    /// Minutes between refresh runs. Defaults to 30 if unset or invalid.
    pub fn refresh_interval_minutes_or_default(&self) -> u64 {
        self.refresh_interval_minutes
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MINUTES)
    }

    /// Users per batch. Defaults to 5; zero is treated as 1 downstream.
    pub fn batch_size_or_default(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// Delay between batches in milliseconds. Defaults to 1000.
    pub fn batch_delay_ms_or_default(&self) -> u64 {
        self.batch_delay_ms.unwrap_or(1000)
    }

    /// Reset detection interval in seconds. Defaults to hourly.
    pub fn reset_check_secs_or_default(&self) -> u64 {
        self.reset_check_secs.unwrap_or(3600)
    }
}
