use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const CBR_DAILY_URL: &str = "https://www.cbr.ru/scripts/XML_daily.asp";

fn default_feed_url() -> String {
    CBR_DAILY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_targets() -> Vec<String> {
    ["RUB", "USD", "KZT", "THB"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            url: default_feed_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            feed: FeedConfig::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            targets: default_targets(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or the defaults if no
    /// config file exists there. Environment overrides are applied on top.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::read(&config_path)?
        } else {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };
        config.finish()
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ru", "cbrate", "cbrate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::read(path.as_ref())?.finish()
    }

    fn read(path: &std::path::Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn finish(mut self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())?;
        self.validate()?;
        Ok(self)
    }

    /// Overrides fields from `CBRATE_FEED_URL`, `CBRATE_CACHE_TTL_SECS` and
    /// `CBRATE_TARGETS` (comma separated) as returned by `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("CBRATE_FEED_URL") {
            self.feed.url = url;
        }
        if let Some(ttl) = lookup("CBRATE_CACHE_TTL_SECS") {
            self.cache_ttl_secs = ttl
                .trim()
                .parse()
                .with_context(|| format!("Invalid CBRATE_CACHE_TTL_SECS: {ttl}"))?;
        }
        if let Some(targets) = lookup("CBRATE_TARGETS") {
            self.targets = targets
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        for target in &mut self.targets {
            *target = target.trim().to_uppercase();
        }
        if self.targets.is_empty() {
            bail!("At least one target currency must be configured");
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.feed.timeout_secs)
    }
}
