use std::{path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const ENV_HOST: &str = "QBITTORRENT_HOST";
pub const ENV_USERNAME: &str = "QBITTORRENT_USERNAME";
pub const ENV_PASSWORD: &str = "QBITTORRENT_PASSWORD";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub qb: QbConfig,
    /// Timeout of every request against the WebUI, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_s: u64,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QbConfig {
    /// WebUI address. Example: `http://localhost:8080`
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Polling of plugin searches started by `search_torrents`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Stop polling a still running search once results exist after this many polls.
    #[serde(default = "default_settle_polls")]
    pub settle_polls: u32,
}

fn default_timeout() -> u64 {
    10
}

fn default_max_polls() -> u32 {
    10
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_settle_polls() -> u32 {
    3
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_polls: default_max_polls(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_polls: default_settle_polls(),
        }
    }
}

impl SearchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Reads the toml file at `path` if it exists, then applies the
    /// `QBITTORRENT_*` environment variables on top.
    pub async fn load(path: &Path) -> Result<Self> {
        let exists = tokio::fs::try_exists(path)
            .await
            .with_context(|| format!("Cannot access config path {}", path.display()))?;
        let config = if exists {
            let config_str = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Cannot read config path {}", path.display()))?;
            Self::from_toml(&config_str)?
        } else {
            info!(
                "config file {} not found, using environment only",
                path.display()
            );
            Self::from_qb(QbConfig::default())
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str::<Config>(s).context("Config file corrupted")
    }

    pub fn from_qb(qb: QbConfig) -> Self {
        Self {
            qb,
            timeout_s: default_timeout(),
            search: SearchConfig::default(),
        }
    }

    /// Overrides the WebUI settings with whatever `env` yields, then validates.
    pub fn with_env(mut self, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(host) = env(ENV_HOST) {
            self.qb.base_url = host;
        }
        if let Some(username) = env(ENV_USERNAME) {
            self.qb.username = username;
        }
        if let Some(password) = env(ENV_PASSWORD) {
            self.qb.password = password;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&mut self) -> Result<()> {
        let base_url = self.qb.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            bail!("qBittorrent host not configured, set qb.base_url or {ENV_HOST}");
        }
        let parsed = url::Url::parse(base_url)
            .with_context(|| format!("invalid qBittorrent host {base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("qBittorrent host must be http or https, got {}", parsed.scheme());
        }
        self.qb.base_url = base_url.to_string();
        if self.timeout_s == 0 {
            bail!("timeout_s must be positive");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }
}
