//! Application configuration.
//!
//! Built once at startup from `default.toml` (or `--config`) merged with
//! `BLOGCOMMENTS_`-prefixed environment variables, then handed to each component.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
    time::Duration,
};

use anyhow::Context as _;
use figment::{providers::Format as _, Figment};
use serde::Deserialize;
use url::Url;

/// Environment variable prefix. Nested keys use `__`, e.g. `BLOGCOMMENTS_RATE_LIMIT__MAX_EVENTS`.
pub const ENV_PREFIX: &str = "BLOGCOMMENTS_";

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_address")]
    pub listen_address: SocketAddr,
    /// SQLite connection URL.
    #[serde(default = "default_db")]
    pub db: String,
    /// Static bearer token accepted for admin operations.
    pub admin_key: String,
    /// Secret salt mixed into client IP hashes.
    pub ip_salt: String,
    /// Fallback CRM webhook used when a location has no registration of its own.
    #[serde(default)]
    pub webhook_url: Option<Url>,
    /// Timeout for a single outbound webhook request.
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub metrics: Option<MetricConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RateLimitConfig {
    /// Submissions allowed per IP hash inside one window.
    #[serde(default = "default_max_events")]
    pub max_events: u32,
    /// Trailing window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum MetricConfig {
    PrometheusPush(PrometheusConfig),
}

#[derive(Deserialize, Debug, Clone)]
pub struct PrometheusConfig {
    /// The Prometheus push gateway.
    pub url: String,
}

fn default_listen_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000)
}

fn default_db() -> String {
    "sqlite://data/comments.db".to_owned()
}

const fn default_webhook_timeout_secs() -> u64 {
    10
}

const fn default_max_events() -> u32 {
    3
}

const fn default_window_secs() -> u64 {
    15 * 60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            window_secs: default_window_secs(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl AppConfig {
    /// Read and parse the configuration file, with the environment taking precedence.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Self::extract(
            Figment::new()
                .admerge(figment::providers::Toml::file(path))
                .admerge(figment::providers::Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    /// Extract and check a configuration. Secrets must not be blank.
    fn extract(figment: Figment) -> anyhow::Result<Self> {
        let config: Self = figment
            .extract()
            .context("failed to load configuration")?;

        anyhow::ensure!(!config.admin_key.trim().is_empty(), "admin_key must not be empty");
        anyhow::ensure!(!config.ip_salt.trim().is_empty(), "ip_salt must not be empty");

        Ok(config)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }
}
