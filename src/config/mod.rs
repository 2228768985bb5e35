//! Configuration management for fxfeed
//!
//! Loads from optional config files + environment variables via .env

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Provider refresh interval in seconds
    pub refresh_secs: u64,
    /// Jitter tick interval in milliseconds
    pub jitter_ms: u64,
    /// Maximum fractional perturbation per jitter tick (e.g. 0.0015 = 0.15%)
    pub jitter_max_pct: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Provider priority order, tried first to last
    pub order: Vec<String>,
    /// Per-request HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Feed defaults
            .set_default("feed.refresh_secs", 60)?
            .set_default("feed.jitter_ms", 2000)?
            .set_default("feed.jitter_max_pct", 0.0015)?
            // Provider defaults
            .set_default(
                "providers.order",
                vec!["open-er-api", "frankfurter", "currency-api"],
            )?
            .set_default("providers.timeout_secs", 10)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (FXFEED_*)
            .add_source(Environment::with_prefix("FXFEED").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.feed.refresh_secs > 0, "feed.refresh_secs must be > 0");
        anyhow::ensure!(self.feed.jitter_ms > 0, "feed.jitter_ms must be > 0");
        anyhow::ensure!(
            self.feed.jitter_max_pct > 0.0 && self.feed.jitter_max_pct < 1.0,
            "feed.jitter_max_pct must be in (0, 1)"
        );
        anyhow::ensure!(
            !self.providers.order.is_empty(),
            "providers.order must list at least one provider"
        );
        Ok(())
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "refresh={}s jitter={}ms jitter_max_pct={:.4} providers={:?}",
            self.feed.refresh_secs,
            self.feed.jitter_ms,
            self.feed.jitter_max_pct,
            self.providers.order
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
