//! Store configuration
//!
//! Configuration loaded from `.statehouse.toml` (see [`crate::load_config_file`]).

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Store configuration loaded from `.statehouse.toml`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoreConfig {
    /// Install the logging interceptor when wiring up a store
    #[serde(default = "default_log_actions")]
    pub log_actions: bool,

    /// Level the logging interceptor logs actions at ("error" .. "trace", or "off")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Default time the effect runner waits for output actions
    #[serde(default = "default_effect_timeout_ms")]
    pub effect_timeout_ms: u64,
}

fn default_log_actions() -> bool {
    true
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_effect_timeout_ms() -> u64 {
    1000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_actions: default_log_actions(),
            log_level: default_log_level(),
            effect_timeout_ms: default_effect_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Load config from the first config file found, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match Self::from_toml_str(&content) {
                Ok(config) => {
                    log::info!("Loaded store config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {:#}", e);
                }
            }
        }

        log::debug!("Using default store config");
        Self::default()
    }

    /// Parse config from TOML content
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid store config")?;
        anyhow::ensure!(
            config.effect_timeout_ms > 0,
            "effect_timeout_ms must be greater than zero"
        );
        Ok(config)
    }

    /// Level filter for the logging interceptor
    ///
    /// Unknown level names fall back to `Debug`.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            log::warn!("Unknown log level '{}', using debug", self.log_level);
            LevelFilter::Debug
        })
    }

    pub fn effect_timeout(&self) -> Duration {
        Duration::from_millis(self.effect_timeout_ms)
    }
}
