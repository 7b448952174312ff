use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Upper bound on carry steps the absolute resolver takes before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;
pub const DEFAULT_LOCATION: &str = "UTC";
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Top-level config (nextrun.toml + NEXTRUN_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextrunConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub ticker: TickerConfig,
}

/// Settings for the occurrence resolvers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Carry-search ceiling for absolute schedules.
    /// Override with env var: NEXTRUN_RESOLVER__MAX_ATTEMPTS=200
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// IANA name of the calendar location applied when a schedule sets none.
    #[serde(default = "default_location")]
    pub location: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            location: default_location(),
        }
    }
}

impl ResolverConfig {
    /// Parse `location` into a timezone.
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.location
            .parse::<chrono_tz::Tz>()
            .map_err(|_| ConfigError::UnknownLocation {
                name: self.location.clone(),
            })
    }
}

/// Settings for the cancellable wait loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerConfig {
    /// Re-arm after each firing instead of stopping.
    #[serde(default)]
    pub repeat: bool,
    /// Buffer size of the fired-occurrence channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            repeat: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}
fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl NextrunConfig {
    /// Load config from a TOML file with NEXTRUN_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.nextrun/nextrun.toml
    ///
    /// A missing file is not an error; every key has a default.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: NextrunConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("NEXTRUN_").split("__"))
            .extract()
            .map_err(|e| ConfigError::Config(e.to_string()))?;

        if config.resolver.max_attempts == 0 {
            return Err(ConfigError::Config(
                "resolver.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.nextrun/nextrun.toml", home)
}
