use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown location: {name}")]
    UnknownLocation { name: String },
}

impl ConfigError {
    /// Short error code string for CLI exit reporting.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Config(_) => "CONFIG_ERROR",
            ConfigError::UnknownLocation { .. } => "UNKNOWN_LOCATION",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
