//! `nextrun-core` — configuration shared by the resolver engine and the CLI.

pub mod config;
pub mod error;

pub use config::{NextrunConfig, ResolverConfig, TickerConfig};
pub use error::{ConfigError, Result};
