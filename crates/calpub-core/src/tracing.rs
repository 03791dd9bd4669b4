//! Tracing setup for calpub.
//!
//! Binaries embedding the library call [`init_tracing`] once at startup.
//! The `RUST_LOG` environment variable overrides the configured default
//! level.
//!
//! ```ignore
//! use calpub_core::tracing::{TracingConfig, init_tracing};
//!
//! init_tracing(TracingConfig::default()).expect("failed to initialize tracing");
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors that can occur during tracing initialization.
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set the global subscriber.
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse an env filter directive.
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// The default log level when `RUST_LOG` is not set.
    pub default_level: Level,
    /// Emit JSON instead of the compact human-readable format.
    pub json_output: bool,
    /// Custom env filter directive (overrides `default_level` if set).
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            json_output: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Set the default log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Switch to JSON output (useful when driven by a scheduler).
    #[must_use]
    pub fn with_json(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }

    /// Set a custom env filter directive.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }
}

/// Initialize tracing with the given configuration.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or if
/// the env filter directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = if let Some(ref filter) = config.env_filter {
        EnvFilter::try_new(filter)?
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("calpub={}", config.default_level)))
    };

    if config.json_output {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json());
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().compact());
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
