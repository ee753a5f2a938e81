//! # Logging Setup
//!
//! Installs a `tracing_subscriber::fmt` subscriber from a [`LoggingConfig`].
//!
//! The codec itself only emits `tracing` events; applications that already
//! install their own subscriber never need this module.

use tracing::info;

use crate::config::LoggingConfig;
use crate::error::{DtxError, Result};

/// Install the global console subscriber.
///
/// Does nothing when console logging is disabled. Fails if another global
/// subscriber has already been set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if !config.log_to_console {
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(config.show_target)
        .try_init()
        .map_err(|e| DtxError::ConfigError(format!("Failed to initialize logging: {e}")))?;

    info!(app = %config.app_name, level = %config.log_level, "logging initialized");
    Ok(())
}
