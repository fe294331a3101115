//! # Swarm Telemetry
//!
//! Installs the process-wide `tracing` subscriber for a node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use swarm_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("telemetry");
//!     tracing::info!("node starting");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SWARM_LOG_LEVEL` | `info` | `EnvFilter` directive, falls back to `RUST_LOG` |
//! | `SWARM_JSON_LOGS` | `false` | JSON lines instead of text |
//! | `SWARM_SERVICE_NAME` | `orbital-swarm` | Name in the startup line |

mod config;

pub use config::TelemetryConfig;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Build the `EnvFilter` for `config`.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Filter {
        filter: config.log_level.clone(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(config.ansi && !config.json_logs);

    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| TelemetryError::Install(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}
