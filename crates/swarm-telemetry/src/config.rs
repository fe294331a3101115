//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration for one node process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// `EnvFilter` directive (e.g. `info`, `sw_01_gossip=debug,info`)
    pub log_level: String,

    /// Emit one JSON object per event instead of human-readable lines
    pub json_logs: bool,

    /// Colored output for terminals
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "orbital-swarm".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SWARM_SERVICE_NAME`: Service name (default: orbital-swarm)
    /// - `SWARM_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `SWARM_JSON_LOGS`: `true`/`1` for JSON output (default: false)
    /// - `NO_COLOR`: disables ANSI colors when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            service_name: lookup("SWARM_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("SWARM_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("SWARM_JSON_LOGS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.json_logs),
            ansi: lookup("NO_COLOR").is_none(),
        }
    }

    /// Configuration for one named node of a swarm.
    pub fn for_node(identifier: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("{}-{}", config.service_name, identifier);
        config
    }
}
