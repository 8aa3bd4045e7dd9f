//! Registry configuration.
//!
//! Controls how deep role inheritance may go and whether resolution tracks
//! the ancestor path to report cycles. Configuration can be loaded from
//! environment variables with defaults suited to typical role graphs.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Maximum number of inheritance levels followed during resolution.
    pub max_depth: usize,

    /// Whether resolution reports parent cycles as
    /// [`AclError::CyclicRoleGraph`](acl_core::AclError::CyclicRoleGraph).
    ///
    /// When disabled, a cycle is only caught by `max_depth`.
    pub detect_cycles: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            detect_cycles: true,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ACL_MAX_DEPTH`: Maximum inheritance depth (default: 64)
    /// - `ACL_DETECT_CYCLES`: Whether to report cycles (default: true).
    ///   Accepts `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off` in any
    ///   case.
    ///
    /// A value that doesn't parse is logged and replaced by its default.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_depth: env_value("ACL_MAX_DEPTH", parse_depth, default.max_depth),
            detect_cycles: env_value("ACL_DETECT_CYCLES", parse_flag, default.detect_cycles),
        }
    }

    /// Set the maximum inheritance depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable cycle reporting.
    pub fn with_cycle_detection(mut self, detect_cycles: bool) -> Self {
        self.detect_cycles = detect_cycles;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_depth".to_string(),
                message: "must allow at least one level".to_string(),
            });
        }
        Ok(())
    }
}

fn env_value<T: std::fmt::Display>(key: &str, parse: fn(&str) -> Option<T>, default: T) -> T {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|| {
        warn!(key, value = %raw, default = %default, "Invalid config value, using default");
        default
    })
}

fn parse_depth(raw: &str) -> Option<usize> {
    raw.trim().parse().ok()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
