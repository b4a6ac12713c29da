//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Directive name → allowed sources, as written in the config file.
pub type CspDirectives = BTreeMap<String, Vec<String>>;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Content-Security-Policy directives.
    ///
    /// Required by the configurator; absent by default so a missing key is
    /// reported rather than silently replaced.
    #[serde(
        rename = "contentSecurityPolicy",
        alias = "content_security_policy",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_security_policy: Option<CspDirectives>,

    /// Request body parser limits.
    pub body: BodyConfig,

    /// Response compression settings.
    pub compression: CompressionConfig,

    /// Development source watcher settings.
    pub watch: WatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Limits shared by the url-encoded and JSON body parsers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Maximum accepted body size in bytes.
    pub limit_bytes: usize,

    /// Maximum number of url-encoded pairs read from one body.
    pub parameter_limit: usize,

    /// Maximum bracket nesting depth for url-encoded keys.
    pub depth: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            limit_bytes: 100 * 1024,
            parameter_limit: 1000,
            depth: 5,
        }
    }
}

/// Response compression configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Bodies at or below this size are sent uncompressed.
    pub threshold_bytes: u16,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            threshold_bytes: 1024,
        }
    }
}

/// Source watcher configuration (development only).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directory watched recursively.
    pub root: String,

    /// Path segment identifying cached modules to evict on change.
    pub segment: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: "./server".to_string(),
            segment: "server".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
