//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → read by the configurator and main
//!
//! NODE_ENV
//!     → mode.rs (resolved once)
//!     → Mode threaded through configurator, logging, watcher
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded
//! - All fields have defaults except the CSP mapping, whose absence is an error
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod mode;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, parse_settings, ConfigError};
pub use mode::Mode;
pub use schema::{
    BodyConfig, CompressionConfig, CspDirectives, ListenerConfig, ObservabilityConfig, Settings,
    WatchConfig,
};
