//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Settings → Result<(), Vec<ValidationError>>
//! - The CSP mapping is checked by the configurator, which owns that key

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::Settings;

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", settings.listener.bind_address),
        ));
    }

    if settings.body.limit_bytes == 0 {
        errors.push(ValidationError::new("body.limit_bytes", "must be greater than 0"));
    }
    if settings.body.parameter_limit == 0 {
        errors.push(ValidationError::new("body.parameter_limit", "must be greater than 0"));
    }

    if settings.watch.segment.is_empty() || settings.watch.segment.contains(['/', '\\']) {
        errors.push(ValidationError::new(
            "watch.segment",
            "must be a single non-empty path segment",
        ));
    }

    if settings.observability.metrics_enabled
        && settings.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", settings.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
