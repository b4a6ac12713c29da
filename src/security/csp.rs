//! Content-Security-Policy header construction.
//!
//! Directive names may be written in camelCase (`defaultSrc`) or in their
//! header spelling (`default-src`); both render as `default-src`. A directive
//! with no sources renders as the bare name, e.g. `upgrade-insecure-requests`.

use axum::http::header::{HeaderValue, CONTENT_SECURITY_POLICY};
use axum::Router;
use thiserror::Error;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CspDirectives;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CspError {
    #[error("no directives configured")]
    Empty,

    #[error("invalid directive name '{0}'")]
    InvalidDirective(String),

    #[error("directive '{0}' is configured more than once")]
    DuplicateDirective(String),

    #[error("invalid source '{source_value}' in directive '{directive}'")]
    InvalidSource {
        directive: String,
        source_value: String,
    },
}

/// A rendered, header-safe policy.
#[derive(Debug, Clone)]
pub struct ContentSecurityPolicy {
    rendered: String,
    value: HeaderValue,
}

impl ContentSecurityPolicy {
    pub fn from_directives(directives: &CspDirectives) -> Result<Self, CspError> {
        if directives.is_empty() {
            return Err(CspError::Empty);
        }

        let mut seen = Vec::with_capacity(directives.len());
        let mut parts = Vec::with_capacity(directives.len());
        for (raw_name, sources) in directives {
            let name = directive_name(raw_name);
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(CspError::InvalidDirective(raw_name.clone()));
            }
            if seen.contains(&name) {
                return Err(CspError::DuplicateDirective(name));
            }

            let mut part = name.clone();
            for source in sources {
                if !is_valid_source(source) {
                    return Err(CspError::InvalidSource {
                        directive: name,
                        source_value: source.clone(),
                    });
                }
                part.push(' ');
                part.push_str(source);
            }
            parts.push(part);
            seen.push(name);
        }

        let rendered = parts.join("; ");
        // Every character was checked above, so this cannot fail in practice.
        let value = HeaderValue::from_str(&rendered)
            .map_err(|_| CspError::InvalidDirective(rendered.clone()))?;

        Ok(Self { rendered, value })
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    pub fn header_value(&self) -> HeaderValue {
        self.value.clone()
    }

    pub fn apply(&self, router: Router) -> Router {
        router.layer(SetResponseHeaderLayer::if_not_present(
            CONTENT_SECURITY_POLICY,
            self.header_value(),
        ))
    }
}

/// `defaultSrc` → `default-src`; already-hyphenated names are lowercased.
fn directive_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len() + 4);
    for c in raw.trim().chars() {
        if c.is_ascii_uppercase() {
            name.push('-');
            name.push(c.to_ascii_lowercase());
        } else {
            name.push(c);
        }
    }
    name
}

fn is_valid_source(source: &str) -> bool {
    !source.is_empty()
        && source
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b';' && b != b',')
}
