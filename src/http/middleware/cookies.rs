//! Cookie parsing middleware.
//!
//! Parses every `Cookie` request header once, early in the chain, so later
//! authentication and anti-forgery layers read cookies from request
//! extensions instead of re-parsing headers.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::Cookie;
use serde_json::Value;

/// Prefix marking a cookie value as serialized JSON.
const JSON_PREFIX: &str = "j:";

/// Cookies sent with a request.
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    values: HashMap<String, String>,
    json: HashMap<String, Value>,
}

impl Cookies {
    /// Parse all `Cookie` headers.
    ///
    /// Values are percent-decoded; a value that does not decode is kept as
    /// sent. Pairs without a name are skipped and the first occurrence of a
    /// name wins.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = Cookies::default();

        for header in headers.get_all(COOKIE) {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            for cookie in raw.split(';').filter_map(parse_pair) {
                if cookies.values.contains_key(cookie.name()) {
                    continue;
                }
                let value = cookie.value_trimmed().to_string();
                if let Some(json) = value.strip_prefix(JSON_PREFIX) {
                    if let Ok(parsed) = serde_json::from_str::<Value>(json) {
                        cookies.json.insert(cookie.name().to_string(), parsed);
                    }
                }
                cookies.values.insert(cookie.name().to_string(), value);
            }
        }

        cookies
    }

    /// Raw (decoded) value of a cookie.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Parsed value of a `j:`-prefixed cookie.
    pub fn json(&self, name: &str) -> Option<&Value> {
        self.json.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn parse_pair(pair: &str) -> Option<Cookie<'_>> {
    let pair = pair.trim();
    if pair.is_empty() {
        return None;
    }
    Cookie::parse_encoded(pair).or_else(|_| Cookie::parse(pair)).ok()
}

/// Middleware storing parsed [`Cookies`] in the request extensions.
pub async fn cookie_parser(mut request: Request, next: Next) -> Response {
    if request.extensions().get::<Cookies>().is_none() {
        let cookies = Cookies::from_headers(request.headers());
        request.extensions_mut().insert(cookies);
    }
    next.run(request).await
}

impl<S> FromRequestParts<S> for Cookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Cookies>()
            .cloned()
            .unwrap_or_else(|| Cookies::from_headers(&parts.headers)))
    }
}
