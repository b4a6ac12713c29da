//! Client-side caching suppression.

use axum::http::header::{HeaderName, HeaderValue, CACHE_CONTROL, EXPIRES, PRAGMA};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

pub const SURROGATE_CONTROL: HeaderName = HeaderName::from_static("surrogate-control");

pub const NO_CACHE_HEADERS: [(HeaderName, &str); 4] = [
    (SURROGATE_CONTROL, "no-store"),
    (CACHE_CONTROL, "no-store, no-cache, must-revalidate, proxy-revalidate"),
    (PRAGMA, "no-cache"),
    (EXPIRES, "0"),
];

/// Wrap `router` so every response forbids caching, whatever the handler set.
pub fn apply(router: Router) -> Router {
    NO_CACHE_HEADERS
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(
                name,
                HeaderValue::from_static(value),
            ))
        })
}
