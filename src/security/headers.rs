//! Security response headers.
//!
//! # Responsibilities
//! - Apply the baseline security header set to every response
//! - Hide `X-Powered-By`
//! - Toggle the frame guard by run mode
//!
//! # Design Decisions
//! - Headers are set only when the handler has not set them, so a route can
//!   still opt into a different value
//! - Development drops `X-Frame-Options` so pages can be embedded in tooling

use axum::http::header::{
    HeaderName, HeaderValue, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
    X_DNS_PREFETCH_CONTROL, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::response::Response;
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Mode;

pub const X_DOWNLOAD_OPTIONS: HeaderName = HeaderName::from_static("x-download-options");
pub const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// HSTS lifetime: 180 days.
const HSTS_VALUE: &str = "max-age=15552000; includeSubDomains";

/// The baseline security header set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityHeaders {
    frame_guard: bool,
}

impl SecurityHeaders {
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            frame_guard: mode.is_production(),
        }
    }

    pub fn frame_guard(&self) -> bool {
        self.frame_guard
    }

    /// Header pairs this set writes.
    pub fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = vec![(X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off"))];
        if self.frame_guard {
            headers.push((X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")));
        }
        headers.extend([
            (STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS_VALUE)),
            (X_DOWNLOAD_OPTIONS, HeaderValue::from_static("noopen")),
            (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
        ]);
        headers
    }

    pub fn apply(&self, router: Router) -> Router {
        let mut router = router.layer(axum::middleware::map_response(hide_powered_by));
        for (name, value) in self.headers() {
            router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
        }
        router
    }
}

async fn hide_powered_by(mut response: Response) -> Response {
    response.headers_mut().remove(X_POWERED_BY);
    response
}
