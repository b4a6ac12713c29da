//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::header::{ACCEPT_ENCODING, CONTENT_TYPE};
use axum::http::{Request, Response};
use axum::routing::get as get_route;
use axum::Router;
use tower::ServiceExt;
use tower_http::compression::CompressionLayer;

use server_bootstrap::config::{CspDirectives, Mode, Settings};
use server_bootstrap::{ServerConfigurator, ServerInstance};

/// Settings with a small CSP and a watch root that does not exist.
pub fn test_settings() -> Settings {
    let mut csp = CspDirectives::new();
    csp.insert("defaultSrc".into(), vec!["'self'".into()]);
    csp.insert("imgSrc".into(), vec!["'self'".into(), "data:".into()]);

    let mut settings = Settings::default();
    settings.content_security_policy = Some(csp);
    settings.watch.root = "/nonexistent/server-bootstrap/server".into();
    settings
}

/// Configure a fresh instance, let `extra` add routes, and build it.
pub async fn build_router<F>(mode: Mode, settings: Settings, extra: F) -> Router
where
    F: FnOnce(&mut ServerInstance),
{
    let mut configurator = ServerConfigurator::new(mode, settings);
    let mut server = ServerInstance::new();
    configurator
        .configure(&mut server)
        .await
        .expect("configure should succeed");
    extra(&mut server);
    server.into_router()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// Gzip `body` by serving it through a compression layer.
pub async fn gzip(body: &'static str) -> Vec<u8> {
    let router = Router::new()
        .route("/", get_route(move || async move { ([(CONTENT_TYPE, "application/json")], body) }))
        .layer(CompressionLayer::new());
    let request = Request::get("/")
        .header(ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.headers()["content-encoding"], "gzip");
    body_bytes(response).await
}
