//! End-to-end behaviour of the configured middleware chain.

use axum::body::Body;
use axum::http::header::{
    ACCEPT_ENCODING, CACHE_CONTROL, CONTENT_ENCODING, CONTENT_SECURITY_POLICY, CONTENT_TYPE, COOKIE,
    PRAGMA, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::Json;
use serde_json::{json, Value};

use server_bootstrap::config::Mode;
use server_bootstrap::http::middleware::{Cookies, ParsedBody};
use server_bootstrap::{ConfigureError, ServerConfigurator, ServerInstance};

mod common;
use common::{body_bytes, body_string, build_router, get, gzip, send, test_settings};

const NO_CACHE: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

fn large_text() -> String {
    "the quick brown fox jumps over the lazy dog\n".repeat(100)
}

async fn echo(ParsedBody(value): ParsedBody) -> Json<Value> {
    Json(value)
}

async fn echo_with_raw(ParsedBody(value): ParsedBody, raw: String) -> Json<Value> {
    Json(json!({ "parsed": value, "raw": raw }))
}

#[tokio::test]
async fn test_configure_returns_same_instance() {
    for mode in [Mode::Production, Mode::Development] {
        let mut configurator = ServerConfigurator::new(mode, test_settings());
        let mut server = ServerInstance::new();
        let id = server.id();
        let addr: *const ServerInstance = &server;

        let returned = configurator.configure(&mut server).await.unwrap();

        assert!(std::ptr::eq(&*returned, addr));
        assert_eq!(returned.id(), id);
    }
}

#[tokio::test]
async fn test_healthcheck_ok_in_every_mode() {
    for mode in [Mode::Production, Mode::Development] {
        let router = build_router(mode, test_settings(), |_| {}).await;

        let response = send(&router, get("/healthcheck")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK!");
    }
}

#[tokio::test]
async fn test_frame_guard_only_in_production() {
    let prod = build_router(Mode::Production, test_settings(), |_| {}).await;
    let dev = build_router(Mode::Development, test_settings(), |_| {}).await;

    let prod_res = send(&prod, get("/healthcheck")).await;
    let dev_res = send(&dev, get("/healthcheck")).await;

    assert_eq!(prod_res.headers()[X_FRAME_OPTIONS], "SAMEORIGIN");
    assert!(dev_res.headers().get(X_FRAME_OPTIONS).is_none());

    for res in [&prod_res, &dev_res] {
        assert_eq!(res.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(
            res.headers()[STRICT_TRANSPORT_SECURITY],
            "max-age=15552000; includeSubDomains"
        );
        assert_eq!(res.headers()["x-dns-prefetch-control"], "off");
        assert_eq!(res.headers()["x-download-options"], "noopen");
        assert_eq!(res.headers()["x-xss-protection"], "1; mode=block");
    }
}

#[tokio::test]
async fn test_every_response_is_no_cache() {
    let router = build_router(Mode::Production, test_settings(), |server| {
        server.get("/cached", || async { ([(CACHE_CONTROL, "public, max-age=3600")], "cached") });
    })
    .await;

    for uri in ["/healthcheck", "/cached", "/does-not-exist"] {
        let response = send(&router, get(uri)).await;
        assert_eq!(response.headers()[CACHE_CONTROL], NO_CACHE, "{uri}");
        assert_eq!(response.headers()[PRAGMA], "no-cache", "{uri}");
        assert_eq!(response.headers()["expires"], "0", "{uri}");
        assert_eq!(response.headers()["surrogate-control"], "no-store", "{uri}");
    }
}

#[tokio::test]
async fn test_csp_header_from_settings() {
    let router = build_router(Mode::Production, test_settings(), |_| {}).await;

    let response = send(&router, get("/healthcheck")).await;

    assert_eq!(
        response.headers()[CONTENT_SECURITY_POLICY],
        "default-src 'self'; img-src 'self' data:"
    );
}

#[tokio::test]
async fn test_powered_by_is_hidden() {
    let router = build_router(Mode::Production, test_settings(), |server| {
        server.get("/legacy", || async { ([("x-powered-by", "Express")], "legacy") });
    })
    .await;

    let response = send(&router, get("/legacy")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-powered-by").is_none());
}

#[tokio::test]
async fn test_large_bodies_compressed_for_capable_clients() {
    let text = large_text();
    let router = build_router(Mode::Production, test_settings(), |server| {
        let body = text.clone();
        server.get("/large", move || async move { body });
    })
    .await;

    let gzip_req = Request::get("/large")
        .header(ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .unwrap();
    let compressed = send(&router, gzip_req).await;
    assert_eq!(compressed.headers()[CONTENT_ENCODING], "gzip");
    assert!(body_bytes(compressed).await.len() < text.len());

    let plain = send(&router, get("/large")).await;
    assert!(plain.headers().get(CONTENT_ENCODING).is_none());
    assert_eq!(body_string(plain).await, text);
}

#[tokio::test]
async fn test_small_bodies_and_event_streams_not_compressed() {
    let text = large_text();
    let router = build_router(Mode::Production, test_settings(), |server| {
        let body = text.clone();
        server.get("/events", move || async move {
            ([(CONTENT_TYPE, "text/event-stream")], body)
        });
    })
    .await;

    for uri in ["/healthcheck", "/events"] {
        let request = Request::get(uri)
            .header(ACCEPT_ENCODING, "gzip")
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;
        assert!(response.headers().get(CONTENT_ENCODING).is_none(), "{uri}");
    }
}

#[tokio::test]
async fn test_missing_csp_leaves_healthcheck_unreachable() {
    let mut settings = test_settings();
    settings.content_security_policy = None;
    let mut configurator = ServerConfigurator::new(Mode::Production, settings);
    let mut server = ServerInstance::new();

    let err = configurator.configure(&mut server).await.unwrap_err();
    assert!(matches!(err, ConfigureError::ConfigurationMissing { .. }));
    assert!(err.to_string().contains("contentSecurityPolicy"));

    let router = server.into_router();
    let response = send(&router, get("/healthcheck")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cookies_available_to_handlers() {
    let router = build_router(Mode::Production, test_settings(), |server| {
        server.get("/whoami", |cookies: Cookies| async move {
            cookies.get("session").unwrap_or("anonymous").to_string()
        });
    })
    .await;

    let request = Request::get("/whoami")
        .header(COOKIE, "theme=dark; session=s%3Aabc")
        .body(Body::empty())
        .unwrap();
    assert_eq!(body_string(send(&router, request).await).await, "s:abc");

    assert_eq!(body_string(send(&router, get("/whoami")).await).await, "anonymous");
}

#[tokio::test]
async fn test_urlencoded_body_parsed_extended() {
    let router = build_router(Mode::Production, test_settings(), |server| {
        server.route("/echo", post(echo));
    })
    .await;

    let request = Request::post("/echo")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("user[name]=Ada&user[tags][]=math&user[tags][]=code&plain=yes"))
        .unwrap();
    let response = send(&router, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        value,
        json!({"user": {"name": "Ada", "tags": ["math", "code"]}, "plain": "yes"})
    );
}

#[tokio::test]
async fn test_json_body_parsed_and_raw_body_preserved() {
    let router = build_router(Mode::Production, test_settings(), |server| {
        server.route("/echo", post(echo_with_raw));
    })
    .await;

    let request = Request::post("/echo")
        .header(CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Body::from(r#"{"a":1}"#))
        .unwrap();
    let response = send(&router, request).await;

    let value: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(value, json!({"parsed": {"a": 1}, "raw": "{\"a\":1}"}));
}

#[tokio::test]
async fn test_unclaimed_body_defaults_to_empty_object() {
    let router = build_router(Mode::Production, test_settings(), |server| {
        server.route("/echo", post(echo));
    })
    .await;

    let request = Request::post("/echo")
        .header(CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let response = send(&router, request).await;

    let value: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn test_body_parser_rejections() {
    let mut settings = test_settings();
    settings.body.limit_bytes = 32;
    let router = build_router(Mode::Production, settings, |server| {
        server.route("/echo", post(echo));
    })
    .await;

    let cases = [
        ("application/json", "{oops", StatusCode::BAD_REQUEST),
        ("application/json", "42", StatusCode::BAD_REQUEST),
        ("application/json; charset=latin1", "{}", StatusCode::UNSUPPORTED_MEDIA_TYPE),
        (
            "application/json",
            r#"{"payload":"this body is well over thirty-two bytes"}"#,
            StatusCode::PAYLOAD_TOO_LARGE,
        ),
        (
            "application/x-www-form-urlencoded",
            "field=this-body-is-well-over-thirty-two-bytes",
            StatusCode::PAYLOAD_TOO_LARGE,
        ),
    ];

    for (content_type, body, expected) in cases {
        let request = Request::post("/echo")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        let response = send(&router, request).await;
        assert_eq!(response.status(), expected, "{content_type} {body}");
    }
}

#[tokio::test]
async fn test_too_many_form_parameters_rejected() {
    let mut settings = test_settings();
    settings.body.parameter_limit = 2;
    let router = build_router(Mode::Production, settings, |server| {
        server.route("/echo", post(echo));
    })
    .await;

    let form = |body: &'static str| {
        Request::post("/echo")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    };

    assert_eq!(send(&router, form("a=1&b=2")).await.status(), StatusCode::OK);

    let response = send(&router, form("a=1&b=2&c=3")).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body_string(response).await.contains("too many parameters"));
}

#[tokio::test]
async fn test_compressed_request_bodies_inflated() {
    let router = build_router(Mode::Production, test_settings(), |server| {
        server.route("/echo", post(echo));
    })
    .await;
    let json = r#"{"user":{"name":"Ada","tags":["math","code","engines"]},"note":"inflate me"}"#;

    let request = Request::post("/echo")
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_ENCODING, "gzip")
        .body(Body::from(gzip(json).await))
        .unwrap();
    let response = send(&router, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(value, serde_json::from_str::<Value>(json).unwrap());

    let unknown = Request::post("/echo")
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_ENCODING, "snappy")
        .body(Body::from("{}"))
        .unwrap();
    assert_eq!(
        send(&router, unknown).await.status(),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    );
}
