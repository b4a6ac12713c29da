//! Request body parsers.
//!
//! Two middlewares share this module: an url-encoded parser with nested
//! (bracket) key support and a strict JSON parser. Each buffers a matching
//! body up to the configured limit, stores the parsed value as a
//! [`ParsedBody`] extension and hands the original bytes on unchanged. The
//! first parser to claim a body wins; later parsers pass it through.

use std::collections::BTreeMap;
use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::BodyConfig;
use crate::observability::metrics;

/// Highest bracket index still treated as an array position.
const ARRAY_LIMIT: usize = 20;

/// Parsed request body, `{}` when no parser claimed the request.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody(pub Value);

impl<S> FromRequestParts<S> for ParsedBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ParsedBody>()
            .cloned()
            .unwrap_or_else(|| ParsedBody(Value::Object(Map::new()))))
    }
}

/// Why a body parser refused a request.
#[derive(Debug, Error)]
pub enum BodyRejection {
    #[error("request entity too large (limit {limit} bytes)")]
    PayloadTooLarge { limit: usize },

    #[error("too many parameters (limit {limit})")]
    TooManyParameters { limit: usize },

    #[error("unsupported charset \"{0}\"")]
    UnsupportedCharset(String),

    #[error("malformed {kind} body: {reason}")]
    Malformed { kind: &'static str, reason: String },

    #[error("failed to read request body: {0}")]
    Unreadable(String),
}

impl BodyRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            BodyRejection::PayloadTooLarge { .. } | BodyRejection::TooManyParameters { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            BodyRejection::UnsupportedCharset(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            BodyRejection::Malformed { .. } | BodyRejection::Unreadable(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            BodyRejection::PayloadTooLarge { .. } => "too_large",
            BodyRejection::TooManyParameters { .. } => "too_many_parameters",
            BodyRejection::UnsupportedCharset(_) => "charset",
            BodyRejection::Malformed { .. } => "malformed",
            BodyRejection::Unreadable(_) => "unreadable",
        }
    }
}

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Rejecting request body");
        metrics::record_body_rejection(self.reason());
        (self.status(), self.to_string()).into_response()
    }
}

/// Middleware for `application/x-www-form-urlencoded` bodies.
pub async fn urlencoded_parser(
    State(config): State<BodyConfig>,
    request: Request,
    next: Next,
) -> Result<Response, BodyRejection> {
    if already_parsed(&request) || !media_type_matches(request.headers(), is_urlencoded) {
        return Ok(next.run(request).await);
    }
    check_charset(request.headers())?;

    let (parts, body) = request.into_parts();
    let bytes = read_limited(&parts.headers, body, config.limit_bytes).await?;
    let value = parse_urlencoded(&bytes, &config)?;

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(ParsedBody(value));
    Ok(next.run(request).await)
}

/// Middleware for `application/json` and `+json` bodies.
pub async fn json_parser(
    State(config): State<BodyConfig>,
    request: Request,
    next: Next,
) -> Result<Response, BodyRejection> {
    if already_parsed(&request) || !media_type_matches(request.headers(), is_json) {
        return Ok(next.run(request).await);
    }
    check_charset(request.headers())?;

    let (parts, body) = request.into_parts();
    let bytes = read_limited(&parts.headers, body, config.limit_bytes).await?;
    let value = parse_json_strict(&bytes)?;

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(ParsedBody(value));
    Ok(next.run(request).await)
}

fn already_parsed(request: &Request) -> bool {
    request.extensions().get::<ParsedBody>().is_some()
}

/// Lowercased media type without parameters.
fn media_type(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = raw.split(';').next()?.trim().to_ascii_lowercase();
    Some(essence)
}

fn media_type_matches(headers: &HeaderMap, predicate: fn(&str) -> bool) -> bool {
    media_type(headers).is_some_and(|m| predicate(&m))
}

fn is_urlencoded(media: &str) -> bool {
    media == "application/x-www-form-urlencoded"
}

fn is_json(media: &str) -> bool {
    media == "application/json"
        || media
            .split_once('/')
            .is_some_and(|(_, subtype)| subtype.ends_with("+json"))
}

/// Only UTF-8 bodies are decoded; any other declared charset is a 415.
fn check_charset(headers: &HeaderMap) -> Result<(), BodyRejection> {
    let Some(raw) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return Ok(());
    };
    for param in raw.split(';').skip(1) {
        if let Some((name, value)) = param.split_once('=') {
            if name.trim().eq_ignore_ascii_case("charset") {
                let charset = value.trim().trim_matches('"');
                if !charset.eq_ignore_ascii_case("utf-8") && !charset.eq_ignore_ascii_case("utf8") {
                    return Err(BodyRejection::UnsupportedCharset(charset.to_ascii_lowercase()));
                }
            }
        }
    }
    Ok(())
}

/// Buffer the body, failing as soon as it exceeds `limit`.
async fn read_limited(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, BodyRejection> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(BodyRejection::PayloadTooLarge { limit });
    }

    axum::body::to_bytes(body, limit).await.map_err(|err| {
        let inner = err.into_inner();
        if inner.is::<LengthLimitError>() {
            BodyRejection::PayloadTooLarge { limit }
        } else {
            BodyRejection::Unreadable(inner.to_string())
        }
    })
}

/// Parse JSON accepting only an object or array at the top level.
pub fn parse_json_strict(bytes: &[u8]) -> Result<Value, BodyRejection> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    match first {
        None => Ok(Value::Object(Map::new())),
        Some(b'{') | Some(b'[') => serde_json::from_slice(bytes).map_err(|e| BodyRejection::Malformed {
            kind: "json",
            reason: e.to_string(),
        }),
        Some(_) => Err(BodyRejection::Malformed {
            kind: "json",
            reason: "top-level value must be an object or array".to_string(),
        }),
    }
}

#[derive(Debug, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
    Append,
}

#[derive(Debug)]
enum Node {
    Leaf(String),
    Array(BTreeMap<usize, Node>),
    Map(BTreeMap<String, Node>),
}

/// Parse an url-encoded body into nested objects and arrays.
///
/// `a[b]=1` nests an object, `a[]=1` appends, `a[2]=1` places by index
/// (up to 20, larger indices become object keys) and repeated keys collect
/// into an array.
///
/// # Errors
/// `TooManyParameters` when the body holds more `&`-separated pairs than
/// `parameter_limit`.
pub fn parse_urlencoded(bytes: &[u8], config: &BodyConfig) -> Result<Value, BodyRejection> {
    let pairs = bytes.split(|b| *b == b'&').count();
    if pairs > config.parameter_limit {
        return Err(BodyRejection::TooManyParameters {
            limit: config.parameter_limit,
        });
    }

    let mut root: BTreeMap<String, Node> = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        if key.is_empty() {
            continue;
        }
        let segments = split_key(&key, config.depth);
        let Some((Segment::Key(parent), rest)) = segments.split_first() else {
            continue;
        };
        let existing = root.remove(parent);
        root.insert(parent.clone(), place(existing, rest, value.into_owned()));
    }

    Ok(Value::Object(root.into_iter().map(|(k, n)| (k, n.into_value())).collect()))
}

fn split_key(key: &str, depth: usize) -> Vec<Segment> {
    let open = match key.find('[') {
        Some(pos) if pos > 0 && depth > 0 => pos,
        _ => return vec![Segment::Key(key.to_string())],
    };

    let mut segments = vec![Segment::Key(key[..open].to_string())];
    let mut rest = &key[open..];
    while segments.len() <= depth {
        let Some(inner) = rest.strip_prefix('[') else {
            break;
        };
        let Some(close) = inner.find(']') else {
            break;
        };
        segments.push(bracket_segment(&inner[..close]));
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Key(rest.to_string()));
    }
    segments
}

fn bracket_segment(inner: &str) -> Segment {
    if inner.is_empty() {
        return Segment::Append;
    }
    match inner.parse::<usize>() {
        Ok(index) if index <= ARRAY_LIMIT && index.to_string() == inner => Segment::Index(index),
        _ => Segment::Key(inner.to_string()),
    }
}

fn place(slot: Option<Node>, segments: &[Segment], value: String) -> Node {
    let Some((first, rest)) = segments.split_first() else {
        return match slot {
            None => Node::Leaf(value),
            Some(Node::Array(mut items)) => {
                let next = next_index(&items);
                items.insert(next, Node::Leaf(value));
                Node::Array(items)
            }
            Some(existing) => Node::Array(BTreeMap::from([(0, existing), (1, Node::Leaf(value))])),
        };
    };

    match first {
        Segment::Append => {
            let mut items = into_array(slot);
            let next = next_index(&items);
            items.insert(next, place(None, rest, value));
            Node::Array(items)
        }
        Segment::Index(index) => match slot {
            Some(Node::Map(mut map)) => {
                let key = index.to_string();
                let child = map.remove(&key);
                map.insert(key, place(child, rest, value));
                Node::Map(map)
            }
            other => {
                let mut items = into_array(other);
                let child = items.remove(index);
                items.insert(*index, place(child, rest, value));
                Node::Array(items)
            }
        },
        Segment::Key(key) => match slot {
            Some(Node::Leaf(existing)) => {
                let nested = BTreeMap::from([(key.clone(), place(None, rest, value))]);
                Node::Array(BTreeMap::from([(0, Node::Leaf(existing)), (1, Node::Map(nested))]))
            }
            other => {
                let mut map = into_map(other);
                let child = map.remove(key);
                map.insert(key.clone(), place(child, rest, value));
                Node::Map(map)
            }
        },
    }
}

fn next_index(items: &BTreeMap<usize, Node>) -> usize {
    items.keys().next_back().map_or(0, |last| last + 1)
}

fn into_array(slot: Option<Node>) -> BTreeMap<usize, Node> {
    match slot {
        None => BTreeMap::new(),
        Some(Node::Array(items)) => items,
        Some(other) => BTreeMap::from([(0, other)]),
    }
}

fn into_map(slot: Option<Node>) -> BTreeMap<String, Node> {
    match slot {
        None | Some(Node::Leaf(_)) => BTreeMap::new(),
        Some(Node::Map(map)) => map,
        Some(Node::Array(items)) => items.into_iter().map(|(i, n)| (i.to_string(), n)).collect(),
    }
}

impl Node {
    fn into_value(self) -> Value {
        match self {
            Node::Leaf(s) => Value::String(s),
            Node::Array(items) => Value::Array(items.into_values().map(Node::into_value).collect()),
            Node::Map(map) => Value::Object(map.into_iter().map(|(k, n)| (k, n.into_value())).collect()),
        }
    }
}
