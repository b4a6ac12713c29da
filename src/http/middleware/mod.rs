//! Request/response middleware registered by the configurator.
//!
//! # Order
//! ```text
//! cookies.rs      → Cookies extension (before any auth layer)
//! body.rs         → urlencoded, then JSON → ParsedBody extension
//! compression.rs  → gzip/deflate/br/zstd above a size threshold
//! (security headers, no-cache and CSP live in crate::security)
//! ```

pub mod body;
pub mod compression;
pub mod cookies;

pub use body::{json_parser, urlencoded_parser, BodyRejection, ParsedBody};
pub use compression::compression_layer;
pub use cookies::{cookie_parser, Cookies};
