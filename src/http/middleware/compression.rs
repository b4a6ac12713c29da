//! Response compression.
//!
//! Compresses responses larger than the configured threshold for clients that
//! advertise a supported encoding. Event streams are never compressed: a
//! compressing encoder buffers output, which stalls server-sent events.

use tower_http::compression::predicate::{And, NotForContentType, Predicate, SizeAbove};
use tower_http::compression::CompressionLayer;

use crate::config::CompressionConfig;

pub type CompressionPredicate =
    And<And<And<SizeAbove, NotForContentType>, NotForContentType>, NotForContentType>;

pub fn compression_predicate(config: &CompressionConfig) -> CompressionPredicate {
    SizeAbove::new(config.threshold_bytes)
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
}

pub fn compression_layer(config: &CompressionConfig) -> CompressionLayer<CompressionPredicate> {
    CompressionLayer::new().compress_when(compression_predicate(config))
}
