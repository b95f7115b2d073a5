//! Response compression layer.

use tower_http::compression::predicate::{DefaultPredicate, NotForContentType, Predicate};
use tower_http::compression::CompressionLayer;

/// Gzip for JSON and text. Video bodies are served byte-exact so that
/// `Content-Range` and `Content-Length` stay truthful.
pub fn build_compression_layer() -> CompressionLayer<impl Predicate> {
    CompressionLayer::new()
        .compress_when(DefaultPredicate::new().and(NotForContentType::new("video/")))
}
