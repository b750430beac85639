// Engine traits consumed by the HTTP gateway

use async_trait::async_trait;

use super::errors::{ExtractionError, StreamError};
use super::models::{ExtractionResult, MediaRequest};
use super::relay::RelayStream;

/// Single-shot metadata lookup
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Name of the implementation (for logging)
    fn name(&self) -> &'static str;

    /// Resolve metadata for a media URL. Never retries.
    async fn resolve(&self, request: &MediaRequest) -> Result<ExtractionResult, ExtractionError>;
}

/// Long-lived byte relay
#[async_trait]
pub trait StreamRelay: Send + Sync {
    /// Name of the implementation (for logging)
    fn name(&self) -> &'static str;

    /// Start producing media bytes for a request.
    ///
    /// Returns once the first bytes are available, so a failure before any
    /// output is still reported as an error. Dropping the returned stream
    /// terminates the producer.
    async fn open_stream(&self, request: &MediaRequest) -> Result<RelayStream, StreamError>;
}
