use crate::cache::CacheError;
use crate::gateway::ProviderError;
use crate::ingress::DecodeError;
use thiserror::Error;

/// Unified error type for the announcement pipeline.
///
/// This aggregates the domain errors into actionable, high-level categories:
/// a message that could not be decoded, a synthesis provider failure, or a
/// durable cache failure. Fast-tier and playback problems never surface here;
/// they are degraded to warnings at the point they occur.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed message: {0}")]
    Decode(#[from] DecodeError),

    #[error("synthesis provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}
