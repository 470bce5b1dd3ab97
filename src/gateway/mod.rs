//! 合成网关模块：封装外部语音合成服务的调用与重试。
//!
//! # Synthesis Gateway Module
//!
//! The gateway is the single seam through which the pipeline reaches the
//! external speech synthesis provider.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`SynthesisGateway`] | Trait the pipeline synthesizes through |
//! | [`HttpSynthesizer`] | HTTP adapter for speech endpoints |
//! | [`RetryPolicy`] | Bounded exponential backoff for transient failures |
//! | [`ProviderError`] | Provider failure taxonomy |
//!
//! ## Error classification
//!
//! Provider failures split into transient (timeouts, rate limits, server
//! errors) and permanent (bad request, bad credentials). Only transient
//! failures are retried; permanent ones surface immediately so a broken
//! message is reported once instead of hammering the provider.

mod http;
mod retry;

use crate::types::{AudioArtifact, SynthesisRequest};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use http::{HttpSynthesizer, HttpSynthesizerBuilder};
pub use retry::RetryPolicy;

/// Turns text into audio via an external provider.
#[async_trait]
pub trait SynthesisGateway: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioArtifact, ProviderError>;
}

/// Errors raised by a synthesis provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {message}")]
    Api {
        status: u16,
        message: String,
        retry_after_ms: Option<u64>,
    },

    #[error("provider returned no audio data")]
    EmptyAudio,

    #[error("provider configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Transient failures are worth retrying; everything else fails fast.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::EmptyAudio => true,
            Self::Configuration(_) => false,
        }
    }

    /// Provider-requested wait before the next attempt, if it sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Api {
                retry_after_ms: Some(ms),
                ..
            } => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }
}
