//! # herald
//!
//! 这是一个将短文本消息转换为语音播报的去重缓存流水线，支持两级缓存与外部语音合成服务。
//!
//! A deduplicating, caching message-to-speech pipeline. Short text messages
//! delivered by an external transport are decoded, fingerprinted, resolved
//! against a two-tier audio cache, synthesized by an external speech provider
//! only on a miss, and handed to a local playback sink.
//!
//! ## Overview
//!
//! The expensive step is speech synthesis, so the library is built around
//! never doing it twice for the same request. A [`CacheKey`] is a
//! deterministic fingerprint of a message's text and options; the
//! [`CacheStore`](cache::CacheStore) resolves it against a durable filesystem
//! tier and an optional fast network tier, and the
//! [`Pipeline`](pipeline::Pipeline) coalesces concurrent duplicates so a
//! burst of identical announcements costs one provider call.
//!
//! ## Core Philosophy
//!
//! - **Content-addressed**: identical `(text, options)` always resolve to the
//!   same artifact; any change produces a new key
//! - **Durable tier is authoritative**: fast-tier failures degrade to
//!   warnings, never to request failures
//! - **Explicit wiring**: every collaborator is constructed and passed in;
//!   the library holds no process-global state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use herald::cache::{CacheStore, DiskCache};
//! use herald::gateway::{HttpSynthesizer, RetryPolicy};
//! use herald::pipeline::Pipeline;
//! use herald::playback::NullSink;
//! use herald::types::SynthesisRequest;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> herald::Result<()> {
//!     let durable = DiskCache::new("herald-cache").await?;
//!     let store = CacheStore::new(Arc::new(durable));
//!
//!     let gateway = HttpSynthesizer::builder()
//!         .endpoint("https://api.example.com/v1/audio/speech")
//!         .api_key("secret")
//!         .retry_policy(RetryPolicy::default())
//!         .build()?;
//!
//!     let pipeline = Pipeline::new(Arc::new(store), Arc::new(gateway), Arc::new(NullSink));
//!
//!     let announcement = pipeline.handle(SynthesisRequest::new("Hello World!")).await?;
//!     println!("delivered from {:?}", announcement.source);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Core type definitions (requests, audio artifacts, formats) |
//! | [`cache`] | Key derivation, cache backends, and two-tier composition |
//! | [`gateway`] | Speech synthesis gateway trait, HTTP adapter, retry policy |
//! | [`pipeline`] | Request orchestration with per-key in-flight deduplication |
//! | [`ingress`] | Transport payload decoding and the announcement run loop |
//! | [`playback`] | Playback sinks, including a CLI player adapter |
//! | [`config`] | Environment-derived daemon configuration |

pub mod cache;
pub mod config;
pub mod gateway;
pub mod ingress;
pub mod pipeline;
pub mod playback;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheKey, CacheStore};
pub use config::HeraldConfig;
pub use gateway::SynthesisGateway;
pub use ingress::Ingress;
pub use pipeline::{Announcement, AudioSource, Pipeline};
pub use playback::PlaybackSink;
pub use types::{AudioArtifact, AudioFormat, SynthesisRequest};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::Error;
