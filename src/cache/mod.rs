//! 音频缓存模块：提供两级缓存以避免重复的合成调用。
//!
//! # Audio Caching Module
//!
//! This module provides the two-tier audio cache that shields the synthesis
//! provider from repeated requests.
//!
//! ## Overview
//!
//! Caching is valuable for:
//! - Avoiding paid synthesis calls for announcements heard many times
//! - Keeping announcement latency low and predictable
//! - Surviving provider outages for any previously spoken message
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheStore`] | Two-tier composition with hit/miss statistics |
//! | [`CacheBackend`] | Trait for implementing cache tiers |
//! | [`DiskCache`] | Durable filesystem tier, the source of truth |
//! | [`HttpCache`] | Optional network-reachable fast tier |
//! | [`MemoryCache`] | In-process LRU tier |
//! | [`NullCache`] | No-op backend for disabling a tier |
//! | [`CacheKey`] | Deterministic key derived from a request |
//!
//! ## Tiering
//!
//! Reads consult the fast tier first and fall back to the durable tier; a
//! durable hit is copied back into the fast tier. Writes always land on the
//! durable tier, and a durable write failure is the only cache error callers
//! ever see. Fast-tier failures of any kind are logged and absorbed.

mod backend;
mod disk;
mod http;
mod key;
mod store;

use thiserror::Error;

pub use backend::{CacheBackend, MemoryCache, NullCache};
pub use disk::DiskCache;
pub use http::HttpCache;
pub use key::CacheKey;
pub use store::{CacheHit, CacheStats, CacheStore, CacheTier};

/// Errors raised by cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cache backend error: {0}")]
    Backend(String),
}
