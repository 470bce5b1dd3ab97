//! Two-tier cache composition.

use super::backend::CacheBackend;
use super::key::CacheKey;
use super::CacheError;
use crate::types::AudioArtifact;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Which tier satisfied a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Fast,
    Durable,
}

/// A successful cache read.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub artifact: AudioArtifact,
    pub tier: CacheTier,
}

/// Point-in-time view of cache activity.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// The two-tier audio cache.
///
/// The durable tier is mandatory and is the source of truth: its write
/// failures are the only errors [`CacheStore::put`] surfaces. The fast tier
/// is optional; all of its failures, and durable *read* failures, degrade to
/// logged warnings so a broken cache can slow announcements down but never
/// stop them.
pub struct CacheStore {
    durable: Arc<dyn CacheBackend>,
    fast: Option<Arc<dyn CacheBackend>>,
    stats: Arc<AtomicStats>,
}

impl CacheStore {
    pub fn new(durable: Arc<dyn CacheBackend>) -> Self {
        Self {
            durable,
            fast: None,
            stats: Arc::new(AtomicStats::new()),
        }
    }

    pub fn with_fast_tier(mut self, fast: Arc<dyn CacheBackend>) -> Self {
        self.fast = Some(fast);
        self
    }

    /// Looks a key up, fast tier first.
    ///
    /// Read failures on either tier are absorbed and reported as a miss; a
    /// durable hit is copied back into the fast tier best-effort.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheHit> {
        if let Some(fast) = &self.fast {
            match fast.get(key).await {
                Ok(Some(artifact)) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(CacheHit {
                        artifact,
                        tier: CacheTier::Fast,
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        backend = fast.name(),
                        %key,
                        error = %err,
                        "fast tier read failed; falling back to durable tier"
                    );
                }
            }
        }

        match self.durable.get(key).await {
            Ok(Some(artifact)) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                self.backfill_fast(key, &artifact).await;
                Some(CacheHit {
                    artifact,
                    tier: CacheTier::Durable,
                })
            }
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(err) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                warn!(
                    backend = self.durable.name(),
                    %key,
                    error = %err,
                    "durable tier read failed; treating as miss"
                );
                None
            }
        }
    }

    /// Stores an artifact in both tiers.
    ///
    /// The durable write must succeed; the fast write is best-effort.
    pub async fn put(&self, key: &CacheKey, artifact: &AudioArtifact) -> Result<(), CacheError> {
        if let Err(err) = self.durable.put(key, artifact).await {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
            return Err(err);
        }
        self.stats.writes.fetch_add(1, Ordering::Relaxed);

        if let Some(fast) = &self.fast {
            if let Err(err) = fast.put(key, artifact).await {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(
                    backend = fast.name(),
                    %key,
                    error = %err,
                    "fast tier write failed"
                );
            }
        }
        Ok(())
    }

    async fn backfill_fast(&self, key: &CacheKey, artifact: &AudioArtifact) {
        if let Some(fast) = &self.fast {
            if let Err(err) = fast.put(key, artifact).await {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(
                    backend = fast.name(),
                    %key,
                    error = %err,
                    "fast tier backfill failed"
                );
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn durable_name(&self) -> &'static str {
        self.durable.name()
    }

    pub fn fast_name(&self) -> Option<&'static str> {
        self.fast.as_ref().map(|f| f.name())
    }
}
