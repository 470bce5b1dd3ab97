//! Cache backend trait and in-process implementations.

use super::key::CacheKey;
use super::CacheError;
use crate::types::AudioArtifact;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

/// A single cache tier.
///
/// Backends store complete audio artifacts keyed by [`CacheKey`]. How a
/// backend's failures are treated is up to the caller; [`super::CacheStore`]
/// surfaces durable-tier write failures and absorbs everything else.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<AudioArtifact>, CacheError>;
    async fn put(&self, key: &CacheKey, artifact: &AudioArtifact) -> Result<(), CacheError>;
    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError>;
    fn name(&self) -> &'static str;
}

/// Bounded in-process tier. Useful as a fast tier when no network cache is
/// deployed, and as a test double.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, AudioArtifact>>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<AudioArtifact>, CacheError> {
        Ok(self.entries.lock().await.get(key.as_str()).cloned())
    }

    async fn put(&self, key: &CacheKey, artifact: &AudioArtifact) -> Result<(), CacheError> {
        self.entries
            .lock()
            .await
            .put(key.as_str().to_owned(), artifact.clone());
        Ok(())
    }

    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.entries.lock().await.contains(key.as_str()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Backend that stores nothing. Stands in for a disabled tier.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn get(&self, _: &CacheKey) -> Result<Option<AudioArtifact>, CacheError> {
        Ok(None)
    }

    async fn put(&self, _: &CacheKey, _: &AudioArtifact) -> Result<(), CacheError> {
        Ok(())
    }

    async fn contains(&self, _: &CacheKey) -> Result<bool, CacheError> {
        Ok(false)
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
