//! 流水线模块：请求编排，包含去重、缓存与播放。
//!
//! # Announcement Pipeline
//!
//! [`Pipeline::handle`] carries one request from decoded message to audible
//! announcement: derive the cache key, consult the cache, synthesize on a
//! miss, write through, play. Identical requests arriving concurrently are
//! coalesced behind a per-key lock so the provider is called exactly once
//! per distinct message, no matter how many duplicates race.

use crate::cache::{CacheKey, CacheStore, CacheTier};
use crate::gateway::SynthesisGateway;
use crate::playback::PlaybackSink;
use crate::types::{AudioArtifact, AudioFormat, SynthesisRequest};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Where an announcement's audio came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSource {
    FastCache,
    DurableCache,
    Synthesized,
}

/// A delivered announcement.
#[derive(Debug, Clone)]
pub struct Announcement {
    pub key: CacheKey,
    pub source: AudioSource,
    pub format: AudioFormat,
    pub bytes: usize,
}

/// Slot shared by concurrent requests for one key. The leader stores its
/// synthesized artifact here so waiters can reuse it even if the cache
/// write failed.
type InflightSlot = Arc<Mutex<Option<AudioArtifact>>>;

pub struct Pipeline {
    store: Arc<CacheStore>,
    gateway: Arc<dyn SynthesisGateway>,
    sink: Arc<dyn PlaybackSink>,
    defaults: BTreeMap<String, String>,
    inflight: Mutex<HashMap<String, InflightSlot>>,
}

impl Pipeline {
    pub fn new(
        store: Arc<CacheStore>,
        gateway: Arc<dyn SynthesisGateway>,
        sink: Arc<dyn PlaybackSink>,
    ) -> Self {
        Self {
            store,
            gateway,
            sink,
            defaults: BTreeMap::new(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Synthesis options applied beneath every message's own options. These
    /// participate in key derivation, so changing a default re-synthesizes.
    pub fn with_defaults(mut self, defaults: BTreeMap<String, String>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Runs one request through the pipeline.
    ///
    /// Cached audio is played without touching the provider. On a miss the
    /// artifact is synthesized, written through the cache, and played; a
    /// durable write failure is logged but does not silence the
    /// announcement. A provider failure surfaces as an error with nothing
    /// cached and nothing played.
    pub async fn handle(&self, mut request: SynthesisRequest) -> Result<Announcement> {
        request.merge_defaults(&self.defaults);
        let key = CacheKey::derive(&request);
        debug!(%key, chars = request.text.len(), "derived cache key");

        if let Some(hit) = self.store.get(&key).await {
            info!(%key, tier = ?hit.tier, "cache hit");
            return self.deliver(&request, &key, &hit.artifact, source_of(hit.tier)).await;
        }

        self.synthesize_coalesced(&request, &key).await
    }

    /// Miss path. Holds the per-key slot lock across the provider call so
    /// duplicate requests wait for the leader instead of synthesizing again.
    async fn synthesize_coalesced(
        &self,
        request: &SynthesisRequest,
        key: &CacheKey,
    ) -> Result<Announcement> {
        let slot = self.inflight_slot(key).await;
        let outcome = {
            let mut guard = slot.lock().await;
            if let Some(artifact) = guard.as_ref() {
                debug!(%key, "reusing in-flight synthesis result");
                self.deliver(request, key, artifact, AudioSource::Synthesized)
                    .await
            } else if let Some(hit) = self.store.get(key).await {
                // The leader finished and cached while this request waited.
                info!(%key, tier = ?hit.tier, "cache hit");
                self.deliver(request, key, &hit.artifact, source_of(hit.tier))
                    .await
            } else {
                info!(%key, "cache miss; requesting synthesis");
                match self.gateway.synthesize(request).await {
                    Ok(artifact) => {
                        if let Err(err) = self.store.put(key, &artifact).await {
                            error!(
                                %key,
                                error = %err,
                                "durable cache write failed; announcement will not be reusable"
                            );
                        }
                        let outcome = self
                            .deliver(request, key, &artifact, AudioSource::Synthesized)
                            .await;
                        *guard = Some(artifact);
                        outcome
                    }
                    Err(err) => {
                        error!(%key, error = %err, "synthesis failed");
                        Err(Error::Provider(err))
                    }
                }
            }
        };
        drop(slot);
        self.release(key).await;
        outcome
    }

    async fn deliver(
        &self,
        request: &SynthesisRequest,
        key: &CacheKey,
        artifact: &AudioArtifact,
        source: AudioSource,
    ) -> Result<Announcement> {
        if let Err(err) = self.sink.play(request, artifact).await {
            warn!(%key, error = %err, "playback failed");
        }
        Ok(Announcement {
            key: key.clone(),
            source,
            format: artifact.format,
            bytes: artifact.data.len(),
        })
    }

    async fn inflight_slot(&self, key: &CacheKey) -> InflightSlot {
        let mut map = self.inflight.lock().await;
        Arc::clone(map.entry(key.as_str().to_owned()).or_default())
    }

    /// Drops the registry entry once the last holder is done with it.
    async fn release(&self, key: &CacheKey) {
        let mut map = self.inflight.lock().await;
        if let Some(slot) = map.get(key.as_str()) {
            if Arc::strong_count(slot) == 1 {
                map.remove(key.as_str());
            }
        }
    }

    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.store.stats()
    }
}

fn source_of(tier: CacheTier) -> AudioSource {
    match tier {
        CacheTier::Fast => AudioSource::FastCache,
        CacheTier::Durable => AudioSource::DurableCache,
    }
}
