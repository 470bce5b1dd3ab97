//! Network-reachable fast cache tier.

use super::backend::CacheBackend;
use super::key::CacheKey;
use super::CacheError;
use crate::types::{AudioArtifact, AudioFormat};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Fast tier backed by a keyed HTTP blob store.
///
/// Artifacts live at `<base_url>/<key>`: `GET` returns the audio with its
/// format in `Content-Type`, `PUT` stores it, and 404 means the key is
/// absent. The short request timeout keeps a slow or unreachable store from
/// stalling announcements; the store treats every error from this tier as
/// survivable.
pub struct HttpCache {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCache {
    pub fn new(base_url: Url) -> Result<Self, CacheError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Uses a caller-supplied client, e.g. to adjust timeouts.
    pub fn with_client(client: reqwest::Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    fn url_for(&self, key: &CacheKey) -> Result<Url, CacheError> {
        self.base_url
            .join(key.as_str())
            .map_err(|err| CacheError::Backend(format!("invalid cache URL: {}", err)))
    }
}

#[async_trait]
impl CacheBackend for HttpCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<AudioArtifact>, CacheError> {
        let url = self.url_for(key)?;
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CacheError::Backend(format!(
                "fast tier GET returned HTTP {}",
                response.status()
            )));
        }
        let format = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(AudioFormat::from_mime)
            .unwrap_or(AudioFormat::Mp3);
        let data = response.bytes().await?.to_vec();
        Ok(Some(AudioArtifact::new(data, format)))
    }

    async fn put(&self, key: &CacheKey, artifact: &AudioArtifact) -> Result<(), CacheError> {
        let url = self.url_for(key)?;
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, artifact.format.mime_type())
            .body(artifact.data.clone())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CacheError::Backend(format!(
                "fast tier PUT returned HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let url = self.url_for(key)?;
        let response = self.client.head(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(CacheError::Backend(format!(
                "fast tier HEAD returned HTTP {}",
                response.status()
            )));
        }
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
