//! HTTP synthesis provider adapter.

use super::retry::RetryPolicy;
use super::{ProviderError, SynthesisGateway};
use crate::types::{AudioArtifact, AudioFormat, SynthesisRequest};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Client for an HTTP speech synthesis endpoint.
///
/// The request body is JSON: the message text under `input`, plus every
/// request option forwarded verbatim as a string field. The response body is
/// the raw audio; its format comes from `Content-Type`, falling back to the
/// request's `response_format` option.
#[derive(Debug)]
pub struct HttpSynthesizer {
    http_client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl HttpSynthesizer {
    pub fn builder() -> HttpSynthesizerBuilder {
        HttpSynthesizerBuilder::new()
    }

    async fn request_once(
        &self,
        request: &SynthesisRequest,
    ) -> Result<AudioArtifact, ProviderError> {
        let mut fields = serde_json::Map::new();
        for (key, value) in &request.options {
            fields.insert(key.clone(), serde_json::Value::String(value.clone()));
        }
        // The text always wins over a like-named option.
        fields.insert(
            "input".to_string(),
            serde_json::Value::String(request.text.clone()),
        );
        let body = serde_json::Value::Object(fields);

        let mut req = self.http_client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = parse_retry_after(response.headers());
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
                retry_after_ms,
            });
        }

        let format = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(AudioFormat::from_mime)
            .unwrap_or_else(|| {
                request
                    .options
                    .get("response_format")
                    .map(|s| AudioFormat::from_str(s))
                    .unwrap_or(AudioFormat::Mp3)
            });
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::EmptyAudio);
        }
        Ok(AudioArtifact::new(bytes.to_vec(), format))
    }
}

#[async_trait]
impl SynthesisGateway for HttpSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioArtifact, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.request_once(request).await {
                Ok(artifact) => return Ok(artifact),
                Err(err) => match self.retry.next_delay(attempt, &err) {
                    Some(delay) => {
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "synthesis attempt failed; retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(err),
                },
            }
        }
    }
}

/// `Retry-After` in whole seconds; the HTTP-date form is ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| secs.saturating_mul(1000))
}

pub struct HttpSynthesizerBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl HttpSynthesizerBuilder {
    pub fn new() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Result<HttpSynthesizer, ProviderError> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| ProviderError::Configuration("endpoint must be specified".into()))?;
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| ProviderError::Configuration(format!("invalid endpoint: {}", e)))?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;
        Ok(HttpSynthesizer {
            http_client,
            endpoint,
            api_key: self.api_key,
            retry: self.retry,
        })
    }
}

impl Default for HttpSynthesizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
