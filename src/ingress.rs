//! 消息入口模块：解码传输层载荷并驱动流水线。
//!
//! # Message Ingress
//!
//! Payloads arrive as raw bytes from whatever transport delivers them; this
//! module turns them into [`SynthesisRequest`]s and feeds the pipeline.
//! Decoding is strict: a payload that is not a JSON object with a non-empty
//! string `text` is rejected here, before it can reach the cache or the
//! provider. Every other scalar field rides along verbatim as a synthesis
//! option.

use crate::pipeline::Pipeline;
use crate::types::SynthesisRequest;
use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Why a payload was rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing required field `text`")]
    MissingText,

    #[error("field `text` must be a string")]
    TextNotAString,

    #[error("field `text` must be a non-empty string")]
    EmptyText,

    #[error("field `{0}` must be a scalar value")]
    NonScalarField(String),
}

/// Decodes one transport payload into a request.
///
/// Strings pass through untouched; numbers and booleans are rendered to
/// their literal form. `null`, arrays, and nested objects have no scalar
/// rendering and make the whole payload malformed.
pub fn decode_payload(payload: &[u8]) -> Result<SynthesisRequest, DecodeError> {
    let value: Value = serde_json::from_slice(payload)?;
    let map = value.as_object().ok_or(DecodeError::NotAnObject)?;

    let text = match map.get("text") {
        None => return Err(DecodeError::MissingText),
        Some(Value::String(s)) => s,
        Some(_) => return Err(DecodeError::TextNotAString),
    };
    if text.trim().is_empty() {
        return Err(DecodeError::EmptyText);
    }

    let mut options = BTreeMap::new();
    for (field, value) in map {
        if field == "text" {
            continue;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                return Err(DecodeError::NonScalarField(field.clone()))
            }
        };
        options.insert(field.clone(), rendered);
    }

    Ok(SynthesisRequest {
        text: text.clone(),
        options,
    })
}

/// Consumes delivered payloads and runs each through the pipeline.
pub struct Ingress {
    pipeline: Arc<Pipeline>,
}

impl Ingress {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    /// Runs until the channel closes, then drains in-flight announcements.
    ///
    /// Each message gets its own task so a slow synthesis never blocks the
    /// next announcement. Malformed payloads are logged and dropped.
    pub async fn run(self, mut messages: mpsc::Receiver<Bytes>) {
        let mut inflight = FuturesUnordered::new();
        loop {
            tokio::select! {
                maybe = messages.recv() => match maybe {
                    Some(payload) => match decode_payload(&payload) {
                        Ok(request) => inflight.push(self.spawn_announcement(request)),
                        Err(err) => warn!(error = %err, bytes = payload.len(), "discarding malformed payload"),
                    },
                    None => break,
                },
                Some(joined) = inflight.next(), if !inflight.is_empty() => {
                    if let Err(err) = joined {
                        error!(error = %err, "announcement task panicked");
                    }
                }
            }
        }

        while let Some(joined) = inflight.next().await {
            if let Err(err) = joined {
                error!(error = %err, "announcement task panicked");
            }
        }
    }

    fn spawn_announcement(&self, request: SynthesisRequest) -> tokio::task::JoinHandle<()> {
        let pipeline = Arc::clone(&self.pipeline);
        let request_id = Uuid::new_v4();
        let task = async move {
            match pipeline.handle(request).await {
                Ok(announcement) => info!(
                    key = %announcement.key,
                    source = ?announcement.source,
                    format = %announcement.format,
                    bytes = announcement.bytes,
                    "announcement delivered"
                ),
                Err(err) => error!(error = %err, "announcement failed"),
            }
        };
        tokio::spawn(task.instrument(info_span!("announce", %request_id)))
    }
}
