//! Cache key derivation.

use crate::types::SynthesisRequest;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Deterministic fingerprint of a synthesis request.
///
/// The key is the SHA-256 digest of the request's canonical JSON form,
/// rendered as lowercase hex. Identical text and options always produce the
/// same key; changing any option (or a configured default merged into the
/// options) produces a different one, so stale audio can never be served for
/// changed synthesis parameters. The hex form is safe to use directly as a
/// filename or URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    hash: String,
}

impl CacheKey {
    pub fn derive(request: &SynthesisRequest) -> Self {
        let canonical = serde_json::to_string(request).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        Self { hash }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}
