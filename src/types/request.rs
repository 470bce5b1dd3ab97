//! Synthesis request type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single announcement request: the text to speak plus provider-specific
/// synthesis options.
///
/// Options are kept in a [`BTreeMap`] so that serialization is canonical;
/// two requests with the same text and options always serialize to the same
/// bytes regardless of the order fields arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Fills in configured defaults without overriding anything the message
    /// itself carried.
    pub fn merge_defaults(&mut self, defaults: &BTreeMap<String, String>) {
        for (key, value) in defaults {
            self.options
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}
