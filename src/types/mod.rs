//! 核心类型模块：定义合成请求与音频产物的强类型表示。
//!
//! # Types Module
//!
//! This module defines the core data types shared across the announcement
//! pipeline, providing strongly-typed representations for inbound requests
//! and synthesized audio.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SynthesisRequest`] | A text message plus its synthesis options |
//! | [`AudioArtifact`] | Synthesized audio bytes with their format |
//! | [`AudioFormat`] | Supported audio container formats |
//!
//! ## Submodules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`audio`] | Audio artifact and format types |
//! | [`request`] | Synthesis request type and option handling |

pub mod audio;
pub mod request;

pub use audio::{AudioArtifact, AudioFormat};
pub use request::SynthesisRequest;
