//! 播放模块：将合成的音频交给本地播放器。
//!
//! # Playback Module
//!
//! Sinks receive finished audio artifacts at the end of the pipeline. A
//! playback failure is never allowed to fail an announcement; the pipeline
//! logs it and moves on, since the audio is already cached for the next
//! attempt.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PlaybackSink`] | Trait for audio destinations |
//! | [`CommandPlayer`] | Spawns an external player process |
//! | [`MemorySink`] | Records artifacts, for tests |
//! | [`NullSink`] | Discards audio |

use crate::types::{AudioArtifact, SynthesisRequest};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, RwLock};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("playback i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audio player failed: {0}")]
    PlayerFailed(std::process::ExitStatus),
}

/// Destination for synthesized audio.
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    async fn play(
        &self,
        request: &SynthesisRequest,
        artifact: &AudioArtifact,
    ) -> Result<(), PlaybackError>;
}

/// Sink that discards everything.
pub struct NullSink;

#[async_trait]
impl PlaybackSink for NullSink {
    async fn play(&self, _: &SynthesisRequest, _: &AudioArtifact) -> Result<(), PlaybackError> {
        Ok(())
    }
}

/// A played announcement recorded by [`MemorySink`].
#[derive(Debug, Clone)]
pub struct PlayedEntry {
    pub request: SynthesisRequest,
    pub artifact: AudioArtifact,
}

/// In-memory sink for testing.
pub struct MemorySink {
    played: Arc<RwLock<Vec<PlayedEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            played: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn played(&self) -> Vec<PlayedEntry> {
        self.played.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.played.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.played.write().unwrap().clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackSink for MemorySink {
    async fn play(
        &self,
        request: &SynthesisRequest,
        artifact: &AudioArtifact,
    ) -> Result<(), PlaybackError> {
        self.played.write().unwrap().push(PlayedEntry {
            request: request.clone(),
            artifact: artifact.clone(),
        });
        Ok(())
    }
}

/// Sink that hands audio to an external player command.
///
/// The artifact is written to a named temp file which lives until the player
/// exits. A `volume` request option, when a volume flag is configured, is
/// appended as a single `<flag><value>` argument (e.g. `--volume=80`). An
/// optional chime file is played before each announcement.
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    volume_flag: Option<String>,
    chime: Option<PathBuf>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            volume_flag: None,
            chime: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Flag prefix the `volume` option is appended to, e.g. `--volume=`.
    pub fn with_volume_flag(mut self, flag: impl Into<String>) -> Self {
        self.volume_flag = Some(flag.into());
        self
    }

    /// Short sound played before every announcement. A missing file disables
    /// the chime with a warning rather than failing.
    pub fn with_chime(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_file() {
            self.chime = Some(path);
        } else {
            warn!(path = %path.display(), "chime file not found; chime disabled");
        }
        self
    }

    async fn spawn_player(&self, path: &Path, volume: Option<&str>) -> Result<(), PlaybackError> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        if let (Some(flag), Some(volume)) = (&self.volume_flag, volume) {
            cmd.arg(format!("{}{}", flag, volume));
        }
        cmd.arg(path);
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        let status = cmd.status().await?;
        if !status.success() {
            return Err(PlaybackError::PlayerFailed(status));
        }
        Ok(())
    }
}

#[async_trait]
impl PlaybackSink for CommandPlayer {
    async fn play(
        &self,
        request: &SynthesisRequest,
        artifact: &AudioArtifact,
    ) -> Result<(), PlaybackError> {
        if let Some(chime) = &self.chime {
            if let Err(err) = self.spawn_player(chime, None).await {
                warn!(error = %err, "chime playback failed");
            }
        }

        let file = write_artifact(artifact)?;
        self.spawn_player(file.path(), request.option("volume"))
            .await
    }
}

/// Holds the artifact on disk for the player's lifetime; the file is removed
/// when the handle drops.
fn write_artifact(artifact: &AudioArtifact) -> Result<NamedTempFile, PlaybackError> {
    let mut file = tempfile::Builder::new()
        .prefix("herald-")
        .suffix(&format!(".{}", artifact.format.extension()))
        .tempfile()?;
    file.write_all(&artifact.data)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AudioFormat;

    fn artifact() -> AudioArtifact {
        AudioArtifact::new(b"fake audio".to_vec(), AudioFormat::Mp3)
    }

    #[tokio::test]
    async fn test_memory_sink_records_plays() {
        let sink = MemorySink::new();
        let request = SynthesisRequest::new("hello").with_option("volume", "70");

        sink.play(&request, &artifact()).await.unwrap();
        sink.play(&request, &artifact()).await.unwrap();

        assert_eq!(sink.len(), 2);
        let played = sink.played();
        assert_eq!(played[0].request.text, "hello");
        assert_eq!(played[0].artifact.data, b"fake audio");

        sink.clear();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_null_sink_accepts_everything() {
        NullSink
            .play(&SynthesisRequest::new("x"), &artifact())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_command_player_success() {
        // `true` exits 0 no matter what arguments it receives.
        let player = CommandPlayer::new("true").with_volume_flag("--volume=");
        let request = SynthesisRequest::new("hi").with_option("volume", "80");
        player.play(&request, &artifact()).await.unwrap();
    }

    #[tokio::test]
    async fn test_command_player_failure_is_reported() {
        let player = CommandPlayer::new("false");
        let err = player
            .play(&SynthesisRequest::new("hi"), &artifact())
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::PlayerFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_player_is_an_io_error() {
        let player = CommandPlayer::new("herald-player-that-does-not-exist");
        let err = player
            .play(&SynthesisRequest::new("hi"), &artifact())
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::Io(_)));
    }

    #[test]
    fn test_missing_chime_is_disabled() {
        let player =
            CommandPlayer::new("true").with_chime("/nonexistent/chime.wav");
        assert!(player.chime.is_none());
    }

    #[test]
    fn test_write_artifact_uses_format_extension() {
        let file = write_artifact(&artifact()).unwrap();
        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("herald-"));
        assert!(name.ends_with(".mp3"));
        assert_eq!(std::fs::read(file.path()).unwrap(), b"fake audio");
    }
}
