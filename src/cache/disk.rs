//! Durable filesystem cache tier.

use super::key::CacheKey;
use super::CacheError;
use crate::types::{AudioArtifact, AudioFormat};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use super::backend::CacheBackend;

/// Filesystem-backed tier, one file per key named `<hex>.<ext>`.
///
/// This is the durable source of truth. Writes go to a temporary sibling
/// first and are renamed into place, so a crash or cancellation mid-write can
/// never leave a truncated artifact behind under the real name. Retention is
/// unbounded; changed synthesis parameters produce new keys rather than
/// overwriting old entries.
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    /// Opens the cache rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &CacheKey, format: AudioFormat) -> PathBuf {
        self.root.join(format!("{}.{}", key, format.extension()))
    }
}

#[async_trait]
impl CacheBackend for DiskCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<AudioArtifact>, CacheError> {
        for format in AudioFormat::ALL {
            match fs::read(self.path_for(key, format)).await {
                Ok(data) => return Ok(Some(AudioArtifact::new(data, format))),
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(None)
    }

    async fn put(&self, key: &CacheKey, artifact: &AudioArtifact) -> Result<(), CacheError> {
        let target = self.path_for(key, artifact.format);
        let staging = self
            .root
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4().simple()));

        fs::write(&staging, &artifact.data).await?;
        if let Err(err) = fs::rename(&staging, &target).await {
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }

        // A key maps to at most one artifact; drop leftovers in other formats.
        for format in AudioFormat::ALL {
            if format != artifact.format {
                let _ = fs::remove_file(self.path_for(key, format)).await;
            }
        }
        Ok(())
    }

    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        for format in AudioFormat::ALL {
            if fs::try_exists(self.path_for(key, format)).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SynthesisRequest;

    fn key(text: &str) -> CacheKey {
        CacheKey::derive(&SynthesisRequest::new(text))
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).await.unwrap();
        let key = key("laundry done");

        assert!(cache.get(&key).await.unwrap().is_none());
        cache
            .put(&key, &AudioArtifact::new(b"mp3 bytes".to_vec(), AudioFormat::Mp3))
            .await
            .unwrap();

        let artifact = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(artifact.data, b"mp3 bytes");
        assert_eq!(artifact.format, AudioFormat::Mp3);
        assert!(cache.contains(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let cache = DiskCache::new(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(cache.root(), nested.as_path());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_and_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).await.unwrap();
        let key = key("version");

        cache
            .put(&key, &AudioArtifact::new(b"old".to_vec(), AudioFormat::Mp3))
            .await
            .unwrap();
        cache
            .put(&key, &AudioArtifact::new(b"new".to_vec(), AudioFormat::Mp3))
            .await
            .unwrap();

        assert_eq!(cache.get(&key).await.unwrap().unwrap().data, b"new");

        let mut entries = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        entries.sort();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].ends_with(".tmp"));
    }

    #[tokio::test]
    async fn test_format_change_drops_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).await.unwrap();
        let key = key("format change");

        cache
            .put(&key, &AudioArtifact::new(b"wav".to_vec(), AudioFormat::Wav))
            .await
            .unwrap();
        cache
            .put(&key, &AudioArtifact::new(b"mp3".to_vec(), AudioFormat::Mp3))
            .await
            .unwrap();

        let artifact = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(artifact.format, AudioFormat::Mp3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_unrelated_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not audio").unwrap();

        assert!(cache.get(&key("anything")).await.unwrap().is_none());
    }
}
