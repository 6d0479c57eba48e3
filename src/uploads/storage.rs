//! # Audio Store
//!
//! Validates and writes uploaded audio clips to the upload directory.
//!
//! ## Validation order
//! 1. Declared MIME type must be in the allowed set (checked before any byte is written)
//! 2. Streamed size must not exceed the limit (checked while writing; the
//!    partial file is removed on overflow)
//!
//! A request with no file part at all is rejected by the caller, which is the
//! only place that knows whether a part was present.
//!
//! ## File naming
//! `audio-<unix millis>-<random 0..=1e9><.ext>`. Two uploads in the same
//! millisecond collide only if they also draw the same random suffix.

use crate::companion::random::RandomSource;
use crate::config::UploadConfig;
use crate::error::{AppError, AppResult};
use actix_web::web::Bytes;
use futures_util::stream::{Stream, StreamExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const FILENAME_PREFIX: &str = "audio";
const RANDOM_SUFFIX_MAX: f64 = 1e9;

/// An accepted clip on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAudio {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    max_bytes: u64,
    allowed_mime_types: Vec<String>,
    random: Arc<dyn RandomSource>,
}

impl AudioStore {
    pub fn new(config: &UploadConfig, random: Arc<dyn RandomSource>) -> Self {
        Self {
            dir: config.dir_path(),
            max_bytes: config.max_file_size_bytes,
            allowed_mime_types: config
                .allowed_mime_types
                .iter()
                .map(|m| m.to_ascii_lowercase())
                .collect(),
            random,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Accept the declared content type or reject the upload.
    ///
    /// Parameters such as `; codecs=opus` are ignored; a missing type is rejected.
    pub fn check_mime(&self, declared: Option<&str>) -> AppResult<String> {
        let essence = declared
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if self.allowed_mime_types.iter().any(|allowed| *allowed == essence) {
            Ok(essence)
        } else {
            debug!(declared = ?declared, "Rejected upload content type");
            Err(AppError::unsupported_media_type())
        }
    }

    /// Generate the on-disk name for a clip whose client-side name was `original_name`.
    pub fn stored_filename(&self, original_name: Option<&str>) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix = (self.random.next_unit() * RANDOM_SUFFIX_MAX).round() as u64;
        format!(
            "{}-{}-{}{}",
            FILENAME_PREFIX,
            millis,
            suffix,
            extension_of(original_name)
        )
    }

    /// Validate and write one clip.
    ///
    /// The directory is created if absent. On any failure after the file was
    /// created, the partial file is removed before the error is returned.
    pub async fn persist<S, E>(
        &self,
        original_name: Option<&str>,
        declared_mime: Option<&str>,
        mut stream: S,
    ) -> AppResult<StoredAudio>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: fmt::Display,
    {
        let mime_type = self.check_mime(declared_mime)?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let filename = self.stored_filename(original_name);
        let path = self.dir.join(&filename);
        let mut file = tokio::fs::File::create(&path).await?;

        let mut size_bytes: u64 = 0;
        let outcome: AppResult<()> = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk
                    .map_err(|e| AppError::ValidationError(format!("Failed to read upload: {}", e)))?;
                size_bytes += chunk.len() as u64;
                if size_bytes > self.max_bytes {
                    return Err(AppError::payload_too_large(self.max_bytes));
                }
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok::<(), AppError>(())
        }
        .await;

        if let Err(err) = outcome {
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                warn!(file = %filename, error = %remove_err, "Failed to remove rejected upload");
            }
            return Err(err);
        }

        info!(file = %filename, size_bytes, mime = %mime_type, "Audio file stored");

        Ok(StoredAudio {
            filename,
            path,
            size_bytes,
            mime_type,
        })
    }
}

/// `.ext` of the client-side name, or empty when there is none.
///
/// Only ASCII alphanumeric extensions are kept.
fn extension_of(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companion::random::FixedRandom;
    use crate::config::AppConfig;
    use futures_util::stream;
    use std::convert::Infallible;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir, max_bytes: u64) -> AudioStore {
        let mut config = AppConfig::default().uploads;
        config.dir = temp.path().join("uploads/audio").to_string_lossy().into_owned();
        config.max_file_size_bytes = max_bytes;
        AudioStore::new(&config, Arc::new(FixedRandom(0.25)))
    }

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, Infallible>> + Unpin {
        let owned: Vec<Result<Bytes, Infallible>> = parts
            .iter()
            .map(|p| Ok(Bytes::from_static(p.as_bytes())))
            .collect();
        stream::iter(owned)
    }

    #[test]
    fn test_check_mime() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, 1024);
        assert_eq!(store.check_mime(Some("audio/wav")).unwrap(), "audio/wav");
        assert_eq!(store.check_mime(Some("Audio/WebM; codecs=opus")).unwrap(), "audio/webm");
        assert!(matches!(store.check_mime(Some("text/plain")), Err(AppError::UnsupportedMediaType(_))));
        assert!(matches!(store.check_mime(Some("audio/mpeg")), Err(AppError::UnsupportedMediaType(_))));
        assert!(matches!(store.check_mime(None), Err(AppError::UnsupportedMediaType(_))));
    }

    #[test]
    fn test_stored_filename_shape() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, 1024);

        let name = store.stored_filename(Some("clip.final.wav"));
        let parts: Vec<&str> = name.trim_end_matches(".wav").split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "audio");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[2], "250000000");
        assert!(name.ends_with(".wav"));

        assert!(!store.stored_filename(Some("noext")).contains('.'));
        assert!(!store.stored_filename(None).contains('.'));
        assert!(!store.stored_filename(Some("evil.w v")).contains('.'));
    }

    #[tokio::test]
    async fn test_persist_writes_file_and_creates_dir() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, 1024);
        assert!(!store.dir().exists());

        let stored = store
            .persist(Some("hello.ogg"), Some("audio/ogg"), chunks(&["OggS", "data"]))
            .await
            .unwrap();

        assert_eq!(stored.size_bytes, 8);
        assert_eq!(stored.mime_type, "audio/ogg");
        assert!(stored.filename.ends_with(".ogg"));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"OggSdata");
    }

    #[tokio::test]
    async fn test_persist_rejects_oversized_and_removes_partial() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, 6);

        let err = store
            .persist(Some("big.wav"), Some("audio/wav"), chunks(&["1234", "5678"]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert_eq!(std::fs::read_dir(store.dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_persist_accepts_exact_limit() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, 8);
        let stored = store
            .persist(Some("edge.wav"), Some("audio/wav"), chunks(&["1234", "5678"]))
            .await
            .unwrap();
        assert_eq!(stored.size_bytes, 8);
    }

    #[tokio::test]
    async fn test_persist_rejects_bad_type_before_writing() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, 1024);
        let err = store
            .persist(Some("notes.txt"), Some("text/plain"), chunks(&["hi"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
        assert!(!store.dir().exists());
    }
}
