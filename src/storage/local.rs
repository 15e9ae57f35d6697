//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml           # Import configuration
//! └── drafts/
//!     └── current.json      # Current draft
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::PreviewBook;
use crate::services::normalize_preview;
use crate::storage::{Draft, DraftStorage};

const CURRENT_DRAFT: &str = "drafts/current.json";

/// Draft as found on disk. The preview stays loose until normalized.
#[derive(Deserialize)]
struct StoredDraft {
    updated_at: DateTime<Utc>,
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    preview: Value,
}

impl From<StoredDraft> for Draft {
    fn from(stored: StoredDraft) -> Self {
        Draft {
            updated_at: stored.updated_at,
            submitted_at: stored.submitted_at,
            preview: normalize_preview(&stored.preview),
        }
    }
}

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DraftStorage for LocalStorage {
    async fn save_draft(&self, preview: &PreviewBook) -> Result<Draft> {
        let submitted_at = match self.read_json::<StoredDraft>(CURRENT_DRAFT).await {
            Ok(existing) => existing.and_then(|d| d.submitted_at),
            Err(e) => {
                log::warn!(
                    "Existing draft at {} unreadable, submit time dropped: {}",
                    self.path(CURRENT_DRAFT).display(),
                    e
                );
                None
            }
        };

        let draft = Draft {
            submitted_at,
            ..Draft::new(preview.clone())
        };
        self.write_json(CURRENT_DRAFT, &draft).await?;
        log::debug!("Draft written to {}", self.path(CURRENT_DRAFT).display());
        Ok(draft)
    }

    async fn load_draft(&self) -> Result<Option<Draft>> {
        let stored = self.read_json::<StoredDraft>(CURRENT_DRAFT).await?;
        Ok(stored.map(Draft::from))
    }

    async fn mark_submitted(&self) -> Result<Option<Draft>> {
        let Some(mut draft) = self.load_draft().await? else {
            return Ok(None);
        };
        draft.submitted_at = Some(Utc::now());
        self.write_json(CURRENT_DRAFT, &draft).await?;
        Ok(Some(draft))
    }

    async fn clear_draft(&self) -> Result<bool> {
        match tokio::fs::remove_file(self.path(CURRENT_DRAFT)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
