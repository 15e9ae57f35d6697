//! Storage abstractions for import drafts.
//!
//! A draft is the preview currently being edited, kept between command
//! invocations so analyze, edit and save can be separate steps.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Import configuration
//! └── drafts/
//!     └── current.json      # Preview being edited
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::PreviewBook;

// Re-export for convenience
pub use local::LocalStorage;

/// On-disk wrapper around a preview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Draft {
    /// ISO 8601 timestamp of the last change
    pub updated_at: DateTime<Utc>,
    /// When the draft was last accepted by the backend
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    pub preview: PreviewBook,
}

impl Draft {
    pub fn new(preview: PreviewBook) -> Self {
        Self {
            updated_at: Utc::now(),
            submitted_at: None,
            preview,
        }
    }

    /// Whether the preview changed since its last successful submit.
    pub fn has_unsubmitted_changes(&self) -> bool {
        self.submitted_at
            .is_none_or(|submitted| submitted < self.updated_at)
    }
}

/// Trait for draft storage backends.
#[async_trait]
pub trait DraftStorage: Send + Sync {
    /// Store `preview` as the current draft, stamping `updated_at`.
    async fn save_draft(&self, preview: &PreviewBook) -> Result<Draft>;

    /// Load the current draft, if any, with its preview normalized.
    async fn load_draft(&self) -> Result<Option<Draft>>;

    /// Record a successful backend submit of the current draft.
    async fn mark_submitted(&self) -> Result<Option<Draft>>;

    /// Remove the current draft. Returns whether one existed.
    async fn clear_draft(&self) -> Result<bool>;
}
