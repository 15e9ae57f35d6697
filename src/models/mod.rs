// src/models/mod.rs

//! Domain models for the book import pipeline.

mod config;
mod preview;

// Re-export all public types
pub use config::{AnalyzerConfig, BackendConfig, Config, InputConfig};
pub use preview::{
    LessonType, MoveDirection, PreviewBook, PreviewChapter, PreviewLesson, PreviewStats,
    UNKNOWN_BOOK_TITLE,
};

/// Where the raw input of an import comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// A text file read as UTF-8
    #[default]
    File,
    /// One or more photographed pages
    Scan,
}
