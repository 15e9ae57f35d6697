// src/pipeline/import.rs

//! Import pipeline steps: analyze, edit, save, reset.
//!
//! Analysis replaces the stored draft. Edit and save load the draft into the
//! session first and write the outcome back, so each step can run as a
//! separate command.

use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::models::{Config, ImportMode, MoveDirection, PreviewBook};
use crate::services::{ContentAnalyzer, PreviewSubmitter, SessionHandle};
use crate::storage::DraftStorage;
use crate::utils::input::{read_image_files, read_text_file};

pub const MSG_NO_DRAFT: &str = "No draft found. Run 'analyze' first.";

/// Material to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    /// A text file (file mode)
    Text(PathBuf),
    /// Photographed pages, in reading order (scan mode)
    Images(Vec<PathBuf>),
}

impl ImportSource {
    pub fn mode(&self) -> ImportMode {
        match self {
            ImportSource::Text(_) => ImportMode::File,
            ImportSource::Images(_) => ImportMode::Scan,
        }
    }
}

/// A single edit to the stored draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    Move {
        index: usize,
        direction: MoveDirection,
    },
    Rename {
        index: usize,
        title: String,
    },
}

/// Load `source` into the session and analyze it.
///
/// On success the preview becomes the stored draft.
pub async fn run_analyze(
    config: &Config,
    storage: &dyn DraftStorage,
    session: &SessionHandle,
    analyzer: &dyn ContentAnalyzer,
    source: &ImportSource,
) -> Result<PreviewBook> {
    session.switch_mode(source.mode()).await;

    match source {
        ImportSource::Text(path) => {
            log::info!("Reading {}", path.display());
            let text = read_text_file(path, &config.input).await?;
            session.set_raw_text(Some(text)).await;
        }
        ImportSource::Images(paths) => {
            log::info!("Encoding {} page images", paths.len());
            let images = read_image_files(paths, &config.input).await?;
            session.set_images(images).await;
        }
    }

    let preview = session.analyze(analyzer).await?;
    let draft = storage.save_draft(&preview).await?;
    log::info!("Draft stored at {}", draft.updated_at.to_rfc3339());
    Ok(preview)
}

async fn load_draft_into(storage: &dyn DraftStorage, session: &SessionHandle) -> Result<()> {
    let draft = storage
        .load_draft()
        .await?
        .ok_or_else(|| AppError::validation(MSG_NO_DRAFT))?;
    session.load_preview(draft.preview).await
}

/// Apply one edit to the stored draft.
///
/// Out-of-range edits leave the draft unchanged and are reported as
/// validation errors.
pub async fn run_edit(
    storage: &dyn DraftStorage,
    session: &SessionHandle,
    edit: &DraftEdit,
) -> Result<PreviewBook> {
    load_draft_into(storage, session).await?;

    let applied = match edit {
        DraftEdit::Move { index, direction } => session.move_chapter(*index, *direction).await?,
        DraftEdit::Rename { index, title } => session.rename_chapter(*index, title).await?,
    };
    if !applied {
        let message = match edit {
            DraftEdit::Move { index, direction } => {
                let way = match direction {
                    MoveDirection::Up => "up",
                    MoveDirection::Down => "down",
                };
                format!("Chapter {} cannot move {}.", index, way)
            }
            DraftEdit::Rename { index, .. } => format!("No chapter at index {}.", index),
        };
        return Err(AppError::validation(message));
    }

    let preview = session
        .snapshot()
        .await
        .preview()
        .cloned()
        .ok_or_else(|| AppError::validation(MSG_NO_DRAFT))?;
    storage.save_draft(&preview).await?;
    Ok(preview)
}

/// Submit the stored draft to the backend.
pub async fn run_save(
    storage: &dyn DraftStorage,
    session: &SessionHandle,
    submitter: &dyn PreviewSubmitter,
) -> Result<()> {
    if let Some(draft) = storage.load_draft().await? {
        session.load_preview(draft.preview).await?;
    }

    session.save(submitter).await?;
    storage.mark_submitted().await?;
    Ok(())
}

/// Discard the session and the stored draft.
pub async fn run_reset(storage: &dyn DraftStorage, session: &SessionHandle) -> Result<bool> {
    session.reset().await;
    storage.clear_draft().await
}

/// Human-readable outline of a preview.
pub fn describe_preview(preview: &PreviewBook, item_width: usize) -> Vec<String> {
    let stats = preview.stats();
    let mut lines = vec![format!(
        "{} ({} chapters, {} lessons, {} items)",
        preview.book_title, stats.chapters, stats.lessons, stats.items
    )];

    for (index, chapter) in preview.chapters.iter().enumerate() {
        lines.push(format!("[{}] {}", index, chapter.chapter_title));
        for lesson in &chapter.lessons {
            lines.push(format!(
                "    {:<10} {:>3}  {}",
                lesson.lesson_type.as_str(),
                lesson.items.len(),
                lesson.item_preview(item_width)
            ));
        }
    }
    lines
}
