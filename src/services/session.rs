// src/services/session.rs

//! Import session state machine.
//!
//! ```text
//! idle ──analyze──▶ analyzing ──ok──▶ ready ──save──▶ saving ──ok──▶ idle
//!                       │                                │
//!                       └──────────err──▶ error ◀──err───┘
//! ```
//!
//! `ImportSession` holds the pure transitions. `SessionHandle` owns one
//! session behind an async mutex and drives the network calls without
//! holding the lock across them.
//!
//! Only one analyze or save may be in flight. Every in-flight operation
//! carries a [`Ticket`]; `reset` and `close` invalidate outstanding tickets
//! so late results are discarded instead of overwriting newer state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{ImportMode, MoveDirection, PreviewBook};
use crate::services::analyzer::{AnalysisInput, ContentAnalyzer, MSG_NO_INPUT};
use crate::services::submitter::{MSG_NO_PREVIEW, PreviewSubmitter};

pub const MSG_ANALYZE_IN_FLIGHT: &str = "An analysis is already in progress.";
pub const MSG_SAVE_IN_FLIGHT: &str = "A save is already in progress.";
pub const MSG_NOTHING_TO_EDIT: &str = "No preview available to edit.";
pub const MSG_CLOSED: &str = "The import session has been closed.";

/// Externally visible phase of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Analyzing,
    Ready,
    Saving,
    Error(String),
}

/// Network operation a ticket was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Analyze,
    Save,
}

/// Issued when an operation starts; required to apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    operation: Operation,
    generation: u64,
}

impl Ticket {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportSession {
    mode: ImportMode,
    raw_text: Option<String>,
    images: Vec<String>,
    status: SessionStatus,
    preview: Option<PreviewBook>,
    generation: u64,
    closed: bool,
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ImportMode {
        self.mode
    }

    pub fn raw_text(&self) -> Option<&str> {
        self.raw_text.as_deref()
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn preview(&self) -> Option<&PreviewBook> {
        self.preview.as_ref()
    }

    /// Message of the last failure, if the session is in the error state.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            SessionStatus::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Whether an analyze or save is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Analyzing | SessionStatus::Saving
        )
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Current input buffers as analysis material.
    pub fn input(&self) -> AnalysisInput {
        AnalysisInput {
            raw_text: self.raw_text.clone(),
            images: self.images.clone(),
        }
    }

    /// Status to fall back to once an error is dismissed.
    fn settled_status(&self) -> SessionStatus {
        if self.preview.is_some() {
            SessionStatus::Ready
        } else {
            SessionStatus::Idle
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.closed {
            return Err(AppError::validation(MSG_CLOSED));
        }
        match self.status {
            SessionStatus::Analyzing => Err(AppError::busy(MSG_ANALYZE_IN_FLIGHT)),
            SessionStatus::Saving => Err(AppError::busy(MSG_SAVE_IN_FLIGHT)),
            _ => Ok(()),
        }
    }

    fn fail(&mut self, error: AppError) -> AppError {
        let message = error.user_message();
        log::debug!("Session error: {}", message);
        self.status = SessionStatus::Error(message);
        error
    }

    /// Select the input mode. Clears the current error, keeps the preview.
    pub fn set_mode(&mut self, mode: ImportMode) {
        self.mode = mode;
        if self.error().is_some() {
            self.status = self.settled_status();
        }
    }

    /// Select the input mode and drop the buffer of the other one.
    pub fn switch_mode(&mut self, mode: ImportMode) {
        self.set_mode(mode);
        match mode {
            ImportMode::File => self.images.clear(),
            ImportMode::Scan => self.raw_text = None,
        }
    }

    pub fn set_raw_text(&mut self, text: Option<String>) {
        self.raw_text = text;
    }

    pub fn set_images(&mut self, images: Vec<String>) {
        self.images = images;
    }

    /// Install a preview obtained elsewhere, e.g. a stored draft.
    pub fn load_preview(&mut self, preview: PreviewBook) -> Result<()> {
        self.ensure_idle()?;
        self.preview = Some(preview);
        self.status = SessionStatus::Ready;
        Ok(())
    }

    /// Start an analysis of the current buffers.
    pub fn begin_analyze(&mut self) -> Result<(Ticket, AnalysisInput)> {
        self.ensure_idle()?;

        let input = self.input();
        if input.is_empty() {
            return Err(self.fail(AppError::validation(MSG_NO_INPUT)));
        }

        self.status = SessionStatus::Analyzing;
        log::debug!("Session: analyzing");
        Ok((
            Ticket {
                operation: Operation::Analyze,
                generation: self.generation,
            },
            input,
        ))
    }

    /// Apply an analysis result. Returns `false` if the ticket is stale.
    pub fn complete_analyze(&mut self, ticket: Ticket, result: &Result<PreviewBook>) -> bool {
        if !self.accepts(ticket, Operation::Analyze) {
            return false;
        }
        match result {
            Ok(preview) => {
                self.preview = Some(preview.clone());
                self.status = SessionStatus::Ready;
                log::debug!("Session: ready");
            }
            Err(error) => {
                self.status = SessionStatus::Error(error.user_message());
                log::debug!("Session: analysis failed");
            }
        }
        true
    }

    /// Start saving the held preview; returns the snapshot to submit.
    pub fn begin_save(&mut self) -> Result<(Ticket, PreviewBook)> {
        self.ensure_idle()?;

        let Some(preview) = self.preview.clone() else {
            return Err(self.fail(AppError::validation(MSG_NO_PREVIEW)));
        };

        self.status = SessionStatus::Saving;
        log::debug!("Session: saving");
        Ok((
            Ticket {
                operation: Operation::Save,
                generation: self.generation,
            },
            preview,
        ))
    }

    /// Apply a save result. The preview is kept either way.
    pub fn complete_save(&mut self, ticket: Ticket, result: &Result<()>) -> bool {
        if !self.accepts(ticket, Operation::Save) {
            return false;
        }
        match result {
            Ok(()) => {
                self.status = SessionStatus::Idle;
                log::debug!("Session: saved");
            }
            Err(error) => {
                self.status = SessionStatus::Error(error.user_message());
                log::debug!("Session: save failed");
            }
        }
        true
    }

    /// Settle an operation whose result will never arrive.
    ///
    /// Returns `false` if the ticket is already stale.
    pub fn abandon(&mut self, ticket: Ticket) -> bool {
        if !self.accepts(ticket, ticket.operation()) {
            return false;
        }
        self.status = self.settled_status();
        log::debug!("Session: {:?} abandoned", ticket.operation());
        true
    }

    fn accepts(&self, ticket: Ticket, operation: Operation) -> bool {
        let in_flight = match operation {
            Operation::Analyze => SessionStatus::Analyzing,
            Operation::Save => SessionStatus::Saving,
        };
        !self.closed
            && ticket.operation == operation
            && ticket.generation == self.generation
            && self.status == in_flight
    }

    fn editable_preview(&mut self) -> Result<&mut PreviewBook> {
        self.ensure_idle()?;
        self.preview
            .as_mut()
            .ok_or_else(|| AppError::validation(MSG_NOTHING_TO_EDIT))
    }

    /// Move a chapter one step. `Ok(false)` when the move is out of range.
    pub fn move_chapter(&mut self, index: usize, direction: MoveDirection) -> Result<bool> {
        Ok(self.editable_preview()?.move_chapter(index, direction))
    }

    /// Rename a chapter. `Ok(false)` when the index is out of range.
    pub fn rename_chapter(&mut self, index: usize, title: &str) -> Result<bool> {
        Ok(self.editable_preview()?.rename_chapter(index, title))
    }

    /// Return to idle with every buffer cleared, whatever the current state.
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        let closed = self.closed;
        *self = Self {
            generation,
            closed,
            ..Self::default()
        };
        log::debug!("Session: reset");
    }

    /// Tear the session down; outstanding results will be discarded.
    pub fn close(&mut self) {
        self.closed = true;
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Keeps the ticket of an in-flight call until its result is applied.
///
/// Dropping it armed (the caller's future was cancelled) abandons the ticket
/// so the session does not stay busy.
struct InFlight {
    inner: Arc<Mutex<ImportSession>>,
    ticket: Option<Ticket>,
}

impl InFlight {
    fn new(inner: &Arc<Mutex<ImportSession>>, ticket: Ticket) -> Self {
        Self {
            inner: Arc::clone(inner),
            ticket: Some(ticket),
        }
    }

    fn disarm(mut self) -> Option<Ticket> {
        self.ticket.take()
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        if let Ok(mut session) = self.inner.try_lock() {
            session.abandon(ticket);
            return;
        }
        let inner = Arc::clone(&self.inner);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    inner.lock().await.abandon(ticket);
                });
            }
            Err(_) => log::warn!("Cancelled {:?} left the session busy", ticket.operation()),
        }
    }
}

/// Shared single-writer handle to one import session.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<ImportSession>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current session state.
    pub async fn snapshot(&self) -> ImportSession {
        self.inner.lock().await.clone()
    }

    pub async fn set_mode(&self, mode: ImportMode) {
        self.inner.lock().await.set_mode(mode);
    }

    pub async fn switch_mode(&self, mode: ImportMode) {
        self.inner.lock().await.switch_mode(mode);
    }

    pub async fn set_raw_text(&self, text: Option<String>) {
        self.inner.lock().await.set_raw_text(text);
    }

    pub async fn set_images(&self, images: Vec<String>) {
        self.inner.lock().await.set_images(images);
    }

    pub async fn load_preview(&self, preview: PreviewBook) -> Result<()> {
        self.inner.lock().await.load_preview(preview)
    }

    pub async fn move_chapter(&self, index: usize, direction: MoveDirection) -> Result<bool> {
        self.inner.lock().await.move_chapter(index, direction)
    }

    pub async fn rename_chapter(&self, index: usize, title: &str) -> Result<bool> {
        self.inner.lock().await.rename_chapter(index, title)
    }

    pub async fn reset(&self) {
        self.inner.lock().await.reset();
    }

    pub async fn close(&self) {
        self.inner.lock().await.close();
    }

    /// Analyze the current buffers and store the preview.
    pub async fn analyze(&self, analyzer: &dyn ContentAnalyzer) -> Result<PreviewBook> {
        let (ticket, input) = self.inner.lock().await.begin_analyze()?;
        let in_flight = InFlight::new(&self.inner, ticket);

        let result = analyzer.analyze(&input).await;

        let mut session = self.inner.lock().await;
        let applied = in_flight
            .disarm()
            .is_some_and(|ticket| session.complete_analyze(ticket, &result));
        if !applied {
            log::debug!("Discarding analysis result for a reset or closed session");
        }
        result
    }

    /// Submit the held preview to the backend.
    pub async fn save(&self, submitter: &dyn PreviewSubmitter) -> Result<()> {
        let (ticket, preview) = self.inner.lock().await.begin_save()?;
        let in_flight = InFlight::new(&self.inner, ticket);

        let result = submitter.submit(&preview).await;

        let mut session = self.inner.lock().await;
        let applied = in_flight
            .disarm()
            .is_some_and(|ticket| session.complete_save(ticket, &result));
        if !applied {
            log::debug!("Discarding save result for a reset or closed session");
        }
        result
    }
}
