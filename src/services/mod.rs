//! Service layer for the import pipeline.
//!
//! This module contains the business logic for:
//! - Payload normalization (`normalize_preview`)
//! - Content analysis (`GeminiAnalyzer`)
//! - Backend submission (`BackendSubmitter`)
//! - Session state (`ImportSession`, `SessionHandle`)

pub mod analyzer;
pub mod normalizer;
pub mod session;
pub mod submitter;

pub use analyzer::{AnalysisInput, ContentAnalyzer, GeminiAnalyzer};
pub use normalizer::normalize_preview;
pub use session::{ImportSession, SessionHandle, SessionStatus};
pub use submitter::{BackendSubmitter, PreviewSubmitter};
