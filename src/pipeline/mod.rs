//! Pipeline entry points for import operations.
//!
//! - `run_analyze`: Turn a text file or page scans into a stored draft
//! - `run_edit`: Reorder or rename chapters of the draft
//! - `run_save`: Submit the draft to the backend
//! - `run_reset`: Discard the draft
//! - `run_validate`: Check configuration

pub mod import;
pub mod validate;

pub use import::{
    DraftEdit, ImportSource, describe_preview, run_analyze, run_edit, run_reset, run_save,
};
pub use validate::run_validate;
