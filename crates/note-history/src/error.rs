//! Errors surfaced by the history engine.
//!
//! A version that does not exist is `Ok(None)` and a save with nothing
//! significant to record is `SaveOutcome::Skipped`; neither is an error.

use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// The store could not be read or written. Retryable.
    #[error("Version store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The chain for a note can no longer be replayed.
    #[error("History for note {note_id} is corrupted: {reason}")]
    ChainCorrupted { note_id: String, reason: String },
}

impl HistoryError {
    pub(crate) fn corrupted(note_id: &str, reason: impl Into<String>) -> Self {
        Self::ChainCorrupted {
            note_id: note_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same operation can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;
