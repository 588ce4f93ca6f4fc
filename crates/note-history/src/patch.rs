//! Replaying edit scripts.
//!
//! A script carries the unchanged spans of its base as Equal runs, so the new
//! text can be produced from the script alone.

use crate::diff::{EditKind, EditOp, old_side};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("Edit script does not apply to this base ({expected} chars expected, {actual} found)")]
    BaseMismatch { expected: usize, actual: usize },
}

/// Produce the new text of a script (Equal and Insert runs, in order).
pub fn apply(script: &[EditOp]) -> String {
    let capacity = script
        .iter()
        .filter(|op| op.kind != EditKind::Delete)
        .map(|op| op.text.len())
        .sum();
    let mut result = String::with_capacity(capacity);
    for op in script {
        match op.kind {
            EditKind::Equal | EditKind::Insert => result.push_str(&op.text),
            EditKind::Delete => {}
        }
    }
    result
}

/// Like [`apply`], but first checks that the script was computed against `base`.
pub fn apply_to_base(base: &str, script: &[EditOp]) -> Result<String, PatchError> {
    let expected = old_side(script);
    if expected != base {
        return Err(PatchError::BaseMismatch {
            expected: expected.chars().count(),
            actual: base.chars().count(),
        });
    }
    Ok(apply(script))
}
