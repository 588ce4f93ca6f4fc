//! Character-level diffs between two texts.
//!
//! Diffs are computed with Myers' algorithm (via `similar`) over Unicode
//! scalar values, then coalesced into maximal runs so that no two adjacent
//! ops share a kind.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

/// Kind of a single edit run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Equal,
    Insert,
    Delete,
}

/// A run of text that is unchanged, inserted or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOp {
    #[serde(rename = "type")]
    pub kind: EditKind,
    pub text: String,
}

impl EditOp {
    pub fn equal(text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Equal,
            text: text.into(),
        }
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Insert,
            text: text.into(),
        }
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Delete,
            text: text.into(),
        }
    }

    /// True for an Insert or Delete whose text is more than whitespace.
    pub fn is_significant(&self) -> bool {
        self.kind != EditKind::Equal && !self.text.trim().is_empty()
    }
}

/// Ordered edit script turning an old text into a new one.
pub type EditScript = Vec<EditOp>;

/// Compute the edit script from `old_text` to `new_text`.
pub fn diff(old_text: &str, new_text: &str) -> EditScript {
    let text_diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_chars(old_text, new_text);

    let mut script: EditScript = Vec::new();
    for change in text_diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => EditKind::Equal,
            ChangeTag::Insert => EditKind::Insert,
            ChangeTag::Delete => EditKind::Delete,
        };
        match script.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(change.value()),
            _ => script.push(EditOp {
                kind,
                text: change.value().to_string(),
            }),
        }
    }
    script
}

/// Whether any op in the script changes non-whitespace text.
pub fn has_significant_change(script: &[EditOp]) -> bool {
    script.iter().any(EditOp::is_significant)
}

/// The text the script was computed from (Equal and Delete runs).
pub fn old_side(script: &[EditOp]) -> String {
    script
        .iter()
        .filter(|op| op.kind != EditKind::Insert)
        .map(|op| op.text.as_str())
        .collect()
}

/// Summary counts for an edit script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    /// Inserted characters
    pub additions: usize,
    /// Deleted characters
    pub deletions: usize,
    /// Number of Insert and Delete ops
    pub changes: usize,
}

impl DiffStats {
    pub fn of(script: &[EditOp]) -> Self {
        let mut stats = Self::default();
        for op in script {
            match op.kind {
                EditKind::Insert => {
                    stats.additions += op.text.chars().count();
                    stats.changes += 1;
                }
                EditKind::Delete => {
                    stats.deletions += op.text.chars().count();
                    stats.changes += 1;
                }
                EditKind::Equal => {}
            }
        }
        stats
    }
}

/// Fraction of the longer text left unchanged, in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let total = a.chars().count().max(b.chars().count());
    if total == 0 {
        return 1.0;
    }
    let equal: usize = diff(a, b)
        .iter()
        .filter(|op| op.kind == EditKind::Equal)
        .map(|op| op.text.chars().count())
        .sum();
    equal as f64 / total as f64
}
