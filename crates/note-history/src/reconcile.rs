//! One-shot reconciliation of a local and a remote copy of a note.
//!
//! The remote copy is diffed against the local one and every op of the
//! resulting script is passed through a `ConflictPolicy` before replay. This is
//! a single-pass, insertion-biased merge, not a three-way merge.

use crate::diff::{EditKind, EditOp, EditScript, diff};
use crate::patch::apply;

/// Decides what each op of a local→remote script contributes to a merge.
pub trait ConflictPolicy {
    /// Return the op to replay in place of `op`, or `None` to drop it.
    fn resolve(&self, op: EditOp) -> Option<EditOp>;
}

/// Rejects remote deletions of meaningful local text.
///
/// Equal and Insert ops pass through. A Delete of whitespace is accepted; any
/// other Delete is rejected and its text kept as if unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepLocalText;

impl ConflictPolicy for KeepLocalText {
    fn resolve(&self, op: EditOp) -> Option<EditOp> {
        if op.kind == EditKind::Delete && !op.text.trim().is_empty() {
            return Some(EditOp::equal(op.text));
        }
        Some(op)
    }
}

/// Resolve a script with the default policy.
pub fn resolve_conflicts(script: EditScript) -> EditScript {
    resolve_with(script, &KeepLocalText)
}

pub fn resolve_with(script: EditScript, policy: &impl ConflictPolicy) -> EditScript {
    script.into_iter().filter_map(|op| policy.resolve(op)).collect()
}

/// Merge `remote` into `local` with the default policy.
pub fn reconcile(local: &str, remote: &str) -> String {
    reconcile_with(local, remote, &KeepLocalText)
}

pub fn reconcile_with(local: &str, remote: &str, policy: &impl ConflictPolicy) -> String {
    let script = resolve_with(diff(local, remote), policy);
    apply(&script)
}
