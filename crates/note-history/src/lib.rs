//! note-history: Incremental revision history for notes.
//!
//! This crate provides the core functionality for:
//! - Character-level diffs between successive note contents
//! - Storing revisions as diffs against the previous revision
//! - Replaying a diff chain to reconstruct any historical revision
//! - Throttled autosave driven by editor events
//! - One-shot reconciliation of a local and a remote copy
//!
//! Persistence is reached through the `VersionStore` trait; the crate ships an
//! in-memory implementation and leaves durable backends to adapters.

pub mod autosave;
pub mod cache;
pub mod clock;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod events;
pub mod patch;
pub mod reconcile;
pub mod render;
pub mod revision;
pub mod store;

pub use autosave::AutoSaver;
pub use cache::{CachePolicy, ReconstructionCache};
pub use config::{AutoSaveConfig, HistoryConfig};
pub use diff::{DiffStats, EditKind, EditOp, EditScript};
pub use engine::{SaveOutcome, SharedEngine, VersionEngine};
pub use error::{HistoryError, Result};
pub use events::{EventBus, HistoryEvent, Subscription};
pub use reconcile::{ConflictPolicy, KeepLocalText, reconcile, reconcile_with, resolve_conflicts};
pub use revision::{Revision, RevisionBody, RevisionId, RevisionKind, RevisionMeta, VersionContent};
pub use store::{MemoryStore, NoteSummary, StoreError, VersionStore};
