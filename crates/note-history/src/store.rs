//! VersionStore trait abstraction for durable revision chains.
//!
//! Implementations:
//! - `MemoryStore` - For testing and memory-only operation
//! - `JsonFileStore` (in note-history-cli) - One JSON document per note via tokio::fs
//!
//! Uses `target_arch = "wasm32"` for conditional compilation instead of feature flags
//! to avoid Cargo's feature unification issues when building the workspace.

use crate::clock::now_millis;
use crate::revision::Revision;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Per-note summary kept by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    pub note_id: String,
    /// Time of the last write to this chain, in milliseconds since epoch
    pub last_modified: u64,
    pub revision_count: usize,
}

/// Durable storage for revision chains, keyed by note id.
///
/// On native platforms, implementations must be `Send + Sync` for use across threads.
/// On WASM (wasm32), these bounds are relaxed since WASM is single-threaded.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg(not(target_arch = "wasm32"))]
pub trait VersionStore: Send + Sync {
    /// Read the whole chain for a note (empty if none)
    async fn get_chain(&self, note_id: &str) -> Result<Vec<Revision>>;

    /// Replace the whole chain for a note
    async fn put_chain(&self, note_id: &str, revisions: &[Revision]) -> Result<()>;

    /// Remove a note's chain (missing is not an error)
    async fn delete_chain(&self, note_id: &str) -> Result<()>;

    /// Summaries of every stored chain
    async fn list_note_summaries(&self) -> Result<Vec<NoteSummary>>;

    /// Delete whole chains last modified before `cutoff_millis`
    async fn prune_older_than(&self, cutoff_millis: u64) -> Result<()>;
}

/// Durable storage for revision chains (WASM version without Send + Sync).
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg(target_arch = "wasm32")]
pub trait VersionStore {
    /// Read the whole chain for a note (empty if none)
    async fn get_chain(&self, note_id: &str) -> Result<Vec<Revision>>;

    /// Replace the whole chain for a note
    async fn put_chain(&self, note_id: &str, revisions: &[Revision]) -> Result<()>;

    /// Remove a note's chain (missing is not an error)
    async fn delete_chain(&self, note_id: &str) -> Result<()>;

    /// Summaries of every stored chain
    async fn list_note_summaries(&self) -> Result<Vec<NoteSummary>>;

    /// Delete whole chains last modified before `cutoff_millis`
    async fn prune_older_than(&self, cutoff_millis: u64) -> Result<()>;
}

struct StoredChain {
    revisions: Vec<Revision>,
    last_modified: u64,
}

/// In-memory store for testing and memory-only operation
#[derive(Default)]
pub struct MemoryStore {
    chains: RwLock<HashMap<String, StoredChain>>,
    /// When set, every operation fails with `StoreError::Unavailable`
    offline: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backing store going away (or coming back).
    pub fn set_offline(&self, offline: bool) {
        *self.offline.write().unwrap_or_else(|e| e.into_inner()) = offline;
    }

    /// Set a specific last-modified time for testing pruning
    pub fn set_last_modified(&self, note_id: &str, millis: u64) {
        let mut chains = self.chains.write().unwrap_or_else(|e| e.into_inner());
        if let Some(chain) = chains.get_mut(note_id) {
            chain.last_modified = millis;
        }
    }

    fn check_online(&self) -> Result<()> {
        if *self.offline.read().unwrap_or_else(|e| e.into_inner()) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl VersionStore for MemoryStore {
    async fn get_chain(&self, note_id: &str) -> Result<Vec<Revision>> {
        self.check_online()?;
        let chains = self.chains.read().unwrap_or_else(|e| e.into_inner());
        Ok(chains
            .get(note_id)
            .map(|c| c.revisions.clone())
            .unwrap_or_default())
    }

    async fn put_chain(&self, note_id: &str, revisions: &[Revision]) -> Result<()> {
        self.check_online()?;
        let mut chains = self.chains.write().unwrap_or_else(|e| e.into_inner());
        chains.insert(
            note_id.to_string(),
            StoredChain {
                revisions: revisions.to_vec(),
                last_modified: now_millis(),
            },
        );
        Ok(())
    }

    async fn delete_chain(&self, note_id: &str) -> Result<()> {
        self.check_online()?;
        let mut chains = self.chains.write().unwrap_or_else(|e| e.into_inner());
        chains.remove(note_id);
        Ok(())
    }

    async fn list_note_summaries(&self) -> Result<Vec<NoteSummary>> {
        self.check_online()?;
        let chains = self.chains.read().unwrap_or_else(|e| e.into_inner());
        let mut summaries: Vec<NoteSummary> = chains
            .iter()
            .map(|(id, chain)| NoteSummary {
                note_id: id.clone(),
                last_modified: chain.last_modified,
                revision_count: chain.revisions.len(),
            })
            .collect();
        summaries.sort_by(|a, b| a.note_id.cmp(&b.note_id));
        Ok(summaries)
    }

    async fn prune_older_than(&self, cutoff_millis: u64) -> Result<()> {
        self.check_online()?;
        let mut chains = self.chains.write().unwrap_or_else(|e| e.into_inner());
        chains.retain(|_, chain| chain.last_modified >= cutoff_millis);
        Ok(())
    }
}

// Implement VersionStore for Arc<T> where T: VersionStore
// This allows a test to keep a handle on the store an engine owns
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg(not(target_arch = "wasm32"))]
impl<T: VersionStore + Send + Sync> VersionStore for std::sync::Arc<T> {
    async fn get_chain(&self, note_id: &str) -> Result<Vec<Revision>> {
        (**self).get_chain(note_id).await
    }

    async fn put_chain(&self, note_id: &str, revisions: &[Revision]) -> Result<()> {
        (**self).put_chain(note_id, revisions).await
    }

    async fn delete_chain(&self, note_id: &str) -> Result<()> {
        (**self).delete_chain(note_id).await
    }

    async fn list_note_summaries(&self) -> Result<Vec<NoteSummary>> {
        (**self).list_note_summaries().await
    }

    async fn prune_older_than(&self, cutoff_millis: u64) -> Result<()> {
        (**self).prune_older_than(cutoff_millis).await
    }
}
