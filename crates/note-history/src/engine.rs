//! VersionEngine: owns the revision chains of every note it has touched.
//!
//! Each chain starts with a full snapshot; every later revision is a diff
//! against the one before it. Reading a historical revision replays the
//! diffs from the nearest preceding snapshot and caches the result.
//!
//! Methods take `&mut self`. Share an engine between an editor and its
//! autosaver as `Arc<tokio::sync::Mutex<VersionEngine<S>>>`, which also
//! serializes concurrent saves for the same note.

use crate::cache::ReconstructionCache;
use crate::clock::{DAY_MILLIS, now_millis};
use crate::config::HistoryConfig;
use crate::diff::{DiffStats, EditScript, diff, has_significant_change, similarity};
use crate::error::{HistoryError, Result};
use crate::events::{EventBus, HistoryEvent};
use crate::patch::apply_to_base;
use crate::reconcile::reconcile;
use crate::revision::{Revision, RevisionBody, RevisionMeta, VersionContent};
use crate::store::{NoteSummary, VersionStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Result of a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A revision was appended
    Saved(RevisionMeta),
    /// Nothing but whitespace changed; no revision was written
    Skipped,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// Engine handle shared between an editor surface and its autosaver.
pub type SharedEngine<S> = Arc<Mutex<VersionEngine<S>>>;

pub struct VersionEngine<S: VersionStore> {
    store: S,
    config: HistoryConfig,
    /// Chains loaded from (or written to) the store, by note id
    chains: HashMap<String, Vec<Revision>>,
    /// Content of each chain's last revision, as of the last save in this process
    tips: HashMap<String, String>,
    cache: ReconstructionCache,
    events: Arc<EventBus>,
}

impl<S: VersionStore> VersionEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, HistoryConfig::default())
    }

    pub fn with_config(store: S, config: HistoryConfig) -> Self {
        let cache = ReconstructionCache::new(config.cache_capacity, config.cache_policy);
        Self {
            store,
            config,
            chains: HashMap::new(),
            tips: HashMap::new(),
            cache,
            events: Arc::new(EventBus::new()),
        }
    }

    /// Wrap the engine for sharing with an `AutoSaver`.
    pub fn into_shared(self) -> SharedEngine<S> {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Load a note's chain into memory if it is not there yet.
    async fn ensure_loaded(&mut self, note_id: &str) -> Result<()> {
        if self.chains.contains_key(note_id) {
            return Ok(());
        }
        let chain = self.store.get_chain(note_id).await?;
        if !chain.is_empty() {
            debug!("Loaded {} revision(s) for {}", chain.len(), note_id);
            self.chains.insert(note_id.to_string(), chain);
        }
        Ok(())
    }

    /// Record `content` as the newest revision of `note_id`.
    ///
    /// The first save stores a full snapshot. Later saves store the diff
    /// against the current tip, unless that diff only touches whitespace, in
    /// which case nothing is written and `Skipped` is returned.
    pub async fn save_version(
        &mut self,
        note_id: &str,
        content: &str,
        author: Option<&str>,
    ) -> Result<SaveOutcome> {
        self.ensure_loaded(note_id).await?;

        let author = author.map(str::to_string);
        let now = now_millis();
        let chain = self.chains.entry(note_id.to_string()).or_default();

        let revision = match chain.last() {
            None => Revision::snapshot(now, content.to_string(), author),
            Some(latest) => {
                let latest_content = match self.tips.get(note_id) {
                    Some(tip) => tip.clone(),
                    None => replay(note_id, chain, chain.len() - 1)?,
                };

                let diffs = diff(&latest_content, content);
                if !has_significant_change(&diffs) {
                    debug!("No significant change for {}, skipping save", note_id);
                    self.events.emit(HistoryEvent::SaveSkipped {
                        note_id: note_id.to_string(),
                    });
                    return Ok(SaveOutcome::Skipped);
                }

                let since_snapshot = revisions_since_snapshot(chain);
                match self.config.snapshot_interval {
                    Some(interval) if interval > 0 && since_snapshot >= interval => {
                        debug!("Taking interval snapshot for {}", note_id);
                        Revision::snapshot(now, content.to_string(), author)
                    }
                    _ => Revision::delta(now, diffs, latest.id.clone(), author),
                }
            }
        };

        let meta = revision.meta();
        let stats = revision.stats();
        chain.push(revision);

        if let Err(e) = self.store.put_chain(note_id, chain).await {
            warn!("Failed to persist version for {}: {}", note_id, e);
            chain.pop();
            if chain.is_empty() {
                self.chains.remove(note_id);
            }
            return Err(HistoryError::StoreUnavailable(e));
        }

        self.tips.insert(note_id.to_string(), content.to_string());
        info!(
            "Saved version {} for {}: +{} -{}",
            meta.id, note_id, stats.additions, stats.deletions
        );
        self.events.emit(HistoryEvent::VersionSaved {
            note_id: note_id.to_string(),
            version_id: meta.id.to_string(),
            additions: stats.additions,
            deletions: stats.deletions,
            timestamp: meta.timestamp,
        });

        Ok(SaveOutcome::Saved(meta))
    }

    /// Full content of one revision, or `None` if the note has no such revision.
    pub async fn get_version_content(
        &mut self,
        note_id: &str,
        version_id: &str,
    ) -> Result<Option<String>> {
        if let Some(hit) = self.cache.get(note_id, version_id) {
            debug!("Cache hit for {}@{}", note_id, version_id);
            return Ok(Some(hit));
        }

        self.ensure_loaded(note_id).await?;
        let Some(chain) = self.chains.get(note_id) else {
            return Ok(None);
        };
        let Some(index) = chain.iter().position(|r| r.id.as_str() == version_id) else {
            return Ok(None);
        };

        let content = replay(note_id, chain, index)?;
        self.cache.insert(note_id, version_id, content.clone());
        Ok(Some(content))
    }

    /// Metadata of every revision, oldest first. Empty if the note has no history.
    pub async fn get_versions(&mut self, note_id: &str) -> Result<Vec<RevisionMeta>> {
        self.ensure_loaded(note_id).await?;
        Ok(self
            .chains
            .get(note_id)
            .map(|chain| chain.iter().map(Revision::meta).collect())
            .unwrap_or_default())
    }

    /// Every revision with its reconstructed content. For export and inspection.
    pub async fn get_all_versions(&mut self, note_id: &str) -> Result<Vec<VersionContent>> {
        let versions = self.get_versions(note_id).await?;
        let mut contents = Vec::with_capacity(versions.len());
        for meta in versions {
            let content = self
                .get_version_content(note_id, meta.id.as_str())
                .await?
                .unwrap_or_default();
            contents.push(VersionContent {
                id: meta.id,
                content,
                timestamp: meta.timestamp,
                author: meta.author,
            });
        }
        Ok(contents)
    }

    /// Diff from revision `version_a` to revision `version_b`.
    pub async fn compare_versions(
        &mut self,
        note_id: &str,
        version_a: &str,
        version_b: &str,
    ) -> Result<Option<EditScript>> {
        let Some(content_a) = self.get_version_content(note_id, version_a).await? else {
            return Ok(None);
        };
        let Some(content_b) = self.get_version_content(note_id, version_b).await? else {
            return Ok(None);
        };
        Ok(Some(diff(&content_a, &content_b)))
    }

    /// Size of the change recorded by one revision.
    pub async fn diff_stats(
        &mut self,
        note_id: &str,
        version_id: &str,
    ) -> Result<Option<DiffStats>> {
        self.ensure_loaded(note_id).await?;
        Ok(self
            .chains
            .get(note_id)
            .and_then(|chain| chain.iter().find(|r| r.id.as_str() == version_id))
            .map(Revision::stats))
    }

    /// Remove a note's whole history. Deleting a missing history is not an error.
    pub async fn delete_note_versions(&mut self, note_id: &str) -> Result<()> {
        self.chains.remove(note_id);
        self.tips.remove(note_id);
        self.cache.remove_note(note_id);

        self.store.delete_chain(note_id).await?;
        debug!("Deleted history for {}", note_id);
        self.events.emit(HistoryEvent::HistoryDeleted {
            note_id: note_id.to_string(),
        });
        Ok(())
    }

    /// Summaries of every note with history.
    ///
    /// Falls back to the chains held in memory when the store cannot be read.
    pub async fn note_summaries(&self) -> Vec<NoteSummary> {
        match self.store.list_note_summaries().await {
            Ok(summaries) => summaries,
            Err(e) => {
                warn!("Failed to list notes from store, using memory: {}", e);
                let mut summaries: Vec<NoteSummary> = self
                    .chains
                    .iter()
                    .map(|(note_id, chain)| NoteSummary {
                        note_id: note_id.clone(),
                        last_modified: chain.last().map(|r| r.timestamp).unwrap_or(0),
                        revision_count: chain.len(),
                    })
                    .collect();
                summaries.sort_by(|a, b| a.note_id.cmp(&b.note_id));
                summaries
            }
        }
    }

    /// Drop histories not modified within the last `days_to_keep` days.
    pub async fn cleanup_old_data(&mut self, days_to_keep: u64) -> Result<()> {
        let cutoff = now_millis().saturating_sub(days_to_keep.saturating_mul(DAY_MILLIS));
        self.store.prune_older_than(cutoff).await?;

        let stale: Vec<String> = self
            .chains
            .iter()
            .filter(|(_, chain)| chain.last().map(|r| r.timestamp < cutoff).unwrap_or(true))
            .map(|(note_id, _)| note_id.clone())
            .collect();
        for note_id in &stale {
            self.chains.remove(note_id);
            self.tips.remove(note_id);
            self.cache.remove_note(note_id);
        }

        info!("Cleaned up history older than {} days ({} in memory)", days_to_keep, stale.len());
        self.events.emit(HistoryEvent::HistoryPruned { cutoff });
        Ok(())
    }

    /// Forget everything held in memory. Durable state is untouched.
    pub fn clear(&mut self) {
        self.chains.clear();
        self.tips.clear();
        self.cache.clear();
    }

    /// Merge a remote copy of a note into the local one.
    pub fn sync_collaborative(&self, note_id: &str, local: &str, remote: &str) -> String {
        let merged = reconcile(local, remote);
        debug!(
            "Reconciled {} (copies {:.0}% similar, {} chars merged)",
            note_id,
            similarity(local, remote) * 100.0,
            merged.chars().count()
        );
        merged
    }
}

/// Number of revisions from the last snapshot (inclusive) to the tip.
fn revisions_since_snapshot(chain: &[Revision]) -> usize {
    let last_snapshot = chain
        .iter()
        .rposition(|r| matches!(r.body, RevisionBody::Snapshot { .. }))
        .unwrap_or(0);
    chain.len() - last_snapshot
}

/// Reconstruct the content of `chain[index]`.
///
/// Starts from the nearest snapshot at or before `index` and applies each
/// following diff in order. Runs to completion without yielding.
fn replay(note_id: &str, chain: &[Revision], index: usize) -> Result<String> {
    if let Some(content) = chain.get(index).and_then(Revision::content) {
        return Ok(content.to_string());
    }

    let root = chain
        .first()
        .ok_or_else(|| HistoryError::corrupted(note_id, "chain is empty"))?;
    if root.content().is_none() {
        return Err(HistoryError::corrupted(
            note_id,
            format!("root revision {} has no snapshot", root.id),
        ));
    }

    let start = chain[..=index]
        .iter()
        .rposition(|r| r.content().is_some())
        .unwrap_or(0);

    let mut content = chain[start].content().unwrap_or_default().to_string();
    for i in (start + 1)..=index {
        let revision = &chain[i];
        match &revision.body {
            RevisionBody::Delta { diffs, base_version_id } => {
                let expected = &chain[i - 1].id;
                if base_version_id != expected {
                    return Err(HistoryError::corrupted(
                        note_id,
                        format!(
                            "revision {} is based on {}, expected {}",
                            revision.id, base_version_id, expected
                        ),
                    ));
                }
                content = apply_to_base(&content, diffs).map_err(|e| {
                    HistoryError::corrupted(note_id, format!("revision {}: {}", revision.id, e))
                })?;
            }
            RevisionBody::Snapshot { content: snapshot } => content = snapshot.clone(),
            RevisionBody::Missing {} => {
                return Err(HistoryError::corrupted(
                    note_id,
                    format!("revision {} has neither content nor a diff", revision.id),
                ));
            }
        }
    }

    if index > start {
        debug!("Replayed {} diff(s) for {}", index - start, note_id);
    }
    Ok(content)
}
