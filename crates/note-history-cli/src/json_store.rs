//! File-backed version store using tokio::fs.
//!
//! Each note's chain lives in `notes/<sha256(note id)>.json` under the store
//! root as `{id, versions, lastModified}`. Writes go to a temp file that is
//! then renamed over the old document.

use async_trait::async_trait;
use note_history::Revision;
use note_history::clock::now_millis;
use note_history::store::{NoteSummary, Result, StoreError, VersionStore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const NOTES_DIR: &str = "notes";

/// On-disk document for one note.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteDocument {
    id: String,
    versions: Vec<Revision>,
    last_modified: u64,
}

/// Disk usage of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageInfo {
    pub documents: usize,
    pub bytes: u64,
}

pub struct JsonFileStore {
    notes_path: PathBuf,
}

fn io_err(e: std::io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

impl JsonFileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            notes_path: root.as_ref().join(NOTES_DIR),
        }
    }

    fn document_path(&self, note_id: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(note_id.as_bytes());
        self.notes_path
            .join(format!("{}.json", hex::encode(hasher.finalize())))
    }

    async fn read_document(path: &Path) -> Result<Option<NoteDocument>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Serialization(format!("{}: {}", path.display(), e)))
    }

    /// Number of note documents and their combined size on disk.
    pub async fn storage_info(&self) -> Result<StorageInfo> {
        let mut dir = match fs::read_dir(&self.notes_path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StorageInfo::default()),
            Err(e) => return Err(io_err(e)),
        };

        let mut info = StorageInfo::default();
        while let Some(entry) = dir.next_entry().await.map_err(io_err)? {
            if entry.path().extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let metadata = entry.metadata().await.map_err(io_err)?;
            info.documents += 1;
            info.bytes += metadata.len();
        }
        Ok(info)
    }

    /// Every readable document in the store. Unreadable files are skipped.
    async fn documents(&self) -> Result<Vec<(PathBuf, NoteDocument)>> {
        let mut dir = match fs::read_dir(&self.notes_path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut documents = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::read_document(&path).await {
                Ok(Some(doc)) => documents.push((path, doc)),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable history file: {}", e),
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl VersionStore for JsonFileStore {
    async fn get_chain(&self, note_id: &str) -> Result<Vec<Revision>> {
        let path = self.document_path(note_id);
        Ok(Self::read_document(&path)
            .await?
            .map(|doc| doc.versions)
            .unwrap_or_default())
    }

    async fn put_chain(&self, note_id: &str, revisions: &[Revision]) -> Result<()> {
        fs::create_dir_all(&self.notes_path).await.map_err(io_err)?;

        let doc = NoteDocument {
            id: note_id.to_string(),
            versions: revisions.to_vec(),
            last_modified: now_millis(),
        };
        let bytes = serde_json::to_vec(&doc).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let path = self.document_path(note_id);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes).await.map_err(io_err)?;
        fs::rename(&tmp_path, &path).await.map_err(io_err)?;
        debug!("Wrote {} revision(s) for {} to {}", revisions.len(), note_id, path.display());
        Ok(())
    }

    async fn delete_chain(&self, note_id: &str) -> Result<()> {
        match fs::remove_file(self.document_path(note_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(e)),
        }
    }

    async fn list_note_summaries(&self) -> Result<Vec<NoteSummary>> {
        let mut summaries: Vec<NoteSummary> = self
            .documents()
            .await?
            .into_iter()
            .map(|(_, doc)| NoteSummary {
                note_id: doc.id,
                last_modified: doc.last_modified,
                revision_count: doc.versions.len(),
            })
            .collect();
        summaries.sort_by(|a, b| a.note_id.cmp(&b.note_id));
        Ok(summaries)
    }

    async fn prune_older_than(&self, cutoff_millis: u64) -> Result<()> {
        for (path, doc) in self.documents().await? {
            if doc.last_modified < cutoff_millis {
                debug!("Pruning history for {}", doc.id);
                fs::remove_file(&path).await.map_err(io_err)?;
            }
        }
        Ok(())
    }
}
