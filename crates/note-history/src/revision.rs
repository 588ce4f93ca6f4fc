//! Revision records and their identifiers.
//!
//! A revision is stored flat on the wire: `{id, timestamp, author?}` plus
//! either `content` (a full snapshot) or `diffs` + `baseVersionId` (a delta
//! against the previous revision).

use crate::diff::{DiffStats, EditScript};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Identifier of a revision, unique within one note's chain.
///
/// Formatted as `v_<millis>_<suffix>` so ids sort by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    /// Generate a fresh id for a revision created at `timestamp`.
    pub fn generate(timestamp: u64) -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("v_{}_{}", timestamp, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RevisionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RevisionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Payload of a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RevisionBody {
    /// Diff against the revision named by `base_version_id`.
    Delta {
        diffs: EditScript,
        #[serde(rename = "baseVersionId")]
        base_version_id: RevisionId,
    },
    /// Full content.
    Snapshot { content: String },
    /// Neither a snapshot nor a complete delta. Only produced by reading
    /// damaged records; the engine reports these as a corrupted chain.
    Missing {},
}

/// Discriminant of [`RevisionBody`], for metadata listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionKind {
    Snapshot,
    Delta,
    Missing,
}

/// One stored unit of a note's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: RevisionId,
    /// Creation time in milliseconds since epoch
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(flatten)]
    pub body: RevisionBody,
}

impl Revision {
    pub fn snapshot(timestamp: u64, content: String, author: Option<String>) -> Self {
        Self {
            id: RevisionId::generate(timestamp),
            timestamp,
            author,
            body: RevisionBody::Snapshot { content },
        }
    }

    pub fn delta(
        timestamp: u64,
        diffs: EditScript,
        base_version_id: RevisionId,
        author: Option<String>,
    ) -> Self {
        Self {
            id: RevisionId::generate(timestamp),
            timestamp,
            author,
            body: RevisionBody::Delta {
                diffs,
                base_version_id,
            },
        }
    }

    pub fn kind(&self) -> RevisionKind {
        match self.body {
            RevisionBody::Snapshot { .. } => RevisionKind::Snapshot,
            RevisionBody::Delta { .. } => RevisionKind::Delta,
            RevisionBody::Missing {} => RevisionKind::Missing,
        }
    }

    /// Full content, if this revision is a snapshot.
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            RevisionBody::Snapshot { content } => Some(content),
            _ => None,
        }
    }

    /// Size of the change this revision records.
    ///
    /// A snapshot counts its whole content as additions.
    pub fn stats(&self) -> DiffStats {
        match &self.body {
            RevisionBody::Delta { diffs, .. } => DiffStats::of(diffs),
            RevisionBody::Snapshot { content } => DiffStats {
                additions: content.chars().count(),
                deletions: 0,
                changes: usize::from(!content.is_empty()),
            },
            RevisionBody::Missing {} => DiffStats::default(),
        }
    }

    pub fn meta(&self) -> RevisionMeta {
        RevisionMeta {
            id: self.id.clone(),
            timestamp: self.timestamp,
            author: self.author.clone(),
            kind: self.kind(),
            base_version_id: match &self.body {
                RevisionBody::Delta { base_version_id, .. } => Some(base_version_id.clone()),
                _ => None,
            },
        }
    }
}

/// Revision metadata without content, as returned by history listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionMeta {
    pub id: RevisionId,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub kind: RevisionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_version_id: Option<RevisionId>,
}

/// A revision with its reconstructed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionContent {
    pub id: RevisionId,
    pub content: String,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}
