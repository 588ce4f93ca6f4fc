//! Bounded cache of reconstructed revision contents.
//!
//! Keyed by `(note_id, version_id)`. The default policy drops the oldest
//! inserted entry once the bound is exceeded; `CachePolicy::Lru` drops the
//! least recently read one instead.

use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;
use tracing::debug;

/// Eviction policy for the reconstruction cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Drop oldest-inserted entries first
    #[default]
    Fifo,
    /// Drop least-recently-used entries first
    Lru,
}

type Key = (String, String);

enum Entries {
    Fifo {
        map: HashMap<Key, String>,
        order: VecDeque<Key>,
        capacity: usize,
    },
    Lru(LruCache<Key, String>),
    /// Capacity zero: nothing is kept
    Disabled,
}

pub struct ReconstructionCache {
    entries: Entries,
}

impl ReconstructionCache {
    pub fn new(capacity: usize, policy: CachePolicy) -> Self {
        let entries = match (policy, NonZeroUsize::new(capacity)) {
            (_, None) => Entries::Disabled,
            (CachePolicy::Fifo, Some(_)) => Entries::Fifo {
                map: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
                capacity,
            },
            (CachePolicy::Lru, Some(cap)) => Entries::Lru(LruCache::new(cap)),
        };
        Self { entries }
    }

    fn key(note_id: &str, version_id: &str) -> Key {
        (note_id.to_string(), version_id.to_string())
    }

    pub fn get(&mut self, note_id: &str, version_id: &str) -> Option<String> {
        let key = Self::key(note_id, version_id);
        match &mut self.entries {
            Entries::Fifo { map, .. } => map.get(&key).cloned(),
            Entries::Lru(cache) => cache.get(&key).cloned(),
            Entries::Disabled => None,
        }
    }

    pub fn insert(&mut self, note_id: &str, version_id: &str, content: String) {
        let key = Self::key(note_id, version_id);
        match &mut self.entries {
            Entries::Fifo { map, order, capacity } => {
                if map.insert(key.clone(), content).is_none() {
                    order.push_back(key);
                }
                while order.len() > *capacity {
                    if let Some(oldest) = order.pop_front() {
                        map.remove(&oldest);
                        debug!("Evicted cached content for {}@{}", oldest.0, oldest.1);
                    }
                }
            }
            Entries::Lru(cache) => {
                if let Some((evicted, _)) = cache.push(key.clone(), content) {
                    if evicted != key {
                        debug!("Evicted cached content for {}@{}", evicted.0, evicted.1);
                    }
                }
            }
            Entries::Disabled => {}
        }
    }

    /// Drop every entry belonging to `note_id`.
    pub fn remove_note(&mut self, note_id: &str) {
        match &mut self.entries {
            Entries::Fifo { map, order, .. } => {
                map.retain(|(note, _), _| note != note_id);
                order.retain(|(note, _)| note != note_id);
            }
            Entries::Lru(cache) => {
                let keys: Vec<Key> = cache
                    .iter()
                    .filter(|((note, _), _)| note == note_id)
                    .map(|(k, _)| k.clone())
                    .collect();
                for key in keys {
                    cache.pop(&key);
                }
            }
            Entries::Disabled => {}
        }
    }

    pub fn clear(&mut self) {
        match &mut self.entries {
            Entries::Fifo { map, order, .. } => {
                map.clear();
                order.clear();
            }
            Entries::Lru(cache) => cache.clear(),
            Entries::Disabled => {}
        }
    }

    pub fn len(&self) -> usize {
        match &self.entries {
            Entries::Fifo { map, .. } => map.len(),
            Entries::Lru(cache) => cache.len(),
            Entries::Disabled => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
