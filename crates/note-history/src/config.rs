//! Configuration for the history engine and autosave.

use crate::cache::CachePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for a `VersionEngine`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Maximum number of reconstructed contents kept in memory
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Which entry to drop when the reconstruction cache is full
    #[serde(default)]
    pub cache_policy: CachePolicy,

    /// Store a full snapshot every N revisions (None = only the first revision)
    #[serde(default)]
    pub snapshot_interval: Option<usize>,

    /// Days of history kept by `cleanup_old_data` when no value is given
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,

    /// Autosave configuration
    #[serde(default)]
    pub autosave: AutoSaveConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveConfig {
    /// Whether editor changes trigger saves at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Throttle window in milliseconds (default: 2 seconds)
    #[serde(default = "default_autosave_delay")]
    pub delay_ms: u64,
}

impl AutoSaveConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            delay_ms: default_autosave_delay(),
        }
    }
}

fn default_cache_capacity() -> usize {
    100
}

fn default_retention_days() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_autosave_delay() -> u64 {
    2000 // 2 seconds
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            cache_policy: CachePolicy::default(),
            snapshot_interval: None,
            retention_days: default_retention_days(),
            autosave: AutoSaveConfig::default(),
        }
    }
}
