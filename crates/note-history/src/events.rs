//! Notifications from the engine and the autosaver.
//!
//! Autosave failures travel over this bus so the editor can show a transient
//! notice without blocking input.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, TryLockError, Weak};

/// Events emitted by the engine and the autosaver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HistoryEvent {
    /// A new revision was appended to a note's chain.
    #[serde(rename_all = "camelCase")]
    VersionSaved {
        note_id: String,
        version_id: String,
        additions: usize,
        deletions: usize,
        /// When the revision was created, in milliseconds since Unix epoch.
        timestamp: u64,
    },
    /// A save found no significant change and wrote nothing.
    #[serde(rename_all = "camelCase")]
    SaveSkipped { note_id: String },
    /// An autosave attempt failed; editing continues.
    #[serde(rename_all = "camelCase")]
    AutoSaveFailed { note_id: String, message: String },
    /// A note's whole history was removed.
    #[serde(rename_all = "camelCase")]
    HistoryDeleted { note_id: String },
    /// Chains older than the cutoff were pruned.
    #[serde(rename_all = "camelCase")]
    HistoryPruned { cutoff: u64 },
}

/// Keeps a listener registered for as long as it is alive.
pub struct Subscription {
    bus: Weak<EventBus>,
    id: usize,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove_listener(self.id);
        }
    }
}

type Listener = Arc<dyn Fn(HistoryEvent) + Send + Sync>;

/// Fan-out of history events to any number of listeners.
///
/// Listeners run synchronously on the emitting task and must not block.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<(usize, Listener)>>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`; it stays registered until the returned handle is dropped.
    pub fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(HistoryEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(listener)));
        Subscription {
            bus: Arc::downgrade(self),
            id,
        }
    }

    /// Runs from `Drop`, so it never waits on the lock: a listener being
    /// removed while the bus is busy stays registered until the bus is dropped.
    fn remove_listener(&self, id: usize) {
        let mut listeners = match self.listeners.try_write() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        listeners.retain(|(i, _)| *i != id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn emit(&self, event: HistoryEvent) {
        // Release the lock before calling out so listeners may subscribe or unsubscribe
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skipped(note: &str) -> HistoryEvent {
        HistoryEvent::SaveSkipped {
            note_id: note.into(),
        }
    }

    #[test]
    fn test_subscribe_and_emit() {
        let bus = Arc::new(EventBus::new());
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let _sub = bus.subscribe(move |_event| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        });

        bus.emit(skipped("n1"));

        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_dropping_subscription_removes_listener() {
        let bus = Arc::new(EventBus::new());
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        {
            let _sub = bus.subscribe(move |_event| {
                count_clone.fetch_add(1, Ordering::Relaxed);
            });
            bus.emit(skipped("n1"));
        }

        bus.emit(skipped("n2"));

        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_drop_while_bus_locked_does_not_block() {
        let bus = Arc::new(EventBus::new());
        let sub = bus.subscribe(|_event| {});

        {
            let _held = bus.listeners.read().unwrap();
            drop(sub);
        }

        // Removal was skipped while the lock was held
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn test_event_serialization() {
        let event = HistoryEvent::AutoSaveFailed {
            note_id: "n1".into(),
            message: "disk full".into(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"autoSaveFailed\""));
        assert!(json.contains("\"noteId\":\"n1\""));
        assert!(json.contains("\"message\":\"disk full\""));
    }
}
