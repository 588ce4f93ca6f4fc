//! Throttled autosave driven by editor events.
//!
//! Content changes open a window of `delay`; when it closes, the latest
//! content seen during the window is saved once. Losing focus saves at once.
//! Switching notes flushes whatever is pending for the previous note first.
//!
//! Failures never reach the editor as errors. They are logged and published
//! as `HistoryEvent::AutoSaveFailed` on the engine's event bus.

use crate::config::AutoSaveConfig;
use crate::engine::{SharedEngine, VersionEngine};
use crate::events::HistoryEvent;
use crate::store::VersionStore;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

struct State {
    note_id: Option<String>,
    pending: Option<String>,
    /// Open throttle window, tagged with its generation
    window: Option<(u64, JoinHandle<()>)>,
    generation: u64,
    enabled: bool,
    delay: Duration,
}

impl State {
    /// Cancel the open window, if it has not started saving.
    fn close_window(&mut self) {
        if let Some((_, handle)) = self.window.take() {
            handle.abort();
        }
    }
}

/// Per-editor autosave scheduler.
///
/// Must be used from within a tokio runtime; throttle windows are spawned tasks.
pub struct AutoSaver<S: VersionStore + 'static> {
    engine: SharedEngine<S>,
    state: Arc<Mutex<State>>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl<S: VersionStore + 'static> AutoSaver<S> {
    pub fn new(engine: SharedEngine<S>, config: &AutoSaveConfig) -> Self {
        Self {
            engine,
            state: Arc::new(Mutex::new(State {
                note_id: None,
                pending: None,
                window: None,
                generation: 0,
                enabled: config.enabled,
                delay: config.delay(),
            })),
        }
    }

    pub fn note_id(&self) -> Option<String> {
        lock(&self.state).note_id.clone()
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    /// Turn autosave on or off and change the throttle window.
    ///
    /// Turning it off closes the open window; pending content is kept for
    /// the next `flush`.
    pub fn set_auto_save(&self, enabled: bool, delay: Duration) {
        let mut state = lock(&self.state);
        state.enabled = enabled;
        state.delay = delay;
        if !enabled {
            state.close_window();
        }
    }

    /// Record a content change from the editor.
    pub fn content_changed(&self, content: impl Into<String>) {
        let mut state = lock(&self.state);
        if !state.enabled {
            return;
        }
        if state.note_id.is_none() {
            warn!("Content changed with no active note, not saving");
            return;
        }

        state.pending = Some(content.into());
        if state.window.is_some() {
            return;
        }

        state.generation += 1;
        let generation = state.generation;
        let delay = state.delay;
        let engine = Arc::clone(&self.engine);
        let shared = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut engine = engine.lock().await;

            let job = {
                let mut state = lock(&shared);
                if !matches!(state.window, Some((g, _)) if g == generation) {
                    return;
                }
                state.window = None;
                state.pending.take().zip(state.note_id.clone())
            };

            if let Some((content, note_id)) = job {
                debug!("Throttle window closed for {}", note_id);
                save(&mut engine, &note_id, &content).await;
            }
        });
        state.window = Some((generation, handle));
    }

    /// The editor lost focus: save `content` now and drop anything pending.
    ///
    /// Runs whether or not autosave is enabled.
    pub async fn blur(&self, content: &str) {
        let note_id = {
            let mut state = lock(&self.state);
            state.close_window();
            state.pending = None;
            state.note_id.clone()
        };

        match note_id {
            Some(note_id) => {
                let mut engine = self.engine.lock().await;
                save(&mut engine, &note_id, content).await;
            }
            None => warn!("Editor blurred with no active note, not saving"),
        }
    }

    /// Save pending content now, if there is any.
    pub async fn flush(&self) {
        let job = {
            let mut state = lock(&self.state);
            state.close_window();
            state.pending.take().zip(state.note_id.clone())
        };

        if let Some((content, note_id)) = job {
            let mut engine = self.engine.lock().await;
            save(&mut engine, &note_id, &content).await;
        }
    }

    /// Switch the active note. Pending content of the previous note is saved first.
    pub async fn update_note_id(&self, note_id: impl Into<String>) {
        self.flush().await;
        let note_id = note_id.into();
        debug!("Autosave now tracking {}", note_id);
        lock(&self.state).note_id = Some(note_id);
    }
}

async fn save<S: VersionStore>(engine: &mut VersionEngine<S>, note_id: &str, content: &str) {
    if let Err(e) = engine.save_version(note_id, content, None).await {
        error!("Autosave failed for {}: {}", note_id, e);
        engine.events().emit(HistoryEvent::AutoSaveFailed {
            note_id: note_id.to_string(),
            message: e.to_string(),
        });
    }
}
