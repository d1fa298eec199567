//! Debounced, batched persistence of dragged node positions.
//!
//! Each release overwrites the pending entry for its node and restarts the
//! quiet-period timer. When the timer fires, the whole pending map is taken
//! (so new drags can queue while the batch is in flight) and sent as
//! concurrent `update_position` calls. Failures are logged and local
//! positions are left as they are.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::StepApi;
use crate::config::InteractionConfig;
use crate::model::{Position, StepId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    /// Edits queued, timer running.
    Pending,
    Saving,
    /// Shown for the saved-indicator period after a clean flush.
    Saved,
    Failed,
}

pub struct PositionSaver {
    inner: Arc<SaverInner>,
}

struct SaverInner {
    api: Arc<dyn StepApi>,
    debounce: Duration,
    saved_indicator: Duration,
    state: Mutex<SaverState>,
    status: watch::Sender<SaveStatus>,
    batches: AtomicUsize,
}

#[derive(Default)]
struct SaverState {
    pending: BTreeMap<StepId, Position>,
    /// Bumped by every record; a timer only flushes if it is still current.
    generation: u64,
    timer: Option<JoinHandle<()>>,
    indicator: Option<JoinHandle<()>>,
    /// Set when a batch fails; cleared by the next flush that ends with
    /// nothing failed and nothing pending.
    failed: bool,
}

impl PositionSaver {
    pub fn new(api: Arc<dyn StepApi>, config: &InteractionConfig) -> Self {
        let (status, _) = watch::channel(SaveStatus::Idle);
        Self {
            inner: Arc::new(SaverInner {
                api,
                debounce: config.debounce(),
                saved_indicator: config.saved_indicator(),
                state: Mutex::new(SaverState::default()),
                status,
                batches: AtomicUsize::new(0),
            }),
        }
    }

    /// Queues a position. Must be called inside a tokio runtime.
    pub fn record(&self, id: StepId, position: Position) {
        let mut state = self.inner.state.lock();
        tracing::debug!(step = %id, x = position.x, y = position.y, "queued position");
        state.pending.insert(id, position);
        state.generation += 1;
        let generation = state.generation;
        let inner = Arc::clone(&self.inner);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            if inner.state.lock().generation != generation {
                return;
            }
            inner.flush().await;
        }));
        if !state.failed {
            self.inner.status.send_replace(SaveStatus::Pending);
        }
    }

    /// Flushes whatever is pending without waiting for the quiet period.
    pub async fn flush_now(&self) {
        {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.timer = None;
        }
        self.inner.flush().await;
    }

    pub fn pending(&self) -> BTreeMap<StepId, Position> {
        self.inner.state.lock().pending.clone()
    }

    pub fn status(&self) -> SaveStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.inner.status.subscribe()
    }

    pub fn batches_flushed(&self) -> usize {
        self.inner.batches.load(Ordering::Relaxed)
    }

    /// Stops both timers and drops unsent edits. In-flight calls are not
    /// awaited.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if let Some(indicator) = state.indicator.take() {
            indicator.abort();
        }
        if !state.pending.is_empty() {
            tracing::debug!(dropped = state.pending.len(), "discarding unsaved positions");
            state.pending.clear();
        }
        state.failed = false;
        self.inner.status.send_replace(SaveStatus::Idle);
    }
}

impl Drop for PositionSaver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl SaverInner {
    async fn flush(self: &Arc<Self>) {
        let batch = {
            let mut state = self.state.lock();
            std::mem::take(&mut state.pending)
        };
        if batch.is_empty() {
            return;
        }

        self.batches.fetch_add(1, Ordering::Relaxed);
        self.status.send_replace(SaveStatus::Saving);
        tracing::debug!(count = batch.len(), "flushing positions");

        let calls = batch
            .iter()
            .map(|(id, position)| self.api.update_position(id, *position));
        let results = join_all(calls).await;

        let mut failed = 0usize;
        for ((id, _), result) in batch.iter().zip(results) {
            if let Err(err) = result {
                failed += 1;
                tracing::warn!(step = %id, error = %err, "failed to save step position");
            }
        }

        let mut state = self.state.lock();
        state.failed |= failed > 0;
        if !state.pending.is_empty() {
            // Newer edits arrived mid-flush and have their own timer.
            let status = if state.failed { SaveStatus::Failed } else { SaveStatus::Pending };
            self.status.send_replace(status);
            return;
        }
        if failed > 0 {
            self.status.send_replace(SaveStatus::Failed);
            return;
        }
        state.failed = false;

        self.status.send_replace(SaveStatus::Saved);
        if let Some(indicator) = state.indicator.take() {
            indicator.abort();
        }
        let inner = Arc::clone(self);
        state.indicator = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.saved_indicator).await;
            inner.status.send_if_modified(|status| {
                if *status == SaveStatus::Saved {
                    *status = SaveStatus::Idle;
                    true
                } else {
                    false
                }
            });
        }));
    }
}
