//! Progress records and cancellation handles for in-flight uploads.
//!
//! Every begun transfer is closed exactly once: by completion, by a cancel,
//! or by a failure. Only the first of those emits a [`TransferEvent`];
//! later calls for the same id are no-ops.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::transport::RemoteFile;

/// Synthetic transfer id. Two files with the same name get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TransferId(u64);

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an observer sees for one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferProgress {
    /// File name shown to the user.
    pub display_name: String,
    /// Percent sent, 0 to 100.
    pub progress: u8,
    /// Set once the server has recorded the file.
    pub is_complete: bool,
}

/// All visible transfers, ordered by id.
pub type ProgressSnapshot = BTreeMap<TransferId, TransferProgress>;

/// Terminal outcome of a transfer, published once per transfer.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    /// The server recorded the file.
    Completed {
        /// Transfer id.
        id: TransferId,
        /// The file as stored.
        file: RemoteFile,
    },
    /// The transfer failed; other transfers are unaffected.
    Failed {
        /// Transfer id.
        id: TransferId,
        /// File name shown to the user.
        display_name: String,
        /// What went wrong.
        message: String,
    },
    /// The user cancelled the transfer.
    Cancelled {
        /// Transfer id.
        id: TransferId,
        /// File name shown to the user.
        display_name: String,
    },
}

#[derive(Debug, Default)]
struct TrackerState {
    records: ProgressSnapshot,
    handles: HashMap<TransferId, CancellationToken>,
}

struct Inner {
    state: Mutex<TrackerState>,
    next_id: AtomicU64,
    snapshots: watch::Sender<ProgressSnapshot>,
    events: broadcast::Sender<TransferEvent>,
    removal_delay: Duration,
}

/// Shared upload state. Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct UploadTracker {
    inner: Arc<Inner>,
}

impl fmt::Debug for UploadTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadTracker")
            .field("transfers", &self.snapshot().len())
            .field("removal_delay", &self.inner.removal_delay)
            .finish()
    }
}

impl Default for UploadTracker {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

impl UploadTracker {
    /// Creates a tracker that drops completed records after `removal_delay`.
    pub fn new(removal_delay: Duration) -> Self {
        let (snapshots, _) = watch::channel(ProgressSnapshot::new());
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(TrackerState::default()),
                next_id: AtomicU64::new(1),
                snapshots,
                events,
                removal_delay,
            }),
        }
    }

    /// A fresh transfer id.
    pub fn allocate_id(&self) -> TransferId {
        TransferId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a transfer at 0% and returns its cancellation handle.
    ///
    /// Registering an id that is already present changes nothing and
    /// returns the existing handle.
    pub fn begin(&self, id: TransferId, display_name: impl Into<String>) -> CancellationToken {
        let mut state = self.lock();
        if let Some(token) = state.handles.get(&id) {
            return token.clone();
        }
        let token = CancellationToken::new();
        state.handles.insert(id, token.clone());
        state.records.entry(id).or_insert_with(|| TransferProgress {
            display_name: display_name.into(),
            progress: 0,
            is_complete: false,
        });
        self.publish(&state);
        token
    }

    /// Records the latest progress; values above 100 are clamped.
    pub fn update_progress(&self, id: TransferId, percent: u8) {
        let mut state = self.lock();
        let Some(record) = state.records.get_mut(&id) else {
            return;
        };
        if record.is_complete || record.progress == percent.min(100) {
            return;
        }
        record.progress = percent.min(100);
        self.publish(&state);
    }

    /// Marks a transfer as done and schedules its removal.
    ///
    /// Must be called from within a Tokio runtime. Returns whether this
    /// call closed the transfer.
    pub fn complete(&self, id: TransferId, file: RemoteFile) -> bool {
        {
            let mut state = self.lock();
            let Some(record) = state.records.get_mut(&id) else {
                return false;
            };
            if record.is_complete {
                return false;
            }
            record.progress = 100;
            record.is_complete = true;
            state.handles.remove(&id);
            self.publish(&state);
        }

        let _ = self.inner.events.send(TransferEvent::Completed { id, file });

        let tracker = self.clone();
        let delay = self.inner.removal_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracker.remove_completed(id);
        });
        true
    }

    /// Aborts one transfer and drops its record.
    pub fn cancel_one(&self, id: TransferId) {
        let closed = {
            let mut state = self.lock();
            if let Some(token) = state.handles.remove(&id) {
                token.cancel();
            }
            let closed = state.records.remove(&id).filter(|r| !r.is_complete);
            self.publish(&state);
            closed
        };

        if let Some(record) = closed {
            debug!(transfer = %id, name = %record.display_name, "Upload cancelled");
            let _ = self.inner.events.send(TransferEvent::Cancelled {
                id,
                display_name: record.display_name,
            });
        }
    }

    /// Aborts every transfer and clears all records.
    pub fn cancel_all(&self) {
        let closed: Vec<(TransferId, TransferProgress)> = {
            let mut state = self.lock();
            for (_, token) in state.handles.drain() {
                token.cancel();
            }
            let records = std::mem::take(&mut state.records);
            self.publish(&state);
            records.into_iter().filter(|(_, r)| !r.is_complete).collect()
        };

        for (id, record) in closed {
            let _ = self.inner.events.send(TransferEvent::Cancelled {
                id,
                display_name: record.display_name,
            });
        }
    }

    /// Drops a failed transfer. Returns whether this call closed it.
    pub fn fail(&self, id: TransferId, message: impl Into<String>) -> bool {
        let closed = {
            let mut state = self.lock();
            state.handles.remove(&id);
            let open = state.records.get(&id).is_some_and(|r| !r.is_complete);
            let closed = if open { state.records.remove(&id) } else { None };
            if closed.is_some() {
                self.publish(&state);
            }
            closed
        };

        match closed {
            Some(record) => {
                let _ = self.inner.events.send(TransferEvent::Failed {
                    id,
                    display_name: record.display_name,
                    message: message.into(),
                });
                true
            }
            None => false,
        }
    }

    /// Current records.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.lock().records.clone()
    }

    /// Whether `id` still has a visible record.
    pub fn contains(&self, id: TransferId) -> bool {
        self.lock().records.contains_key(&id)
    }

    /// Observes every change to the records.
    pub fn watch(&self) -> watch::Receiver<ProgressSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Receives terminal events from now on.
    pub fn events(&self) -> broadcast::Receiver<TransferEvent> {
        self.inner.events.subscribe()
    }

    fn remove_completed(&self, id: TransferId) {
        let mut state = self.lock();
        if state.records.get(&id).is_some_and(|r| r.is_complete) {
            state.records.remove(&id);
            self.publish(&state);
        }
    }

    fn publish(&self, state: &TrackerState) {
        self.inner.snapshots.send_replace(state.records.clone());
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        // Each mutation is a single map operation; a poisoned lock still
        // guards consistent state.
        self.inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
