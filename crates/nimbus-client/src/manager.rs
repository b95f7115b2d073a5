//! Batch uploads over a shared tracker.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info, warn};

use nimbus_core::types::FolderId;

use crate::config::ClientConfig;
use crate::error::TransferError;
use crate::progress::ProgressFn;
use crate::source::UploadSource;
use crate::tracker::{TransferId, UploadTracker};
use crate::transport::{RemoteFile, UploadClient};

/// How one transfer of a batch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    /// Recorded by the server.
    Completed(RemoteFile),
    /// Failed with the given message.
    Failed(String),
    /// Cancelled before it finished.
    Cancelled,
}

/// One row of a batch result, in submission order.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Transfer id.
    pub id: TransferId,
    /// File name shown to the user.
    pub display_name: String,
    /// Result.
    pub status: TransferStatus,
}

/// Starts transfers, feeds the tracker, and isolates failures per file.
#[derive(Debug, Clone)]
pub struct UploadManager {
    client: Arc<UploadClient>,
    tracker: UploadTracker,
    stagger: Duration,
}

impl UploadManager {
    /// Creates a manager from client settings.
    pub fn new(config: &ClientConfig) -> Result<Self, TransferError> {
        Ok(Self::with_parts(
            UploadClient::new(config)?,
            UploadTracker::new(config.removal_delay),
            config.stagger,
        ))
    }

    /// Creates a manager over an existing client and tracker.
    pub fn with_parts(client: UploadClient, tracker: UploadTracker, stagger: Duration) -> Self {
        Self {
            client: Arc::new(client),
            tracker,
            stagger,
        }
    }

    /// The shared progress state.
    pub fn tracker(&self) -> &UploadTracker {
        &self.tracker
    }

    /// Aborts one transfer.
    pub fn cancel(&self, id: TransferId) {
        self.tracker.cancel_one(id);
    }

    /// Aborts every transfer.
    pub fn cancel_all(&self) {
        self.tracker.cancel_all();
    }

    /// Uploads every source into `folder_id` and waits for all of them.
    ///
    /// All sources are registered at 0% up front. Transfers then start
    /// `stagger` apart and run concurrently. A failing source affects only
    /// its own outcome. Dropping the returned future aborts the transfers
    /// still running and closes their records as failed.
    pub async fn upload_all(
        &self,
        sources: Vec<UploadSource>,
        folder_id: Option<FolderId>,
    ) -> Vec<TransferOutcome> {
        let registered: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let id = self.tracker.allocate_id();
                let name = source.display_name();
                let token = self.tracker.begin(id, name.clone());
                (id, name, source, token)
            })
            .collect();

        let _open = OpenTransfers {
            tracker: self.tracker.clone(),
            ids: registered.iter().map(|(id, ..)| *id).collect(),
        };
        let mut outcomes: Vec<Option<TransferOutcome>> = vec![None; registered.len()];
        let mut tasks = JoinSet::new();

        for (index, (id, name, source, token)) in registered.into_iter().enumerate() {
            if index > 0 && !self.stagger.is_zero() {
                tokio::time::sleep(self.stagger).await;
            }

            let client = Arc::clone(&self.client);
            let tracker = self.tracker.clone();
            tasks.spawn(async move {
                let progress_tracker = tracker.clone();
                let on_progress: ProgressFn =
                    Arc::new(move |pct: u8| progress_tracker.update_progress(id, pct));
                let result = client.upload(source, folder_id, on_progress, token).await;
                let status = settle(&tracker, id, &name, result);
                (index, TransferOutcome { id, display_name: name, status })
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => warn!(error = %e, "Upload task did not finish"),
            }
        }

        let outcomes: Vec<TransferOutcome> = outcomes.into_iter().flatten().collect();
        let completed = outcomes
            .iter()
            .filter(|o| matches!(o.status, TransferStatus::Completed(_)))
            .count();
        info!(completed, total = outcomes.len(), "Upload batch finished");
        outcomes
    }
}

/// Closes whatever a batch left open when its future is dropped or a task
/// panics. Settled transfers are untouched.
struct OpenTransfers {
    tracker: UploadTracker,
    ids: Vec<TransferId>,
}

impl Drop for OpenTransfers {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            if self.tracker.fail(id, "Upload abandoned") {
                warn!(transfer = %id, "Upload abandoned before it finished");
            }
        }
    }
}

/// Closes the transfer in the tracker according to how it ended.
fn settle(
    tracker: &UploadTracker,
    id: TransferId,
    name: &str,
    result: Result<RemoteFile, TransferError>,
) -> TransferStatus {
    match result {
        Ok(file) => {
            tracker.complete(id, file.clone());
            TransferStatus::Completed(file)
        }
        Err(TransferError::Cancelled) => {
            tracker.cancel_one(id);
            TransferStatus::Cancelled
        }
        Err(e) => {
            warn!(transfer = %id, name, error = %e, "Upload failed");
            let message = e.to_string();
            tracker.fail(id, message.clone());
            TransferStatus::Failed(message)
        }
    }
}
