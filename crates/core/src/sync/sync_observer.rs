//! Debounced push of local changes to the cloud.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use super::cloud_sync_service::CloudSyncService;
use super::identity::IdentityProvider;
use crate::events::{ChangeFeed, DataChange};

/// Quiet period after the last local change before a push starts.
pub const SYNC_DEBOUNCE_MILLIS: u64 = 2000;

/// Watches the change feed and pushes once writes have settled.
///
/// The window opens once on start, and every change re-arms it. When the
/// window expires with someone signed in, a backup is spawned as its own task;
/// stopping the observer cancels a pending window but never a push that
/// already started.
pub struct SyncObserver {
    cloud_sync: Arc<CloudSyncService>,
    identity: Arc<dyn IdentityProvider>,
    feed: ChangeFeed,
    debounce: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncObserver {
    pub fn new(
        cloud_sync: Arc<CloudSyncService>,
        identity: Arc<dyn IdentityProvider>,
        feed: ChangeFeed,
    ) -> Self {
        Self::with_debounce(
            cloud_sync,
            identity,
            feed,
            Duration::from_millis(SYNC_DEBOUNCE_MILLIS),
        )
    }

    pub fn with_debounce(
        cloud_sync: Arc<CloudSyncService>,
        identity: Arc<dyn IdentityProvider>,
        feed: ChangeFeed,
        debounce: Duration,
    ) -> Self {
        Self {
            cloud_sync,
            identity,
            feed,
            debounce,
            task: Mutex::new(None),
        }
    }

    /// Starts observing, replacing any previous run.
    pub async fn start_syncing(&self) {
        let mut guard = self.task.lock().await;
        if let Some(previous) = guard.take() {
            previous.abort();
        }

        // Subscribe before spawning so a write right after this call is seen.
        let receiver = self.feed.subscribe();
        let handle = tokio::spawn(observe(
            receiver,
            Arc::clone(&self.cloud_sync),
            Arc::clone(&self.identity),
            self.debounce,
        ));
        *guard = Some(handle);
        info!(
            "[SyncObserver] Started (debounce {} ms)",
            self.debounce.as_millis()
        );
    }

    pub async fn stop_syncing(&self) {
        let mut guard = self.task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
            info!("[SyncObserver] Stopped");
        }
    }

    pub async fn is_syncing(&self) -> bool {
        let guard = self.task.lock().await;
        guard.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

async fn observe(
    mut receiver: broadcast::Receiver<DataChange>,
    cloud_sync: Arc<CloudSyncService>,
    identity: Arc<dyn IdentityProvider>,
    debounce: Duration,
) {
    // Subscribing counts as a change, so records written before the observer
    // started (or merged by the pull that preceded it) are pushed as well.
    let mut feed_closed = settle(&mut receiver, debounce).await;
    schedule_backup(&cloud_sync, identity.as_ref());

    while !feed_closed {
        match receiver.recv().await {
            Ok(change) => debug!("[SyncObserver] Local change: {:?}", change),
            Err(RecvError::Lagged(missed)) => {
                debug!("[SyncObserver] Lagged by {} changes", missed)
            }
            Err(RecvError::Closed) => break,
        }

        feed_closed = settle(&mut receiver, debounce).await;
        schedule_backup(&cloud_sync, identity.as_ref());
    }
    debug!("[SyncObserver] Change feed closed");
}

/// Waits until no change arrives for `debounce`. Returns true if the feed
/// closed while waiting.
async fn settle(receiver: &mut broadcast::Receiver<DataChange>, debounce: Duration) -> bool {
    loop {
        match tokio::time::timeout(debounce, receiver.recv()).await {
            Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => continue,
            Ok(Err(RecvError::Closed)) => return true,
            Err(_) => return false,
        }
    }
}

fn schedule_backup(cloud_sync: &Arc<CloudSyncService>, identity: &dyn IdentityProvider) {
    let Some(session) = identity.current_session() else {
        debug!("[SyncObserver] Not signed in, skipping backup");
        return;
    };

    let cloud_sync = Arc::clone(cloud_sync);
    tokio::spawn(async move {
        if let Err(err) = cloud_sync.backup_to_cloud(Some(&session)).await {
            warn!("[SyncObserver] Backup after local change failed: {}", err);
        }
    });
}
