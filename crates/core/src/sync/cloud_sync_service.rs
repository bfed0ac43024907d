use log::{debug, error, info};
use std::collections::HashSet;
use std::sync::Arc;

use super::cloud_model::{
    BackupOutcome, CloudCollection, CloudWrite, MergeSummary, MirrorRecord, MirrorSnapshot,
};
use super::identity::AccountSession;
use super::sync_traits::{CloudDocumentStore, LocalMirrorStore};
use crate::errors::{Error, Result, SyncError};
use crate::fuels::FuelEvent;
use crate::vehicles::Vehicle;

/// Mirrors the local store to the signed-in account's remote collections.
pub struct CloudSyncService {
    local: Arc<dyn LocalMirrorStore>,
    cloud: Arc<dyn CloudDocumentStore>,
}

impl CloudSyncService {
    pub fn new(local: Arc<dyn LocalMirrorStore>, cloud: Arc<dyn CloudDocumentStore>) -> Self {
        Self { local, cloud }
    }

    /// Pulls both remote collections and merges them into the local store.
    ///
    /// Every document is fetched and decoded before the local merge starts,
    /// so a failed pull leaves local data untouched.
    pub async fn sync_from_cloud(&self, session: Option<&AccountSession>) -> Result<MergeSummary> {
        let Some(session) = session else {
            return Err(SyncError::NotSignedIn.into());
        };

        let result = self.pull_and_merge(session).await;
        match &result {
            Ok(summary) => info!(
                "[CloudSync] Pull complete for {}: inserted={} replaced={} kept={} skipped={}",
                session.account_id,
                summary.inserted,
                summary.replaced,
                summary.kept_local,
                summary.skipped
            ),
            Err(err) => error!("[CloudSync] Pull failed for {}: {}", session.account_id, err),
        }
        result
    }

    async fn pull_and_merge(&self, session: &AccountSession) -> Result<MergeSummary> {
        let remote = MirrorSnapshot {
            vehicles: self.fetch_collection::<Vehicle>(session).await?,
            fuels: self.fetch_collection::<FuelEvent>(session).await?,
        };
        debug!(
            "[CloudSync] Fetched {} vehicles and {} fuel events",
            remote.vehicles.len(),
            remote.fuels.len()
        );
        self.local.merge_remote(remote).await
    }

    async fn fetch_collection<T: MirrorRecord>(&self, session: &AccountSession) -> Result<Vec<T>> {
        self.cloud
            .list_documents(session, T::COLLECTION)
            .await
            .map_err(into_remote_error)?
            .into_iter()
            .map(T::from_document)
            .collect()
    }

    /// Replaces the remote collections with the local contents in one batch.
    /// Returns [`BackupOutcome::Skipped`] when nobody is signed in.
    pub async fn backup_to_cloud(&self, session: Option<&AccountSession>) -> Result<BackupOutcome> {
        let Some(session) = session else {
            debug!("[CloudSync] Backup skipped: not signed in");
            return Ok(BackupOutcome::Skipped);
        };

        let result = self.push(session).await;
        match &result {
            Ok(BackupOutcome::Committed { deleted, written }) => info!(
                "[CloudSync] Backup committed for {}: deleted={} written={}",
                session.account_id, deleted, written
            ),
            Ok(BackupOutcome::Skipped) => {}
            Err(err) => error!("[CloudSync] Backup failed for {}: {}", session.account_id, err),
        }
        result
    }

    async fn push(&self, session: &AccountSession) -> Result<BackupOutcome> {
        let snapshot = self.local.load_snapshot()?;

        let mut writes = Vec::new();
        for collection in CloudCollection::ALL {
            let remote_ids = self
                .cloud
                .list_document_ids(session, collection)
                .await
                .map_err(into_remote_error)?;
            writes.extend(stale_deletes(collection, remote_ids, local_ids(&snapshot, collection)));
        }
        let deleted = writes.len();

        for vehicle in &snapshot.vehicles {
            writes.push(vehicle.to_write()?);
        }
        for fuel in &snapshot.fuels {
            writes.push(fuel.to_write()?);
        }
        let written = writes.len() - deleted;

        self.cloud
            .commit(session, writes)
            .await
            .map_err(into_remote_error)?;
        Ok(BackupOutcome::Committed { deleted, written })
    }
}

fn local_ids(snapshot: &MirrorSnapshot, collection: CloudCollection) -> HashSet<&str> {
    match collection {
        CloudCollection::Vehicles => snapshot.vehicles.iter().map(|v| v.id.as_str()).collect(),
        CloudCollection::Fuels => snapshot.fuels.iter().map(|f| f.id.as_str()).collect(),
    }
}

/// Deletes for remote ids that no longer exist locally, in a stable order.
fn stale_deletes(
    collection: CloudCollection,
    remote_ids: HashSet<String>,
    local_ids: HashSet<&str>,
) -> Vec<CloudWrite> {
    let mut stale: Vec<String> = remote_ids
        .into_iter()
        .filter(|id| !local_ids.contains(id.as_str()))
        .collect();
    stale.sort();
    stale
        .into_iter()
        .map(|id| CloudWrite::Delete { collection, id })
        .collect()
}

/// Transport failures surface as remote sync errors, whatever the adapter
/// reported.
fn into_remote_error(err: Error) -> Error {
    match err {
        Error::Sync(_) => err,
        other => SyncError::remote(other.to_string()).into(),
    }
}
