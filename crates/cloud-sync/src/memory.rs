//! In-process document store used by local-only setups and tests.

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use fueltrack_core::errors::{Result, SyncError};
use fueltrack_core::sync::{
    AccountSession, CloudCollection, CloudDocument, CloudDocumentStore, CloudWrite,
};

type Tree = HashMap<(String, CloudCollection), BTreeMap<String, Value>>;

/// Keeps documents per account and collection, ordered by id.
#[derive(Debug, Default)]
pub struct MemoryCloudStore {
    tree: Mutex<Tree>,
    commits: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryCloudStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail as if the service were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of batches applied so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn document(
        &self,
        account_id: &str,
        collection: CloudCollection,
        id: &str,
    ) -> Option<Value> {
        self.lock()
            .get(&(account_id.to_string(), collection))
            .and_then(|docs| docs.get(id).cloned())
    }

    /// Stores a document directly, bypassing the batch API.
    pub fn put_document(
        &self,
        account_id: &str,
        collection: CloudCollection,
        id: &str,
        data: Value,
    ) {
        self.lock()
            .entry((account_id.to_string(), collection))
            .or_default()
            .insert(id.to_string(), data);
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SyncError::remote("cloud store unavailable").into());
        }
        Ok(())
    }
}

#[async_trait]
impl CloudDocumentStore for MemoryCloudStore {
    async fn list_documents(
        &self,
        session: &AccountSession,
        collection: CloudCollection,
    ) -> Result<Vec<CloudDocument>> {
        self.check_available()?;
        let tree = self.lock();
        let documents = tree
            .get(&(session.account_id.clone(), collection))
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| CloudDocument {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(documents)
    }

    async fn commit(&self, session: &AccountSession, writes: Vec<CloudWrite>) -> Result<()> {
        self.check_available()?;
        let mut tree = self.lock();
        // The lock is held for the whole batch, so readers never see half of it.
        for write in writes {
            match write {
                CloudWrite::Set {
                    collection,
                    id,
                    data,
                } => {
                    tree.entry((session.account_id.clone(), collection))
                        .or_default()
                        .insert(id, data);
                }
                CloudWrite::Delete { collection, id } => {
                    if let Some(docs) = tree.get_mut(&(session.account_id.clone(), collection)) {
                        docs.remove(&id);
                    }
                }
            }
        }
        let count = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("[CloudSync] Memory store applied batch #{}", count);
        Ok(())
    }
}
