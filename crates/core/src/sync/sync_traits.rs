use async_trait::async_trait;
use std::collections::HashSet;

use super::cloud_model::{CloudCollection, CloudDocument, CloudWrite, MergeSummary, MirrorSnapshot};
use super::identity::AccountSession;
use crate::errors::Result;

/// Remote per-account document store.
#[async_trait]
pub trait CloudDocumentStore: Send + Sync {
    async fn list_documents(
        &self,
        session: &AccountSession,
        collection: CloudCollection,
    ) -> Result<Vec<CloudDocument>>;

    async fn list_document_ids(
        &self,
        session: &AccountSession,
        collection: CloudCollection,
    ) -> Result<HashSet<String>> {
        let documents = self.list_documents(session, collection).await?;
        Ok(documents.into_iter().map(|document| document.id).collect())
    }

    /// Applies every write or none of them.
    async fn commit(&self, session: &AccountSession, writes: Vec<CloudWrite>) -> Result<()>;
}

/// Local side of the mirror.
#[async_trait]
pub trait LocalMirrorStore: Send + Sync {
    fn load_snapshot(&self) -> Result<MirrorSnapshot>;

    /// Merges pulled records with last-writer-wins in a single local
    /// transaction, vehicles before fuel events.
    async fn merge_remote(&self, remote: MirrorSnapshot) -> Result<MergeSummary>;
}
