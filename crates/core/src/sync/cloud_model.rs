//! Remote document layout and the values exchanged with the mirror stores.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, SyncError};
use crate::fuels::FuelEvent;
use crate::vehicles::Vehicle;

/// The two per-account collections in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudCollection {
    Vehicles,
    Fuels,
}

impl CloudCollection {
    pub const ALL: [CloudCollection; 2] = [CloudCollection::Vehicles, CloudCollection::Fuels];

    /// Last path segment under `users/{account_id}`.
    pub fn segment(self) -> &'static str {
        match self {
            CloudCollection::Vehicles => "vehicles",
            CloudCollection::Fuels => "fuel",
        }
    }

    pub fn path(self, account_id: &str) -> String {
        format!("users/{}/{}", account_id, self.segment())
    }
}

impl std::fmt::Display for CloudCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.segment())
    }
}

/// One remote document. `data` holds the record's full field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudDocument {
    pub id: String,
    pub data: Value,
}

/// One operation of an atomic remote batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum CloudWrite {
    /// Full replace of the document.
    Set {
        collection: CloudCollection,
        id: String,
        data: Value,
    },
    Delete {
        collection: CloudCollection,
        id: String,
    },
}

/// Every local record, read in one transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorSnapshot {
    pub vehicles: Vec<Vehicle>,
    pub fuels: Vec<FuelEvent>,
}

/// Counts reported by a pull-merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub inserted: usize,
    pub replaced: usize,
    pub kept_local: usize,
    /// Fuel documents whose vehicle exists nowhere.
    pub skipped: usize,
}

impl MergeSummary {
    pub fn changed(&self) -> bool {
        self.inserted + self.replaced > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupOutcome {
    /// Nobody signed in, nothing was sent.
    Skipped,
    Committed { deleted: usize, written: usize },
}

/// A record mirrored one-to-one as a remote document.
pub trait MirrorRecord: Serialize + DeserializeOwned {
    const COLLECTION: CloudCollection;

    fn record_id(&self) -> &str;
    fn updated_at(&self) -> DateTime<Utc>;

    fn to_write(&self) -> Result<CloudWrite> {
        Ok(CloudWrite::Set {
            collection: Self::COLLECTION,
            id: self.record_id().to_string(),
            data: serde_json::to_value(self)?,
        })
    }

    /// Decodes a pulled document. A body without an `id` takes the document
    /// id; a body whose `id` disagrees with it is rejected.
    fn from_document(document: CloudDocument) -> Result<Self> {
        let CloudDocument { id, mut data } = document;
        let invalid = |reason: String| SyncError::InvalidDocument {
            collection: Self::COLLECTION.to_string(),
            id: id.clone(),
            reason,
        };

        let Some(body) = data.as_object_mut() else {
            return Err(invalid("document body is not an object".to_string()).into());
        };
        match body.get("id") {
            None | Some(Value::Null) => {
                body.insert("id".to_string(), Value::String(id.clone()));
            }
            Some(Value::String(body_id)) if *body_id == id => {}
            Some(other) => {
                return Err(invalid(format!("body id {} does not match", other)).into());
            }
        }

        serde_json::from_value(data).map_err(|err| invalid(err.to_string()).into())
    }
}

impl MirrorRecord for Vehicle {
    const COLLECTION: CloudCollection = CloudCollection::Vehicles;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl MirrorRecord for FuelEvent {
    const COLLECTION: CloudCollection = CloudCollection::Fuels;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
