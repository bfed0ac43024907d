//! Transport for the cloud mirror.
//!
//! [`CloudStoreClient`] talks to the hosted per-account document store over
//! HTTPS. [`MemoryCloudStore`] keeps the same layout in process.

pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use client::CloudStoreClient;
pub use error::{CloudSyncError, Result};
pub use memory::MemoryCloudStore;
pub use types::{CommitRequest, CommitResponse, ListDocumentsResponse};
