//! Cloud mirror: pull-merge with last-writer-wins, full-state push with
//! deletions, and the debounced observer that drives pushes.

mod account_sync;
mod cloud_model;
mod cloud_sync_service;
mod identity;
mod lww;
mod sync_observer;
mod sync_traits;

pub use account_sync::AccountSync;
pub use cloud_model::*;
pub use cloud_sync_service::CloudSyncService;
pub use identity::{AccountSession, IdentityProvider, SessionStore};
pub use lww::{resolve_lww, MergeAction};
pub use sync_observer::{SyncObserver, SYNC_DEBOUNCE_MILLIS};
pub use sync_traits::{CloudDocumentStore, LocalMirrorStore};

#[cfg(test)]
mod tests;
