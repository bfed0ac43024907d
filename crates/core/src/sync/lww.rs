//! Last-writer-wins rule applied when merging pulled documents.

use chrono::{DateTime, Utc};

/// What to do with one pulled record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// No local row with this id.
    Insert,
    /// Remote is strictly newer; replace the whole local row.
    Replace,
    /// Local is as new or newer.
    KeepLocal,
}

/// Decides how a remote record with `remote_updated_at` merges into a local
/// row last updated at `local_updated_at`. Ties keep the local row.
pub fn resolve_lww(
    local_updated_at: Option<DateTime<Utc>>,
    remote_updated_at: DateTime<Utc>,
) -> MergeAction {
    match local_updated_at {
        None => MergeAction::Insert,
        Some(local) if remote_updated_at > local => MergeAction::Replace,
        Some(_) => MergeAction::KeepLocal,
    }
}
