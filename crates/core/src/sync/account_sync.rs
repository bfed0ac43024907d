use log::{debug, info};
use std::sync::Arc;

use super::cloud_model::MergeSummary;
use super::cloud_sync_service::CloudSyncService;
use super::identity::{AccountSession, IdentityProvider, SessionStore};
use super::sync_observer::SyncObserver;
use crate::errors::Result;
use crate::preferences::{PreferencesRepositoryTrait, UserProfile};

/// Ties the signed-in account to the mirror: pull on sign-in, observe while
/// signed in, stop on sign-out.
pub struct AccountSync {
    sessions: Arc<SessionStore>,
    preferences: Arc<dyn PreferencesRepositoryTrait>,
    cloud_sync: Arc<CloudSyncService>,
    observer: Arc<SyncObserver>,
}

impl AccountSync {
    pub fn new(
        sessions: Arc<SessionStore>,
        preferences: Arc<dyn PreferencesRepositoryTrait>,
        cloud_sync: Arc<CloudSyncService>,
        observer: Arc<SyncObserver>,
    ) -> Self {
        Self {
            sessions,
            preferences,
            cloud_sync,
            observer,
        }
    }

    /// Stores the session and profile, pulls the account's data, then starts
    /// observing. The observer is not started if the pull fails.
    pub async fn sign_in(
        &self,
        session: AccountSession,
        profile: UserProfile,
    ) -> Result<MergeSummary> {
        info!("[CloudSync] Signing in {}", session.account_id);
        self.sessions.set(session.clone());
        self.preferences.save_user(profile).await?;

        let summary = self.cloud_sync.sync_from_cloud(Some(&session)).await?;
        self.observer.start_syncing().await;
        Ok(summary)
    }

    /// Forgets the cached profile and stops observing. The observer is
    /// stopped even if clearing the profile fails.
    pub async fn sign_out(&self) -> Result<()> {
        let cleared = self.preferences.clear_user().await;
        self.observer.stop_syncing().await;
        self.sessions.clear();
        info!("[CloudSync] Signed out");
        cleared
    }

    /// Resumes syncing on app launch when a complete profile was cached and a
    /// session is available. Returns `None` when there was nothing to resume.
    pub async fn resume_on_launch(&self) -> Result<Option<MergeSummary>> {
        let profile_complete = self
            .preferences
            .get_user()?
            .is_some_and(|profile| profile.is_complete());
        if !profile_complete {
            debug!("[CloudSync] No cached profile, not resuming sync");
            return Ok(None);
        }
        let Some(session) = self.sessions.current_session() else {
            debug!("[CloudSync] No active session, not resuming sync");
            return Ok(None);
        };

        let summary = self.cloud_sync.sync_from_cloud(Some(&session)).await?;
        self.observer.start_syncing().await;
        Ok(Some(summary))
    }
}
