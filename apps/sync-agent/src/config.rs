use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use fueltrack_core::preferences::UserProfile;
use fueltrack_core::sync::{AccountSession, SYNC_DEBOUNCE_MILLIS};

const DEFAULT_DATA_DIR: &str = "./data";

/// Runtime settings, read from `FUELTRACK_*` environment variables.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub data_dir: PathBuf,
    /// Base URL of the cloud document store. Without it the mirror stays in memory.
    pub cloud_api_url: Option<String>,
    pub session: Option<AccountSession>,
    pub profile: Option<UserProfile>,
    pub sync_debounce: Duration,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_dir = var("FUELTRACK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let cloud_api_url = var("FUELTRACK_CLOUD_API_URL")
            .map(|url| url.trim_end_matches('/').to_string());

        let session = match (var("FUELTRACK_ACCOUNT_ID"), var("FUELTRACK_ACCESS_TOKEN")) {
            (Some(account_id), Some(token)) => Some(AccountSession::new(account_id, token)),
            (None, None) => None,
            _ => bail!("FUELTRACK_ACCOUNT_ID and FUELTRACK_ACCESS_TOKEN must be set together"),
        };

        let profile = match (var("FUELTRACK_USER_NAME"), var("FUELTRACK_USER_EMAIL")) {
            (Some(display_name), Some(email)) => Some(UserProfile {
                display_name,
                email,
                photo_url: None,
            }),
            _ => None,
        };

        let debounce_ms = match var("FUELTRACK_SYNC_DEBOUNCE_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("FUELTRACK_SYNC_DEBOUNCE_MS is not a number: {}", raw))?,
            None => SYNC_DEBOUNCE_MILLIS,
        };

        Ok(Self {
            data_dir,
            cloud_api_url,
            session,
            profile,
            sync_debounce: Duration::from_millis(debounce_ms),
        })
    }
}
