use anyhow::{Context, Result};
use log::{info, warn};
use std::sync::Arc;

use fueltrack_cloud_sync::{CloudStoreClient, MemoryCloudStore};
use fueltrack_core::events::ChangeFeed;
use fueltrack_core::fuels::{FuelService, FuelServiceTrait};
use fueltrack_core::preferences::PreferencesRepositoryTrait;
use fueltrack_core::sync::{
    AccountSync, CloudDocumentStore, CloudSyncService, IdentityProvider, SessionStore,
    SyncObserver,
};
use fueltrack_core::vehicles::{VehicleService, VehicleServiceTrait};
use fueltrack_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, FuelRepository, MirrorRepository,
    PreferencesRepository, VehicleRepository,
};

use crate::config::AgentConfig;

pub struct ServiceContext {
    pub sessions: Arc<SessionStore>,

    // Services
    pub vehicle_service: Arc<dyn VehicleServiceTrait>,
    pub fuel_service: Arc<dyn FuelServiceTrait>,
    pub preferences: Arc<dyn PreferencesRepositoryTrait>,
    pub cloud_sync: Arc<CloudSyncService>,
    pub sync_observer: Arc<SyncObserver>,
    pub account_sync: Arc<AccountSync>,
}

impl ServiceContext {
    pub fn vehicle_service(&self) -> Arc<dyn VehicleServiceTrait> {
        Arc::clone(&self.vehicle_service)
    }

    pub fn fuel_service(&self) -> Arc<dyn FuelServiceTrait> {
        Arc::clone(&self.fuel_service)
    }

    pub fn account_sync(&self) -> Arc<AccountSync> {
        Arc::clone(&self.account_sync)
    }
}

fn cloud_store(config: &AgentConfig) -> Result<Arc<dyn CloudDocumentStore>> {
    match &config.cloud_api_url {
        Some(url) => {
            let client = CloudStoreClient::new(url).context("Failed to build cloud client")?;
            info!("[CloudSync] Using cloud store at {}", client.base_url());
            Ok(Arc::new(client))
        }
        None => {
            warn!("[CloudSync] FUELTRACK_CLOUD_API_URL not set, mirroring to memory only");
            Ok(Arc::new(MemoryCloudStore::new()))
        }
    }
}

/// Opens the database and wires every service. Must run inside a tokio runtime.
pub fn initialize_context(config: &AgentConfig) -> Result<ServiceContext> {
    let db_path = init(&config.data_dir).context("Failed to prepare data directory")?;
    let pool = create_pool(&db_path).context("Failed to open database")?;
    run_migrations(&pool).context("Failed to run migrations")?;
    let writer = spawn_writer(&pool).context("Failed to start database writer")?;
    info!("[Storage] Database ready at {}", db_path.display());

    // Shared by every repository and the observer.
    let changes = ChangeFeed::new();
    let sessions = Arc::new(SessionStore::new());

    let vehicle_repository = Arc::new(VehicleRepository::new(
        pool.clone(),
        writer.clone(),
        changes.clone(),
    ));
    let fuel_repository = Arc::new(FuelRepository::new(
        pool.clone(),
        writer.clone(),
        changes.clone(),
    ));
    let mirror_repository = Arc::new(MirrorRepository::new(
        pool.clone(),
        writer.clone(),
        changes.clone(),
    ));
    let preferences: Arc<dyn PreferencesRepositoryTrait> =
        Arc::new(PreferencesRepository::new(pool, writer));

    let vehicle_service = Arc::new(VehicleService::new(vehicle_repository.clone()));
    let fuel_service = Arc::new(FuelService::new(vehicle_repository, fuel_repository));

    let cloud_sync = Arc::new(CloudSyncService::new(
        mirror_repository,
        cloud_store(config)?,
    ));
    let identity: Arc<dyn IdentityProvider> = sessions.clone();
    let sync_observer = Arc::new(SyncObserver::with_debounce(
        cloud_sync.clone(),
        identity,
        changes,
        config.sync_debounce,
    ));
    let account_sync = Arc::new(AccountSync::new(
        sessions.clone(),
        preferences.clone(),
        cloud_sync.clone(),
        sync_observer.clone(),
    ));

    Ok(ServiceContext {
        sessions,
        vehicle_service,
        fuel_service,
        preferences,
        cloud_sync,
        sync_observer,
        account_sync,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn local_config(dir: &std::path::Path) -> AgentConfig {
        AgentConfig {
            data_dir: dir.to_path_buf(),
            cloud_api_url: None,
            session: None,
            profile: None,
            sync_debounce: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn wires_services_against_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let context = initialize_context(&local_config(dir.path())).unwrap();

        assert!(context.vehicle_service().get_vehicles_with_stats().unwrap().is_empty());
        assert!(context.preferences.get_user().unwrap().is_none());
        assert!(!context.sync_observer.is_syncing().await);
        assert_eq!(context.account_sync().resume_on_launch().await.unwrap(), None);
    }
}
