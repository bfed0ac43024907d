mod config;
mod context;

use anyhow::Result;
use log::{error, info, warn};

use fueltrack_core::sync::{BackupOutcome, IdentityProvider};

use crate::config::AgentConfig;
use crate::context::{initialize_context, ServiceContext};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AgentConfig::from_env()?;
    let context = initialize_context(&config)?;

    start_sync(&context, &config).await;
    log_garage(&context);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    shutdown(&context).await;
    Ok(())
}

/// Signs in with a freshly supplied profile, or resumes from the cached one.
async fn start_sync(context: &ServiceContext, config: &AgentConfig) {
    let Some(session) = config.session.clone() else {
        info!("[CloudSync] No account configured, running local-only");
        return;
    };

    let result = match config.profile.clone() {
        Some(profile) => context.account_sync().sign_in(session, profile).await.map(Some),
        None => {
            context.sessions.set(session);
            context.account_sync().resume_on_launch().await
        }
    };

    match result {
        Ok(Some(summary)) => {
            info!(
                "[CloudSync] Pulled account data: inserted={} replaced={} kept={} skipped={}",
                summary.inserted, summary.replaced, summary.kept_local, summary.skipped
            );
            if let Ok(Some(user)) = context.preferences.get_user() {
                info!("[CloudSync] Syncing as {} <{}>", user.display_name, user.email);
            }
        }
        Ok(None) => warn!("[CloudSync] No cached profile; set FUELTRACK_USER_NAME and FUELTRACK_USER_EMAIL to sign in"),
        Err(err) => error!("[CloudSync] Initial sync failed: {}", err),
    }
}

fn log_garage(context: &ServiceContext) {
    match context.vehicle_service().get_vehicles_with_stats() {
        Ok(vehicles) => {
            for entry in vehicles {
                info!(
                    "{} ({} {}): {} refuels, odometer {}, {:.2} km/l average",
                    entry.vehicle.name,
                    entry.vehicle.manufacturer,
                    entry.vehicle.model,
                    entry.refuel_count,
                    entry.latest_odometer,
                    entry.average_fuel_economy
                );
                let latest = context
                    .fuel_service()
                    .get_fuel_events_for_vehicle(&entry.vehicle.id);
                if let Ok(Some(last)) = latest.map(|events| events.into_iter().next()) {
                    info!(
                        "  last fill {}: {:.2} l, {:.2} l left in tank",
                        last.date.format("%Y-%m-%d"),
                        last.fuel_added,
                        last.fuel_remaining
                    );
                }
            }
        }
        Err(err) => error!("Failed to load vehicles: {}", err),
    }
}

/// Stops observing, then pushes once so a pending debounce window is not lost.
async fn shutdown(context: &ServiceContext) {
    context.sync_observer.stop_syncing().await;
    let session = context.sessions.current_session();
    match context.cloud_sync.backup_to_cloud(session.as_ref()).await {
        Ok(BackupOutcome::Committed { deleted, written }) => {
            info!("[CloudSync] Final backup: deleted={} written={}", deleted, written)
        }
        Ok(BackupOutcome::Skipped) => {}
        Err(err) => error!("[CloudSync] Final backup failed: {}", err),
    }
}
