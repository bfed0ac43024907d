//! Snapshot reads and last-writer-wins merges for the cloud mirror.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::{debug, warn};
use std::sync::Arc;

use fueltrack_core::events::{ChangeFeed, DataChange};
use fueltrack_core::fuels::FuelEvent;
use fueltrack_core::sync::{
    resolve_lww, LocalMirrorStore, MergeAction, MergeSummary, MirrorSnapshot,
};
use fueltrack_core::utils::time_utils::from_millis;
use fueltrack_core::vehicles::Vehicle;
use fueltrack_core::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::fuels::FuelDB;
use crate::schema::{fuels, vehicles};
use crate::vehicles::VehicleDB;

pub struct MirrorRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
    changes: ChangeFeed,
}

impl MirrorRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle, changes: ChangeFeed) -> Self {
        MirrorRepository {
            pool,
            writer,
            changes,
        }
    }
}

fn merge_vehicle(
    conn: &mut SqliteConnection,
    remote: Vehicle,
    summary: &mut MergeSummary,
) -> Result<bool> {
    let local_updated_at = vehicles::table
        .find(&remote.id)
        .select(vehicles::updated_at)
        .first::<i64>(conn)
        .optional()
        .map_err(StorageError::from)?;

    let row = VehicleDB::from(remote);
    match resolve_lww(local_updated_at.map(from_millis), from_millis(row.updated_at)) {
        MergeAction::Insert => {
            diesel::insert_into(vehicles::table)
                .values(&row)
                .execute(conn)
                .map_err(StorageError::from)?;
            summary.inserted += 1;
            Ok(true)
        }
        MergeAction::Replace => {
            // UPDATE rather than REPLACE so the cascade does not drop fuel rows.
            diesel::update(vehicles::table.find(&row.id))
                .set(&row)
                .execute(conn)
                .map_err(StorageError::from)?;
            summary.replaced += 1;
            Ok(true)
        }
        MergeAction::KeepLocal => {
            summary.kept_local += 1;
            Ok(false)
        }
    }
}

fn merge_fuel(
    conn: &mut SqliteConnection,
    remote: FuelEvent,
    summary: &mut MergeSummary,
) -> Result<bool> {
    let vehicle_known = diesel::select(exists(vehicles::table.find(&remote.vehicle_id)))
        .get_result::<bool>(conn)
        .map_err(StorageError::from)?;
    if !vehicle_known {
        warn!(
            "[CloudSync] Skipping fuel event {}: vehicle {} does not exist",
            remote.id, remote.vehicle_id
        );
        summary.skipped += 1;
        return Ok(false);
    }

    let local_updated_at = fuels::table
        .find(&remote.id)
        .select(fuels::updated_at)
        .first::<i64>(conn)
        .optional()
        .map_err(StorageError::from)?;

    let row = FuelDB::from(remote);
    match resolve_lww(local_updated_at.map(from_millis), from_millis(row.updated_at)) {
        MergeAction::Insert => {
            diesel::insert_into(fuels::table)
                .values(&row)
                .execute(conn)
                .map_err(StorageError::from)?;
            summary.inserted += 1;
            Ok(true)
        }
        MergeAction::Replace => {
            diesel::update(fuels::table.find(&row.id))
                .set(&row)
                .execute(conn)
                .map_err(StorageError::from)?;
            summary.replaced += 1;
            Ok(true)
        }
        MergeAction::KeepLocal => {
            summary.kept_local += 1;
            Ok(false)
        }
    }
}

#[async_trait]
impl LocalMirrorStore for MirrorRepository {
    fn load_snapshot(&self) -> Result<MirrorSnapshot> {
        let mut conn = get_connection(&self.pool)?;
        let (vehicle_rows, fuel_rows) = conn
            .transaction::<_, StorageError, _>(|tx| {
                let vehicle_rows = vehicles::table
                    .order(vehicles::id.asc())
                    .select(VehicleDB::as_select())
                    .load::<VehicleDB>(tx)?;
                let fuel_rows = fuels::table
                    .order(fuels::id.asc())
                    .select(FuelDB::as_select())
                    .load::<FuelDB>(tx)?;
                Ok((vehicle_rows, fuel_rows))
            })?;

        Ok(MirrorSnapshot {
            vehicles: vehicle_rows.into_iter().map(Vehicle::from).collect(),
            fuels: fuel_rows.into_iter().map(FuelEvent::from).collect(),
        })
    }

    async fn merge_remote(&self, remote: MirrorSnapshot) -> Result<MergeSummary> {
        let (summary, vehicles_changed, fuels_changed) = self
            .writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<(MergeSummary, bool, bool)> {
                    let mut summary = MergeSummary::default();
                    let mut vehicles_changed = false;
                    let mut fuels_changed = false;
                    for vehicle in remote.vehicles {
                        vehicles_changed |= merge_vehicle(conn, vehicle, &mut summary)?;
                    }
                    for fuel in remote.fuels {
                        fuels_changed |= merge_fuel(conn, fuel, &mut summary)?;
                    }
                    Ok((summary, vehicles_changed, fuels_changed))
                },
            )
            .await?;

        debug!(
            "[Storage] Merged remote snapshot: inserted={} replaced={} kept={} skipped={}",
            summary.inserted, summary.replaced, summary.kept_local, summary.skipped
        );
        if vehicles_changed {
            self.changes.notify(DataChange::Vehicles);
        }
        if fuels_changed {
            self.changes.notify(DataChange::Fuels);
        }
        Ok(summary)
    }
}
