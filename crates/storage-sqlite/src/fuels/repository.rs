use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use fueltrack_core::errors::DatabaseError;
use fueltrack_core::events::{ChangeFeed, DataChange};
use fueltrack_core::fuels::{
    compute_derived_fields, FuelEvent, FuelEventUpdate, FuelRepositoryTrait, NewFuelEvent,
};
use fueltrack_core::utils::time_utils::{now_millis, to_millis};
use fueltrack_core::vehicles::Vehicle;
use fueltrack_core::{Error, Result};

use super::model::FuelDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{fuels, vehicles};
use crate::vehicles::VehicleDB;

/// The latest event of `vehicle_id` ordered strictly before
/// `(date_ms, created_at_ms)`, skipping `exclude_id`.
pub fn find_previous_fuel(
    conn: &mut SqliteConnection,
    vehicle_id: &str,
    date_ms: i64,
    created_at_ms: i64,
    exclude_id: Option<&str>,
) -> Result<Option<FuelDB>> {
    let mut query = fuels::table
        .filter(fuels::vehicle_id.eq(vehicle_id.to_string()))
        .filter(
            fuels::date.lt(date_ms).or(fuels::date
                .eq(date_ms)
                .and(fuels::created_at.lt(created_at_ms))),
        )
        .into_boxed();
    if let Some(exclude_id) = exclude_id {
        query = query.filter(fuels::id.ne(exclude_id.to_string()));
    }

    let row = query
        .order((fuels::date.desc(), fuels::created_at.desc()))
        .select(FuelDB::as_select())
        .first::<FuelDB>(conn)
        .optional()
        .map_err(StorageError::from)?;
    Ok(row)
}

/// Creation stamp for a new event: now, or one millisecond past the newest
/// event already on `date_ms`, so same-date rows keep insertion order.
fn next_created_at(conn: &mut SqliteConnection, vehicle_id: &str, date_ms: i64) -> Result<i64> {
    let latest = fuels::table
        .filter(fuels::vehicle_id.eq(vehicle_id))
        .filter(fuels::date.eq(date_ms))
        .select(max(fuels::created_at))
        .first::<Option<i64>>(conn)
        .map_err(StorageError::from)?;
    let now = to_millis(&now_millis());
    Ok(latest.map_or(now, |latest| now.max(latest + 1)))
}

fn load_vehicle(conn: &mut SqliteConnection, vehicle_id: &str) -> Result<Vehicle> {
    vehicles::table
        .find(vehicle_id)
        .select(VehicleDB::as_select())
        .first::<VehicleDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .map(Vehicle::from)
        .ok_or_else(|| Error::VehicleNotFound(vehicle_id.to_string()))
}

pub struct FuelRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
    changes: ChangeFeed,
}

impl FuelRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle, changes: ChangeFeed) -> Self {
        FuelRepository {
            pool,
            writer,
            changes,
        }
    }
}

#[async_trait]
impl FuelRepositoryTrait for FuelRepository {
    fn get_fuel_events(&self) -> Result<Vec<FuelEvent>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = fuels::table
            .order((fuels::date.desc(), fuels::created_at.desc()))
            .select(FuelDB::as_select())
            .load::<FuelDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(FuelEvent::from).collect())
    }

    fn get_fuel_events_for_vehicle(&self, vehicle_id: &str) -> Result<Vec<FuelEvent>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = fuels::table
            .filter(fuels::vehicle_id.eq(vehicle_id))
            .order((fuels::date.desc(), fuels::created_at.desc()))
            .select(FuelDB::as_select())
            .load::<FuelDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(FuelEvent::from).collect())
    }

    fn get_fuel_event(&self, fuel_id: &str) -> Result<Option<FuelEvent>> {
        let mut conn = get_connection(&self.pool)?;
        let row = fuels::table
            .find(fuel_id)
            .select(FuelDB::as_select())
            .first::<FuelDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(FuelEvent::from))
    }

    fn get_previous_fuel_event(
        &self,
        vehicle_id: &str,
        date: DateTime<Utc>,
        created_at: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<Option<FuelEvent>> {
        let mut conn = get_connection(&self.pool)?;
        let row = find_previous_fuel(
            &mut conn,
            vehicle_id,
            to_millis(&date),
            to_millis(&created_at),
            exclude_id,
        )?;
        Ok(row.map(FuelEvent::from))
    }

    async fn insert_fuel_event(&self, new_event: NewFuelEvent) -> Result<FuelEvent> {
        let event = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<FuelEvent> {
                let vehicle = load_vehicle(conn, &new_event.vehicle_id)?;
                let date_ms = to_millis(&new_event.reading.date);
                let created_at = next_created_at(conn, &vehicle.id, date_ms)?;
                let previous = find_previous_fuel(conn, &vehicle.id, date_ms, created_at, None)?
                    .map(FuelEvent::from);
                let derived = compute_derived_fields(&new_event.reading, &vehicle, previous.as_ref());

                let row = FuelDB::from_reading(
                    new_event.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                    vehicle.id,
                    new_event.reading,
                    derived,
                    created_at,
                    created_at,
                );
                let inserted = diesel::insert_into(fuels::table)
                    .values(&row)
                    .returning(FuelDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(FuelEvent::from(inserted))
            })
            .await?;
        self.changes.notify(DataChange::Fuels);
        Ok(event)
    }

    async fn update_fuel_event(&self, event_update: FuelEventUpdate) -> Result<FuelEvent> {
        let event = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<FuelEvent> {
                let existing = fuels::table
                    .find(&event_update.id)
                    .select(FuelDB::as_select())
                    .first::<FuelDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| {
                        DatabaseError::NotFound(format!(
                            "Fuel event {} not found",
                            event_update.id
                        ))
                    })?;
                let vehicle = load_vehicle(conn, &existing.vehicle_id)?;
                let previous = find_previous_fuel(
                    conn,
                    &vehicle.id,
                    to_millis(&event_update.reading.date),
                    existing.created_at,
                    Some(&existing.id),
                )?
                .map(FuelEvent::from);
                let derived =
                    compute_derived_fields(&event_update.reading, &vehicle, previous.as_ref());

                let row = FuelDB::from_reading(
                    existing.id,
                    existing.vehicle_id,
                    event_update.reading,
                    derived,
                    existing.created_at,
                    to_millis(&now_millis()),
                );
                diesel::update(fuels::table.find(&row.id))
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(FuelEvent::from(row))
            })
            .await?;
        self.changes.notify(DataChange::Fuels);
        Ok(event)
    }

    async fn delete_fuel_event(&self, fuel_id: &str) -> Result<usize> {
        let fuel_id = fuel_id.to_string();
        let affected = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(fuels::table.find(fuel_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await?;
        if affected > 0 {
            self.changes.notify(DataChange::Fuels);
        }
        Ok(affected)
    }
}
