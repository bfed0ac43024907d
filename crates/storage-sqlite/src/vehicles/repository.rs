use async_trait::async_trait;
use diesel::dsl::{avg, count_star, max, min, sum};
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use fueltrack_core::events::{ChangeFeed, DataChange};
use fueltrack_core::utils::time_utils::{from_millis, now_millis, to_millis};
use fueltrack_core::vehicles::{
    FuelAggregates, NewVehicle, Vehicle, VehicleRepositoryTrait, VehicleUpdate, VehicleWithStats,
};
use fueltrack_core::{Error, Result};

use super::model::VehicleDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{fuels, vehicles};

type AggregateRow = (
    String,
    i64,
    Option<i32>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<i64>,
);

pub struct VehicleRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
    changes: ChangeFeed,
}

impl VehicleRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle, changes: ChangeFeed) -> Self {
        VehicleRepository {
            pool,
            writer,
            changes,
        }
    }

    /// Per-vehicle aggregates over the fuel table for the given vehicles.
    fn load_aggregates(
        conn: &mut SqliteConnection,
        vehicle_ids: &[String],
    ) -> Result<HashMap<String, FuelAggregates>> {
        let query = fuels::table
            .filter(fuels::vehicle_id.eq_any(vehicle_ids))
            .group_by(fuels::vehicle_id)
            .select((
                fuels::vehicle_id,
                count_star(),
                max(fuels::odometer),
                avg(fuels::fuel_economy),
                sum(fuels::fuel_added),
                sum(fuels::total_cost),
                avg(fuels::fuel_added),
                avg(fuels::total_cost),
                min(fuels::date),
            ));

        let rows = query
            .load::<AggregateRow>(conn)
            .map_err(StorageError::from)?;
        Ok(rows
            .into_iter()
            .map(
                |(id, count, odometer, economy, added, spent, avg_added, avg_spent, first)| {
                    (
                        id,
                        FuelAggregates {
                            refuel_count: count,
                            latest_odometer: odometer,
                            average_fuel_economy: economy,
                            total_fuel_added: added,
                            total_spent: spent,
                            average_fuel_added: avg_added,
                            average_spent: avg_spent,
                            first_refuel_at: first.map(from_millis),
                        },
                    )
                },
            )
            .collect())
    }

    fn with_stats(
        vehicles: Vec<Vehicle>,
        mut aggregates: HashMap<String, FuelAggregates>,
    ) -> Vec<VehicleWithStats> {
        let now = now_millis();
        vehicles
            .into_iter()
            .map(|vehicle| {
                let stats = aggregates.remove(&vehicle.id).unwrap_or_default();
                VehicleWithStats::from_aggregates(vehicle, stats, now)
            })
            .collect()
    }
}

#[async_trait]
impl VehicleRepositoryTrait for VehicleRepository {
    fn get_vehicles(&self) -> Result<Vec<Vehicle>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = vehicles::table
            .order(vehicles::created_at.desc())
            .select(VehicleDB::as_select())
            .load::<VehicleDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Vehicle::from).collect())
    }

    fn get_vehicle(&self, vehicle_id: &str) -> Result<Option<Vehicle>> {
        let mut conn = get_connection(&self.pool)?;
        let row = vehicles::table
            .find(vehicle_id)
            .select(VehicleDB::as_select())
            .first::<VehicleDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Vehicle::from))
    }

    fn get_vehicles_with_stats(&self) -> Result<Vec<VehicleWithStats>> {
        let vehicles = self.get_vehicles()?;
        let ids: Vec<String> = vehicles.iter().map(|v| v.id.clone()).collect();
        let mut conn = get_connection(&self.pool)?;
        let aggregates = Self::load_aggregates(&mut conn, &ids)?;
        Ok(Self::with_stats(vehicles, aggregates))
    }

    fn get_vehicle_with_stats(&self, vehicle_id: &str) -> Result<Option<VehicleWithStats>> {
        let Some(vehicle) = self.get_vehicle(vehicle_id)? else {
            return Ok(None);
        };
        let mut conn = get_connection(&self.pool)?;
        let aggregates = Self::load_aggregates(&mut conn, &[vehicle.id.clone()])?;
        Ok(Self::with_stats(vec![vehicle], aggregates).pop())
    }

    async fn insert_vehicle(&self, new_vehicle: NewVehicle) -> Result<Vehicle> {
        let vehicle = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vehicle> {
                let now = to_millis(&now_millis());
                let row = VehicleDB {
                    id: new_vehicle
                        .id
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    name: new_vehicle.name,
                    manufacturer: new_vehicle.manufacturer,
                    model: new_vehicle.model,
                    year: new_vehicle.year,
                    max_fuel_capacity: new_vehicle.max_fuel_capacity,
                    created_at: now,
                    updated_at: now,
                };
                let inserted = diesel::insert_into(vehicles::table)
                    .values(&row)
                    .returning(VehicleDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Vehicle::from(inserted))
            })
            .await?;
        self.changes.notify(DataChange::Vehicles);
        Ok(vehicle)
    }

    async fn update_vehicle(&self, vehicle_update: VehicleUpdate) -> Result<Vehicle> {
        let vehicle = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vehicle> {
                let existing = vehicles::table
                    .find(&vehicle_update.id)
                    .select(VehicleDB::as_select())
                    .first::<VehicleDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| Error::VehicleNotFound(vehicle_update.id.clone()))?;

                let row = VehicleDB {
                    id: existing.id,
                    name: vehicle_update.name,
                    manufacturer: vehicle_update.manufacturer,
                    model: vehicle_update.model,
                    year: vehicle_update.year,
                    max_fuel_capacity: vehicle_update.max_fuel_capacity,
                    created_at: existing.created_at,
                    updated_at: to_millis(&now_millis()),
                };
                diesel::update(vehicles::table.find(&row.id))
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(Vehicle::from(row))
            })
            .await?;
        self.changes.notify(DataChange::Vehicles);
        Ok(vehicle)
    }

    async fn delete_vehicle(&self, vehicle_id: &str) -> Result<usize> {
        let vehicle_id = vehicle_id.to_string();
        let affected = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(vehicles::table.find(vehicle_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await?;
        if affected > 0 {
            // Fuel events went with it through the cascade.
            self.changes.notify(DataChange::Vehicles);
            self.changes.notify(DataChange::Fuels);
        }
        Ok(affected)
    }
}
