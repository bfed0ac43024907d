//! Database model for fuel events.

use diesel::prelude::*;
use fueltrack_core::fuels::{DerivedFuelFields, FuelEvent, FuelReading};
use fueltrack_core::utils::time_utils::{from_millis, to_millis};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::fuels)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FuelDB {
    pub id: String,
    pub vehicle_id: String,
    pub date: i64,
    pub odometer: i32,
    pub trip: i32,
    pub fuel_added: f64,
    pub fuel_type: String,
    pub price_per_liter: f64,
    pub total_cost: f64,
    pub fuel_economy: f64,
    pub cost_per_km: f64,
    pub fuel_remaining: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FuelDB {
    /// Builds a row from user input plus freshly computed derived fields.
    pub fn from_reading(
        id: String,
        vehicle_id: String,
        reading: FuelReading,
        derived: DerivedFuelFields,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        Self {
            id,
            vehicle_id,
            date: to_millis(&reading.date),
            odometer: reading.odometer,
            trip: reading.trip,
            fuel_added: reading.fuel_added,
            fuel_type: reading.fuel_type,
            price_per_liter: reading.price_per_liter,
            total_cost: derived.total_cost,
            fuel_economy: derived.fuel_economy,
            cost_per_km: derived.cost_per_km,
            fuel_remaining: derived.fuel_remaining,
            created_at,
            updated_at,
        }
    }
}

impl From<FuelDB> for FuelEvent {
    fn from(db: FuelDB) -> Self {
        Self {
            id: db.id,
            vehicle_id: db.vehicle_id,
            date: from_millis(db.date),
            odometer: db.odometer,
            trip: db.trip,
            fuel_added: db.fuel_added,
            fuel_type: db.fuel_type,
            price_per_liter: db.price_per_liter,
            total_cost: db.total_cost,
            fuel_economy: db.fuel_economy,
            cost_per_km: db.cost_per_km,
            fuel_remaining: db.fuel_remaining,
            created_at: from_millis(db.created_at),
            updated_at: from_millis(db.updated_at),
        }
    }
}

impl From<FuelEvent> for FuelDB {
    fn from(domain: FuelEvent) -> Self {
        Self {
            date: to_millis(&domain.date),
            created_at: to_millis(&domain.created_at),
            updated_at: to_millis(&domain.updated_at),
            id: domain.id,
            vehicle_id: domain.vehicle_id,
            odometer: domain.odometer,
            trip: domain.trip,
            fuel_added: domain.fuel_added,
            fuel_type: domain.fuel_type,
            price_per_liter: domain.price_per_liter,
            total_cost: domain.total_cost,
            fuel_economy: domain.fuel_economy,
            cost_per_km: domain.cost_per_km,
            fuel_remaining: domain.fuel_remaining,
        }
    }
}
