//! Database model for vehicles.

use diesel::prelude::*;
use fueltrack_core::utils::time_utils::{from_millis, to_millis};
use fueltrack_core::vehicles::Vehicle;

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::vehicles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VehicleDB {
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub year: i32,
    pub max_fuel_capacity: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<VehicleDB> for Vehicle {
    fn from(db: VehicleDB) -> Self {
        Self {
            id: db.id,
            name: db.name,
            manufacturer: db.manufacturer,
            model: db.model,
            year: db.year,
            max_fuel_capacity: db.max_fuel_capacity,
            created_at: from_millis(db.created_at),
            updated_at: from_millis(db.updated_at),
        }
    }
}

impl From<Vehicle> for VehicleDB {
    fn from(domain: Vehicle) -> Self {
        Self {
            created_at: to_millis(&domain.created_at),
            updated_at: to_millis(&domain.updated_at),
            id: domain.id,
            name: domain.name,
            manufacturer: domain.manufacturer,
            model: domain.model,
            year: domain.year,
            max_fuel_capacity: domain.max_fuel_capacity,
        }
    }
}
