use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::time_utils::months_between;
use crate::validation::{validate_vehicle, ValidationError, VehicleInput};

/// A tracked vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub year: i32,
    /// Tank size in liters.
    pub max_fuel_capacity: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub year: i32,
    pub max_fuel_capacity: f64,
}

impl NewVehicle {
    pub fn validate(&self, current_year: i32) -> Result<(), ValidationError> {
        validate_vehicle(
            VehicleInput {
                name: &self.name,
                manufacturer: &self.manufacturer,
                model: &self.model,
                year: self.year,
                max_fuel_capacity: self.max_fuel_capacity,
            },
            current_year,
        )
    }
}

/// Editable vehicle fields; timestamps are managed by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub year: i32,
    pub max_fuel_capacity: f64,
}

impl VehicleUpdate {
    pub fn validate(&self, current_year: i32) -> Result<(), ValidationError> {
        validate_vehicle(
            VehicleInput {
                name: &self.name,
                manufacturer: &self.manufacturer,
                model: &self.model,
                year: self.year,
                max_fuel_capacity: self.max_fuel_capacity,
            },
            current_year,
        )
    }
}

/// Raw per-vehicle aggregates as returned by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuelAggregates {
    pub refuel_count: i64,
    pub latest_odometer: Option<i32>,
    pub average_fuel_economy: Option<f64>,
    pub total_fuel_added: Option<f64>,
    pub total_spent: Option<f64>,
    pub average_fuel_added: Option<f64>,
    pub average_spent: Option<f64>,
    pub first_refuel_at: Option<DateTime<Utc>>,
}

/// A vehicle together with statistics over its fuel events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleWithStats {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub latest_odometer: i32,
    pub average_fuel_economy: f64,
    pub total_fuel_added: f64,
    pub total_spent: f64,
    pub refuel_count: i64,
    pub refuel_per_month: f64,
    pub avg_liter_refueled: f64,
    pub avg_spent_per_refuel: f64,
}

impl VehicleWithStats {
    /// Fills every statistic, defaulting to zero when the vehicle has no events.
    pub fn from_aggregates(vehicle: Vehicle, aggregates: FuelAggregates, now: DateTime<Utc>) -> Self {
        let refuel_per_month =
            refuels_per_month(aggregates.refuel_count, aggregates.first_refuel_at, now);
        Self {
            vehicle,
            latest_odometer: aggregates.latest_odometer.unwrap_or(0),
            average_fuel_economy: aggregates.average_fuel_economy.unwrap_or(0.0),
            total_fuel_added: aggregates.total_fuel_added.unwrap_or(0.0),
            total_spent: aggregates.total_spent.unwrap_or(0.0),
            refuel_count: aggregates.refuel_count,
            refuel_per_month,
            avg_liter_refueled: aggregates.average_fuel_added.unwrap_or(0.0),
            avg_spent_per_refuel: aggregates.average_spent.unwrap_or(0.0),
        }
    }
}

/// Refuels per month since the first record. The month denominator never
/// drops below 1, so young histories are not reported as inflated rates.
pub fn refuels_per_month(
    refuel_count: i64,
    first_refuel_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let Some(first) = first_refuel_at else {
        return 0.0;
    };
    if refuel_count <= 0 {
        return 0.0;
    }
    let months = months_between(&first, &now).max(1.0);
    refuel_count as f64 / months
}
