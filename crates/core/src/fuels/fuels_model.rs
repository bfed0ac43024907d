use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::FuelInput;

/// A stored refuel. The four derived fields are always computed by the
/// repository and never taken from input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelEvent {
    pub id: String,
    pub vehicle_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    pub odometer: i32,
    /// Distance since the previous refuel.
    pub trip: i32,
    pub fuel_added: f64,
    pub fuel_type: String,
    pub price_per_liter: f64,
    pub total_cost: f64,
    pub fuel_economy: f64,
    pub cost_per_km: f64,
    pub fuel_remaining: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// User-entered refuel values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelReading {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    pub odometer: i32,
    pub trip: i32,
    pub fuel_added: f64,
    pub fuel_type: String,
    pub price_per_liter: f64,
}

impl FuelReading {
    pub fn as_input(&self) -> FuelInput<'_> {
        FuelInput {
            odometer: self.odometer,
            trip: self.trip,
            fuel_added: self.fuel_added,
            fuel_type: &self.fuel_type,
            price_per_liter: self.price_per_liter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFuelEvent {
    #[serde(default)]
    pub id: Option<String>,
    pub vehicle_id: String,
    #[serde(flatten)]
    pub reading: FuelReading,
}

/// Replacement values for an existing refuel. The owning vehicle and
/// `created_at` stay as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelEventUpdate {
    pub id: String,
    #[serde(flatten)]
    pub reading: FuelReading,
}
