//! Derived fuel fields computed at write time.

use serde::{Deserialize, Serialize};

use super::fuels_model::{FuelEvent, FuelReading};
use crate::vehicles::Vehicle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFuelFields {
    pub total_cost: f64,
    /// Distance per liter, measured against the previous fill.
    pub fuel_economy: f64,
    pub cost_per_km: f64,
    /// Tank capacity minus this fill. Not clamped.
    pub fuel_remaining: f64,
}

/// Computes the derived fields for `reading`.
///
/// `previous` must be the event that immediately precedes the reading for the
/// same vehicle, ordered by `(date, created_at)`. The distance driven since
/// that fill was paid for by the fuel added at that fill, so economy divides
/// the trip by `previous.fuel_added`, not by this reading's volume.
pub fn compute_derived_fields(
    reading: &FuelReading,
    vehicle: &Vehicle,
    previous: Option<&FuelEvent>,
) -> DerivedFuelFields {
    let total_cost = reading.fuel_added * reading.price_per_liter;
    let trip = f64::from(reading.trip);

    let fuel_economy = match previous {
        Some(prev) if reading.trip > 0 && prev.fuel_added > 0.0 => trip / prev.fuel_added,
        _ => 0.0,
    };

    let cost_per_km = if reading.trip > 0 {
        total_cost / trip
    } else {
        0.0
    };

    DerivedFuelFields {
        total_cost,
        fuel_economy,
        cost_per_km,
        fuel_remaining: vehicle.max_fuel_capacity - reading.fuel_added,
    }
}
