//! Field-level input validation for vehicle and fuel forms.
//!
//! Validation runs before anything reaches a repository; a failed check is
//! reported per field so a form can show each message next to its input.

use serde::{Deserialize, Serialize};
use std::fmt;

/// First year a production automobile existed.
pub const MIN_VEHICLE_YEAR: i32 = 1886;

/// How many model years ahead of the current year are accepted.
pub const MAX_FUTURE_MODEL_YEARS: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// One or more rejected form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message for `field`, if it failed.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (idx, error) in self.errors.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Raw vehicle form values.
#[derive(Debug, Clone, Copy)]
pub struct VehicleInput<'a> {
    pub name: &'a str,
    pub manufacturer: &'a str,
    pub model: &'a str,
    pub year: i32,
    pub max_fuel_capacity: f64,
}

pub fn validate_vehicle(input: VehicleInput<'_>, current_year: i32) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();

    if input.name.trim().is_empty() {
        errors.push("name", "Name cannot be empty");
    }
    if input.manufacturer.trim().is_empty() {
        errors.push("manufacturer", "Manufacturer cannot be empty");
    }
    if input.model.trim().is_empty() {
        errors.push("model", "Model cannot be empty");
    }

    let max_year = current_year + MAX_FUTURE_MODEL_YEARS;
    if input.year < MIN_VEHICLE_YEAR || input.year > max_year {
        errors.push(
            "year",
            format!(
                "Year must be a valid number between {} and {}",
                MIN_VEHICLE_YEAR, max_year
            ),
        );
    }

    if !input.max_fuel_capacity.is_finite() || input.max_fuel_capacity <= 0.0 {
        errors.push(
            "maxFuelCapacity",
            "Max fuel must be a valid positive decimal number",
        );
    }

    errors.into_result()
}

/// Raw refuel form values.
#[derive(Debug, Clone, Copy)]
pub struct FuelInput<'a> {
    pub odometer: i32,
    pub trip: i32,
    pub fuel_added: f64,
    pub fuel_type: &'a str,
    pub price_per_liter: f64,
}

/// Checks a refuel against its vehicle's tank and the preceding odometer
/// reading (if any).
pub fn validate_fuel(
    input: FuelInput<'_>,
    max_fuel_capacity: f64,
    previous_odometer: Option<i32>,
) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();

    if input.odometer < 0 {
        errors.push("odometer", "Odometer must be a positive number");
    } else if let Some(previous) = previous_odometer {
        if input.odometer < previous {
            errors.push(
                "odometer",
                format!(
                    "Odometer cannot be less than previous reading ({} km)",
                    previous
                ),
            );
        }
    }

    if input.trip < 0 {
        errors.push("trip", "Trip must be a positive number");
    }

    if !input.fuel_added.is_finite() || input.fuel_added <= 0.0 {
        errors.push("fuelAdded", "Fuel added must be a positive number");
    } else if input.fuel_added > max_fuel_capacity {
        errors.push(
            "fuelAdded",
            format!(
                "Fuel added cannot exceed max capacity ({} L)",
                max_fuel_capacity
            ),
        );
    }

    if input.fuel_type.trim().is_empty() {
        errors.push("fuelType", "Fuel type is required");
    }

    if !input.price_per_liter.is_finite() || input.price_per_liter <= 0.0 {
        errors.push("pricePerLiter", "Price per liter must be a positive number");
    }

    errors.into_result()
}

/// Distance driven since the previous refuel, derived from two odometer readings.
pub fn trip_from_odometer(odometer: i32, previous_odometer: i32) -> Result<i32, ValidationError> {
    if odometer < 0 {
        return Err(ValidationError::single(
            "odometer",
            "Odometer must be a positive number",
        ));
    }
    if odometer < previous_odometer {
        return Err(ValidationError::single(
            "odometer",
            format!(
                "Odometer cannot be less than previous reading ({} km)",
                previous_odometer
            ),
        ));
    }
    odometer.checked_sub(previous_odometer).ok_or_else(|| {
        ValidationError::single(
            "odometer",
            format!(
                "Odometer is too far from previous reading ({} km)",
                previous_odometer
            ),
        )
    })
}
