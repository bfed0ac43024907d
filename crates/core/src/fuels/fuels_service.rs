use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;

use super::fuels_model::{FuelEvent, FuelEventUpdate, FuelReading, NewFuelEvent};
use super::fuels_traits::{FuelRepositoryTrait, FuelServiceTrait};
use crate::errors::{DatabaseError, Error, Result};
use crate::validation::{trip_from_odometer, validate_fuel};
use crate::vehicles::{Vehicle, VehicleRepositoryTrait};

/// Validates refuel input against the owning vehicle and its history before
/// handing it to the repository.
pub struct FuelService {
    vehicle_repository: Arc<dyn VehicleRepositoryTrait>,
    fuel_repository: Arc<dyn FuelRepositoryTrait>,
}

impl FuelService {
    pub fn new(
        vehicle_repository: Arc<dyn VehicleRepositoryTrait>,
        fuel_repository: Arc<dyn FuelRepositoryTrait>,
    ) -> Self {
        Self {
            vehicle_repository,
            fuel_repository,
        }
    }

    fn require_vehicle(&self, vehicle_id: &str) -> Result<Vehicle> {
        self.vehicle_repository
            .get_vehicle(vehicle_id)?
            .ok_or_else(|| Error::VehicleNotFound(vehicle_id.to_string()))
    }

    fn validate_reading(
        &self,
        reading: &FuelReading,
        vehicle: &Vehicle,
        previous: Option<&FuelEvent>,
    ) -> Result<()> {
        validate_fuel(
            reading.as_input(),
            vehicle.max_fuel_capacity,
            previous.map(|event| event.odometer),
        )?;
        Ok(())
    }
}

#[async_trait]
impl FuelServiceTrait for FuelService {
    fn get_fuel_events_for_vehicle(&self, vehicle_id: &str) -> Result<Vec<FuelEvent>> {
        self.fuel_repository.get_fuel_events_for_vehicle(vehicle_id)
    }

    fn suggest_trip(&self, vehicle_id: &str, odometer: i32) -> Result<Option<i32>> {
        let latest = self
            .fuel_repository
            .get_fuel_events_for_vehicle(vehicle_id)?
            .iter()
            .map(|event| event.odometer)
            .max();
        match latest {
            Some(previous) => Ok(Some(trip_from_odometer(odometer, previous)?)),
            None => Ok(None),
        }
    }

    async fn record_fuel_event(&self, new_event: NewFuelEvent) -> Result<FuelEvent> {
        let vehicle = self.require_vehicle(&new_event.vehicle_id)?;
        // The store stamps a new row after every existing row on the same
        // date, so all of them are candidates.
        let previous = self.fuel_repository.get_previous_fuel_event(
            &vehicle.id,
            new_event.reading.date,
            DateTime::<Utc>::MAX_UTC,
            None,
        )?;
        self.validate_reading(&new_event.reading, &vehicle, previous.as_ref())?;

        let event = self.fuel_repository.insert_fuel_event(new_event).await?;
        debug!(
            "Recorded fuel event {} for vehicle {} ({} L)",
            event.id, event.vehicle_id, event.fuel_added
        );
        Ok(event)
    }

    async fn edit_fuel_event(&self, event_update: FuelEventUpdate) -> Result<FuelEvent> {
        let existing = self
            .fuel_repository
            .get_fuel_event(&event_update.id)?
            .ok_or_else(|| {
                DatabaseError::NotFound(format!("Fuel event {} not found", event_update.id))
            })?;
        let vehicle = self.require_vehicle(&existing.vehicle_id)?;
        let previous = self.fuel_repository.get_previous_fuel_event(
            &vehicle.id,
            event_update.reading.date,
            existing.created_at,
            Some(&existing.id),
        )?;
        self.validate_reading(&event_update.reading, &vehicle, previous.as_ref())?;

        self.fuel_repository.update_fuel_event(event_update).await
    }

    async fn delete_fuel_event(&self, fuel_id: &str) -> Result<usize> {
        self.fuel_repository.delete_fuel_event(fuel_id).await
    }
}
