use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::fuels_model::{FuelEvent, FuelEventUpdate, NewFuelEvent};
use crate::errors::Result;

/// Storage contract for fuel events.
#[async_trait]
pub trait FuelRepositoryTrait: Send + Sync {
    /// All events, newest date first.
    fn get_fuel_events(&self) -> Result<Vec<FuelEvent>>;
    fn get_fuel_events_for_vehicle(&self, vehicle_id: &str) -> Result<Vec<FuelEvent>>;
    fn get_fuel_event(&self, fuel_id: &str) -> Result<Option<FuelEvent>>;
    /// The last event of `vehicle_id` strictly before `(date, created_at)`,
    /// optionally ignoring one row (the event being edited).
    fn get_previous_fuel_event(
        &self,
        vehicle_id: &str,
        date: DateTime<Utc>,
        created_at: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<Option<FuelEvent>>;
    /// Computes the derived fields and stores the event in one transaction.
    async fn insert_fuel_event(&self, new_event: NewFuelEvent) -> Result<FuelEvent>;
    async fn update_fuel_event(&self, event_update: FuelEventUpdate) -> Result<FuelEvent>;
    async fn delete_fuel_event(&self, fuel_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait FuelServiceTrait: Send + Sync {
    fn get_fuel_events_for_vehicle(&self, vehicle_id: &str) -> Result<Vec<FuelEvent>>;
    /// Distance since the vehicle's highest stored odometer. `None` when the
    /// vehicle has no events yet.
    fn suggest_trip(&self, vehicle_id: &str, odometer: i32) -> Result<Option<i32>>;
    async fn record_fuel_event(&self, new_event: NewFuelEvent) -> Result<FuelEvent>;
    async fn edit_fuel_event(&self, event_update: FuelEventUpdate) -> Result<FuelEvent>;
    async fn delete_fuel_event(&self, fuel_id: &str) -> Result<usize>;
}
