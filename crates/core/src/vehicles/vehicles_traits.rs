use async_trait::async_trait;

use super::vehicles_model::{NewVehicle, Vehicle, VehicleUpdate, VehicleWithStats};
use crate::errors::Result;

/// Storage contract for vehicles.
#[async_trait]
pub trait VehicleRepositoryTrait: Send + Sync {
    /// All vehicles, newest first.
    fn get_vehicles(&self) -> Result<Vec<Vehicle>>;
    fn get_vehicle(&self, vehicle_id: &str) -> Result<Option<Vehicle>>;
    fn get_vehicles_with_stats(&self) -> Result<Vec<VehicleWithStats>>;
    fn get_vehicle_with_stats(&self, vehicle_id: &str) -> Result<Option<VehicleWithStats>>;
    async fn insert_vehicle(&self, new_vehicle: NewVehicle) -> Result<Vehicle>;
    async fn update_vehicle(&self, vehicle_update: VehicleUpdate) -> Result<Vehicle>;
    /// Deletes the vehicle and, through the foreign key, its fuel events.
    async fn delete_vehicle(&self, vehicle_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait VehicleServiceTrait: Send + Sync {
    fn get_vehicles_with_stats(&self) -> Result<Vec<VehicleWithStats>>;
    fn get_vehicle_with_stats(&self, vehicle_id: &str) -> Result<Option<VehicleWithStats>>;
    async fn create_vehicle(&self, new_vehicle: NewVehicle) -> Result<Vehicle>;
    async fn update_vehicle(&self, vehicle_update: VehicleUpdate) -> Result<Vehicle>;
    async fn delete_vehicle(&self, vehicle_id: &str) -> Result<usize>;
}
