use async_trait::async_trait;
use chrono::{Datelike, Utc};
use log::debug;
use std::sync::Arc;

use super::vehicles_model::{NewVehicle, Vehicle, VehicleUpdate, VehicleWithStats};
use super::vehicles_traits::{VehicleRepositoryTrait, VehicleServiceTrait};
use crate::errors::Result;

pub struct VehicleService {
    repository: Arc<dyn VehicleRepositoryTrait>,
}

impl VehicleService {
    pub fn new(repository: Arc<dyn VehicleRepositoryTrait>) -> Self {
        Self { repository }
    }

    fn current_year() -> i32 {
        Utc::now().year()
    }
}

#[async_trait]
impl VehicleServiceTrait for VehicleService {
    fn get_vehicles_with_stats(&self) -> Result<Vec<VehicleWithStats>> {
        self.repository.get_vehicles_with_stats()
    }

    fn get_vehicle_with_stats(&self, vehicle_id: &str) -> Result<Option<VehicleWithStats>> {
        self.repository.get_vehicle_with_stats(vehicle_id)
    }

    async fn create_vehicle(&self, new_vehicle: NewVehicle) -> Result<Vehicle> {
        new_vehicle.validate(Self::current_year())?;
        let vehicle = self.repository.insert_vehicle(new_vehicle).await?;
        debug!("Created vehicle {} ({})", vehicle.id, vehicle.name);
        Ok(vehicle)
    }

    async fn update_vehicle(&self, vehicle_update: VehicleUpdate) -> Result<Vehicle> {
        vehicle_update.validate(Self::current_year())?;
        self.repository.update_vehicle(vehicle_update).await
    }

    async fn delete_vehicle(&self, vehicle_id: &str) -> Result<usize> {
        self.repository.delete_vehicle(vehicle_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::utils::time_utils::now_millis;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRepository {
        inserted: Mutex<Vec<NewVehicle>>,
    }

    #[async_trait]
    impl VehicleRepositoryTrait for RecordingRepository {
        fn get_vehicles(&self) -> Result<Vec<Vehicle>> {
            Ok(Vec::new())
        }

        fn get_vehicle(&self, _vehicle_id: &str) -> Result<Option<Vehicle>> {
            Ok(None)
        }

        fn get_vehicles_with_stats(&self) -> Result<Vec<VehicleWithStats>> {
            Ok(Vec::new())
        }

        fn get_vehicle_with_stats(&self, _vehicle_id: &str) -> Result<Option<VehicleWithStats>> {
            Ok(None)
        }

        async fn insert_vehicle(&self, new_vehicle: NewVehicle) -> Result<Vehicle> {
            self.inserted.lock().unwrap().push(new_vehicle.clone());
            let now = now_millis();
            Ok(Vehicle {
                id: new_vehicle.id.unwrap_or_else(|| "generated".to_string()),
                name: new_vehicle.name,
                manufacturer: new_vehicle.manufacturer,
                model: new_vehicle.model,
                year: new_vehicle.year,
                max_fuel_capacity: new_vehicle.max_fuel_capacity,
                created_at: now,
                updated_at: now,
            })
        }

        async fn update_vehicle(&self, vehicle_update: VehicleUpdate) -> Result<Vehicle> {
            Err(Error::VehicleNotFound(vehicle_update.id))
        }

        async fn delete_vehicle(&self, _vehicle_id: &str) -> Result<usize> {
            Ok(0)
        }
    }

    fn new_vehicle(max_fuel_capacity: f64) -> NewVehicle {
        NewVehicle {
            id: None,
            name: "Commuter".to_string(),
            manufacturer: "Toyota".to_string(),
            model: "Yaris".to_string(),
            year: 2019,
            max_fuel_capacity,
        }
    }

    #[tokio::test]
    async fn invalid_vehicle_never_reaches_the_repository() {
        let repository = Arc::new(RecordingRepository::default());
        let service = VehicleService::new(repository.clone());

        let err = service.create_vehicle(new_vehicle(0.0)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(repository.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn valid_vehicle_is_persisted() {
        let repository = Arc::new(RecordingRepository::default());
        let service = VehicleService::new(repository.clone());

        let vehicle = service.create_vehicle(new_vehicle(42.0)).await.unwrap();
        assert_eq!(vehicle.max_fuel_capacity, 42.0);
        assert_eq!(repository.inserted.lock().unwrap().len(), 1);
    }
}
