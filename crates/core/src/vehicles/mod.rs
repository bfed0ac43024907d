//! Vehicles: models, repository contract, and service.

mod vehicles_model;
mod vehicles_service;
mod vehicles_traits;

pub use vehicles_model::*;
pub use vehicles_service::VehicleService;
pub use vehicles_traits::{VehicleRepositoryTrait, VehicleServiceTrait};
