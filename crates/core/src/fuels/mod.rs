//! Fuel events: models, derived-field calculator, repository contract, and service.

mod fuels_calculator;
mod fuels_model;
mod fuels_service;
mod fuels_traits;

pub use fuels_calculator::{compute_derived_fields, DerivedFuelFields};
pub use fuels_model::*;
pub use fuels_service::FuelService;
pub use fuels_traits::{FuelRepositoryTrait, FuelServiceTrait};
