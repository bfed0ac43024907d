mod model;
mod repository;

pub use model::FuelDB;
pub use repository::{find_previous_fuel, FuelRepository};
