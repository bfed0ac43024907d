//! SQLite storage for the fuel tracker.
//!
//! Reads go through an r2d2 pool; every write runs on the single writer
//! connection (see [`db::WriteHandle`]) inside an immediate transaction.

pub mod db;
pub mod errors;
pub mod fuels;
pub mod preferences;
pub mod schema;
pub mod sync;
pub mod vehicles;

pub use db::{create_pool, get_connection, init, run_migrations, spawn_writer, DbPool, WriteHandle};
pub use errors::StorageError;
pub use fuels::FuelRepository;
pub use preferences::PreferencesRepository;
pub use sync::MirrorRepository;
pub use vehicles::VehicleRepository;
