//! Domain core for the fuel tracker.
//!
//! Holds the vehicle and fuel models, the derived-field calculator, input
//! validation, repository contracts, and the cloud mirror orchestration
//! (pull/merge, push, debounced observer). Storage and transport live in
//! sibling crates and plug in through the traits defined here.

pub mod errors;
pub mod events;
pub mod fuels;
pub mod preferences;
pub mod sync;
pub mod utils;
pub mod validation;
pub mod vehicles;

pub use errors::{Error, Result};
