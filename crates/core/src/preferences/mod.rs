//! Locally stored app preferences and the signed-in user's profile.

mod preferences_model;
mod preferences_traits;

pub use preferences_model::*;
pub use preferences_traits::PreferencesRepositoryTrait;
