mod model;
mod repository;

pub use model::AppPreferenceDB;
pub use repository::PreferencesRepository;
