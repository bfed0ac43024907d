use async_trait::async_trait;

use super::preferences_model::UserProfile;
use crate::errors::Result;

#[async_trait]
pub trait PreferencesRepositoryTrait: Send + Sync {
    fn get_locale(&self) -> Result<Option<String>>;
    async fn set_locale(&self, locale: &str) -> Result<()>;
    /// The cached profile, or `None` if nothing was saved.
    fn get_user(&self) -> Result<Option<UserProfile>>;
    async fn save_user(&self, profile: UserProfile) -> Result<()>;
    async fn clear_user(&self) -> Result<()>;
}
