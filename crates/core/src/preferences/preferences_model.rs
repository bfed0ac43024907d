use serde::{Deserialize, Serialize};

pub const LOCALE_KEY: &str = "locale";
pub const USER_NAME_KEY: &str = "user_name";
pub const USER_EMAIL_KEY: &str = "user_email";
pub const USER_PHOTO_KEY: &str = "user_photo";

/// Profile of the signed-in account as cached on this device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl UserProfile {
    /// A cached profile is only trusted for auto-resume when both the name
    /// and email were stored.
    pub fn is_complete(&self) -> bool {
        !self.display_name.trim().is_empty() && !self.email.trim().is_empty()
    }
}
