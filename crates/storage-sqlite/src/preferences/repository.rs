use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use fueltrack_core::preferences::{
    PreferencesRepositoryTrait, UserProfile, LOCALE_KEY, USER_EMAIL_KEY, USER_NAME_KEY,
    USER_PHOTO_KEY,
};
use fueltrack_core::utils::time_utils::{now_millis, to_millis};
use fueltrack_core::Result;

use super::model::AppPreferenceDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::app_preferences;

const USER_KEYS: [&str; 3] = [USER_NAME_KEY, USER_EMAIL_KEY, USER_PHOTO_KEY];

/// Key-value preferences in the local database.
pub struct PreferencesRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PreferencesRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        PreferencesRepository { pool, writer }
    }

    fn load_values(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = app_preferences::table
            .filter(app_preferences::pref_key.eq_any(keys.to_vec()))
            .select(AppPreferenceDB::as_select())
            .load::<AppPreferenceDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| (row.pref_key, row.pref_value))
            .collect())
    }
}

fn upsert(conn: &mut SqliteConnection, key: &str, value: String, now: i64) -> Result<()> {
    let row = AppPreferenceDB {
        pref_key: key.to_string(),
        pref_value: value,
        updated_at: now,
    };
    diesel::insert_into(app_preferences::table)
        .values(&row)
        .on_conflict(app_preferences::pref_key)
        .do_update()
        .set(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

#[async_trait]
impl PreferencesRepositoryTrait for PreferencesRepository {
    fn get_locale(&self) -> Result<Option<String>> {
        Ok(self.load_values(&[LOCALE_KEY])?.remove(LOCALE_KEY))
    }

    async fn set_locale(&self, locale: &str) -> Result<()> {
        let locale = locale.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                upsert(conn, LOCALE_KEY, locale, to_millis(&now_millis()))
            })
            .await
    }

    fn get_user(&self) -> Result<Option<UserProfile>> {
        let mut values = self.load_values(&USER_KEYS)?;
        let display_name = values.remove(USER_NAME_KEY);
        let email = values.remove(USER_EMAIL_KEY);
        if display_name.is_none() && email.is_none() {
            return Ok(None);
        }
        Ok(Some(UserProfile {
            display_name: display_name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            photo_url: values.remove(USER_PHOTO_KEY),
        }))
    }

    async fn save_user(&self, profile: UserProfile) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let now = to_millis(&now_millis());
                upsert(conn, USER_NAME_KEY, profile.display_name, now)?;
                upsert(conn, USER_EMAIL_KEY, profile.email, now)?;
                match profile.photo_url {
                    Some(url) => upsert(conn, USER_PHOTO_KEY, url, now)?,
                    None => {
                        diesel::delete(app_preferences::table.find(USER_PHOTO_KEY))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                    }
                }
                Ok(())
            })
            .await
    }

    async fn clear_user(&self) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::delete(
                    app_preferences::table.filter(app_preferences::pref_key.eq_any(USER_KEYS)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
