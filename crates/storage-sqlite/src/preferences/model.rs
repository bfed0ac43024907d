use diesel::prelude::*;

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(primary_key(pref_key))]
#[diesel(table_name = crate::schema::app_preferences)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AppPreferenceDB {
    pub pref_key: String,
    pub pref_value: String,
    pub updated_at: i64,
}
