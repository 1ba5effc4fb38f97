//! User entity - The signed-in person's profile.
//!
//! The primary key is the identity issued by the authentication provider, never
//! generated locally. The profile lives at `users_profile/{userId}` remotely.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::syncable::{SyncEntity, SyncRecord};

/// User profile database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Identity from the authentication provider
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Name shown in the app header
    pub display_name: String,
    /// Sign-in email address
    pub email: String,
    /// ISO currency code used when formatting amounts
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Optional avatar URL
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Whether the local row matches what was last written remotely
    #[serde(default, skip_serializing)]
    pub synced: bool,
    /// Epoch millis of the last local mutation
    #[serde(default)]
    pub last_updated_timestamp: i64,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Users relate to their records by `user_id` lookups, not foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl SyncRecord for Model {
    type Entity = Entity;

    fn document_id(&self) -> String {
        self.user_id.clone()
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn is_synced(&self) -> bool {
        self.synced
    }

    fn set_synced(&mut self, synced: bool) {
        self.synced = synced;
    }

    fn touch(&mut self, now_millis: i64) {
        self.last_updated_timestamp = now_millis;
    }

    fn last_updated(&self) -> i64 {
        self.last_updated_timestamp
    }
}

impl SyncEntity for Entity {
    type Active = ActiveModel;

    const KIND: &'static str = "user";
    const ID_FIELD: &'static str = "userId";

    fn primary_column() -> Column {
        Column::UserId
    }

    fn owner_column() -> Column {
        Column::UserId
    }

    fn synced_column() -> Column {
        Column::Synced
    }

    fn timestamp_column() -> Column {
        Column::LastUpdatedTimestamp
    }
}
