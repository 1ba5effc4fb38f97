//! Saving entity - A single deposit towards a saving goal.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::syncable::{SyncEntity, SyncRecord};
use crate::remote::Collection;

/// Saving database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "savings")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Locally assigned key, also the remote document id
    #[sea_orm(primary_key)]
    pub saving_id: i64,
    /// Goal this deposit counts towards
    pub saving_goal_id: i64,
    /// Owner identity
    pub user_id: String,
    /// Amount put aside
    pub amount: f64,
    /// Day of the deposit
    pub date: Date,
    /// Free-form note
    #[serde(default)]
    pub note: Option<String>,
    /// Whether the local row matches what was last written remotely
    #[serde(default, skip_serializing)]
    pub synced: bool,
    /// Epoch millis of the last local mutation
    #[serde(default)]
    pub last_updated_timestamp: i64,
}

/// Saving has no storage-level relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl SyncRecord for Model {
    type Entity = Entity;

    fn document_id(&self) -> String {
        self.saving_id.to_string()
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

    const KIND: &'static str = "saving";
    const ID_FIELD: &'static str = "savingId";
    const COLLECTION: Option<Collection> = Some(Collection::Savings);

    fn primary_column() -> Column {
        Column::SavingId
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
