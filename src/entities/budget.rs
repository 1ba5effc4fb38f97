//! Budget entity - The overall monthly spending budget of a user.
//!
//! Logically one budget per user; the store returns the first match.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::syncable::{SyncEntity, SyncRecord};
use crate::remote::Collection;

/// Budget database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Locally assigned key, also the remote document id
    #[sea_orm(primary_key)]
    pub budget_id: i64,
    /// Owner identity
    pub user_id: String,
    /// Amount the user plans to spend per month
    pub monthly_amount: f64,
    /// First month the budget applies to
    pub start_date: Date,
    /// Whether the local row matches what was last written remotely
    #[serde(default, skip_serializing)]
    pub synced: bool,
    /// Epoch millis of the last local mutation
    #[serde(default)]
    pub last_updated_timestamp: i64,
}

/// Budget has no storage-level relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl SyncRecord for Model {
    type Entity = Entity;

    fn document_id(&self) -> String {
        self.budget_id.to_string()
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

    const KIND: &'static str = "budget";
    const ID_FIELD: &'static str = "budgetId";
    const COLLECTION: Option<Collection> = Some(Collection::Budgets);

    fn primary_column() -> Column {
        Column::BudgetId
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
