//! Expense entity - Money spent, filed under one expense category.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::syncable::{SyncEntity, SyncRecord};
use crate::remote::Collection;

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Locally assigned key, also the remote document id
    #[sea_orm(primary_key)]
    pub expense_id: i64,
    /// Category this expense counts against
    pub category_id: i64,
    /// Owner identity
    pub user_id: String,
    /// Short description (e.g., "Weekly groceries")
    pub title: String,
    /// Amount spent, always positive
    pub amount: f64,
    /// Day of the purchase
    pub date: Date,
    /// Whether the local row matches what was last written remotely
    #[serde(default, skip_serializing)]
    pub synced: bool,
    /// Epoch millis of the last local mutation
    #[serde(default)]
    pub last_updated_timestamp: i64,
}

/// Expense has no storage-level relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl SyncRecord for Model {
    type Entity = Entity;

    fn document_id(&self) -> String {
        self.expense_id.to_string()
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

    const KIND: &'static str = "expense";
    const ID_FIELD: &'static str = "expenseId";
    const COLLECTION: Option<Collection> = Some(Collection::Expenses);

    fn primary_column() -> Column {
        Column::ExpenseId
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
