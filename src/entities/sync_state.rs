//! Sync state entity - Key-value bookkeeping for the sync subsystem.
//!
//! Used for durable job markers (`pending_job:{kind}:{user}`) so an interrupted
//! job can be re-run from the beginning after a process restart.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sync state database model - stores key-value pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_state")]
pub struct Model {
    /// Bookkeeping key (e.g., `"pending_job:push:u1"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Value stored as string
    pub value: String,
    /// When this entry was last modified
    pub updated_at: DateTime,
}

/// `SyncState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
