//! The capability every synced entity shares: a synced flag, an owner, and a stable
//! document id. Sync jobs are generic over these traits instead of branching on the
//! concrete entity type.

use sea_orm::{ActiveModelBehavior, ActiveModelTrait, EntityTrait};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

use crate::remote::Collection;

/// Model-level projections used by the local store and the sync jobs.
pub trait SyncRecord: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Table this record is stored in
    type Entity: SyncEntity<Model = Self>;

    /// Remote document id: the stringified primary key.
    fn document_id(&self) -> String;

    /// Identity that owns this record.
    fn owner_id(&self) -> &str;

    /// Whether the local row matches what was last written remotely.
    fn is_synced(&self) -> bool;

    /// Sets the synced flag without touching any other field.
    fn set_synced(&mut self, synced: bool);

    /// Records a local mutation time (epoch millis).
    fn touch(&mut self, now_millis: i64);

    /// Time of the last local mutation (epoch millis).
    fn last_updated(&self) -> i64;

    /// Returns the record with the synced flag set.
    #[must_use]
    fn with_synced(mut self, synced: bool) -> Self {
        self.set_synced(synced);
        self
    }
}

/// Entity-level description of a synced table.
pub trait SyncEntity: EntityTrait<Model: SyncRecord> {
    /// Active model used for writes
    type Active: ActiveModelTrait<Entity = Self> + ActiveModelBehavior + From<Self::Model> + Send;

    /// Short name used in logs and reports
    const KIND: &'static str;

    /// JSON field holding the primary key in the remote payload
    const ID_FIELD: &'static str;

    /// Remote sub-collection, `None` for the user profile
    const COLLECTION: Option<Collection> = None;

    /// JSON field holding the owner identity in the remote payload
    const OWNER_FIELD: &'static str = "userId";

    /// Primary key column
    fn primary_column() -> Self::Column;

    /// Column holding the owner identity
    fn owner_column() -> Self::Column;

    /// Column holding the synced flag
    fn synced_column() -> Self::Column;

    /// Column holding the last local mutation time
    fn timestamp_column() -> Self::Column;
}
