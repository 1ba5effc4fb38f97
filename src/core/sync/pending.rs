//! Durable job markers kept in the `sync_state` table.
//!
//! A marker is written when a job is enqueued and removed when it reaches a final
//! state. A marker still present at startup means the previous process died or gave
//! up while the job was retryable; the job is then re-run from the beginning.

use super::JobKind;
use crate::{
    entities::{SyncState, sync_state},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::debug;

const PENDING_PREFIX: &str = "pending_job";

/// Key of the marker for one job kind and user.
#[must_use]
pub fn pending_key(kind: JobKind, user_id: &str) -> String {
    format!("{PENDING_PREFIX}:{kind}:{user_id}")
}

/// Reads a bookkeeping value.
pub async fn get_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    Ok(SyncState::find_by_id(key.to_string())
        .one(db)
        .await?
        .map(|state| state.value))
}

/// Sets or replaces a bookkeeping value.
pub async fn set_value<C>(db: &C, key: &str, value: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();
    let existing = SyncState::find_by_id(key.to_string()).one(db).await?;

    if let Some(state) = existing {
        let mut active_model: sync_state::ActiveModel = state.into();
        active_model.value = Set(value.to_string());
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = sync_state::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Removes a bookkeeping value; removing an absent key is not an error.
pub async fn remove_value<C>(db: &C, key: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    SyncState::delete_by_id(key.to_string()).exec(db).await?;
    Ok(())
}

/// Records that a job of `kind` for `user_id` has been enqueued.
pub async fn mark_pending<C>(db: &C, kind: JobKind, user_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    debug!(%kind, user_id, "Marking job pending");
    set_value(db, &pending_key(kind, user_id), &Utc::now().to_rfc3339()).await
}

/// Clears the marker of a job that reached a final state.
pub async fn clear_pending<C>(db: &C, kind: JobKind, user_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    remove_value(db, &pending_key(kind, user_id)).await
}

/// Job kinds with a marker for `user_id`, pull first.
pub async fn pending_jobs<C>(db: &C, user_id: &str) -> Result<Vec<JobKind>>
where
    C: ConnectionTrait,
{
    let mut pending = Vec::new();
    for kind in [JobKind::Pull, JobKind::Push] {
        if get_value(db, &pending_key(kind, user_id)).await?.is_some() {
            pending.push(kind);
        }
    }
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_store;

    #[tokio::test]
    async fn test_set_and_get_value() -> Result<()> {
        let store = setup_test_store().await?;
        let db = store.connection();

        assert!(get_value(db, "k").await?.is_none());
        set_value(db, "k", "one").await?;
        assert_eq!(get_value(db, "k").await?.as_deref(), Some("one"));
        set_value(db, "k", "two").await?;
        assert_eq!(get_value(db, "k").await?.as_deref(), Some("two"));

        remove_value(db, "k").await?;
        remove_value(db, "k").await?;
        assert!(get_value(db, "k").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_pending_markers_per_user() -> Result<()> {
        let store = setup_test_store().await?;
        let db = store.connection();

        mark_pending(db, JobKind::Push, "u1").await?;
        mark_pending(db, JobKind::Pull, "u1").await?;
        mark_pending(db, JobKind::Push, "u2").await?;

        assert_eq!(
            pending_jobs(db, "u1").await?,
            vec![JobKind::Pull, JobKind::Push]
        );
        clear_pending(db, JobKind::Pull, "u1").await?;
        assert_eq!(pending_jobs(db, "u1").await?, vec![JobKind::Push]);
        assert_eq!(pending_jobs(db, "u3").await?, vec![]);
        Ok(())
    }

    #[test]
    fn test_pending_key_format() {
        assert_eq!(pending_key(JobKind::Push, "u1"), "pending_job:push:u1");
    }
}
