//! Push sync - writes every unsynced local record to the remote store.
//!
//! Collections are pushed one at a time in a fixed order, then the profile. A
//! collection's records are flipped to `synced = true` only after its batch was
//! committed remotely, so a failed batch leaves that collection untouched and a
//! re-run resubmits exactly the records that are still dirty. The flip only
//! touches the flag, and skips rows edited while the batch was in flight.

use super::JobOutcome;
use crate::{
    core::store::LocalStore,
    entities::{
        Budget, Expense, ExpenseCategory, Income, Saving, SavingGoal, SyncEntity, SyncRecord,
        User,
    },
    errors::{Error, Result},
    remote::{Collection, RemoteStore},
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

/// Summary of a push run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    /// Identity that was pushed
    pub user_id: String,
    /// Documents written per collection; collections with nothing dirty are absent
    pub written: BTreeMap<Collection, usize>,
    /// Profiles written to the profile path
    pub profiles_written: usize,
}

impl PushReport {
    /// Documents written across collections and profiles.
    #[must_use]
    pub fn total_written(&self) -> usize {
        self.written.values().sum::<usize>() + self.profiles_written
    }
}

/// Pushes the dirty records of one collection and flips them after the commit.
async fn push_collection<E: SyncEntity>(
    store: &LocalStore,
    remote: &dyn RemoteStore,
    user_id: &str,
) -> Result<Option<(Collection, usize)>> {
    let Some(collection) = E::COLLECTION else {
        return Err(Error::Validation {
            message: format!("{} is not stored in a sub-collection", E::KIND),
        });
    };

    let dirty = store.get_unsynced::<E>(user_id).await?;
    if dirty.is_empty() {
        return Ok(None);
    }

    let batch = dirty
        .iter()
        .map(|model| -> Result<(String, Value)> {
            Ok((model.document_id(), serde_json::to_value(model)?))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;
    remote.batch_write(user_id, collection, batch).await?;

    let written = dirty.len();
    let flipped = store.mark_synced::<E>(&dirty).await?;
    debug!(collection = %collection, written, flipped, "Pushed collection");
    Ok(Some((collection, written)))
}

async fn push(store: &LocalStore, remote: &dyn RemoteStore, user_id: &str) -> Result<PushReport> {
    let mut report = PushReport {
        user_id: user_id.to_string(),
        written: BTreeMap::new(),
        profiles_written: 0,
    };

    let steps = [
        push_collection::<SavingGoal>(store, remote, user_id).await?,
        push_collection::<Saving>(store, remote, user_id).await?,
        push_collection::<Income>(store, remote, user_id).await?,
        push_collection::<ExpenseCategory>(store, remote, user_id).await?,
        push_collection::<Expense>(store, remote, user_id).await?,
        push_collection::<Budget>(store, remote, user_id).await?,
    ];
    report.written.extend(steps.into_iter().flatten());

    // Profiles are written one by one, each under its own identity.
    for profile in store.get_unsynced_profiles().await? {
        remote
            .write_profile(profile.owner_id(), serde_json::to_value(&profile)?)
            .await?;
        store
            .mark_synced::<User>(std::slice::from_ref(&profile))
            .await?;
        report.profiles_written += 1;
    }

    Ok(report)
}

/// Pushes every unsynced record of `user_id`, then any unsynced profile.
///
/// # Returns
/// * `Succeeded` - everything dirty was written and flipped (possibly nothing)
/// * `Retry` - any failure; collections finished earlier in the run stay flipped
#[instrument(skip(store, remote))]
pub async fn run_push_sync(
    store: &LocalStore,
    remote: &dyn RemoteStore,
    user_id: &str,
) -> JobOutcome<PushReport> {
    match push(store, remote, user_id).await {
        Ok(report) => {
            info!(written = report.total_written(), "Push sync finished");
            JobOutcome::Succeeded(report)
        }
        Err(e) => {
            error!("Push sync failed: {}", e);
            JobOutcome::Retry {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::remote::{CommitRecord, MemoryRemoteStore, RawDocument};
    use crate::test_utils::*;
    use async_trait::async_trait;
    use serde_json::json;

    #[tokio::test]
    async fn test_push_single_expense() -> Result<()> {
        let store = setup_test_store().await?;
        let remote = MemoryRemoteStore::new();
        let before = store.upsert(sample_expense(5, "u1", 2)).await?;
        assert!(!before.synced);

        let outcome = run_push_sync(&store, &remote, "u1").await;
        let report = outcome.report().unwrap();
        assert_eq!(report.written.get(&Collection::Expenses), Some(&1));
        assert_eq!(report.total_written(), 1);

        assert_eq!(
            remote.commits().await,
            vec![CommitRecord {
                path: "users/u1/expenses".to_string(),
                document_ids: vec!["5".to_string()],
            }]
        );
        let stored = remote.document("users/u1/expenses/5").await.unwrap();
        assert_eq!(stored["expenseId"], json!(5));
        assert!(stored.get("synced").is_none());

        let after = store.get_by_id::<Expense>(5).await?.unwrap();
        assert_eq!(after, before.with_synced(true));
        Ok(())
    }

    #[tokio::test]
    async fn test_second_push_writes_nothing() -> Result<()> {
        let store = setup_test_store().await?;
        let remote = MemoryRemoteStore::new();
        store.upsert(sample_user("u1")).await?;
        store.upsert(sample_income(1, "u1")).await?;
        store.upsert(sample_category(1, "u1", "Food")).await?;

        assert!(run_push_sync(&store, &remote, "u1").await.is_success());
        let commits = remote.commits().await.len();
        assert_eq!(commits, 3);

        let outcome = run_push_sync(&store, &remote, "u1").await;
        assert_eq!(outcome.report().unwrap().total_written(), 0);
        assert_eq!(remote.commits().await.len(), commits);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_collection_is_not_flipped() -> Result<()> {
        let store = setup_test_store().await?;
        let remote = MemoryRemoteStore::new();
        store.upsert(sample_income(1, "u1")).await?;
        store.upsert(sample_category(1, "u1", "Food")).await?;
        store.upsert(sample_expense(1, "u1", 1)).await?;
        remote.fail_writes_to(Collection::ExpenseCategories).await;

        let outcome = run_push_sync(&store, &remote, "u1").await;
        assert!(outcome.is_retryable());

        assert!(store.get_unsynced::<Income>("u1").await?.is_empty());
        assert_eq!(store.get_unsynced::<ExpenseCategory>("u1").await?.len(), 1);
        assert_eq!(store.get_unsynced::<Expense>("u1").await?.len(), 1);
        assert!(
            remote
                .document("users/u1/expense_categories/1")
                .await
                .is_none()
        );

        remote.clear_failures().await;
        let outcome = run_push_sync(&store, &remote, "u1").await;
        let report = outcome.report().unwrap();
        assert_eq!(report.written.get(&Collection::IncomeEntries), None);
        assert_eq!(report.written.get(&Collection::ExpenseCategories), Some(&1));
        assert_eq!(report.written.get(&Collection::Expenses), Some(&1));
        Ok(())
    }

    #[tokio::test]
    async fn test_profile_is_written_to_profile_path() -> Result<()> {
        let store = setup_test_store().await?;
        let remote = MemoryRemoteStore::new();
        store.upsert(sample_user("u1")).await?;

        let outcome = run_push_sync(&store, &remote, "u1").await;
        assert_eq!(outcome.report().unwrap().profiles_written, 1);

        let profile = remote.document("users_profile/u1").await.unwrap();
        assert_eq!(profile["email"], json!("u1@example.com"));
        assert!(store.profile("u1").await?.unwrap().synced);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_profile_write_stays_dirty() -> Result<()> {
        let store = setup_test_store().await?;
        let remote = MemoryRemoteStore::new();
        store.upsert(sample_user("u1")).await?;
        store.upsert(sample_budget(1, "u1")).await?;
        remote.fail_profile_writes().await;

        assert!(run_push_sync(&store, &remote, "u1").await.is_retryable());
        assert!(store.get_unsynced::<Budget>("u1").await?.is_empty());
        assert_eq!(store.get_unsynced_profiles().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_dirty_then_clean() -> Result<()> {
        let store = setup_test_store().await?;
        let remote = MemoryRemoteStore::new();
        let goal = store
            .create_saving_goal("u1", "Vacation", 1800.0, Some(date(2025, 7, 1)))
            .await?;
        let saving = store
            .create_saving("u1", goal.saving_goal_id, 150.0, date(2024, 5, 2), None)
            .await?;
        assert!(!goal.synced && !saving.synced);

        assert!(run_push_sync(&store, &remote, "u1").await.is_success());

        let pushed_goal = store
            .get_by_id::<SavingGoal>(goal.saving_goal_id)
            .await?
            .unwrap();
        assert_eq!(pushed_goal, goal.clone().with_synced(true));
        let pushed_saving = store.get_by_id::<Saving>(saving.saving_id).await?.unwrap();
        assert_eq!(pushed_saving, saving.clone().with_synced(true));

        let remote_goal = remote
            .document(&format!("users/u1/saving_goals/{}", goal.saving_goal_id))
            .await
            .unwrap();
        assert_eq!(remote_goal, to_document(&goal));
        Ok(())
    }

    /// Stores a local edit of expense 5 while the batch commit is in flight.
    struct EditDuringCommit {
        inner: MemoryRemoteStore,
        store: LocalStore,
    }

    #[async_trait]
    impl RemoteStore for EditDuringCommit {
        async fn fetch_collection(
            &self,
            user_id: &str,
            collection: Collection,
        ) -> Result<Vec<RawDocument>> {
            self.inner.fetch_collection(user_id, collection).await
        }

        async fn fetch_profile(&self, user_id: &str) -> Result<Option<RawDocument>> {
            self.inner.fetch_profile(user_id).await
        }

        async fn batch_write(
            &self,
            user_id: &str,
            collection: Collection,
            documents: BTreeMap<String, Value>,
        ) -> Result<()> {
            self.inner.batch_write(user_id, collection, documents).await?;
            if collection == Collection::Expenses {
                let mut edited = self.store.get_by_id::<Expense>(5).await?.unwrap();
                edited.title = "Edited while pushing".to_string();
                self.store.upsert(edited).await?;
            }
            Ok(())
        }

        async fn write_profile(&self, user_id: &str, profile: Value) -> Result<()> {
            self.inner.write_profile(user_id, profile).await
        }
    }

    #[tokio::test]
    async fn test_edit_during_push_stays_dirty() -> Result<()> {
        let store = setup_test_store().await?;
        store.upsert(sample_expense(5, "u1", 2)).await?;
        let remote = EditDuringCommit {
            inner: MemoryRemoteStore::new(),
            store: store.clone(),
        };

        assert!(run_push_sync(&store, &remote, "u1").await.is_success());
        let local = store.get_by_id::<Expense>(5).await?.unwrap();
        assert_eq!(local.title, "Edited while pushing");
        assert!(!local.synced);
        let pushed = remote.inner.document("users/u1/expenses/5").await.unwrap();
        assert_eq!(pushed["title"], json!("Groceries run"));

        // The next run sends the edit
        assert!(run_push_sync(&store, &remote, "u1").await.is_success());
        let pushed = remote.inner.document("users/u1/expenses/5").await.unwrap();
        assert_eq!(pushed["title"], json!("Edited while pushing"));
        Ok(())
    }

    #[tokio::test]
    async fn test_other_users_records_are_not_pushed() -> Result<()> {
        let store = setup_test_store().await?;
        let remote = MemoryRemoteStore::new();
        store.upsert(sample_expense(1, "u2", 1)).await?;

        let outcome = run_push_sync(&store, &remote, "u1").await;
        assert_eq!(outcome.report().unwrap().total_written(), 0);
        assert_eq!(store.get_unsynced::<Expense>("u2").await?.len(), 1);
        Ok(())
    }
}
