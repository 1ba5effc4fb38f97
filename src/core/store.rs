//! Local store - durable on-device persistence for every synced entity.
//!
//! [`LocalStore`] is constructed once per process around the `SeaORM` connection and
//! passed to whoever needs it. Writes come in two flavours:
//!
//! - [`LocalStore::upsert`] is a local user mutation: the record becomes dirty
//!   (`synced = false`) and its `last_updated_timestamp` is stamped.
//! - [`LocalStore::write_synced`] is the pull path: the record is stored with
//!   `synced = true` and every other field exactly as given.
//!
//! Both replace the whole row by primary key. The push path instead uses
//! [`LocalStore::mark_synced`], which only flips the flag of rows that were not
//! edited since they were read. Reads never fail on absence.

use crate::{
    entities::{
        Budget, Expense, ExpenseCategory, Income, Saving, SavingGoal, SyncEntity, SyncRecord,
        User, budget, expense, expense_category, income, saving, saving_goal, user,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, IdenStatic, IntoActiveModel, Iterable,
    QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, instrument};

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Current time in epoch milliseconds, the unit of `last_updated_timestamp`.
///
/// Strictly increasing within the process, so two edits of the same row never
/// share a timestamp.
#[must_use]
pub fn now_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let next = |last: i64| now.max(last + 1);
    LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(next(last)))
        .map_or(now, next)
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

fn validate_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

/// Insert-or-replace by primary key on any connection or transaction.
async fn write_row<M, C>(db: &C, model: &M) -> Result<()>
where
    M: SyncRecord + IntoActiveModel<<M::Entity as SyncEntity>::Active>,
    C: ConnectionTrait,
{
    let primary = <M::Entity as SyncEntity>::primary_column();
    let update_columns: Vec<_> = <M::Entity as EntityTrait>::Column::iter()
        .filter(|column| column.as_str() != primary.as_str())
        .collect();
    let on_conflict = OnConflict::column(primary)
        .update_columns(update_columns)
        .to_owned();

    let active = <M::Entity as SyncEntity>::Active::from(model.clone()).reset_all();
    <M::Entity as EntityTrait>::insert(active)
        .on_conflict(on_conflict)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Handle to the on-device relational store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    db: DatabaseConnection,
}

impl LocalStore {
    /// Wraps an already-initialised connection (see
    /// [`create_connection`](crate::config::database::create_connection)).
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Stores a locally created or edited record.
    ///
    /// The stored copy always has `synced = false` and a fresh timestamp, which is
    /// what makes the push job pick it up.
    #[instrument(skip(self, model), fields(kind = <M::Entity as SyncEntity>::KIND))]
    pub async fn upsert<M>(&self, mut model: M) -> Result<M>
    where
        M: SyncRecord + IntoActiveModel<<M::Entity as SyncEntity>::Active>,
    {
        model.set_synced(false);
        model.touch(now_millis());
        write_row(&self.db, &model).await?;
        debug!(id = %model.document_id(), "Stored local change");
        Ok(model)
    }

    /// Stores records that came from, or were just acknowledged by, the remote store.
    ///
    /// Each record is written with `synced = true`; no other field changes. All rows
    /// go in one local transaction.
    #[instrument(skip(self, models), fields(kind = <M::Entity as SyncEntity>::KIND, count = models.len()))]
    pub async fn write_synced<M>(&self, models: Vec<M>) -> Result<Vec<M>>
    where
        M: SyncRecord + IntoActiveModel<<M::Entity as SyncEntity>::Active>,
    {
        if models.is_empty() {
            return Ok(models);
        }

        let flipped = models.iter().filter(|m| !m.is_synced()).count();
        let models: Vec<M> = models.into_iter().map(|m| m.with_synced(true)).collect();
        let txn = self.db.begin().await?;
        for model in &models {
            write_row(&txn, model).await?;
        }
        txn.commit().await?;
        debug!(flipped, "Stored synced records");
        Ok(models)
    }

    /// Flips `synced = true` on each row that still carries the snapshot's
    /// `last_updated_timestamp`; no other column changes.
    ///
    /// A row edited after the snapshot was read has a newer timestamp, so it stays
    /// dirty for the next push. Returns the number of rows flipped.
    #[instrument(skip(self, snapshot), fields(kind = E::KIND, count = snapshot.len()))]
    pub async fn mark_synced<E: SyncEntity>(&self, snapshot: &[E::Model]) -> Result<u64> {
        if snapshot.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        let mut flipped = 0;
        for model in snapshot {
            let result = E::update_many()
                .col_expr(E::synced_column(), Expr::value(true))
                .filter(E::primary_column().eq(model.get(E::primary_column())))
                .filter(E::timestamp_column().eq(model.last_updated()))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                debug!(id = %model.document_id(), "Row changed during push, left dirty");
            }
            flipped += result.rows_affected;
        }
        txn.commit().await?;
        Ok(flipped)
    }

    /// The stored row with the same primary key as `model`, if any.
    pub async fn stored_copy<E: SyncEntity>(&self, model: &E::Model) -> Result<Option<E::Model>> {
        self.get_by_id::<E>(model.get(E::primary_column())).await
    }

    /// Removes a record by primary key. Removing an absent record is not an error.
    pub async fn delete<M: SyncRecord>(&self, model: &M) -> Result<()> {
        let active = <M::Entity as SyncEntity>::Active::from(model.clone());
        let result = <M::Entity as EntityTrait>::delete(active)
            .exec(&self.db)
            .await?;
        debug!(
            kind = <M::Entity as SyncEntity>::KIND,
            id = %model.document_id(),
            rows = result.rows_affected,
            "Deleted local record"
        );
        Ok(())
    }

    /// Point lookup by primary key.
    pub async fn get_by_id<E: SyncEntity>(
        &self,
        id: impl Into<sea_orm::Value> + Send,
    ) -> Result<Option<E::Model>> {
        E::find()
            .filter(E::primary_column().eq(id))
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Every record owned by `user_id`, ordered by primary key.
    pub async fn get_by_owner<E: SyncEntity>(&self, user_id: &str) -> Result<Vec<E::Model>> {
        E::find()
            .filter(E::owner_column().eq(user_id))
            .order_by_asc(E::primary_column())
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Records owned by `user_id` that have changes not yet written remotely.
    pub async fn get_unsynced<E: SyncEntity>(&self, user_id: &str) -> Result<Vec<E::Model>> {
        E::find()
            .filter(E::owner_column().eq(user_id))
            .filter(E::synced_column().eq(false))
            .order_by_asc(E::primary_column())
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Every unsynced user profile on the device, regardless of owner.
    pub async fn get_unsynced_profiles(&self) -> Result<Vec<user::Model>> {
        User::find()
            .filter(user::Column::Synced.eq(false))
            .order_by_asc(user::Column::UserId)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// The local profile for `user_id`, if one was pulled or created.
    pub async fn profile(&self, user_id: &str) -> Result<Option<user::Model>> {
        self.get_by_id::<User>(user_id).await
    }

    /// The user's budget. Only one is expected; the oldest wins if there are several.
    pub async fn budget_for_user(&self, user_id: &str) -> Result<Option<budget::Model>> {
        Budget::find()
            .filter(budget::Column::UserId.eq(user_id))
            .order_by_asc(budget::Column::BudgetId)
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Finds a category by its exact name for one user.
    pub async fn category_by_name(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<Option<expense_category::Model>> {
        ExpenseCategory::find()
            .filter(expense_category::Column::UserId.eq(user_id))
            .filter(expense_category::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Finds a saving goal by its exact title for one user.
    pub async fn saving_goal_by_title(
        &self,
        user_id: &str,
        title: &str,
    ) -> Result<Option<saving_goal::Model>> {
        SavingGoal::find()
            .filter(saving_goal::Column::UserId.eq(user_id))
            .filter(saving_goal::Column::Title.eq(title))
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Expenses filed under one category, newest first.
    pub async fn expenses_for_category(&self, category_id: i64) -> Result<Vec<expense::Model>> {
        Expense::find()
            .filter(expense::Column::CategoryId.eq(category_id))
            .order_by_desc(expense::Column::Date)
            .order_by_desc(expense::Column::ExpenseId)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Deposits made towards one saving goal, newest first.
    pub async fn savings_for_goal(&self, saving_goal_id: i64) -> Result<Vec<saving::Model>> {
        Saving::find()
            .filter(saving::Column::SavingGoalId.eq(saving_goal_id))
            .order_by_desc(saving::Column::Date)
            .order_by_desc(saving::Column::SavingId)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// A user's expenses dated within `from..=to`, oldest first.
    pub async fn expenses_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<expense::Model>> {
        Expense::find()
            .filter(expense::Column::UserId.eq(user_id))
            .filter(expense::Column::Date.between(from, to))
            .order_by_asc(expense::Column::Date)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// A user's income entries dated within `from..=to`, oldest first.
    pub async fn incomes_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<income::Model>> {
        Income::find()
            .filter(income::Column::UserId.eq(user_id))
            .filter(income::Column::Date.between(from, to))
            .order_by_asc(income::Column::Date)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// A user's savings dated within `from..=to`, oldest first.
    pub async fn savings_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<saving::Model>> {
        Saving::find()
            .filter(saving::Column::UserId.eq(user_id))
            .filter(saving::Column::Date.between(from, to))
            .order_by_asc(saving::Column::Date)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Creates a monthly budget. The key is assigned by the database.
    pub async fn create_budget(
        &self,
        user_id: &str,
        monthly_amount: f64,
        start_date: NaiveDate,
    ) -> Result<budget::Model> {
        validate_amount(monthly_amount)?;

        let model = budget::ActiveModel {
            user_id: Set(user_id.to_string()),
            monthly_amount: Set(monthly_amount),
            start_date: Set(start_date),
            synced: Set(false),
            last_updated_timestamp: Set(now_millis()),
            ..Default::default()
        };
        model.insert(&self.db).await.map_err(Into::into)
    }

    /// Creates a saving goal.
    pub async fn create_saving_goal(
        &self,
        user_id: &str,
        title: &str,
        target_amount: f64,
        deadline: Option<NaiveDate>,
    ) -> Result<saving_goal::Model> {
        let title = validate_text("Saving goal title", title)?;
        validate_amount(target_amount)?;

        let model = saving_goal::ActiveModel {
            user_id: Set(user_id.to_string()),
            title: Set(title),
            target_amount: Set(target_amount),
            deadline: Set(deadline),
            synced: Set(false),
            last_updated_timestamp: Set(now_millis()),
            ..Default::default()
        };
        model.insert(&self.db).await.map_err(Into::into)
    }

    /// Records a deposit towards a saving goal.
    pub async fn create_saving(
        &self,
        user_id: &str,
        saving_goal_id: i64,
        amount: f64,
        date: NaiveDate,
        note: Option<String>,
    ) -> Result<saving::Model> {
        validate_amount(amount)?;

        let model = saving::ActiveModel {
            saving_goal_id: Set(saving_goal_id),
            user_id: Set(user_id.to_string()),
            amount: Set(amount),
            date: Set(date),
            note: Set(note),
            synced: Set(false),
            last_updated_timestamp: Set(now_millis()),
            ..Default::default()
        };
        model.insert(&self.db).await.map_err(Into::into)
    }

    /// Records an income entry.
    pub async fn create_income(
        &self,
        user_id: &str,
        title: &str,
        amount: f64,
        date: NaiveDate,
    ) -> Result<income::Model> {
        let title = validate_text("Income title", title)?;
        validate_amount(amount)?;

        let model = income::ActiveModel {
            user_id: Set(user_id.to_string()),
            title: Set(title),
            amount: Set(amount),
            date: Set(date),
            synced: Set(false),
            last_updated_timestamp: Set(now_millis()),
            ..Default::default()
        };
        model.insert(&self.db).await.map_err(Into::into)
    }

    /// Creates an expense category with a monthly limit.
    pub async fn create_expense_category(
        &self,
        user_id: &str,
        name: &str,
        monthly_limit: f64,
    ) -> Result<expense_category::Model> {
        let name = validate_text("Category name", name)?;
        validate_amount(monthly_limit)?;

        let model = expense_category::ActiveModel {
            user_id: Set(user_id.to_string()),
            name: Set(name),
            monthly_limit: Set(monthly_limit),
            synced: Set(false),
            last_updated_timestamp: Set(now_millis()),
            ..Default::default()
        };
        model.insert(&self.db).await.map_err(Into::into)
    }

    /// Records an expense under a category.
    pub async fn create_expense(
        &self,
        user_id: &str,
        category_id: i64,
        title: &str,
        amount: f64,
        date: NaiveDate,
    ) -> Result<expense::Model> {
        let title = validate_text("Expense title", title)?;
        validate_amount(amount)?;

        let model = expense::ActiveModel {
            category_id: Set(category_id),
            user_id: Set(user_id.to_string()),
            title: Set(title),
            amount: Set(amount),
            date: Set(date),
            synced: Set(false),
            last_updated_timestamp: Set(now_millis()),
            ..Default::default()
        };
        model.insert(&self.db).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_starts_unsynced() -> Result<()> {
        let store = setup_test_store().await?;
        let category = store.create_expense_category("u1", "Groceries", 400.0).await?;

        assert!(category.category_id > 0);
        assert!(!category.synced);
        assert!(category.last_updated_timestamp > 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_validation() -> Result<()> {
        let store = setup_test_store().await?;

        let result = store.create_expense_category("u1", "   ", 100.0).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let result = store.create_income("u1", "Salary", 0.0, date(2024, 5, 1)).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 0.0 })));

        let result = store
            .create_expense("u1", 1, "Coffee", f64::NAN, date(2024, 5, 1))
            .await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: _ })));
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_marks_dirty() -> Result<()> {
        let store = setup_test_store().await?;
        let category = store.create_expense_category("u1", "Rent", 1200.0).await?;
        let synced = store.write_synced(vec![category]).await?.remove(0);
        assert!(synced.synced);

        let mut edited = synced.clone();
        edited.monthly_limit = 1300.0;
        let stored = store.upsert(edited).await?;
        assert!(!stored.synced);

        let reread = store
            .get_by_id::<ExpenseCategory>(stored.category_id)
            .await?
            .unwrap();
        assert!(!reread.synced);
        assert_eq!(reread.monthly_limit, 1300.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_primary_key() -> Result<()> {
        let store = setup_test_store().await?;
        let expense = sample_expense(42, "u1", 7);
        store.upsert(expense.clone()).await?;
        store
            .upsert(expense::Model {
                title: "Changed".to_string(),
                ..expense
            })
            .await?;

        let all = store.get_by_owner::<Expense>("u1").await?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].expense_id, 42);
        assert_eq!(all[0].title, "Changed");
        Ok(())
    }

    #[tokio::test]
    async fn test_write_synced_keeps_other_fields() -> Result<()> {
        let store = setup_test_store().await?;
        let mut income = sample_income(3, "u1");
        income.last_updated_timestamp = 1_700_000_000_000;

        store.write_synced(vec![income.clone()]).await?;
        let stored = store.get_by_id::<Income>(3).await?.unwrap();

        assert!(stored.synced);
        assert_eq!(stored, income.with_synced(true));
        Ok(())
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let first = now_millis();
        let second = now_millis();
        let third = now_millis();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn test_mark_synced_flips_only_the_flag() -> Result<()> {
        let store = setup_test_store().await?;
        let snapshot = vec![store.upsert(sample_income(1, "u1")).await?];

        assert_eq!(store.mark_synced::<Income>(&snapshot).await?, 1);
        let stored = store.get_by_id::<Income>(1).await?.unwrap();
        assert_eq!(stored, snapshot[0].clone().with_synced(true));
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_synced_skips_rows_edited_after_snapshot() -> Result<()> {
        let store = setup_test_store().await?;
        let snapshot = vec![store.upsert(sample_expense(5, "u1", 1)).await?];
        store
            .upsert(expense::Model {
                title: "Edited".to_string(),
                ..snapshot[0].clone()
            })
            .await?;

        assert_eq!(store.mark_synced::<Expense>(&snapshot).await?, 0);
        let stored = store.get_by_id::<Expense>(5).await?.unwrap();
        assert_eq!(stored.title, "Edited");
        assert!(!stored.synced);
        Ok(())
    }

    #[tokio::test]
    async fn test_stored_copy_matches_by_key() -> Result<()> {
        let store = setup_test_store().await?;
        store.upsert(sample_expense(5, "u1", 1)).await?;

        let found = store
            .stored_copy::<Expense>(&sample_expense(5, "u2", 3))
            .await?
            .unwrap();
        assert_eq!(found.user_id, "u1");
        assert!(
            store
                .stored_copy::<Expense>(&sample_expense(6, "u1", 1))
                .await?
                .is_none()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_get_unsynced_filters_owner_and_flag() -> Result<()> {
        let store = setup_test_store().await?;
        store.upsert(sample_expense(1, "u1", 1)).await?;
        store.upsert(sample_expense(2, "u2", 1)).await?;
        store.write_synced(vec![sample_expense(3, "u1", 1)]).await?;

        let unsynced = store.get_unsynced::<Expense>("u1").await?;
        let ids: Vec<i64> = unsynced.iter().map(|e| e.expense_id).collect();
        assert_eq!(ids, vec![1]);

        let none = store.get_unsynced::<Expense>("nobody").await?;
        assert!(none.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unsynced_profiles_are_global() -> Result<()> {
        let store = setup_test_store().await?;
        store.upsert(sample_user("u1")).await?;
        store.upsert(sample_user("u2")).await?;
        store.write_synced(vec![sample_user("u3")]).await?;

        let profiles = store.get_unsynced_profiles().await?;
        let ids: Vec<&str> = profiles.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() -> Result<()> {
        let store = setup_test_store().await?;
        let goal = store
            .create_saving_goal("u1", "Vacation", 2000.0, None)
            .await?;

        store.delete(&goal).await?;
        store.delete(&goal).await?;

        assert!(
            store
                .get_by_id::<SavingGoal>(goal.saving_goal_id)
                .await?
                .is_none()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_point_lookups_return_none_when_missing() -> Result<()> {
        let store = setup_test_store().await?;
        assert!(store.get_by_id::<Budget>(99).await?.is_none());
        assert!(store.profile("ghost").await?.is_none());
        assert!(store.category_by_name("u1", "Nope").await?.is_none());
        assert!(store.saving_goal_by_title("u1", "Nope").await?.is_none());
        assert!(store.budget_for_user("u1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_named_lookups() -> Result<()> {
        let store = setup_test_store().await?;
        let category = store.create_expense_category("u1", "Transport", 150.0).await?;
        store.create_expense_category("u2", "Transport", 90.0).await?;
        let goal = store
            .create_saving_goal("u1", "New bike", 800.0, Some(date(2025, 6, 1)))
            .await?;

        let found = store.category_by_name("u1", "Transport").await?.unwrap();
        assert_eq!(found.category_id, category.category_id);
        let found_goal = store.saving_goal_by_title("u1", "New bike").await?.unwrap();
        assert_eq!(found_goal.saving_goal_id, goal.saving_goal_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_relation_and_date_range_queries() -> Result<()> {
        let store = setup_test_store().await?;
        let food = store.create_expense_category("u1", "Food", 300.0).await?;
        let fun = store.create_expense_category("u1", "Fun", 100.0).await?;

        store
            .create_expense("u1", food.category_id, "Market", 40.0, date(2024, 3, 2))
            .await?;
        store
            .create_expense("u1", food.category_id, "Bakery", 8.0, date(2024, 3, 31))
            .await?;
        store
            .create_expense("u1", fun.category_id, "Cinema", 12.0, date(2024, 4, 1))
            .await?;

        let food_expenses = store.expenses_for_category(food.category_id).await?;
        assert_eq!(food_expenses.len(), 2);
        assert_eq!(food_expenses[0].title, "Bakery");

        let march = store
            .expenses_between("u1", date(2024, 3, 1), date(2024, 3, 31))
            .await?;
        let titles: Vec<&str> = march.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Market", "Bakery"]);

        store.create_income("u1", "Salary", 2500.0, date(2024, 3, 25)).await?;
        let incomes = store
            .incomes_between("u1", date(2024, 3, 1), date(2024, 3, 31))
            .await?;
        assert_eq!(incomes.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_savings_for_goal() -> Result<()> {
        let store = setup_test_store().await?;
        let goal = store.create_saving_goal("u1", "Laptop", 1500.0, None).await?;
        store
            .create_saving("u1", goal.saving_goal_id, 100.0, date(2024, 1, 5), None)
            .await?;
        store
            .create_saving(
                "u1",
                goal.saving_goal_id,
                50.0,
                date(2024, 2, 5),
                Some("bonus".to_string()),
            )
            .await?;

        let savings = store.savings_for_goal(goal.saving_goal_id).await?;
        assert_eq!(savings.len(), 2);
        assert_eq!(savings[0].note.as_deref(), Some("bonus"));
        Ok(())
    }

    #[tokio::test]
    async fn test_budget_for_user_returns_first() -> Result<()> {
        let store = setup_test_store().await?;
        let first = store.create_budget("u1", 2000.0, date(2024, 1, 1)).await?;
        store.create_budget("u1", 2500.0, date(2024, 6, 1)).await?;

        let budget = store.budget_for_user("u1").await?.unwrap();
        assert_eq!(budget.budget_id, first.budget_id);
        Ok(())
    }
}
