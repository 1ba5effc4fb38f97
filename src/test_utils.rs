//! Shared test utilities.
//!
//! This module provides common helpers for setting up in-memory stores and
//! building entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::store::LocalStore,
    entities::{budget, expense, expense_category, income, saving, saving_goal, user},
    errors::Result,
    remote::{Collection, MemoryRemoteStore},
};
use chrono::NaiveDate;
use serde_json::{Value, json};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_store() -> Result<LocalStore> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(LocalStore::new(db))
}

/// Shorthand for a calendar date.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A profile for `user_id`, not yet synced.
pub fn sample_user(user_id: &str) -> user::Model {
    user::Model {
        user_id: user_id.to_string(),
        display_name: format!("User {user_id}"),
        email: format!("{user_id}@example.com"),
        currency: "EUR".to_string(),
        photo_url: None,
        synced: false,
        last_updated_timestamp: 1_700_000_000_000,
    }
}

/// An expense with a fixed key.
///
/// # Defaults
/// * `title`: "Groceries run"
/// * `amount`: 42.5
/// * `date`: 2024-03-15
pub fn sample_expense(expense_id: i64, user_id: &str, category_id: i64) -> expense::Model {
    expense::Model {
        expense_id,
        category_id,
        user_id: user_id.to_string(),
        title: "Groceries run".to_string(),
        amount: 42.5,
        date: date(2024, 3, 15),
        synced: false,
        last_updated_timestamp: 1_700_000_000_000,
    }
}

/// An income entry with a fixed key.
pub fn sample_income(income_id: i64, user_id: &str) -> income::Model {
    income::Model {
        income_id,
        user_id: user_id.to_string(),
        title: "Salary".to_string(),
        amount: 3100.0,
        date: date(2024, 3, 1),
        synced: false,
        last_updated_timestamp: 1_700_000_000_000,
    }
}

/// An expense category with a fixed key.
pub fn sample_category(category_id: i64, user_id: &str, name: &str) -> expense_category::Model {
    expense_category::Model {
        category_id,
        user_id: user_id.to_string(),
        name: name.to_string(),
        monthly_limit: 250.0,
        synced: false,
        last_updated_timestamp: 1_700_000_000_000,
    }
}

/// A saving goal with a fixed key.
pub fn sample_saving_goal(saving_goal_id: i64, user_id: &str) -> saving_goal::Model {
    saving_goal::Model {
        saving_goal_id,
        user_id: user_id.to_string(),
        title: "Emergency fund".to_string(),
        target_amount: 5000.0,
        deadline: Some(date(2025, 12, 31)),
        synced: false,
        last_updated_timestamp: 1_700_000_000_000,
    }
}

/// A saving with a fixed key.
pub fn sample_saving(saving_id: i64, user_id: &str, saving_goal_id: i64) -> saving::Model {
    saving::Model {
        saving_id,
        saving_goal_id,
        user_id: user_id.to_string(),
        amount: 200.0,
        date: date(2024, 3, 20),
        note: None,
        synced: false,
        last_updated_timestamp: 1_700_000_000_000,
    }
}

/// A budget with a fixed key.
pub fn sample_budget(budget_id: i64, user_id: &str) -> budget::Model {
    budget::Model {
        budget_id,
        user_id: user_id.to_string(),
        monthly_amount: 2000.0,
        start_date: date(2024, 1, 1),
        synced: false,
        last_updated_timestamp: 1_700_000_000_000,
    }
}

/// Serialises a model the way it is stored remotely.
pub fn to_document<T: serde::Serialize>(model: &T) -> Value {
    serde_json::to_value(model).unwrap()
}

/// A remote store holding a profile for `user_id` and one record in every collection.
pub async fn seeded_remote(user_id: &str) -> MemoryRemoteStore {
    let remote = MemoryRemoteStore::new();
    remote
        .seed_profile(user_id, to_document(&sample_user(user_id)))
        .await;
    remote
        .seed_document(
            user_id,
            Collection::SavingGoals,
            "1",
            to_document(&sample_saving_goal(1, user_id)),
        )
        .await;
    remote
        .seed_document(
            user_id,
            Collection::Savings,
            "1",
            to_document(&sample_saving(1, user_id, 1)),
        )
        .await;
    remote
        .seed_document(
            user_id,
            Collection::IncomeEntries,
            "1",
            to_document(&sample_income(1, user_id)),
        )
        .await;
    remote
        .seed_document(
            user_id,
            Collection::ExpenseCategories,
            "1",
            to_document(&sample_category(1, user_id, "Food")),
        )
        .await;
    remote
        .seed_document(
            user_id,
            Collection::Expenses,
            "1",
            to_document(&sample_expense(1, user_id, 1)),
        )
        .await;
    remote
        .seed_document(
            user_id,
            Collection::Budgets,
            "1",
            to_document(&sample_budget(1, user_id)),
        )
        .await;
    remote
}

/// A document missing a required field.
pub fn malformed_document() -> Value {
    json!({ "title": 17, "amount": "lots" })
}
