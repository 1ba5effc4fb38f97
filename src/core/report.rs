//! Budget reporting over the local store.
//!
//! These reads are what the UI shows next to the sync indicator: category usage
//! for a month, the month's cash flow against the budget, and saving goal progress.
//! They only read local data, so they work offline and include unsynced records.

use crate::{
    core::store::LocalStore,
    entities::{ExpenseCategory, SavingGoal, expense_category, saving_goal},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};

/// Spending against one category's monthly limit.
#[derive(Debug, Clone)]
pub struct CategoryProgress {
    /// The category being reported on
    pub category: expense_category::Model,
    /// Monthly limit
    pub limit: f64,
    /// Amount spent in the month
    pub spent: f64,
    /// Limit minus spent, negative when overspent
    pub remaining: f64,
    /// Spent as a percentage of the limit
    pub percent_used: f64,
}

/// Cash flow for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    /// First day of the month
    pub month_start: NaiveDate,
    /// Sum of income entries
    pub income_total: f64,
    /// Sum of expenses
    pub expense_total: f64,
    /// Sum of savings deposits
    pub savings_total: f64,
    /// Income minus expenses minus savings
    pub net: f64,
    /// The user's monthly budget, if one exists
    pub budget_amount: Option<f64>,
    /// Budget minus expenses, if a budget exists
    pub budget_remaining: Option<f64>,
}

/// Deposits made towards one saving goal.
#[derive(Debug, Clone)]
pub struct GoalProgress {
    /// The goal being reported on
    pub goal: saving_goal::Model,
    /// Sum of all deposits
    pub saved: f64,
    /// Saved as a percentage of the target
    pub percent_complete: f64,
    /// Whether the target has been reached
    pub completed: bool,
}

/// First and last day of a calendar month.
fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || Error::Validation {
        message: format!("{year}-{month:02} is not a valid month"),
    };
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let end = next.pred_opt().ok_or_else(invalid)?;
    Ok((start, end))
}

/// Per-category usage for `year`-`month`, in category key order.
pub async fn category_progress(
    store: &LocalStore,
    user_id: &str,
    year: i32,
    month: u32,
) -> Result<Vec<CategoryProgress>> {
    let (start, end) = month_bounds(year, month)?;
    let expenses = store.expenses_between(user_id, start, end).await?;

    let categories = store.get_by_owner::<ExpenseCategory>(user_id).await?;
    Ok(categories
        .into_iter()
        .map(|category| {
            let spent: f64 = expenses
                .iter()
                .filter(|e| e.category_id == category.category_id)
                .map(|e| e.amount)
                .sum();
            let limit = category.monthly_limit;
            CategoryProgress {
                category,
                limit,
                spent,
                remaining: limit - spent,
                percent_used: calculate_progress(spent, limit),
            }
        })
        .collect())
}

/// Income, expense and savings totals for `year`-`month`.
pub async fn monthly_summary(
    store: &LocalStore,
    user_id: &str,
    year: i32,
    month: u32,
) -> Result<MonthlySummary> {
    let (start, end) = month_bounds(year, month)?;

    let income_total: f64 = store
        .incomes_between(user_id, start, end)
        .await?
        .iter()
        .map(|i| i.amount)
        .sum();
    let expense_total: f64 = store
        .expenses_between(user_id, start, end)
        .await?
        .iter()
        .map(|e| e.amount)
        .sum();
    let savings_total: f64 = store
        .savings_between(user_id, start, end)
        .await?
        .iter()
        .map(|s| s.amount)
        .sum();

    // A budget that starts after this month does not apply to it
    let budget_amount = store
        .budget_for_user(user_id)
        .await?
        .filter(|b| b.start_date <= end)
        .map(|b| b.monthly_amount);

    Ok(MonthlySummary {
        month_start: start,
        income_total,
        expense_total,
        savings_total,
        net: income_total - expense_total - savings_total,
        budget_amount,
        budget_remaining: budget_amount.map(|amount| amount - expense_total),
    })
}

/// Progress of every saving goal of `user_id`, in goal key order.
pub async fn saving_goal_progress(store: &LocalStore, user_id: &str) -> Result<Vec<GoalProgress>> {
    let mut progress = Vec::new();
    for goal in store.get_by_owner::<SavingGoal>(user_id).await? {
        let saved: f64 = store
            .savings_for_goal(goal.saving_goal_id)
            .await?
            .iter()
            .map(|s| s.amount)
            .sum();
        progress.push(GoalProgress {
            percent_complete: calculate_progress(saved, goal.target_amount),
            completed: saved >= goal.target_amount,
            saved,
            goal,
        });
    }
    Ok(progress)
}

/// `amount` as a percentage of `limit`. A zero limit reports 0%.
#[must_use]
pub fn calculate_progress(amount: f64, limit: f64) -> f64 {
    if limit == 0.0 {
        return 0.0;
    }

    (amount / limit) * 100.0
}

/// Text progress bar such as `[████████░░] 80.0%`.
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // clamped_progress is in [0, 100] and length is small, so the cast cannot overflow
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!(
        "[{}{}] {progress_percent:.1}%",
        "█".repeat(filled),
        "░".repeat(empty)
    )
}

/// Month label like "March 2024".
#[must_use]
pub fn month_label(date: NaiveDate) -> String {
    format!("{} {}", date.format("%B"), date.year())
}
