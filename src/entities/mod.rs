//! Entity module - Contains all SeaORM entity definitions for the local store.
//! These entities represent the database tables mirrored to the remote document store.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod budget;
pub mod expense;
pub mod expense_category;
pub mod income;
pub mod saving;
pub mod saving_goal;
pub mod sync_state;
pub mod syncable;
pub mod user;

// Re-export specific types to avoid conflicts
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use expense_category::{
    Column as ExpenseCategoryColumn, Entity as ExpenseCategory, Model as ExpenseCategoryModel,
};
pub use income::{Column as IncomeColumn, Entity as Income, Model as IncomeModel};
pub use saving::{Column as SavingColumn, Entity as Saving, Model as SavingModel};
pub use saving_goal::{Column as SavingGoalColumn, Entity as SavingGoal, Model as SavingGoalModel};
pub use sync_state::{Column as SyncStateColumn, Entity as SyncState, Model as SyncStateModel};
pub use syncable::{SyncEntity, SyncRecord};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
