//! Remote document store - per-user, per-collection document sets.
//!
//! Layout:
//! - `users_profile/{userId}` holds the profile document
//! - `users/{userId}/{collection}/{documentId}` holds owned records
//!
//! Writes use merge semantics: fields present in a payload overwrite, fields absent
//! from it are left untouched remotely. A batch commits all of its documents or none.

pub mod firestore;
pub mod memory;
pub mod value;

use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

pub use firestore::FirestoreRemoteStore;
pub use memory::{CommitRecord, MemoryRemoteStore};

/// Root of owned sub-collections
pub const USERS_ROOT: &str = "users";
/// Root of profile documents
pub const PROFILE_ROOT: &str = "users_profile";

/// The six owned sub-collections under `users/{userId}`, ordered the way the sync
/// jobs process them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// `saving_goals`
    SavingGoals,
    /// `savings`
    Savings,
    /// `income_entries`
    IncomeEntries,
    /// `expense_categories`
    ExpenseCategories,
    /// `expenses`
    Expenses,
    /// `budgets`
    Budgets,
}

impl Collection {
    /// Wire name of the collection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SavingGoals => "saving_goals",
            Self::Savings => "savings",
            Self::IncomeEntries => "income_entries",
            Self::ExpenseCategories => "expense_categories",
            Self::Expenses => "expenses",
            Self::Budgets => "budgets",
        }
    }

    /// Collection path for `user_id`, e.g. `users/u1/expenses`.
    #[must_use]
    pub fn path(self, user_id: &str) -> String {
        format!("{USERS_ROOT}/{user_id}/{}", self.as_str())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile document path for `user_id`, e.g. `users_profile/u1`.
#[must_use]
pub fn profile_path(user_id: &str) -> String {
    format!("{PROFILE_ROOT}/{user_id}")
}

/// A document as returned by the remote store, before it is parsed into an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Last path segment of the document
    pub id: String,
    /// Document fields as plain JSON
    pub data: Value,
}

impl RawDocument {
    /// Creates a raw document.
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Typed access to the cloud document database.
///
/// Every method fails with [`Error::Remote`](crate::errors::Error::Remote) or
/// [`Error::Http`](crate::errors::Error::Http) on connectivity or auth problems.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All documents of one owned collection; empty when there are none.
    async fn fetch_collection(
        &self,
        user_id: &str,
        collection: Collection,
    ) -> Result<Vec<RawDocument>>;

    /// The profile document, or `None` when it does not exist.
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<RawDocument>>;

    /// Atomically merges every `(document id, payload)` pair into the collection.
    async fn batch_write(
        &self,
        user_id: &str,
        collection: Collection,
        documents: BTreeMap<String, Value>,
    ) -> Result<()>;

    /// Merges `profile` into the user's profile document.
    async fn write_profile(&self, user_id: &str, profile: Value) -> Result<()>;
}
