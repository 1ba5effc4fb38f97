//! Unified error type for the sync subsystem.
//!
//! Adapters (local store, remote store) surface raw failures through this enum.
//! The job layer classifies them with [`Error::is_terminal`] and turns them into a
//! [`JobOutcome`](crate::core::sync::JobOutcome); nothing escapes unclassified.

use thiserror::Error;

/// All failures the crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Local storage failure (the `StorageFailure` of the local store contract)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Remote store rejected a request
    #[error("Remote store error ({status}): {message}")]
    Remote {
        /// HTTP-style status reported by the remote, 0 when not applicable
        status: u16,
        /// Description of the failure
        message: String,
    },

    /// Transport-level failure talking to the remote store (connect, timeout, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Amount is zero, negative, or not a finite number
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Input rejected before it reached the store
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// The remote store has no profile document for this user
    #[error("No remote profile for user {user_id}")]
    ProfileMissing {
        /// Identity that was looked up
        user_id: String,
    },

    /// The remote profile document exists but cannot be parsed
    #[error("Remote profile for user {user_id} is malformed: {reason}")]
    MalformedProfile {
        /// Identity that was looked up
        user_id: String,
        /// Parse failure description
        reason: String,
    },

    /// Another instance of the same job kind is already executing
    #[error("A {kind} job is already running")]
    JobAlreadyRunning {
        /// Job kind name ("pull" or "push")
        kind: String,
    },

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a remote error without a transport status.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            status: 0,
            message: message.into(),
        }
    }

    /// Creates a remote error carrying the status code returned by the service.
    pub fn remote_status(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Whether retrying the same job cannot succeed without a different user action.
    ///
    /// Only a missing or unparseable remote profile is terminal. Storage, network,
    /// timeout and commit failures are all retryable.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ProfileMissing { .. } | Self::MalformedProfile { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
