//! Bidirectional sync between the local store and the remote document store.
//!
//! - [`pull::run_pull_sync`] copies a user's remote data into an empty local store
//! - [`push::run_push_sync`] writes every unsynced local record to the remote store
//! - [`orchestrator::SyncOrchestrator`] decides which to run, retries them, and
//!   publishes their state
//!
//! Jobs never return a raw error: every path ends in a [`JobOutcome`].

pub mod document;
pub mod orchestrator;
pub mod pending;
pub mod pull;
pub mod push;

use crate::errors::Error;
use std::fmt;

pub use document::{ParsedDocument, parse_document};
pub use orchestrator::{JobState, RetryPolicy, SyncOrchestrator, SyncRun};
pub use pull::{CollectionPullStats, PullReport, run_pull_sync};
pub use push::{PushReport, run_push_sync};

/// The two one-shot sync jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Remote to local
    Pull,
    /// Local to remote
    Push,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pull => "pull",
            Self::Push => "push",
        })
    }
}

/// Final classification of one job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome<R> {
    /// The job finished; `R` describes what it did
    Succeeded(R),
    /// The job failed in a way a later re-run can fix
    Retry {
        /// Failure description
        reason: String,
    },
    /// The job cannot succeed without a different user action
    Terminal {
        /// Failure description
        reason: String,
    },
}

impl<R> JobOutcome<R> {
    /// Classifies an error into a retry or terminal outcome.
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        if error.is_terminal() {
            Self::Terminal {
                reason: error.to_string(),
            }
        } else {
            Self::Retry {
                reason: error.to_string(),
            }
        }
    }

    /// Whether the job finished successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Whether re-running the job may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Retry { .. })
    }

    /// Whether the failure is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }

    /// The success report, if the job succeeded.
    #[must_use]
    pub const fn report(&self) -> Option<&R> {
        match self {
            Self::Succeeded(report) => Some(report),
            Self::Retry { .. } | Self::Terminal { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        let retry: JobOutcome<()> = JobOutcome::from_error(&Error::remote("timeout"));
        assert!(retry.is_retryable());

        let terminal: JobOutcome<()> = JobOutcome::from_error(&Error::ProfileMissing {
            user_id: "u1".to_string(),
        });
        assert!(terminal.is_terminal());
        assert!(terminal.report().is_none());

        let ok = JobOutcome::Succeeded(3);
        assert!(ok.is_success());
        assert_eq!(ok.report(), Some(&3));
    }
}
