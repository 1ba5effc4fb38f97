//! Sync orchestrator - schedules the pull and push jobs for one device.
//!
//! Each job kind has its own slot holding a lock and a state channel. The lock
//! makes a second request for the same kind fail fast with
//! [`Error::JobAlreadyRunning`] instead of running twice; the channel lets a UI
//! bind a progress indicator to [`JobState`].
//!
//! A job is retried from the beginning while its outcome is retryable, up to the
//! configured number of attempts. A `pending_job` marker in the local database
//! covers the run; it stays behind only when retries were exhausted (or the
//! process died), and [`SyncOrchestrator::resume_pending`] picks it up later.

use super::{JobKind, JobOutcome, PullReport, PushReport, pending, run_pull_sync, run_push_sync};
use crate::{
    config::RetryConfig,
    core::store::LocalStore,
    errors::{Error, Result},
    remote::RemoteStore,
};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::sync::{Mutex, watch};
use tracing::{info, instrument, warn};

/// How retryable failures are re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total runs per request, including the first; 0 behaves like 1
    pub max_attempts: u32,
    /// Fixed delay between runs
    pub backoff: Duration,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: config.backoff(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// Progress of one job kind, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Never requested in this process
    Idle,
    /// Accepted, about to run
    Enqueued,
    /// Executing; `attempt` starts at 1
    Running {
        /// Current attempt number
        attempt: u32,
    },
    /// Last run succeeded
    Succeeded,
    /// Last run failed after all attempts
    Failed {
        /// True when retrying cannot help (the UI should offer retry/cancel)
        terminal: bool,
        /// Failure description
        reason: String,
    },
}

#[derive(Debug)]
struct JobSlot {
    lock: Mutex<()>,
    state: watch::Sender<JobState>,
    state_rx: watch::Receiver<JobState>,
}

impl JobSlot {
    fn new() -> Self {
        let (state, state_rx) = watch::channel(JobState::Idle);
        Self {
            lock: Mutex::new(()),
            state,
            state_rx,
        }
    }
}

/// Result of a startup or resume pass: the outcome of each job that ran.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncRun {
    /// Pull outcome, if a pull was run
    pub pull: Option<JobOutcome<PullReport>>,
    /// Push outcome, if a push was run
    pub push: Option<JobOutcome<PushReport>>,
}

/// Runs and tracks the sync jobs against one local store and one remote store.
pub struct SyncOrchestrator {
    store: LocalStore,
    remote: Arc<dyn RemoteStore>,
    policy: RetryPolicy,
    pull_slot: JobSlot,
    push_slot: JobSlot,
}

impl SyncOrchestrator {
    /// Creates an orchestrator with both jobs idle.
    #[must_use]
    pub fn new(store: LocalStore, remote: Arc<dyn RemoteStore>, policy: RetryPolicy) -> Self {
        Self {
            store,
            remote,
            policy,
            pull_slot: JobSlot::new(),
            push_slot: JobSlot::new(),
        }
    }

    const fn slot(&self, kind: JobKind) -> &JobSlot {
        match kind {
            JobKind::Pull => &self.pull_slot,
            JobKind::Push => &self.push_slot,
        }
    }

    /// Receiver that observes every state change of `kind`.
    #[must_use]
    pub fn subscribe(&self, kind: JobKind) -> watch::Receiver<JobState> {
        self.slot(kind).state_rx.clone()
    }

    /// Current state of `kind`.
    #[must_use]
    pub fn state(&self, kind: JobKind) -> JobState {
        self.slot(kind).state_rx.borrow().clone()
    }

    /// Whether `user_id` has no local profile yet, i.e. the device needs a pull.
    pub async fn needs_pull(&self, user_id: &str) -> Result<bool> {
        Ok(self.store.profile(user_id).await?.is_none())
    }

    /// Runs the pull job for `user_id` with retries.
    ///
    /// # Errors
    /// Returns `Error::JobAlreadyRunning` when a pull is already executing.
    pub async fn pull(&self, user_id: &str) -> Result<JobOutcome<PullReport>> {
        let store = &self.store;
        let remote = self.remote.as_ref();
        self.run_job(JobKind::Pull, user_id, move || {
            run_pull_sync(store, remote, user_id)
        })
        .await
    }

    /// Runs the push job for `user_id` with retries.
    ///
    /// # Errors
    /// Returns `Error::JobAlreadyRunning` when a push is already executing.
    pub async fn push(&self, user_id: &str) -> Result<JobOutcome<PushReport>> {
        let store = &self.store;
        let remote = self.remote.as_ref();
        self.run_job(JobKind::Push, user_id, move || {
            run_push_sync(store, remote, user_id)
        })
        .await
    }

    #[instrument(skip(self, job))]
    async fn run_job<R, F, Fut>(
        &self,
        kind: JobKind,
        user_id: &str,
        job: F,
    ) -> Result<JobOutcome<R>>
    where
        F: Fn() -> Fut + Send,
        Fut: Future<Output = JobOutcome<R>> + Send,
    {
        let slot = self.slot(kind);
        let Ok(_guard) = slot.lock.try_lock() else {
            return Err(Error::JobAlreadyRunning {
                kind: kind.to_string(),
            });
        };
        slot.state.send_replace(JobState::Enqueued);

        if let Err(e) = pending::mark_pending(self.store.connection(), kind, user_id).await {
            warn!("Could not record pending {} job: {}", kind, e);
            slot.state.send_replace(JobState::Failed {
                terminal: false,
                reason: e.to_string(),
            });
            return Ok(JobOutcome::from_error(&e));
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        let outcome = loop {
            slot.state.send_replace(JobState::Running { attempt });
            let outcome = job().await;
            match &outcome {
                JobOutcome::Retry { reason } if attempt < max_attempts => {
                    warn!(
                        attempt,
                        max_attempts,
                        reason = %reason,
                        "Sync job failed, retrying in {:?}",
                        self.policy.backoff
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                    attempt += 1;
                }
                _ => break outcome,
            }
        };

        let final_state = match &outcome {
            JobOutcome::Succeeded(_) => JobState::Succeeded,
            JobOutcome::Retry { reason } => JobState::Failed {
                terminal: false,
                reason: reason.clone(),
            },
            JobOutcome::Terminal { reason } => JobState::Failed {
                terminal: true,
                reason: reason.clone(),
            },
        };

        if outcome.is_retryable() {
            warn!(attempts = attempt, "Retries exhausted, job left pending");
        } else if let Err(e) = pending::clear_pending(self.store.connection(), kind, user_id).await
        {
            warn!("Could not clear pending {} job: {}", kind, e);
        }

        info!(attempts = attempt, state = ?final_state, "Sync job finished");
        slot.state.send_replace(final_state);
        Ok(outcome)
    }

    /// Launch-time sync: pull then push when the device has no profile for
    /// `user_id`, otherwise push only. Push is skipped when the pull did not
    /// succeed.
    ///
    /// # Errors
    /// Returns storage errors from the profile check and
    /// `Error::JobAlreadyRunning` when a job of either kind is already executing.
    #[instrument(skip(self))]
    pub async fn startup_sync(&self, user_id: &str) -> Result<SyncRun> {
        let mut run = SyncRun::default();
        if self.needs_pull(user_id).await? {
            let pull = self.pull(user_id).await?;
            let pulled = pull.is_success();
            run.pull = Some(pull);
            if !pulled {
                return Ok(run);
            }
        }
        run.push = Some(self.push(user_id).await?);
        Ok(run)
    }

    /// Re-runs jobs whose markers were left behind by an earlier process, pull
    /// first. A pending push is skipped when the resumed pull does not succeed.
    ///
    /// # Errors
    /// Returns storage errors from reading the markers and
    /// `Error::JobAlreadyRunning` when a job of either kind is already executing.
    #[instrument(skip(self))]
    pub async fn resume_pending(&self, user_id: &str) -> Result<SyncRun> {
        let mut run = SyncRun::default();
        for kind in pending::pending_jobs(self.store.connection(), user_id).await? {
            info!(%kind, "Resuming pending sync job");
            match kind {
                JobKind::Pull => {
                    let pull = self.pull(user_id).await?;
                    let pulled = pull.is_success();
                    run.pull = Some(pull);
                    if !pulled {
                        break;
                    }
                }
                JobKind::Push => run.push = Some(self.push(user_id).await?),
            }
        }
        Ok(run)
    }
}
