//! Pull sync - fills an empty local store from the remote store.
//!
//! The profile is fetched and parsed first: without it nothing else is meaningful,
//! so a missing or unparseable profile is terminal. Each sub-collection is then
//! fetched, parsed and written with `synced = true`; malformed documents are
//! skipped. The profile is written locally last, so a run that fails half-way
//! leaves no local profile and the next run pulls again from scratch.

use super::{
    JobOutcome,
    document::{ParsedDocument, parse_document},
};
use crate::{
    core::store::LocalStore,
    entities::{
        Budget, Expense, ExpenseCategory, Income, Saving, SavingGoal, SyncEntity, SyncRecord, User,
    },
    errors::{Error, Result},
    remote::{Collection, RemoteStore},
};
use sea_orm::IntoActiveModel;
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one sub-collection during a pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionPullStats {
    /// Documents written to the local store
    pub inserted: usize,
    /// Ids of documents that were skipped as malformed
    pub malformed: Vec<String>,
    /// Ids of documents skipped because the local row with that key belongs to
    /// another user
    pub foreign: Vec<String>,
}

/// Summary of a pull run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullReport {
    /// Identity that was pulled
    pub user_id: String,
    /// True when a local profile already existed and nothing was fetched
    pub skipped: bool,
    /// Per-collection results
    pub collections: BTreeMap<Collection, CollectionPullStats>,
}

impl PullReport {
    fn new(user_id: &str, skipped: bool) -> Self {
        Self {
            user_id: user_id.to_string(),
            skipped,
            collections: BTreeMap::new(),
        }
    }

    /// Records written across all collections.
    #[must_use]
    pub fn total_inserted(&self) -> usize {
        self.collections.values().map(|s| s.inserted).sum()
    }

    /// Documents skipped across all collections.
    #[must_use]
    pub fn total_malformed(&self) -> usize {
        self.collections.values().map(|s| s.malformed.len()).sum()
    }
}

/// Fetches, parses and stores one sub-collection.
async fn pull_collection<E>(
    store: &LocalStore,
    remote: &dyn RemoteStore,
    user_id: &str,
) -> Result<(Collection, CollectionPullStats)>
where
    E: SyncEntity,
    E::Model: IntoActiveModel<<<E::Model as SyncRecord>::Entity as SyncEntity>::Active>,
{
    let Some(collection) = E::COLLECTION else {
        return Err(Error::Validation {
            message: format!("{} is not stored in a sub-collection", E::KIND),
        });
    };

    let documents = remote.fetch_collection(user_id, collection).await?;
    let mut stats = CollectionPullStats::default();
    let mut parsed = Vec::with_capacity(documents.len());

    for raw in documents {
        match parse_document::<E>(user_id, raw) {
            ParsedDocument::Parsed(model) => {
                let taken = store
                    .stored_copy::<E>(&model)
                    .await?
                    .filter(|existing| existing.owner_id() != user_id);
                if let Some(existing) = taken {
                    warn!(
                        collection = %collection,
                        document_id = %model.document_id(),
                        local_owner = %existing.owner_id(),
                        "Skipping remote document whose key is taken by another user"
                    );
                    stats.foreign.push(model.document_id());
                    continue;
                }
                parsed.push(model);
            }
            ParsedDocument::Malformed { raw_id, reason } => {
                warn!(
                    collection = %collection,
                    document_id = %raw_id,
                    reason = %reason,
                    "Skipping malformed remote document"
                );
                stats.malformed.push(raw_id);
            }
        }
    }

    stats.inserted = store.write_synced(parsed).await?.len();
    debug!(
        collection = %collection,
        inserted = stats.inserted,
        malformed = stats.malformed.len(),
        foreign = stats.foreign.len(),
        "Pulled collection"
    );
    Ok((collection, stats))
}

async fn pull(store: &LocalStore, remote: &dyn RemoteStore, user_id: &str) -> Result<PullReport> {
    if store.profile(user_id).await?.is_some() {
        info!("Local profile present, nothing to pull");
        return Ok(PullReport::new(user_id, true));
    }

    let raw_profile = remote
        .fetch_profile(user_id)
        .await?
        .ok_or_else(|| Error::ProfileMissing {
            user_id: user_id.to_string(),
        })?;
    let profile = match parse_document::<User>(user_id, raw_profile) {
        ParsedDocument::Parsed(profile) => profile,
        ParsedDocument::Malformed { reason, .. } => {
            return Err(Error::MalformedProfile {
                user_id: user_id.to_string(),
                reason,
            });
        }
    };

    let mut report = PullReport::new(user_id, false);
    let pulled = [
        pull_collection::<SavingGoal>(store, remote, user_id).await?,
        pull_collection::<Saving>(store, remote, user_id).await?,
        pull_collection::<Income>(store, remote, user_id).await?,
        pull_collection::<ExpenseCategory>(store, remote, user_id).await?,
        pull_collection::<Expense>(store, remote, user_id).await?,
        pull_collection::<Budget>(store, remote, user_id).await?,
    ];
    report.collections.extend(pulled);

    store.write_synced(vec![profile]).await?;
    Ok(report)
}

/// Pulls the user's profile and every sub-collection into the local store.
///
/// # Returns
/// * `Succeeded` - everything was stored (or a local profile already existed)
/// * `Terminal` - the remote profile is missing or malformed
/// * `Retry` - any storage, network or decoding failure
#[instrument(skip(store, remote))]
pub async fn run_pull_sync(
    store: &LocalStore,
    remote: &dyn RemoteStore,
    user_id: &str,
) -> JobOutcome<PullReport> {
    match pull(store, remote, user_id).await {
        Ok(report) => {
            info!(
                inserted = report.total_inserted(),
                malformed = report.total_malformed(),
                skipped = report.skipped,
                "Pull sync finished"
            );
            JobOutcome::Succeeded(report)
        }
        Err(e) => {
            error!("Pull sync failed: {}", e);
            JobOutcome::from_error(&e)
        }
    }
}
