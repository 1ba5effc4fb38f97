//! In-process remote store.
//!
//! Keeps documents in a path-keyed map and records every committed write so callers
//! can assert on what reached the "cloud". Failures can be injected per collection,
//! for profile writes, and for reads, which is how the sync jobs' retry paths are
//! exercised without a network.

use super::{Collection, RawDocument, RemoteStore, profile_path};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

/// One successful commit: the target path and the document ids it wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Collection path, or the profile document path
    pub path: String,
    /// Document ids written by the commit
    pub document_ids: Vec<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: BTreeMap<String, Value>,
    commits: Vec<CommitRecord>,
    failing_collections: HashSet<Collection>,
    fail_profile_writes: bool,
    fail_reads: bool,
}

/// Remote store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    state: Mutex<MemoryState>,
}

/// Shallow merge: payload fields overwrite, everything else is kept.
fn merge_into(existing: &mut Value, payload: Value) {
    match (existing, payload) {
        (Value::Object(current), Value::Object(incoming)) => {
            for (field, value) in incoming {
                current.insert(field, value);
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}

impl MemoryRemoteStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a document at `users/{user_id}/{collection}/{id}` without recording a commit.
    pub async fn seed_document(
        &self,
        user_id: &str,
        collection: Collection,
        id: &str,
        data: Value,
    ) {
        let path = format!("{}/{id}", collection.path(user_id));
        self.state.lock().await.documents.insert(path, data);
    }

    /// Places a profile document without recording a commit.
    pub async fn seed_profile(&self, user_id: &str, data: Value) {
        self.state
            .lock()
            .await
            .documents
            .insert(profile_path(user_id), data);
    }

    /// Document stored at a full path, if any.
    pub async fn document(&self, path: &str) -> Option<Value> {
        self.state.lock().await.documents.get(path).cloned()
    }

    /// Number of documents currently stored.
    pub async fn document_count(&self) -> usize {
        self.state.lock().await.documents.len()
    }

    /// Every successful commit so far, oldest first.
    pub async fn commits(&self) -> Vec<CommitRecord> {
        self.state.lock().await.commits.clone()
    }

    /// Makes every batch write to `collection` fail until [`Self::clear_failures`].
    pub async fn fail_writes_to(&self, collection: Collection) {
        self.state
            .lock()
            .await
            .failing_collections
            .insert(collection);
    }

    /// Makes profile writes fail until [`Self::clear_failures`].
    pub async fn fail_profile_writes(&self) {
        self.state.lock().await.fail_profile_writes = true;
    }

    /// Makes every read fail until [`Self::clear_failures`].
    pub async fn fail_reads(&self) {
        self.state.lock().await.fail_reads = true;
    }

    /// Removes all injected failures.
    pub async fn clear_failures(&self) {
        let mut state = self.state.lock().await;
        state.failing_collections.clear();
        state.fail_profile_writes = false;
        state.fail_reads = false;
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn fetch_collection(
        &self,
        user_id: &str,
        collection: Collection,
    ) -> Result<Vec<RawDocument>> {
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(Error::remote_status(503, "remote store unavailable"));
        }

        let prefix = format!("{}/", collection.path(user_id));
        let documents = state
            .documents
            .iter()
            .filter_map(|(path, data)| {
                let id = path.strip_prefix(&prefix)?;
                (!id.contains('/')).then(|| RawDocument::new(id, data.clone()))
            })
            .collect();
        Ok(documents)
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<RawDocument>> {
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(Error::remote_status(503, "remote store unavailable"));
        }

        Ok(state
            .documents
            .get(&profile_path(user_id))
            .map(|data| RawDocument::new(user_id, data.clone())))
    }

    async fn batch_write(
        &self,
        user_id: &str,
        collection: Collection,
        documents: BTreeMap<String, Value>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.failing_collections.contains(&collection) {
            return Err(Error::remote_status(
                503,
                format!("batch commit to {collection} rejected"),
            ));
        }

        let base = collection.path(user_id);
        let document_ids: Vec<String> = documents.keys().cloned().collect();
        for (id, payload) in documents {
            let slot = state
                .documents
                .entry(format!("{base}/{id}"))
                .or_insert(Value::Null);
            merge_into(slot, payload);
        }
        debug!(path = %base, count = document_ids.len(), "Committed batch");
        state.commits.push(CommitRecord {
            path: base,
            document_ids,
        });
        Ok(())
    }

    async fn write_profile(&self, user_id: &str, profile: Value) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.fail_profile_writes {
            return Err(Error::remote_status(503, "profile write rejected"));
        }

        let path = profile_path(user_id);
        let slot = state.documents.entry(path.clone()).or_insert(Value::Null);
        merge_into(slot, profile);
        state.commits.push(CommitRecord {
            path,
            document_ids: vec![user_id.to_string()],
        });
        Ok(())
    }
}
