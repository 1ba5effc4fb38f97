//! Remote store backed by the Firestore REST API.
//!
//! Reads list a collection page by page; writes go through `documents:commit`,
//! which applies every write in the request atomically. Each write carries an
//! `updateMask` naming exactly the payload's fields, which gives merge semantics.

use super::{Collection, RawDocument, RemoteStore, profile_path, value};
use crate::config::RemoteConfig;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::{
    StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

const PAGE_SIZE: u32 = 300;
const MAX_LOG_BODY_CHARS: usize = 512;

#[derive(Debug, Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

fn document_from_wire(document: WireDocument) -> RawDocument {
    let id = document
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    RawDocument::new(id, Value::Object(value::decode_fields(&document.fields)))
}

fn truncate_for_log(body: &str) -> String {
    let mut preview: String = body.chars().take(MAX_LOG_BODY_CHARS).collect();
    if body.chars().count() > MAX_LOG_BODY_CHARS {
        preview.push_str("...");
    }
    preview
}

/// Client for a Firestore-compatible document database.
#[derive(Debug, Clone)]
pub struct FirestoreRemoteStore {
    client: reqwest::Client,
    base_url: String,
    database_root: String,
}

impl FirestoreRemoteStore {
    /// Builds a client for `config`, authenticating every request with `id_token`.
    ///
    /// # Errors
    /// Returns `Error::Config` when the project id is empty or the token is not a
    /// valid header value, and `Error::Http` when the HTTP client cannot be built.
    pub fn new(config: &RemoteConfig, id_token: &str) -> Result<Self> {
        if config.project_id.trim().is_empty() {
            return Err(Error::Config {
                message: "remote.project_id must be set".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value =
            HeaderValue::from_str(&format!("Bearer {id_token}")).map_err(|_| Error::Config {
                message: "Invalid id token format".to_string(),
            })?;
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            database_root: format!(
                "projects/{}/databases/(default)/documents",
                config.project_id
            ),
        })
    }

    fn document_name(&self, path: &str) -> String {
        format!("{}/{path}", self.database_root)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, self.document_name(path))
    }

    /// Turns a non-success status into `Error::Remote`, otherwise returns the body.
    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            debug!("Remote response status: {}", status);
            return Ok(body);
        }

        let preview = truncate_for_log(&body);
        warn!("Remote response error ({}): {}", status, preview);
        Err(Error::remote_status(status.as_u16(), preview))
    }

    fn update_write(&self, path: &str, payload: &Value) -> Result<Value> {
        let Value::Object(fields) = payload else {
            return Err(Error::remote(format!(
                "payload for {path} is not a JSON object"
            )));
        };
        let field_paths: Vec<String> = fields.keys().map(|k| value::field_path(k)).collect();
        Ok(json!({
            "update": {
                "name": self.document_name(path),
                "fields": value::encode_fields(fields),
            },
            "updateMask": { "fieldPaths": field_paths },
        }))
    }

    async fn commit(&self, writes: Vec<Value>) -> Result<()> {
        let url = format!("{}/{}:commit", self.base_url, self.database_root);
        let response = self
            .client
            .post(url)
            .json(&json!({ "writes": writes }))
            .send()
            .await?;
        Self::read_body(response).await.map(|_| ())
    }
}

#[async_trait]
impl RemoteStore for FirestoreRemoteStore {
    #[instrument(skip(self))]
    async fn fetch_collection(
        &self,
        user_id: &str,
        collection: Collection,
    ) -> Result<Vec<RawDocument>> {
        let url = self.url(&collection.path(user_id));
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let body = Self::read_body(request.send().await?).await?;
            let page: ListResponse = serde_json::from_str(&body)?;
            documents.extend(page.documents.into_iter().map(document_from_wire));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(count = documents.len(), "Fetched collection");
        Ok(documents)
    }

    #[instrument(skip(self))]
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<RawDocument>> {
        let response = self.client.get(self.url(&profile_path(user_id))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = Self::read_body(response).await?;
        let document: WireDocument = serde_json::from_str(&body)?;
        Ok(Some(document_from_wire(document)))
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn batch_write(
        &self,
        user_id: &str,
        collection: Collection,
        documents: BTreeMap<String, Value>,
    ) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let base = collection.path(user_id);
        let writes = documents
            .iter()
            .map(|(id, payload)| self.update_write(&format!("{base}/{id}"), payload))
            .collect::<Result<Vec<_>>>()?;
        self.commit(writes).await
    }

    #[instrument(skip(self, profile))]
    async fn write_profile(&self, user_id: &str, profile: Value) -> Result<()> {
        let write = self.update_write(&profile_path(user_id), &profile)?;
        self.commit(vec![write]).await
    }
}
