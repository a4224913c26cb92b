//! Remote document store: the trait the loader races against, and the
//! Firestore REST client that implements it.

use std::future::Future;
use std::time::Duration;

use hobbi_core::{NetworkError, ReqwestErrorExt, StoreConfig};
use serde_json::{json, Map, Value};
use tracing::instrument;

use crate::error::SyncError;
use crate::firestore;
use crate::model::PersistedState;

/// Decoded fields of the remote dashboard document.
pub type RemoteDocument = Map<String, Value>;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A single-document remote store.
///
/// Implementations must be cheap to share: the loader moves an `Arc` of the
/// store into a spawned task when it races a read against its deadline.
pub trait DocumentStore: Send + Sync + 'static {
    /// Fetch the document. `Ok(None)` when it does not exist.
    fn read(&self) -> impl Future<Output = Result<Option<RemoteDocument>, SyncError>> + Send;

    /// Replace the document with `state`.
    fn write(&self, state: &PersistedState) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// Firestore REST client bound to one document.
pub struct FirestoreClient {
    client: reqwest::Client,
    document_url: String,
    api_key: Option<String>,
}

impl FirestoreClient {
    pub fn new(config: &StoreConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SyncError::RemoteUnavailable(e.into_network_error()))?;

        let document_url = format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            config.base_url.trim_end_matches('/'),
            config.project_id,
            config.collection,
            config.document,
        );

        Ok(Self {
            client,
            document_url,
            api_key: config.api_key.clone(),
        })
    }

    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, &self.document_url);
        match &self.api_key {
            Some(key) => builder.query(&[("key", key)]),
            None => builder,
        }
    }

    /// Fetch and decode the document.
    #[instrument(skip(self), level = "info")]
    pub async fn get_document(&self) -> Result<Option<RemoteDocument>, SyncError> {
        let response = self
            .request(reqwest::Method::GET)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(e.into_network_error()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::info!("Remote dashboard document does not exist");
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::RemoteUnavailable(NetworkError::from_status(status, text)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(e.into_network_error()))?;

        let fields = match body.get("fields") {
            Some(fields) => firestore::decode_fields(fields)
                .map_err(|e| SyncError::RemoteUnavailable(NetworkError::InvalidResponse(e)))?,
            // A document with no fields at all
            None => Map::new(),
        };

        Ok(Some(fields))
    }

    /// Overwrite the document with `fields`.
    #[instrument(skip(self, fields), level = "info")]
    pub async fn set_document(&self, fields: &Map<String, Value>) -> Result<(), SyncError> {
        let body = json!({ "fields": firestore::encode_fields(fields) });

        let response = self
            .request(reqwest::Method::PATCH)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::WriteError(e.into_network_error()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(SyncError::WriteError(NetworkError::from_status(status, text)))
        }
    }
}

impl DocumentStore for FirestoreClient {
    async fn read(&self) -> Result<Option<RemoteDocument>, SyncError> {
        self.get_document().await
    }

    async fn write(&self, state: &PersistedState) -> Result<(), SyncError> {
        let fields = match serde_json::to_value(state) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(SyncError::WriteError(NetworkError::InvalidResponse(format!(
                    "dashboard state serialized to a non-object: {}",
                    other
                ))))
            }
            Err(e) => {
                return Err(SyncError::WriteError(NetworkError::InvalidResponse(e.to_string())))
            }
        };
        self.set_document(&fields).await
    }
}

impl std::fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("document_url", &self.document_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
