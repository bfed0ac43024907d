//! REST client for the per-account cloud document store.

use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

use fueltrack_core::sync::{
    AccountSession, CloudCollection, CloudDocument, CloudDocumentStore, CloudWrite,
};

use crate::error::{CloudSyncError, Result};
use crate::types::*;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;
/// Documents requested per listing page.
const LIST_PAGE_SIZE: usize = 300;

#[derive(Debug, Clone)]
pub struct CloudStoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl CloudStoreClient {
    /// Create a client for the API at `base_url` (e.g. "https://sync.example.com").
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[CloudSync] API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[CloudSync] API response error ({}): {}", status, preview);
    }

    fn headers(&self, session: &AccountSession) -> Result<HeaderMap> {
        if session.access_token.is_empty() {
            return Err(CloudSyncError::auth("Missing access token"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", session.access_token))
            .map_err(|_| CloudSyncError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);
        Ok(headers)
    }

    fn account_path(session: &AccountSession) -> Result<String> {
        if session.account_id.is_empty() {
            return Err(CloudSyncError::invalid_request("Missing account id"));
        }
        Ok(format!(
            "users/{}",
            urlencoding::encode(&session.account_id)
        ))
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(CloudSyncError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(CloudSyncError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("[CloudSync] Failed to deserialize response: {}", e);
            CloudSyncError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    /// Fetch one page of a collection.
    ///
    /// GET /v1/users/{accountId}/{collection}?pageSize=..&pageToken=..
    pub async fn list_page(
        &self,
        session: &AccountSession,
        collection: CloudCollection,
        page_token: Option<&str>,
    ) -> Result<ListDocumentsResponse> {
        let mut url = format!(
            "{}/v1/{}/{}?pageSize={}",
            self.base_url,
            Self::account_path(session)?,
            collection.segment(),
            LIST_PAGE_SIZE
        );
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }

        let response = self
            .client
            .get(&url)
            .headers(self.headers(session)?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch every document of a collection, following page tokens.
    pub async fn list_all(
        &self,
        session: &AccountSession,
        collection: CloudCollection,
    ) -> Result<Vec<CloudDocument>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .list_page(session, collection, page_token.as_deref())
                .await?;
            documents.extend(page.documents);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!(
            "[CloudSync] Listed {} documents from {}",
            documents.len(),
            collection
        );
        Ok(documents)
    }

    /// Apply a batch of writes atomically.
    ///
    /// POST /v1/users/{accountId}:commit
    pub async fn commit_writes(
        &self,
        session: &AccountSession,
        writes: Vec<CloudWrite>,
    ) -> Result<CommitResponse> {
        let url = format!(
            "{}/v1/{}:commit",
            self.base_url,
            Self::account_path(session)?
        );
        let request = CommitRequest { writes };
        debug!("[CloudSync] Committing {} writes", request.writes.len());

        let response = self
            .client
            .post(&url)
            .headers(self.headers(session)?)
            .json(&request)
            .send()
            .await?;

        Self::parse_response(response).await
    }
}

#[async_trait]
impl CloudDocumentStore for CloudStoreClient {
    async fn list_documents(
        &self,
        session: &AccountSession,
        collection: CloudCollection,
    ) -> fueltrack_core::Result<Vec<CloudDocument>> {
        Ok(self.list_all(session, collection).await?)
    }

    async fn commit(
        &self,
        session: &AccountSession,
        writes: Vec<CloudWrite>,
    ) -> fueltrack_core::Result<()> {
        self.commit_writes(session, writes).await?;
        Ok(())
    }
}
