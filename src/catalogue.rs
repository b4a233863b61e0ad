//! Authenticated access to the record catalogue
//!
//! Every call asks the [`Session`] for a current bearer header first. Failures
//! are returned as [`FetchError`] values and never retried here; retry policy
//! belongs to [`crate::retry::RetryExecutor`].

use crate::endpoints;
use crate::error::{FetchError, Result};
use crate::metadata::{self, NormDetail, NormSummary, ReferenceMetadata};
use crate::session::Session;
use crate::types::{FullRecord, RecordId, RecordIndexEntry};
use chrono::NaiveDate;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Catalogue fetcher (cloneable - the HTTP client and session are shared)
#[derive(Clone, Debug)]
pub struct Catalogue {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
}

impl Catalogue {
    /// Create a fetcher bound to a session
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, session: Arc<Session>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            session,
        }
    }

    /// Session used for authentication
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// List non-archived records, optionally only those updated since `since`
    ///
    /// An empty list is a valid result.
    pub async fn list_index(&self, since: Option<NaiveDate>) -> Result<Vec<RecordIndexEntry>> {
        let url = endpoints::record_index_url(&self.base_url, since);
        tracing::info!(since = ?since, "fetching record index");
        self.get_json(&url).await
    }

    /// Fetch one record and resolve its names against `metadata`
    pub async fn fetch_one(
        &self,
        id: RecordId,
        metadata: &ReferenceMetadata,
    ) -> Result<FullRecord> {
        let url = endpoints::record_url(&self.base_url, id.get());
        let record: FullRecord = self.get_json(&url).await?;
        Ok(metadata::decorate(record, metadata))
    }

    /// Fetch the flat norm list
    pub async fn list_norms(&self) -> Result<Vec<NormSummary>> {
        self.get_json(&endpoints::norms_url(&self.base_url)).await
    }

    /// Fetch the indicators and phases of one norm
    pub async fn norm_detail(&self, norm_id: i64) -> Result<NormDetail> {
        self.get_json(&endpoints::norm_detail_url(&self.base_url, norm_id))
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let header = self.session.auth_header().await?;

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, header)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(FetchError::Transport)?;

        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "request failed");
            return Err(FetchError::status(status, url, &body).into());
        }

        serde_json::from_str(&body).map_err(|source| {
            FetchError::Decode {
                url: url.to_string(),
                source,
            }
            .into()
        })
    }
}
