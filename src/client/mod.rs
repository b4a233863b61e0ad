//! Catalogue client: construction, shared state and single-record access.
//!
//! The `IniesClient` struct and its methods are organized by concern:
//! - this module - construction (login + metadata load), accessors, progress
//! - [`orchestrator`] - batch fan-out / fan-in over the record index

mod orchestrator;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::catalogue::Catalogue;
use crate::config::{ClientConfig, Credentials};
use crate::error::{Error, Result};
use crate::metadata::ReferenceMetadata;
use crate::retry::RetryExecutor;
use crate::session::{Credential, Session, TokenPair};
use crate::types::{Event, FullRecord, OrchestratorState, ProgressSnapshot, RecordId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Buffer size of the event channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Batch progress counters shared with observers
#[derive(Debug, Default)]
pub(crate) struct Progress {
    completed: AtomicU64,
    failed: AtomicU64,
    total: AtomicU64,
    state: AtomicU8,
}

impl Progress {
    pub(crate) fn start(&self, total: u64) {
        self.completed.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    /// Record one resolved task and return the new completed count
    pub(crate) fn record(&self, failed: bool) -> u64 {
        if failed {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn set_state(&self, state: OrchestratorState) {
        self.state.store(state.to_u8(), Ordering::SeqCst);
    }

    pub(crate) fn state(&self) -> OrchestratorState {
        OrchestratorState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
        }
    }
}

/// Catalogue client (cloneable - all fields are Arc-wrapped or shared handles)
///
/// Construct one per run with [`IniesClient::connect`] and pass it by
/// reference; there is no global instance.
#[derive(Clone, Debug)]
pub struct IniesClient {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<ClientConfig>,
    /// Authenticated catalogue access
    pub(crate) catalogue: Catalogue,
    /// Taxonomy snapshot, read-only after construction
    pub(crate) metadata: Arc<ReferenceMetadata>,
    /// Admission gate and retry policy shared by every fetch
    pub(crate) executor: RetryExecutor,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Progress of the current or last batch
    pub(crate) progress: Arc<Progress>,
}

impl IniesClient {
    /// Log in with operator credentials, then load the reference metadata
    ///
    /// Both steps complete before the client is returned; a failure in either
    /// is fatal.
    pub async fn connect(config: ClientConfig, credentials: &Credentials) -> Result<Self> {
        config.validate()?;
        let http = build_http_client(&config)?;
        let tokens = Session::login(&http, &config.base_url, credentials).await?;
        Self::assemble(config, http, tokens).await
    }

    /// Use an already-issued token pair instead of logging in
    ///
    /// The pair is treated as freshly established. Reference metadata is still
    /// loaded before returning.
    pub async fn with_token(config: ClientConfig, tokens: TokenPair) -> Result<Self> {
        config.validate()?;
        let http = build_http_client(&config)?;
        Self::assemble(config, http, tokens).await
    }

    async fn assemble(
        config: ClientConfig,
        http: reqwest::Client,
        tokens: TokenPair,
    ) -> Result<Self> {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let session = Arc::new(
            Session::new(
                http.clone(),
                config.base_url.clone(),
                config.token_max_age,
                Credential::new(tokens),
            )
            .with_events(event_tx.clone()),
        );
        let catalogue = Catalogue::new(http, config.base_url.clone(), session);

        let metadata = ReferenceMetadata::load(&catalogue).await?;
        tracing::info!(norms = metadata.len(), "reference metadata loaded");

        let executor = RetryExecutor::new(&config.concurrency, config.retry.clone());

        Ok(Self {
            config: Arc::new(config),
            catalogue,
            metadata: Arc::new(metadata),
            executor,
            event_tx,
            progress: Arc::new(Progress::default()),
        })
    }

    /// Subscribe to client events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Completed / failed / total counts of the current or last batch
    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    /// Lifecycle state of the orchestrator
    pub fn state(&self) -> OrchestratorState {
        self.progress.state()
    }

    /// Taxonomy snapshot used for decoration
    pub fn metadata(&self) -> &ReferenceMetadata {
        &self.metadata
    }

    /// Configuration in use
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Session owning the live credential
    pub fn session(&self) -> &Arc<Session> {
        self.catalogue.session()
    }

    /// Stop admitting requests
    ///
    /// Attempts already holding a permit run to completion. Waiting and later
    /// fetches fail with [`Error::ShuttingDown`], so a running batch drains
    /// quickly and returns what it already has. Irreversible for this client
    /// and its clones.
    pub fn shutdown(&self) {
        tracing::info!("shutting down, in-flight requests will finish");
        self.executor.close();
    }

    /// Whether [`shutdown`](Self::shutdown) was called
    pub fn is_shut_down(&self) -> bool {
        self.executor.is_closed()
    }

    /// Fetch and decorate a single record, with the configured retry budget
    pub async fn fetch_record(&self, id: RecordId) -> Result<FullRecord> {
        self.fetch_with_retry(id).await
    }

    pub(crate) async fn fetch_with_retry(&self, id: RecordId) -> Result<FullRecord> {
        let label = format!("fetch record {id}");
        let catalogue = &self.catalogue;
        let metadata = self.metadata.as_ref();
        self.executor
            .execute(&label, self.config.retry.max_attempts, move || {
                catalogue.fetch_one(id, metadata)
            })
            .await
    }
}

fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| Error::Config {
            message: format!("failed to build HTTP client: {e}"),
            key: Some("request_timeout".to_string()),
        })
}
