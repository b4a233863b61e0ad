//! # inies-dl
//!
//! Resilient bulk retrieval of environmental product declarations from the
//! INIES catalogue.
//!
//! ## Design Philosophy
//!
//! inies-dl is designed to be:
//! - **Resilient** - Transient failures are retried with exponential backoff, and
//!   one bad record never aborts a batch
//! - **Bounded** - A single semaphore caps in-flight requests, including while a
//!   request waits out its backoff
//! - **Library-first** - The `inies-dl` binary is a thin wrapper over [`IniesClient`]
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use inies_dl::{ClientConfig, Credentials, CsvExporter, IniesClient, RecordExporter};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::from_env()?;
//!     let client = IniesClient::connect(ClientConfig::default(), &credentials).await?;
//!
//!     // Subscribe to events
//!     let mut events = client.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let records = client.fetch_all(None).await?;
//!     CsvExporter::new().export(&records, Path::new("data"))?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Authenticated catalogue access
pub mod catalogue;
/// Client construction and batch orchestration
pub mod client;
/// Configuration types
pub mod config;
/// Remote endpoint URLs
pub mod endpoints;
/// Error types
pub mod error;
/// Tabular export
pub mod export;
/// Subscriber setup for binaries
pub mod logging;
/// Norm taxonomy cache and record decoration
pub mod metadata;
/// Retry logic with exponential backoff
pub mod retry;
/// Credential lifecycle
pub mod session;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use catalogue::Catalogue;
pub use client::IniesClient;
pub use config::{ClientConfig, ConcurrencyConfig, Credentials, RetryConfig};
pub use error::{AuthError, Error, FetchError, RecordFailure, Result};
pub use export::{CsvExporter, FlatRow, RecordExporter};
pub use metadata::{ReferenceMetadata, decorate};
pub use retry::{AttemptOutcome, IsRetryable, RetryExecutor};
pub use session::{Credential, Session, TokenPair};
pub use types::{
    Event, FetchReport, FullRecord, IndicatorQuantity, IndicatorSet, OrchestratorState,
    ProgressSnapshot, RecordId, RecordIndexEntry,
};
