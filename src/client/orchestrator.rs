//! Batch fetch over the record index.
//!
//! `idle → listing → fanning-out → collecting → done`. One retrying fetch is
//! created per index entry up front; the executor's permit pool is the only
//! backpressure. Completions are consumed as they resolve, so the order of the
//! returned records is unspecified.

use super::IniesClient;
use crate::error::{RecordFailure, Result};
use crate::types::{Event, FetchReport, FullRecord, OrchestratorState};
use chrono::NaiveDate;
use futures::stream::{FuturesUnordered, StreamExt};

impl IniesClient {
    /// Fetch every non-archived record, optionally only those updated since `since`
    ///
    /// Records that cannot be fetched are logged and left out; the only error
    /// returned is a failure to list the index.
    pub async fn fetch_all(&self, since: Option<NaiveDate>) -> Result<Vec<FullRecord>> {
        Ok(self.fetch_all_report(since).await?.records)
    }

    /// Same as [`fetch_all`](Self::fetch_all) but also returns the per-record failures
    pub async fn fetch_all_report(&self, since: Option<NaiveDate>) -> Result<FetchReport> {
        self.progress.start(0);
        self.progress.set_state(OrchestratorState::Listing);
        self.event_tx.send(Event::Listing { since }).ok();

        let index = match self.catalogue.list_index(since).await {
            Ok(index) => index,
            Err(e) => {
                tracing::error!(error = %e, "failed to list records");
                self.progress.set_state(OrchestratorState::Idle);
                return Err(e);
            }
        };

        let total = index.len() as u64;
        tracing::info!(total, "records to retrieve");
        self.progress.start(total);
        self.event_tx.send(Event::Listed { total }).ok();

        self.progress.set_state(OrchestratorState::FanningOut);
        let mut pending: FuturesUnordered<_> = index
            .into_iter()
            .map(|entry| async move { (entry.id, self.fetch_with_retry(entry.id).await) })
            .collect();

        self.progress.set_state(OrchestratorState::Collecting);
        let mut report = FetchReport {
            records: Vec::with_capacity(total as usize),
            failures: Vec::new(),
        };

        while let Some((id, result)) = pending.next().await {
            match result {
                Ok(record) => {
                    let completed = self.progress.record(false);
                    tracing::debug!(record_id = %id, completed, total, "record fetched");
                    self.event_tx
                        .send(Event::RecordFetched {
                            id,
                            completed,
                            total,
                        })
                        .ok();
                    report.records.push(record);
                }
                Err(error) => {
                    let completed = self.progress.record(true);
                    tracing::error!(record_id = %id, error = %error, "error fetching record");
                    self.event_tx
                        .send(Event::RecordFailed {
                            id,
                            error: error.to_string(),
                            completed,
                            total,
                        })
                        .ok();
                    report.failures.push(RecordFailure { id, error });
                }
            }
        }

        self.progress.set_state(OrchestratorState::Done);
        let succeeded = report.records.len() as u64;
        let failed = report.failures.len() as u64;
        tracing::info!(succeeded, failed, total, "batch finished");
        self.event_tx.send(Event::Finished { succeeded, failed }).ok();

        Ok(report)
    }
}
