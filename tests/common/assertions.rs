//! Custom test assertions for integration tests

use inies_dl::Event;
use std::time::Duration;
use tokio::sync::broadcast;

/// Collect events until `Finished` arrives or `timeout` elapses
pub async fn collect_until_finished(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
) -> Vec<Event> {
    let mut collected = Vec::new();

    let _ = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let finished = matches!(event, Event::Finished { .. });
                    collected.push(event);
                    if finished {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    })
    .await;

    collected
}

/// Index of `column` in a CSV header row
///
/// # Panics
/// When the column is absent.
pub fn column_index(headers: &csv::StringRecord, column: &str) -> usize {
    headers
        .iter()
        .position(|h| h == column)
        .unwrap_or_else(|| panic!("missing column {column}"))
}
