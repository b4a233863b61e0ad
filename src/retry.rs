//! Bounded retry with exponential backoff
//!
//! [`RetryExecutor`] wraps an async operation with two controls:
//! - a process-wide admission gate (a shared semaphore) capping in-flight attempts
//! - bounded exponential-backoff retry for transient failures
//!
//! Each attempt is classified into an [`AttemptOutcome`] and the loop matches on
//! that tag. A permit is held for the attempt *and* the backoff wait that
//! follows it, so a failing task keeps its slot while waiting to retry. This
//! caps retry storms at the cost of throughput when the remote is struggling.
//!
//! # Example
//!
//! ```no_run
//! use inies_dl::config::{ConcurrencyConfig, RetryConfig};
//! use inies_dl::retry::RetryExecutor;
//! use inies_dl::error::Error;
//!
//! # async fn example() -> Result<(), Error> {
//! let executor = RetryExecutor::new(&ConcurrencyConfig::default(), RetryConfig::default());
//! let value = executor
//!     .execute("example", 3, || async { Ok::<_, Error>(42) })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{ConcurrencyConfig, RetryConfig};
use crate::error::{AuthError, Error, TRANSIENT_STATUSES};
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (transport errors, gateway statuses) should return `true`.
/// Permanent failures (not found, forbidden) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Fetch(e) => e.is_transient(),
            // A refresh that never reached the server, or hit a gateway
            // status, can be tried again.
            Error::Auth(AuthError::Transport(_)) => true,
            Error::Auth(AuthError::Rejected { status, .. }) => TRANSIENT_STATUSES.contains(status),
            Error::Auth(_) => false,
            Error::MetadataLoad { .. } | Error::ShuttingDown => false,
            Error::Config { .. } | Error::InvalidDate(_) => false,
            Error::Io(_) | Error::Csv(_) | Error::Serialization(_) => false,
        }
    }
}

/// Tagged result of a single attempt
#[derive(Debug)]
pub enum AttemptOutcome<T, E> {
    /// The operation succeeded
    Success(T),
    /// The operation failed in a way another attempt may fix
    Retryable(E),
    /// The operation failed permanently
    Fatal(E),
}

impl<T, E: IsRetryable> AttemptOutcome<T, E> {
    /// Tag a plain result using the error's retryability
    pub fn classify(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => AttemptOutcome::Success(value),
            Err(e) if e.is_retryable() => AttemptOutcome::Retryable(e),
            Err(e) => AttemptOutcome::Fatal(e),
        }
    }
}

/// Admission-gated retry executor (cloneable - the permit pool is shared)
#[derive(Clone, Debug)]
pub struct RetryExecutor {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create an executor with its own permit pool
    pub fn new(concurrency: &ConcurrencyConfig, config: RetryConfig) -> Self {
        let max_concurrent = concurrency.max_concurrent_requests.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            config,
        }
    }

    /// Retry policy in use
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Size of the permit pool
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Permits not currently held by an attempt or its backoff wait
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Stop admitting attempts
    ///
    /// Operations waiting for a permit, and any started later, fail with
    /// [`Error::ShuttingDown`]. Attempts already holding a permit finish their
    /// current attempt and then stop.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Run `operation` up to `max_attempts` times
    ///
    /// `label` identifies the operation in log entries. Returns the first
    /// success, the first non-retryable error, or the last error once the
    /// attempts are spent. A `max_attempts` of zero is treated as one. Once the
    /// executor is closed, returns [`Error::ShuttingDown`] instead of starting
    /// another attempt.
    pub async fn execute<F, Fut, T, E>(
        &self,
        label: &str,
        max_attempts: u32,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: IsRetryable + std::fmt::Display + From<Error>,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt_index: u32 = 0;

        loop {
            let _permit = match self.permits.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!(
                        operation = label,
                        attempt = attempt_index + 1,
                        "executor closed, not starting attempt"
                    );
                    return Err(Error::ShuttingDown.into());
                }
            };

            match AttemptOutcome::classify(operation().await) {
                AttemptOutcome::Success(value) => {
                    if attempt_index > 0 {
                        tracing::info!(
                            operation = label,
                            attempts = attempt_index + 1,
                            "operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                AttemptOutcome::Retryable(e) if attempt_index + 1 < max_attempts => {
                    let delay = self.backoff(attempt_index);
                    tracing::warn!(
                        operation = label,
                        error = %e,
                        attempt = attempt_index + 2,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "operation failed, retrying"
                    );
                    // The permit stays held through the wait.
                    tokio::time::sleep(delay).await;
                    attempt_index += 1;
                }
                AttemptOutcome::Retryable(e) => {
                    tracing::error!(
                        operation = label,
                        error = %e,
                        attempts = attempt_index + 1,
                        "operation failed after all retry attempts exhausted"
                    );
                    return Err(e);
                }
                AttemptOutcome::Fatal(e) => {
                    tracing::error!(
                        operation = label,
                        error = %e,
                        attempt = attempt_index + 1,
                        "operation failed with non-retryable error"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Run `operation` with the configured attempt budget
    pub async fn run<F, Fut, T, E>(&self, label: &str, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: IsRetryable + std::fmt::Display + From<Error>,
    {
        self.execute(label, self.config.max_attempts, operation)
            .await
    }

    fn backoff(&self, attempt_index: u32) -> Duration {
        let delay = self.config.delay_for(attempt_index);
        if self.config.jitter {
            add_jitter(delay)
        } else {
            delay
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// The result lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
