use std::{
    future::Future,
    time::{Duration, Instant},
};

use metrics::{counter, histogram};
use tracing::warn;

use super::error::ApiError;

/// Budget applied when no timeout is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

const TIMEOUT_COUNTER: &str = "postwire_fetch_timeout_total";
const FALLBACK_COUNTER: &str = "postwire_fetch_fallback_total";
const LATENCY_HISTOGRAM: &str = "postwire_fetch_ms";

/// Outcome of a read: either fresh data or the fallback that replaced a failure.
#[derive(Debug, Clone)]
pub enum Fetched<T> {
    Fresh(T),
    Fallback { value: T, error: ApiError },
}

impl<T> Fetched<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Fresh(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Fresh(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Fresh(_) => None,
            Self::Fallback { error, .. } => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Fresh(value) => Fetched::Fresh(f(value)),
            Self::Fallback { value, error } => Fetched::Fallback {
                value: f(value),
                error,
            },
        }
    }
}

/// Runs one timeout-bounded attempt per call.
///
/// Reads never fail: any error is replaced by a caller-built fallback. Writes
/// propagate every error unchanged. There are no retries.
#[derive(Debug, Clone, Copy)]
pub struct ResilientFetcher {
    budget: Duration,
}

impl Default for ResilientFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ResilientFetcher {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn with_budget(self, budget: Duration) -> Self {
        Self::new(budget)
    }

    /// Drive `fut` under the budget. On expiry the future is dropped, which
    /// cancels the underlying transport call, and `Timeout` is returned.
    pub async fn attempt<T, Fut>(&self, op: &'static str, fut: Fut) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.budget, fut).await;
        histogram!(LATENCY_HISTOGRAM, "op" => op).record(started.elapsed().as_secs_f64() * 1000.0);

        match outcome {
            Ok(result) => result,
            Err(_) => {
                counter!(TIMEOUT_COUNTER, "op" => op).increment(1);
                warn!(
                    target = "postwire::fetch",
                    op,
                    budget_ms = self.budget.as_millis() as u64,
                    "request exceeded timeout budget"
                );
                Err(ApiError::Timeout {
                    budget: self.budget,
                })
            }
        }
    }

    /// Read path: failures resolve to `fallback(&error)`.
    pub async fn read<T, Fut, F>(&self, op: &'static str, fut: Fut, fallback: F) -> Fetched<T>
    where
        Fut: Future<Output = Result<T, ApiError>>,
        F: FnOnce(&ApiError) -> T,
    {
        match self.attempt(op, fut).await {
            Ok(value) => Fetched::Fresh(value),
            Err(error) => {
                counter!(FALLBACK_COUNTER, "op" => op).increment(1);
                warn!(
                    target = "postwire::fetch",
                    op,
                    error = %error,
                    "read failed; serving fallback"
                );
                Fetched::Fallback {
                    value: fallback(&error),
                    error,
                }
            }
        }
    }

    /// Write path: errors reach the caller.
    pub async fn write<T, Fut>(&self, op: &'static str, fut: Fut) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.attempt(op, fut).await
    }
}
