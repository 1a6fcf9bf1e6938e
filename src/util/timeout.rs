//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::ProbeError;

/// Wrap a future with a timeout, mapping expiry to [`ProbeError::Timeout`].
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, ProbeError>>,
) -> Result<T, ProbeError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(duration.as_millis() as u64)),
    }
}

/// Like [`with_timeout`] but against an absolute deadline shared by several steps.
pub async fn with_deadline<T>(
    deadline: tokio::time::Instant,
    budget: Duration,
    future: impl Future<Output = Result<T, ProbeError>>,
) -> Result<T, ProbeError> {
    match tokio::time::timeout_at(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(budget.as_millis() as u64)),
    }
}
