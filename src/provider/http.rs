//! Shared HTTP client and status mapping for reasoning providers.

use std::sync::OnceLock;

use crate::error::ProbeError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> ProbeError {
    match status {
        401 | 403 => ProbeError::Authentication(body.to_string()),
        429 => ProbeError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        400 if body.contains("API_KEY_INVALID") => ProbeError::Authentication(body.to_string()),
        _ => ProbeError::api(status, body),
    }
}

/// Gemini reports `retryDelay` as e.g. `"12s"` inside `error.details`.
fn extract_retry_after(body: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/details")?
        .as_array()?
        .iter()
        .find_map(|detail| detail.get("retryDelay")?.as_str())
        .and_then(|delay| delay.trim_end_matches('s').parse::<f64>().ok())
        .map(|seconds| (seconds * 1000.0) as u64)
}
