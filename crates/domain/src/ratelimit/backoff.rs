use std::time::Duration;

/// Cap on any single backoff sleep.
const MAX_BACKOFF_SECS: u64 = 60;

/// Exponential backoff for 429 retries without an advertised reset:
/// `min(2^attempt, 60)` seconds, attempt counted from zero.
pub fn backoff_delay(attempt: u32) -> Duration {
    let secs = 2u64
        .checked_pow(attempt)
        .unwrap_or(MAX_BACKOFF_SECS)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}
