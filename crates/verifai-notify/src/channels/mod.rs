pub mod email;
pub mod webhook;

use std::time::Duration;

/// Attempts per recipient before giving up.
pub(crate) const MAX_ATTEMPTS: u32 = 3;

/// 100ms, 200ms between attempts.
pub(crate) fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(100 * 2u64.pow(attempt))
}
