use std::time::Duration;

use crate::is_ci;

/// Default request timeout.
pub const REQUEST_DEFAULT_SECS: u64 = 5;
pub const REQUEST_CI_SECS: u64 = 20;

/// Deadline used to provoke `DeadlineExceeded`.
pub const SHORT_DEADLINE_MILLIS: u64 = 100;

/// How long a deadline may overshoot before a test calls it unbounded.
pub const DEADLINE_SLACK_SECS: u64 = 2;

/// Get request timeout based on environment.
pub fn request() -> Duration {
    if is_ci() {
        Duration::from_secs(REQUEST_CI_SECS)
    } else {
        Duration::from_secs(REQUEST_DEFAULT_SECS)
    }
}

/// Get the short deadline.
pub fn short_deadline() -> Duration {
    Duration::from_millis(SHORT_DEADLINE_MILLIS)
}

/// Get the allowed overshoot past a deadline.
pub fn deadline_slack() -> Duration {
    Duration::from_secs(DEADLINE_SLACK_SECS)
}
