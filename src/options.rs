use std::collections::HashSet;
use std::time::Duration;

/// Configures retry behavior for a client.
///
/// Options are an immutable value: [`crate::HttpClient::with_options`]
/// produces a new client rather than mutating one in place, so in-flight
/// calls never observe a reconfiguration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Status-based retry policy.
    pub retry: RetryPolicy,
}

/// Status-based retry policy with exponential backoff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Master switch; when false no response is ever retried.
    pub enabled: bool,
    /// Response status codes considered transient.
    pub retriable_codes: HashSet<u16>,
    /// Maximum number of additional attempts after the first.
    pub retry_count: u32,
    /// Backoff before the first retry; doubles for each retry after.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            retriable_codes: [408, 500, 502, 503, 504].into(),
            retry_count: 5,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn is_retriable(&self, status: u16) -> bool {
        self.retriable_codes.contains(&status)
    }

    /// Backoff before the retry that follows `completed` finished attempts.
    ///
    /// The shift is capped so large attempt counts saturate instead of
    /// overflowing.
    pub(crate) fn backoff_for(&self, completed: u32) -> Duration {
        let exp = completed.min(16);
        self.initial_backoff.saturating_mul(1u32 << exp)
    }
}
