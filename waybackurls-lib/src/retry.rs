//! Retry policy for requests against the CDX index.

use std::time::Duration;

use http::StatusCode;

use crate::{ErrorKind, Result};

/// Default number of attempts per domain before giving up, 1000.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;
/// Default base wait time in seconds between attempts, 1.
pub const DEFAULT_RETRY_WAIT_TIME_SECS: u64 = 1;

/// An extension trait to help determine if a failed request
/// is worth another attempt.
///
/// Inspired by `Retryable` from
/// [reqwest-middleware](https://github.com/TrueLayer/reqwest-middleware/blob/f854725791ccf4a02c401a26cab3d9db753f468c/reqwest-retry/src/retryable.rs)
pub(crate) trait RetryExt {
    fn should_retry(&self) -> bool;
}

impl RetryExt for StatusCode {
    /// Server errors and rate limiting are transient, every other
    /// unsuccessful status is final.
    fn should_retry(&self) -> bool {
        self.is_server_error() || *self == StatusCode::TOO_MANY_REQUESTS
    }
}

impl RetryExt for ErrorKind {
    fn should_retry(&self) -> bool {
        match self {
            // Connection problems, timeouts and truncated bodies all count as
            // transient for the CDX index, which is known to drop connections
            // under load.
            Self::NetworkRequest(_) | Self::ReadResponseBody(_) => true,
            Self::RejectedStatusCode(status) => status.should_retry(),
            _ => false,
        }
    }
}

/// The result of a single fetch attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The full response body
    Success(String),
    /// A failure that might go away on its own
    Retryable(ErrorKind),
    /// A failure that another attempt won't fix
    Fatal(ErrorKind),
}

impl AttemptOutcome {
    /// Sort a failed attempt into retryable or fatal
    #[must_use]
    pub(crate) fn from_error(error: ErrorKind) -> Self {
        if error.should_retry() {
            Self::Retryable(error)
        } else {
            Self::Fatal(error)
        }
    }
}

/// How often to try and how long to wait in between.
///
/// The wait before attempt `n + 1` is `base_delay * n²`, i.e. 1s, 4s, 9s, ...
/// with the default base of one second. This starts gently and gets steep
/// fast, which suits a service that just answered with 429.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Allow up to `max_attempts` attempts with the default base delay
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidMaxAttempts`] if `max_attempts` is zero.
    pub const fn new(max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(ErrorKind::InvalidMaxAttempts);
        }
        Ok(Self {
            max_attempts,
            base_delay: Duration::from_secs(DEFAULT_RETRY_WAIT_TIME_SECS),
        })
    }

    /// Replace the base delay of the backoff schedule
    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Upper bound of attempts, always at least 1
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Time to wait after the failed attempt number `attempt` (1-based)
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(attempt.saturating_mul(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(DEFAULT_RETRY_WAIT_TIME_SECS),
        }
    }
}
