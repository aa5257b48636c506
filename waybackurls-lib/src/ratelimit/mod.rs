//! Adaptive rate limiting for requests against the CDX index.
//!
//! A single [`RateController`] is shared by everything that talks to the
//! index. It starts at one request per second and can only become slower
//! during a run: the server tells us through `Retry-After` and
//! remaining-quota headers when to back off, and we never speed up again on
//! our own.

mod headers;

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use http::HeaderMap;
use log::info;
use tokio::sync::Mutex;

use crate::{ErrorKind, Result};

/// Default interval between two requests, i.e. one request per second
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Interval used once the server reports an (almost) exhausted quota
pub const LOW_QUOTA_INTERVAL: Duration = Duration::from_secs(5);

/// Token bucket for one interval. Both fields are only ever replaced
/// together.
#[derive(Debug)]
struct RateState {
    interval: Duration,
    limiter: DefaultDirectRateLimiter,
}

impl RateState {
    fn new(interval: Duration) -> Result<Self> {
        let quota = Quota::with_period(interval)
            .ok_or(ErrorKind::ZeroRequestInterval)?
            .allow_burst(NonZeroU32::MIN);
        Ok(Self {
            interval,
            limiter: RateLimiter::direct(quota),
        })
    }

    /// Switch to a slower interval. Returns `false` if `interval` is not
    /// slower than the current one.
    fn tighten(&mut self, interval: Duration) -> bool {
        if interval <= self.interval {
            return false;
        }
        let Ok(state) = Self::new(interval) else {
            return false;
        };
        // The fresh bucket starts full; drain it so the next request waits
        // one whole new interval.
        let _ = state.limiter.check();
        *self = state;
        true
    }
}

/// Shared, mutable rate limiter for the CDX index.
///
/// Acquiring a slot and adjusting the rate go through the same lock, so an
/// adjustment can never get lost between reading the current rate and
/// waiting on it. Waiting callers are served in FIFO order.
#[derive(Debug)]
pub struct RateController {
    state: Mutex<RateState>,
}

impl RateController {
    /// Create a controller allowing one request per `interval`
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ZeroRequestInterval`] if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self> {
        Ok(Self {
            state: Mutex::new(RateState::new(interval)?),
        })
    }

    /// Wait until the current rate allows the next request
    pub async fn acquire(&self) {
        let state = self.state.lock().await;
        state.limiter.until_ready().await;
    }

    /// The current interval between two requests
    pub async fn interval(&self) -> Duration {
        self.state.lock().await.interval
    }

    /// Slow down according to the rate limit headers of a response.
    ///
    /// - A valid `Retry-After` larger than the current interval becomes the
    ///   new interval, capped at one day. A valid `Retry-After` ends the
    ///   evaluation, even if it was not larger.
    /// - Otherwise, a remaining quota of 0 or 1 slows down to
    ///   [`LOW_QUOTA_INTERVAL`] unless we are already slower.
    ///
    /// Returns the new interval if it changed.
    pub async fn adjust_from_headers(&self, headers: &HeaderMap) -> Option<Duration> {
        let mut state = self.state.lock().await;

        if let Some(retry_after) = headers::retry_after(headers) {
            if state.tighten(retry_after) {
                info!("Rate limit adjusted to 1 request every {retry_after:?}");
                return Some(retry_after);
            }
            return None;
        }

        let remaining = headers::remaining_quota(headers)?;
        if remaining > 1 || !state.tighten(LOW_QUOTA_INTERVAL) {
            return None;
        }
        if remaining == 0 {
            info!("Rate limit exceeded, slowing down to 1 request every {LOW_QUOTA_INTERVAL:?}");
        } else {
            info!("Rate limit nearly exceeded, slowing down to 1 request every {LOW_QUOTA_INTERVAL:?}");
        }
        Some(LOW_QUOTA_INTERVAL)
    }
}

impl Default for RateController {
    fn default() -> Self {
        Self {
            state: Mutex::new(RateState {
                interval: DEFAULT_REQUEST_INTERVAL,
                limiter: RateLimiter::direct(Quota::per_second(NonZeroU32::MIN)),
            }),
        }
    }
}
