use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::{extract::Request, response::IntoResponse};

use super::chain::{Flow, Stage};
use crate::error::ApiError;

/// Token bucket shared by every request that passes through it.
///
/// Starts full. Tokens refill continuously at `refill_per_sec` up to `capacity`;
/// each admitted request takes one whole token.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self::starting_at(capacity, refill_per_sec, Instant::now())
    }

    fn starting_at(capacity: u32, refill_per_sec: f64, now: Instant) -> Self {
        Self {
            capacity: f64::from(capacity),
            refill_per_sec: refill_per_sec.max(0.0),
            state: Mutex::new(BucketState {
                tokens: f64::from(capacity),
                last: now,
            }),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    /// Take one token if available
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        // A poisoned lock only means another thread panicked mid-update;
        // the counters are still usable
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(state.last).as_secs_f64();
        if elapsed > 0.0 {
            state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
            state.last = now;
        }

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Middleware stage rejecting requests with 429 once the bucket is empty
#[derive(Debug, Clone)]
pub struct RateLimiter {
    bucket: Arc<TokenBucket>,
}

impl RateLimiter {
    pub fn new(bucket: Arc<TokenBucket>) -> Self {
        Self { bucket }
    }

    pub fn with_limits(capacity: u32, refill_per_sec: f64) -> Self {
        Self::new(Arc::new(TokenBucket::new(capacity, refill_per_sec)))
    }
}

impl Stage for RateLimiter {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn apply(&self, _request: &mut Request) -> Flow {
        if self.bucket.try_acquire() {
            Flow::Continue
        } else {
            tracing::warn!("Rate limit exceeded");
            Flow::Respond(ApiError::too_many_requests("Too many requests").into_response())
        }
    }
}
