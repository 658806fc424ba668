//! Request pacing for external lookups.
//!
//! Adapters hold an `Arc<dyn Throttle>` and await [`Throttle::acquire`] before
//! each outbound call, so the pacing policy is chosen by whoever wires the
//! adapter rather than hard-coded next to the request.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[async_trait::async_trait]
pub trait Throttle: Send + Sync {
    /// Wait until one more request may be issued.
    async fn acquire(&self);
}

/// Sleeps a fixed amount before every request.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl Throttle for FixedDelay {
    async fn acquire(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// Token bucket: up to `capacity` requests may go out back to back, after
/// which one token is restored every `refill_every`.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_every: Duration,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_every: Duration) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            capacity,
            refill_every,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        if self.refill_every.is_zero() {
            state.tokens = self.capacity;
        } else {
            let elapsed = now.saturating_duration_since(state.last_refill);
            let gained = elapsed.as_secs_f64() / self.refill_every.as_secs_f64();
            state.tokens = (state.tokens + gained).min(self.capacity);
        }
        state.last_refill = now;
    }
}

#[async_trait::async_trait]
impl Throttle for TokenBucket {
    async fn acquire(&self) {
        let mut state = self.state.lock().await;
        loop {
            self.refill(&mut state, Instant::now());
            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return;
            }
            let missing = 1.0 - state.tokens;
            let wait = self.refill_every.mul_f64(missing);
            tokio::time::sleep(wait).await;
        }
    }
}

/// Builds the throttle named in settings ("token_bucket" or "fixed").
pub fn from_settings(
    kind: Option<&str>,
    interval: Duration,
    burst: u32,
) -> anyhow::Result<Arc<dyn Throttle>> {
    match kind.unwrap_or("token_bucket") {
        "token_bucket" => Ok(Arc::new(TokenBucket::new(burst, interval))),
        "fixed" => Ok(Arc::new(FixedDelay::new(interval))),
        other => anyhow::bail!("Unknown throttle type: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bucket_allows_burst_then_spaces_requests() {
        let bucket = TokenBucket::new(2, Duration::from_secs(3));
        let start = Instant::now();

        bucket.acquire().await;
        bucket.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(10));

        bucket.acquire().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(4), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_refills_bucket() {
        let bucket = TokenBucket::new(1, Duration::from_secs(3));
        bucket.acquire().await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        let start = Instant::now();
        bucket.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_delay_sleeps_every_time() {
        let throttle = FixedDelay::new(Duration::from_secs(1));
        let start = Instant::now();
        throttle.acquire().await;
        throttle.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[test]
    fn unknown_throttle_kind_is_rejected() {
        assert!(from_settings(Some("leaky"), Duration::from_secs(1), 1).is_err());
        assert!(from_settings(None, Duration::from_secs(1), 1).is_ok());
    }
}
