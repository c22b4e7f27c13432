use crate::modules::provider::traits::RateLimiterInfo;
use crate::shared::errors::AppError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

pub struct RateLimiter {
    last_request: Arc<Mutex<Instant>>,
    min_interval: Duration,
    requests_per_second: f64,
}

/// Default inter-request interval for a provider adapter that hasn't
/// overridden it (§4.1 "Per-provider rate limit").
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

impl RateLimiter {
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = Duration::from_secs_f64(1.0 / requests_per_second);
        Self {
            last_request: Arc::new(Mutex::new(Instant::now() - min_interval)),
            min_interval,
            requests_per_second,
        }
    }

    /// Construct from an explicit minimum interval rather than a rate,
    /// matching how §4.1 describes the per-adapter limiter.
    pub fn with_min_interval(min_interval: Duration) -> Self {
        let requests_per_second = if min_interval.is_zero() {
            f64::INFINITY
        } else {
            1.0 / min_interval.as_secs_f64()
        };
        Self {
            last_request: Arc::new(Mutex::new(Instant::now() - min_interval)),
            min_interval,
            requests_per_second,
        }
    }

    pub async fn wait(&self) -> Result<(), AppError> {
        let mut last = self.last_request.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(*last);

        if elapsed < self.min_interval {
            let wait_time = self.min_interval - elapsed;
            sleep(wait_time).await;
        }

        *last = Instant::now();
        Ok(())
    }

    /// Get rate limiter configuration info (single source of truth)
    pub fn get_info(&self) -> RateLimiterInfo {
        RateLimiterInfo::new(self.requests_per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;

    /// §8 scenario 6: two concurrent callers into the same adapter with
    /// min_interval=500ms; the second outbound request must begin at
    /// t >= 500ms after the first.
    #[tokio::test]
    async fn serializes_concurrent_callers() {
        let limiter = StdArc::new(RateLimiter::with_min_interval(Duration::from_millis(500)));
        let start = Instant::now();

        let l1 = limiter.clone();
        let first = tokio::spawn(async move {
            l1.wait().await.unwrap();
            start.elapsed()
        });
        let l2 = limiter.clone();
        let second = tokio::spawn(async move {
            l2.wait().await.unwrap();
            start.elapsed()
        });

        let (t1, t2) = (first.await.unwrap(), second.await.unwrap());
        let later = t1.max(t2);
        assert!(later >= Duration::from_millis(500));
    }
}
