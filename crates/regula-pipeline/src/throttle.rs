//! Request pacing
//!
//! A single worker keeps the simple "pause before each task" behaviour. With
//! more than one worker, a per-worker pause would multiply the request rate,
//! so all workers share one token bucket instead.

use crate::PipelineConfig;
use governor::{Quota, RateLimiter};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

type SharedLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Pacing applied to external calls
#[derive(Clone)]
pub enum Throttle {
    /// No pacing
    Unthrottled,

    /// Sleep once before each task's first call
    PerTask(Duration),

    /// Token bucket shared by every worker, awaited before every call
    Shared(Arc<SharedLimiter>),
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Throttle::Unthrottled => write!(f, "Unthrottled"),
            Throttle::PerTask(delay) => f.debug_tuple("PerTask").field(delay).finish(),
            Throttle::Shared(_) => write!(f, "Shared(..)"),
        }
    }
}

impl Throttle {
    /// Pick the pacing for a configuration
    ///
    /// - `requests_per_minute` set: shared bucket with that quota
    /// - one worker with a delay: per-task pause
    /// - several workers with a delay: shared bucket releasing one call per delay
    /// - otherwise: unthrottled
    pub fn from_config(config: &PipelineConfig) -> Self {
        if let Some(rpm) = config.requests_per_minute.and_then(NonZeroU32::new) {
            return Self::per_minute(rpm);
        }

        let delay = config.request_delay();
        if delay.is_zero() {
            return Throttle::Unthrottled;
        }
        if config.concurrency <= 1 {
            return Throttle::PerTask(delay);
        }
        match Quota::with_period(delay) {
            Some(quota) => Throttle::Shared(Arc::new(RateLimiter::direct(quota))),
            None => Throttle::Unthrottled,
        }
    }

    /// Shared bucket allowing `rpm` calls per minute
    pub fn per_minute(rpm: NonZeroU32) -> Self {
        Throttle::Shared(Arc::new(RateLimiter::direct(Quota::per_minute(rpm))))
    }

    /// Wait applied once per task, before its first call
    pub async fn before_task(&self) {
        if let Throttle::PerTask(delay) = self {
            tokio::time::sleep(*delay).await;
        }
    }

    /// Wait applied before every call
    pub async fn before_call(&self) {
        if let Throttle::Shared(limiter) = self {
            limiter.until_ready().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn config(concurrency: usize, delay_ms: u64, rpm: Option<u32>) -> PipelineConfig {
        PipelineConfig {
            concurrency,
            request_delay_ms: delay_ms,
            requests_per_minute: rpm,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_selection() {
        assert!(matches!(
            Throttle::from_config(&config(3, 0, None)),
            Throttle::Unthrottled
        ));
        assert!(matches!(
            Throttle::from_config(&config(1, 5000, None)),
            Throttle::PerTask(d) if d == Duration::from_secs(5)
        ));
        assert!(matches!(
            Throttle::from_config(&config(4, 5000, None)),
            Throttle::Shared(_)
        ));
        assert!(matches!(
            Throttle::from_config(&config(1, 0, Some(15))),
            Throttle::Shared(_)
        ));
    }

    #[tokio::test]
    async fn test_shared_limiter_spaces_calls() {
        let throttle = Throttle::from_config(&config(2, 20, None));
        let started = Instant::now();

        throttle.before_call().await;
        throttle.before_call().await;
        throttle.before_call().await;

        // First call is free, the next two wait one period each
        assert!(started.elapsed() >= Duration::from_millis(35));
    }

    #[tokio::test]
    async fn test_per_task_only_waits_before_task() {
        let throttle = Throttle::PerTask(Duration::from_millis(200));
        let started = Instant::now();

        throttle.before_call().await;
        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
