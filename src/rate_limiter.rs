use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::ProxyError;
use crate::upstream::types::QueryCost;

pub const DEFAULT_AVAILABLE: f64 = 1000.0;
pub const DEFAULT_MAXIMUM: f64 = 1000.0;
pub const DEFAULT_RESTORE_RATE: f64 = 50.0;

/// Client-side estimate of the upstream query budget.
///
/// The estimate is advisory: the upstream enforces the real limit, this only
/// spaces out calls so fewer of them come back throttled.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    available: f64,
    maximum: f64,
    restore_rate: f64, // points per second
    last_update: Instant,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self::new(DEFAULT_AVAILABLE, DEFAULT_MAXIMUM, DEFAULT_RESTORE_RATE)
    }
}

impl RateLimitState {
    pub fn new(available: f64, maximum: f64, restore_rate: f64) -> Self {
        let maximum = maximum.max(0.0);
        Self {
            available: available.clamp(0.0, maximum),
            maximum,
            restore_rate,
            last_update: Instant::now(),
        }
    }

    pub fn available(&self) -> f64 {
        self.available
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    pub fn restore_rate(&self) -> f64 {
        self.restore_rate
    }

    fn restored_since_update(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_update);
        self.restore_rate.max(0.0) * elapsed.as_secs_f64()
    }

    /// Time to wait until at least one point is available, `None` when a call
    /// can go out right away.
    pub fn wait_time(&mut self, now: Instant) -> Option<Duration> {
        self.available = (self.available + self.restored_since_update(now)).min(self.maximum);
        self.last_update = now;

        if self.available >= 1.0 || self.restore_rate <= 0.0 {
            return None;
        }

        let wait_ms = ((1.0 - self.available) / self.restore_rate * 1000.0).ceil();
        Some(Duration::from_millis(wait_ms as u64))
    }

    /// Folds a server-reported throttle snapshot into the estimate and charges
    /// the call's actual cost. Without a snapshot only the charge applies.
    pub fn apply_cost(&mut self, cost: &QueryCost, now: Instant) {
        match &cost.throttle_status {
            Some(status) => {
                let restored = self.restored_since_update(now).floor();
                self.maximum = status.maximum_available.max(0.0);
                self.available = (status.currently_available + restored).clamp(0.0, self.maximum);
                self.restore_rate = status.restore_rate;
            }
            None => {
                self.available = (self.available + self.restored_since_update(now)).min(self.maximum);
            }
        }
        self.last_update = now;

        if let Some(actual) = cost.actual_query_cost {
            self.charge(actual);
        }
    }

    pub fn charge(&mut self, points: f64) {
        self.available = (self.available - points).max(0.0);
    }
}

/// Shared handle to the budget estimate. All reads and writes go through one
/// mutex; the guard is never held across an await point.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    state: Arc<Mutex<RateLimitState>>,
}

impl RateLimiter {
    pub fn new(state: RateLimitState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, RateLimitState>, ProxyError> {
        self.state
            .lock()
            .map_err(|_| ProxyError::InternalError("Failed to acquire rate limit state lock".to_string()))
    }

    pub fn wait_time(&self) -> Result<Option<Duration>, ProxyError> {
        Ok(self.lock()?.wait_time(Instant::now()))
    }

    /// Sleeps until the estimate has regenerated at least one point.
    pub async fn acquire(&self) -> Result<(), ProxyError> {
        if let Some(wait) = self.wait_time()? {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "Upstream budget exhausted, waiting");
            tokio::time::sleep(wait).await;
        }
        Ok(())
    }

    pub fn apply_cost(&self, cost: &QueryCost) -> Result<(), ProxyError> {
        self.lock()?.apply_cost(cost, Instant::now());
        Ok(())
    }

    pub fn snapshot(&self) -> Result<RateLimitState, ProxyError> {
        Ok(self.lock()?.clone())
    }
}
