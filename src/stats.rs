use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Samples kept per series; older samples are evicted first.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub average: u64,
    pub max: u64,
    pub min: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub inbound: LatencySummary,
    pub total_inbound: u64,
    pub upstream: LatencySummary,
    pub total_upstream: u64,
}

#[derive(Debug)]
struct LatencySeries {
    samples: VecDeque<u64>,
    capacity: usize,
    total: u64,
}

impl LatencySeries {
    fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    fn record(&mut self, latency_ms: u64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(latency_ms);
        self.total += 1;
    }

    fn summary(&self) -> LatencySummary {
        if self.samples.is_empty() {
            return LatencySummary::default();
        }

        let sum: u64 = self.samples.iter().sum();
        LatencySummary {
            average: (sum as f64 / self.samples.len() as f64).round() as u64,
            max: self.samples.iter().copied().max().unwrap_or_default(),
            min: self.samples.iter().copied().min().unwrap_or_default(),
        }
    }

    fn clear(&mut self) {
        self.samples.clear();
        self.total = 0;
    }
}

/// Rolling latency statistics for inbound requests and upstream calls.
///
/// Averages and extremes cover only the most recent samples of each series,
/// while the totals count every call recorded since start (or the last reset).
#[derive(Debug, Clone)]
pub struct StatsCollector {
    inbound: Arc<RwLock<LatencySeries>>,
    upstream: Arc<RwLock<LatencySeries>>,
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SAMPLE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inbound: Arc::new(RwLock::new(LatencySeries::new(capacity))),
            upstream: Arc::new(RwLock::new(LatencySeries::new(capacity))),
        }
    }

    pub async fn record_inbound(&self, latency_ms: u64) {
        self.inbound.write().await.record(latency_ms);
    }

    pub async fn record_upstream(&self, latency_ms: u64) {
        self.upstream.write().await.record(latency_ms);
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        let inbound = self.inbound.read().await;
        let upstream = self.upstream.read().await;

        StatsSnapshot {
            inbound: inbound.summary(),
            total_inbound: inbound.total,
            upstream: upstream.summary(),
            total_upstream: upstream.total,
        }
    }

    pub async fn inbound_samples(&self) -> Vec<u64> {
        self.inbound.read().await.samples.iter().copied().collect()
    }

    pub async fn upstream_samples(&self) -> Vec<u64> {
        self.upstream.read().await.samples.iter().copied().collect()
    }

    pub async fn reset(&self) {
        self.inbound.write().await.clear();
        self.upstream.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_snapshot_is_zero() {
        let stats = StatsCollector::new();
        assert_eq!(stats.snapshot().await, StatsSnapshot::default());
    }

    #[tokio::test]
    async fn test_series_is_bounded_and_ordered() {
        let stats = StatsCollector::new();
        for latency in 0..1500u64 {
            stats.record_inbound(latency).await;
        }

        let samples = stats.inbound_samples().await;
        assert_eq!(samples.len(), 1000);
        assert_eq!(samples.first(), Some(&500));
        assert_eq!(samples.last(), Some(&1499));
        assert!(samples.windows(2).all(|w| w[0] + 1 == w[1]));
    }

    #[tokio::test]
    async fn test_totals_ignore_truncation() {
        let stats = StatsCollector::with_capacity(3);
        for latency in [10, 20, 30, 40, 50] {
            stats.record_upstream(latency).await;
        }
        stats.record_inbound(7).await;

        let snapshot = stats.snapshot().await;
        assert_eq!(snapshot.total_upstream, 5);
        assert_eq!(snapshot.total_inbound, 1);
        assert_eq!(
            snapshot.upstream,
            LatencySummary { average: 40, max: 50, min: 30 }
        );
        assert_eq!(stats.upstream_samples().await, vec![30, 40, 50]);
    }

    #[tokio::test]
    async fn test_average_rounds_to_nearest() {
        let stats = StatsCollector::new();
        for latency in [1, 2] {
            stats.record_inbound(latency).await;
        }
        assert_eq!(stats.snapshot().await.inbound.average, 2);

        stats.record_inbound(1).await;
        // 4 / 3 = 1.33
        assert_eq!(stats.snapshot().await.inbound.average, 1);
    }

    #[tokio::test]
    async fn test_series_are_independent() {
        let stats = StatsCollector::new();
        stats.record_inbound(100).await;

        let snapshot = stats.snapshot().await;
        assert_eq!(snapshot.inbound.max, 100);
        assert_eq!(snapshot.upstream, LatencySummary::default());
        assert_eq!(snapshot.total_upstream, 0);
    }

    #[tokio::test]
    async fn test_reset() {
        let stats = StatsCollector::new();
        stats.record_inbound(5).await;
        stats.record_upstream(5).await;
        stats.reset().await;

        assert_eq!(stats.snapshot().await, StatsSnapshot::default());
        assert!(stats.inbound_samples().await.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let stats = StatsCollector::new();
        let handle = stats.clone();
        handle.record_upstream(12).await;
        assert_eq!(stats.snapshot().await.total_upstream, 1);
    }
}
