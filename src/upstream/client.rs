use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ProxyError, Result};
use crate::rate_limiter::RateLimiter;
use crate::stats::StatsCollector;
use crate::upstream::queries::{PRODUCTS_QUERY, PRODUCT_QUERY};
use crate::upstream::transport::Transport;
use crate::upstream::types::{
    GraphQlRequest, GraphQlResponse, ProductConnection, ProductData, ProductNode, ProductsData,
};

const ERROR_BODY_LIMIT: usize = 512;

/// How throttled calls are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per query, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry when the upstream does not suggest one
    pub base_delay: Duration,
    /// Ceiling for the exponential fallback delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            max_delay,
            ..Self::default()
        }
    }

    /// Exponential fallback for the `retry`-th retry (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Server-suggested delay when it parses, otherwise the fallback.
    pub fn delay_for(&self, retry: u32, retry_after: Option<&str>) -> Duration {
        match retry_after {
            Some(value) => parse_retry_after(value).unwrap_or_else(|| {
                warn!(value, "Could not parse retry-after header, using default backoff");
                self.backoff(retry)
            }),
            None => self.backoff(retry),
        }
    }
}

/// Parses a `retry-after` value given in (possibly fractional) seconds.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds = value.trim().parse::<f64>().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}

/// GraphQL client for the product API that paces calls against the budget
/// estimate, retries throttled calls, and reports call latency.
pub struct UpstreamClient {
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    stats: StatsCollector,
    retry: RetryPolicy,
}

impl UpstreamClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: RateLimiter,
        stats: StatsCollector,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            limiter,
            stats,
            retry,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Runs one GraphQL query and returns its `data` block.
    pub async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let request = GraphQlRequest {
            query: query.to_string(),
            variables,
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.limiter.acquire().await?;

            let started = Instant::now();
            let response = self.transport.send(&request).await?;

            if response.status == StatusCode::TOO_MANY_REQUESTS {
                self.back_off(attempt, response.retry_after.as_deref()).await?;
                continue;
            }

            if !response.status.is_success() {
                return Err(ProxyError::UpstreamStatus {
                    status: response.status.as_u16(),
                    body: response.body.chars().take(ERROR_BODY_LIMIT).collect(),
                });
            }

            let latency_ms = started.elapsed().as_millis() as u64;
            let parsed: GraphQlResponse<T> = serde_json::from_str(&response.body)?;
            self.stats.record_upstream(latency_ms).await;

            if let Some(cost) = parsed.cost() {
                self.limiter.apply_cost(cost)?;
            }

            if parsed.is_throttled() {
                self.back_off(attempt, None).await?;
                continue;
            }

            let messages = parsed.error_messages();
            return match parsed.data {
                Some(data) => {
                    if !messages.is_empty() {
                        warn!(errors = %messages, "Upstream returned partial data with errors");
                    }
                    debug!(latency_ms, attempt, "Upstream query completed");
                    Ok(data)
                }
                None if messages.is_empty() => {
                    Err(ProxyError::GraphQl("Response contained no data".to_string()))
                }
                None => Err(ProxyError::GraphQl(messages)),
            };
        }
    }

    async fn back_off(&self, attempt: u32, retry_after: Option<&str>) -> Result<()> {
        if attempt >= self.retry.max_attempts {
            warn!(attempt, "Upstream still throttled, giving up");
            return Err(ProxyError::Throttled { attempts: attempt });
        }

        let delay = self.retry.delay_for(attempt, retry_after);
        warn!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Upstream throttled the request, retrying"
        );
        tokio::time::sleep(delay).await;
        Ok(())
    }

    pub async fn fetch_products(&self, limit: u32, cursor: Option<&str>) -> Result<ProductConnection> {
        let mut variables = json!({ "first": limit });
        if let Some(cursor) = cursor {
            variables["after"] = Value::String(cursor.to_string());
        }

        let data: ProductsData = self.query(PRODUCTS_QUERY, variables).await?;
        Ok(data.products)
    }

    pub async fn fetch_product(&self, id: &str) -> Result<Option<ProductNode>> {
        let data: ProductData = self.query(PRODUCT_QUERY, json!({ "id": id })).await?;
        Ok(data.product)
    }
}
