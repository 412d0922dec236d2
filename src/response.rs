use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stats::{LatencySummary, StatsSnapshot};

pub const AVAILABLE_ENDPOINTS: [&str; 4] = [
    "GET /products",
    "GET /products/:id",
    "GET /api-stats",
    "GET /health",
];

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Body of `GET /api-stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStats {
    pub endpoint_response_times_ms: LatencySummary,
    pub total_endpoint_calls: u64,
    pub average_shopify_call_responsetime_ms: u64,
    pub total_shopify_api_calls: u64,
}

impl From<StatsSnapshot> for ApiStats {
    fn from(snapshot: StatsSnapshot) -> Self {
        Self {
            endpoint_response_times_ms: snapshot.inbound,
            total_endpoint_calls: snapshot.total_inbound,
            average_shopify_call_responsetime_ms: snapshot.upstream.average,
            total_shopify_api_calls: snapshot.total_upstream,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

impl ServiceInfo {
    pub fn describe() -> Self {
        let endpoints = BTreeMap::from([
            ("GET /products", "List products (query params: limit, cursor)"),
            ("GET /products/:id", "Get single product by ID"),
            ("GET /api-stats", "Get API statistics"),
            ("GET /health", "Health check"),
        ]);

        Self {
            message: "Product catalog proxy".to_string(),
            endpoints,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundResponse {
    pub error: String,
    pub message: String,
    pub available_endpoints: Vec<&'static str>,
}

impl NotFoundResponse {
    pub fn for_route(method: &str, path: &str) -> Self {
        Self {
            error: "Not Found".to_string(),
            message: format!("Cannot {} {}", method, path),
            available_endpoints: AVAILABLE_ENDPOINTS.to_vec(),
        }
    }
}
