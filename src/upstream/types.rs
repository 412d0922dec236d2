//! Wire types for the upstream GraphQL API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
    pub variables: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
    pub extensions: Option<ResponseExtensions>,
}

impl<T> GraphQlResponse<T> {
    pub fn cost(&self) -> Option<&QueryCost> {
        self.extensions.as_ref().and_then(|ext| ext.cost.as_ref())
    }

    /// The upstream also reports throttling as a 200 with a `THROTTLED` error.
    pub fn is_throttled(&self) -> bool {
        self.errors.iter().any(GraphQlError::is_throttled)
    }

    pub fn error_messages(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphQlError {
    pub fn is_throttled(&self) -> bool {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
            == Some("THROTTLED")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseExtensions {
    pub cost: Option<QueryCost>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCost {
    #[serde(default)]
    pub requested_query_cost: Option<f64>,
    #[serde(default)]
    pub actual_query_cost: Option<f64>,
    #[serde(default)]
    pub throttle_status: Option<ThrottleStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleStatus {
    pub maximum_available: f64,
    pub currently_available: f64,
    pub restore_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    pub title: String,
    pub created_at: String,
    #[serde(default)]
    pub variants: Option<Connection<VariantNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub price: Option<String>,
    pub inventory_quantity: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductConnection {
    pub page_info: PageInfo,
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<ProductNode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductsData {
    pub products: ProductConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductData {
    pub product: Option<ProductNode>,
}
