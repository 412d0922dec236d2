use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::catalog::CatalogService;
use crate::error::{ErrorResponse, ProxyError};
use crate::response::{ApiStats, HealthResponse, NotFoundResponse, ServiceInfo};
use crate::stats::StatsCollector;
use crate::validation::{ProductsQuery, RequestValidator};

pub const NEXT_PAGE_HEADER: &str = "x-next-page";

/// Shared application state
pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub catalog: CatalogService,
    pub stats: StatsCollector,
    pub default_page_limit: u32,
}

/// List one page of products; the continuation cursor goes in `X-Next-Page`
pub async fn list_products(
    State(state): State<SharedState>,
    query: Result<Query<ProductsQuery>, QueryRejection>,
) -> Result<Response, ProxyError> {
    let Query(query) = query.map_err(|e| ProxyError::InvalidRequest(e.body_text()))?;
    RequestValidator::validate_products_query(&query)?;

    let page = state
        .catalog
        .get_page(query.limit_or(state.default_page_limit), query.cursor())
        .await?;

    let next_page = page
        .next_page
        .as_deref()
        .map(HeaderValue::from_str)
        .transpose()
        .map_err(|_| ProxyError::InternalError("Upstream cursor is not a valid header value".to_string()))?;

    let mut response = Json(page.products).into_response();
    if let Some(value) = next_page {
        response.headers_mut().insert(NEXT_PAGE_HEADER, value);
    }

    Ok(response)
}

/// Fetch one product by id; ids may contain `/`
pub async fn get_product(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ProxyError> {
    let id = RequestValidator::validate_product_id(id.trim_start_matches('/'))?;

    let product = state
        .catalog
        .get_by_id(id)
        .await?;

    Ok(match product {
        Some(product) => Json(product).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Product not found")),
        )
            .into_response(),
    })
}

pub async fn api_stats(State(state): State<SharedState>) -> Json<ApiStats> {
    Json(ApiStats::from(state.stats.snapshot().await))
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo::describe())
}

pub async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse::for_route(method.as_str(), uri.path())),
    )
}
