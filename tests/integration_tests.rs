use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use catalog_proxy::{
    cache::{Cache, MemoryStore},
    config::Config,
    server::Server,
    stats::StatsCollector,
    upstream::{ScriptedTransport, TransportResponse},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use envconfig::Envconfig;

fn test_config(extra: &[(&str, &str)]) -> Config {
    let mut vars = HashMap::from([
        ("SHOPIFY_SHOP".to_string(), "test-shop.myshopify.com".to_string()),
        ("SHOPIFY_TOKEN".to_string(), "shpat_test".to_string()),
    ]);
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::init_from_hashmap(&vars).unwrap()
}

struct TestApp {
    router: Router,
    transport: ScriptedTransport,
    store: MemoryStore,
    stats: StatsCollector,
}

fn test_app_with(extra: &[(&str, &str)]) -> TestApp {
    let config = test_config(extra);
    let transport = ScriptedTransport::new();
    let store = MemoryStore::new();
    let stats = StatsCollector::new();
    let cache = Cache::new(Arc::new(store.clone()), Duration::from_secs(300));

    let server = Server::with_parts(&config, Arc::new(transport.clone()), cache, stats.clone());

    TestApp {
        router: server.router(),
        transport,
        store,
        stats,
    }
}

fn test_app() -> TestApp {
    test_app_with(&[])
}

async fn get(router: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, headers, body)
}

fn product_node(n: usize) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{}", n),
        "title": format!("Product {}", n),
        "createdAt": "2024-01-01T00:00:00Z",
        "variants": {
            "edges": [{ "node": { "price": "19.99", "inventoryQuantity": 7 } }]
        }
    })
}

fn products_page(count: usize, next: Option<&str>) -> Value {
    let edges: Vec<Value> = (1..=count)
        .map(|n| json!({ "cursor": format!("c{}", n), "node": product_node(n) }))
        .collect();

    json!({
        "data": {
            "products": {
                "pageInfo": {
                    "hasNextPage": next.is_some(),
                    "endCursor": next,
                },
                "edges": edges
            }
        },
        "extensions": {
            "cost": {
                "requestedQueryCost": 12,
                "actualQueryCost": 12,
                "throttleStatus": {
                    "maximumAvailable": 1000.0,
                    "currentlyAvailable": 988.0,
                    "restoreRate": 50.0
                }
            }
        }
    })
}

#[tokio::test]
async fn test_list_products_sets_next_page_header() {
    let app = test_app();
    app.transport.push_json(products_page(5, Some("abc")));

    let (status, headers, body) = get(&app.router, "/products?limit=5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-next-page").unwrap(), "abc");

    let products = body.as_array().unwrap();
    assert_eq!(products.len(), 5);
    assert_eq!(products[0]["id"], "gid://shopify/Product/1");
    assert_eq!(products[0]["price"], 19.99);
    assert_eq!(products[0]["inventory"], 7);
    assert_eq!(products[0]["created_at"], "2024-01-01T00:00:00Z");

    let requests = app.transport.requests();
    assert_eq!(requests[0].variables["first"], 5);
}

#[tokio::test]
async fn test_last_page_has_no_next_page_header() {
    let app = test_app();
    app.transport.push_json(products_page(2, None));

    let (status, headers, body) = get(&app.router, "/products?cursor=abc").await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.get("x-next-page").is_none());
    assert_eq!(body.as_array().unwrap().len(), 2);

    let requests = app.transport.requests();
    assert_eq!(requests[0].variables["first"], 10);
    assert_eq!(requests[0].variables["after"], "abc");
}

#[tokio::test]
async fn test_warm_cache_skips_upstream() {
    let app = test_app();
    app.transport.push_json(products_page(3, Some("next")));

    let (first_status, first_headers, first_body) = get(&app.router, "/products?limit=3").await;
    let (second_status, second_headers, second_body) = get(&app.router, "/products?limit=3").await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first_body, second_body);
    assert_eq!(second_headers.get("x-next-page"), first_headers.get("x-next-page"));
    assert_eq!(app.transport.call_count(), 1);
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn test_get_product_by_id_with_slashes() {
    let app = test_app();
    app.transport.push_json(json!({ "data": { "product": product_node(42) } }));

    let (status, _, body) = get(&app.router, "/products/gid://shopify/Product/42").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "gid://shopify/Product/42");
    assert_eq!(body["title"], "Product 42");

    let requests = app.transport.requests();
    assert_eq!(requests[0].variables["id"], "gid://shopify/Product/42");
}

#[tokio::test]
async fn test_missing_product_is_404_and_not_cached() {
    let app = test_app();
    app.transport.push_json(json!({ "data": { "product": null } }));
    app.transport.push_json(json!({ "data": { "product": null } }));

    let (status, _, body) = get(&app.router, "/products/xyz").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Product not found" }));

    let (status, _, _) = get(&app.router, "/products/xyz").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.transport.call_count(), 2);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_invalid_limit_is_rejected() {
    let app = test_app();

    for uri in ["/products?limit=0", "/products?limit=abc", "/products?limit=251"] {
        let (status, _, body) = get(&app.router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string());
    }

    assert_eq!(app.transport.call_count(), 0);
}

#[tokio::test]
async fn test_upstream_error_is_500() {
    let app = test_app();
    app.transport
        .push(TransportResponse::status(StatusCode::BAD_GATEWAY, "bad gateway"));

    let (status, _, body) = get(&app.router, "/products").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_graphql_errors_are_500() {
    let app = test_app();
    app.transport
        .push_json(json!({ "errors": [{ "message": "Field 'foo' doesn't exist" }] }));

    let (status, _, _) = get(&app.router, "/products/1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test(start_paused = true)]
async fn test_throttled_upstream_recovers() {
    let app = test_app();
    app.transport.push(TransportResponse::throttled(Some("2")));
    app.transport.push_json(products_page(1, None));

    let (status, _, body) = get(&app.router, "/products").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(app.transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_throttled_exhaustion_is_503() {
    let app = test_app_with(&[("UPSTREAM_MAX_ATTEMPTS", "3")]);
    for _ in 0..3 {
        app.transport.push(TransportResponse::throttled(Some("1")));
    }

    let (status, _, body) = get(&app.router, "/products").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
    assert_eq!(app.transport.call_count(), 3);
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let (status, _, body) = get(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_index_lists_endpoints() {
    let app = test_app();

    let (status, _, body) = get(&app.router, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"].is_object());
}

#[tokio::test]
async fn test_unknown_route_envelope() {
    let app = test_app();

    let (status, _, body) = get(&app.router, "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert!(body["message"].as_str().unwrap().contains("/nope"));
    assert_eq!(body["availableEndpoints"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_api_stats_counts_calls() {
    let app = test_app();
    app.transport.push_json(products_page(1, None));

    get(&app.router, "/products").await;
    get(&app.router, "/products").await;
    get(&app.router, "/health").await;

    let (status, _, body) = get(&app.router, "/api-stats").await;

    assert_eq!(status, StatusCode::OK);
    // the stats request itself is recorded after its body is built
    assert_eq!(body["total_endpoint_calls"], 3);
    assert_eq!(body["total_shopify_api_calls"], 1);
    assert!(body["endpoint_response_times_ms"]["average"].is_u64());
    assert!(body["average_shopify_call_responsetime_ms"].is_u64());

    assert_eq!(app.stats.snapshot().await.total_inbound, 4);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = test_app();

    let (_, headers, _) = get(&app.router, "/health").await;
    assert!(headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn test_unusable_cursor_is_an_error() {
    let app = test_app();
    app.transport.push_json(products_page(2, Some("bad\ncursor")));

    let (status, headers, body) = get(&app.router, "/products").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(headers.get("x-next-page").is_none());
    assert_eq!(body["error"], "Internal server error");
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_upstream_failure_is_logged_once() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("catalog_proxy=error")
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = test_app();
    app.transport
        .push(TransportResponse::status(StatusCode::BAD_GATEWAY, "bad gateway"));

    let (status, _, _) = get(&app.router, "/products").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert_eq!(output.matches("ERROR").count(), 1, "{}", output);
}
