use crate::cache::Cache;
use crate::catalog::CatalogService;
use crate::config::Config;
use crate::config_validator::ConfigValidator;
use crate::error::Result;
use crate::handlers::{api_stats, get_product, health_check, index, list_products, not_found, AppState, SharedState};
use crate::middleware::{logging_middleware, stats_middleware};
use crate::rate_limiter::RateLimiter;
use crate::redis_store::RedisStore;
use crate::stats::StatsCollector;
use crate::upstream::{HttpTransport, RetryPolicy, Transport, UpstreamClient};
use axum::routing::get;
use axum::{middleware, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the HTTP router around an already wired application state
pub fn create_app(state: SharedState) -> Router {
    let stats = state.stats.clone();

    Router::new()
        .route("/", get(index))
        .route("/products", get(list_products))
        .route("/products/*id", get(get_product))
        .route("/api-stats", get(api_stats))
        .route("/health", get(health_check))
        .fallback(not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware))
                .layer(middleware::from_fn_with_state(stats, stats_middleware)),
        )
}

pub struct Server {
    app: Router,
    bind_addr: SocketAddr,
    cache: Cache,
}

impl Server {
    /// Wires the service from configuration, connecting to Redis and the
    /// product API
    pub async fn build(config: Config) -> Result<Self> {
        ConfigValidator::validate_config(&config)?;

        let store = RedisStore::connect(&config.redis_url, config.redis_connect_timeout()).await;
        let cache = Cache::new(Arc::new(store), config.cache_ttl());
        let transport = HttpTransport::new(config.graphql_endpoint(), &config.access_token)?;
        tracing::info!(endpoint = transport.endpoint(), "Product API client ready");

        Ok(Self::with_parts(&config, Arc::new(transport), cache, StatsCollector::new()))
    }

    /// Wires the service from explicit collaborators
    pub fn with_parts(
        config: &Config,
        transport: Arc<dyn Transport>,
        cache: Cache,
        stats: StatsCollector,
    ) -> Self {
        let retry = RetryPolicy::new(config.upstream_max_attempts, config.upstream_max_backoff());
        let upstream = UpstreamClient::new(transport, RateLimiter::default(), stats.clone(), retry);
        let catalog = CatalogService::new(Arc::new(upstream), cache.clone());

        let state = Arc::new(AppState {
            catalog,
            stats,
            default_page_limit: config.default_page_limit,
        });

        Self {
            app: create_app(state),
            bind_addr: config.bind_addr,
            cache,
        }
    }

    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves, then
    /// closes the cache connection
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Catalog proxy listening on {}", listener.local_addr()?);
        tracing::info!("Health check available at /health");
        if !self.cache.is_connected().await {
            tracing::warn!("Cache store is not connected, every request goes to the product API");
        }

        axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        self.cache.close().await;
        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
