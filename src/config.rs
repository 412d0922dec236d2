use envconfig::Envconfig;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Envconfig, Clone)]
pub struct Config {
    /// Server bind address
    #[envconfig(from = "BIND_ADDR", default = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// Redis connection URL
    #[envconfig(from = "REDIS_URL", default = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// How long to wait for the initial Redis connection
    #[envconfig(from = "REDIS_CONNECT_TIMEOUT_SECS", default = "5")]
    pub redis_connect_timeout_secs: u64,

    /// Shop host, e.g. `my-store.myshopify.com`
    #[envconfig(from = "SHOPIFY_SHOP")]
    pub shop: String,

    /// Admin API access token
    #[envconfig(from = "SHOPIFY_TOKEN")]
    pub access_token: String,

    #[envconfig(from = "SHOPIFY_API_VERSION", default = "2024-01")]
    pub api_version: String,

    /// Full GraphQL endpoint, overrides the one derived from the shop
    #[envconfig(from = "UPSTREAM_ENDPOINT")]
    pub upstream_endpoint: Option<String>,

    /// Attempts per upstream query, including the first one
    #[envconfig(from = "UPSTREAM_MAX_ATTEMPTS", default = "5")]
    pub upstream_max_attempts: u32,

    /// Ceiling for the backoff used when the upstream gives no retry-after
    #[envconfig(from = "UPSTREAM_MAX_BACKOFF_SECS", default = "30")]
    pub upstream_max_backoff_secs: u64,

    /// Cache entry lifetime in seconds
    #[envconfig(from = "CACHE_TTL", default = "300")]
    pub cache_ttl_secs: u64,

    #[envconfig(from = "DEFAULT_PAGE_LIMIT", default = "10")]
    pub default_page_limit: u32,

    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envconfig::Error> {
        Config::init_from_env()
    }

    pub fn graphql_endpoint(&self) -> String {
        match &self.upstream_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!(
                "https://{}/admin/api/{}/graphql.json",
                self.shop, self.api_version
            ),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn redis_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.redis_connect_timeout_secs)
    }

    pub fn upstream_max_backoff(&self) -> Duration {
        Duration::from_secs(self.upstream_max_backoff_secs)
    }
}
