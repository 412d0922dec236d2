pub mod cache;
pub mod catalog;
pub mod config;
pub mod config_validator;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod middleware;
pub mod product;
pub mod rate_limiter;
pub mod redis_store;
pub mod response;
pub mod sdk;
pub mod server;
pub mod stats;
pub mod upstream;
pub mod validation;

pub use cache::{Cache, CacheStore, MemoryStore};
pub use catalog::CatalogService;
pub use config::Config;
pub use error::{ProxyError, Result};
pub use product::{CatalogPage, Product};
pub use response::ApiStats;
pub use sdk::{CatalogSdk, SdkError};
pub use server::{create_app, Server};
pub use stats::StatsCollector;
