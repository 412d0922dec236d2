use std::sync::Arc;
use tracing::debug;

use crate::cache::Cache;
use crate::error::Result;
use crate::keys::CacheKey;
use crate::product::{CatalogPage, Product};
use crate::upstream::UpstreamClient;

/// Cache-aside reads over the upstream catalog.
///
/// Concurrent misses for the same key may both reach the upstream; the last
/// cache write wins. Missing products are never cached.
#[derive(Clone)]
pub struct CatalogService {
    upstream: Arc<UpstreamClient>,
    cache: Cache,
}

impl CatalogService {
    pub fn new(upstream: Arc<UpstreamClient>, cache: Cache) -> Self {
        Self { upstream, cache }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub async fn get_page(&self, limit: u32, cursor: Option<&str>) -> Result<CatalogPage> {
        let cursor = cursor.filter(|c| !c.is_empty());
        let key = CacheKey::page(limit, cursor).to_string();

        if let Some(page) = self.cache.get::<CatalogPage>(&key).await {
            debug!(key = %key, "Cache hit");
            return Ok(page);
        }

        debug!(key = %key, "Cache miss, querying upstream");
        let connection = self.upstream.fetch_products(limit, cursor).await?;
        let page = CatalogPage::from_connection(connection);

        self.cache.set(&key, &page).await;
        Ok(page)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Product>> {
        let key = CacheKey::product(id).to_string();

        if let Some(product) = self.cache.get::<Product>(&key).await {
            debug!(key = %key, "Cache hit");
            return Ok(Some(product));
        }

        debug!(key = %key, "Cache miss, querying upstream");
        let Some(node) = self.upstream.fetch_product(id).await? else {
            return Ok(None);
        };

        let product = Product::from_node(node);
        self.cache.set(&key, &product).await;
        Ok(Some(product))
    }
}
