//! Thin HTTP client for the catalog proxy's public API.

use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::handlers::NEXT_PAGE_HEADER;
use crate::product::{CatalogPage, Product};
use crate::response::ApiStats;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

pub struct CatalogSdk {
    client: reqwest::Client,
    base_url: Url,
}

impl CatalogSdk {
    pub fn new(base_url: &str) -> Result<Self, SdkError> {
        let base_url = Url::parse(base_url).map_err(|e| SdkError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(SdkError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, SdkError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SdkError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SdkError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(SdkError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Fetches one page; the continuation cursor is read from `X-Next-Page`.
    pub async fn get_products(&self, limit: Option<u32>, cursor: Option<&str>) -> Result<CatalogPage, SdkError> {
        let mut request = self.client.get(self.url(&["products"])?);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit.to_string())]);
        }
        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = Self::check(request.send().await?).await?;
        let next_page = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let products: Vec<Product> = response.json().await?;

        Ok(CatalogPage { products, next_page })
    }

    /// `None` when the proxy answers 404
    pub async fn get_product_by_id(&self, id: &str) -> Result<Option<Product>, SdkError> {
        let response = self.client.get(self.url(&["products", id])?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let product = Self::check(response).await?.json().await?;
        Ok(Some(product))
    }

    pub async fn get_stats(&self) -> Result<ApiStats, SdkError> {
        let response = self.client.get(self.url(&["api-stats"])?).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_is_one_segment() {
        let sdk = CatalogSdk::new("http://localhost:3000").unwrap();
        let url = sdk.url(&["products", "gid://shopify/Product/1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/products/gid:%2F%2Fshopify%2FProduct%2F1"
        );
    }

    #[test]
    fn test_base_path_is_kept() {
        let sdk = CatalogSdk::new("http://localhost:3000/catalog/").unwrap();
        let url = sdk.url(&["api-stats"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/catalog/api-stats");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(CatalogSdk::new("not a url"), Err(SdkError::InvalidUrl(_))));
        assert!(matches!(CatalogSdk::new("mailto:someone@example.com"), Err(SdkError::InvalidUrl(_))));
    }
}
