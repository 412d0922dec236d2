use crate::config::Config;
use crate::error::ProxyError;
use regex::Regex;

/// Largest page size the product API accepts.
pub const MAX_PAGE_LIMIT: u32 = 250;

/// Validates configuration objects for consistency and correctness
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a Redis URL
    pub fn validate_redis_url(url: &str) -> Result<(), ProxyError> {
        if url.is_empty() {
            return Err(ProxyError::ValidationError(
                "Redis URL cannot be empty".to_string(),
            ));
        }

        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(ProxyError::ValidationError(
                "Redis URL must start with 'redis://' or 'rediss://'".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates the shop host name (no scheme, no path)
    pub fn validate_shop(shop: &str) -> Result<(), ProxyError> {
        let host = Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)+(:\d{1,5})?$")
            .map_err(|e| ProxyError::InternalError(e.to_string()))?;

        if !host.is_match(shop) {
            return Err(ProxyError::ValidationError(format!(
                "Invalid shop host '{}', expected something like 'my-store.myshopify.com'",
                shop
            )));
        }

        Ok(())
    }

    pub fn validate_access_token(token: &str) -> Result<(), ProxyError> {
        if token.trim().is_empty() {
            return Err(ProxyError::ValidationError(
                "Access token cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates cache and retry parameters
    pub fn validate_limits(
        cache_ttl_secs: u64,
        max_attempts: u32,
        default_page_limit: u32,
    ) -> Result<(), ProxyError> {
        if cache_ttl_secs == 0 {
            return Err(ProxyError::ValidationError(
                "Cache TTL must be greater than 0".to_string(),
            ));
        }

        if max_attempts == 0 {
            return Err(ProxyError::ValidationError(
                "Upstream max attempts must be at least 1".to_string(),
            ));
        }

        if default_page_limit == 0 || default_page_limit > MAX_PAGE_LIMIT {
            return Err(ProxyError::ValidationError(format!(
                "Default page limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }

        Ok(())
    }

    pub fn validate_config(config: &Config) -> Result<(), ProxyError> {
        Self::validate_redis_url(&config.redis_url)?;
        if config.upstream_endpoint.is_none() {
            Self::validate_shop(&config.shop)?;
        }
        Self::validate_access_token(&config.access_token)?;
        Self::validate_limits(
            config.cache_ttl_secs,
            config.upstream_max_attempts,
            config.default_page_limit,
        )?;

        Ok(())
    }
}
