use crate::error::ProxyError;
use serde::Deserialize;
use validator::Validate;

const MAX_ID_LENGTH: usize = 256;

/// Query string of `GET /products`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProductsQuery {
    #[validate(range(min = 1, max = 250, message = "limit must be between 1 and 250"))]
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl ProductsQuery {
    pub fn limit_or(&self, default: u32) -> u32 {
        self.limit.unwrap_or(default)
    }

    /// An empty `cursor=` means the first page.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Request validation utilities
pub struct RequestValidator;

impl RequestValidator {
    pub fn validate_products_query(query: &ProductsQuery) -> Result<(), ProxyError> {
        query.validate()?;
        Ok(())
    }

    /// Validates a product id taken from the path and returns it trimmed
    pub fn validate_product_id(id: &str) -> Result<&str, ProxyError> {
        let id = id.trim();

        if id.is_empty() {
            return Err(ProxyError::ValidationError(
                "Product id cannot be empty".to_string(),
            ));
        }

        if id.len() > MAX_ID_LENGTH {
            return Err(ProxyError::ValidationError(format!(
                "Product id cannot be longer than {} bytes",
                MAX_ID_LENGTH
            )));
        }

        if id.chars().any(char::is_control) {
            return Err(ProxyError::ValidationError(
                "Product id contains invalid characters".to_string(),
            ));
        }

        Ok(id)
    }
}
