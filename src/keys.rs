//! Cache key generation for catalog reads.

use std::fmt;

const PRODUCTS_PREFIX: &str = "products";
const PRODUCT_PREFIX: &str = "product";
const FIRST_PAGE: &str = "first";

/// Deterministic key for one cached catalog read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey<'a> {
    /// `products:<limit>:<cursor-or-"first">`
    ProductPage { limit: u32, cursor: Option<&'a str> },
    /// `product:<id>`
    Product { id: &'a str },
}

impl<'a> CacheKey<'a> {
    pub fn page(limit: u32, cursor: Option<&'a str>) -> Self {
        CacheKey::ProductPage {
            limit,
            cursor: cursor.filter(|c| !c.is_empty()),
        }
    }

    pub fn product(id: &'a str) -> Self {
        CacheKey::Product { id }
    }
}

impl fmt::Display for CacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::ProductPage { limit, cursor } => write!(
                f,
                "{}:{}:{}",
                PRODUCTS_PREFIX,
                limit,
                cursor.unwrap_or(FIRST_PAGE)
            ),
            CacheKey::Product { id } => write!(f, "{}:{}", PRODUCT_PREFIX, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_key() {
        assert_eq!(CacheKey::page(10, None).to_string(), "products:10:first");
    }

    #[test]
    fn test_cursor_page_key() {
        assert_eq!(CacheKey::page(5, Some("eyJsYXN0X2lkIjo0fQ")).to_string(), "products:5:eyJsYXN0X2lkIjo0fQ");
    }

    #[test]
    fn test_empty_cursor_is_first_page() {
        assert_eq!(CacheKey::page(10, Some("")), CacheKey::page(10, None));
    }

    #[test]
    fn test_product_key() {
        assert_eq!(
            CacheKey::product("gid://shopify/Product/42").to_string(),
            "product:gid://shopify/Product/42"
        );
    }
}
