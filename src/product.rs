use serde::{Deserialize, Serialize};

use crate::upstream::types::{ProductConnection, ProductNode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub inventory: i64,
    pub created_at: String,
}

/// One page of the catalog. `next_page` is set only when more products exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

impl Product {
    /// Price and inventory come from the first variant only; a product without
    /// variants reports zero for both.
    pub fn from_node(node: ProductNode) -> Self {
        let variant = node
            .variants
            .and_then(|variants| variants.edges.into_iter().next())
            .map(|edge| edge.node);

        let (price, inventory) = match variant {
            Some(variant) => (
                parse_price(variant.price.as_deref()),
                variant.inventory_quantity.unwrap_or(0),
            ),
            None => (0.0, 0),
        };

        Self {
            id: node.id,
            title: node.title,
            price,
            inventory,
            created_at: node.created_at,
        }
    }
}

impl CatalogPage {
    pub fn from_connection(connection: ProductConnection) -> Self {
        let next_page = if connection.page_info.has_next_page {
            connection.page_info.end_cursor.filter(|cursor| !cursor.is_empty())
        } else {
            None
        };

        Self {
            products: connection
                .edges
                .into_iter()
                .map(|edge| Product::from_node(edge.node))
                .collect(),
            next_page,
        }
    }
}

fn parse_price(raw: Option<&str>) -> f64 {
    raw.and_then(|price| price.trim().parse::<f64>().ok())
        .filter(|price| price.is_finite() && *price >= 0.0)
        .unwrap_or(0.0)
}
