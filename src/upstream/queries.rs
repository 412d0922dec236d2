//! GraphQL documents sent to the product API. Only the first variant of each
//! product is requested since that is the only one the catalog reads.

pub const PRODUCTS_QUERY: &str = r#"
query getProducts($first: Int!, $after: String) {
  products(first: $first, after: $after, sortKey: TITLE) {
    pageInfo {
      hasNextPage
      endCursor
    }
    edges {
      node {
        id
        title
        createdAt
        variants(first: 1) {
          edges {
            node {
              price
              inventoryQuantity
            }
          }
        }
      }
    }
  }
}
"#;

pub const PRODUCT_QUERY: &str = r#"
query getProduct($id: ID!) {
  product(id: $id) {
    id
    title
    createdAt
    variants(first: 1) {
      edges {
        node {
          price
          inventoryQuantity
        }
      }
    }
  }
}
"#;
