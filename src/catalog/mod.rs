//! Remote catalog: products, categories, sales and orders.
//!
//! Product documents are validated into `Product` at this boundary; callers
//! never see the raw shape.

pub mod memory;
pub mod postgres;

pub use memory::MemoryCatalog;
pub use postgres::PgCatalog;

use async_trait::async_trait;
use crate::domain::aggregates::{Category, Order, Product, ProductDocument, ProductError, Sale};

/// Maximum number of related products returned for a product page.
pub const RELATED_LIMIT: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("invalid product: {0}")]
    InvalidProduct(#[from] ProductError),
    #[error("invalid order record: {0}")]
    InvalidOrder(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("order for checkout session {0} already exists")]
    DuplicateOrder(String),
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn product(&self, id: &str) -> Result<Option<Product>, CatalogError>;
    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, CatalogError>;
    /// In-stock products sharing a category with `product_id`, by name, at most `RELATED_LIMIT`.
    async fn related_products(&self, product_id: &str, category_ids: &[String]) -> Result<Vec<Product>, CatalogError>;
    async fn categories(&self) -> Result<Vec<Category>, CatalogError>;
    /// Fails with `NotFound` when the product does not exist.
    async fn set_stock(&self, product_id: &str, stock: u32) -> Result<(), CatalogError>;
    async fn create_order(&self, order: &Order) -> Result<(), CatalogError>;
    async fn order_by_session(&self, checkout_session_id: &str) -> Result<Option<Order>, CatalogError>;
    /// Newest first.
    async fn orders_for_user(&self, external_user_id: &str) -> Result<Vec<Order>, CatalogError>;
    async fn active_sale_by_coupon(&self, coupon_code: &str) -> Result<Option<Sale>, CatalogError>;
}

/// Validates a page of documents, skipping malformed ones.
pub(crate) fn validate_all(docs: Vec<ProductDocument>) -> Vec<Product> {
    docs.into_iter()
        .filter_map(|doc| match Product::try_from(doc) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed catalog product");
                None
            }
        })
        .collect()
}
