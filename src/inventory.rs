//! Stock Updater
//!
//! Read-modify-write against the catalog with no concurrency control:
//! concurrent purchases of one product can race, and the result is clamped
//! at zero rather than going negative.

use tracing::{error, info};
use crate::catalog::{Catalog, CatalogError};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::ProductId;
use crate::messaging::EventPublisher;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub previous: u32,
    pub current: u32,
}

/// Computes `max(0, current - quantity)` and writes it back.
pub async fn decrement_stock(catalog: &dyn Catalog, product_id: &str, quantity: u32) -> Result<StockAdjustment, CatalogError> {
    let product = catalog.product(product_id).await?.ok_or_else(|| CatalogError::NotFound(format!("product {product_id}")))?;
    let current = product.stock.saturating_sub(quantity);
    catalog.set_stock(product_id, current).await?;
    Ok(StockAdjustment { product_id: product.id, previous: product.stock, current })
}

/// Never fails past this boundary: callers must check the returned flag.
pub async fn update_product_stock(catalog: &dyn Catalog, events: &EventPublisher, product_id: &str, quantity: u32) -> bool {
    match decrement_stock(catalog, product_id, quantity).await {
        Ok(adj) => {
            info!(product_id, previous = adj.previous, current = adj.current, "stock updated");
            events.publish(&DomainEvent::Product(ProductEvent::StockAdjusted {
                product_id: adj.product_id, previous: adj.previous, current: adj.current,
            })).await;
            true
        }
        Err(e) => {
            error!(product_id, quantity, error = %e, "error updating product stock");
            false
        }
    }
}
