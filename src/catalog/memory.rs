//! In-process catalog used for local development and tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use crate::domain::aggregates::{Category, Order, Product, ProductDocument, Sale};
use super::{validate_all, Catalog, CatalogError, RELATED_LIMIT};

#[derive(Default)]
struct State {
    products: HashMap<String, ProductDocument>,
    categories: Vec<Category>,
    sales: Vec<Sale>,
    orders: Vec<Order>,
}

#[derive(Default)]
pub struct MemoryCatalog {
    state: RwLock<State>,
}

impl MemoryCatalog {
    pub fn new() -> Self { Self::default() }

    pub async fn insert_product(&self, doc: ProductDocument) {
        self.state.write().await.products.insert(doc.id.clone(), doc);
    }

    pub async fn insert_category(&self, category: Category) {
        self.state.write().await.categories.push(category);
    }

    pub async fn insert_sale(&self, sale: Sale) {
        self.state.write().await.sales.push(sale);
    }

    /// Raw stored stock, bypassing validation.
    pub async fn stock_of(&self, product_id: &str) -> Option<i32> {
        self.state.read().await.products.get(product_id).and_then(|d| d.stock)
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.orders.clone()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn product(&self, id: &str) -> Result<Option<Product>, CatalogError> {
        let doc = self.state.read().await.products.get(id).cloned();
        Ok(doc.map(Product::try_from).transpose()?)
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, CatalogError> {
        let state = self.state.read().await;
        let mut matches: Vec<_> = state.products.values().filter(|d| d.slug.as_deref() == Some(slug)).cloned().collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches.into_iter().next().map(Product::try_from).transpose()?)
    }

    async fn related_products(&self, product_id: &str, category_ids: &[String]) -> Result<Vec<Product>, CatalogError> {
        let docs: Vec<_> = self.state.read().await.products.values()
            .filter(|d| d.id != product_id && d.stock.unwrap_or(0) > 0)
            .filter(|d| d.category_ids.iter().any(|c| category_ids.contains(c)))
            .cloned()
            .collect();
        let mut related = validate_all(docs);
        related.sort_by(|a, b| a.name.cmp(&b.name));
        related.truncate(RELATED_LIMIT);
        Ok(related)
    }

    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        let mut categories = self.state.read().await.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn set_stock(&self, product_id: &str, stock: u32) -> Result<(), CatalogError> {
        let mut state = self.state.write().await;
        let doc = state.products.get_mut(product_id).ok_or_else(|| CatalogError::NotFound(format!("product {product_id}")))?;
        doc.stock = Some(i32::try_from(stock).unwrap_or(i32::MAX));
        Ok(())
    }

    async fn create_order(&self, order: &Order) -> Result<(), CatalogError> {
        let mut state = self.state.write().await;
        if state.orders.iter().any(|o| o.checkout_session_id == order.checkout_session_id) {
            return Err(CatalogError::DuplicateOrder(order.checkout_session_id.clone()));
        }
        state.orders.push(order.clone());
        Ok(())
    }

    async fn order_by_session(&self, checkout_session_id: &str) -> Result<Option<Order>, CatalogError> {
        Ok(self.state.read().await.orders.iter().find(|o| o.checkout_session_id == checkout_session_id).cloned())
    }

    async fn orders_for_user(&self, external_user_id: &str) -> Result<Vec<Order>, CatalogError> {
        let mut orders: Vec<_> = self.state.read().await.orders.iter()
            .filter(|o| o.external_user_id == external_user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    async fn active_sale_by_coupon(&self, coupon_code: &str) -> Result<Option<Sale>, CatalogError> {
        let now = Utc::now();
        Ok(self.state.read().await.sales.iter()
            .filter(|s| s.coupon_code == coupon_code && s.is_active_at(now))
            .max_by_key(|s| s.valid_from)
            .cloned())
    }
}
