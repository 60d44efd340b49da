//! Postgres-backed catalog

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use uuid::Uuid;
use crate::domain::aggregates::{Category, Order, OrderLine, Product, ProductDocument, Sale, ShippingAddress};
use crate::domain::value_objects::Money;
use super::{validate_all, Catalog, CatalogError, RELATED_LIMIT};

const PRODUCT_COLUMNS: &str = "id, name, slug, price, discount, stock, images, category_ids, description, video_url";
const ORDER_COLUMNS: &str = "id, order_number, checkout_session_id, payment_intent_id, gateway_customer_id, customer_name, \
    external_user_id, email, phone, currency, amount_discount, products, total_price, status, order_date, shipping_address";

#[derive(Clone)]
pub struct PgCatalog {
    db: PgPool,
}

impl PgCatalog {
    pub fn new(db: PgPool) -> Self { Self { db } }

    /// Connects and applies pending migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, CatalogError> {
        let db = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;
        Ok(Self::new(db))
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, order_number: String, checkout_session_id: String, payment_intent_id: Option<String>,
    gateway_customer_id: Option<String>, customer_name: String, external_user_id: String, email: String,
    phone: String, currency: String, amount_discount: Decimal, products: Json<Vec<OrderLine>>,
    total_price: Decimal, status: String, order_date: DateTime<Utc>, shipping_address: Option<Json<ShippingAddress>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = CatalogError;
    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status = r.status.parse().map_err(|e: crate::domain::aggregates::OrderError| CatalogError::InvalidOrder(e.to_string()))?;
        Ok(Order {
            id: r.id, order_number: r.order_number, checkout_session_id: r.checkout_session_id,
            payment_intent_id: r.payment_intent_id, gateway_customer_id: r.gateway_customer_id,
            customer_name: r.customer_name, external_user_id: r.external_user_id, email: r.email, phone: r.phone,
            currency: r.currency, amount_discount: Money::new(r.amount_discount), products: r.products.0,
            total_price: Money::new(r.total_price), status, order_date: r.order_date,
            shipping_address: r.shipping_address.map(|a| a.0),
        })
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn product(&self, id: &str) -> Result<Option<Product>, CatalogError> {
        let doc = sqlx::query_as::<_, ProductDocument>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id).fetch_optional(&self.db).await?;
        Ok(doc.map(Product::try_from).transpose()?)
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, CatalogError> {
        let doc = sqlx::query_as::<_, ProductDocument>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1 ORDER BY name ASC LIMIT 1"))
            .bind(slug).fetch_optional(&self.db).await?;
        Ok(doc.map(Product::try_from).transpose()?)
    }

    async fn related_products(&self, product_id: &str, category_ids: &[String]) -> Result<Vec<Product>, CatalogError> {
        let docs = sqlx::query_as::<_, ProductDocument>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id <> $1 AND stock > 0 AND category_ids && $2 ORDER BY name ASC LIMIT $3"))
            .bind(product_id).bind(category_ids).bind(RELATED_LIMIT as i64)
            .fetch_all(&self.db).await?;
        Ok(validate_all(docs))
    }

    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(sqlx::query_as::<_, Category>("SELECT id, name, slug, description FROM categories ORDER BY name ASC").fetch_all(&self.db).await?)
    }

    async fn set_stock(&self, product_id: &str, stock: u32) -> Result<(), CatalogError> {
        let stock = i32::try_from(stock).unwrap_or(i32::MAX);
        let result = sqlx::query("UPDATE products SET stock = $2 WHERE id = $1").bind(product_id).bind(stock).execute(&self.db).await?;
        if result.rows_affected() == 0 { return Err(CatalogError::NotFound(format!("product {product_id}"))); }
        Ok(())
    }

    async fn create_order(&self, o: &Order) -> Result<(), CatalogError> {
        sqlx::query(&format!("INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"))
            .bind(o.id).bind(&o.order_number).bind(&o.checkout_session_id).bind(&o.payment_intent_id)
            .bind(&o.gateway_customer_id).bind(&o.customer_name).bind(&o.external_user_id).bind(&o.email)
            .bind(&o.phone).bind(&o.currency).bind(o.amount_discount.amount()).bind(Json(&o.products))
            .bind(o.total_price.amount()).bind(o.status.to_string()).bind(o.order_date)
            .bind(o.shipping_address.as_ref().map(Json))
            .execute(&self.db).await
            .map_err(|e| {
                if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                    CatalogError::DuplicateOrder(o.checkout_session_id.clone())
                } else {
                    CatalogError::Database(e)
                }
            })?;
        Ok(())
    }

    async fn order_by_session(&self, checkout_session_id: &str) -> Result<Option<Order>, CatalogError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE checkout_session_id = $1"))
            .bind(checkout_session_id).fetch_optional(&self.db).await?;
        row.map(Order::try_from).transpose()
    }

    async fn orders_for_user(&self, external_user_id: &str) -> Result<Vec<Order>, CatalogError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE external_user_id = $1 ORDER BY order_date DESC"))
            .bind(external_user_id).fetch_all(&self.db).await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn active_sale_by_coupon(&self, coupon_code: &str) -> Result<Option<Sale>, CatalogError> {
        Ok(sqlx::query_as::<_, Sale>(
            "SELECT id, title, description, discount_amount, coupon_code, valid_from, valid_until, is_active FROM sales \
             WHERE is_active AND coupon_code = $1 AND valid_from <= NOW() AND (valid_until IS NULL OR valid_until >= NOW()) \
             ORDER BY valid_from DESC LIMIT 1")
            .bind(coupon_code).fetch_optional(&self.db).await?)
    }
}
