//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{Money, ProductId};

/// Validated catalog product. Read-only to the storefront apart from `stock`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl Product {
    /// Price after the discount percentage, if any.
    pub fn effective_price(&self) -> Option<Money> {
        let price = self.price?;
        Some(match self.discount {
            Some(d) if d > Decimal::ZERO => price.discounted(d),
            _ => price,
        })
    }

    pub fn is_in_stock(&self) -> bool { self.stock > 0 }
    pub fn primary_image(&self) -> Option<&str> { self.images.first().map(String::as_str) }
}

/// Raw product shape as stored in the catalog, before validation.
#[derive(Clone, Debug, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductDocument {
    pub id: String,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub stock: Option<i32>,
    pub images: Vec<String>,
    pub category_ids: Vec<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
}

impl TryFrom<ProductDocument> for Product {
    type Error = ProductError;

    fn try_from(doc: ProductDocument) -> Result<Self, Self::Error> {
        let name = doc.name.filter(|n| !n.trim().is_empty()).ok_or_else(|| ProductError::MissingName(doc.id.clone()))?;
        if let Some(price) = doc.price {
            if price.is_sign_negative() { return Err(ProductError::NegativePrice(doc.id)); }
        }
        if let Some(discount) = doc.discount {
            if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
                return Err(ProductError::DiscountOutOfRange(doc.id, discount));
            }
        }
        let stock = match doc.stock {
            None => 0,
            Some(s) => u32::try_from(s).map_err(|_| ProductError::NegativeStock(doc.id.clone(), s))?,
        };
        Ok(Self {
            id: ProductId::new(doc.id),
            slug: doc.slug.unwrap_or_default(),
            name,
            price: doc.price.map(Money::new),
            discount: doc.discount,
            stock,
            images: doc.images,
            categories: doc.category_ids,
            description: doc.description,
            video_url: doc.video_url,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Coupon-driven sale configured in the catalog.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sale {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub discount_amount: Decimal,
    pub coupon_code: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Sale {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.valid_from <= now && self.valid_until.map_or(true, |until| until >= now)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProductError {
    #[error("product {0} has no name")]
    MissingName(String),
    #[error("product {0} has a negative price")]
    NegativePrice(String),
    #[error("product {0} has discount {1} outside 0..=100")]
    DiscountOutOfRange(String, Decimal),
    #[error("product {0} has negative stock {1}")]
    NegativeStock(String, i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> ProductDocument {
        ProductDocument {
            id: "prod-1".into(),
            name: Some("Desk Lamp".into()),
            slug: Some("desk-lamp".into()),
            price: Some(Decimal::new(4000, 2)),
            stock: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_document() {
        let p = Product::try_from(doc()).unwrap();
        assert_eq!(p.name, "Desk Lamp");
        assert_eq!(p.stock, 7);
        assert_eq!(p.effective_price().unwrap().amount(), Decimal::new(40, 0));
    }

    #[test]
    fn test_effective_price_with_discount() {
        let p = Product::try_from(ProductDocument { discount: Some(Decimal::new(10, 0)), ..doc() }).unwrap();
        assert_eq!(p.effective_price().unwrap().amount(), Decimal::new(36, 0));
    }

    #[test]
    fn test_missing_stock_defaults_to_zero() {
        let p = Product::try_from(ProductDocument { stock: None, ..doc() }).unwrap();
        assert_eq!(p.stock, 0);
        assert!(!p.is_in_stock());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(Product::try_from(ProductDocument { name: None, ..doc() }), Err(ProductError::MissingName(_))));
        assert!(matches!(Product::try_from(ProductDocument { price: Some(Decimal::new(-1, 0)), ..doc() }), Err(ProductError::NegativePrice(_))));
        assert!(matches!(Product::try_from(ProductDocument { discount: Some(Decimal::new(101, 0)), ..doc() }), Err(ProductError::DiscountOutOfRange(..))));
        assert!(matches!(Product::try_from(ProductDocument { stock: Some(-3), ..doc() }), Err(ProductError::NegativeStock(..))));
    }

    #[test]
    fn test_sale_window() {
        let now = Utc::now();
        let sale = Sale {
            id: "sale-1".into(), title: "Spring".into(), description: None, discount_amount: Decimal::new(15, 0),
            coupon_code: "SPRING".into(), valid_from: now - chrono::Duration::days(1), valid_until: None, is_active: true,
        };
        assert!(sale.is_active_at(now));
        assert!(!Sale { valid_until: Some(now - chrono::Duration::hours(1)), ..sale.clone() }.is_active_at(now));
        assert!(!Sale { is_active: false, ..sale }.is_active_at(now));
    }
}
