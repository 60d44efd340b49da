//! Order Aggregate
//!
//! Orders are only ever created from a verified checkout-completed event.
//! Totals come from the gateway, never from the buyer's client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;
use crate::domain::value_objects::{Money, ProductId};

/// Buyer details attached to a checkout session and recovered by the webhook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutMetadata {
    #[validate(length(min = 1, message = "order number is required"))]
    pub order_number: String,
    #[validate(length(min = 1, message = "customer name is required"))]
    pub customer_name: String,
    #[validate(email(message = "customer email is invalid"))]
    pub customer_email: String,
    #[serde(default)]
    pub external_user_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Unique key of the line within the order
    pub key: String,
    pub product: ProductId,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(product: ProductId, quantity: u32) -> Self {
        Self { key: Uuid::new_v4().simple().to_string(), product, quantity }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Created, Paid, Shipped, Delivered }

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        })
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub checkout_session_id: String,
    pub payment_intent_id: Option<String>,
    pub gateway_customer_id: Option<String>,
    pub customer_name: String,
    pub external_user_id: String,
    pub email: String,
    pub phone: String,
    pub currency: String,
    pub amount_discount: Money,
    pub products: Vec<OrderLine>,
    pub total_price: Money,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub shipping_address: Option<ShippingAddress>,
}

impl Order {
    /// New paid order for a completed checkout session.
    pub fn paid(metadata: CheckoutMetadata, checkout_session_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            order_number: metadata.order_number,
            checkout_session_id: checkout_session_id.into(),
            payment_intent_id: None,
            gateway_customer_id: None,
            customer_name: metadata.customer_name,
            external_user_id: metadata.external_user_id,
            email: metadata.customer_email,
            phone: String::new(),
            currency: String::new(),
            amount_discount: Money::ZERO,
            products: vec![],
            total_price: Money::ZERO,
            status: OrderStatus::Paid,
            order_date: Utc::now(),
            shipping_address: None,
        }
    }

    pub fn item_count(&self) -> u32 { self.products.iter().map(|l| l.quantity).sum() }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("unknown order status '{0}'")]
    UnknownStatus(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> CheckoutMetadata {
        CheckoutMetadata {
            order_number: "ORD-1".into(), customer_name: "Ada".into(),
            customer_email: "ada@example.com".into(), external_user_id: "user_1".into(),
        }
    }

    #[test]
    fn test_paid_order_lines() {
        let mut order = Order::paid(metadata(), "cs_test_1");
        order.products.push(OrderLine::new(ProductId::new("P1"), 2));
        order.products.push(OrderLine::new(ProductId::new("P2"), 1));
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.item_count(), 3);
        assert_ne!(order.products[0].key, order.products[1].key);
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert_eq!("paid".parse::<OrderStatus>().unwrap(), OrderStatus::Paid);
        assert!("refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_metadata_validation() {
        assert!(metadata().validate().is_ok());
        let bad = CheckoutMetadata { customer_email: "not-an-email".into(), ..metadata() };
        assert!(bad.validate().is_err());
        let blank = CheckoutMetadata { order_number: String::new(), ..metadata() };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_metadata_wire_names() {
        let json = serde_json::to_value(metadata()).unwrap();
        assert_eq!(json["orderNumber"], "ORD-1");
        assert_eq!(json["externalUserId"], "user_1");
    }
}
