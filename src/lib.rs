//! Storefront backend
//!
//! Checkout, payment webhooks and order fulfillment for a small online shop.
//!
//! ## Features
//! - Client cart and wishlist state with durable local persistence
//! - Hosted checkout sessions validated against live catalog stock
//! - Signed webhook handling that decrements stock and records paid orders
//! - Catalog reads: products, related products, categories, orders, sales

pub mod api;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod fulfillment;
pub mod inventory;
pub mod messaging;
pub mod payments;
pub mod store;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] payments::GatewayError),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
