//! Payment gateway: hosted checkout sessions, completion events and
//! webhook signature verification.

pub mod memory;
pub mod signature;
pub mod stripe;

pub use memory::MemoryGateway;
pub use signature::{SignatureError, SIGNATURE_HEADER};
pub use stripe::StripeGateway;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use crate::domain::aggregates::CheckoutMetadata;
use crate::domain::value_objects::ProductId;

/// Event type emitted when a buyer finishes paying.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Countries shipping addresses may be collected for.
pub const ALLOWED_SHIPPING_COUNTRIES: [&str; 5] = ["US", "CA", "GB", "AU", "PK"];

/// Placeholder the gateway replaces with the real session id in the success URL.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("gateway response missing {0}")]
    Incomplete(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionLineItem {
    pub currency: String,
    /// Minor currency units
    pub unit_amount: i64,
    pub name: String,
    pub description: String,
    /// Carried in gateway-side product metadata and read back by the webhook.
    pub product_id: ProductId,
    pub image: Option<String>,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CustomerRef {
    Existing(String),
    /// Let the gateway create a customer for this email.
    Create { email: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutSessionRequest {
    pub customer: CustomerRef,
    pub metadata: CheckoutMetadata,
    pub line_items: Vec<SessionLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub allow_promotion_codes: bool,
    pub allowed_shipping_countries: Vec<String>,
    pub collect_phone_number: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// A purchased line of a completed session, mapped back to the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct PurchasedLine {
    pub product_id: Option<ProductId>,
    pub quantity: u32,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<String>, GatewayError>;
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession, GatewayError>;
    async fn list_line_items(&self, session_id: &str) -> Result<Vec<PurchasedLine>, GatewayError>;
}

/// Envelope of a webhook notification.
#[derive(Clone, Debug, Deserialize)]
pub struct GatewayEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// Checkout session object carried by a completion event.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CompletedSession {
    pub id: String,
    pub payment_intent: Option<String>,
    pub customer: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub currency: Option<String>,
    pub amount_total: Option<i64>,
    pub total_details: Option<TotalDetails>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub shipping_details: Option<ShippingDetails>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TotalDetails {
    pub amount_discount: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ShippingDetails {
    pub address: Option<GatewayAddress>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GatewayAddress {
    pub line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}
