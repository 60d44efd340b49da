//! Checkout Session Builder
//!
//! Validates a cart against the live catalog and asks the gateway for a
//! hosted checkout session. Either every item passes or nothing is sent.

use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;
use crate::catalog::{Catalog, CatalogError};
use crate::domain::aggregates::{CartItem, CheckoutMetadata};
use crate::payments::{
    CheckoutSessionRequest, CustomerRef, GatewayError, PaymentGateway, SessionLineItem,
    ALLOWED_SHIPPING_COUNTRIES, SESSION_ID_PLACEHOLDER,
};

/// Shown to buyers for any failure that is not a validation failure.
pub const GENERIC_CHECKOUT_ERROR: &str = "Unable to create checkout session. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Invalid checkout details: {0}")]
    InvalidMetadata(String),
    #[error("Some items do not have a price")]
    MissingPrice,
    #[error("Invalid price for \"{0}\"")]
    InvalidPrice(String),
    #[error("Product \"{0}\" is no longer available")]
    ProductUnavailable(String),
    #[error("Insufficient stock for \"{name}\". Available: {available}, Requested: {requested}")]
    InsufficientStock { name: String, available: u32, requested: u32 },
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl CheckoutError {
    /// Raised on purpose by this module, as opposed to a failing dependency.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Catalog(_) | Self::Gateway(_))
    }

    pub fn user_message(&self) -> String {
        if self.is_validation() { self.to_string() } else { GENERIC_CHECKOUT_ERROR.to_string() }
    }
}

pub struct CheckoutService {
    catalog: Arc<dyn Catalog>,
    gateway: Arc<dyn PaymentGateway>,
    base_url: String,
    currency: String,
}

impl CheckoutService {
    pub fn new(catalog: Arc<dyn Catalog>, gateway: Arc<dyn PaymentGateway>, base_url: impl Into<String>, currency: impl Into<String>) -> Self {
        Self { catalog, gateway, base_url: base_url.into(), currency: currency.into() }
    }

    pub fn success_url(&self, order_number: &str) -> String {
        format!("{}/success?session_id={}&orderNumber={}", self.base_url, SESSION_ID_PLACEHOLDER, order_number)
    }

    pub fn cancel_url(&self) -> String { format!("{}/basket", self.base_url) }

    /// Returns the hosted session URL the buyer should be redirected to.
    #[instrument(skip_all, fields(order_number = %metadata.order_number, items = items.len()))]
    pub async fn create_checkout_session(&self, items: &[CartItem], metadata: CheckoutMetadata) -> Result<String, CheckoutError> {
        let result = self.build_and_create(items, metadata).await;
        if let Err(e) = &result {
            if e.is_validation() { info!(error = %e, "checkout rejected"); } else { error!(error = %e, "checkout error"); }
        }
        result
    }

    async fn build_and_create(&self, items: &[CartItem], metadata: CheckoutMetadata) -> Result<String, CheckoutError> {
        if items.is_empty() { return Err(CheckoutError::EmptyCart); }
        metadata.validate().map_err(|e| CheckoutError::InvalidMetadata(e.to_string()))?;
        if items.iter().any(|i| i.product.price.is_none()) { return Err(CheckoutError::MissingPrice); }

        let mut line_items = Vec::with_capacity(items.len());
        for item in items {
            let requested = item.quantity.value();
            let current = self.catalog.product(item.product.id.as_str()).await?
                .ok_or_else(|| CheckoutError::ProductUnavailable(item.product.name.clone()))?;
            if requested > current.stock {
                return Err(CheckoutError::InsufficientStock { name: current.name, available: current.stock, requested });
            }
            let price = current.effective_price().ok_or(CheckoutError::MissingPrice)?;
            let unit_amount = price.to_minor_units().map_err(|_| CheckoutError::InvalidPrice(current.name.clone()))?;
            line_items.push(SessionLineItem {
                currency: self.currency.clone(),
                unit_amount,
                description: format!("Product ID: {}", current.id),
                image: current.primary_image().map(str::to_string),
                name: current.name,
                product_id: current.id,
                quantity: requested,
            });
        }

        let customer = match self.gateway.find_customer_by_email(&metadata.customer_email).await? {
            Some(id) => CustomerRef::Existing(id),
            None => CustomerRef::Create { email: metadata.customer_email.clone() },
        };
        let request = CheckoutSessionRequest {
            customer,
            success_url: self.success_url(&metadata.order_number),
            cancel_url: self.cancel_url(),
            metadata,
            line_items,
            allow_promotion_codes: true,
            allowed_shipping_countries: ALLOWED_SHIPPING_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            collect_phone_number: true,
        };
        let session = self.gateway.create_checkout_session(&request).await?;
        info!(session_id = %session.id, "checkout session ready");
        Ok(session.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use crate::catalog::MemoryCatalog;
    use crate::domain::aggregates::{Product, ProductDocument};
    use crate::domain::value_objects::{Money, ProductId, Quantity};
    use crate::payments::MemoryGateway;

    fn metadata() -> CheckoutMetadata {
        CheckoutMetadata {
            order_number: "ORD-42".into(), customer_name: "Grace".into(),
            customer_email: "grace@example.com".into(), external_user_id: "user_42".into(),
        }
    }

    fn doc(id: &str, price: Option<Decimal>, stock: i32) -> ProductDocument {
        ProductDocument {
            id: id.into(), name: Some(format!("Item {id}")), slug: Some(id.to_lowercase()), price, stock: Some(stock),
            images: vec![format!("https://cdn.example.com/{id}.png")], ..Default::default()
        }
    }

    fn item(id: &str, price: Option<Decimal>, quantity: u32) -> CartItem {
        CartItem {
            product: Product {
                id: ProductId::new(id), name: format!("Item {id}"), slug: id.to_lowercase(), price: price.map(Money::new),
                discount: None, stock: 0, images: vec![], categories: vec![], description: None, video_url: None,
            },
            quantity: Quantity::new(quantity).unwrap(),
        }
    }

    async fn service(docs: Vec<ProductDocument>) -> (CheckoutService, Arc<MemoryGateway>) {
        let catalog = Arc::new(MemoryCatalog::new());
        for d in docs { catalog.insert_product(d).await; }
        let gateway = Arc::new(MemoryGateway::new());
        (CheckoutService::new(catalog, gateway.clone(), "https://shop.example.com", "usd"), gateway)
    }

    #[tokio::test]
    async fn test_missing_price_rejects_without_gateway_call() {
        let (svc, gateway) = service(vec![doc("P1", Some(Decimal::new(10, 0)), 5)]).await;
        let err = svc.create_checkout_session(&[item("P1", None, 1)], metadata()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::MissingPrice));
        assert_eq!(err.user_message(), "Some items do not have a price");
        assert!(gateway.sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_stock_names_product() {
        let (svc, gateway) = service(vec![doc("P1", Some(Decimal::new(10, 0)), 2)]).await;
        let err = svc.create_checkout_session(&[item("P1", Some(Decimal::new(10, 0)), 3)], metadata()).await.unwrap_err();
        let message = err.user_message();
        assert!(message.contains("Item P1"), "{message}");
        assert!(message.contains("Available: 2, Requested: 3"), "{message}");
        assert!(gateway.sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_removed_product_aborts_whole_checkout() {
        let (svc, gateway) = service(vec![doc("P1", Some(Decimal::new(10, 0)), 9)]).await;
        let items = [item("P1", Some(Decimal::new(10, 0)), 1), item("GONE", Some(Decimal::new(5, 0)), 1)];
        let err = svc.create_checkout_session(&items, metadata()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ProductUnavailable(ref name) if name == "Item GONE"));
        assert!(gateway.sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_email_is_validation_error() {
        let (svc, _) = service(vec![doc("P1", Some(Decimal::new(10, 0)), 9)]).await;
        let bad = CheckoutMetadata { customer_email: "nope".into(), ..metadata() };
        let err = svc.create_checkout_session(&[item("P1", Some(Decimal::new(10, 0)), 1)], bad).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_session_built_from_catalog_prices() {
        let (svc, gateway) = service(vec![
            ProductDocument { discount: Some(Decimal::new(20, 0)), ..doc("P1", Some(Decimal::new(2499, 2)), 5) },
            doc("P2", Some(Decimal::new(3, 0)), 1),
        ]).await;
        // Stale client-side price is ignored in favour of the catalog's.
        let items = [item("P1", Some(Decimal::new(1, 0)), 2), item("P2", Some(Decimal::new(3, 0)), 1)];
        let url = svc.create_checkout_session(&items, metadata()).await.unwrap();

        let sessions = gateway.sessions().await;
        assert_eq!(sessions.len(), 1);
        let (session, request) = &sessions[0];
        assert_eq!(url, session.url);
        assert_eq!(request.line_items[0].unit_amount, 1999);
        assert_eq!(request.line_items[0].quantity, 2);
        assert_eq!(request.line_items[0].description, "Product ID: P1");
        assert_eq!(request.line_items[0].image.as_deref(), Some("https://cdn.example.com/P1.png"));
        assert_eq!(request.line_items[1].unit_amount, 300);
        assert_eq!(request.success_url, "https://shop.example.com/success?session_id={CHECKOUT_SESSION_ID}&orderNumber=ORD-42");
        assert_eq!(request.cancel_url, "https://shop.example.com/basket");
        assert_eq!(request.allowed_shipping_countries, vec!["US", "CA", "GB", "AU", "PK"]);
        assert!(request.allow_promotion_codes && request.collect_phone_number);
        assert_eq!(request.customer, CustomerRef::Create { email: "grace@example.com".into() });
        assert_eq!(request.metadata, metadata());
    }

    #[tokio::test]
    async fn test_existing_customer_is_reused() {
        let (svc, gateway) = service(vec![doc("P1", Some(Decimal::new(10, 0)), 5)]).await;
        gateway.add_customer("cus_existing", "grace@example.com").await;
        svc.create_checkout_session(&[item("P1", Some(Decimal::new(10, 0)), 1)], metadata()).await.unwrap();
        let (_, request) = &gateway.sessions().await[0];
        assert_eq!(request.customer, CustomerRef::Existing("cus_existing".into()));
    }

    #[tokio::test]
    async fn test_unrepresentable_price_is_rejected() {
        let (svc, gateway) = service(vec![doc("P1", Some(Decimal::MAX), 5)]).await;
        let err = svc.create_checkout_session(&[item("P1", Some(Decimal::ONE), 1)], metadata()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPrice(ref name) if name == "Item P1"));
        assert!(gateway.sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let (svc, _) = service(vec![]).await;
        assert!(matches!(svc.create_checkout_session(&[], metadata()).await, Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn test_dependency_errors_are_generic() {
        let err = CheckoutError::Gateway(GatewayError::Api { status: 402, message: "card_declined: secret detail".into() });
        assert!(!err.is_validation());
        assert_eq!(err.user_message(), GENERIC_CHECKOUT_ERROR);
    }
}
