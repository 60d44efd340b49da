//! Webhook Order Creator
//!
//! Runs after the webhook signature has been verified. A completed checkout
//! decrements stock for every purchased line and records one paid order.

use std::sync::Arc;
use tracing::{info, instrument, warn};
use crate::catalog::{Catalog, CatalogError};
use crate::domain::aggregates::{CheckoutMetadata, Order, OrderLine, ShippingAddress};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Money;
use crate::inventory::update_product_stock;
use crate::messaging::EventPublisher;
use crate::payments::{CompletedSession, GatewayError, GatewayEvent, PaymentGateway, CHECKOUT_COMPLETED};

#[derive(Debug, thiserror::Error)]
pub enum FulfillmentError {
    #[error("malformed checkout session: {0}")]
    MalformedSession(#[from] serde_json::Error),
    #[error("checkout session metadata is missing {0}")]
    MissingMetadata(&'static str),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FulfillmentOutcome {
    Created(Order),
    /// An order for this session already exists; nothing was changed.
    Duplicate { checkout_session_id: String },
    /// Event types other than checkout completion are acknowledged and ignored.
    Ignored { event_type: String },
}

pub struct OrderFulfillment {
    catalog: Arc<dyn Catalog>,
    gateway: Arc<dyn PaymentGateway>,
    events: EventPublisher,
}

impl OrderFulfillment {
    pub fn new(catalog: Arc<dyn Catalog>, gateway: Arc<dyn PaymentGateway>, events: EventPublisher) -> Self {
        Self { catalog, gateway, events }
    }

    #[instrument(skip_all, fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn handle_event(&self, event: GatewayEvent) -> Result<FulfillmentOutcome, FulfillmentError> {
        if event.event_type != CHECKOUT_COMPLETED {
            return Ok(FulfillmentOutcome::Ignored { event_type: event.event_type });
        }
        let session: CompletedSession = serde_json::from_value(event.data.object)?;
        self.fulfill(session).await
    }

    async fn fulfill(&self, session: CompletedSession) -> Result<FulfillmentOutcome, FulfillmentError> {
        if self.catalog.order_by_session(&session.id).await?.is_some() {
            warn!(session_id = %session.id, "duplicate completion event, order already recorded");
            return Ok(FulfillmentOutcome::Duplicate { checkout_session_id: session.id });
        }

        // Metadata problems are permanent; reject them before any stock is touched.
        let mut order = build_order(session)?;
        let session_id = order.checkout_session_id.as_str();

        let purchased = self.gateway.list_line_items(session_id).await?;
        let mut lines = Vec::with_capacity(purchased.len());
        for line in purchased {
            let Some(product_id) = line.product_id else {
                warn!(session_id, "line item carries no catalog product id, skipping");
                continue;
            };
            // Failures are logged inside and do not stop the remaining lines.
            update_product_stock(self.catalog.as_ref(), &self.events, product_id.as_str(), line.quantity).await;
            lines.push(OrderLine::new(product_id, line.quantity));
        }
        order.products = lines;

        match self.catalog.create_order(&order).await {
            Ok(()) => {}
            Err(CatalogError::DuplicateOrder(id)) => {
                warn!(session_id = %id, "order created concurrently by another delivery");
                return Ok(FulfillmentOutcome::Duplicate { checkout_session_id: id });
            }
            Err(e) => return Err(e.into()),
        }
        info!(order_id = %order.id, order_number = %order.order_number, total = %order.total_price, "order created");

        self.events.publish(&DomainEvent::Order(OrderEvent::Created {
            order_id: order.id.to_string(),
            order_number: order.order_number.clone(),
            checkout_session_id: order.checkout_session_id.clone(),
            total: order.total_price,
        })).await;
        Ok(FulfillmentOutcome::Created(order))
    }
}

/// Assembles the order record from the session, without its lines.
fn build_order(session: CompletedSession) -> Result<Order, FulfillmentError> {
    let meta = |key: &str| session.metadata.get(key).cloned().filter(|v| !v.is_empty());
    let details = session.customer_details.clone().unwrap_or_default();
    let metadata = CheckoutMetadata {
        order_number: meta("orderNumber").ok_or(FulfillmentError::MissingMetadata("orderNumber"))?,
        customer_name: meta("customerName").or(details.name).unwrap_or_default(),
        customer_email: meta("customerEmail").or(details.email).unwrap_or_default(),
        external_user_id: meta("externalUserId").unwrap_or_default(),
    };

    let mut order = Order::paid(metadata, session.id);
    order.payment_intent_id = session.payment_intent;
    order.gateway_customer_id = session.customer;
    order.phone = details.phone.unwrap_or_default();
    order.currency = session.currency.unwrap_or_default();
    order.amount_discount = session.total_details.and_then(|t| t.amount_discount).map_or(Money::ZERO, Money::from_minor_units);
    order.total_price = session.amount_total.map_or(Money::ZERO, Money::from_minor_units);
    order.shipping_address = session.shipping_details.and_then(|s| s.address).map(|a| ShippingAddress {
        street: a.line1,
        city: a.city,
        state: a.state,
        postal_code: a.postal_code,
        country: a.country,
    });
    Ok(order)
}
