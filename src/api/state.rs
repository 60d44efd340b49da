use std::sync::Arc;
use tracing::{info, warn};
use crate::catalog::{Catalog, MemoryCatalog, PgCatalog};
use crate::checkout::CheckoutService;
use crate::config::Config;
use crate::fulfillment::OrderFulfillment;
use crate::messaging::EventPublisher;
use crate::payments::{MemoryGateway, PaymentGateway, StripeGateway};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub checkout: Arc<CheckoutService>,
    pub fulfillment: Arc<OrderFulfillment>,
    pub webhook_secret: Option<String>,
    pub webhook_tolerance_secs: i64,
}

impl AppState {
    pub fn new(catalog: Arc<dyn Catalog>, gateway: Arc<dyn PaymentGateway>, events: EventPublisher, config: &Config) -> Self {
        Self {
            checkout: Arc::new(CheckoutService::new(catalog.clone(), gateway.clone(), config.base_url(), config.checkout_currency.clone())),
            fulfillment: Arc::new(OrderFulfillment::new(catalog.clone(), gateway, events)),
            catalog,
            webhook_secret: config.stripe_webhook_secret.clone(),
            webhook_tolerance_secs: config.webhook_tolerance_secs,
        }
    }

    /// Connects every configured backend, falling back to in-memory ones.
    pub async fn from_config(config: &Config) -> crate::Result<Self> {
        let catalog: Arc<dyn Catalog> = match &config.database_url {
            Some(url) => {
                info!("connecting to catalog database");
                Arc::new(PgCatalog::connect(url, config.database_max_connections).await?)
            }
            None => {
                warn!("DATABASE_URL not set, using an in-memory catalog");
                Arc::new(MemoryCatalog::new())
            }
        };
        let gateway: Arc<dyn PaymentGateway> = match &config.stripe_secret_key {
            Some(key) => Arc::new(StripeGateway::new(key.clone(), config.stripe_api_base.clone(), config.gateway_timeout)?),
            None => {
                warn!("STRIPE_SECRET_KEY not set, using an in-memory payment gateway");
                Arc::new(MemoryGateway::new())
            }
        };
        if config.stripe_webhook_secret.is_none() {
            warn!("STRIPE_WEBHOOK_SECRET not set, webhook deliveries will be rejected");
        }
        let events = EventPublisher::connect(config.nats_url.as_deref()).await;
        info!(events = events.is_enabled(), "backends ready");
        Ok(Self::new(catalog, gateway, events, config))
    }
}
