//! Stripe REST client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};
use crate::domain::value_objects::ProductId;
use super::{CheckoutSession, CheckoutSessionRequest, CustomerRef, GatewayError, PaymentGateway, PurchasedLine};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

pub struct StripeGateway {
    client: Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct List<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct CustomerObject {
    id: String,
}

#[derive(Deserialize)]
struct SessionObject {
    id: String,
    url: Option<String>,
}

#[derive(Deserialize)]
struct LineItemObject {
    quantity: Option<u32>,
    price: Option<PriceObject>,
}

#[derive(Deserialize)]
struct PriceObject {
    product: Option<ProductRef>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProductRef {
    Expanded { #[serde(default)] metadata: HashMap<String, String> },
    Id(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_base: api_base.into().trim_end_matches('/').to_string(), secret_key: secret_key.into() })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}/v1{}", self.api_base, path)).bearer_auth(&self.secret_key)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(format!("{}/v1{}", self.api_base, path)).bearer_auth(&self.secret_key)
    }

    async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let message = response.json::<ErrorBody>().await.ok()
            .and_then(|b| b.error.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        Err(GatewayError::Api { status: status.as_u16(), message })
    }
}

/// Flattens a session request into the gateway's bracketed form encoding.
pub(crate) fn session_form(req: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = Vec::new();
    let mut push = |k: String, v: String| form.push((k, v));

    match &req.customer {
        CustomerRef::Existing(id) => push("customer".into(), id.clone()),
        CustomerRef::Create { email } => {
            push("customer_creation".into(), "always".into());
            push("customer_email".into(), email.clone());
        }
    }
    let m = &req.metadata;
    push("metadata[orderNumber]".into(), m.order_number.clone());
    push("metadata[customerName]".into(), m.customer_name.clone());
    push("metadata[customerEmail]".into(), m.customer_email.clone());
    push("metadata[externalUserId]".into(), m.external_user_id.clone());
    push("mode".into(), "payment".into());
    push("allow_promotion_codes".into(), req.allow_promotion_codes.to_string());
    push("success_url".into(), req.success_url.clone());
    push("cancel_url".into(), req.cancel_url.clone());
    for (i, country) in req.allowed_shipping_countries.iter().enumerate() {
        push(format!("shipping_address_collection[allowed_countries][{i}]"), country.clone());
    }
    push("phone_number_collection[enabled]".into(), req.collect_phone_number.to_string());

    for (i, item) in req.line_items.iter().enumerate() {
        let p = format!("line_items[{i}]");
        push(format!("{p}[price_data][currency]"), item.currency.clone());
        push(format!("{p}[price_data][unit_amount]"), item.unit_amount.to_string());
        push(format!("{p}[price_data][product_data][name]"), item.name.clone());
        push(format!("{p}[price_data][product_data][description]"), item.description.clone());
        push(format!("{p}[price_data][product_data][metadata][id]"), item.product_id.to_string());
        if let Some(image) = &item.image {
            push(format!("{p}[price_data][product_data][images][0]"), image.clone());
        }
        push(format!("{p}[quantity]"), item.quantity.to_string());
    }
    form
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip_all)]
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<String>, GatewayError> {
        let response = self.get("/customers").query(&[("email", email), ("limit", "1")]).send().await?;
        let customers: List<CustomerObject> = Self::decode(response).await?;
        Ok(customers.data.into_iter().next().map(|c| c.id))
    }

    #[instrument(skip(self, request), fields(order_number = %request.metadata.order_number, lines = request.line_items.len()))]
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession, GatewayError> {
        let response = self.post("/checkout/sessions").form(&session_form(request)).send().await?;
        let session: SessionObject = Self::decode(response).await?;
        debug!(session_id = %session.id, "checkout session created");
        let url = session.url.ok_or(GatewayError::Incomplete("session url"))?;
        Ok(CheckoutSession { id: session.id, url })
    }

    #[instrument(skip(self))]
    async fn list_line_items(&self, session_id: &str) -> Result<Vec<PurchasedLine>, GatewayError> {
        let response = self.get(&format!("/checkout/sessions/{session_id}/line_items"))
            .query(&[("expand[]", "data.price.product"), ("limit", "100")])
            .send().await?;
        let items: List<LineItemObject> = Self::decode(response).await?;
        Ok(items.data.into_iter().map(|item| {
            let product_id = match item.price.and_then(|p| p.product) {
                Some(ProductRef::Expanded { metadata }) => metadata.get("id").cloned().map(ProductId::new),
                Some(ProductRef::Id(_)) | None => None,
            };
            PurchasedLine { product_id, quantity: item.quantity.unwrap_or(0) }
        }).collect())
    }
}
