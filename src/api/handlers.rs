use axum::{body::Bytes, extract::{rejection::JsonRejection, Path, Query, State}, http::HeaderMap, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use validator::Validate;
use crate::domain::aggregates::{CartItem, Category, CheckoutMetadata, Order, Product, Sale};
use crate::fulfillment::FulfillmentOutcome;
use crate::payments::{signature, GatewayEvent, SIGNATURE_HEADER};
use super::{ApiError, AppState};

pub async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "storefront"}))
}

pub async fn get_product(State(s): State<AppState>, Path(slug): Path<String>) -> Result<Json<Product>, ApiError> {
    match s.catalog.product_by_slug(&slug).await {
        Ok(Some(product)) => Ok(Json(product)),
        Ok(None) => Err(ApiError::NotFound(format!("Product {slug} not found"))),
        Err(e) => {
            error!(%slug, error = %e, "error fetching product");
            Err(ApiError::NotFound(format!("Product {slug} not found")))
        }
    }
}

pub async fn related_products(State(s): State<AppState>, Path(slug): Path<String>) -> Json<Vec<Product>> {
    let related = match s.catalog.product_by_slug(&slug).await {
        Ok(Some(product)) => s.catalog.related_products(product.id.as_str(), &product.categories).await,
        Ok(None) => Ok(vec![]),
        Err(e) => Err(e),
    };
    Json(related.unwrap_or_else(|e| {
        error!(%slug, error = %e, "error fetching related products");
        vec![]
    }))
}

pub async fn list_categories(State(s): State<AppState>) -> Json<Vec<Category>> {
    Json(s.catalog.categories().await.unwrap_or_else(|e| {
        error!(error = %e, "error fetching categories");
        vec![]
    }))
}

#[derive(Debug, Deserialize)]
pub struct OrdersParams { pub user: Option<String> }

pub async fn list_orders(State(s): State<AppState>, Query(p): Query<OrdersParams>) -> Result<Json<Vec<Order>>, ApiError> {
    let user = p.user.filter(|u| !u.trim().is_empty()).ok_or_else(|| ApiError::BadRequest("user is required".into()))?;
    Ok(Json(s.catalog.orders_for_user(&user).await.unwrap_or_else(|e| {
        error!(error = %e, "error fetching orders");
        vec![]
    })))
}

pub async fn get_sale(State(s): State<AppState>, Path(coupon): Path<String>) -> Result<Json<Sale>, ApiError> {
    match s.catalog.active_sale_by_coupon(&coupon).await {
        Ok(Some(sale)) => Ok(Json(sale)),
        Ok(None) => Err(ApiError::NotFound(format!("No active sale for coupon {coupon}"))),
        Err(e) => {
            error!(%coupon, error = %e, "error fetching sale");
            Err(ApiError::NotFound(format!("No active sale for coupon {coupon}")))
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "Your cart is empty"))]
    pub items: Vec<CartItem>,
    #[validate]
    pub metadata: CheckoutMetadata,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse { pub url: String }

pub async fn create_checkout(State(s): State<AppState>, body: Result<Json<CheckoutRequest>, JsonRejection>) -> Result<Json<CheckoutResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    req.validate()?;
    let url = s.checkout.create_checkout_session(&req.items, req.metadata).await?;
    Ok(Json(CheckoutResponse { url }))
}

/// Receives gateway notifications. Anything rejected before the signature
/// is verified answers 400 so the gateway does not retry it; a failed order
/// answers 500 so it does.
pub async fn webhook(State(s): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<Value>, ApiError> {
    let Some(sig) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return Err(ApiError::BadRequest("No signature".into()));
    };
    let Some(secret) = s.webhook_secret.as_deref() else {
        error!("webhook received but STRIPE_WEBHOOK_SECRET is not set");
        return Err(ApiError::BadRequest("Webhook secret is not set".into()));
    };
    if let Err(e) = signature::verify(&body, sig, secret, s.webhook_tolerance_secs, Utc::now().timestamp()) {
        error!(error = %e, "webhook signature verification failed");
        return Err(ApiError::BadRequest(format!("Webhook Error: {e}")));
    }
    let event: GatewayEvent = serde_json::from_slice(&body).map_err(|e| {
        error!(error = %e, "malformed webhook payload");
        ApiError::BadRequest(format!("Webhook Error: {e}"))
    })?;

    match s.fulfillment.handle_event(event).await {
        Ok(FulfillmentOutcome::Created(order)) => info!(order_number = %order.order_number, "webhook fulfilled"),
        Ok(FulfillmentOutcome::Duplicate { checkout_session_id }) => info!(%checkout_session_id, "webhook already fulfilled"),
        Ok(FulfillmentOutcome::Ignored { event_type }) => debug!(%event_type, "webhook event ignored"),
        Err(e) => {
            error!(error = %e, "error creating order");
            return Err(ApiError::Internal("Error creating an order".into()));
        }
    }
    Ok(Json(json!({"received": true})))
}
