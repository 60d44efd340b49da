//! HTTP surface: catalog reads, checkout and the payment webhook.

mod error;
mod handlers;
mod state;

pub use error::ApiError;
pub use handlers::{CheckoutRequest, CheckoutResponse};
pub use state::AppState;

use axum::{routing::{get, post}, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/products/:slug", get(handlers::get_product))
        .route("/api/products/:slug/related", get(handlers::related_products))
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/orders", get(handlers::list_orders))
        .route("/api/sales/:coupon", get(handlers::get_sale))
        .route("/api/checkout", post(handlers::create_checkout))
        .route("/webhook", post(handlers::webhook))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}
