//! In-process gateway for local development and tests.
//!
//! Sessions are recorded instead of sent anywhere; their line items can be
//! listed back exactly as a real gateway would after payment.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use super::{CheckoutSession, CheckoutSessionRequest, CustomerRef, GatewayError, PaymentGateway, PurchasedLine};

#[derive(Default)]
struct State {
    customers: Vec<(String, String)>,
    sessions: Vec<(CheckoutSession, CheckoutSessionRequest)>,
    line_items: HashMap<String, Vec<PurchasedLine>>,
}

#[derive(Default)]
pub struct MemoryGateway {
    state: RwLock<State>,
}

impl MemoryGateway {
    pub fn new() -> Self { Self::default() }

    pub async fn add_customer(&self, id: impl Into<String>, email: impl Into<String>) {
        self.state.write().await.customers.push((id.into(), email.into()));
    }

    /// Line items for a session created outside this gateway.
    pub async fn set_line_items(&self, session_id: impl Into<String>, lines: Vec<PurchasedLine>) {
        self.state.write().await.line_items.insert(session_id.into(), lines);
    }

    pub async fn sessions(&self) -> Vec<(CheckoutSession, CheckoutSessionRequest)> {
        self.state.read().await.sessions.clone()
    }
}

#[async_trait]
impl PaymentGateway for MemoryGateway {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<String>, GatewayError> {
        Ok(self.state.read().await.customers.iter().find(|(_, e)| e == email).map(|(id, _)| id.clone()))
    }

    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession, GatewayError> {
        let id = format!("cs_test_{}", Uuid::new_v4().simple());
        let session = CheckoutSession { url: format!("https://checkout.invalid/pay/{id}"), id: id.clone() };
        let lines = request.line_items.iter()
            .map(|l| PurchasedLine { product_id: Some(l.product_id.clone()), quantity: l.quantity })
            .collect();
        let mut state = self.state.write().await;
        if let CustomerRef::Create { email } = &request.customer {
            let customer_id = format!("cus_{}", Uuid::new_v4().simple());
            state.customers.push((customer_id, email.clone()));
        }
        state.line_items.insert(id, lines);
        state.sessions.push((session.clone(), request.clone()));
        Ok(session)
    }

    async fn list_line_items(&self, session_id: &str) -> Result<Vec<PurchasedLine>, GatewayError> {
        self.state.read().await.line_items.get(session_id).cloned().ok_or_else(|| GatewayError::Api {
            status: 404,
            message: format!("No such checkout session: '{session_id}'"),
        })
    }
}
