//! Domain event publishing over NATS.
//!
//! Publishing is best effort: failures are logged and never propagate.

use tracing::{debug, warn};
use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    /// Publisher that drops every event.
    pub fn disabled() -> Self { Self::default() }

    /// Connects when a URL is given; a failed connection disables publishing.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::disabled() };
        match async_nats::connect(url).await {
            Ok(client) => Self::new(Some(client)),
            Err(e) => {
                warn!(error = %e, "NATS unavailable, domain events will not be published");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    pub async fn publish(&self, event: &DomainEvent) {
        let Some(nats) = &self.nats else { return };
        let payload = match serde_json::to_vec(event) {
            Ok(p) => p,
            Err(e) => { warn!(error = %e, "failed to encode domain event"); return; }
        };
        match nats.publish(event.subject().to_string(), payload.into()).await {
            Ok(()) => debug!(subject = event.subject(), "domain event published"),
            Err(e) => warn!(subject = event.subject(), error = %e, "failed to publish domain event"),
        }
    }
}
