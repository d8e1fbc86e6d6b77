//! Outbound order events.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::domain::OrderEvent;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Publish failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &OrderEvent) -> Result<(), PublishError>;
}

/// Publishes JSON-encoded events to `<prefix>.<kind>` on NATS.
pub struct NatsPublisher { client: async_nats::Client, prefix: String }

impl NatsPublisher {
    pub fn new(client: async_nats::Client, prefix: impl Into<String>) -> Self {
        Self { client, prefix: prefix.into() }
    }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: &OrderEvent) -> Result<(), PublishError> {
        let subject = format!("{}.{}", self.prefix, event.kind());
        let payload = serde_json::to_vec(event)?;
        self.client.publish(subject, payload.into()).await.map_err(|e| PublishError::Transport(e.to_string()))
    }
}

/// Drops every event. Used when no broker is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: &OrderEvent) -> Result<(), PublishError> {
        debug!(kind = event.kind(), order_id = %event.order_id(), "No event broker configured, dropping event");
        Ok(())
    }
}
