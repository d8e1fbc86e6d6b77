//! Order service: assembly, lifecycle and reporting over the store ports.
//!
//! The service holds no locks of its own. Every store or catalog call is
//! bounded by `call_timeout` so a stuck backend surfaces as
//! [`OrderError::DependencyFailed`] instead of a hung request.

mod assembly;
mod catalog;
mod lifecycle;
mod reporting;

pub use lifecycle::{DeleteOutcome, UndeletedLineItem};

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::OrderEvent;
use crate::publisher::{EventPublisher, NoopPublisher};
use crate::store::{Catalog, InMemoryStore, LineItemStore, OrderStore, StoreResult};
use crate::{OrderError, Result};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    line_items: Arc<dyn LineItemStore>,
    catalog: Arc<dyn Catalog>,
    events: Arc<dyn EventPublisher>,
    call_timeout: Duration,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>, line_items: Arc<dyn LineItemStore>, catalog: Arc<dyn Catalog>) -> Self {
        Self { orders, line_items, catalog, events: Arc::new(NoopPublisher), call_timeout: DEFAULT_CALL_TIMEOUT }
    }

    /// One store backing every port.
    pub fn with_store<S>(store: S) -> Self
    where
        S: OrderStore + LineItemStore + Catalog + 'static,
    {
        let store = Arc::new(store);
        Self::new(store.clone(), store.clone(), store)
    }

    pub fn in_memory() -> Self { Self::with_store(InMemoryStore::new()) }

    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = events;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Runs one store call under the timeout, tagging failures with `op`.
    async fn call<T>(&self, op: &'static str, fut: impl Future<Output = StoreResult<T>>) -> Result<T> {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(OrderError::DependencyFailed(format!("{op}: {e}"))),
            Err(_) => Err(OrderError::DependencyFailed(format!("{op}: timed out after {:?}", self.call_timeout))),
        }
    }

    /// Runs a store write under the timeout. The write gets its own task, so
    /// one that outlives the timeout still finishes; `undo` then removes
    /// whatever it wrote.
    async fn write<T, W, U>(&self, op: &'static str, write: W, undo: U) -> Result<T>
    where
        T: Send + 'static,
        W: Future<Output = StoreResult<T>> + Send + 'static,
        U: Future<Output = ()> + Send + 'static,
    {
        let mut task = tokio::spawn(write);
        match tokio::time::timeout(self.call_timeout, &mut task).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => Err(OrderError::DependencyFailed(format!("{op}: {e}"))),
            Ok(Err(e)) => Err(OrderError::DependencyFailed(format!("{op}: {e}"))),
            Err(_) => {
                tokio::spawn(async move {
                    if let Ok(Ok(_)) = task.await {
                        warn!(op = op, "Timed out write landed late, undoing it");
                        undo.await;
                    }
                });
                Err(OrderError::DependencyFailed(format!("{op}: timed out after {:?}", self.call_timeout)))
            }
        }
    }

    /// Deletes every line item independently. Returns the ones still present
    /// afterwards; an id that was already gone counts as deleted.
    async fn delete_line_items(&self, ids: &[Uuid]) -> Vec<UndeletedLineItem> {
        let deletes = ids.iter().map(|&id| async move { (id, self.call("delete line item", self.line_items.delete_line_item(id)).await) });
        join_all(deletes).await.into_iter()
            .filter_map(|(id, result)| match result {
                Ok(true) => None,
                Ok(false) => {
                    debug!(line_item = %id, "Line item already absent");
                    None
                }
                Err(e) => Some(UndeletedLineItem { id, reason: e.to_string() }),
            })
            .collect()
    }

    async fn emit(&self, event: OrderEvent) {
        match tokio::time::timeout(self.call_timeout, self.events.publish(&event)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, kind = event.kind(), order_id = %event.order_id(), "Failed to publish order event"),
            Err(_) => warn!(kind = event.kind(), order_id = %event.order_id(), "Timed out publishing order event"),
        }
    }
}
