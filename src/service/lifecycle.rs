//! Status changes and cascading deletion.

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::OrderService;
use crate::domain::{Order, OrderEvent, OrderStatus};
use crate::{Entity, OrderError, Result};

/// Result of deleting an order. The order itself is always gone; line items
/// listed in `undeleted` could not be removed and are still stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeleteOutcome {
    pub order: Order,
    pub undeleted: Vec<UndeletedLineItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UndeletedLineItem { pub id: Uuid, pub reason: String }

impl DeleteOutcome {
    pub fn is_partial(&self) -> bool { !self.undeleted.is_empty() }
}

impl OrderService {
    /// Sets the fulfillment status. Any non-blank label is accepted.
    #[instrument(skip(self))]
    pub async fn set_status(&self, order_id: Uuid, status: &str) -> Result<Order> {
        let status = OrderStatus::parse(status).map_err(|e| OrderError::ValidationFailed(e.to_string()))?;
        let order = self.call("update order status", self.orders.update_order_status(order_id, status)).await?
            .ok_or_else(|| OrderError::not_found(Entity::Order, order_id))?;

        info!(order_id = %order.id, status = %order.status, "Order status updated");
        self.emit(OrderEvent::StatusChanged { order_id: order.id, status: order.status.clone() }).await;
        Ok(order)
    }

    /// Deletes the order, then each of its line items.
    ///
    /// Line item deletes are attempted independently after the order is gone.
    /// Their failures do not fail the call; they are reported in
    /// [`DeleteOutcome::undeleted`].
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<DeleteOutcome> {
        let order = self.call("delete order", self.orders.delete_order(order_id)).await?
            .ok_or_else(|| OrderError::not_found(Entity::Order, order_id))?;

        let undeleted = self.delete_line_items(&order.line_items).await;
        if undeleted.is_empty() {
            info!(order_id = %order.id, line_items = order.line_items.len(), "Order deleted");
        } else {
            warn!(order_id = %order.id, undeleted = undeleted.len(), "Order deleted, some line items remain");
        }

        self.emit(OrderEvent::Deleted { order_id: order.id, undeleted_line_items: undeleted.iter().map(|u| u.id).collect() }).await;
        Ok(DeleteOutcome { order, undeleted })
    }
}
