//! Domain events
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::OrderStatus;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: Uuid, purchaser: Option<Uuid>, line_items: usize, total_price: Decimal },
    StatusChanged { order_id: Uuid, status: OrderStatus },
    Deleted { order_id: Uuid, undeleted_line_items: Vec<Uuid> },
}

impl OrderEvent {
    pub fn order_id(&self) -> Uuid {
        match self {
            Self::Created { order_id, .. } | Self::StatusChanged { order_id, .. } | Self::Deleted { order_id, .. } => *order_id,
        }
    }

    /// Subject suffix, e.g. `created` in `orders.created`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::StatusChanged { .. } => "status_changed",
            Self::Deleted { .. } => "deleted",
        }
    }
}
