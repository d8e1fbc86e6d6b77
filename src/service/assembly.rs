//! Order assembly.
//!
//! Creating an order touches `1 + n` records with no transaction around
//! them, so assembly runs as a saga:
//!
//! 1. validate the request (nothing written)
//! 2. resolve every unit price and the total (nothing written, unknown
//!    products and totals too large to store fail here)
//! 3. insert every line item concurrently and wait for all of them
//! 4. insert the order with the summed total
//!
//! Record ids are picked here before each write, so a failure in step 3 or
//! 4 can delete everything that might have been written, including writes
//! that timed out. If that cleanup fails too the error is
//! [`OrderError::Compensation`].

use futures::future::{join_all, try_join_all};
use std::future::Future;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::OrderService;
use crate::domain::{order_total, CreateOrder, DraftLine, NewLineItem, Order, OrderDraft, OrderEvent, PricedLine};
use crate::{Entity, OrderError, Result};

impl OrderService {
    #[instrument(skip(self, request), fields(lines = request.order_items.len()))]
    pub async fn create_order(&self, purchaser: Option<Uuid>, request: CreateOrder) -> Result<Order> {
        let draft = OrderDraft::new(purchaser, request)?;
        let priced = self.price_lines(draft.lines()).await?;
        let total_price = order_total(&priced)?;
        let line_items = self.create_line_items(draft.lines()).await?;

        let order_id = Uuid::now_v7();
        let new_order = draft.into_new_order(order_id, line_items.clone(), total_price);
        let orders = self.orders.clone();
        let insert = async move { orders.insert_order(new_order).await };
        let order = match self.write("insert order", insert, self.undo_order(order_id)).await {
            Ok(order) => order,
            Err(e) => return Err(self.compensate(e, Some(order_id), &line_items).await),
        };

        info!(order_id = %order.id, total_price = %order.total_price, "Order created");
        self.emit(OrderEvent::Created {
            order_id: order.id,
            purchaser: order.purchaser,
            line_items: order.line_items.len(),
            total_price: order.total_price,
        }).await;
        Ok(order)
    }

    /// Looks up every unit price concurrently. Results follow `lines` order.
    async fn price_lines(&self, lines: &[DraftLine]) -> Result<Vec<PricedLine>> {
        let lookups = lines.iter().map(|line| async move {
            let unit_price = self.call("resolve price", self.catalog.unit_price(line.product)).await?
                .ok_or_else(|| OrderError::not_found(Entity::Product, line.product))?;
            Ok::<_, OrderError>(PricedLine { product: line.product, quantity: line.quantity, unit_price })
        });
        try_join_all(lookups).await
    }

    /// Inserts every line item concurrently and waits for all of them.
    /// Returns their ids in `lines` order. On any failure every attempted
    /// line item is removed again.
    async fn create_line_items(&self, lines: &[DraftLine]) -> Result<Vec<Uuid>> {
        let items: Vec<NewLineItem> = lines.iter()
            .map(|line| NewLineItem { id: Uuid::now_v7(), product: line.product, quantity: line.quantity })
            .collect();
        let ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();

        let inserts = items.into_iter().map(|item| {
            let undo = self.undo_line_item(item.id);
            let store = self.line_items.clone();
            self.write("insert line item", async move { store.insert_line_item(item).await }, undo)
        });

        let mut first_error = None;
        for result in join_all(inserts).await {
            if let Err(e) = result {
                warn!(error = %e, "Line item insert failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            None => Ok(ids),
            Some(e) => Err(self.compensate(e, None, &ids).await),
        }
    }

    /// Undoes whatever a failed assembly may have written. The order goes
    /// first: while it might still exist its line items are kept.
    async fn compensate(&self, cause: OrderError, order: Option<Uuid>, line_items: &[Uuid]) -> OrderError {
        warn!(error = %cause, line_items = line_items.len(), "Order assembly failed, removing its records");
        if let Some(id) = order {
            if let Err(e) = self.call("delete order", self.orders.delete_order(id)).await {
                error!(order_id = %id, error = %e, "Could not remove order of failed assembly");
                return OrderError::Compensation { cause: Box::new(cause), order: Some(id), orphaned: line_items.to_vec() };
            }
        }
        let left = self.delete_line_items(line_items).await;
        if left.is_empty() {
            return cause;
        }
        for item in &left {
            error!(line_item = %item.id, reason = %item.reason, "Could not remove line item of failed order");
        }
        OrderError::Compensation { cause: Box::new(cause), order: None, orphaned: left.into_iter().map(|l| l.id).collect() }
    }

    fn undo_order(&self, id: Uuid) -> impl Future<Output = ()> + Send + 'static {
        let orders = self.orders.clone();
        async move {
            if let Err(e) = orders.delete_order(id).await {
                error!(order_id = %id, error = %e, "Could not remove late order");
            }
        }
    }

    fn undo_line_item(&self, id: Uuid) -> impl Future<Output = ()> + Send + 'static {
        let line_items = self.line_items.clone();
        async move {
            if let Err(e) = line_items.delete_line_item(id).await {
                error!(line_item = %id, error = %e, "Could not remove late line item");
            }
        }
    }
}
