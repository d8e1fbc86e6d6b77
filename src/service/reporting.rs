//! Read side: aggregates and populated order views.

use futures::future::try_join_all;
use rust_decimal::Decimal;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::OrderService;
use crate::domain::{LineItemDetails, Order, OrderDetails, ProductDetails, Purchaser};
use crate::store::OrderFilter;
use crate::{Entity, OrderError, Result};

impl OrderService {
    pub async fn count_orders(&self) -> Result<u64> {
        self.call("count orders", self.orders.count_orders()).await
    }

    pub async fn total_sales(&self) -> Result<Decimal> {
        self.call("sum order totals", self.orders.total_sales()).await
    }

    /// Orders placed by `purchaser`, newest first. Empty if there are none.
    #[instrument(skip(self))]
    pub async fn orders_for_user(&self, purchaser: Uuid) -> Result<Vec<OrderDetails>> {
        let orders = self.call("list orders", self.orders.list_orders(OrderFilter::purchaser(purchaser))).await?;
        self.populate_all(orders).await
    }

    pub async fn list_orders(&self) -> Result<Vec<OrderDetails>> {
        let orders = self.call("list orders", self.orders.list_orders(OrderFilter::all())).await?;
        self.populate_all(orders).await
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetails> {
        let order = self.call("find order", self.orders.find_order(order_id)).await?
            .ok_or_else(|| OrderError::not_found(Entity::Order, order_id))?;
        self.populate(order).await
    }

    async fn populate_all(&self, orders: Vec<Order>) -> Result<Vec<OrderDetails>> {
        try_join_all(orders.into_iter().map(|o| self.populate(o))).await
    }

    /// Resolves line items, their products and categories, and the purchaser.
    async fn populate(&self, order: Order) -> Result<OrderDetails> {
        let items = try_join_all(order.line_items.iter().map(|&id| self.line_item_details(order.id, id))).await?;
        let purchaser = match order.purchaser {
            Some(id) => {
                let user = self.call("find user", self.catalog.find_user(id)).await?;
                Some(Purchaser { id, name: user.map(|u| u.name) })
            }
            None => None,
        };
        Ok(OrderDetails::new(order, items.into_iter().flatten().collect(), purchaser))
    }

    /// `None` when the referenced line item no longer exists.
    async fn line_item_details(&self, order_id: Uuid, id: Uuid) -> Result<Option<LineItemDetails>> {
        let Some(item) = self.call("find line item", self.line_items.find_line_item(id)).await? else {
            warn!(order_id = %order_id, line_item = %id, "Order references a missing line item");
            return Ok(None);
        };
        let product = match self.call("find product", self.catalog.find_product(item.product)).await? {
            Some(product) => {
                let category = match product.category {
                    Some(c) => self.call("find category", self.catalog.find_category(c)).await?,
                    None => None,
                };
                Some(ProductDetails::new(product, category))
            }
            None => None,
        };
        Ok(Some(LineItemDetails { id: item.id, quantity: item.quantity, product }))
    }
}
