//! HashMap-backed store for development and tests.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Catalog, LineItemStore, OrderFilter, OrderStore, PriceResolver, StoreError, StoreResult};
use crate::domain::{Category, LineItem, NewLineItem, NewOrder, Order, OrderStatus, Product, UserSummary};

/// Insertion sequence, used to break ties between equal `date_ordered`.
type Seq = u64;

#[derive(Default)]
struct Tables {
    orders: HashMap<Uuid, (Seq, Order)>,
    line_items: HashMap<Uuid, LineItem>,
    products: HashMap<Uuid, Product>,
    categories: HashMap<Uuid, Category>,
    users: HashMap<Uuid, UserSummary>,
}

/// Every port in one process-local store. Clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    seq: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Registers a user so that order views can show the purchaser's name.
    pub async fn add_user(&self, user: UserSummary) {
        self.tables.write().await.users.insert(user.id, user);
    }

    pub async fn line_item_count(&self) -> usize { self.tables.read().await.line_items.len() }
}

#[async_trait]
impl LineItemStore for InMemoryStore {
    async fn insert_line_item(&self, item: NewLineItem) -> StoreResult<LineItem> {
        let item = LineItem { id: item.id, product: item.product, quantity: item.quantity };
        self.tables.write().await.line_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_line_item(&self, id: Uuid) -> StoreResult<Option<LineItem>> {
        Ok(self.tables.read().await.line_items.get(&id).cloned())
    }

    async fn delete_line_item(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.line_items.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, new: NewOrder) -> StoreResult<Order> {
        let order = Order {
            id: new.id,
            line_items: new.line_items,
            shipping: new.shipping,
            status: new.status,
            total_price: new.total_price,
            purchaser: new.purchaser,
            date_ordered: Utc::now(),
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.tables.write().await.orders.insert(order.id, (seq, order.clone()));
        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).map(|(_, o)| o.clone()))
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.get_mut(&id).map(|(_, o)| {
            o.status = status;
            o.clone()
        }))
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.tables.write().await.orders.remove(&id).map(|(_, o)| o))
    }

    async fn list_orders(&self, filter: OrderFilter) -> StoreResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut found: Vec<_> = tables.orders.values().filter(|(_, o)| filter.matches(o)).collect();
        found.sort_by(|(sa, a), (sb, b)| b.date_ordered.cmp(&a.date_ordered).then(sb.cmp(sa)));
        Ok(found.into_iter().map(|(_, o)| o.clone()).collect())
    }

    async fn count_orders(&self) -> StoreResult<u64> {
        Ok(self.tables.read().await.orders.len() as u64)
    }

    async fn total_sales(&self) -> StoreResult<Decimal> {
        self.tables.read().await.orders.values()
            .try_fold(Decimal::ZERO, |acc, (_, o)| acc.checked_add(o.total_price))
            .ok_or(StoreError::Overflow("total sales"))
    }
}

#[async_trait]
impl PriceResolver for InMemoryStore {
    async fn unit_price(&self, product: Uuid) -> StoreResult<Option<Decimal>> {
        Ok(self.tables.read().await.products.get(&product).map(|p| p.price))
    }
}

#[async_trait]
impl Catalog for InMemoryStore {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserSummary>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let mut products: Vec<_> = self.tables.read().await.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories: Vec<_> = self.tables.read().await.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        self.tables.write().await.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn insert_category(&self, category: Category) -> StoreResult<Category> {
        self.tables.write().await.categories.insert(category.id, category.clone());
        Ok(category)
    }
}
