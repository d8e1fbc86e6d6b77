//! Persistence ports and their implementations.
//!
//! The order service talks to storage only through these traits. No method
//! spans more than one record, so callers that need all-or-nothing
//! behaviour across records must compensate themselves.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Category, LineItem, NewLineItem, NewOrder, Order, OrderStatus, Product, UserSummary};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },

    #[error("Storage error: {0}")]
    Unavailable(String),

    #[error("{0} does not fit in a decimal")]
    Overflow(&'static str),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Filter for order listings. Results are always newest first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderFilter { pub purchaser: Option<Uuid> }

impl OrderFilter {
    pub fn all() -> Self { Self::default() }
    pub fn purchaser(id: Uuid) -> Self { Self { purchaser: Some(id) } }
    pub fn matches(&self, order: &Order) -> bool {
        self.purchaser.map_or(true, |p| order.purchaser == Some(p))
    }
}

#[async_trait]
pub trait LineItemStore: Send + Sync {
    async fn insert_line_item(&self, item: NewLineItem) -> StoreResult<LineItem>;
    async fn find_line_item(&self, id: Uuid) -> StoreResult<Option<LineItem>>;
    /// Returns `false` when no such line item existed.
    async fn delete_line_item(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;
    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>>;
    /// Removes the order and hands back the removed record.
    async fn delete_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    async fn list_orders(&self, filter: OrderFilter) -> StoreResult<Vec<Order>>;
    async fn count_orders(&self) -> StoreResult<u64>;
    /// Sum of `total_price` over every order; zero when there are none.
    async fn total_sales(&self) -> StoreResult<Decimal>;
}

#[async_trait]
pub trait PriceResolver: Send + Sync {
    /// Current unit price, or `None` when the product does not exist.
    async fn unit_price(&self, product: Uuid) -> StoreResult<Option<Decimal>>;
}

/// Records orders reference. Reads populate order views; the inserts back
/// the catalog routes.
#[async_trait]
pub trait Catalog: PriceResolver {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserSummary>>;
    async fn list_products(&self) -> StoreResult<Vec<Product>>;
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn insert_product(&self, product: Product) -> StoreResult<Product>;
    async fn insert_category(&self, category: Category) -> StoreResult<Category>;
}
