//! Postgres-backed store.
//!
//! Every method is a single statement, so the store has the same
//! one-record-at-a-time contract as a document database. Record ids come
//! from the caller; order timestamps are assigned here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

use super::{Catalog, LineItemStore, OrderFilter, OrderStore, PriceResolver, StoreError, StoreResult};
use crate::domain::{
    Category, LineItem, NewLineItem, NewOrder, Order, OrderStatus, Product, Quantity, ShippingDetails, UserSummary,
};

const ORDER_COLUMNS: &str = "id, line_item_ids, shipping_address1, shipping_address2, city, zip, country, phone, status, total_price, purchaser_id, date_ordered";
const PRODUCT_COLUMNS: &str = "id, name, description, price, category_id, date_created";

#[derive(Clone)]
pub struct PgStore { pool: PgPool }

impl PgStore {
    /// Connects, then brings the schema up to date.
    pub async fn connect(url: &str, max_connections: u32, acquire_timeout: Duration) -> StoreResult<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).acquire_timeout(acquire_timeout).connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[derive(sqlx::FromRow)]
struct LineItemRow { id: Uuid, product_id: Uuid, quantity: i32 }

impl TryFrom<LineItemRow> for LineItem {
    type Error = StoreError;
    fn try_from(r: LineItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(i64::from(r.quantity)).map_err(|e| StoreError::Corrupt { id: r.id, reason: e.to_string() })?;
        Ok(LineItem { id: r.id, product: r.product_id, quantity })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, line_item_ids: Vec<Uuid>, shipping_address1: String, shipping_address2: Option<String>,
    city: String, zip: String, country: String, phone: String, status: String, total_price: Decimal,
    purchaser_id: Option<Uuid>, date_ordered: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;
    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(r.status).map_err(|e| StoreError::Corrupt { id: r.id, reason: e.to_string() })?;
        Ok(Order {
            id: r.id,
            line_items: r.line_item_ids,
            shipping: ShippingDetails {
                shipping_address1: r.shipping_address1, shipping_address2: r.shipping_address2,
                city: r.city, zip: r.zip, country: r.country, phone: r.phone,
            },
            status,
            total_price: r.total_price,
            purchaser: r.purchaser_id,
            date_ordered: r.date_ordered,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow { id: Uuid, name: String, description: String, price: Decimal, category_id: Option<Uuid>, date_created: DateTime<Utc> }

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product { id: r.id, name: r.name, description: r.description, price: r.price, category: r.category_id, date_created: r.date_created }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow { id: Uuid, name: String, icon: Option<String>, color: Option<String> }

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self { Category { id: r.id, name: r.name, icon: r.icon, color: r.color } }
}

fn orders(rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

#[async_trait]
impl LineItemStore for PgStore {
    async fn insert_line_item(&self, item: NewLineItem) -> StoreResult<LineItem> {
        let quantity = i32::try_from(item.quantity.value()).map_err(|e| StoreError::Corrupt { id: item.id, reason: e.to_string() })?;
        sqlx::query_as::<_, LineItemRow>("INSERT INTO line_items (id, product_id, quantity) VALUES ($1, $2, $3) RETURNING id, product_id, quantity")
            .bind(item.id).bind(item.product).bind(quantity)
            .fetch_one(&self.pool).await?.try_into()
    }

    async fn find_line_item(&self, id: Uuid) -> StoreResult<Option<LineItem>> {
        sqlx::query_as::<_, LineItemRow>("SELECT id, product_id, quantity FROM line_items WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?.map(LineItem::try_from).transpose()
    }

    async fn delete_line_item(&self, id: Uuid) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM line_items WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, o: NewOrder) -> StoreResult<Order> {
        let sql = format!("INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW()) RETURNING {ORDER_COLUMNS}");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(o.id).bind(&o.line_items)
            .bind(&o.shipping.shipping_address1).bind(&o.shipping.shipping_address2)
            .bind(&o.shipping.city).bind(&o.shipping.zip).bind(&o.shipping.country).bind(&o.shipping.phone)
            .bind(o.status.as_str()).bind(o.total_price).bind(o.purchaser)
            .fetch_one(&self.pool).await?.try_into()
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, OrderRow>(&sql).bind(id).fetch_optional(&self.pool).await?.map(Order::try_from).transpose()
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>> {
        let sql = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}");
        sqlx::query_as::<_, OrderRow>(&sql).bind(id).bind(status.as_str())
            .fetch_optional(&self.pool).await?.map(Order::try_from).transpose()
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let sql = format!("DELETE FROM orders WHERE id = $1 RETURNING {ORDER_COLUMNS}");
        sqlx::query_as::<_, OrderRow>(&sql).bind(id).fetch_optional(&self.pool).await?.map(Order::try_from).transpose()
    }

    async fn list_orders(&self, filter: OrderFilter) -> StoreResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE ($1::uuid IS NULL OR purchaser_id = $1) ORDER BY date_ordered DESC, id DESC");
        orders(sqlx::query_as::<_, OrderRow>(&sql).bind(filter.purchaser).fetch_all(&self.pool).await?)
    }

    async fn count_orders(&self) -> StoreResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }

    async fn total_sales(&self) -> StoreResult<Decimal> {
        Ok(sqlx::query_scalar::<_, Decimal>("SELECT COALESCE(SUM(total_price), 0) FROM orders").fetch_one(&self.pool).await?)
    }
}

#[async_trait]
impl PriceResolver for PgStore {
    async fn unit_price(&self, product: Uuid) -> StoreResult<Option<Decimal>> {
        Ok(sqlx::query_scalar::<_, Decimal>("SELECT price FROM products WHERE id = $1").bind(product).fetch_optional(&self.pool).await?)
    }
}

#[async_trait]
impl Catalog for PgStore {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        Ok(sqlx::query_as::<_, ProductRow>(&sql).bind(id).fetch_optional(&self.pool).await?.map(Product::from))
    }

    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(sqlx::query_as::<_, CategoryRow>("SELECT id, name, icon, color FROM categories WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?.map(Category::from))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserSummary>> {
        let row: Option<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM users WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(|(id, name)| UserSummary { id, name }))
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name");
        Ok(sqlx::query_as::<_, ProductRow>(&sql).fetch_all(&self.pool).await?.into_iter().map(Product::from).collect())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, CategoryRow>("SELECT id, name, icon, color FROM categories ORDER BY name")
            .fetch_all(&self.pool).await?.into_iter().map(Category::from).collect())
    }

    async fn insert_product(&self, p: Product) -> StoreResult<Product> {
        let sql = format!("INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PRODUCT_COLUMNS}");
        Ok(sqlx::query_as::<_, ProductRow>(&sql)
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price).bind(p.category).bind(p.date_created)
            .fetch_one(&self.pool).await?.into())
    }

    async fn insert_category(&self, c: Category) -> StoreResult<Category> {
        Ok(sqlx::query_as::<_, CategoryRow>("INSERT INTO categories (id, name, icon, color) VALUES ($1, $2, $3, $4) RETURNING id, name, icon, color")
            .bind(c.id).bind(&c.name).bind(&c.icon).bind(&c.color)
            .fetch_one(&self.pool).await?.into())
    }
}
