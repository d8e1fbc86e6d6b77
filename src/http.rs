//! HTTP transport over [`OrderService`].
//!
//! The purchaser arrives in the order body as `user`; authenticating it is
//! the job of whatever sits in front of this router.

use axum::{extract::{Path, State}, http::StatusCode, routing::get, Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;
use uuid::Uuid;

use crate::domain::{Category, CreateOrder, NewCategory, NewProduct, Order, OrderDetails, Product};
use crate::service::{DeleteOutcome, UndeletedLineItem};
use crate::{OrderError, OrderService};

type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn router(service: OrderService, api_url: &str) -> Router {
    let api = Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order).put(update_status).delete(delete_order))
        .route("/orders/get/totalsales", get(total_sales))
        .route("/orders/get/count", get(count_orders))
        .route("/orders/get/userorders/:userid", get(user_orders))
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", get(get_product))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", get(get_category));

    let app = Router::new().route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "eshop-orders"})) }));
    let app = if api_url.is_empty() { app.merge(api) } else { app.nest(api_url, api) };
    app.layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(service)
}

/// Maps a service failure onto a status code. Unknown records referenced
/// from a request body are the client's mistake, hence `reference_status`.
fn reject_with(reference_status: StatusCode) -> impl Fn(OrderError) -> (StatusCode, String) {
    move |e| {
        let status = match &e {
            OrderError::NotFound { .. } => reference_status,
            OrderError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            OrderError::DependencyFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            OrderError::Compensation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %e, store_mutated = e.store_mutated(), "Request failed");
        }
        (status, e.to_string())
    }
}

fn reject(e: OrderError) -> (StatusCode, String) { reject_with(StatusCode::NOT_FOUND)(e) }

#[derive(Debug, Deserialize)]
pub struct PlaceOrder {
    #[serde(flatten)]
    pub order: CreateOrder,
    pub user: Option<Uuid>,
}

#[derive(Debug, Deserialize)] pub struct StatusUpdate { pub status: String }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse { pub success: bool, pub message: String, pub undeleted_line_items: Vec<UndeletedLineItem> }

#[derive(Debug, Serialize)] pub struct TotalSales { pub totalsales: Decimal }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCount { pub order_count: u64 }

async fn list_orders(State(s): State<OrderService>) -> ApiResult<Json<Vec<OrderDetails>>> {
    s.list_orders().await.map(Json).map_err(reject)
}

async fn get_order(State(s): State<OrderService>, Path(id): Path<Uuid>) -> ApiResult<Json<OrderDetails>> {
    s.get_order(id).await.map(Json).map_err(reject)
}

async fn create_order(State(s): State<OrderService>, Json(r): Json<PlaceOrder>) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = s.create_order(r.user, r.order).await.map_err(reject_with(StatusCode::BAD_REQUEST))?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn update_status(State(s): State<OrderService>, Path(id): Path<Uuid>, Json(r): Json<StatusUpdate>) -> ApiResult<Json<Order>> {
    s.set_status(id, &r.status).await.map(Json).map_err(reject)
}

async fn delete_order(State(s): State<OrderService>, Path(id): Path<Uuid>) -> ApiResult<Json<DeleteResponse>> {
    let DeleteOutcome { undeleted, .. } = s.delete_order(id).await.map_err(reject)?;
    let message = if undeleted.is_empty() {
        "Order deleted successfully.".to_string()
    } else {
        format!("Order deleted; {} line item(s) could not be removed.", undeleted.len())
    };
    Ok(Json(DeleteResponse { success: true, message, undeleted_line_items: undeleted }))
}

async fn total_sales(State(s): State<OrderService>) -> ApiResult<Json<TotalSales>> {
    s.total_sales().await.map(|totalsales| Json(TotalSales { totalsales })).map_err(reject)
}

async fn count_orders(State(s): State<OrderService>) -> ApiResult<Json<OrderCount>> {
    s.count_orders().await.map(|order_count| Json(OrderCount { order_count })).map_err(reject)
}

async fn user_orders(State(s): State<OrderService>, Path(user): Path<Uuid>) -> ApiResult<Json<Vec<OrderDetails>>> {
    s.orders_for_user(user).await.map(Json).map_err(reject)
}

async fn list_products(State(s): State<OrderService>) -> ApiResult<Json<Vec<Product>>> {
    s.list_products().await.map(Json).map_err(reject)
}

async fn get_product(State(s): State<OrderService>, Path(id): Path<Uuid>) -> ApiResult<Json<Product>> {
    s.get_product(id).await.map(Json).map_err(reject)
}

async fn create_product(State(s): State<OrderService>, Json(r): Json<NewProduct>) -> ApiResult<(StatusCode, Json<Product>)> {
    let p = s.create_product(r).await.map_err(reject_with(StatusCode::BAD_REQUEST))?;
    Ok((StatusCode::CREATED, Json(p)))
}

async fn list_categories(State(s): State<OrderService>) -> ApiResult<Json<Vec<Category>>> {
    s.list_categories().await.map(Json).map_err(reject)
}

async fn get_category(State(s): State<OrderService>, Path(id): Path<Uuid>) -> ApiResult<Json<Category>> {
    s.get_category(id).await.map(Json).map_err(reject)
}

async fn create_category(State(s): State<OrderService>, Json(r): Json<NewCategory>) -> ApiResult<(StatusCode, Json<Category>)> {
    let c = s.create_category(r).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(c)))
}
