//! eshop order service
//!
//! Order assembly, lifecycle and reporting for a storefront backend.
//!
//! ## Features
//! - Order assembly with line-item pricing and a cached order total
//! - Compensating cleanup when assembly fails part way through
//! - Status updates and cascading order deletion
//! - Sales reporting (count, total sales, per-user history)
//! - In-memory and Postgres persistence
//! - Order events published over NATS

pub mod config;
pub mod domain;
pub mod http;
pub mod publisher;
pub mod service;
pub mod store;

use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub use config::AppConfig;
pub use service::{DeleteOutcome, OrderService};

// =============================================================================
// Error Types
// =============================================================================

/// Kind of record an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    Order,
    LineItem,
    Product,
    Category,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order => write!(f, "Order"),
            Self::LineItem => write!(f, "Line item"),
            Self::Product => write!(f, "Product"),
            Self::Category => write!(f, "Category"),
        }
    }
}

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: Uuid },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Dependency failed: {0}")]
    DependencyFailed(String),

    /// The operation failed and the cleanup that should have undone its
    /// partial writes failed too. `order` is an order that may still be in
    /// the store; `orphaned` lists the line items that are.
    #[error("{cause}; cleanup left {} behind", leftovers(.order, .orphaned))]
    Compensation { cause: Box<OrderError>, order: Option<Uuid>, orphaned: Vec<Uuid> },
}

fn leftovers(order: &Option<Uuid>, orphaned: &[Uuid]) -> String {
    match order {
        Some(id) => format!("order {id} and {} line item(s)", orphaned.len()),
        None => format!("{} line item(s)", orphaned.len()),
    }
}

impl OrderError {
    pub fn not_found(entity: Entity, id: Uuid) -> Self { Self::NotFound { entity, id } }

    /// True when the failed operation left records behind in the store.
    pub fn store_mutated(&self) -> bool {
        matches!(self, Self::Compensation { .. })
    }

    /// The failure that started the operation's unwinding.
    pub fn root_cause(&self) -> &OrderError {
        match self {
            Self::Compensation { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

impl From<store::StoreError> for OrderError {
    fn from(e: store::StoreError) -> Self { Self::DependencyFailed(e.to_string()) }
}

impl From<validator::ValidationErrors> for OrderError {
    fn from(e: validator::ValidationErrors) -> Self { Self::ValidationFailed(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, OrderError>;
