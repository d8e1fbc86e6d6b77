//! Value Objects for orders

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of units on a line item. Always between one and [`Quantity::MAX`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity every store can hold (a Postgres `INTEGER`).
    pub const MAX: u32 = i32::MAX as u32;

    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 { return Err(QuantityError::NotPositive(value)); }
        match u32::try_from(value) {
            Ok(v) if v <= Self::MAX => Ok(Self(v)),
            _ => Err(QuantityError::TooLarge(value)),
        }
    }
    pub fn value(&self) -> u32 { self.0 }
    /// `unit_price × quantity`, or `None` when it does not fit in a `Decimal`.
    pub fn subtotal(&self, unit_price: Decimal) -> Option<Decimal> { unit_price.checked_mul(Decimal::from(self.0)) }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;
    fn try_from(value: i64) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> u32 { q.0 }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { NotPositive(i64), TooLarge(i64) }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositive(v) => write!(f, "quantity must be at least 1, got {v}"),
            Self::TooLarge(v) => write!(f, "quantity {v} exceeds {}", Quantity::MAX),
        }
    }
}

/// Fulfillment state of an order.
///
/// The set of states is open: any non-blank label is accepted. The
/// associated constants name the labels the storefront uses today.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderStatus(String);

impl OrderStatus {
    pub const PENDING: &'static str = "Pending";
    pub const SHIPPED: &'static str = "Shipped";
    pub const DELIVERED: &'static str = "Delivered";
    pub const CANCELLED: &'static str = "Cancelled";

    pub fn parse(value: impl Into<String>) -> Result<Self, StatusError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() { return Err(StatusError::Blank); }
        Ok(Self(trimmed.to_string()))
    }
    pub fn pending() -> Self { Self(Self::PENDING.to_string()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for OrderStatus { fn default() -> Self { Self::pending() } }

impl TryFrom<String> for OrderStatus {
    type Error = StatusError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(value) }
}

impl From<OrderStatus> for String {
    fn from(s: OrderStatus) -> String { s.0 }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum StatusError { Blank }
impl std::error::Error for StatusError {}
impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "status must not be blank") }
}
