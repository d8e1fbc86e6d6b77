//! Aggregates module
pub mod catalog;
pub mod order;

pub use catalog::{Category, NewCategory, NewProduct, Product, UserSummary};
pub use order::{
    order_total, CreateOrder, DraftLine, LineItem, LineItemDetails, LineItemRequest, NewLineItem, NewOrder,
    Order, OrderDetails, OrderDraft, PricedLine, ProductDetails, Purchaser, ShippingDetails,
};
