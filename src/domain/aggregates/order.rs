//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::catalog::{Category, Product};
use crate::domain::value_objects::{OrderStatus, Quantity};
use crate::OrderError;

/// One persisted order line. Never updated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem { pub id: Uuid, pub product: Uuid, pub quantity: Quantity }

/// A line item to persist. The caller picks `id` so that a write whose
/// outcome is unknown can still be deleted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewLineItem { pub id: Uuid, pub product: Uuid, pub quantity: Quantity }

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub shipping_address1: String,
    pub shipping_address2: Option<String>,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[serde(rename = "orderItems")]
    pub line_items: Vec<Uuid>,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    pub status: OrderStatus,
    /// Cached at assembly time, never recomputed.
    pub total_price: Decimal,
    #[serde(rename = "user")]
    pub purchaser: Option<Uuid>,
    pub date_ordered: DateTime<Utc>,
}

/// Everything the order store needs to persist an order. The store assigns
/// `date_ordered`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub id: Uuid,
    pub line_items: Vec<Uuid>,
    pub shipping: ShippingDetails,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub purchaser: Option<Uuid>,
}

// =============================================================================
// Assembly input
// =============================================================================

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    #[validate(length(min = 1, message = "an order needs at least one line item"))]
    pub order_items: Vec<LineItemRequest>,
    #[validate(custom = "not_blank")]
    pub shipping_address1: String,
    pub shipping_address2: Option<String>,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[validate(custom = "not_blank")]
    pub zip: String,
    #[validate(custom = "not_blank")]
    pub country: String,
    #[validate(custom = "not_blank")]
    pub phone: String,
    pub status: Option<String>,
}

/// Quantity stays signed here so that `0` or `-1` is reported as a
/// validation failure instead of a decode error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineItemRequest { pub product: Uuid, pub quantity: i64 }

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { return Err(ValidationError::new("blank")); }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DraftLine { pub product: Uuid, pub quantity: Quantity }

/// A validated order request, not yet persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderDraft {
    lines: Vec<DraftLine>,
    shipping: ShippingDetails,
    status: OrderStatus,
    purchaser: Option<Uuid>,
}

impl OrderDraft {
    pub fn new(purchaser: Option<Uuid>, request: CreateOrder) -> Result<Self, OrderError> {
        request.validate()?;
        let lines = request.order_items.iter().enumerate()
            .map(|(n, l)| Quantity::new(l.quantity)
                .map(|quantity| DraftLine { product: l.product, quantity })
                .map_err(|e| OrderError::ValidationFailed(format!("orderItems[{n}]: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;
        let status = match request.status {
            Some(s) => OrderStatus::parse(s).map_err(|e| OrderError::ValidationFailed(e.to_string()))?,
            None => OrderStatus::default(),
        };
        let shipping = ShippingDetails {
            shipping_address1: request.shipping_address1.trim().to_string(),
            shipping_address2: request.shipping_address2.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            city: request.city.trim().to_string(),
            zip: request.zip.trim().to_string(),
            country: request.country.trim().to_string(),
            phone: request.phone.trim().to_string(),
        };
        Ok(Self { lines, shipping, status, purchaser })
    }

    pub fn lines(&self) -> &[DraftLine] { &self.lines }
    pub fn purchaser(&self) -> Option<Uuid> { self.purchaser }

    /// Builds the order record once every line has been persisted.
    /// `line_items` must follow the draft's line order.
    pub fn into_new_order(self, id: Uuid, line_items: Vec<Uuid>, total_price: Decimal) -> NewOrder {
        NewOrder {
            id,
            line_items,
            total_price,
            shipping: self.shipping,
            status: self.status,
            purchaser: self.purchaser,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PricedLine { pub product: Uuid, pub quantity: Quantity, pub unit_price: Decimal }

impl PricedLine {
    pub fn subtotal(&self) -> Option<Decimal> { self.quantity.subtotal(self.unit_price) }
}

/// Sum of every line's subtotal. A total that does not fit in a `Decimal`
/// is rejected rather than rounded.
pub fn order_total(lines: &[PricedLine]) -> Result<Decimal, OrderError> {
    lines.iter()
        .try_fold(Decimal::ZERO, |acc, l| l.subtotal().and_then(|s| acc.checked_add(s)))
        .ok_or_else(|| OrderError::ValidationFailed("order total is too large".into()))
}

// =============================================================================
// Populated views
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub id: Uuid,
    #[serde(rename = "orderItems")]
    pub line_items: Vec<LineItemDetails>,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    pub status: OrderStatus,
    pub total_price: Decimal,
    #[serde(rename = "user")]
    pub purchaser: Option<Purchaser>,
    pub date_ordered: DateTime<Utc>,
}

/// `product` is `None` when the catalog no longer has the product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItemDetails { pub id: Uuid, pub quantity: Quantity, pub product: Option<ProductDetails> }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails { pub id: Uuid, pub name: String, pub description: String, pub price: Decimal, pub category: Option<Category> }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchaser { pub id: Uuid, pub name: Option<String> }

impl ProductDetails {
    pub fn new(product: Product, category: Option<Category>) -> Self {
        Self { id: product.id, name: product.name, description: product.description, price: product.price, category }
    }
}

impl OrderDetails {
    pub fn new(order: Order, line_items: Vec<LineItemDetails>, purchaser: Option<Purchaser>) -> Self {
        Self {
            id: order.id, line_items, shipping: order.shipping, status: order.status,
            total_price: order.total_price, purchaser, date_ordered: order.date_ordered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: Vec<LineItemRequest>) -> CreateOrder {
        CreateOrder {
            order_items: items, shipping_address1: "12 Harbour Rd".into(), shipping_address2: Some(" ".into()),
            city: "Lagos".into(), zip: "100001".into(), country: "NG".into(), phone: "+2348000000".into(), status: None,
        }
    }

    #[test]
    fn test_draft_from_valid_request() {
        let p = Uuid::now_v7();
        let draft = OrderDraft::new(None, request(vec![LineItemRequest { product: p, quantity: 2 }])).unwrap();
        assert_eq!(draft.lines(), &[DraftLine { product: p, quantity: Quantity::new(2).unwrap() }]);
        let order = draft.into_new_order(Uuid::now_v7(), vec![Uuid::now_v7()], Decimal::ZERO);
        assert_eq!(order.status, OrderStatus::default());
        assert_eq!(order.shipping.shipping_address2, None);
    }

    #[test]
    fn test_draft_rejects_empty_and_bad_quantity() {
        let empty = OrderDraft::new(None, request(vec![])).unwrap_err();
        assert!(matches!(empty, OrderError::ValidationFailed(ref m) if m.contains("at least one line item")), "{empty}");
        let bad = request(vec![LineItemRequest { product: Uuid::now_v7(), quantity: 0 }]);
        let err = OrderDraft::new(None, bad).unwrap_err();
        assert!(err.to_string().contains("orderItems[0]"));
    }

    #[test]
    fn test_draft_rejects_blank_shipping_field() {
        let mut r = request(vec![LineItemRequest { product: Uuid::now_v7(), quantity: 1 }]);
        r.city = "   ".into();
        assert!(matches!(OrderDraft::new(None, r), Err(OrderError::ValidationFailed(_))));
    }

    #[test]
    fn test_order_total() {
        let lines = [
            PricedLine { product: Uuid::now_v7(), quantity: Quantity::new(2).unwrap(), unit_price: Decimal::new(1000, 2) },
            PricedLine { product: Uuid::now_v7(), quantity: Quantity::new(1).unwrap(), unit_price: Decimal::new(500, 2) },
        ];
        assert_eq!(order_total(&lines).unwrap(), Decimal::new(2500, 2));
        assert_eq!(order_total(&[]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_order_total_rejects_overflow() {
        let big = Decimal::from_i128_with_scale(10_i128.pow(25), 0);
        let product = Uuid::now_v7();
        let multiplied = [PricedLine { product, quantity: Quantity::new(100_000).unwrap(), unit_price: big }];
        assert!(matches!(order_total(&multiplied), Err(OrderError::ValidationFailed(_))));

        let one = Quantity::new(1).unwrap();
        let summed = [PricedLine { product, quantity: one, unit_price: Decimal::MAX }, PricedLine { product, quantity: one, unit_price: Decimal::ONE }];
        assert!(matches!(order_total(&summed), Err(OrderError::ValidationFailed(_))));
    }

    #[test]
    fn test_order_wire_names() {
        let order = Order {
            id: Uuid::nil(), line_items: vec![Uuid::nil()], shipping: ShippingDetails::default(),
            status: OrderStatus::pending(), total_price: Decimal::new(25, 0), purchaser: None, date_ordered: Utc::now(),
        };
        let json = serde_json::to_value(&order).unwrap();
        for key in ["orderItems", "shippingAddress1", "totalPrice", "dateOrdered", "user", "status"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
