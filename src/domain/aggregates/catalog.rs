//! Catalog records owned by the product subsystem.
//!
//! Orders only reference these by id. They are read to price line items and
//! to populate order views.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::order::not_blank;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: Option<Uuid>,
    pub date_created: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category { pub id: Uuid, pub name: String, pub icon: Option<String>, pub color: Option<String> }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary { pub id: Uuid, pub name: String }

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "non_negative")]
    pub price: Decimal,
    pub category: Option<Uuid>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewCategory {
    #[validate(custom = "not_blank")]
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() { return Err(ValidationError::new("negative")); }
    Ok(())
}

impl Product {
    pub fn create(new: NewProduct) -> Self {
        Self {
            id: Uuid::now_v7(), name: new.name.trim().to_string(), description: new.description,
            price: new.price, category: new.category, date_created: Utc::now(),
        }
    }
}

impl Category {
    pub fn create(new: NewCategory) -> Self {
        Self { id: Uuid::now_v7(), name: new.name.trim().to_string(), icon: new.icon, color: new.color }
    }
}
