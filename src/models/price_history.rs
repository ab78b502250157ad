// src/models/price_history.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validate_not_negative;

/// One observed price for an inventory item. The ingredient reference must
/// resolve to an existing item in the same brewery. Price history is
/// append-mostly: entries carry a creation stamp but no update stamp.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    pub id: i32,
    pub brewery_id: Option<String>,
    pub ingredient_id: i32,
    pub price: Decimal,
    pub supplier: Option<String>,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPriceHistoryEntry {
    pub ingredient_id: i32,
    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,
    pub supplier: Option<String>,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryPatch {
    pub ingredient_id: Option<i32>,
    #[validate(custom(function = "validate_not_negative"))]
    pub price: Option<Decimal>,
    pub supplier: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl PriceHistoryPatch {
    pub fn apply(self, entry: &mut PriceHistoryEntry) {
        if let Some(ingredient_id) = self.ingredient_id {
            entry.ingredient_id = ingredient_id;
        }
        if let Some(price) = self.price {
            entry.price = price;
        }
        if let Some(supplier) = self.supplier {
            entry.supplier = Some(supplier);
        }
        if let Some(date) = self.date {
            entry.date = date;
        }
        if let Some(notes) = self.notes {
            entry.notes = Some(notes);
        }
    }
}
