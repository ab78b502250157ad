// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validate_not_negative;

fn default_status() -> String {
    "good".to_string()
}

fn default_forecast() -> String {
    "Sufficient".to_string()
}

/// A stocked ingredient or consumable, owned by exactly one brewery
/// (tenant-less rows exist only as in-memory demo data).
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: i32,
    pub brewery_id: Option<String>,
    pub name: String,
    pub quantity: i32,
    pub current_quantity: i32,
    pub minimum_quantity: i32,
    pub unit: String,
    pub location: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub cost: Option<Decimal>,
    pub supplier: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub forecast: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(range(min = 0, message = "quantity must not be negative"))]
    pub quantity: i32,
    #[validate(range(min = 0, message = "currentQuantity must not be negative"))]
    pub current_quantity: i32,
    #[validate(range(min = 0, message = "minimumQuantity must not be negative"))]
    pub minimum_quantity: i32,
    #[validate(length(min = 1, message = "unit is required"))]
    pub unit: String,
    pub location: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    #[validate(custom(function = "validate_not_negative"))]
    pub cost: Option<Decimal>,
    pub supplier: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_forecast")]
    pub forecast: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemPatch {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(range(min = 0, message = "quantity must not be negative"))]
    pub quantity: Option<i32>,
    #[validate(range(min = 0, message = "currentQuantity must not be negative"))]
    pub current_quantity: Option<i32>,
    #[validate(range(min = 0, message = "minimumQuantity must not be negative"))]
    pub minimum_quantity: Option<i32>,
    #[validate(length(min = 1, message = "unit must not be empty"))]
    pub unit: Option<String>,
    pub location: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    #[validate(custom(function = "validate_not_negative"))]
    pub cost: Option<Decimal>,
    pub supplier: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<String>,
    pub forecast: Option<String>,
}

impl InventoryItemPatch {
    pub fn apply(self, item: &mut InventoryItem) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(current_quantity) = self.current_quantity {
            item.current_quantity = current_quantity;
        }
        if let Some(minimum_quantity) = self.minimum_quantity {
            item.minimum_quantity = minimum_quantity;
        }
        if let Some(unit) = self.unit {
            item.unit = unit;
        }
        if let Some(location) = self.location {
            item.location = Some(location);
        }
        if let Some(expiration_date) = self.expiration_date {
            item.expiration_date = Some(expiration_date);
        }
        if let Some(cost) = self.cost {
            item.cost = Some(cost);
        }
        if let Some(supplier) = self.supplier {
            item.supplier = Some(supplier);
        }
        if let Some(barcode) = self.barcode {
            item.barcode = Some(barcode);
        }
        if let Some(category) = self.category {
            item.category = Some(category);
        }
        if let Some(notes) = self.notes {
            item.notes = Some(notes);
        }
        if let Some(image_url) = self.image_url {
            item.image_url = Some(image_url);
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(forecast) = self.forecast {
            item.forecast = forecast;
        }
    }
}
