// src/models/source.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Where an ingredient can be bought: supplier, location and an optional
/// pair of geocoordinates for the sourcing map.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IngredientSource {
    pub id: i32,
    pub brewery_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub source_type: String,
    pub supplier: String,
    pub location: String,
    pub contact: Option<String>,
    pub rating: Option<i32>,
    pub notes: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewIngredientSource {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type is required"))]
    pub source_type: String,
    #[validate(length(min = 1, message = "supplier is required"))]
    pub supplier: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    pub contact: Option<String>,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    pub notes: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IngredientSourcePatch {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub contact: Option<String>,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    pub notes: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
}

impl IngredientSourcePatch {
    pub fn apply(self, source: &mut IngredientSource) {
        if let Some(name) = self.name {
            source.name = name;
        }
        if let Some(source_type) = self.source_type {
            source.source_type = source_type;
        }
        if let Some(supplier) = self.supplier {
            source.supplier = supplier;
        }
        if let Some(location) = self.location {
            source.location = location;
        }
        if let Some(contact) = self.contact {
            source.contact = Some(contact);
        }
        if let Some(rating) = self.rating {
            source.rating = Some(rating);
        }
        if let Some(notes) = self.notes {
            source.notes = Some(notes);
        }
        if let Some(latitude) = self.latitude {
            source.latitude = Some(latitude);
        }
        if let Some(longitude) = self.longitude {
            source.longitude = Some(longitude);
        }
    }
}
