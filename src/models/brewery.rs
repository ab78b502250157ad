// src/models/brewery.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A brewery account: the root of tenant isolation. Every tenant-scoped
/// record carries a reference back to one of these opaque ids.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Brewery {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub brewery_type: String,
    pub location: String,
    pub founded_year: Option<i32>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub brewing_capacity: Option<String>,
    pub specialties: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape: what a caller supplies before the id and timestamps exist.
/// The id is never part of it; backends mint a random unique tenant id.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBrewery {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type is required"))]
    pub brewery_type: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    pub founded_year: Option<i32>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub brewing_capacity: Option<String>,
    pub specialties: Option<String>,
}

/// Partial update. `None` fields are left untouched; there is no way to
/// clear an optional field through a patch.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BreweryPatch {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type must not be empty"))]
    pub brewery_type: Option<String>,
    #[validate(length(min = 1, message = "location must not be empty"))]
    pub location: Option<String>,
    pub founded_year: Option<i32>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub brewing_capacity: Option<String>,
    pub specialties: Option<String>,
}

impl BreweryPatch {
    /// Shallow merge onto an existing record. Both backends go through this
    /// so their update semantics cannot drift. Timestamps are the backend's
    /// job, not the patch's.
    pub fn apply(self, brewery: &mut Brewery) {
        if let Some(name) = self.name {
            brewery.name = name;
        }
        if let Some(brewery_type) = self.brewery_type {
            brewery.brewery_type = brewery_type;
        }
        if let Some(location) = self.location {
            brewery.location = location;
        }
        if let Some(founded_year) = self.founded_year {
            brewery.founded_year = Some(founded_year);
        }
        if let Some(website) = self.website {
            brewery.website = Some(website);
        }
        if let Some(phone) = self.phone {
            brewery.phone = Some(phone);
        }
        if let Some(brewing_capacity) = self.brewing_capacity {
            brewery.brewing_capacity = Some(brewing_capacity);
        }
        if let Some(specialties) = self.specialties {
            brewery.specialties = Some(specialties);
        }
    }
}
