// src/models/equipment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Operational state of a piece of equipment. New equipment defaults to
/// `available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EquipmentStatus {
    #[default]
    Available,
    Active,
    Maintenance,
    Retired,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: i32,
    pub brewery_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub equipment_type: String,
    pub capacity: Option<String>,
    pub status: EquipmentStatus,
    pub location: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub last_maintenance: Option<DateTime<Utc>>,
    pub next_maintenance: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEquipment {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type is required"))]
    pub equipment_type: String,
    pub capacity: Option<String>,
    #[serde(default)]
    pub status: EquipmentStatus,
    pub location: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub last_maintenance: Option<DateTime<Utc>>,
    pub next_maintenance: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentPatch {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type must not be empty"))]
    pub equipment_type: Option<String>,
    pub capacity: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub location: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub last_maintenance: Option<DateTime<Utc>>,
    pub next_maintenance: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

impl EquipmentPatch {
    pub fn apply(self, equipment: &mut Equipment) {
        if let Some(name) = self.name {
            equipment.name = name;
        }
        if let Some(equipment_type) = self.equipment_type {
            equipment.equipment_type = equipment_type;
        }
        if let Some(capacity) = self.capacity {
            equipment.capacity = Some(capacity);
        }
        if let Some(status) = self.status {
            equipment.status = status;
        }
        if let Some(location) = self.location {
            equipment.location = Some(location);
        }
        if let Some(purchase_date) = self.purchase_date {
            equipment.purchase_date = Some(purchase_date);
        }
        if let Some(last_maintenance) = self.last_maintenance {
            equipment.last_maintenance = Some(last_maintenance);
        }
        if let Some(next_maintenance) = self.next_maintenance {
            equipment.next_maintenance = Some(next_maintenance);
        }
        if let Some(notes) = self.notes {
            equipment.notes = Some(notes);
        }
        if let Some(image_url) = self.image_url {
            equipment.image_url = Some(image_url);
        }
    }
}
