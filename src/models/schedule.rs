// src/models/schedule.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use super::validate_not_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum ScheduleStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// A planned brew. Recipe and equipment references, when set, must resolve
/// within the same brewery; the end date never precedes the start date.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BrewingSchedule {
    pub id: i32,
    pub brewery_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub recipe_id: Option<i32>,
    pub equipment_id: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub batch_size: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BrewingSchedule {
    /// Re-checked after every merge, since a patch can move either endpoint.
    pub fn dates_ordered(&self) -> bool {
        self.end_date >= self.start_date
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_date_order"))]
pub struct NewBrewingSchedule {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub recipe_id: Option<i32>,
    pub equipment_id: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub status: ScheduleStatus,
    #[validate(custom(function = "validate_not_negative"))]
    pub batch_size: Option<Decimal>,
    pub notes: Option<String>,
}

fn validate_date_order(schedule: &NewBrewingSchedule) -> Result<(), ValidationError> {
    if schedule.end_date < schedule.start_date {
        let mut err = ValidationError::new("date_order");
        err.message = Some("endDate must not precede startDate".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BrewingSchedulePatch {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub recipe_id: Option<i32>,
    pub equipment_id: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<ScheduleStatus>,
    #[validate(custom(function = "validate_not_negative"))]
    pub batch_size: Option<Decimal>,
    pub notes: Option<String>,
}

impl BrewingSchedulePatch {
    pub fn apply(self, schedule: &mut BrewingSchedule) {
        if let Some(title) = self.title {
            schedule.title = title;
        }
        if let Some(description) = self.description {
            schedule.description = Some(description);
        }
        if let Some(recipe_id) = self.recipe_id {
            schedule.recipe_id = Some(recipe_id);
        }
        if let Some(equipment_id) = self.equipment_id {
            schedule.equipment_id = Some(equipment_id);
        }
        if let Some(start_date) = self.start_date {
            schedule.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            schedule.end_date = end_date;
        }
        if let Some(status) = self.status {
            schedule.status = status;
        }
        if let Some(batch_size) = self.batch_size {
            schedule.batch_size = Some(batch_size);
        }
        if let Some(notes) = self.notes {
            schedule.notes = Some(notes);
        }
    }
}
