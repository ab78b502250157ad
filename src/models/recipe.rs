// src/models/recipe.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validate_not_negative;

/// A beer recipe. Ingredients and instructions are ordered string lists and
/// must be non-empty once submitted.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: i32,
    pub brewery_id: Option<String>,
    pub name: String,
    pub style: Option<String>,
    pub batch_size: Option<Decimal>,
    pub target_abv: Option<Decimal>,
    pub target_ibu: Option<i32>,
    pub srm: Option<i32>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub fermentation_temp: Option<String>,
    pub fermentation_time: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipe {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub style: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    pub batch_size: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub target_abv: Option<Decimal>,
    #[validate(range(min = 0, message = "targetIbu must not be negative"))]
    pub target_ibu: Option<i32>,
    #[validate(range(min = 0, message = "srm must not be negative"))]
    pub srm: Option<i32>,
    #[validate(length(min = 1, message = "ingredients must have at least one entry"))]
    pub ingredients: Vec<String>,
    #[validate(length(min = 1, message = "instructions must have at least one step"))]
    pub instructions: Vec<String>,
    pub fermentation_temp: Option<String>,
    pub fermentation_time: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecipePatch {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub style: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    pub batch_size: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub target_abv: Option<Decimal>,
    #[validate(range(min = 0, message = "targetIbu must not be negative"))]
    pub target_ibu: Option<i32>,
    #[validate(range(min = 0, message = "srm must not be negative"))]
    pub srm: Option<i32>,
    #[validate(length(min = 1, message = "ingredients must have at least one entry"))]
    pub ingredients: Option<Vec<String>>,
    #[validate(length(min = 1, message = "instructions must have at least one step"))]
    pub instructions: Option<Vec<String>>,
    pub fermentation_temp: Option<String>,
    pub fermentation_time: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl RecipePatch {
    pub fn apply(self, recipe: &mut Recipe) {
        if let Some(name) = self.name {
            recipe.name = name;
        }
        if let Some(style) = self.style {
            recipe.style = Some(style);
        }
        if let Some(batch_size) = self.batch_size {
            recipe.batch_size = Some(batch_size);
        }
        if let Some(target_abv) = self.target_abv {
            recipe.target_abv = Some(target_abv);
        }
        if let Some(target_ibu) = self.target_ibu {
            recipe.target_ibu = Some(target_ibu);
        }
        if let Some(srm) = self.srm {
            recipe.srm = Some(srm);
        }
        if let Some(ingredients) = self.ingredients {
            recipe.ingredients = ingredients;
        }
        if let Some(instructions) = self.instructions {
            recipe.instructions = instructions;
        }
        if let Some(fermentation_temp) = self.fermentation_temp {
            recipe.fermentation_temp = Some(fermentation_temp);
        }
        if let Some(fermentation_time) = self.fermentation_time {
            recipe.fermentation_time = Some(fermentation_time);
        }
        if let Some(description) = self.description {
            recipe.description = Some(description);
        }
        if let Some(image_url) = self.image_url {
            recipe.image_url = Some(image_url);
        }
    }
}
