use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shared::{validate_name, validate_quantity};

/// JSON payload carried by the `recipe_data` multipart field.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RecipeData {
    pub name: String,
    pub instructions: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredientInput>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RecipeIngredientInput {
    /// Ingredient id; must reference an existing ingredient.
    pub id: i32,
    pub quantity_grams: f64,
}

/// One entry of a recipe's aggregated ingredient list.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeIngredientItem {
    pub id: i32,
    pub name: String,
    pub quantity_grams: f64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub name: String,
    pub instructions: Option<String>,
    pub image_url: String,
    pub ingredients: Vec<RecipeIngredientItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeResponse {
    pub fn from_parts(
        m: crate::entity::recipe::Model,
        ingredients: Vec<RecipeIngredientItem>,
    ) -> Self {
        Self {
            id: m.id,
            name: m.name,
            instructions: m.instructions,
            image_url: m.image_url,
            ingredients,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_recipe_data(data: &RecipeData) -> Result<(), AppError> {
    validate_name("name", &data.name)?;

    let mut seen = HashSet::new();
    for input in &data.ingredients {
        if !seen.insert(input.id) {
            return Err(AppError::Validation(format!(
                "Duplicate ingredient id {} in recipe",
                input.id
            )));
        }
        validate_quantity(input.quantity_grams)?;
    }
    Ok(())
}
