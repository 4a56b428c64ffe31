use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::models::shared::{validate_name, validate_optional_amount};

/// Scalar fields parsed out of the ingredient multipart form.
/// The optional image file is handled separately by the handler.
#[derive(Debug, Default)]
pub struct IngredientForm {
    pub name: Option<String>,
    pub category: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub price: Option<f64>,
    pub per_unit: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub price: Option<f64>,
    /// Gram amount the nutrition values and price refer to.
    #[schema(example = 100)]
    pub per_unit: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::ingredient::Model> for IngredientResponse {
    fn from(m: crate::entity::ingredient::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            category: m.category,
            calories: m.calories,
            protein: m.protein,
            carbs: m.carbs,
            fat: m.fat,
            fiber: m.fiber,
            price: m.price,
            per_unit: m.per_unit,
            image_url: m.image_url,
            created_at: m.created_at,
        }
    }
}

/// Validate the form and return the trimmed ingredient name.
pub fn validate_ingredient_form(form: &IngredientForm) -> Result<String, AppError> {
    let name = form
        .name
        .as_deref()
        .ok_or_else(|| AppError::Validation("name is required".into()))?;
    validate_name("name", name)?;

    validate_optional_amount("calories", form.calories)?;
    validate_optional_amount("protein", form.protein)?;
    validate_optional_amount("carbs", form.carbs)?;
    validate_optional_amount("fat", form.fat)?;
    validate_optional_amount("fiber", form.fiber)?;
    validate_optional_amount("price", form.price)?;
    if let Some(per_unit) = form.per_unit
        && per_unit < 1
    {
        return Err(AppError::Validation("per_unit must be >= 1".into()));
    }

    Ok(name.trim().to_string())
}
