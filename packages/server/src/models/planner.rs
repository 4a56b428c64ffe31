use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shared::{validate_name, validate_quantity};

/// What a planner entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanItemType {
    Recipe,
    Ingredient,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreatePlanEntryRequest {
    /// Calendar date the entry belongs to (`YYYY-MM-DD`).
    pub date: NaiveDate,
    /// Meal slot label, e.g. "breakfast", "lunch", "dinner", "snack".
    pub meal_type: String,
    /// Either `recipe` or `ingredient`.
    #[schema(example = "recipe")]
    pub item_type: String,
    /// Id of the referenced recipe or ingredient.
    pub item_id: i32,
    /// Portion size; required when `item_type` is `ingredient`.
    pub quantity_grams: Option<f64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PlanEntryResponse {
    pub id: i32,
    pub date: NaiveDate,
    pub meal_type: String,
    pub recipe_id: Option<i32>,
    pub ingredient_id: Option<i32>,
    pub quantity_grams: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::meal_entry::Model> for PlanEntryResponse {
    fn from(m: crate::entity::meal_entry::Model) -> Self {
        Self {
            id: m.id,
            date: m.date,
            meal_type: m.meal_type,
            recipe_id: m.recipe_id,
            ingredient_id: m.ingredient_id,
            quantity_grams: m.quantity_grams,
            created_at: m.created_at,
        }
    }
}

/// A planner entry joined with the details of whatever it references,
/// so one day query returns everything needed to render the plan.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PlannerDayItem {
    pub id: i32,
    pub date: NaiveDate,
    pub meal_type: String,
    pub recipe_id: Option<i32>,
    pub ingredient_id: Option<i32>,
    pub quantity_grams: Option<f64>,
    pub recipe_name: Option<String>,
    pub recipe_image: Option<String>,
    pub ingredient_name: Option<String>,
    pub ingredient_image: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub price: Option<f64>,
    pub per_unit: Option<i32>,
}

/// Validate the request and resolve its item type.
pub fn validate_create_plan_entry(
    req: &CreatePlanEntryRequest,
) -> Result<PlanItemType, AppError> {
    validate_name("meal_type", &req.meal_type)?;

    match req.item_type.as_str() {
        "recipe" => Ok(PlanItemType::Recipe),
        "ingredient" => {
            let quantity = req.quantity_grams.ok_or_else(|| {
                AppError::Validation(
                    "quantity_grams is required for ingredient entries".into(),
                )
            })?;
            validate_quantity(quantity)?;
            Ok(PlanItemType::Ingredient)
        }
        other => Err(AppError::Validation(format!(
            "item_type must be 'recipe' or 'ingredient', got '{other}'"
        ))),
    }
}
