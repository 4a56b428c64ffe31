use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredient")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    pub category: Option<String>,

    // Nutrition and price are per `per_unit` grams.
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub price: Option<f64>,
    #[sea_orm(default_value = 100)]
    pub per_unit: i32,

    /// Public URL of the uploaded image, e.g. `/uploads/ingredients/...`.
    pub image_url: Option<String>,

    #[sea_orm(has_many, via = "recipe_ingredient")]
    pub recipes: HasMany<super::recipe::Entity>,

    #[sea_orm(has_many)]
    pub meal_entries: HasMany<super::meal_entry::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
