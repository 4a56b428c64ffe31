use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meal_entry")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub date: Date,
    /// Meal slot label, e.g. "breakfast", "lunch", "dinner", "snack".
    pub meal_type: String,

    /// NULL unless the entry references a recipe.
    pub recipe_id: Option<i32>,
    #[sea_orm(belongs_to, from = "recipe_id", to = "id")]
    pub recipe: BelongsTo<Option<super::recipe::Entity>>,

    /// NULL unless the entry references a raw ingredient.
    pub ingredient_id: Option<i32>,
    #[sea_orm(belongs_to, from = "ingredient_id", to = "id")]
    pub ingredient: BelongsTo<Option<super::ingredient::Entity>>,

    pub quantity_grams: Option<f64>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
