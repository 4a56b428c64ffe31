use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{ingredient, meal_entry, recipe};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::planner::{
    CreatePlanEntryRequest, PlanEntryResponse, PlanItemType, PlannerDayItem,
    validate_create_plan_entry,
};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Meal Planner",
    operation_id = "createPlanEntry",
    summary = "Add an entry to the meal plan",
    description = "Schedules either a recipe or an ingredient portion for a date and \
        meal slot. `item_type` selects which; ingredient entries also require \
        `quantity_grams`. The referenced recipe or ingredient must exist.",
    request_body = CreatePlanEntryRequest,
    responses(
        (status = 201, description = "Entry created", body = PlanEntryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Referenced item not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(date = %payload.date))]
pub async fn create_plan_entry(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePlanEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item_type = validate_create_plan_entry(&payload)?;

    let mut new_entry = meal_entry::ActiveModel {
        date: Set(payload.date),
        meal_type: Set(payload.meal_type.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match item_type {
        PlanItemType::Recipe => {
            recipe::Entity::find_by_id(payload.item_id)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Recipe not found".into()))?;
            new_entry.recipe_id = Set(Some(payload.item_id));
        }
        PlanItemType::Ingredient => {
            ingredient::Entity::find_by_id(payload.item_id)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Ingredient not found".into()))?;
            new_entry.ingredient_id = Set(Some(payload.item_id));
            new_entry.quantity_grams = Set(payload.quantity_grams);
        }
    }

    let model = new_entry.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(PlanEntryResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Meal Planner",
    operation_id = "deletePlanEntry",
    summary = "Remove an entry from the meal plan",
    params(("id" = i32, Path, description = "Plan entry ID")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_plan_entry(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    meal_entry::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Plan entry not found".into()))?;

    meal_entry::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{date}",
    tag = "Meal Planner",
    operation_id = "listPlanDay",
    summary = "List the plan for a date",
    description = "Returns every entry for the date (`YYYY-MM-DD`), each enriched \
        with the referenced recipe's name and image or the referenced ingredient's \
        name, image and nutrition, so the day renders from a single response.",
    params(("date" = String, Path, description = "Calendar date, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Entries for the date", body = Vec<PlannerDayItem>),
        (status = 400, description = "Malformed date (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_plan_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Vec<PlannerDayItem>>, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("date must be formatted YYYY-MM-DD".into()))?;

    let entries = meal_entry::Entity::find()
        .filter(meal_entry::Column::Date.eq(date))
        .order_by_asc(meal_entry::Column::Id)
        .all(&state.db)
        .await?;

    let recipe_ids: Vec<i32> = entries.iter().filter_map(|e| e.recipe_id).collect();
    let ingredient_ids: Vec<i32> = entries.iter().filter_map(|e| e.ingredient_id).collect();

    let recipes: HashMap<i32, recipe::Model> = if recipe_ids.is_empty() {
        HashMap::new()
    } else {
        recipe::Entity::find()
            .filter(recipe::Column::Id.is_in(recipe_ids))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect()
    };
    let ingredients: HashMap<i32, ingredient::Model> = if ingredient_ids.is_empty() {
        HashMap::new()
    } else {
        ingredient::Entity::find()
            .filter(ingredient::Column::Id.is_in(ingredient_ids))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect()
    };

    let items = entries
        .into_iter()
        .map(|entry| {
            let recipe = entry.recipe_id.and_then(|id| recipes.get(&id));
            let ing = entry.ingredient_id.and_then(|id| ingredients.get(&id));
            PlannerDayItem {
                id: entry.id,
                date: entry.date,
                meal_type: entry.meal_type,
                recipe_id: entry.recipe_id,
                ingredient_id: entry.ingredient_id,
                quantity_grams: entry.quantity_grams,
                recipe_name: recipe.map(|r| r.name.clone()),
                recipe_image: recipe.map(|r| r.image_url.clone()),
                ingredient_name: ing.map(|i| i.name.clone()),
                ingredient_image: ing.and_then(|i| i.image_url.clone()),
                calories: ing.and_then(|i| i.calories),
                protein: ing.and_then(|i| i.protein),
                carbs: ing.and_then(|i| i.carbs),
                fat: ing.and_then(|i| i.fat),
                fiber: ing.and_then(|i| i.fiber),
                price: ing.and_then(|i| i.price),
                per_unit: ing.map(|i| i.per_unit),
            }
        })
        .collect();

    Ok(Json(items))
}
