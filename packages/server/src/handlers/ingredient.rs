use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{ingredient, meal_entry, recipe_ingredient};
use crate::error::{AppError, ErrorBody};
use crate::models::ingredient::{IngredientForm, IngredientResponse, validate_ingredient_form};
use crate::state::AppState;
use crate::storage::{ImageKind, discard_image};

/// Body limit layer for the multipart ingredient routes (20 MB, image + form).
pub fn form_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(20 * 1024 * 1024)
}

/// An image file pulled out of a multipart form.
pub(crate) struct UploadedImage {
    pub file_name: Option<String>,
    pub data: axum::body::Bytes,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Ingredients",
    operation_id = "listIngredients",
    summary = "List all ingredients",
    description = "Returns every ingredient, ordered by name.",
    responses(
        (status = 200, description = "List of ingredients", body = Vec<IngredientResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let rows = ingredient::Entity::find()
        .order_by_asc(ingredient::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(IngredientResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Ingredients",
    operation_id = "createIngredient",
    summary = "Create an ingredient",
    description = "Creates an ingredient from a multipart form. Text fields: `name` \
        (required), `category`, `calories`, `protein`, `carbs`, `fat`, `fiber`, \
        `price`, `per_unit`. An optional `image` file is stored under \
        `/uploads/ingredients/`. Nutrition values are per `per_unit` grams.",
    request_body(content_type = "multipart/form-data", description = "Ingredient form with optional image"),
    responses(
        (status = 201, description = "Ingredient created", body = IngredientResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Name already in use (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (form, image) = read_ingredient_form(&mut multipart).await?;
    let name = validate_ingredient_form(&form)?;

    let image_url = match image {
        Some(img) => Some(
            state
                .images
                .save(ImageKind::Ingredient, img.file_name.as_deref(), &img.data)
                .await?,
        ),
        None => None,
    };

    let new_ingredient = ingredient::ActiveModel {
        name: Set(name),
        category: Set(form.category),
        calories: Set(form.calories),
        protein: Set(form.protein),
        carbs: Set(form.carbs),
        fat: Set(form.fat),
        fiber: Set(form.fiber),
        price: Set(form.price),
        per_unit: Set(form.per_unit.unwrap_or(100)),
        image_url: Set(image_url.clone()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = match new_ingredient.insert(&state.db).await {
        Ok(model) => model,
        Err(e) => {
            // The row was never written; the upload is unreferenced.
            discard_image(
                &state.images,
                image_url.as_deref(),
                &state.config.storage.placeholder_image,
            )
            .await;
            return Err(map_unique_name(e));
        }
    };

    Ok((StatusCode::CREATED, Json(IngredientResponse::from(model))))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Ingredients",
    operation_id = "updateIngredient",
    summary = "Update an ingredient",
    description = "Replaces an ingredient's scalar fields from the same multipart form \
        as creation. Uploading a new `image` deletes the previous image file \
        (best effort); without one the existing image is kept.",
    params(("id" = i32, Path, description = "Ingredient ID")),
    request_body(content_type = "multipart/form-data", description = "Ingredient form with optional image"),
    responses(
        (status = 200, description = "Ingredient updated", body = IngredientResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already in use (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart), fields(id))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<IngredientResponse>, AppError> {
    let (form, image) = read_ingredient_form(&mut multipart).await?;
    let name = validate_ingredient_form(&form)?;

    let existing = find_ingredient(&state.db, id).await?;
    let previous_image = existing.image_url.clone();

    let new_image_url = match image {
        Some(img) => Some(
            state
                .images
                .save(ImageKind::Ingredient, img.file_name.as_deref(), &img.data)
                .await?,
        ),
        None => None,
    };

    let mut active: ingredient::ActiveModel = existing.into();
    active.name = Set(name);
    active.category = Set(form.category);
    active.calories = Set(form.calories);
    active.protein = Set(form.protein);
    active.carbs = Set(form.carbs);
    active.fat = Set(form.fat);
    active.fiber = Set(form.fiber);
    active.price = Set(form.price);
    if let Some(per_unit) = form.per_unit {
        active.per_unit = Set(per_unit);
    }
    if let Some(ref url) = new_image_url {
        active.image_url = Set(Some(url.clone()));
    }

    let model = match active.update(&state.db).await {
        Ok(model) => model,
        Err(e) => {
            discard_image(
                &state.images,
                new_image_url.as_deref(),
                &state.config.storage.placeholder_image,
            )
            .await;
            return Err(map_unique_name(e));
        }
    };

    // The old file is unreferenced once the new URL is stored.
    if new_image_url.is_some() {
        discard_image(
            &state.images,
            previous_image.as_deref(),
            &state.config.storage.placeholder_image,
        )
        .await;
    }

    Ok(Json(IngredientResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Ingredients",
    operation_id = "deleteIngredient",
    summary = "Delete an ingredient",
    description = "Deletes an ingredient together with its recipe associations and \
        planner entries, and best-effort deletes its image file.",
    params(("id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_ingredient(&state.db, id).await?;

    discard_image(
        &state.images,
        existing.image_url.as_deref(),
        &state.config.storage.placeholder_image,
    )
    .await;

    let txn = state.db.begin().await?;
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::IngredientId.eq(id))
        .exec(&txn)
        .await?;
    meal_entry::Entity::delete_many()
        .filter(meal_entry::Column::IngredientId.eq(id))
        .exec(&txn)
        .await?;
    ingredient::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_ingredient<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<ingredient::Model, AppError> {
    ingredient::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient not found".into()))
}

fn map_unique_name(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("An ingredient with this name already exists".into())
        }
        _ => AppError::from(e),
    }
}

/// Drain the multipart form into scalar fields and an optional image file.
async fn read_ingredient_form(
    multipart: &mut Multipart,
) -> Result<(IngredientForm, Option<UploadedImage>), AppError> {
    let mut form = IngredientForm::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        if name == "image" {
            let file_name = field.file_name().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read image: {e}")))?;
            // Browsers submit an empty file part when no image is picked.
            if !data.is_empty() {
                image = Some(UploadedImage { file_name, data });
            }
        } else {
            let text = field.text().await.map_err(|e| {
                AppError::Validation(format!("Failed to read field '{name}': {e}"))
            })?;
            apply_text_field(&mut form, &name, &text)?;
        }
    }

    Ok((form, image))
}

fn apply_text_field(form: &mut IngredientForm, name: &str, value: &str) -> Result<(), AppError> {
    // Untouched form inputs arrive as empty strings; treat them as absent.
    let value = value.trim();
    match name {
        "name" => form.name = Some(value.to_string()),
        "category" => {
            if !value.is_empty() {
                form.category = Some(value.to_string());
            }
        }
        "calories" => form.calories = parse_amount(name, value)?,
        "protein" => form.protein = parse_amount(name, value)?,
        "carbs" => form.carbs = parse_amount(name, value)?,
        "fat" => form.fat = parse_amount(name, value)?,
        "fiber" => form.fiber = parse_amount(name, value)?,
        "price" => form.price = parse_amount(name, value)?,
        "per_unit" => {
            if !value.is_empty() {
                form.per_unit = Some(value.parse::<i32>().map_err(|_| {
                    AppError::Validation("per_unit must be an integer".into())
                })?);
            }
        }
        _ => {} // Ignore unknown fields.
    }
    Ok(())
}

fn parse_amount(field: &str, value: &str) -> Result<Option<f64>, AppError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{field} must be a number")))
}
