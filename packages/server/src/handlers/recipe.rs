use std::collections::HashMap;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{ingredient, meal_entry, recipe, recipe_ingredient};
use crate::error::{AppError, ErrorBody};
use crate::models::recipe::{
    RecipeData, RecipeIngredientItem, RecipeResponse, validate_recipe_data,
};
use crate::state::AppState;
use crate::storage::{ImageKind, discard_image};

use super::ingredient::UploadedImage;

/// Body limit layer for the multipart recipe routes (20 MB, image + form).
pub fn form_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(20 * 1024 * 1024)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Recipes",
    operation_id = "listRecipes",
    summary = "List all recipes",
    description = "Returns every recipe, ordered by name, each with its aggregated \
        ingredient list.",
    responses(
        (status = 200, description = "List of recipes", body = Vec<RecipeResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let recipes = recipe::Entity::find()
        .order_by_asc(recipe::Column::Name)
        .all(&state.db)
        .await?;

    let links = recipe_ingredient::Entity::find()
        .find_also_related(ingredient::Entity)
        .all(&state.db)
        .await?;

    let mut by_recipe: HashMap<i32, Vec<RecipeIngredientItem>> = HashMap::new();
    for (link, ing) in links {
        // The ingredient always exists; associations are deleted with it.
        if let Some(ing) = ing {
            by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(RecipeIngredientItem {
                    id: ing.id,
                    name: ing.name,
                    quantity_grams: link.quantity_grams,
                });
        }
    }

    Ok(Json(
        recipes
            .into_iter()
            .map(|r| {
                let items = by_recipe.remove(&r.id).unwrap_or_default();
                RecipeResponse::from_parts(r, items)
            })
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Recipes",
    operation_id = "createRecipe",
    summary = "Create a recipe",
    description = "Creates a recipe from a multipart form. The `recipe_data` text field \
        holds JSON `{ name, instructions, ingredients: [{ id, quantity_grams }] }`; an \
        optional `image` file is stored under `/uploads/recipes/`, otherwise the \
        placeholder image is referenced. The recipe and its ingredient associations \
        are written in one transaction.",
    request_body(content_type = "multipart/form-data", description = "recipe_data JSON plus optional image"),
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_recipe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (data, image) = read_recipe_form(&mut multipart).await?;
    validate_recipe_data(&data)?;

    let uploaded_url = match image {
        Some(img) => Some(
            state
                .images
                .save(ImageKind::Recipe, img.file_name.as_deref(), &img.data)
                .await?,
        ),
        None => None,
    };
    let image_url = uploaded_url
        .clone()
        .unwrap_or_else(|| state.config.storage.placeholder_image.clone());

    let result = insert_recipe(&state.db, &data, image_url).await;
    if result.is_err() {
        discard_image(
            &state.images,
            uploaded_url.as_deref(),
            &state.config.storage.placeholder_image,
        )
        .await;
    }
    let (model, items) = result?;

    Ok((
        StatusCode::CREATED,
        Json(RecipeResponse::from_parts(model, items)),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "updateRecipe",
    summary = "Update a recipe",
    description = "Updates a recipe from the same multipart form as creation. The \
        ingredient association set is fully replaced (delete-then-reinsert) in the \
        same transaction as the row update. A new `image` replaces the previous one; \
        the old file is deleted best-effort unless it is the placeholder.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body(content_type = "multipart/form-data", description = "recipe_data JSON plus optional image"),
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart), fields(id))]
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<RecipeResponse>, AppError> {
    let (data, image) = read_recipe_form(&mut multipart).await?;
    validate_recipe_data(&data)?;

    let existing = find_recipe(&state.db, id).await?;
    let previous_image = existing.image_url.clone();

    let uploaded_url = match image {
        Some(img) => Some(
            state
                .images
                .save(ImageKind::Recipe, img.file_name.as_deref(), &img.data)
                .await?,
        ),
        None => None,
    };

    let result = replace_recipe(&state.db, existing, &data, uploaded_url.clone()).await;
    if result.is_err() {
        discard_image(
            &state.images,
            uploaded_url.as_deref(),
            &state.config.storage.placeholder_image,
        )
        .await;
    }
    let (model, items) = result?;

    // The old file is unreferenced once the new URL is stored.
    if uploaded_url.is_some() {
        discard_image(
            &state.images,
            Some(&previous_image),
            &state.config.storage.placeholder_image,
        )
        .await;
    }

    Ok(Json(RecipeResponse::from_parts(model, items)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "deleteRecipe",
    summary = "Delete a recipe",
    description = "Deletes a recipe together with its ingredient associations and \
        planner entries, and best-effort deletes its image file (placeholder exempt).",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_recipe(&state.db, id).await?;

    discard_image(
        &state.images,
        Some(&existing.image_url),
        &state.config.storage.placeholder_image,
    )
    .await;

    let txn = state.db.begin().await?;
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(id))
        .exec(&txn)
        .await?;
    meal_entry::Entity::delete_many()
        .filter(meal_entry::Column::RecipeId.eq(id))
        .exec(&txn)
        .await?;
    recipe::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_recipe<C: ConnectionTrait>(db: &C, id: i32) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".into()))
}

/// Insert the recipe row and its association set in one transaction.
async fn insert_recipe(
    db: &DatabaseConnection,
    data: &RecipeData,
    image_url: String,
) -> Result<(recipe::Model, Vec<RecipeIngredientItem>), AppError> {
    let txn = db.begin().await?;
    ensure_ingredients_exist(&txn, data).await?;

    let now = chrono::Utc::now();
    let model = recipe::ActiveModel {
        name: Set(data.name.trim().to_string()),
        instructions: Set(data.instructions.clone()),
        image_url: Set(image_url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    insert_links(&txn, model.id, data).await?;
    let items = load_ingredient_items(&txn, model.id).await?;
    txn.commit().await?;

    Ok((model, items))
}

/// Update the recipe row and replace its association set in one transaction.
async fn replace_recipe(
    db: &DatabaseConnection,
    existing: recipe::Model,
    data: &RecipeData,
    uploaded_url: Option<String>,
) -> Result<(recipe::Model, Vec<RecipeIngredientItem>), AppError> {
    let id = existing.id;

    let txn = db.begin().await?;
    ensure_ingredients_exist(&txn, data).await?;

    let mut active: recipe::ActiveModel = existing.into();
    active.name = Set(data.name.trim().to_string());
    active.instructions = Set(data.instructions.clone());
    if let Some(url) = uploaded_url {
        active.image_url = Set(url);
    }
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&txn).await?;

    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(id))
        .exec(&txn)
        .await?;
    insert_links(&txn, id, data).await?;

    let items = load_ingredient_items(&txn, id).await?;
    txn.commit().await?;

    Ok((model, items))
}

async fn insert_links(
    txn: &DatabaseTransaction,
    recipe_id: i32,
    data: &RecipeData,
) -> Result<(), AppError> {
    if data.ingredients.is_empty() {
        return Ok(());
    }
    let links = data.ingredients.iter().map(|input| {
        recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(input.id),
            quantity_grams: Set(input.quantity_grams),
        }
    });
    recipe_ingredient::Entity::insert_many(links)
        .exec(txn)
        .await?;
    Ok(())
}

async fn ensure_ingredients_exist<C: ConnectionTrait>(
    db: &C,
    data: &RecipeData,
) -> Result<(), AppError> {
    if data.ingredients.is_empty() {
        return Ok(());
    }
    let ids: Vec<i32> = data.ingredients.iter().map(|input| input.id).collect();
    let found = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ids.clone()))
        .count(db)
        .await?;
    if found != ids.len() as u64 {
        return Err(AppError::Validation(
            "Recipe references an unknown ingredient id".into(),
        ));
    }
    Ok(())
}

/// Current association set of a recipe, with ingredient names resolved.
async fn load_ingredient_items<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
) -> Result<Vec<RecipeIngredientItem>, AppError> {
    let rows = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(link, ing)| {
            ing.map(|ing| RecipeIngredientItem {
                id: ing.id,
                name: ing.name,
                quantity_grams: link.quantity_grams,
            })
        })
        .collect())
}

/// Drain the multipart form into the recipe payload and an optional image file.
async fn read_recipe_form(
    multipart: &mut Multipart,
) -> Result<(RecipeData, Option<UploadedImage>), AppError> {
    let mut data: Option<RecipeData> = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("recipe_data") => {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read recipe_data: {e}"))
                })?;
                data = Some(serde_json::from_str(&text).map_err(|e| {
                    AppError::Validation(format!("Invalid recipe_data JSON: {e}"))
                })?);
            }
            Some("image") => {
                let file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read image: {e}")))?;
                if !bytes.is_empty() {
                    image = Some(UploadedImage {
                        file_name,
                        data: bytes,
                    });
                }
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let data = data.ok_or_else(|| AppError::Validation("Missing 'recipe_data' field".into()))?;
    Ok((data, image))
}
