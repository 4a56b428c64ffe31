pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Larder API",
        version = "1.0.0",
        description = "API for the Larder ingredient, recipe and meal-planning backend"
    ),
    paths(
        handlers::ingredient::list_ingredients,
        handlers::ingredient::create_ingredient,
        handlers::ingredient::update_ingredient,
        handlers::ingredient::delete_ingredient,
        handlers::recipe::list_recipes,
        handlers::recipe::create_recipe,
        handlers::recipe::update_recipe,
        handlers::recipe::delete_recipe,
        handlers::planner::create_plan_entry,
        handlers::planner::delete_plan_entry,
        handlers::planner::list_plan_day,
    ),
    tags(
        (name = "Ingredients", description = "Ingredient CRUD with image upload"),
        (name = "Recipes", description = "Recipe CRUD with ingredient associations"),
        (name = "Meal Planner", description = "Dated meal-planning calendar"),
    ),
)]
struct ApiDoc;

/// Build the application router.
///
/// API routes live under `/api/v1`; everything else falls through to the
/// static file service over `public_dir` (uploaded images and the client
/// application shell, with `index.html` as SPA fallback).
pub fn build_router(state: AppState) -> axum::Router {
    let public_dir = state.config.storage.public_dir.clone();
    let client = ServeDir::new(&public_dir).fallback(ServeFile::new(public_dir.join("index.html")));
    let cors = cors_layer(&state.config.server.cors);

    axum::Router::new()
        .nest("/api", routes::api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .fallback_service(client)
        .layer(cors)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(config.max_age));

    if config.allow_origins.is_empty() {
        return layer;
    }
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
