use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/ingredients", ingredient_routes())
        .nest("/recipes", recipe_routes())
        .nest("/planner", planner_routes())
}

fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::ingredient::list_ingredients)
                .post(handlers::ingredient::create_ingredient),
        )
        .route(
            "/{id}",
            put(handlers::ingredient::update_ingredient)
                .delete(handlers::ingredient::delete_ingredient),
        )
        .layer(handlers::ingredient::form_body_limit())
}

fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::recipe::list_recipes).post(handlers::recipe::create_recipe),
        )
        .route(
            "/{id}",
            put(handlers::recipe::update_recipe)
                .delete(handlers::recipe::delete_recipe),
        )
        .layer(handlers::recipe::form_body_limit())
}

fn planner_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::planner::create_plan_entry))
        // GET takes a YYYY-MM-DD date, DELETE an entry id; axum requires one
        // capture name per segment.
        .route(
            "/{date}",
            get(handlers::planner::list_plan_day).delete(handlers::planner::delete_plan_entry),
        )
}
