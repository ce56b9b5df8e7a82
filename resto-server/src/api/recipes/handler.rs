//! Recipe API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::AppResult;
use shared::models::{Recipe, RecipeLineInput, Role};

use crate::api::run_blocking;
use crate::auth::{CurrentActor, require_role};
use crate::core::ServerState;

/// GET /api/recipes/{menu_item_id}
pub async fn get_recipe(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(menu_item_id): Path<i64>,
) -> AppResult<Json<Recipe>> {
    require_role(
        &actor,
        &[Role::Cook, Role::Waiter, Role::Cashier, Role::Admin],
    )?;
    let recipes = state.recipes.clone();
    let recipe = run_blocking(move || recipes.recipe(menu_item_id)).await?;
    Ok(Json(recipe))
}

/// PUT /api/recipes/{menu_item_id} - `[{ingredient_id, quantity_per_unit}]`
pub async fn set_recipe(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(menu_item_id): Path<i64>,
    Json(lines): Json<Vec<RecipeLineInput>>,
) -> AppResult<Json<Recipe>> {
    require_role(&actor, &[Role::Admin])?;
    let recipes = state.recipes.clone();
    let recipe = run_blocking(move || recipes.set_recipe(menu_item_id, lines)).await?;
    Ok(Json(recipe))
}
