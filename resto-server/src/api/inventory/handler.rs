//! Inventory API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, AppResult};
use shared::models::{
    Actor, Ingredient, IngredientCreate, LedgerAudit, MovementInput, Role, StockMovement,
};

use crate::api::run_blocking;
use crate::auth::{CurrentActor, require_role};
use crate::core::ServerState;

fn require_staff(actor: &Actor) -> AppResult<()> {
    if actor.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::forbidden("Inventory is visible to staff only"))
    }
}

/// GET /api/inventory
pub async fn list(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<Json<Vec<Ingredient>>> {
    require_staff(&actor)?;
    let ledger = state.ledger.clone();
    let ingredients = run_blocking(move || ledger.list_ingredients()).await?;
    Ok(Json(ingredients))
}

/// GET /api/inventory/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<Ingredient>> {
    require_staff(&actor)?;
    let ledger = state.ledger.clone();
    let ingredient = run_blocking(move || ledger.get_ingredient(id)).await?;
    Ok(Json(ingredient))
}

/// POST /api/inventory
pub async fn create(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<IngredientCreate>,
) -> AppResult<Json<Ingredient>> {
    require_role(&actor, &[Role::Admin])?;
    let ledger = state.ledger.clone();
    let ingredient = run_blocking(move || ledger.create_ingredient(actor.id, payload)).await?;
    Ok(Json(ingredient))
}

/// POST /api/inventory/{id}/movement - `{type, quantity, note?}`
pub async fn apply_movement(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(payload): Json<MovementInput>,
) -> AppResult<Json<StockMovement>> {
    require_role(&actor, &[Role::Admin])?;
    let ledger = state.ledger.clone();
    let movement = run_blocking(move || {
        ledger.apply_movement(actor.id, id, payload.kind, payload.quantity, payload.note)
    })
    .await?;
    Ok(Json(movement))
}

/// GET /api/inventory/{id}/movements
pub async fn movements(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<StockMovement>>> {
    require_staff(&actor)?;
    let ledger = state.ledger.clone();
    let movements = run_blocking(move || ledger.movements(id)).await?;
    Ok(Json(movements))
}

/// GET /api/inventory/{id}/audit
pub async fn audit(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<LedgerAudit>> {
    require_staff(&actor)?;
    let ledger = state.ledger.clone();
    let audit = run_blocking(move || ledger.audit(id)).await?;
    Ok(Json(audit))
}
