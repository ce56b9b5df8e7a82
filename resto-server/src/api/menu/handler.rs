//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::AppResult;
use shared::models::{
    ExternalProduct, MenuItem, MenuItemAvailability, MenuItemCreate, ReconcileOutcome, Role,
};

use crate::api::run_blocking;
use crate::auth::{CurrentActor, require_role};
use crate::core::ServerState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub available: bool,
}

/// GET /api/menu
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<MenuItem>>> {
    let catalog = state.catalog.clone();
    let items = run_blocking(move || catalog.list_items(query.available)).await?;
    Ok(Json(items))
}

/// GET /api/menu/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MenuItem>> {
    let catalog = state.catalog.clone();
    let item = run_blocking(move || catalog.get_item(id)).await?;
    Ok(Json(item))
}

/// POST /api/menu
pub async fn create(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<MenuItemCreate>,
) -> AppResult<Json<MenuItem>> {
    require_role(&actor, &[Role::Admin])?;
    let catalog = state.catalog.clone();
    let item = run_blocking(move || catalog.create_item(payload)).await?;
    Ok(Json(item))
}

/// PUT /api/menu/{id}/availability
pub async fn set_availability(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(payload): Json<MenuItemAvailability>,
) -> AppResult<Json<MenuItem>> {
    require_role(&actor, &[Role::Admin, Role::Cashier])?;
    let catalog = state.catalog.clone();
    let item = run_blocking(move || catalog.set_availability(id, payload.available)).await?;
    Ok(Json(item))
}

/// POST /api/menu/reconcile
pub async fn reconcile(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Json(products): Json<Vec<ExternalProduct>>,
) -> AppResult<Json<Vec<ReconcileOutcome>>> {
    require_role(&actor, &[Role::Admin])?;
    let catalog = state.catalog.clone();
    let outcomes = run_blocking(move || catalog.reconcile_external(&products)).await?;
    Ok(Json(outcomes))
}
