//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::AppResult;
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, Role, TableAvailability};

use crate::api::run_blocking;
use crate::auth::{CurrentActor, MaybeActor, require_role};
use crate::core::ServerState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub available: bool,
}

/// GET /api/tables - 桌台列表 (带占用状态)
pub async fn list(
    State(state): State<ServerState>,
    MaybeActor(actor): MaybeActor,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<TableAvailability>>> {
    let requester = actor.map(|a| a.id);
    let tables = state.tables.clone();
    let rows = run_blocking(move || tables.list_tables(requester, query.available)).await?;
    Ok(Json(rows))
}

/// GET /api/tables/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    let tables = state.tables.clone();
    let table = run_blocking(move || tables.get_table(id)).await?;
    Ok(Json(table))
}

/// POST /api/tables - 创建桌台
pub async fn create(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    require_role(&actor, &[Role::Admin])?;
    let tables = state.tables.clone();
    let table = run_blocking(move || tables.create_table(payload)).await?;
    Ok(Json(table))
}

/// PUT /api/tables/{id} - 更新桌台
pub async fn update(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    require_role(&actor, &[Role::Admin])?;
    let tables = state.tables.clone();
    let table = run_blocking(move || tables.update_table(id, payload)).await?;
    Ok(Json(table))
}

/// DELETE /api/tables/{id} - 删除桌台 (被订单或预订引用时拒绝)
pub async fn delete(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    require_role(&actor, &[Role::Admin])?;
    let tables = state.tables.clone();
    run_blocking(move || tables.delete_table(id)).await?;
    Ok(Json(true))
}
