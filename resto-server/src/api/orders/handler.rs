//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::error::AppResult;
use shared::models::{Order, OrderCreate, OrderDetail, OrderQuery, OrderStatusUpdate};

use crate::api::run_blocking;
use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::utils::Deadline;

/// POST /api/orders - 下单
pub async fn create(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<OrderDetail>> {
    // 期限从请求到达时开始计算，包含排队等待写锁的时间
    let deadline = Deadline::after(state.config.request_timeout());
    let orders = state.orders.clone();
    let detail = run_blocking(move || orders.create_order(&actor, payload, deadline)).await?;
    Ok(Json(detail))
}

/// GET /api/orders
pub async fn list(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.clone();
    let list = run_blocking(move || orders.list_orders(&actor, &query)).await?;
    Ok(Json(list))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let orders = state.orders.clone();
    let detail = run_blocking(move || orders.get_order(&actor, id)).await?;
    Ok(Json(detail))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let orders = state.orders.clone();
    let order = run_blocking(move || orders.cancel(&actor, id)).await?;
    Ok(Json(order))
}

/// PUT /api/orders/{id}/state
pub async fn update_state(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    let orders = state.orders.clone();
    let order = run_blocking(move || orders.transition(&actor, id, payload.status)).await?;
    Ok(Json(order))
}
