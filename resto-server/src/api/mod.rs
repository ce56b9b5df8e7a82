//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`tables`] - 桌台管理与可用性
//! - [`orders`] - 下单与订单状态
//! - [`reservations`] - 预订与可用性检查
//! - [`inventory`] - 原料库存与流水
//! - [`recipes`] - 菜品配方
//! - [`menu`] - 菜单目录与外部商品对账
//!
//! 成功响应直接返回 JSON 资源；错误响应统一为 `{code, message, details}`。

pub mod health;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod recipes;
pub mod reservations;
pub mod tables;

use axum::{Router, middleware};
use shared::error::{AppError, AppResult};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::core::ServerState;
use crate::error::AllocationResult;

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(request).await;

    let status = response.status();
    if status.is_server_error() {
        tracing::warn!(target: "http_access", request_id = %request_id, "{} {} {}", method, uri, status);
    } else {
        tracing::info!(target: "http_access", request_id = %request_id, "{} {} {}", method, uri, status);
    }

    response
}

/// Build the Axum router (without state)
pub fn build_routes() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(tables::router())
        .merge(orders::router())
        .merge(reservations::router())
        .merge(inventory::router())
        .merge(recipes::router())
        .merge(menu::router())
}

/// Build the full application with state and middleware
pub fn build_app(state: ServerState) -> Router {
    build_routes()
        .with_state(state)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Run a synchronous redb operation on the blocking pool
pub(crate) async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AllocationResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::internal(format!("Blocking task failed: {}", e)))?
        .map_err(AppError::from)
}
