//! Order API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/orders | POST | 原子下单 |
//! | /api/orders | GET | 订单列表 (顾客只见自己的) |
//! | /api/orders/{id} | GET | 订单详情 |
//! | /api/orders/{id}/cancel | POST | 取消订单 |
//! | /api/orders/{id}/state | PUT | 状态流转 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/state", put(handler::update_state))
}
