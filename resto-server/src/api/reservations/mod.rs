//! Reservation API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/reservations | POST | 创建预订 (同一顾客重复提交则原地更新) |
//! | /api/reservations | GET | 预订列表 |
//! | /api/reservations/availability | GET | `?date=&table_id=` 或 `?date=&zone=` |
//! | /api/reservations/{id} | GET | 预订详情 |
//! | /api/reservations/{id}/cancel | POST | 取消预订 |
//! | /api/reservations/{id}/state | PUT | 状态流转 (员工) |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reservations", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/availability", get(handler::availability))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/state", put(handler::update_state))
}
