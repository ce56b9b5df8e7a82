//! Menu API 模块
//!
//! | 路径 | 方法 | 说明 | 角色 |
//! |------|------|------|------|
//! | /api/menu | GET | 菜单，`?available=true` 只返回可售 | 任意 |
//! | /api/menu | POST | 新建菜品 | admin |
//! | /api/menu/{id} | GET | 单个菜品 | 任意 |
//! | /api/menu/{id}/availability | PUT | 上下架 | admin / cashier |
//! | /api/menu/reconcile | POST | 外部商品对账 (缺失则创建并记录) | admin |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/menu", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/reconcile", post(handler::reconcile))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/availability", put(handler::set_availability))
}
