//! Dining Table API 模块
//!
//! | 路径 | 方法 | 说明 | 角色 |
//! |------|------|------|------|
//! | /api/tables | GET | 桌台列表，`?available=true` 只返回当前可用 | 任意 |
//! | /api/tables/{id} | GET | 单个桌台 | 任意 |
//! | /api/tables | POST | 创建桌台 | admin |
//! | /api/tables/{id} | PUT / DELETE | 更新 / 删除桌台 | admin |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
