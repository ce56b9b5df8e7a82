//! Inventory API 模块
//!
//! | 路径 | 方法 | 说明 | 角色 |
//! |------|------|------|------|
//! | /api/inventory | GET | 原料列表 | 员工 |
//! | /api/inventory | POST | 新建原料 (初始库存记为入库流水) | admin |
//! | /api/inventory/{id} | GET | 单个原料 | 员工 |
//! | /api/inventory/{id}/movement | POST | 入库 / 出库 | admin |
//! | /api/inventory/{id}/movements | GET | 流水历史 | 员工 |
//! | /api/inventory/{id}/audit | GET | 流水与余量核对 | 员工 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/movement", post(handler::apply_movement))
        .route("/{id}/movements", get(handler::movements))
        .route("/{id}/audit", get(handler::audit))
}
