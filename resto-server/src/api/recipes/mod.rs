//! Recipe API 模块
//!
//! | 路径 | 方法 | 说明 | 角色 |
//! |------|------|------|------|
//! | /api/recipes/{menu_item_id} | GET | 菜品配方 | 员工 |
//! | /api/recipes/{menu_item_id} | PUT | 整体替换配方 | admin |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/recipes/{menu_item_id}",
        get(handler::get_recipe).put(handler::set_recipe),
    )
}
