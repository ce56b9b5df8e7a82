//! Resto Server - 餐厅资源分配核心
//!
//! # 架构概述
//!
//! 管理餐厅里被并发争用的共享资源：桌台、原料库存与预订时段。
//!
//! - **存储** (`db`): redb 嵌入式存储，单写事务串行化所有 check-then-act
//! - **库存** (`inventory`): 只追加的库存流水与菜品配方
//! - **桌台** (`tables`): 桌台主数据与由订单派生的占用
//! - **订单** (`orders`): 原子下单与状态流转
//! - **预订** (`reservations`): 同日同目标冲突解析与定价
//! - **HTTP API** (`api`): axum 路由
//!
//! # 模块结构
//!
//! ```text
//! resto-server/src/
//! ├── core/          # 配置、状态、错误、HTTP 服务器
//! ├── auth/          # 执行者身份提取
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # redb 存储层
//! ├── events/        # 领域事件广播
//! ├── inventory/     # 库存流水与配方
//! ├── menu/          # 菜单目录
//! ├── orders/        # 订单履约
//! ├── reservations/  # 预订冲突解析
//! ├── tables/        # 桌台分配
//! └── utils/         # 日志、请求期限
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod error;
pub mod events;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod reservations;
pub mod tables;
pub mod utils;

// Re-export 公共类型
pub use auth::CurrentActor;
pub use core::{Config, Server, ServerState};
pub use db::Store;
pub use error::{AllocationError, AllocationResult};
pub use events::EventHub;
pub use inventory::{InventoryLedger, RecipeIndex};
pub use menu::MenuCatalog;
pub use orders::OrderWorkflow;
pub use reservations::ReservationResolver;
pub use tables::TableAllocator;
pub use utils::Deadline;

// Re-export unified error types from shared
pub use shared::error::{AppError, AppResult, ErrorBody, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 加载 `.env`、创建工作目录并初始化日志
pub fn setup_environment() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_logging = config.is_production().then(|| log_dir.to_string_lossy().into_owned());
    init_logger_with_file(Some(&config.log_level), file_logging.as_deref());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____            __
   / __ \___  _____/ /_____
  / /_/ / _ \/ ___/ __/ __ \
 / _, _/  __(__  ) /_/ /_/ /
/_/ |_|\___/____/\__/\____/
    "#
    );
}
