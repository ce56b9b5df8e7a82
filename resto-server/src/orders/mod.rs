//! 订单履约
//!
//! - [`OrderWorkflow`] - 原子下单、查询
//! - [`lifecycle`] - 状态流转与角色校验
//! - [`totals`] - 金额计算（小计、税、配送费）
pub mod lifecycle;
pub mod totals;
pub mod workflow;

pub use totals::{OrderSettings, OrderTotals, compute_totals};
pub use workflow::OrderWorkflow;
