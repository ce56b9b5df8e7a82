//! 桌台分配
//!
//! 桌台主数据与占用索引。占用只由订单工作流在其写事务内写入/释放。
pub mod allocation;

pub use allocation::TableAllocator;
