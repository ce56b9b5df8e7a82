//! 菜单目录
//!
//! 订单流程只读取菜品（名称、描述、当前价格、是否可售）。外部商品
//! （如泳池吧台）缺少对应菜品时，通过显式的对账操作创建，绝不在下单时隐式生成。

pub mod catalog;

pub use catalog::MenuCatalog;
