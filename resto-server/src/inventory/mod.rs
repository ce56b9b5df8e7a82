//! 库存模块
//!
//! - [`InventoryLedger`] - 原料库存与只追加的库存流水
//! - [`RecipeIndex`] - 菜品配方（每份消耗的原料数量）

pub mod ledger;
pub mod recipes;

pub use ledger::{InventoryLedger, MovementOutcome, MovementRequest};
pub use recipes::RecipeIndex;
