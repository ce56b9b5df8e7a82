//! Recipe Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One ingredient requirement for one unit of a menu item (配方行)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub menu_item_id: i64,
    pub ingredient_id: i64,
    pub quantity_per_unit: Decimal,
}

/// Recipe line payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeLineInput {
    pub ingredient_id: i64,
    pub quantity_per_unit: Decimal,
}

/// Full recipe of a menu item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub menu_item_id: i64,
    pub lines: Vec<RecipeLine>,
}
