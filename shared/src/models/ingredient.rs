//! Ingredient & Stock Movement Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ingredient (原料)
///
/// `quantity` is the running total of the movement log; it is only ever
/// changed by appending a [`StockMovement`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    /// Unit of measure, e.g. `kg`, `unit`, `l`
    pub unit: String,
    pub quantity: Decimal,
    pub reorder_threshold: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Ingredient {
    pub fn below_threshold(&self) -> bool {
        self.quantity <= self.reorder_threshold
    }
}

/// Create ingredient payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientCreate {
    pub name: String,
    pub unit: String,
    /// Recorded as the first inflow movement
    pub initial_quantity: Option<Decimal>,
    pub reorder_threshold: Option<Decimal>,
}

/// Movement direction (入库 / 出库)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Inflow,
    Outflow,
}

impl MovementKind {
    /// Signed delta of a movement of `quantity`
    pub fn signed(&self, quantity: Decimal) -> Decimal {
        match self {
            MovementKind::Inflow => quantity,
            MovementKind::Outflow => -quantity,
        }
    }
}

/// Immutable stock movement record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    /// Global ledger sequence
    pub seq: u64,
    pub ingredient_id: i64,
    pub kind: MovementKind,
    /// Always positive; direction comes from `kind`
    pub quantity: Decimal,
    /// Quantity on hand right after this movement
    pub balance_after: Decimal,
    pub actor_id: i64,
    pub note: Option<String>,
    /// Confirmation code of the order that consumed the stock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_code: Option<String>,
    pub created_at: i64,
}

impl StockMovement {
    pub fn delta(&self) -> Decimal {
        self.kind.signed(self.quantity)
    }
}

/// Manual movement payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementInput {
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub note: Option<String>,
}

/// Result of recomputing an ingredient's movement log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerAudit {
    pub ingredient_id: i64,
    pub quantity: Decimal,
    pub movement_sum: Decimal,
    pub movement_count: usize,
    pub consistent: bool,
}
