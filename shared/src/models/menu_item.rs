//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Menu item (菜品)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub available: bool,
    pub category: Option<String>,
    /// Reference to a product in an external catalog (e.g. the pool bar)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub available: Option<bool>,
}

/// Toggle availability payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemAvailability {
    pub available: bool,
}

/// Product coming from an external catalog that may lack a menu item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalProduct {
    pub external_ref: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
}

/// Result of reconciling one external product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub menu_item: MenuItem,
    /// `true` when a new menu item was created for the product
    pub created: bool,
}
