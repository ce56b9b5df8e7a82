//! Dining Table Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Table zone tag (室内 / 露台 / VIP / 包间)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableZone {
    Interior,
    Terrace,
    Vip,
    Private,
}

impl TableZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableZone::Interior => "interior",
            TableZone::Terrace => "terrace",
            TableZone::Vip => "vip",
            TableZone::Private => "private",
        }
    }
}

impl fmt::Display for TableZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dining table entity (桌台)
///
/// `enabled` is the static admin flag. Occupancy is derived from active
/// orders and never stored on the table itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: i64,
    /// Display name, e.g. `VIP-1`
    pub name: String,
    pub number: i32,
    pub capacity: i32,
    pub zone: TableZone,
    pub location: Option<String>,
    pub enabled: bool,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub name: String,
    pub number: i32,
    pub capacity: Option<i32>,
    pub zone: TableZone,
    pub location: Option<String>,
}

/// Update dining table payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub zone: Option<TableZone>,
    pub location: Option<String>,
    pub enabled: Option<bool>,
}

/// Table listing row with derived occupancy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableAvailability {
    #[serde(flatten)]
    pub table: DiningTable,
    /// Held by an active order of any customer
    pub occupied: bool,
    /// Free for the requesting customer (own orders don't block)
    pub free_for_requester: bool,
}
