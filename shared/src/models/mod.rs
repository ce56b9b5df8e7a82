//! Data models
//!
//! Shared between resto-server and its HTTP clients.
//! IDs are `i64` values allocated by the server's store, timestamps are
//! Unix milliseconds and money/stock amounts are `Decimal`.

pub mod actor;
pub mod dining_table;
pub mod ingredient;
pub mod menu_item;
pub mod order;
pub mod recipe;
pub mod reservation;

// Re-exports
pub use actor::*;
pub use dining_table::*;
pub use ingredient::*;
pub use menu_item::*;
pub use order::*;
pub use recipe::*;
pub use reservation::*;
