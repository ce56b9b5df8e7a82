//! redb-based storage layer
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `dining_tables` | `table_id` | `DiningTable` | 桌台主数据 |
//! | `table_numbers` | `number` | `table_id` | Unique table number |
//! | `table_occupancy` | `(table_id, order_id)` | `customer_id` | Active orders holding a table |
//! | `table_references` | `(table_id, ref_id)` | `()` | Orders/reservations that ever used a table |
//! | `menu_items` | `menu_item_id` | `MenuItem` | Menu catalog |
//! | `menu_external_refs` | `external_ref` | `menu_item_id` | External product mapping |
//! | `ingredients` | `ingredient_id` | `Ingredient` | Running stock totals |
//! | `stock_movements` | `(ingredient_id, seq)` | `StockMovement` | Ledger (append-only) |
//! | `recipe_lines` | `(menu_item_id, ingredient_id)` | `RecipeLine` | Recipe index |
//! | `orders` | `order_id` | `Order` | Order headers |
//! | `order_lines` | `(order_id, line_no)` | `OrderLine` | Order lines |
//! | `order_codes` | `code` | `order_id` | Confirmation code uniqueness |
//! | `reservations` | `reservation_id` | `Reservation` | Reservations |
//! | `reservation_slots` | `(date|target, reservation_id)` | `()` | Active reservations per date and target |
//! | `reservation_codes` | `code` | `reservation_id` | Confirmation code uniqueness |
//! | `sequence_counter` | `name` | `u64` | Global sequences |
//!
//! # Concurrency
//!
//! redb 同一时刻只允许一个写事务。所有 check-then-act 流程（占桌、扣库存、
//! 预订冲突检查）都在同一个写事务内完成，因此天然串行化；读事务基于快照，
//! 不会阻塞写入。写事务在任何错误路径上被 drop 即回滚。

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::utils::Deadline;

pub(crate) const DINING_TABLES: TableDefinition<i64, &[u8]> = TableDefinition::new("dining_tables");

pub(crate) const TABLE_NUMBERS: TableDefinition<i32, i64> = TableDefinition::new("table_numbers");

/// key = (table_id, order_id), value = customer_id
pub(crate) const TABLE_OCCUPANCY: TableDefinition<(i64, i64), i64> =
    TableDefinition::new("table_occupancy");

pub(crate) const TABLE_REFERENCES: TableDefinition<(i64, i64), ()> =
    TableDefinition::new("table_references");

pub(crate) const MENU_ITEMS: TableDefinition<i64, &[u8]> = TableDefinition::new("menu_items");

pub(crate) const MENU_EXTERNAL_REFS: TableDefinition<&str, i64> =
    TableDefinition::new("menu_external_refs");

pub(crate) const INGREDIENTS: TableDefinition<i64, &[u8]> = TableDefinition::new("ingredients");

pub(crate) const STOCK_MOVEMENTS: TableDefinition<(i64, u64), &[u8]> =
    TableDefinition::new("stock_movements");

pub(crate) const RECIPE_LINES: TableDefinition<(i64, i64), &[u8]> =
    TableDefinition::new("recipe_lines");

pub(crate) const ORDERS: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

pub(crate) const ORDER_LINES: TableDefinition<(i64, u32), &[u8]> =
    TableDefinition::new("order_lines");

pub(crate) const ORDER_CODES: TableDefinition<&str, i64> = TableDefinition::new("order_codes");

pub(crate) const RESERVATIONS: TableDefinition<i64, &[u8]> = TableDefinition::new("reservations");

pub(crate) const RESERVATION_SLOTS: TableDefinition<(&str, i64), ()> =
    TableDefinition::new("reservation_slots");

pub(crate) const RESERVATION_CODES: TableDefinition<&str, i64> =
    TableDefinition::new("reservation_codes");

const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

pub(crate) const MOVEMENT_SEQ_KEY: &str = "movement_seq";

/// Shared by every record kind, so ids never repeat across tables
const RESOURCE_ID_KEY: &str = "resource_id";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sequence {0} exhausted")]
    SequenceExhausted(&'static str),

    #[error("Deadline exceeded before commit")]
    DeadlineExceeded,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Embedded store backed by redb
///
/// Cheap to clone; every workflow invocation opens its own transaction.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns the data is on disk.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and ephemeral runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create all tables so read transactions never hit a missing table
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DINING_TABLES)?;
            let _ = write_txn.open_table(TABLE_NUMBERS)?;
            let _ = write_txn.open_table(TABLE_OCCUPANCY)?;
            let _ = write_txn.open_table(TABLE_REFERENCES)?;
            let _ = write_txn.open_table(MENU_ITEMS)?;
            let _ = write_txn.open_table(MENU_EXTERNAL_REFS)?;
            let _ = write_txn.open_table(INGREDIENTS)?;
            let _ = write_txn.open_table(STOCK_MOVEMENTS)?;
            let _ = write_txn.open_table(RECIPE_LINES)?;
            let _ = write_txn.open_table(ORDERS)?;
            let _ = write_txn.open_table(ORDER_LINES)?;
            let _ = write_txn.open_table(ORDER_CODES)?;
            let _ = write_txn.open_table(RESERVATIONS)?;
            let _ = write_txn.open_table(RESERVATION_SLOTS)?;
            let _ = write_txn.open_table(RESERVATION_CODES)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(MOVEMENT_SEQ_KEY)?.is_none() {
                seq_table.insert(MOVEMENT_SEQ_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction (blocks while another writer is active)
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Begin a snapshot read transaction
    pub fn begin_read(&self) -> StorageResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    /// Commit unless the deadline has already passed
    ///
    /// An expired deadline aborts the transaction and nothing is written.
    pub fn commit_within(&self, txn: WriteTransaction, deadline: Deadline) -> StorageResult<()> {
        if deadline.is_expired() {
            txn.abort()?;
            return Err(StorageError::DeadlineExceeded);
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Sequence Operations ==========

    /// Increment and return a named sequence (within transaction)
    pub fn next_sequence(&self, txn: &WriteTransaction, key: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table.get(key)?.map(|guard| guard.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key, next)?;
        Ok(next)
    }

    /// Allocate the id of a new record (within transaction)
    ///
    /// The sequence advances in the caller's transaction and rolls back with it.
    pub fn next_id(&self, txn: &WriteTransaction) -> StorageResult<i64> {
        let seq = self.next_sequence(txn, RESOURCE_ID_KEY)?;
        i64::try_from(seq).map_err(|_| StorageError::SequenceExhausted(RESOURCE_ID_KEY))
    }
}

// ========== JSON helpers ==========

/// Load a JSON record keyed by id from any readable table
pub(crate) fn get_json<T: DeserializeOwned>(
    table: &impl ReadableTable<i64, &'static [u8]>,
    id: i64,
) -> StorageResult<Option<T>> {
    match table.get(id)? {
        Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
        None => Ok(None),
    }
}

/// Load every JSON record of a table, in key order
pub(crate) fn all_json<T: DeserializeOwned>(
    table: &impl ReadableTable<i64, &'static [u8]>,
) -> StorageResult<Vec<T>> {
    let mut out = Vec::new();
    for result in table.iter()? {
        let (_, value) = result?;
        out.push(serde_json::from_slice(value.value())?);
    }
    Ok(out)
}

/// Insert or replace a JSON record keyed by id
pub(crate) fn put_json<T: Serialize>(
    table: &mut redb::Table<'_, i64, &'static [u8]>,
    id: i64,
    record: &T,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec(record)?;
    table.insert(id, bytes.as_slice())?;
    Ok(())
}
