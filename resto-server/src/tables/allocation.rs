//! Table allocation
//!
//! 占用关系 `(table_id, order_id) → customer_id` 与订单在同一事务内写入，
//! 订单进入终态时在同一事务内删除，因此占用状态始终与订单状态一致。
//! 同一顾客可以在同一桌台持有多张进行中的订单。

use redb::{ReadableTable, WriteTransaction};
use shared::error::ErrorCode;
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableAvailability};

use crate::db::Store;
use crate::db::storage::{
    DINING_TABLES, TABLE_NUMBERS, TABLE_OCCUPANCY, TABLE_REFERENCES, all_json, get_json, put_json,
};
use crate::error::{AllocationError, AllocationResult, Entity};

const DEFAULT_CAPACITY: i32 = 4;

/// Table master data and occupancy
#[derive(Debug, Clone)]
pub struct TableAllocator {
    store: Store,
}

impl TableAllocator {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn create_table(&self, input: DiningTableCreate) -> AllocationResult<DiningTable> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AllocationError::validation(
                ErrorCode::RequiredField,
                "Table name is required",
            ));
        }
        let capacity = input.capacity.unwrap_or(DEFAULT_CAPACITY);
        validate_capacity(capacity)?;

        let txn = self.store.begin_write()?;
        let table = {
            let mut numbers = txn.open_table(TABLE_NUMBERS)?;
            if numbers.get(input.number)?.is_some() {
                return Err(AllocationError::validation(
                    ErrorCode::TableNumberExists,
                    format!("Table number {} already exists", input.number),
                ));
            }
            let table = DiningTable {
                id: self.store.next_id(&txn)?,
                name: name.to_string(),
                number: input.number,
                capacity,
                zone: input.zone,
                location: input.location,
                enabled: true,
            };
            numbers.insert(table.number, table.id)?;
            let mut tables = txn.open_table(DINING_TABLES)?;
            put_json(&mut tables, table.id, &table)?;
            table
        };
        txn.commit()?;

        tracing::info!(table_id = table.id, name = %table.name, zone = %table.zone, "Table created");
        Ok(table)
    }

    pub fn update_table(&self, id: i64, update: DiningTableUpdate) -> AllocationResult<DiningTable> {
        if let Some(capacity) = update.capacity {
            validate_capacity(capacity)?;
        }

        let txn = self.store.begin_write()?;
        let table = {
            let mut tables = txn.open_table(DINING_TABLES)?;
            let mut table: DiningTable =
                get_json(&tables, id)?.ok_or(AllocationError::not_found(Entity::Table, id))?;

            if let Some(name) = update.name {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(AllocationError::validation(
                        ErrorCode::RequiredField,
                        "Table name is required",
                    ));
                }
                table.name = name;
            }
            if let Some(capacity) = update.capacity {
                table.capacity = capacity;
            }
            if let Some(zone) = update.zone {
                table.zone = zone;
            }
            if update.location.is_some() {
                table.location = update.location;
            }
            if let Some(enabled) = update.enabled {
                table.enabled = enabled;
            }
            put_json(&mut tables, id, &table)?;
            table
        };
        txn.commit()?;

        tracing::info!(table_id = id, enabled = table.enabled, "Table updated");
        Ok(table)
    }

    /// Delete a table that no order or reservation ever referenced
    pub fn delete_table(&self, id: i64) -> AllocationResult<()> {
        let txn = self.store.begin_write()?;
        {
            let refs = txn.open_table(TABLE_REFERENCES)?;
            if refs.range((id, i64::MIN)..=(id, i64::MAX))?.next().is_some() {
                return Err(AllocationError::validation(
                    ErrorCode::TableInUse,
                    format!("Table {} is referenced by orders or reservations", id),
                ));
            }
            let mut tables = txn.open_table(DINING_TABLES)?;
            let table: DiningTable = get_json(&tables, id)?
                .ok_or(AllocationError::not_found(Entity::Table, id))?;
            tables.remove(id)?;
            let mut numbers = txn.open_table(TABLE_NUMBERS)?;
            numbers.remove(table.number)?;
        }
        txn.commit()?;

        tracing::info!(table_id = id, "Table deleted");
        Ok(())
    }

    pub fn get_table(&self, id: i64) -> AllocationResult<DiningTable> {
        let txn = self.store.begin_read()?;
        let tables = txn.open_table(DINING_TABLES)?;
        get_json(&tables, id)?.ok_or(AllocationError::not_found(Entity::Table, id))
    }

    /// List tables with derived occupancy
    ///
    /// With `only_available`, keeps enabled tables the requester may take.
    pub fn list_tables(
        &self,
        requester: Option<i64>,
        only_available: bool,
    ) -> AllocationResult<Vec<TableAvailability>> {
        let txn = self.store.begin_read()?;
        let tables = txn.open_table(DINING_TABLES)?;
        let occupancy = txn.open_table(TABLE_OCCUPANCY)?;

        let mut out = Vec::new();
        for table in all_json::<DiningTable>(&tables)? {
            let holders = holders(&occupancy, table.id)?;
            let free_for_requester = holders
                .iter()
                .all(|(_, customer_id)| Some(*customer_id) == requester);
            if only_available && !(table.enabled && free_for_requester) {
                continue;
            }
            out.push(TableAvailability {
                occupied: !holders.is_empty(),
                free_for_requester,
                table,
            });
        }
        out.sort_by_key(|row| row.table.number);
        Ok(out)
    }

    /// Free iff no active order of a different customer references the table
    pub fn is_table_free_for(&self, table_id: i64, customer_id: i64) -> AllocationResult<bool> {
        let txn = self.store.begin_read()?;
        let tables = txn.open_table(DINING_TABLES)?;
        if tables.get(table_id)?.is_none() {
            return Err(AllocationError::not_found(Entity::Table, table_id));
        }
        let occupancy = txn.open_table(TABLE_OCCUPANCY)?;
        free_for(&occupancy, table_id, customer_id)
    }

    // ========== Transaction-scoped operations ==========

    pub(crate) fn get_table_txn(
        &self,
        txn: &WriteTransaction,
        id: i64,
    ) -> AllocationResult<Option<DiningTable>> {
        let tables = txn.open_table(DINING_TABLES)?;
        Ok(get_json(&tables, id)?)
    }

    /// Write-time re-check, evaluated under the single writer lock
    pub(crate) fn is_table_free_for_txn(
        &self,
        txn: &WriteTransaction,
        table_id: i64,
        customer_id: i64,
    ) -> AllocationResult<bool> {
        let occupancy = txn.open_table(TABLE_OCCUPANCY)?;
        free_for(&occupancy, table_id, customer_id)
    }

    pub(crate) fn occupy_txn(
        &self,
        txn: &WriteTransaction,
        table_id: i64,
        order_id: i64,
        customer_id: i64,
    ) -> AllocationResult<()> {
        let mut occupancy = txn.open_table(TABLE_OCCUPANCY)?;
        occupancy.insert((table_id, order_id), customer_id)?;
        drop(occupancy);
        self.add_reference_txn(txn, table_id, order_id)
    }

    pub(crate) fn release_txn(
        &self,
        txn: &WriteTransaction,
        table_id: i64,
        order_id: i64,
    ) -> AllocationResult<()> {
        let mut occupancy = txn.open_table(TABLE_OCCUPANCY)?;
        occupancy.remove((table_id, order_id))?;
        Ok(())
    }

    /// Remember that an order or reservation used the table
    pub(crate) fn add_reference_txn(
        &self,
        txn: &WriteTransaction,
        table_id: i64,
        ref_id: i64,
    ) -> AllocationResult<()> {
        let mut refs = txn.open_table(TABLE_REFERENCES)?;
        refs.insert((table_id, ref_id), ())?;
        Ok(())
    }
}

fn validate_capacity(capacity: i32) -> AllocationResult<()> {
    if capacity < 1 {
        return Err(AllocationError::validation(
            ErrorCode::ValueOutOfRange,
            "Table capacity must be at least 1",
        ));
    }
    Ok(())
}

/// Active orders holding the table: (order_id, customer_id)
fn holders(
    occupancy: &impl ReadableTable<(i64, i64), i64>,
    table_id: i64,
) -> AllocationResult<Vec<(i64, i64)>> {
    let mut out = Vec::new();
    for result in occupancy.range((table_id, i64::MIN)..=(table_id, i64::MAX))? {
        let (key, value) = result?;
        out.push((key.value().1, value.value()));
    }
    Ok(out)
}

fn free_for(
    occupancy: &impl ReadableTable<(i64, i64), i64>,
    table_id: i64,
    customer_id: i64,
) -> AllocationResult<bool> {
    Ok(holders(occupancy, table_id)?
        .iter()
        .all(|(_, holder)| *holder == customer_id))
}
