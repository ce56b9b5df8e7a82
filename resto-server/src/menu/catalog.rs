use redb::{ReadableTable, WriteTransaction};
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{ExternalProduct, MenuItem, MenuItemCreate, ReconcileOutcome};

use crate::db::storage::{MENU_EXTERNAL_REFS, MENU_ITEMS, all_json, get_json, put_json};
use crate::db::{StorageResult, Store};
use crate::error::{AllocationError, AllocationResult, Entity};

/// Menu item store
#[derive(Debug, Clone)]
pub struct MenuCatalog {
    store: Store,
}

impl MenuCatalog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn create_item(&self, input: MenuItemCreate) -> AllocationResult<MenuItem> {
        validate_item(&input.name, input.price)?;

        let txn = self.store.begin_write()?;
        let item = MenuItem {
            id: self.store.next_id(&txn)?,
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            available: input.available.unwrap_or(true),
            category: input.category,
            external_ref: None,
        };
        {
            let mut table = txn.open_table(MENU_ITEMS)?;
            put_json(&mut table, item.id, &item)?;
        }
        txn.commit()?;

        tracing::info!(menu_item_id = item.id, name = %item.name, "Menu item created");
        Ok(item)
    }

    pub fn get_item(&self, id: i64) -> AllocationResult<MenuItem> {
        let txn = self.store.begin_read()?;
        let table = txn.open_table(MENU_ITEMS)?;
        get_json(&table, id)?.ok_or(AllocationError::not_found(Entity::MenuItem, id))
    }

    pub fn list_items(&self, only_available: bool) -> AllocationResult<Vec<MenuItem>> {
        let txn = self.store.begin_read()?;
        let table = txn.open_table(MENU_ITEMS)?;
        let mut items: Vec<MenuItem> = all_json(&table)?;
        if only_available {
            items.retain(|item| item.available);
        }
        Ok(items)
    }

    /// Toggle whether the item can be ordered
    pub fn set_availability(&self, id: i64, available: bool) -> AllocationResult<MenuItem> {
        let txn = self.store.begin_write()?;
        let item = {
            let mut table = txn.open_table(MENU_ITEMS)?;
            let mut item: MenuItem = get_json(&table, id)?
                .ok_or(AllocationError::not_found(Entity::MenuItem, id))?;
            item.available = available;
            put_json(&mut table, id, &item)?;
            item
        };
        txn.commit()?;

        tracing::info!(menu_item_id = id, available, "Menu item availability changed");
        Ok(item)
    }

    /// Map external catalog products onto menu items
    ///
    /// Products already mapped return their existing item. Unmapped products
    /// get a new menu item; every creation is logged so staff can review it.
    pub fn reconcile_external(
        &self,
        products: &[ExternalProduct],
    ) -> AllocationResult<Vec<ReconcileOutcome>> {
        for product in products {
            if product.external_ref.trim().is_empty() {
                return Err(AllocationError::validation(
                    ErrorCode::RequiredField,
                    "external_ref is required",
                ));
            }
            validate_item(&product.name, product.price)?;
        }

        let txn = self.store.begin_write()?;
        let mut outcomes = Vec::with_capacity(products.len());
        {
            let mut refs = txn.open_table(MENU_EXTERNAL_REFS)?;
            let mut items = txn.open_table(MENU_ITEMS)?;

            for product in products {
                let existing = refs
                    .get(product.external_ref.as_str())?
                    .map(|guard| guard.value());

                if let Some(menu_item_id) = existing
                    && let Some(item) = get_json::<MenuItem>(&items, menu_item_id)?
                {
                    outcomes.push(ReconcileOutcome {
                        menu_item: item,
                        created: false,
                    });
                    continue;
                }

                let item = MenuItem {
                    id: self.store.next_id(&txn)?,
                    name: product.name.trim().to_string(),
                    description: product.description.clone(),
                    price: product.price,
                    available: true,
                    category: product.category.clone(),
                    external_ref: Some(product.external_ref.clone()),
                };
                put_json(&mut items, item.id, &item)?;
                refs.insert(product.external_ref.as_str(), item.id)?;

                tracing::warn!(
                    external_ref = %product.external_ref,
                    menu_item_id = item.id,
                    name = %item.name,
                    "Created menu item for unmapped external product"
                );
                outcomes.push(ReconcileOutcome {
                    menu_item: item,
                    created: true,
                });
            }
        }
        txn.commit()?;

        Ok(outcomes)
    }

    /// Load a menu item inside a write transaction
    pub(crate) fn get_item_txn(
        &self,
        txn: &WriteTransaction,
        id: i64,
    ) -> StorageResult<Option<MenuItem>> {
        let table = txn.open_table(MENU_ITEMS)?;
        get_json(&table, id)
    }
}

fn validate_item(name: &str, price: Decimal) -> AllocationResult<()> {
    if name.trim().is_empty() {
        return Err(AllocationError::validation(
            ErrorCode::RequiredField,
            "Menu item name is required",
        ));
    }
    if price.is_sign_negative() {
        return Err(AllocationError::validation(
            ErrorCode::ValueOutOfRange,
            "Menu item price must not be negative",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> MenuCatalog {
        MenuCatalog::new(Store::open_in_memory().unwrap())
    }

    fn salad() -> MenuItemCreate {
        MenuItemCreate {
            name: "Salad".to_string(),
            description: Some("House salad".to_string()),
            price: Decimal::new(850, 2),
            category: Some("starters".to_string()),
            available: None,
        }
    }

    #[test]
    fn test_create_and_get() {
        let catalog = catalog();
        let item = catalog.create_item(salad()).unwrap();
        assert!(item.available);
        assert_eq!(catalog.get_item(item.id).unwrap(), item);
    }

    #[test]
    fn test_list_only_available() {
        let catalog = catalog();
        let a = catalog.create_item(salad()).unwrap();
        let b = catalog.create_item(salad()).unwrap();
        catalog.set_availability(b.id, false).unwrap();

        let available = catalog.list_items(true).unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, a.id);
        assert_eq!(catalog.list_items(false).unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_negative_price() {
        let mut input = salad();
        input.price = Decimal::new(-1, 0);
        let err = catalog().create_item(input).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValueOutOfRange);
    }

    #[test]
    fn test_reconcile_creates_once() {
        let catalog = catalog();
        let product = ExternalProduct {
            external_ref: "POOL-42".to_string(),
            name: "Mojito".to_string(),
            description: None,
            price: Decimal::new(6, 0),
            category: Some("pool bar".to_string()),
        };

        let first = catalog.reconcile_external(&[product.clone()]).unwrap();
        assert!(first[0].created);
        assert_eq!(first[0].menu_item.external_ref.as_deref(), Some("POOL-42"));

        let second = catalog
            .reconcile_external(&[product.clone(), product])
            .unwrap();
        assert!(second.iter().all(|o| !o.created));
        assert!(second.iter().all(|o| o.menu_item.id == first[0].menu_item.id));
        assert_eq!(catalog.list_items(false).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_item() {
        let err = catalog().get_item(404).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MenuItemNotFound);
    }
}
