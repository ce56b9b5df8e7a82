//! Recipe index: menu item → ingredient quantities per unit sold

use redb::{ReadableTable, WriteTransaction};
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{CartLine, Recipe, RecipeLine, RecipeLineInput};
use std::collections::{BTreeMap, HashSet};

use crate::db::Store;
use crate::db::storage::{INGREDIENTS, MENU_ITEMS, RECIPE_LINES};
use crate::error::{AllocationError, AllocationResult, Entity};

#[derive(Debug, Clone)]
pub struct RecipeIndex {
    store: Store,
}

impl RecipeIndex {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Replace the full recipe of a menu item
    pub fn set_recipe(
        &self,
        menu_item_id: i64,
        inputs: Vec<RecipeLineInput>,
    ) -> AllocationResult<Recipe> {
        let mut seen = HashSet::new();
        for input in &inputs {
            if input.quantity_per_unit <= Decimal::ZERO {
                return Err(AllocationError::validation(
                    ErrorCode::RecipeInvalid,
                    format!(
                        "Quantity for ingredient {} must be greater than zero",
                        input.ingredient_id
                    ),
                ));
            }
            if !seen.insert(input.ingredient_id) {
                return Err(AllocationError::validation(
                    ErrorCode::RecipeInvalid,
                    format!("Ingredient {} listed twice", input.ingredient_id),
                ));
            }
        }

        let txn = self.store.begin_write()?;
        {
            let items = txn.open_table(MENU_ITEMS)?;
            if items.get(menu_item_id)?.is_none() {
                return Err(AllocationError::not_found(Entity::MenuItem, menu_item_id));
            }
            let ingredients = txn.open_table(INGREDIENTS)?;
            for input in &inputs {
                if ingredients.get(input.ingredient_id)?.is_none() {
                    return Err(AllocationError::validation(
                        ErrorCode::RecipeInvalid,
                        format!("Ingredient {} does not exist", input.ingredient_id),
                    ));
                }
            }
        }

        let lines: Vec<RecipeLine> = inputs
            .into_iter()
            .map(|input| RecipeLine {
                menu_item_id,
                ingredient_id: input.ingredient_id,
                quantity_per_unit: input.quantity_per_unit,
            })
            .collect();
        {
            let mut table = txn.open_table(RECIPE_LINES)?;
            let stale: Vec<(i64, i64)> = table
                .range((menu_item_id, i64::MIN)..=(menu_item_id, i64::MAX))?
                .map(|entry| entry.map(|(key, _)| key.value()))
                .collect::<Result<_, _>>()?;
            for key in stale {
                table.remove(key)?;
            }
            for line in &lines {
                let bytes = serde_json::to_vec(line)?;
                table.insert((menu_item_id, line.ingredient_id), bytes.as_slice())?;
            }
        }
        txn.commit()?;

        tracing::info!(menu_item_id, lines = lines.len(), "Recipe updated");
        Ok(Recipe {
            menu_item_id,
            lines,
        })
    }

    pub fn recipe(&self, menu_item_id: i64) -> AllocationResult<Recipe> {
        let txn = self.store.begin_read()?;
        let items = txn.open_table(MENU_ITEMS)?;
        if items.get(menu_item_id)?.is_none() {
            return Err(AllocationError::not_found(Entity::MenuItem, menu_item_id));
        }
        let table = txn.open_table(RECIPE_LINES)?;
        Ok(Recipe {
            menu_item_id,
            lines: read_lines(&table, menu_item_id)?,
        })
    }

    /// Recipe lines of one menu item inside a write transaction
    pub(crate) fn lines_txn(
        &self,
        txn: &WriteTransaction,
        menu_item_id: i64,
    ) -> AllocationResult<Vec<RecipeLine>> {
        let table = txn.open_table(RECIPE_LINES)?;
        read_lines(&table, menu_item_id)
    }

    /// Total ingredient needs of a cart, aggregated across lines
    pub(crate) fn requirements_txn(
        &self,
        txn: &WriteTransaction,
        cart: &[CartLine],
    ) -> AllocationResult<BTreeMap<i64, Decimal>> {
        let mut needs: BTreeMap<i64, Decimal> = BTreeMap::new();
        for line in cart {
            for recipe_line in self.lines_txn(txn, line.menu_item_id)? {
                let used = consumption(&recipe_line, line.quantity)?;
                let total = needs.entry(recipe_line.ingredient_id).or_insert(Decimal::ZERO);
                *total = total
                    .checked_add(used)
                    .ok_or(AllocationError::InvalidQuantity)?;
            }
        }
        Ok(needs)
    }
}

/// Quantity of the line's ingredient consumed by `units` of the menu item
pub fn consumption(line: &RecipeLine, units: i32) -> AllocationResult<Decimal> {
    line.quantity_per_unit
        .checked_mul(Decimal::from(units))
        .ok_or(AllocationError::InvalidQuantity)
}

fn read_lines(
    table: &impl ReadableTable<(i64, i64), &'static [u8]>,
    menu_item_id: i64,
) -> AllocationResult<Vec<RecipeLine>> {
    let mut out = Vec::new();
    for result in table.range((menu_item_id, i64::MIN)..=(menu_item_id, i64::MAX))? {
        let (_, value) = result?;
        out.push(serde_json::from_slice(value.value())?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventHub;
    use crate::inventory::InventoryLedger;
    use crate::menu::MenuCatalog;
    use shared::models::{IngredientCreate, MenuItemCreate};

    struct Fixture {
        store: Store,
        recipes: RecipeIndex,
        salad: i64,
        soup: i64,
        tomato: i64,
        onion: i64,
    }

    fn fixture() -> Fixture {
        let store = Store::open_in_memory().unwrap();
        let catalog = MenuCatalog::new(store.clone());
        let ledger = InventoryLedger::new(store.clone(), EventHub::new());
        let item = |name: &str| {
            catalog
                .create_item(MenuItemCreate {
                    name: name.to_string(),
                    description: None,
                    price: Decimal::new(5, 0),
                    category: None,
                    available: None,
                })
                .unwrap()
                .id
        };
        let ingredient = |name: &str| {
            ledger
                .create_ingredient(
                    1,
                    IngredientCreate {
                        name: name.to_string(),
                        unit: "unit".to_string(),
                        initial_quantity: Some(Decimal::new(100, 0)),
                        reorder_threshold: None,
                    },
                )
                .unwrap()
                .id
        };
        let (salad, soup) = (item("Salad"), item("Soup"));
        let (tomato, onion) = (ingredient("Tomato"), ingredient("Onion"));
        Fixture {
            recipes: RecipeIndex::new(store.clone()),
            store,
            salad,
            soup,
            tomato,
            onion,
        }
    }

    fn line(ingredient_id: i64, qty: i64) -> RecipeLineInput {
        RecipeLineInput {
            ingredient_id,
            quantity_per_unit: Decimal::new(qty, 0),
        }
    }

    #[test]
    fn test_set_recipe_replaces_lines() {
        let f = fixture();
        f.recipes
            .set_recipe(f.salad, vec![line(f.tomato, 3), line(f.onion, 1)])
            .unwrap();
        f.recipes.set_recipe(f.salad, vec![line(f.tomato, 2)]).unwrap();

        let recipe = f.recipes.recipe(f.salad).unwrap();
        assert_eq!(recipe.lines.len(), 1);
        assert_eq!(recipe.lines[0].quantity_per_unit, Decimal::new(2, 0));
    }

    #[test]
    fn test_invalid_recipes() {
        let f = fixture();
        let err = f.recipes.set_recipe(f.salad, vec![line(f.tomato, 0)]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::RecipeInvalid);

        let err = f
            .recipes
            .set_recipe(f.salad, vec![line(f.tomato, 1), line(f.tomato, 2)])
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RecipeInvalid);

        let err = f.recipes.set_recipe(f.salad, vec![line(12345, 1)]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::RecipeInvalid);

        let err = f.recipes.set_recipe(777, vec![]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MenuItemNotFound);
    }

    #[test]
    fn test_requirements_aggregate_across_lines() {
        let f = fixture();
        f.recipes
            .set_recipe(f.salad, vec![line(f.tomato, 3), line(f.onion, 1)])
            .unwrap();
        f.recipes.set_recipe(f.soup, vec![line(f.tomato, 2)]).unwrap();

        let txn = f.store.begin_write().unwrap();
        let needs = f
            .recipes
            .requirements_txn(
                &txn,
                &[
                    CartLine { menu_item_id: f.salad, quantity: 2 },
                    CartLine { menu_item_id: f.soup, quantity: 1 },
                ],
            )
            .unwrap();
        assert_eq!(needs[&f.tomato], Decimal::new(8, 0));
        assert_eq!(needs[&f.onion], Decimal::new(2, 0));
    }

    #[test]
    fn test_consumption_overflow_is_invalid_quantity() {
        let line = RecipeLine {
            menu_item_id: 1,
            ingredient_id: 2,
            quantity_per_unit: Decimal::MAX,
        };
        assert_eq!(consumption(&line, 1).unwrap(), Decimal::MAX);
        assert!(matches!(
            consumption(&line, 2),
            Err(AllocationError::InvalidQuantity)
        ));
    }
}
