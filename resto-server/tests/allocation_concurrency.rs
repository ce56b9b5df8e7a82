//! Concurrent submissions against shared tables and ingredients

use std::sync::{Arc, Barrier};
use std::thread;

use resto_server::{AllocationError, Config, Deadline, ServerState, Store};
use rust_decimal::Decimal;
use shared::models::{
    Actor, CartLine, DiningTableCreate, IngredientCreate, MenuItemCreate, OrderCreate,
    RecipeLineInput, ServiceChannel, TableZone,
};
use tempfile::TempDir;

const THREADS: usize = 8;

fn state() -> (TempDir, ServerState) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(dir.path().to_string_lossy(), 0);
    let store = Store::open(config.database_path()).unwrap();
    (dir, ServerState::with_store(config, store))
}

fn dish(state: &ServerState, flour: Decimal) -> (i64, i64) {
    let item = state
        .catalog
        .create_item(MenuItemCreate {
            name: "Bread".to_string(),
            description: None,
            price: Decimal::new(300, 2),
            category: None,
            available: None,
        })
        .unwrap()
        .id;
    let ingredient = state
        .ledger
        .create_ingredient(
            1,
            IngredientCreate {
                name: "Flour".to_string(),
                unit: "kg".to_string(),
                initial_quantity: Some(flour),
                reorder_threshold: None,
            },
        )
        .unwrap()
        .id;
    state
        .recipes
        .set_recipe(
            item,
            vec![RecipeLineInput {
                ingredient_id: ingredient,
                quantity_per_unit: Decimal::ONE,
            }],
        )
        .unwrap();
    (item, ingredient)
}

#[test]
fn one_customer_wins_a_contested_table() {
    let (_dir, state) = state();
    let table = state
        .tables
        .create_table(DiningTableCreate {
            name: "Mesa 5".to_string(),
            number: 5,
            capacity: None,
            zone: TableZone::Terrace,
            location: None,
        })
        .unwrap()
        .id;
    let (bread, _) = dish(&state, Decimal::from(1000));

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let orders = state.orders.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                orders.create_order(
                    &Actor::customer(2000 + i as i64),
                    OrderCreate::dine_in(
                        table,
                        vec![CartLine {
                            menu_item_id: bread,
                            quantity: 1,
                        }],
                    ),
                    Deadline::none(),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results.iter().all(|r| match r {
        Ok(_) => true,
        Err(AllocationError::TableConflict { table_id }) => *table_id == table,
        Err(_) => false,
    }));
}

#[test]
fn concurrent_orders_never_overdraw_stock() {
    let (_dir, state) = state();
    // 5 kg of flour, 8 delivery orders of 1 loaf each
    let (bread, flour) = dish(&state, Decimal::from(5));

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let orders = state.orders.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut input = OrderCreate::dine_in(
                    0,
                    vec![CartLine {
                        menu_item_id: bread,
                        quantity: 1,
                    }],
                );
                input.channel = ServiceChannel::Delivery;
                input.table_id = None;
                input.delivery_address = Some(format!("Calle {}", i));
                orders.create_order(&Actor::customer(3000 + i as i64), input, Deadline::none())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 5);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AllocationError::InsufficientStock { .. }))
    );

    assert_eq!(state.ledger.current_quantity(flour).unwrap(), Decimal::ZERO);
    let audit = state.ledger.audit(flour).unwrap();
    assert!(audit.consistent);
    assert_eq!(audit.movement_count, 1 + accepted);
}
