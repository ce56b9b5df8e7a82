//! Order fulfillment workflow
//!
//! 下单在一个写事务内完成：校验桌台占用、定价、原料预检、写入订单头/明细、
//! 按（明细 × 原料）写出库流水、占用桌台。任何一步失败事务即被丢弃，
//! 不会留下部分写入。事件在提交之后才广播。

use redb::{ReadableTable, WriteTransaction};
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::message::DomainEvent;
use shared::models::{
    Actor, CartLine, MovementKind, Order, OrderCreate, OrderDetail, OrderLine, OrderQuery,
    OrderStatus,
};
use shared::util::{now_millis, order_code};

use super::totals::{OrderSettings, compute_totals};
use crate::db::Store;
use crate::db::storage::{ORDERS, ORDER_CODES, ORDER_LINES, get_json, put_json};
use crate::error::{AllocationError, AllocationResult, Entity};
use crate::events::EventHub;
use crate::inventory::recipes::consumption;
use crate::inventory::{InventoryLedger, MovementRequest, RecipeIndex};
use crate::menu::MenuCatalog;
use crate::tables::TableAllocator;
use crate::utils::Deadline;

const MAX_CODE_ATTEMPTS: usize = 8;
const DEFAULT_LIST_LIMIT: usize = 50;

/// Order creation, queries and lifecycle
#[derive(Debug, Clone)]
pub struct OrderWorkflow {
    pub(super) store: Store,
    pub(super) catalog: MenuCatalog,
    pub(super) ledger: InventoryLedger,
    pub(super) recipes: RecipeIndex,
    pub(super) tables: TableAllocator,
    pub(super) events: EventHub,
    pub(super) settings: OrderSettings,
}

impl OrderWorkflow {
    pub fn new(
        store: Store,
        catalog: MenuCatalog,
        ledger: InventoryLedger,
        recipes: RecipeIndex,
        tables: TableAllocator,
        events: EventHub,
        settings: OrderSettings,
    ) -> Self {
        Self {
            store,
            catalog,
            ledger,
            recipes,
            tables,
            events,
            settings,
        }
    }

    /// Create an order atomically
    ///
    /// Every validation and conflict check runs before the first write;
    /// the commit is skipped when `deadline` has passed.
    pub fn create_order(
        &self,
        actor: &Actor,
        input: OrderCreate,
        deadline: Deadline,
    ) -> AllocationResult<OrderDetail> {
        let cart = normalize_cart(&input.items)?;
        validate_channel(&input)?;

        let txn = self.store.begin_write()?;

        if let Some(table_id) = input.table_id {
            let table = self
                .tables
                .get_table_txn(&txn, table_id)?
                .ok_or(AllocationError::not_found(Entity::Table, table_id))?;
            if !table.enabled {
                return Err(AllocationError::validation(
                    ErrorCode::TableDisabled,
                    format!("Table {} is disabled", table.name),
                ));
            }
            if !self.tables.is_table_free_for_txn(&txn, table_id, actor.id)? {
                tracing::info!(table_id, customer_id = actor.id, "Table held by another customer");
                return Err(AllocationError::TableConflict { table_id });
            }
        }

        let order_id = self.store.next_id(&txn)?;
        let lines = self.price_lines(&txn, order_id, &cart)?;
        self.check_stock(&txn, &cart)?;

        let totals = compute_totals(&lines, input.channel, &self.settings)?;
        let code = self.unique_code(&txn)?;
        let now = now_millis();
        let order = Order {
            id: order_id,
            code,
            customer_id: actor.id,
            channel: input.channel,
            table_id: input.table_id,
            status: OrderStatus::Pending,
            payment_method: input.payment_method,
            subtotal: totals.subtotal,
            tax: totals.tax,
            delivery_fee: totals.delivery_fee,
            total: totals.total,
            delivery_address: input.delivery_address,
            contact_phone: input.contact_phone,
            delivery_instructions: input.delivery_instructions,
            created_at: now,
            updated_at: now,
            preparing_at: None,
            dispatched_at: None,
            delivered_at: None,
            cancelled_at: None,
        };

        {
            let mut orders = txn.open_table(ORDERS)?;
            put_json(&mut orders, order.id, &order)?;
            let mut codes = txn.open_table(ORDER_CODES)?;
            codes.insert(order.code.as_str(), order.id)?;
            let mut order_lines = txn.open_table(ORDER_LINES)?;
            for line in &lines {
                let bytes = serde_json::to_vec(line)?;
                order_lines.insert((order.id, line.line_no), bytes.as_slice())?;
            }
        }

        // One outflow per (line × ingredient)
        let mut alerts = Vec::new();
        for line in &lines {
            for recipe_line in self.recipes.lines_txn(&txn, line.menu_item_id)? {
                let outcome = self.ledger.apply_movement_txn(
                    &txn,
                    MovementRequest {
                        ingredient_id: recipe_line.ingredient_id,
                        kind: MovementKind::Outflow,
                        quantity: consumption(&recipe_line, line.quantity)?,
                        actor_id: actor.id,
                        note: Some(format!(
                            "Order {} - {} x{}",
                            order.code, line.name, line.quantity
                        )),
                        order_code: Some(order.code.clone()),
                    },
                )?;
                alerts.extend(outcome.alert);
            }
        }

        if let Some(table_id) = order.table_id {
            self.tables.occupy_txn(&txn, table_id, order.id, actor.id)?;
        }

        self.store.commit_within(txn, deadline)?;

        tracing::info!(
            order_id = order.id,
            order_code = %order.code,
            customer_id = order.customer_id,
            table_id = ?order.table_id,
            total = %order.total,
            "Order created"
        );
        self.events.publish(DomainEvent::OrderCreated {
            order_id: order.id,
            code: order.code.clone(),
            customer_id: order.customer_id,
            channel: order.channel,
            table_id: order.table_id,
            total: order.total,
        });
        self.events.publish_all(alerts);

        Ok(OrderDetail { order, lines })
    }

    /// Order with lines; customers may only read their own
    pub fn get_order(&self, actor: &Actor, id: i64) -> AllocationResult<OrderDetail> {
        let txn = self.store.begin_read()?;
        let orders = txn.open_table(ORDERS)?;
        let order: Order =
            get_json(&orders, id)?.ok_or(AllocationError::not_found(Entity::Order, id))?;
        if !actor.can_view(order.customer_id) {
            return Err(AllocationError::forbidden("Order belongs to another customer"));
        }

        let order_lines = txn.open_table(ORDER_LINES)?;
        let mut lines = Vec::new();
        for result in order_lines.range((id, 0u32)..=(id, u32::MAX))? {
            let (_, value) = result?;
            lines.push(serde_json::from_slice(value.value())?);
        }
        Ok(OrderDetail { order, lines })
    }

    /// Order headers visible to the actor, newest first
    pub fn list_orders(&self, actor: &Actor, query: &OrderQuery) -> AllocationResult<Vec<Order>> {
        let txn = self.store.begin_read()?;
        let orders = txn.open_table(ORDERS)?;

        let mut out = Vec::new();
        for result in orders.iter()? {
            let (_, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if !actor.can_view(order.customer_id)
                || query.status.is_some_and(|s| s != order.status)
                || query.channel.is_some_and(|c| c != order.channel)
            {
                continue;
            }
            out.push(order);
        }
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(query.limit.unwrap_or(DEFAULT_LIST_LIMIT));
        Ok(out)
    }

    /// Snapshot name, description and current price of every cart line
    fn price_lines(
        &self,
        txn: &WriteTransaction,
        order_id: i64,
        cart: &[CartLine],
    ) -> AllocationResult<Vec<OrderLine>> {
        let mut lines = Vec::with_capacity(cart.len());
        for (idx, cart_line) in cart.iter().enumerate() {
            let item = self
                .catalog
                .get_item_txn(txn, cart_line.menu_item_id)?
                .filter(|item| item.available)
                .ok_or(AllocationError::ItemUnavailable(cart_line.menu_item_id))?;
            let subtotal = item
                .price
                .checked_mul(Decimal::from(cart_line.quantity))
                .ok_or(AllocationError::InvalidQuantity)?;
            lines.push(OrderLine {
                order_id,
                line_no: idx as u32 + 1,
                menu_item_id: item.id,
                name: item.name,
                description: item.description,
                unit_price: item.price,
                quantity: cart_line.quantity,
                subtotal,
            });
        }
        Ok(lines)
    }

    /// Aggregate needs per ingredient across all lines, then compare with stock
    fn check_stock(&self, txn: &WriteTransaction, cart: &[CartLine]) -> AllocationResult<()> {
        for (ingredient_id, required) in self.recipes.requirements_txn(txn, cart)? {
            let available = self.ledger.current_quantity_txn(txn, ingredient_id)?;
            if available < required {
                tracing::info!(
                    ingredient_id,
                    required = %required,
                    available = %available,
                    "Insufficient stock"
                );
                return Err(AllocationError::InsufficientStock {
                    ingredient_id,
                    required,
                    available,
                });
            }
        }
        Ok(())
    }

    fn unique_code(&self, txn: &WriteTransaction) -> AllocationResult<String> {
        let codes = txn.open_table(ORDER_CODES)?;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = order_code();
            if codes.get(code.as_str())?.is_none() {
                return Ok(code);
            }
            tracing::warn!(code = %code, "Order code collision, retrying");
        }
        Err(AllocationError::validation(
            ErrorCode::CodeGenerationFailed,
            "Could not generate a unique order code",
        ))
    }
}

/// Reject empty carts and non-positive quantities; merge repeated items
/// keeping first-seen order
fn normalize_cart(items: &[CartLine]) -> AllocationResult<Vec<CartLine>> {
    if items.is_empty() {
        return Err(AllocationError::EmptyCart);
    }
    let mut merged: Vec<CartLine> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(AllocationError::InvalidQuantity);
        }
        match merged.iter_mut().find(|m| m.menu_item_id == item.menu_item_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or(AllocationError::InvalidQuantity)?;
            }
            None => merged.push(*item),
        }
    }
    Ok(merged)
}

fn validate_channel(input: &OrderCreate) -> AllocationResult<()> {
    if input.channel.requires_table() && input.table_id.is_none() {
        return Err(AllocationError::validation(
            ErrorCode::TableRequired,
            "Dine-in orders require a table",
        ));
    }
    let has_address = input
        .delivery_address
        .as_deref()
        .is_some_and(|addr| !addr.trim().is_empty());
    if input.channel.requires_address() && !has_address {
        return Err(AllocationError::validation(
            ErrorCode::DeliveryAddressRequired,
            "Delivery orders require an address",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{
        DiningTableCreate, IngredientCreate, MenuItemCreate, RecipeLineInput, ServiceChannel,
        TableZone,
    };

    const ALICE: i64 = 101;
    const BOB: i64 = 102;

    struct Fixture {
        workflow: OrderWorkflow,
        table: i64,
        salad: i64,
        tomato: i64,
    }

    fn fixture(tomatoes: i64) -> Fixture {
        let store = Store::open_in_memory().unwrap();
        let events = EventHub::new();
        let catalog = MenuCatalog::new(store.clone());
        let ledger = InventoryLedger::new(store.clone(), events.clone());
        let recipes = RecipeIndex::new(store.clone());
        let tables = TableAllocator::new(store.clone());

        let table = tables
            .create_table(DiningTableCreate {
                name: "T-5".to_string(),
                number: 5,
                capacity: None,
                zone: TableZone::Interior,
                location: None,
            })
            .unwrap()
            .id;
        let salad = catalog
            .create_item(MenuItemCreate {
                name: "Salad".to_string(),
                description: None,
                price: Decimal::new(850, 2),
                category: None,
                available: None,
            })
            .unwrap()
            .id;
        let tomato = ledger
            .create_ingredient(
                1,
                IngredientCreate {
                    name: "Tomato".to_string(),
                    unit: "unit".to_string(),
                    initial_quantity: Some(Decimal::from(tomatoes)),
                    reorder_threshold: None,
                },
            )
            .unwrap()
            .id;
        recipes
            .set_recipe(
                salad,
                vec![RecipeLineInput {
                    ingredient_id: tomato,
                    quantity_per_unit: Decimal::from(3),
                }],
            )
            .unwrap();

        Fixture {
            workflow: OrderWorkflow::new(
                store,
                catalog,
                ledger,
                recipes,
                tables,
                events,
                OrderSettings::default(),
            ),
            table,
            salad,
            tomato,
        }
    }

    fn salads(f: &Fixture, quantity: i32) -> Vec<CartLine> {
        vec![CartLine {
            menu_item_id: f.salad,
            quantity,
        }]
    }

    #[test]
    fn test_normalize_merges_duplicates_in_order() {
        let cart = normalize_cart(&[
            CartLine { menu_item_id: 2, quantity: 1 },
            CartLine { menu_item_id: 1, quantity: 1 },
            CartLine { menu_item_id: 2, quantity: 3 },
        ])
        .unwrap();
        assert_eq!(
            cart,
            vec![
                CartLine { menu_item_id: 2, quantity: 4 },
                CartLine { menu_item_id: 1, quantity: 1 },
            ]
        );
        assert!(matches!(normalize_cart(&[]), Err(AllocationError::EmptyCart)));
        assert!(matches!(
            normalize_cart(&[CartLine { menu_item_id: 1, quantity: 0 }]),
            Err(AllocationError::InvalidQuantity)
        ));
    }

    #[test]
    fn test_create_order_writes_lines_and_movements() {
        let f = fixture(10);
        let detail = f
            .workflow
            .create_order(
                &Actor::customer(ALICE),
                OrderCreate::dine_in(f.table, salads(&f, 2)),
                Deadline::none(),
            )
            .unwrap();

        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.total, Decimal::new(1700, 2));
        assert_eq!(detail.lines.len(), 1);
        assert_eq!(f.workflow.ledger.current_quantity(f.tomato).unwrap(), Decimal::from(4));

        let movements = f.workflow.ledger.movements(f.tomato).unwrap();
        let outflow = movements.last().unwrap();
        assert_eq!(outflow.quantity, Decimal::from(6));
        assert_eq!(
            outflow.note.as_deref(),
            Some(format!("Order {} - Salad x2", detail.order.code).as_str())
        );
        assert_eq!(outflow.order_code.as_deref(), Some(detail.order.code.as_str()));
    }

    #[test]
    fn test_insufficient_stock_writes_nothing() {
        let f = fixture(10);
        let err = f
            .workflow
            .create_order(
                &Actor::customer(ALICE),
                OrderCreate::dine_in(f.table, salads(&f, 4)),
                Deadline::none(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AllocationError::InsufficientStock { ingredient_id, .. } if ingredient_id == f.tomato
        ));
        assert_eq!(f.workflow.ledger.movements(f.tomato).unwrap().len(), 1);
        assert!(
            f.workflow
                .list_orders(&Actor::customer(ALICE), &OrderQuery::default())
                .unwrap()
                .is_empty()
        );
        // table was not occupied
        assert!(f.workflow.tables.is_table_free_for(f.table, BOB).unwrap());
    }

    #[test]
    fn test_shared_ingredient_is_checked_across_lines() {
        let f = fixture(10);
        let soup = f
            .workflow
            .catalog
            .create_item(MenuItemCreate {
                name: "Soup".to_string(),
                description: None,
                price: Decimal::new(600, 2),
                category: None,
                available: None,
            })
            .unwrap()
            .id;
        f.workflow
            .recipes
            .set_recipe(
                soup,
                vec![RecipeLineInput {
                    ingredient_id: f.tomato,
                    quantity_per_unit: Decimal::from(5),
                }],
            )
            .unwrap();

        // 2 salads need 6 tomatoes and 1 soup needs 5; 10 in stock
        let cart = vec![
            CartLine { menu_item_id: f.salad, quantity: 2 },
            CartLine { menu_item_id: soup, quantity: 1 },
        ];
        let err = f
            .workflow
            .create_order(
                &Actor::customer(ALICE),
                OrderCreate::dine_in(f.table, cart),
                Deadline::none(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AllocationError::InsufficientStock { ingredient_id, required, available }
                if ingredient_id == f.tomato
                    && required == Decimal::from(11)
                    && available == Decimal::from(10)
        ));
        assert_eq!(f.workflow.ledger.current_quantity(f.tomato).unwrap(), Decimal::from(10));
        assert_eq!(f.workflow.ledger.movements(f.tomato).unwrap().len(), 1);
        assert!(
            f.workflow
                .list_orders(&Actor::customer(ALICE), &OrderQuery::default())
                .unwrap()
                .is_empty()
        );
        assert!(f.workflow.tables.is_table_free_for(f.table, BOB).unwrap());

        // the soup line alone fits
        f.workflow
            .create_order(
                &Actor::customer(ALICE),
                OrderCreate::dine_in(
                    f.table,
                    vec![CartLine { menu_item_id: soup, quantity: 1 }],
                ),
                Deadline::none(),
            )
            .unwrap();
        assert_eq!(f.workflow.ledger.current_quantity(f.tomato).unwrap(), Decimal::from(5));
    }

    #[test]
    fn test_overflowing_price_writes_nothing() {
        let f = fixture(100);
        let caviar = f
            .workflow
            .catalog
            .create_item(MenuItemCreate {
                name: "Caviar".to_string(),
                description: None,
                price: Decimal::MAX,
                category: None,
                available: None,
            })
            .unwrap()
            .id;

        let err = f
            .workflow
            .create_order(
                &Actor::customer(ALICE),
                OrderCreate::dine_in(
                    f.table,
                    vec![CartLine { menu_item_id: caviar, quantity: 2 }],
                ),
                Deadline::none(),
            )
            .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidQuantity));
        assert!(
            f.workflow
                .list_orders(&Actor::customer(ALICE), &OrderQuery::default())
                .unwrap()
                .is_empty()
        );
        assert!(f.workflow.tables.is_table_free_for(f.table, BOB).unwrap());
    }

    #[test]
    fn test_table_conflict_and_idempotent_reselection() {
        let f = fixture(100);
        let alice = Actor::customer(ALICE);
        f.workflow
            .create_order(&alice, OrderCreate::dine_in(f.table, salads(&f, 1)), Deadline::none())
            .unwrap();

        let err = f
            .workflow
            .create_order(
                &Actor::customer(BOB),
                OrderCreate::dine_in(f.table, salads(&f, 1)),
                Deadline::none(),
            )
            .unwrap_err();
        assert!(matches!(err, AllocationError::TableConflict { table_id } if table_id == f.table));

        f.workflow
            .create_order(&alice, OrderCreate::dine_in(f.table, salads(&f, 1)), Deadline::none())
            .unwrap();
    }

    #[test]
    fn test_unavailable_item() {
        let f = fixture(10);
        let err = f
            .workflow
            .create_order(
                &Actor::customer(ALICE),
                OrderCreate::dine_in(
                    f.table,
                    vec![CartLine {
                        menu_item_id: 9999,
                        quantity: 1,
                    }],
                ),
                Deadline::none(),
            )
            .unwrap_err();
        assert!(matches!(err, AllocationError::ItemUnavailable(9999)));

        f.workflow.catalog.set_availability(f.salad, false).unwrap();
        let err = f
            .workflow
            .create_order(
                &Actor::customer(ALICE),
                OrderCreate::dine_in(f.table, salads(&f, 1)),
                Deadline::none(),
            )
            .unwrap_err();
        assert!(matches!(err, AllocationError::ItemUnavailable(id) if id == f.salad));
    }

    #[test]
    fn test_channel_validation() {
        let f = fixture(10);
        let alice = Actor::customer(ALICE);

        let mut input = OrderCreate::dine_in(f.table, salads(&f, 1));
        input.table_id = None;
        let err = f.workflow.create_order(&alice, input, Deadline::none()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TableRequired);

        let mut input = OrderCreate::dine_in(f.table, salads(&f, 1));
        input.channel = ServiceChannel::Delivery;
        input.table_id = None;
        input.delivery_address = Some("  ".to_string());
        let err = f.workflow.create_order(&alice, input, Deadline::none()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DeliveryAddressRequired);
    }

    #[test]
    fn test_expired_deadline_rolls_back() {
        let f = fixture(10);
        let err = f
            .workflow
            .create_order(
                &Actor::customer(ALICE),
                OrderCreate::dine_in(f.table, salads(&f, 1)),
                Deadline::after(std::time::Duration::ZERO),
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TransactionFailed);
        assert_eq!(f.workflow.ledger.current_quantity(f.tomato).unwrap(), Decimal::from(10));
        assert!(f.workflow.tables.is_table_free_for(f.table, BOB).unwrap());
    }

    #[test]
    fn test_visibility() {
        let f = fixture(100);
        let detail = f
            .workflow
            .create_order(
                &Actor::customer(ALICE),
                OrderCreate::dine_in(f.table, salads(&f, 1)),
                Deadline::none(),
            )
            .unwrap();

        let err = f
            .workflow
            .get_order(&Actor::customer(BOB), detail.order.id)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PermissionDenied);
        assert!(
            f.workflow
                .list_orders(&Actor::customer(BOB), &OrderQuery::default())
                .unwrap()
                .is_empty()
        );

        let waiter = Actor::new(2, shared::models::Role::Waiter);
        let fetched = f.workflow.get_order(&waiter, detail.order.id).unwrap();
        assert_eq!(fetched.lines, detail.lines);
    }
}
