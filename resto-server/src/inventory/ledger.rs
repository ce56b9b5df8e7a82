//! Inventory ledger
//!
//! 每个原料的库存 = 所有流水的带符号求和。流水只追加，不修改不删除；
//! 更正通过反向流水完成。出库在同一写事务内先检查余量再扣减，库存永不为负。

use redb::{ReadableTable, WriteTransaction};
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::message::DomainEvent;
use shared::models::{Ingredient, IngredientCreate, LedgerAudit, MovementKind, StockMovement};
use shared::util::now_millis;

use crate::db::Store;
use crate::db::storage::{
    INGREDIENTS, MOVEMENT_SEQ_KEY, STOCK_MOVEMENTS, all_json, get_json, put_json,
};
use crate::error::{AllocationError, AllocationResult, Entity};
use crate::events::EventHub;

/// One movement to append
#[derive(Debug, Clone)]
pub struct MovementRequest {
    pub ingredient_id: i64,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub actor_id: i64,
    pub note: Option<String>,
    pub order_code: Option<String>,
}

/// Appended movement plus the reorder alert it triggered, if any
#[derive(Debug, Clone)]
pub struct MovementOutcome {
    pub movement: StockMovement,
    pub alert: Option<DomainEvent>,
}

/// Stock ledger
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    store: Store,
    events: EventHub,
}

impl InventoryLedger {
    pub fn new(store: Store, events: EventHub) -> Self {
        Self { store, events }
    }

    /// Register an ingredient; a positive initial quantity becomes its first inflow
    pub fn create_ingredient(
        &self,
        actor_id: i64,
        input: IngredientCreate,
    ) -> AllocationResult<Ingredient> {
        if input.name.trim().is_empty() || input.unit.trim().is_empty() {
            return Err(AllocationError::validation(
                ErrorCode::RequiredField,
                "Ingredient name and unit are required",
            ));
        }
        let threshold = input.reorder_threshold.unwrap_or(Decimal::ZERO);
        if threshold.is_sign_negative() {
            return Err(AllocationError::validation(
                ErrorCode::ValueOutOfRange,
                "Reorder threshold must not be negative",
            ));
        }
        let initial = input.initial_quantity.unwrap_or(Decimal::ZERO);
        if initial.is_sign_negative() {
            return Err(AllocationError::InvalidQuantity);
        }

        let txn = self.store.begin_write()?;
        let now = now_millis();
        let mut ingredient = Ingredient {
            id: self.store.next_id(&txn)?,
            name: input.name.trim().to_string(),
            unit: input.unit.trim().to_string(),
            quantity: Decimal::ZERO,
            reorder_threshold: threshold,
            created_at: now,
            updated_at: now,
        };
        {
            let mut table = txn.open_table(INGREDIENTS)?;
            put_json(&mut table, ingredient.id, &ingredient)?;
        }
        if initial > Decimal::ZERO {
            let outcome = self.apply_movement_txn(
                &txn,
                MovementRequest {
                    ingredient_id: ingredient.id,
                    kind: MovementKind::Inflow,
                    quantity: initial,
                    actor_id,
                    note: Some("Initial stock".to_string()),
                    order_code: None,
                },
            )?;
            ingredient.quantity = outcome.movement.balance_after;
        }
        txn.commit()?;

        tracing::info!(
            ingredient_id = ingredient.id,
            name = %ingredient.name,
            quantity = %ingredient.quantity,
            "Ingredient created"
        );
        Ok(ingredient)
    }

    pub fn get_ingredient(&self, id: i64) -> AllocationResult<Ingredient> {
        let txn = self.store.begin_read()?;
        let table = txn.open_table(INGREDIENTS)?;
        get_json(&table, id)?.ok_or(AllocationError::not_found(Entity::Ingredient, id))
    }

    pub fn list_ingredients(&self) -> AllocationResult<Vec<Ingredient>> {
        let txn = self.store.begin_read()?;
        let table = txn.open_table(INGREDIENTS)?;
        Ok(all_json(&table)?)
    }

    /// Quantity on hand
    pub fn current_quantity(&self, id: i64) -> AllocationResult<Decimal> {
        Ok(self.get_ingredient(id)?.quantity)
    }

    /// Append a movement in its own transaction
    pub fn apply_movement(
        &self,
        actor_id: i64,
        ingredient_id: i64,
        kind: MovementKind,
        quantity: Decimal,
        note: Option<String>,
    ) -> AllocationResult<StockMovement> {
        let txn = self.store.begin_write()?;
        let outcome = self.apply_movement_txn(
            &txn,
            MovementRequest {
                ingredient_id,
                kind,
                quantity,
                actor_id,
                note,
                order_code: None,
            },
        )?;
        txn.commit()?;

        tracing::info!(
            ingredient_id,
            kind = ?kind,
            quantity = %quantity,
            balance = %outcome.movement.balance_after,
            "Stock movement recorded"
        );
        self.events.publish_all(outcome.alert);
        Ok(outcome.movement)
    }

    /// Movement history of one ingredient, oldest first
    pub fn movements(&self, ingredient_id: i64) -> AllocationResult<Vec<StockMovement>> {
        let txn = self.store.begin_read()?;
        let ingredients = txn.open_table(INGREDIENTS)?;
        if ingredients.get(ingredient_id)?.is_none() {
            return Err(AllocationError::not_found(Entity::Ingredient, ingredient_id));
        }
        let table = txn.open_table(STOCK_MOVEMENTS)?;
        read_movements(&table, ingredient_id)
    }

    /// Recompute the movement sum and compare it with the running total
    pub fn audit(&self, ingredient_id: i64) -> AllocationResult<LedgerAudit> {
        let txn = self.store.begin_read()?;
        let ingredients = txn.open_table(INGREDIENTS)?;
        let ingredient: Ingredient = get_json(&ingredients, ingredient_id)?
            .ok_or(AllocationError::not_found(Entity::Ingredient, ingredient_id))?;
        let table = txn.open_table(STOCK_MOVEMENTS)?;
        let movements = read_movements(&table, ingredient_id)?;

        let movement_sum: Decimal = movements.iter().map(StockMovement::delta).sum();
        let consistent = movement_sum == ingredient.quantity;
        if !consistent {
            tracing::error!(
                ingredient_id,
                quantity = %ingredient.quantity,
                movement_sum = %movement_sum,
                "Ledger mismatch"
            );
        }
        Ok(LedgerAudit {
            ingredient_id,
            quantity: ingredient.quantity,
            movement_sum,
            movement_count: movements.len(),
            consistent,
        })
    }

    // ========== Transaction-scoped operations ==========

    pub(crate) fn current_quantity_txn(
        &self,
        txn: &WriteTransaction,
        ingredient_id: i64,
    ) -> AllocationResult<Decimal> {
        let table = txn.open_table(INGREDIENTS)?;
        let ingredient: Ingredient = get_json(&table, ingredient_id)?
            .ok_or(AllocationError::not_found(Entity::Ingredient, ingredient_id))?;
        Ok(ingredient.quantity)
    }

    /// Append a movement inside the caller's transaction
    ///
    /// The outflow check and the decrement happen in the same write
    /// transaction, so no concurrent writer can observe the old balance.
    pub(crate) fn apply_movement_txn(
        &self,
        txn: &WriteTransaction,
        request: MovementRequest,
    ) -> AllocationResult<MovementOutcome> {
        if request.quantity <= Decimal::ZERO {
            return Err(AllocationError::InvalidQuantity);
        }

        let (ingredient, before) = {
            let mut table = txn.open_table(INGREDIENTS)?;
            let mut ingredient: Ingredient = get_json(&table, request.ingredient_id)?.ok_or(
                AllocationError::not_found(Entity::Ingredient, request.ingredient_id),
            )?;

            let before = ingredient.quantity;
            let after = before
                .checked_add(request.kind.signed(request.quantity))
                .ok_or(AllocationError::InvalidQuantity)?;
            if after < Decimal::ZERO {
                return Err(AllocationError::InsufficientStock {
                    ingredient_id: request.ingredient_id,
                    required: request.quantity,
                    available: before,
                });
            }

            ingredient.quantity = after;
            ingredient.updated_at = now_millis();
            put_json(&mut table, ingredient.id, &ingredient)?;
            (ingredient, before)
        };

        let seq = self.store.next_sequence(txn, MOVEMENT_SEQ_KEY)?;
        let movement = StockMovement {
            seq,
            ingredient_id: request.ingredient_id,
            kind: request.kind,
            quantity: request.quantity,
            balance_after: ingredient.quantity,
            actor_id: request.actor_id,
            note: request.note,
            order_code: request.order_code,
            created_at: ingredient.updated_at,
        };
        {
            let mut table = txn.open_table(STOCK_MOVEMENTS)?;
            let bytes = serde_json::to_vec(&movement)?;
            table.insert((movement.ingredient_id, seq), bytes.as_slice())?;
        }

        let alert = (before > ingredient.reorder_threshold && ingredient.below_threshold()).then(
            || DomainEvent::StockBelowThreshold {
                ingredient_id: ingredient.id,
                name: ingredient.name.clone(),
                quantity: ingredient.quantity,
                threshold: ingredient.reorder_threshold,
            },
        );

        Ok(MovementOutcome { movement, alert })
    }
}

fn read_movements(
    table: &impl ReadableTable<(i64, u64), &'static [u8]>,
    ingredient_id: i64,
) -> AllocationResult<Vec<StockMovement>> {
    let mut out = Vec::new();
    for result in table.range((ingredient_id, 0u64)..=(ingredient_id, u64::MAX))? {
        let (_, value) = result?;
        out.push(serde_json::from_slice(value.value())?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ADMIN: i64 = 1;

    fn ledger() -> InventoryLedger {
        InventoryLedger::new(Store::open_in_memory().unwrap(), EventHub::new())
    }

    fn tomato(ledger: &InventoryLedger, initial: i64, threshold: i64) -> Ingredient {
        ledger
            .create_ingredient(
                ADMIN,
                IngredientCreate {
                    name: "Tomato".to_string(),
                    unit: "unit".to_string(),
                    initial_quantity: Some(Decimal::new(initial, 0)),
                    reorder_threshold: Some(Decimal::new(threshold, 0)),
                },
            )
            .unwrap()
    }

    #[test]
    fn test_initial_quantity_is_an_inflow() {
        let ledger = ledger();
        let ing = tomato(&ledger, 10, 0);
        assert_eq!(ing.quantity, Decimal::new(10, 0));

        let movements = ledger.movements(ing.id).unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Inflow);
        assert!(ledger.audit(ing.id).unwrap().consistent);
    }

    #[test]
    fn test_outflow_beyond_stock_is_rejected_without_movement() {
        let ledger = ledger();
        let ing = tomato(&ledger, 10, 0);

        let err = ledger
            .apply_movement(ADMIN, ing.id, MovementKind::Outflow, Decimal::new(11, 0), None)
            .unwrap_err();
        assert!(matches!(
            err,
            AllocationError::InsufficientStock { ingredient_id, .. } if ingredient_id == ing.id
        ));
        assert_eq!(ledger.current_quantity(ing.id).unwrap(), Decimal::new(10, 0));
        assert_eq!(ledger.movements(ing.id).unwrap().len(), 1);
    }

    #[test]
    fn test_outflow_to_exactly_zero() {
        let ledger = ledger();
        let ing = tomato(&ledger, 10, 0);
        let movement = ledger
            .apply_movement(ADMIN, ing.id, MovementKind::Outflow, Decimal::new(10, 0), None)
            .unwrap();
        assert_eq!(movement.balance_after, Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_quantity() {
        let ledger = ledger();
        let ing = tomato(&ledger, 10, 0);
        for qty in [Decimal::ZERO, Decimal::new(-3, 0)] {
            let err = ledger
                .apply_movement(ADMIN, ing.id, MovementKind::Inflow, qty, None)
                .unwrap_err();
            assert!(matches!(err, AllocationError::InvalidQuantity));
        }
        assert_eq!(ledger.movements(ing.id).unwrap().len(), 1);
    }

    #[test]
    fn test_inflow_overflow_is_rejected_without_movement() {
        let ledger = ledger();
        let ing = ledger
            .create_ingredient(
                ADMIN,
                IngredientCreate {
                    name: "Salt".to_string(),
                    unit: "g".to_string(),
                    initial_quantity: Some(Decimal::MAX),
                    reorder_threshold: None,
                },
            )
            .unwrap();

        let err = ledger
            .apply_movement(ADMIN, ing.id, MovementKind::Inflow, Decimal::ONE, None)
            .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidQuantity));
        assert_eq!(ledger.current_quantity(ing.id).unwrap(), Decimal::MAX);
        assert_eq!(ledger.movements(ing.id).unwrap().len(), 1);
        assert!(ledger.audit(ing.id).unwrap().consistent);
    }

    #[test]
    fn test_decimal_quantities_are_exact() {
        let ledger = ledger();
        let ing = tomato(&ledger, 0, 0);
        for _ in 0..10 {
            ledger
                .apply_movement(ADMIN, ing.id, MovementKind::Inflow, Decimal::new(1, 1), None)
                .unwrap();
        }
        assert_eq!(ledger.current_quantity(ing.id).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_threshold_alert_fires_on_crossing_only() {
        let ledger = ledger();
        let mut rx = ledger.events.subscribe();
        let ing = tomato(&ledger, 10, 5);

        ledger
            .apply_movement(ADMIN, ing.id, MovementKind::Outflow, Decimal::new(4, 0), None)
            .unwrap();
        assert!(rx.try_recv().is_err());

        ledger
            .apply_movement(ADMIN, ing.id, MovementKind::Outflow, Decimal::new(1, 0), None)
            .unwrap();
        match rx.try_recv().unwrap() {
            DomainEvent::StockBelowThreshold { quantity, .. } => {
                assert_eq!(quantity, Decimal::new(5, 0))
            }
            other => panic!("unexpected event {:?}", other),
        }

        ledger
            .apply_movement(ADMIN, ing.id, MovementKind::Outflow, Decimal::new(1, 0), None)
            .unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unknown_ingredient() {
        let ledger = ledger();
        let err = ledger
            .apply_movement(ADMIN, 99, MovementKind::Inflow, Decimal::ONE, None)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::IngredientNotFound);
        assert_eq!(ledger.movements(99).unwrap_err().code(), ErrorCode::IngredientNotFound);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_stock_never_negative_and_audit_holds(
            ops in prop::collection::vec((any::<bool>(), -5i64..40), 1..40)
        ) {
            let ledger = ledger();
            let ing = tomato(&ledger, 20, 0);
            let mut expected = Decimal::new(20, 0);
            let mut accepted = 1usize;

            for (inflow, raw) in ops {
                let qty = Decimal::new(raw, 1);
                let kind = if inflow { MovementKind::Inflow } else { MovementKind::Outflow };
                match ledger.apply_movement(ADMIN, ing.id, kind, qty, None) {
                    Ok(_) => {
                        expected += kind.signed(qty);
                        accepted += 1;
                    }
                    Err(AllocationError::InvalidQuantity) => prop_assert!(qty <= Decimal::ZERO),
                    Err(AllocationError::InsufficientStock { .. }) => {
                        prop_assert!(!inflow && qty > expected)
                    }
                    Err(e) => prop_assert!(false, "unexpected error {}", e),
                }
                prop_assert!(ledger.current_quantity(ing.id).unwrap() >= Decimal::ZERO);
            }

            let audit = ledger.audit(ing.id).unwrap();
            prop_assert!(audit.consistent);
            prop_assert_eq!(audit.quantity, expected);
            prop_assert_eq!(audit.movement_count, accepted);
        }
    }
}
