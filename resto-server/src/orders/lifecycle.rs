//! Order state transitions
//!
//! pending → preparing → dispatched → delivered；pending/preparing 可取消或拒单。
//! 终态在同一事务内释放桌台占用。状态流转从不回补库存。

use shared::message::DomainEvent;
use shared::models::{Actor, Order, OrderStatus, Role};
use shared::util::now_millis;

use super::workflow::OrderWorkflow;
use crate::db::storage::{ORDERS, get_json, put_json};
use crate::error::{AllocationError, AllocationResult, Entity};

/// Staff roles allowed to move an order into `target`
fn staff_roles_for(target: OrderStatus) -> &'static [Role] {
    match target {
        OrderStatus::Pending => &[],
        OrderStatus::Preparing => &[Role::Cook, Role::Admin],
        OrderStatus::Dispatched => &[Role::Cook, Role::Waiter, Role::Cashier, Role::Admin],
        OrderStatus::Delivered => &[Role::Waiter, Role::Cashier, Role::Admin],
        OrderStatus::Cancelled => &[Role::Cashier, Role::Admin],
        OrderStatus::Rejected => &[Role::Cook, Role::Cashier, Role::Admin],
    }
}

fn ensure_allowed(actor: &Actor, order: &Order, target: OrderStatus) -> AllocationResult<()> {
    if actor.has_any_role(staff_roles_for(target)) {
        return Ok(());
    }
    // The owning customer may cancel
    if target == OrderStatus::Cancelled
        && actor.role == Role::Customer
        && actor.id == order.customer_id
    {
        return Ok(());
    }
    Err(AllocationError::forbidden(format!(
        "Role {} may not move order {} to {}",
        actor.role, order.code, target
    )))
}

impl OrderWorkflow {
    /// Move an order to `target`, releasing its table on terminal states
    pub fn transition(
        &self,
        actor: &Actor,
        id: i64,
        target: OrderStatus,
    ) -> AllocationResult<Order> {
        let txn = self.store.begin_write()?;
        let mut order: Order = {
            let orders = txn.open_table(ORDERS)?;
            get_json(&orders, id)?.ok_or(AllocationError::not_found(Entity::Order, id))?
        };

        ensure_allowed(actor, &order, target)?;
        let from = order.status;
        if !from.can_transition_to(target) {
            return Err(AllocationError::transition(from, target));
        }

        let now = now_millis();
        order.status = target;
        order.updated_at = now;
        match target {
            OrderStatus::Preparing => order.preparing_at = Some(now),
            OrderStatus::Dispatched => order.dispatched_at = Some(now),
            OrderStatus::Delivered => order.delivered_at = Some(now),
            OrderStatus::Cancelled | OrderStatus::Rejected => order.cancelled_at = Some(now),
            OrderStatus::Pending => {}
        }
        {
            let mut orders = txn.open_table(ORDERS)?;
            put_json(&mut orders, id, &order)?;
        }

        let released_table_id = match order.table_id {
            Some(table_id) if target.is_terminal() => {
                self.tables.release_txn(&txn, table_id, id)?;
                Some(table_id)
            }
            _ => None,
        };
        txn.commit()?;

        tracing::info!(
            order_id = id,
            order_code = %order.code,
            from = %from,
            to = %target,
            actor_id = actor.id,
            released_table_id = ?released_table_id,
            "Order status changed"
        );
        self.events.publish(DomainEvent::OrderStatusChanged {
            order_id: id,
            code: order.code.clone(),
            from,
            to: target,
            released_table_id,
        });
        Ok(order)
    }

    pub fn cancel(&self, actor: &Actor, id: i64) -> AllocationResult<Order> {
        self.transition(actor, id, OrderStatus::Cancelled)
    }
}
