//! 领域事件定义
//!
//! resto-server 在事务提交之后广播这些事件，外部通知层（推送、看板）订阅后
//! 自行投递。事件只描述已经发生的事实，不携带命令语义。

use crate::models::{OrderStatus, ReservationStatus, ServiceChannel};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 事件类型（用于订阅过滤与日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    OrderCreated,
    OrderStatusChanged,
    ReservationCreated,
    ReservationUpdated,
    ReservationStatusChanged,
    StockBelowThreshold,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::OrderCreated => write!(f, "order_created"),
            EventType::OrderStatusChanged => write!(f, "order_status_changed"),
            EventType::ReservationCreated => write!(f, "reservation_created"),
            EventType::ReservationUpdated => write!(f, "reservation_updated"),
            EventType::ReservationStatusChanged => write!(f, "reservation_status_changed"),
            EventType::StockBelowThreshold => write!(f, "stock_below_threshold"),
        }
    }
}

/// 已提交的领域事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderCreated {
        order_id: i64,
        code: String,
        customer_id: i64,
        channel: ServiceChannel,
        table_id: Option<i64>,
        total: Decimal,
    },
    OrderStatusChanged {
        order_id: i64,
        code: String,
        from: OrderStatus,
        to: OrderStatus,
        /// 桌台随终态释放
        released_table_id: Option<i64>,
    },
    ReservationCreated {
        reservation_id: i64,
        code: String,
        customer_id: i64,
        date: NaiveDate,
    },
    /// 同一顾客对同一目标与日期的再次预订，原地更新
    ReservationUpdated {
        reservation_id: i64,
        code: String,
        customer_id: i64,
        date: NaiveDate,
        party_size: u32,
    },
    ReservationStatusChanged {
        reservation_id: i64,
        code: String,
        from: ReservationStatus,
        to: ReservationStatus,
    },
    StockBelowThreshold {
        ingredient_id: i64,
        name: String,
        quantity: Decimal,
        threshold: Decimal,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            DomainEvent::OrderCreated { .. } => EventType::OrderCreated,
            DomainEvent::OrderStatusChanged { .. } => EventType::OrderStatusChanged,
            DomainEvent::ReservationCreated { .. } => EventType::ReservationCreated,
            DomainEvent::ReservationUpdated { .. } => EventType::ReservationUpdated,
            DomainEvent::ReservationStatusChanged { .. } => EventType::ReservationStatusChanged,
            DomainEvent::StockBelowThreshold { .. } => EventType::StockBelowThreshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = DomainEvent::StockBelowThreshold {
            ingredient_id: 3,
            name: "Tomato".to_string(),
            quantity: Decimal::new(4, 0),
            threshold: Decimal::new(5, 0),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "stock_below_threshold");
        assert_eq!(json["payload"]["name"], "Tomato");
        assert_eq!(event.event_type().to_string(), "stock_below_threshold");
    }

    #[test]
    fn test_reservation_updated_wire_format() {
        let event = DomainEvent::ReservationUpdated {
            reservation_id: 9,
            code: "AB12CD34EF".to_string(),
            customer_id: 101,
            date: NaiveDate::from_ymd_opt(2025, 12, 24).unwrap(),
            party_size: 6,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "reservation_updated");
        assert_eq!(json["payload"]["party_size"], 6);
        assert_eq!(json["payload"]["date"], "2025-12-24");
        assert_eq!(event.event_type(), EventType::ReservationUpdated);
    }
}
