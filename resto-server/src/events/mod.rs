//! 事件中心
//!
//! 事务提交后广播 [`DomainEvent`]，通知层（推送、厨房看板）自行订阅。
//! 没有订阅者时事件被丢弃，不影响业务结果。

use shared::message::DomainEvent;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// In-process broadcast of committed domain events
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<DomainEvent>,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("receivers", &self.tx.receiver_count())
            .finish()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Publish one event; only call after the transaction committed
    pub fn publish(&self, event: DomainEvent) {
        let event_type = event.event_type();
        if self.tx.send(event).is_err() {
            tracing::debug!(%event_type, "No active event receivers");
        }
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events {
            self.publish(event);
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_publish_reaches_subscriber() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();
        let event = DomainEvent::ReservationCreated {
            reservation_id: 1,
            code: "ABCDEFGHIJ".to_string(),
            customer_id: 9,
            date: NaiveDate::from_ymd_opt(2025, 12, 24).unwrap(),
        };
        hub.publish(event.clone());
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let hub = EventHub::new();
        hub.publish_all(Vec::new());
        hub.publish(DomainEvent::StockBelowThreshold {
            ingredient_id: 1,
            name: "Salt".to_string(),
            quantity: Default::default(),
            threshold: Default::default(),
        });
    }
}
