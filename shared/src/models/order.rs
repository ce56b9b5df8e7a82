//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fulfillment channel (堂食 / 外卖 / 泳池 / 台球 / 活动)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceChannel {
    DineIn,
    Delivery,
    Poolside,
    Billiards,
    Events,
}

impl ServiceChannel {
    /// Channels that must reference a table
    pub fn requires_table(&self) -> bool {
        matches!(self, ServiceChannel::DineIn)
    }

    pub fn requires_address(&self) -> bool {
        matches!(self, ServiceChannel::Delivery)
    }
}

/// Payment method recorded on the order (settlement happens elsewhere)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Transfer,
    Paypal,
    MercadoPago,
}

/// Order lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Dispatched,
    Delivered,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Active orders hold their table
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Preparing | OrderStatus::Dispatched
        )
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// pending → preparing → dispatched → delivered,
    /// pending|preparing → cancelled|rejected
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Preparing)
                | (Preparing, Dispatched)
                | (Dispatched, Delivered)
                | (Pending | Preparing, Cancelled)
                | (Pending | Preparing, Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Dispatched => "dispatched",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order header (订单)
///
/// Money fields are computed once at creation and never recalculated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Confirmation code, e.g. `ORD3FA09B1C`
    pub code: String,
    pub customer_id: i64,
    pub channel: ServiceChannel,
    pub table_id: Option<i64>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_instructions: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparing_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatched_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
}

/// Order line with the menu item snapshot taken at order time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: i64,
    pub line_no: u32,
    pub menu_item_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    /// unit_price × quantity
    pub subtotal: Decimal,
}

/// Order header with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Cart line submitted by the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub menu_item_id: i64,
    pub quantity: i32,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub channel: ServiceChannel,
    pub table_id: Option<i64>,
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub contact_phone: Option<String>,
    pub delivery_instructions: Option<String>,
}

impl OrderCreate {
    /// Dine-in order at a table, cash payment
    pub fn dine_in(table_id: i64, items: Vec<CartLine>) -> Self {
        Self {
            channel: ServiceChannel::DineIn,
            table_id: Some(table_id),
            items,
            payment_method: PaymentMethod::Cash,
            delivery_address: None,
            contact_phone: None,
            delivery_instructions: None,
        }
    }
}

/// State change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Order listing filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub channel: Option<ServiceChannel>,
    pub limit: Option<usize>,
}
