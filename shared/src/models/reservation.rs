//! Reservation Model

use super::dining_table::TableZone;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reservation lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl ReservationStatus {
    /// Pending and confirmed reservations block their target
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    /// pending → confirmed → completed, pending|confirmed → cancelled|no_show
    pub fn can_transition_to(&self, target: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed)
                | (Confirmed, Completed)
                | (Pending | Confirmed, Cancelled)
                | (Pending | Confirmed, NoShow)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
            ReservationStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a reservation holds: a specific table or a whole zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReservationTarget {
    Table { table_id: i64 },
    Zone { zone: TableZone },
}

impl ReservationTarget {
    /// Stable key used by the per-date index, e.g. `table:5`, `zone:vip`
    pub fn index_key(&self) -> String {
        match self {
            ReservationTarget::Table { table_id } => format!("table:{}", table_id),
            ReservationTarget::Zone { zone } => format!("zone:{}", zone),
        }
    }
}

/// Bookable extra service (泳池 / 台球 / 活动)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Pool,
    Billiards,
    Event,
}

/// Service attached to a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBooking {
    pub kind: ServiceKind,
    /// Billed hours for hourly services (defaults to 1)
    pub duration_hours: Option<u32>,
}

/// Contact details left with the reservation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Reservation (预订)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    /// 10-char confirmation code, unique across all reservations
    pub code: String,
    pub customer_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub target: Option<ReservationTarget>,
    pub status: ReservationStatus,
    pub contact: ContactInfo,
    pub notes: Option<String>,
    pub service: Option<ServiceBooking>,
    /// Computed service price
    pub price: Option<Decimal>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
}

/// Create reservation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreate {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub target: Option<ReservationTarget>,
    #[serde(default)]
    pub contact: ContactInfo,
    pub notes: Option<String>,
    pub service: Option<ServiceBooking>,
}

/// State change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatusUpdate {
    pub status: ReservationStatus,
}

/// Availability answer for a (date, target) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub free: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_code: Option<String>,
}

impl Availability {
    pub fn free() -> Self {
        Self {
            free: true,
            conflicting_code: None,
        }
    }

    pub fn taken(code: impl Into<String>) -> Self {
        Self {
            free: false,
            conflicting_code: Some(code.into()),
        }
    }
}

/// Reservation listing filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationQuery {
    pub date: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
    pub limit: Option<usize>,
}
