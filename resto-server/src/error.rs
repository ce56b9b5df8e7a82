//! 分配错误 - 核心业务错误
//!
//! 所有校验/冲突错误都在写入之前检测，并携带可重试信息
//! （菜品 ID、原料 ID、冲突的确认码）。存储层失败统一归为
//! [`AllocationError::TransactionFailed`]，事务已回滚。

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use std::fmt;
use thiserror::Error;

use crate::db::StorageError;

/// Entity kinds used in not-found errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Table,
    MenuItem,
    Ingredient,
    Order,
    Reservation,
}

impl Entity {
    fn not_found_code(&self) -> ErrorCode {
        match self {
            Entity::Table => ErrorCode::TableNotFound,
            Entity::MenuItem => ErrorCode::MenuItemNotFound,
            Entity::Ingredient => ErrorCode::IngredientNotFound,
            Entity::Order => ErrorCode::OrderNotFound,
            Entity::Reservation => ErrorCode::ReservationNotFound,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Table => "Table",
            Entity::MenuItem => "Menu item",
            Entity::Ingredient => "Ingredient",
            Entity::Order => "Order",
            Entity::Reservation => "Reservation",
        };
        f.write_str(name)
    }
}

/// Core allocation errors
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Menu item {0} is not available")]
    ItemUnavailable(i64),

    #[error("Table {table_id} is occupied by another customer")]
    TableConflict { table_id: i64 },

    #[error(
        "Insufficient stock for ingredient {ingredient_id}: required {required}, available {available}"
    )]
    InsufficientStock {
        ingredient_id: i64,
        required: Decimal,
        available: Decimal,
    },

    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    #[error("Target already reserved for that date (code {0})")]
    ReservationConflict(String),

    #[error("Cannot move from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("{message}")]
    Validation { code: ErrorCode, message: String },

    #[error("Transaction failed: {0}")]
    TransactionFailed(#[from] StorageError),
}

pub type AllocationResult<T> = Result<T, AllocationError>;

// redb 错误先归入 StorageError，便于在业务函数里直接使用 `?`
macro_rules! impl_from_storage {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for AllocationError {
                fn from(err: $err) -> Self {
                    Self::TransactionFailed(StorageError::from(err))
                }
            }
        )*
    };
}

impl_from_storage!(
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    serde_json::Error,
);

impl AllocationError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn transition(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Unified error code of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AllocationError::EmptyCart => ErrorCode::EmptyCart,
            AllocationError::ItemUnavailable(_) => ErrorCode::ItemUnavailable,
            AllocationError::TableConflict { .. } => ErrorCode::TableConflict,
            AllocationError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            AllocationError::InvalidQuantity => ErrorCode::InvalidQuantity,
            AllocationError::ReservationConflict(_) => ErrorCode::ReservationConflict,
            AllocationError::InvalidStateTransition { .. } => ErrorCode::InvalidStateTransition,
            AllocationError::NotFound { entity, .. } => entity.not_found_code(),
            AllocationError::Forbidden(_) => ErrorCode::PermissionDenied,
            AllocationError::Validation { code, .. } => *code,
            AllocationError::TransactionFailed(_) => ErrorCode::TransactionFailed,
        }
    }
}

impl From<AllocationError> for AppError {
    fn from(err: AllocationError) -> Self {
        let code = err.code();
        match err {
            AllocationError::ItemUnavailable(id) => {
                AppError::with_message(code, format!("Menu item {} is not available", id))
                    .with_detail("menu_item_id", id)
            }
            AllocationError::TableConflict { table_id } => {
                AppError::new(code).with_detail("table_id", table_id)
            }
            AllocationError::InsufficientStock {
                ingredient_id,
                required,
                available,
            } => AppError::new(code)
                .with_detail("ingredient_id", ingredient_id)
                .with_detail("required", required.to_string())
                .with_detail("available", available.to_string()),
            AllocationError::ReservationConflict(existing) => {
                AppError::new(code).with_detail("conflicting_code", existing)
            }
            AllocationError::InvalidStateTransition { ref from, ref to } => {
                let (from, to) = (from.clone(), to.clone());
                AppError::with_message(code, err.to_string())
                    .with_detail("from", from)
                    .with_detail("to", to)
            }
            AllocationError::NotFound { id, .. } => {
                AppError::with_message(code, err.to_string()).with_detail("id", id)
            }
            AllocationError::TransactionFailed(e) => {
                // 保留技术细节用于日志，不暴露给客户端
                tracing::error!(error = %e, "Transaction aborted");
                AppError::new(code)
            }
            AllocationError::EmptyCart | AllocationError::InvalidQuantity => AppError::new(code),
            AllocationError::Forbidden(msg) | AllocationError::Validation { message: msg, .. } => {
                AppError::with_message(code, msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_details() {
        let err = AllocationError::InsufficientStock {
            ingredient_id: 3,
            required: Decimal::new(9, 0),
            available: Decimal::new(10, 1),
        };
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InsufficientStock);
        let details = app.details.unwrap();
        assert_eq!(details.get("ingredient_id").unwrap(), 3);
        assert_eq!(details.get("required").unwrap(), "9");
        assert_eq!(details.get("available").unwrap(), "1.0");
    }

    #[test]
    fn test_reservation_conflict_carries_code() {
        let app: AppError = AllocationError::ReservationConflict("K3J9Q2ZX7A".into()).into();
        assert_eq!(app.code, ErrorCode::ReservationConflict);
        assert_eq!(
            app.details.unwrap().get("conflicting_code").unwrap(),
            "K3J9Q2ZX7A"
        );
    }

    #[test]
    fn test_not_found_code_per_entity() {
        assert_eq!(
            AllocationError::not_found(Entity::Ingredient, 1).code(),
            ErrorCode::IngredientNotFound
        );
        let app: AppError = AllocationError::not_found(Entity::Table, 5).into();
        assert_eq!(app.code, ErrorCode::TableNotFound);
        assert_eq!(app.message, "Table 5 not found");
    }

    #[test]
    fn test_storage_failure_is_transaction_failed() {
        let err: AllocationError = StorageError::DeadlineExceeded.into();
        assert_eq!(err.code(), ErrorCode::TransactionFailed);
    }
}
