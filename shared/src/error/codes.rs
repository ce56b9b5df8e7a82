//! Unified error codes for the restaurant core
//!
//! Error codes are shared by resto-server and its HTTP clients.
//! Codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Reservation errors
//! - 4xxx: Order errors
//! - 5xxx: Inventory errors
//! - 6xxx: Menu errors
//! - 7xxx: Table errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// No actor identity on the request
    NotAuthenticated = 1001,
    /// Actor identity headers are malformed
    InvalidActor = 1002,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,

    // ==================== 3xxx: Reservation ====================
    /// Reservation not found
    ReservationNotFound = 3001,
    /// Target already booked by another customer on that date
    ReservationConflict = 3002,
    /// Party size must be at least one
    PartySizeInvalid = 3003,
    /// No unique confirmation code could be generated
    CodeGenerationFailed = 3004,
    /// Party does not fit at the reserved table
    CapacityExceeded = 3005,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Cart has no lines
    EmptyCart = 4002,
    /// State transition not allowed
    InvalidStateTransition = 4003,
    /// Menu item missing or unavailable
    ItemUnavailable = 4004,
    /// Dine-in order without a table
    TableRequired = 4005,
    /// Delivery order without an address
    DeliveryAddressRequired = 4006,

    // ==================== 5xxx: Inventory ====================
    /// Ingredient not found
    IngredientNotFound = 5001,
    /// Not enough stock on hand
    InsufficientStock = 5002,
    /// Quantity must be positive
    InvalidQuantity = 5003,

    // ==================== 6xxx: Menu ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Recipe references an unknown ingredient or a bad amount
    RecipeInvalid = 6002,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table held by another customer's active order
    TableConflict = 7002,
    /// Table is disabled
    TableDisabled = 7003,
    /// Table is referenced and cannot be deleted
    TableInUse = 7004,
    /// Table number already used
    TableNumberExists = 7005,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Transaction aborted, nothing was written
    TransactionFailed = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "Actor identity is missing",
            ErrorCode::InvalidActor => "Actor identity is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",

            // Reservation
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::ReservationConflict => "Target is already reserved for that date",
            ErrorCode::PartySizeInvalid => "Party size must be at least one",
            ErrorCode::CodeGenerationFailed => "Could not generate a unique confirmation code",
            ErrorCode::CapacityExceeded => "Party size exceeds table capacity",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::EmptyCart => "Cart is empty",
            ErrorCode::InvalidStateTransition => "State transition is not allowed",
            ErrorCode::ItemUnavailable => "Menu item is not available",
            ErrorCode::TableRequired => "Dine-in orders require a table",
            ErrorCode::DeliveryAddressRequired => "Delivery orders require an address",

            // Inventory
            ErrorCode::IngredientNotFound => "Ingredient not found",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::InvalidQuantity => "Quantity must be greater than zero",

            // Menu
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::RecipeInvalid => "Recipe is invalid",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableConflict => "Table is occupied by another customer",
            ErrorCode::TableDisabled => "Table is disabled",
            ErrorCode::TableInUse => "Table is referenced by orders or reservations",
            ErrorCode::TableNumberExists => "Table number already exists",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::TransactionFailed => "Transaction failed, nothing was written",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidActor),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),

            // Reservation
            3001 => Ok(ErrorCode::ReservationNotFound),
            3002 => Ok(ErrorCode::ReservationConflict),
            3003 => Ok(ErrorCode::PartySizeInvalid),
            3004 => Ok(ErrorCode::CodeGenerationFailed),
            3005 => Ok(ErrorCode::CapacityExceeded),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::EmptyCart),
            4003 => Ok(ErrorCode::InvalidStateTransition),
            4004 => Ok(ErrorCode::ItemUnavailable),
            4005 => Ok(ErrorCode::TableRequired),
            4006 => Ok(ErrorCode::DeliveryAddressRequired),

            // Inventory
            5001 => Ok(ErrorCode::IngredientNotFound),
            5002 => Ok(ErrorCode::InsufficientStock),
            5003 => Ok(ErrorCode::InvalidQuantity),

            // Menu
            6001 => Ok(ErrorCode::MenuItemNotFound),
            6002 => Ok(ErrorCode::RecipeInvalid),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableConflict),
            7003 => Ok(ErrorCode::TableDisabled),
            7004 => Ok(ErrorCode::TableInUse),
            7005 => Ok(ErrorCode::TableNumberExists),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9004 => Ok(ErrorCode::TransactionFailed),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
