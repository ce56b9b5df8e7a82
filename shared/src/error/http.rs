//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::ReservationNotFound
            | Self::OrderNotFound
            | Self::IngredientNotFound
            | Self::MenuItemNotFound
            | Self::TableNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (shared resource already claimed)
            Self::AlreadyExists
            | Self::ReservationConflict
            | Self::InsufficientStock
            | Self::TableConflict
            | Self::TableInUse
            | Self::TableNumberExists
            | Self::InvalidStateTransition => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::InvalidActor => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::RoleRequired => StatusCode::FORBIDDEN,

            // 503 Service Unavailable (aborted before commit, client can retry)
            Self::TransactionFailed => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::CodeGenerationFailed => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (validation)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_statuses() {
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::TableNotFound.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_statuses() {
        assert_eq!(ErrorCode::TableConflict.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::ReservationConflict.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::InsufficientStock.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_defaults_to_bad_request() {
        assert_eq!(ErrorCode::EmptyCart.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InvalidQuantity.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::ItemUnavailable.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::CapacityExceeded.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_transaction_failed_is_retryable() {
        assert_eq!(
            ErrorCode::TransactionFailed.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
