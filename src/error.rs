use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Outbound payment request rejected before any external call.
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    /// Callback signature did not match the recomputed HMAC.
    #[error("Callback signature verification failed")]
    SignatureInvalid,

    /// Callback referenced a transaction we never issued.
    #[error("Payment not found for transaction ref '{0}'")]
    PaymentNotFound(String),

    /// Requested status change is not in the transition tables.
    #[error("Illegal {entity} transition: {event} from {from}")]
    IllegalTransition {
        entity: &'static str,
        from: String,
        event: &'static str,
    },

    /// Mutation attempted on a repair order that has already been paid.
    #[error("Repair order is locked after payment")]
    OrderLocked,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Returns a stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::SignatureInvalid => "SIGNATURE_INVALID",
            AppError::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            AppError::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            AppError::OrderLocked => "ORDER_LOCKED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for errors that must never mutate persisted state.
    pub fn is_untrusted_callback(&self) -> bool {
        matches!(
            self,
            AppError::SignatureInvalid | AppError::PaymentNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::SignatureInvalid.code(), "SIGNATURE_INVALID");
        assert_eq!(AppError::OrderLocked.code(), "ORDER_LOCKED");
        assert_eq!(
            AppError::PaymentNotFound("TXN-1".to_string()).code(),
            "PAYMENT_NOT_FOUND"
        );
    }

    #[test]
    fn test_untrusted_callback_errors() {
        assert!(AppError::SignatureInvalid.is_untrusted_callback());
        assert!(AppError::PaymentNotFound("x".to_string()).is_untrusted_callback());
        assert!(!AppError::OrderLocked.is_untrusted_callback());
    }

    #[test]
    fn test_illegal_transition_display() {
        let err = AppError::IllegalTransition {
            entity: "repair_order",
            from: "DONE".to_string(),
            event: "approve",
        };
        assert_eq!(
            err.to_string(),
            "Illegal repair_order transition: approve from DONE"
        );
    }
}
