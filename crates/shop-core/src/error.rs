//! # Shop Error Types
//!
//! Typed error handling for the voltshop storefront.
//! All fallible operations return `Result<T, ShopError>`.

use thiserror::Error;

/// Core error type for all storefront operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration errors (missing env vars, invalid config files)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid input rejected before any state is mutated
    #[error("Validation error: {0}")]
    Validation(String),

    /// Product not found in catalog
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Coupon code or id did not resolve
    #[error("Coupon not found: {code}")]
    CouponNotFound { code: String },

    /// Order not found in the repository
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// Payment gateway returned a failure response
    #[error("Gateway error: {message}")]
    Gateway { message: String },

    /// Network/HTTP error reaching the payment gateway
    #[error("Network error: {0}")]
    Network(String),

    /// Callback signature verification failed
    #[error("Callback rejected: {0}")]
    Security(String),

    /// Trusted input references state that does not exist
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Invalid payment state transition
    #[error("Invalid payment transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Session/order storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ShopError {
    /// Returns true if retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShopError::Network(_) | ShopError::Gateway { .. })
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Configuration(_) => 500,
            ShopError::Validation(_) => 400,
            ShopError::ProductNotFound { .. } => 404,
            ShopError::CouponNotFound { .. } => 404,
            ShopError::OrderNotFound { .. } => 404,
            ShopError::Gateway { .. } => 502,
            ShopError::Network(_) => 503,
            ShopError::Security(_) => 401,
            ShopError::Integrity(_) => 500,
            ShopError::InvalidTransition { .. } => 409,
            ShopError::Storage(_) => 500,
            ShopError::Serialization(_) => 500,
        }
    }
}

/// Result type alias for storefront operations
pub type ShopResult<T> = Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ShopError::Network("timeout".into()).is_retryable());
        assert!(ShopError::Gateway {
            message: "HTTP 502".into()
        }
        .is_retryable());
        assert!(!ShopError::Validation("quantity must be positive".into()).is_retryable());
        assert!(!ShopError::Security("signature mismatch".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ShopError::Validation("bad".into()).status_code(), 400);
        assert_eq!(
            ShopError::ProductNotFound {
                product_id: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(ShopError::Security("mismatch".into()).status_code(), 401);
        assert_eq!(
            ShopError::Gateway {
                message: "declined".into()
            }
            .status_code(),
            502
        );
    }
}
