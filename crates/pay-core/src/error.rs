//! # Payment Error Types
//!
//! Typed error handling for the payment bundle.
//!
//! Two families live here:
//! - `PaymentError` for everything that prevents a transaction from being
//!   classified at all (bad input, transport failures, missing plugins).
//! - `FinancialError` / `ActionRequired` for the classified outcomes of a
//!   gateway round-trip. These are carried inside a `TransactionOutcome` and
//!   surfaced to callers through `PluginError` once the patch is applied.

use serde_json::Value;
use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data (missing token, missing charge reference, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The gateway returned a payload we cannot classify
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// No registered plugin processes the requested payment method
    #[error("No plugin processes payment method: {method}")]
    PluginNotFound { method: String },

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentError::NetworkError(_))
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

/// Provider error category, read from `error.type` of a failed response.
///
/// All categories are handled the same way today; the kind is kept so that
/// callers and logs can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    ApiError,
    CardError,
    Other(String),
}

impl ErrorKind {
    pub fn from_type(error_type: Option<&str>) -> Self {
        match error_type {
            Some("api_error") => ErrorKind::ApiError,
            Some("card_error") => ErrorKind::CardError,
            Some(other) => ErrorKind::Other(other.to_string()),
            None => ErrorKind::Other(String::new()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::ApiError => "api_error",
            ErrorKind::CardError => "card_error",
            ErrorKind::Other(other) => other,
        }
    }
}

/// A classified financial failure reported by the gateway.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Financial operation failed: {message}")]
pub struct FinancialError {
    /// Human readable gateway message
    pub message: String,
    /// Provider error category
    pub kind: ErrorKind,
    /// Raw provider error structure (`error` of the response payload)
    pub error: Value,
    /// Reason code recorded on the transaction (message, at most 100 chars)
    pub reason_code: String,
    /// Tracking id of the failed transaction
    pub tracking_id: Option<String>,
    /// Gateway reference of the failed transaction, if one was assigned
    pub reference_number: Option<String>,
}

/// Signal that the end user must complete an extra step (e.g. 3-D Secure)
/// before the transaction can settle. Not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Action required for transaction {reference_number}")]
pub struct ActionRequired {
    /// Payment intent reference the follow-up confirm must target
    pub reference_number: String,
    /// Client secret handed to the front-end SDK
    pub client_secret: Option<String>,
}

/// Error surfaced to callers after an outcome has been applied.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error(transparent)]
    ActionRequired(#[from] ActionRequired),

    #[error(transparent)]
    Financial(#[from] FinancialError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl PluginError {
    /// True for the action-required signal, which callers must treat as
    /// "prompt the user", not as a failure.
    pub fn is_action_required(&self) -> bool {
        matches!(self, PluginError::ActionRequired(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PaymentError::NetworkError("timeout".into()).is_retryable());
        assert!(!PaymentError::InvalidResponse("no amount".into()).is_retryable());
        assert!(!PaymentError::InvalidRequest("bad data".into()).is_retryable());
        assert!(!PaymentError::PluginNotFound {
            method: "paypal".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_error_kind_from_type() {
        assert_eq!(ErrorKind::from_type(Some("api_error")), ErrorKind::ApiError);
        assert_eq!(ErrorKind::from_type(Some("card_error")), ErrorKind::CardError);
        assert_eq!(
            ErrorKind::from_type(Some("rate_limit_error")),
            ErrorKind::Other("rate_limit_error".into())
        );
        assert_eq!(ErrorKind::from_type(None).as_str(), "");
    }

    #[test]
    fn test_plugin_error_action_required() {
        let err: PluginError = ActionRequired {
            reference_number: "pi_1".into(),
            client_secret: Some("pi_1_secret".into()),
        }
        .into();
        assert!(err.is_action_required());

        let err: PluginError = PaymentError::Internal("x".into()).into();
        assert!(!err.is_action_required());
    }
}
