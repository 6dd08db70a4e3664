//! Bridge error taxonomy
//!
//! Every variant is rendered locally as a user-visible message; none of them
//! escape the handler that produced them.

use thiserror::Error;

/// Errors raised by bridge operations and the provider seam
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// No wallet provider capability is available in this environment
    #[error("no wallet provider available")]
    ProviderAbsent,

    /// The wallet declined (or could not grant) account access
    #[error("wallet account access denied: {0}")]
    AuthorizationDenied(String),

    /// An action was attempted before a session exists
    #[error("please wait for blockchain connection to initialize")]
    NotConnected,

    /// User input failed validation (e.g. empty ZIP code)
    #[error("{0}")]
    InvalidInput(String),

    /// Signing rejected, network error or contract revert during a state-mutating call
    #[error("{0}")]
    SubmissionFailure(String),

    /// Listener-level provider error for one contract event
    #[error("{event} listener error: {message}")]
    EventDelivery {
        event: &'static str,
        message: String,
    },

    /// A read-only contract query failed
    #[error("query failed: {0}")]
    QueryFailure(String),
}

impl BridgeError {
    /// Short machine-friendly label, logged as the `error_kind` tracing field
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::ProviderAbsent => "provider_absent",
            BridgeError::AuthorizationDenied(_) => "authorization_denied",
            BridgeError::NotConnected => "not_connected",
            BridgeError::InvalidInput(_) => "invalid_input",
            BridgeError::SubmissionFailure(_) => "submission_failure",
            BridgeError::EventDelivery { .. } => "event_delivery",
            BridgeError::QueryFailure(_) => "query_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_failure_displays_reason_only() {
        let err = BridgeError::SubmissionFailure("user rejected signing".to_string());
        assert_eq!(err.to_string(), "user rejected signing");
        assert_eq!(err.kind(), "submission_failure");
    }

    #[test]
    fn test_event_delivery_names_event() {
        let err = BridgeError::EventDelivery {
            event: "AverageValueUpdated",
            message: "connection reset".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "AverageValueUpdated listener error: connection reset"
        );
    }
}
