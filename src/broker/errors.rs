//! # Broker Errors
//!
//! Error types for instance and binding lifecycle operations.
//!
//! Every failure is returned to the caller. The HTTP layer maps each variant
//! to a status code; nothing here is swallowed.

use serde::Serialize;
use thiserror::Error;

/// Broker error types
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum BrokerError {
    /// Cannot reach or authenticate to the backing server as administrator
    #[error("Cannot connect to backing database: {message}")]
    ConnectionFailed { message: String },

    /// A create-time command failed after the connection was established.
    ///
    /// The instance may be half-created. Operator attention is required.
    #[error("Provisioning failed for {instance_id}: {reason}")]
    ProvisioningFailed { instance_id: String, reason: String },

    /// A delete-time command failed. Safe to retry.
    #[error("Deprovisioning failed for {instance_id}: {reason}")]
    DeprovisioningFailed { instance_id: String, reason: String },

    /// Operation is not supported by this broker
    #[error("Operation '{operation}' is not implemented")]
    Unimplemented { operation: &'static str },

    /// Provision request names a service this broker does not offer
    #[error("Unknown service: {service_id}")]
    UnknownService { service_id: String },

    /// Provision request names a plan the service does not offer
    #[error("Unknown plan '{plan_id}' for service {service_id}")]
    UnknownPlan { service_id: String, plan_id: String },

    /// Malformed request
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;

impl BrokerError {
    /// Whether the current process should stop serving after this error.
    ///
    /// A failed create leaves the instance in an indeterminate state, so
    /// the process supervisor decides whether to restart.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ProvisioningFailed { .. })
    }

    /// Whether the caller may simply retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::DeprovisioningFailed { .. }
        )
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ConnectionFailed { .. } => 503,
            Self::ProvisioningFailed { .. } => 500,
            Self::DeprovisioningFailed { .. } => 500,
            Self::Unimplemented { .. } => 501,
            Self::UnknownService { .. } => 400,
            Self::UnknownPlan { .. } => 400,
            Self::InvalidRequest { .. } => 400,
            Self::ConfigError { .. } => 500,
            Self::Internal { .. } => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed { .. } => "CONNECTION_FAILED",
            Self::ProvisioningFailed { .. } => "PROVISIONING_FAILED",
            Self::DeprovisioningFailed { .. } => "DEPROVISIONING_FAILED",
            Self::Unimplemented { .. } => "UNIMPLEMENTED",
            Self::UnknownService { .. } => "UNKNOWN_SERVICE",
            Self::UnknownPlan { .. } => "UNKNOWN_PLAN",
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

/// API error response
///
/// `description` is the field broker-protocol clients display to users.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub code: &'static str,
    pub status: u16,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<BrokerError> for ErrorResponse {
    fn from(err: BrokerError) -> Self {
        Self {
            error: err.error_code(),
            code: err.error_code(),
            status: err.status_code(),
            description: err.to_string(),
            details: serde_json::to_value(&err).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = BrokerError::ConnectionFailed {
            message: "refused".to_string(),
        };
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.error_code(), "CONNECTION_FAILED");

        let err = BrokerError::Unimplemented {
            operation: "get_instance",
        };
        assert_eq!(err.status_code(), 501);
        assert_eq!(err.error_code(), "UNIMPLEMENTED");
    }

    #[test]
    fn test_failure_classification() {
        let create = BrokerError::ProvisioningFailed {
            instance_id: "abc".to_string(),
            reason: "grant denied".to_string(),
        };
        assert!(create.is_fatal());
        assert!(!create.is_retryable());

        let delete = BrokerError::DeprovisioningFailed {
            instance_id: "abc".to_string(),
            reason: "lock wait timeout".to_string(),
        };
        assert!(!delete.is_fatal());
        assert!(delete.is_retryable());

        let connect = BrokerError::ConnectionFailed {
            message: "refused".to_string(),
        };
        assert!(!connect.is_fatal());
        assert!(connect.is_retryable());
    }

    #[test]
    fn test_error_response_carries_details() {
        let err = BrokerError::ProvisioningFailed {
            instance_id: "abc-123".to_string(),
            reason: "disk full".to_string(),
        };
        let response = ErrorResponse::from(err);
        assert_eq!(response.status, 500);
        assert!(response.description.contains("abc-123"));

        let details = response.details.unwrap();
        assert_eq!(details["type"], "ProvisioningFailed");
        assert_eq!(details["details"]["reason"], "disk full");
    }
}
