//! # Storefront Error Types
//!
//! Typed error handling for the shopfront order engine.
//! All checkout and account operations return `Result<T, ShopError>`.

use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field that failed validation (e.g. "email", "password")
    pub field: &'static str,
    /// Human-readable message for that field
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(FieldError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Core error type for all storefront operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed input with per-field detail
    #[error("Validation failed: {}", join_fields(.fields))]
    Validation { fields: Vec<FieldError> },

    /// Bad credentials. Carries no detail about which field was wrong so
    /// callers cannot enumerate accounts.
    #[error("Invalid email or password")]
    Unauthorized,

    /// Operation requires an authenticated session, none present
    #[error("Authentication required")]
    Unauthenticated,

    /// Duplicate resource (e.g. email already registered)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Structurally invalid request (e.g. empty product set)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Referenced resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    Provider { provider: String, message: String },

    /// Network/HTTP error communicating with a collaborator
    #[error("Network error: {0}")]
    Network(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Convenience constructor for a single-field validation failure
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        ShopError::Validation {
            fields: vec![FieldError::new(field, message)],
        }
    }

    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShopError::Network(_) | ShopError::Provider { .. })
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Configuration(_) => 500,
            ShopError::Validation { .. } => 400,
            ShopError::Unauthorized => 401,
            ShopError::Unauthenticated => 401,
            ShopError::Conflict(_) => 409,
            ShopError::BadRequest(_) => 400,
            ShopError::NotFound(_) => 404,
            ShopError::Provider { .. } => 502,
            ShopError::Network(_) => 503,
            ShopError::WebhookVerificationFailed(_) => 401,
            ShopError::WebhookParseError(_) => 400,
            ShopError::Serialization(_) => 500,
            ShopError::Internal(_) => 500,
        }
    }
}

/// Result type alias for storefront operations
pub type ShopResult<T> = Result<T, ShopError>;
