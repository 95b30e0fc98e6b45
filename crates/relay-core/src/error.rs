//! # Payment Error Types
//!
//! Typed error handling for the relay.
//! All gateway and sequencing operations return `Result<T, PaymentError>`.

use serde_json::Value;
use thiserror::Error;

/// Markers the remote platform uses to report a lifecycle step that has
/// already happened. Matched case-insensitively, with `_` read as a space.
const DUPLICATE_MARKERS: &[&str] = &["already approved", "already completed"];

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Amount could not be normalized to a positive number
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    /// Payment provider answered with a non-2xx status
    #[error("Provider error [{provider}] HTTP {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
        /// Raw error payload from the provider, passed through to callers
        details: Option<Value>,
    },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Building, signing or submitting a ledger transaction failed
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// A transfer was asked to move between states it cannot reach
    #[error("Invalid transfer transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// A transfer step failed and the sequence was aborted
    #[error("Transfer failed at {step}: {source}")]
    TransferFailed {
        step: String,
        #[source]
        source: Box<PaymentError>,
    },

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Closed set of outcomes a remote failure can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The remote already performed this step; callers treat it as success
    Duplicate,
    /// Network trouble, throttling or a remote 5xx
    Transient,
    /// Anything else
    Fatal,
}

impl PaymentError {
    /// Classify this error for idempotency handling.
    pub fn classify(&self) -> RemoteErrorKind {
        match self {
            PaymentError::NetworkError(_) => RemoteErrorKind::Transient,
            PaymentError::ProviderError {
                status,
                message,
                details,
                ..
            } => {
                if (400..500).contains(status) && is_duplicate_signal(message, details.as_ref()) {
                    RemoteErrorKind::Duplicate
                } else if *status == 429 || *status >= 500 {
                    RemoteErrorKind::Transient
                } else {
                    RemoteErrorKind::Fatal
                }
            }
            PaymentError::TransferFailed { source, .. } => source.classify(),
            _ => RemoteErrorKind::Fatal,
        }
    }

    /// Returns true if the remote reported this step as already done
    pub fn is_duplicate(&self) -> bool {
        self.classify() == RemoteErrorKind::Duplicate
    }

    /// Returns true if this error is retryable by the caller
    pub fn is_retryable(&self) -> bool {
        self.classify() == RemoteErrorKind::Transient
    }

    /// Returns true if this error was caused by the inbound request
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PaymentError::InvalidRequest(_) | PaymentError::InvalidAmount { .. }
        )
    }

    /// Remote payload to pass through to the caller for diagnosis
    pub fn details(&self) -> Option<&Value> {
        match self {
            PaymentError::ProviderError { details, .. } => details.as_ref(),
            PaymentError::TransferFailed { source, .. } => source.details(),
            _ => None,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::InvalidAmount { .. } => 400,
            PaymentError::Configuration(_)
            | PaymentError::ProviderError { .. }
            | PaymentError::NetworkError(_)
            | PaymentError::Ledger(_)
            | PaymentError::InvalidTransition { .. }
            | PaymentError::TransferFailed { .. }
            | PaymentError::Internal(_)
            | PaymentError::Serialization(_) => 500,
        }
    }
}

fn is_duplicate_signal(message: &str, details: Option<&Value>) -> bool {
    let mut haystack = normalize_marker_text(message);

    if let Some(obj) = details.and_then(Value::as_object) {
        for key in ["error", "error_message", "message"] {
            if let Some(text) = obj.get(key).and_then(Value::as_str) {
                haystack.push(' ');
                haystack.push_str(&normalize_marker_text(text));
            }
        }
    }

    DUPLICATE_MARKERS.iter().any(|m| haystack.contains(m))
}

fn normalize_marker_text(text: &str) -> String {
    text.to_lowercase().replace('_', " ")
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
