//! Quote error taxonomy
//!
//! Every failure is classified for the UI boundary as transient, invalid
//! input, or unexpected. Transient failures of the authoritative path are the
//! only ones the engine retries, and it retries them exactly once through the
//! fallback.

use thiserror::Error;
use tidepool_types::{FixedPointError, PoolError};

/// Result type alias for quoting operations
pub type QuoteResult<T> = std::result::Result<T, QuoteError>;

/// How a failure should be presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retry later; nothing is wrong with the request
    Transient,
    /// The request itself cannot be satisfied
    InvalidInput,
    /// A bug or an inconsistent ledger
    Unexpected,
}

/// Main error type for quote, share and entitlement computations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// Malformed or out-of-domain arguments
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Paired deposit requested against a pool with no reserves
    #[error("Pool has no reserves; the first deposit must supply its own ratio")]
    EmptyPool,

    /// Ledger unreachable
    #[error("{operation} unavailable: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    /// Ledger reachable but behind the requested block
    #[error("{operation} failed: ledger block not yet synchronized")]
    NotSynchronized { operation: &'static str },

    /// Ledger refused the computed call, e.g. a revert
    #[error("{operation} rejected by the pool: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },

    /// Ledger answered with something that does not decode
    #[error("{operation} returned a malformed response: {message}")]
    Malformed {
        operation: &'static str,
        message: String,
    },

    /// Inputs were valid but the result does not fit in 256 bits
    #[error("Arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },

    /// Fallback requested before any reserves were read
    #[error("No pool snapshot has been read yet")]
    NoSnapshot,

    /// Reads do not form a consistent pool
    #[error("Inconsistent pool state: {0}")]
    Pool(#[from] PoolError),

    /// Both the authoritative path and the fallback failed
    #[error("{authoritative}; fallback also failed: {fallback}")]
    FallbackFailed {
        authoritative: Box<QuoteError>,
        fallback: Box<QuoteError>,
    },
}

impl QuoteError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn overflow(operation: &'static str) -> Self {
        Self::Overflow { operation }
    }

    /// Check if the authoritative path should hand over to the fallback
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QuoteError::Unavailable { .. } | QuoteError::NotSynchronized { .. }
        )
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            QuoteError::InvalidInput { .. } | QuoteError::EmptyPool | QuoteError::Rejected { .. } => {
                ErrorClass::InvalidInput
            }
            QuoteError::Unavailable { .. }
            | QuoteError::NotSynchronized { .. }
            | QuoteError::NoSnapshot => ErrorClass::Transient,
            QuoteError::Malformed { .. } | QuoteError::Overflow { .. } | QuoteError::Pool(_) => {
                ErrorClass::Unexpected
            }
            QuoteError::FallbackFailed { fallback, .. } => fallback.class(),
        }
    }

    /// Human-readable message for the UI boundary
    pub fn user_message(&self) -> String {
        match self.class() {
            ErrorClass::Transient => {
                if self.is_not_synchronized() {
                    "Block synchronizing, please try again later.".to_string()
                } else {
                    "The pool is temporarily unreachable, please try again shortly.".to_string()
                }
            }
            ErrorClass::InvalidInput => match self.root_cause() {
                QuoteError::InvalidInput { reason } => format!("Your input is invalid: {reason}"),
                other => format!("Your input is invalid: {other}"),
            },
            ErrorClass::Unexpected => format!("Unexpected failure: {}", self.root_cause()),
        }
    }

    fn is_not_synchronized(&self) -> bool {
        match self {
            QuoteError::NotSynchronized { .. } => true,
            QuoteError::FallbackFailed { authoritative, .. } => authoritative.is_not_synchronized(),
            _ => false,
        }
    }

    /// The error that decided the class; for a failed fallback that is the
    /// fallback's own error
    fn root_cause(&self) -> &QuoteError {
        match self {
            QuoteError::FallbackFailed { fallback, .. } => fallback.root_cause(),
            other => other,
        }
    }
}

impl From<FixedPointError> for QuoteError {
    fn from(error: FixedPointError) -> Self {
        Self::InvalidInput {
            reason: error.to_string(),
        }
    }
}
