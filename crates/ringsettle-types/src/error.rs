//! Error types for the RingSettle engine.
//!
//! All errors use the `RS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order validation errors
//! - 2xx: Ring errors
//! - 3xx: Batch-fatal settlement errors (the whole submission reverts)
//! - 4xx: Wire codec errors
//! - 5xx: Collaborator errors
//! - 6xx: Invariant / verification errors
//! - 9xx: General / internal errors
//!
//! Per-order and per-ring failures are usually carried as values
//! ([`OrderRejection`](crate::OrderRejection), [`RingFailure`](crate::RingFailure))
//! because they only void a ring; the variants here wrap them when a caller
//! wants a `Result`.

use thiserror::Error;

use crate::{Address, OrderRejection, RingFailure};

/// Central error enum for all RingSettle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingsettleError {
    // =================================================================
    // Order Validation Errors (1xx)
    // =================================================================
    /// An order was rejected by the validator.
    #[error("RS_ERR_100: Order rejected: {0}")]
    OrderRejected(OrderRejection),

    /// An order index does not refer to an order in the submission.
    #[error("RS_ERR_101: Order index {index} out of bounds ({count} orders)")]
    OrderIndexOutOfBounds { index: usize, count: usize },

    // =================================================================
    // Ring Errors (2xx)
    // =================================================================
    /// A ring could not be settled; only that ring is voided.
    #[error("RS_ERR_200: Ring voided: {0}")]
    RingVoided(RingFailure),

    /// Amount arithmetic left the 256-bit range.
    #[error("RS_ERR_201: Arithmetic overflow")]
    ArithmeticOverflow,

    // =================================================================
    // Batch-Fatal Errors (3xx)
    // =================================================================
    /// A declared token type is not supported by the ledger's token.
    #[error("RS_ERR_300: Unsupported token type combination for token {token}: {reason}")]
    UnsupportedTokenTypeCombination { token: Address, reason: String },

    /// A token movement failed while being executed.
    #[error("RS_ERR_301: Transfer execution failure: {reason}")]
    TransferExecutionFailure { reason: String },

    /// The mining signature is missing or invalid and no exemption applies.
    #[error("RS_ERR_302: Missing required signature for miner {miner}")]
    MissingRequiredSignature { miner: Address },

    /// The submission is structurally unusable.
    #[error("RS_ERR_303: Malformed submission: {reason}")]
    MalformedSubmission { reason: String },

    // =================================================================
    // Wire Codec Errors (4xx)
    // =================================================================
    /// Input ended before a field could be read.
    #[error("RS_ERR_400: Truncated input: need {needed} bytes at offset {offset}")]
    TruncatedInput { offset: usize, needed: usize },

    /// The wire format version is not understood.
    #[error("RS_ERR_401: Unsupported wire format version {0}")]
    UnsupportedVersion(u16),

    /// A token-type code on the wire is unknown.
    #[error("RS_ERR_402: Unknown token type code {0}")]
    UnknownTokenType(u8),

    /// A signature-algorithm code on the wire is unknown.
    #[error("RS_ERR_403: Unknown signature algorithm code {0}")]
    UnknownSignAlgorithm(u8),

    /// Any other encoding problem (oversized amount, trailing bytes, ...).
    #[error("RS_ERR_404: Invalid encoding: {reason}")]
    InvalidEncoding { reason: String },

    // =================================================================
    // Collaborator Errors (5xx)
    // =================================================================
    /// An external collaborator call failed.
    #[error("RS_ERR_500: Collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),

    // =================================================================
    // Invariant / Verification Errors (6xx)
    // =================================================================
    /// Token supply conservation violated. Critical safety alert.
    #[error("RS_ERR_600: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    /// A filled amount decreased or exceeded the order size.
    #[error("RS_ERR_601: Fill invariant violation: {reason}")]
    FillInvariantViolation { reason: String },

    /// The simulated report does not match the observed outcome.
    #[error("RS_ERR_602: Report mismatch: {count} discrepancies")]
    ReportMismatch { count: usize },

    /// Two report roots that must be equal differ.
    #[error("RS_ERR_603: Determinism violation: expected {expected}, got {actual}")]
    DeterminismViolation { expected: String, actual: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("RS_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("RS_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config document, bad values, etc.).
    #[error("RS_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl RingsettleError {
    /// Returns `true` if this error aborts the entire submission.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedTokenTypeCombination { .. }
                | Self::TransferExecutionFailure { .. }
                | Self::MissingRequiredSignature { .. }
                | Self::MalformedSubmission { .. }
                | Self::TruncatedInput { .. }
                | Self::UnsupportedVersion(_)
                | Self::UnknownTokenType(_)
                | Self::UnknownSignAlgorithm(_)
                | Self::InvalidEncoding { .. }
                | Self::OrderIndexOutOfBounds { .. }
        )
    }

    /// The revert reason recorded in a reverted report.
    #[must_use]
    pub fn revert_reason(&self) -> &'static str {
        match self {
            Self::UnsupportedTokenTypeCombination { .. } => "UNSUPPORTED_TOKEN_TYPE_COMBINATION",
            Self::TransferExecutionFailure { .. } => "TRANSFER_EXECUTION_FAILURE",
            Self::MissingRequiredSignature { .. } => "MISSING_REQUIRED_SIGNATURE",
            Self::MalformedSubmission { .. } | Self::OrderIndexOutOfBounds { .. } => {
                "MALFORMED_SUBMISSION"
            }
            Self::TruncatedInput { .. }
            | Self::UnsupportedVersion(_)
            | Self::UnknownTokenType(_)
            | Self::UnknownSignAlgorithm(_)
            | Self::InvalidEncoding { .. } => "INVALID_ENCODING",
            Self::ArithmeticOverflow => "ARITHMETIC_OVERFLOW",
            _ => "INTERNAL_ERROR",
        }
    }
}

/// A failed call into an external collaborator (registry, interceptor, token).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{collaborator} call failed: {reason}")]
pub struct CollaboratorError {
    pub collaborator: String,
    pub reason: String,
}

impl CollaboratorError {
    #[must_use]
    pub fn new(collaborator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            collaborator: collaborator.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, RingsettleError>;

impl From<serde_json::Error> for RingsettleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
