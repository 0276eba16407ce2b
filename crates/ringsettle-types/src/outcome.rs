//! Validation outcomes and non-fatal failure reasons.
//!
//! An [`OrderRejection`] invalidates one order; a [`RingFailure`] voids one
//! ring. Neither stops the rest of the submission from settling.

use serde::{Deserialize, Serialize};

use crate::SignAlgorithm;

// ---------------------------------------------------------------------------
// Per-order outcome
// ---------------------------------------------------------------------------

/// Result of validating a single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    /// Authenticated by a signature.
    Valid(AuthenticityProof),
    Invalid(OrderRejection),
    /// Authenticated without a signature check.
    Exempt(ExemptionReason),
}

impl ValidationOutcome {
    /// Valid and exempt orders may both be settled.
    #[must_use]
    pub fn is_settleable(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }

    #[must_use]
    pub fn rejection(&self) -> Option<OrderRejection> {
        match self {
            Self::Invalid(rejection) => Some(*rejection),
            _ => None,
        }
    }
}

/// How a signed order proved its authenticity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthenticityProof {
    Signature(SignAlgorithm),
}

/// Why an order did not need a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExemptionReason {
    /// Registered on the ledger's order book.
    OrderBookSubmission,
    /// Already partially filled by an earlier submission.
    PreviouslyFilled,
    /// Hash pre-registered in the order-hash registry.
    HashRegistered,
}

/// Why an order was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderRejection {
    SignatureInvalid,
    OrderExpired,
    OrderNotYetValid,
    OrderCancelled,
    BrokerNotRegistered,
    InterceptorDenied,
    OrderNotSubmitted,
    InvalidTokenPair,
    InvalidAmount,
    InvalidFeeMode,
    InvalidWalletSplit,
}

impl OrderRejection {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::OrderExpired => "ORDER_EXPIRED",
            Self::OrderNotYetValid => "ORDER_NOT_YET_VALID",
            Self::OrderCancelled => "ORDER_CANCELLED",
            Self::BrokerNotRegistered => "BROKER_NOT_REGISTERED",
            Self::InterceptorDenied => "INTERCEPTOR_DENIED",
            Self::OrderNotSubmitted => "ORDER_NOT_SUBMITTED",
            Self::InvalidTokenPair => "INVALID_TOKEN_PAIR",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidFeeMode => "INVALID_FEE_MODE",
            Self::InvalidWalletSplit => "INVALID_WALLET_SPLIT",
        }
    }
}

impl std::fmt::Display for OrderRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Per-ring failure
// ---------------------------------------------------------------------------

/// Why a ring was voided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RingFailure {
    /// The computed fill volume is zero.
    ZeroFill,
    /// An all-or-none member would only be partially filled.
    AllOrNoneUnmet,
    /// A partitioned transfer was not authorized by the holder or token.
    AuthorizationDenied,
    /// A member order failed validation.
    InvalidOrder {
        position: usize,
        rejection: OrderRejection,
    },
    /// `token_b` of a member differs from `token_s` of the next.
    TokenMismatch,
    /// Declared token types disagree on one ring leg.
    TokenTypeMismatch,
    InvalidRingSize,
    DuplicateOrder,
    /// The members' rates cannot be satisfied simultaneously.
    UnmatchableRates,
    ArithmeticOverflow,
}

impl RingFailure {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::ZeroFill => "ZERO_FILL",
            Self::AllOrNoneUnmet => "ALL_OR_NONE_UNMET",
            Self::AuthorizationDenied => "AUTHORIZATION_DENIED",
            Self::InvalidOrder { .. } => "INVALID_ORDER",
            Self::TokenMismatch => "TOKEN_MISMATCH",
            Self::TokenTypeMismatch => "TOKEN_TYPE_MISMATCH",
            Self::InvalidRingSize => "INVALID_RING_SIZE",
            Self::DuplicateOrder => "DUPLICATE_ORDER",
            Self::UnmatchableRates => "UNMATCHABLE_RATES",
            Self::ArithmeticOverflow => "ARITHMETIC_OVERFLOW",
        }
    }
}

impl std::fmt::Display for RingFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOrder {
                position,
                rejection,
            } => write!(f, "INVALID_ORDER(position {position}: {rejection})"),
            other => f.write_str(other.code()),
        }
    }
}
