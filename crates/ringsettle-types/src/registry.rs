//! Read interfaces of the external collaborators.
//!
//! The engine never reaches a registry or token through ambient state: every
//! component receives the interfaces it needs as explicit arguments.
//! [`ChainState`] is the union of all of them, implemented automatically for
//! any type that implements each one.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, CollaboratorError, OrderHash, TokenType, Tranche};

// ---------------------------------------------------------------------------
// Authenticity registries
// ---------------------------------------------------------------------------

/// Hashes pre-registered by their owners as an alternative to a signature.
pub trait OrderHashRegistry {
    fn is_order_hash_registered(&self, owner: &Address, hash: &OrderHash) -> bool;
}

/// Orders submitted to the ledger's order book.
pub trait OrderBook {
    fn is_order_submitted(&self, hash: &OrderHash) -> bool;
}

// ---------------------------------------------------------------------------
// Brokers
// ---------------------------------------------------------------------------

/// A broker registered by an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerRegistration {
    pub broker: Address,
    /// Contract asked to approve each trade the broker makes; `None` if the
    /// broker needs no per-trade approval.
    pub interceptor: Option<Address>,
}

pub trait BrokerRegistry {
    fn broker_registration(&self, owner: &Address, broker: &Address)
    -> Option<BrokerRegistration>;
}

/// The trade a broker interceptor is asked to approve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeAuthorization {
    pub owner: Address,
    pub broker: Address,
    pub token: Address,
    pub amount: Amount,
}

pub trait BrokerInterceptor {
    /// `Ok(false)` is a denial; `Err` is a failed external call.
    fn authorize_trade(
        &self,
        interceptor: &Address,
        request: &TradeAuthorization,
    ) -> Result<bool, CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Burn rates of one token, per mille of the burn base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRate {
    /// Applies to fees of orders settled through ring matching.
    pub matching: u16,
    /// Applies to fees of peer-to-peer orders.
    pub p2p: u16,
}

impl BurnRate {
    /// Unpack the registry's 32-bit encoding: p2p rate in the upper 16 bits,
    /// matching rate in the lower 16.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_packed(packed: u32) -> Self {
        Self {
            matching: (packed & 0xFFFF) as u16,
            p2p: (packed >> 16) as u16,
        }
    }

    #[must_use]
    pub fn packed(self) -> u32 {
        (u32::from(self.p2p) << 16) | u32::from(self.matching)
    }

    #[must_use]
    pub fn for_mode(self, p2p: bool) -> u16 {
        if p2p { self.p2p } else { self.matching }
    }
}

pub trait BurnRateRegistry {
    fn burn_rate(&self, token: &Address) -> BurnRate;

    /// Share of each fee returned to `owner`, per mille of the burn base.
    fn rebate_rate(&self, owner: &Address) -> u16;
}

// ---------------------------------------------------------------------------
// Order state
// ---------------------------------------------------------------------------

pub trait FilledLedger {
    /// Cumulative `token_s` filled for the order, including splits.
    fn filled(&self, hash: &OrderHash) -> Amount;
}

pub trait CancellationLedger {
    fn is_cancelled(&self, hash: &OrderHash) -> bool;

    /// Orders of `owner` valid since at or before this time are cancelled.
    fn cutoff(&self, owner: &Address) -> Option<u64>;

    /// Like [`cutoff`](Self::cutoff) but limited to one trading pair.
    fn trading_pair_cutoff(&self, owner: &Address, token_s: &Address, token_b: &Address)
    -> Option<u64>;
}

pub trait FeeLedger {
    fn fee_balance(&self, owner: &Address, token: &Address) -> Amount;
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub trait TokenLedger {
    /// The standard the token actually implements; `None` for unknown tokens.
    fn token_type(&self, token: &Address) -> Option<TokenType>;

    fn balance_of(&self, token: &Address, owner: &Address, tranche: &Tranche) -> Amount;

    /// Fungible allowance granted by `owner` to `spender`.
    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount;

    /// Partitioned operator authorization granted by `holder`.
    fn is_operator(&self, token: &Address, holder: &Address, operator: &Address) -> bool;

    /// The partitioned token's own transfer check.
    fn can_send(
        &self,
        token: &Address,
        from: &Address,
        to: &Address,
        tranche: &Tranche,
        amount: Amount,
    ) -> Result<bool, CollaboratorError>;
}

/// Every read interface the engine consumes.
pub trait ChainState:
    OrderHashRegistry
    + OrderBook
    + BrokerRegistry
    + BrokerInterceptor
    + BurnRateRegistry
    + FilledLedger
    + CancellationLedger
    + FeeLedger
    + TokenLedger
{
}

impl<T: ?Sized> ChainState for T where
    T: OrderHashRegistry
        + OrderBook
        + BrokerRegistry
        + BrokerInterceptor
        + BurnRateRegistry
        + FilledLedger
        + CancellationLedger
        + FeeLedger
        + TokenLedger
{
}
