//! Token movements.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, TokenType, Tranche};

/// One atomic token movement produced by settlement.
///
/// Tranches are zero for fungible tokens; `data` is forwarded to partitioned
/// tokens only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferItem {
    pub token: Address,
    pub token_type: TokenType,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub from_tranche: Tranche,
    pub to_tranche: Tranche,
    pub data: Vec<u8>,
}

impl TransferItem {
    /// `true` if two items move the same token along the same path and can
    /// be merged into one.
    #[must_use]
    pub fn same_route(&self, other: &Self) -> bool {
        self.token == other.token
            && self.token_type == other.token_type
            && self.from == other.from
            && self.to == other.to
            && self.from_tranche == other.from_tranche
            && self.to_tranche == other.to_tranche
            && self.data == other.data
    }

    /// Moving tokens to the same balance slot is a no-op.
    #[must_use]
    pub fn is_self_transfer(&self) -> bool {
        self.from == self.to && self.from_tranche == self.to_tranche
    }
}
