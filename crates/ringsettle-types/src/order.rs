//! Order model.
//!
//! An [`Order`] is a signed intent to sell up to `amount_s` of `token_s` for
//! at least `amount_b` of `token_b` at that rate. Every field has a concrete
//! value; protocol defaults (recipient = owner, fee token = the protocol base
//! token, fungible token types, zero tranches) are filled in by
//! [`Order::new`] and omitted again by the wire codec.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::ORDER_HASH_DOMAIN;
use crate::{Address, Amount, OrderHash, Signature, TokenType, Tranche};

/// A trade order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub version: u32,
    pub owner: Address,
    /// Token sold.
    pub token_s: Address,
    /// Token bought.
    pub token_b: Address,
    pub amount_s: Amount,
    pub amount_b: Amount,
    /// Unix seconds from which the order may be filled.
    pub valid_since: u64,
    /// Unix seconds at which the order expires; `0` means never.
    pub valid_until: u64,
    /// Delegate that signs and trades on the owner's behalf.
    pub broker: Option<Address>,
    /// Key that must co-sign the mining hash of any submission using this order.
    pub dual_auth_addr: Option<Address>,
    pub wallet_addr: Option<Address>,
    /// Wallet's share of the net fee, in percent.
    pub wallet_split_percentage: u8,
    /// Receiver of the bought tokens.
    pub token_recipient: Address,
    pub fee_token: Address,
    /// Cash fee for filling the whole order, in `fee_token`.
    pub fee_amount: Amount,
    /// Non-zero selects peer-to-peer fee mode.
    pub waive_fee_percentage: u16,
    pub token_s_fee_percentage: u16,
    pub token_b_fee_percentage: u16,
    pub all_or_none: bool,
    pub token_type_s: TokenType,
    pub token_type_b: TokenType,
    pub token_type_fee: TokenType,
    pub tranche_s: Tranche,
    pub tranche_b: Tranche,
    /// Opaque data forwarded with partitioned transfers of `token_s`.
    pub transfer_data_s: Vec<u8>,
    pub sig: Option<Signature>,
    pub dual_auth_sig: Option<Signature>,
    /// Authenticated by prior registration in the order book, not by signature.
    pub on_chain: bool,
}

impl Order {
    /// A normalized order with every optional field at its protocol default.
    #[must_use]
    pub fn new(
        owner: Address,
        token_s: Address,
        token_b: Address,
        amount_s: Amount,
        amount_b: Amount,
        base_token: Address,
    ) -> Self {
        Self {
            version: 0,
            owner,
            token_s,
            token_b,
            amount_s,
            amount_b,
            valid_since: 0,
            valid_until: 0,
            broker: None,
            dual_auth_addr: None,
            wallet_addr: None,
            wallet_split_percentage: 0,
            token_recipient: owner,
            fee_token: base_token,
            fee_amount: Amount::ZERO,
            waive_fee_percentage: 0,
            token_s_fee_percentage: 0,
            token_b_fee_percentage: 0,
            all_or_none: false,
            token_type_s: TokenType::Fungible,
            token_type_b: TokenType::Fungible,
            token_type_fee: TokenType::Fungible,
            tranche_s: Tranche::DEFAULT,
            tranche_b: Tranche::DEFAULT,
            transfer_data_s: Vec::new(),
            sig: None,
            dual_auth_sig: None,
            on_chain: false,
        }
    }

    /// Deterministic identity of the order.
    ///
    /// Covers every field except the signatures and the `on_chain` flag, so
    /// signing or registering an order does not change its hash.
    #[must_use]
    pub fn hash(&self) -> OrderHash {
        let mut hasher = Sha256::new();
        hasher.update(ORDER_HASH_DOMAIN);
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.owner);
        hasher.update(self.token_s);
        hasher.update(self.token_b);
        hasher.update(self.amount_s.to_be_bytes::<32>());
        hasher.update(self.amount_b.to_be_bytes::<32>());
        hasher.update(self.valid_since.to_le_bytes());
        hasher.update(self.valid_until.to_le_bytes());
        hash_optional_address(&mut hasher, self.broker.as_ref());
        hash_optional_address(&mut hasher, self.dual_auth_addr.as_ref());
        hash_optional_address(&mut hasher, self.wallet_addr.as_ref());
        hasher.update([self.wallet_split_percentage]);
        hasher.update(self.token_recipient);
        hasher.update(self.fee_token);
        hasher.update(self.fee_amount.to_be_bytes::<32>());
        hasher.update(self.waive_fee_percentage.to_le_bytes());
        hasher.update(self.token_s_fee_percentage.to_le_bytes());
        hasher.update(self.token_b_fee_percentage.to_le_bytes());
        hasher.update([u8::from(self.all_or_none)]);
        hasher.update([
            self.token_type_s.code(),
            self.token_type_b.code(),
            self.token_type_fee.code(),
        ]);
        hasher.update(self.tranche_s.as_bytes());
        hasher.update(self.tranche_b.as_bytes());
        hasher.update((self.transfer_data_s.len() as u64).to_le_bytes());
        hasher.update(&self.transfer_data_s);
        OrderHash::from_bytes(hasher.finalize().into())
    }

    /// Account whose signature authenticates this order.
    #[must_use]
    pub fn signer(&self) -> Address {
        self.effective_broker().unwrap_or(self.owner)
    }

    /// The broker, unless it is absent or the owner itself.
    #[must_use]
    pub fn effective_broker(&self) -> Option<Address> {
        self.broker.filter(|broker| *broker != self.owner)
    }

    /// Peer-to-peer fee mode: percentages of traded tokens, no cash fee.
    #[must_use]
    pub fn is_p2p(&self) -> bool {
        self.waive_fee_percentage != 0
    }

    /// The cash fee may be paid out of the bought tokens instead of the
    /// owner's fee-token balance.
    #[must_use]
    pub fn can_pay_fee_in_token_b(&self) -> bool {
        !self.is_p2p()
            && self.fee_token == self.token_b
            && self.owner == self.token_recipient
            && self.fee_amount <= self.amount_b
    }

    /// Amount of `token_s` still unfilled given the cumulative `filled`.
    #[must_use]
    pub fn remaining(&self, filled: Amount) -> Amount {
        self.amount_s.saturating_sub(filled)
    }

    /// `true` if the order has expired at `timestamp`.
    #[must_use]
    pub fn is_expired_at(&self, timestamp: u64) -> bool {
        self.valid_until != 0 && timestamp >= self.valid_until
    }
}

fn hash_optional_address(hasher: &mut Sha256, address: Option<&Address>) {
    match address {
        Some(address) => {
            hasher.update([1u8]);
            hasher.update(address);
        }
        None => hasher.update([0u8]),
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    /// Attach the owner's (or broker's) signature over the order hash.
    #[must_use]
    pub fn signed_by(
        mut self,
        account: &crate::TestAccount,
        algorithm: crate::SignAlgorithm,
    ) -> Self {
        self.sig = Some(account.sign(algorithm, self.hash().as_bytes()));
        self
    }
}
