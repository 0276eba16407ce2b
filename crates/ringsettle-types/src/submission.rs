//! Submissions: the unit of settlement.
//!
//! A [`Submission`] carries a flat order array and rings that index into
//! it. Fee recipient and miner are optional on the wire and resolve against
//! the transaction origin: the fee recipient defaults to the submitter, the
//! miner defaults to the fee recipient.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::MINING_HASH_DOMAIN;
use crate::{Address, MiningHash, Order, OrderHash, Ring, RingHash, RingsettleError, Signature};

/// A batch of rings submitted for settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub fee_recipient: Option<Address>,
    pub miner: Option<Address>,
    /// Miner's signature over the mining hash.
    pub sig: Option<Signature>,
    pub orders: Vec<Order>,
    pub rings: Vec<Ring>,
}

impl Submission {
    #[must_use]
    pub fn new(orders: Vec<Order>, rings: Vec<Ring>) -> Self {
        Self {
            orders,
            rings,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn resolved_fee_recipient(&self, transaction_origin: Address) -> Address {
        self.fee_recipient.unwrap_or(transaction_origin)
    }

    #[must_use]
    pub fn resolved_miner(&self, transaction_origin: Address) -> Address {
        self.miner
            .unwrap_or_else(|| self.resolved_fee_recipient(transaction_origin))
    }

    #[must_use]
    pub fn order_hashes(&self) -> Vec<OrderHash> {
        self.orders.iter().map(Order::hash).collect()
    }

    /// Every ring index must point into the order array.
    pub fn check_bounds(&self) -> Result<(), RingsettleError> {
        self.rings
            .iter()
            .try_for_each(|ring| ring.check_bounds(self.orders.len()))
    }

    pub fn ring_hashes(&self, order_hashes: &[OrderHash]) -> Result<Vec<RingHash>, RingsettleError> {
        self.rings
            .iter()
            .map(|ring| ring.hash(order_hashes))
            .collect()
    }

    /// Commitment to the resolved fee recipient, resolved miner and every
    /// ring, signed by the miner and by dual-authorization keys.
    pub fn mining_hash(
        &self,
        transaction_origin: Address,
        order_hashes: &[OrderHash],
    ) -> Result<MiningHash, RingsettleError> {
        let mut hasher = Sha256::new();
        hasher.update(MINING_HASH_DOMAIN);
        hasher.update(self.resolved_fee_recipient(transaction_origin));
        hasher.update(self.resolved_miner(transaction_origin));
        for ring_hash in self.ring_hashes(order_hashes)? {
            hasher.update(ring_hash.as_bytes());
        }
        Ok(MiningHash::from_bytes(hasher.finalize().into()))
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Submission {
    /// Designate `miner` and attach its signature over the mining hash.
    #[must_use]
    pub fn mined_by(
        mut self,
        miner: &crate::TestAccount,
        algorithm: crate::SignAlgorithm,
        transaction_origin: Address,
    ) -> Self {
        self.miner = Some(miner.address);
        let hashes = self.order_hashes();
        if let Ok(mining_hash) = self.mining_hash(transaction_origin, &hashes) {
            self.sig = Some(miner.sign(algorithm, mining_hash.as_bytes()));
        }
        self
    }

    /// Attach the dual-authorization signature of order `index`.
    #[must_use]
    pub fn dual_authorized(
        mut self,
        index: usize,
        dual_auth: &crate::TestAccount,
        transaction_origin: Address,
    ) -> Self {
        let hashes = self.order_hashes();
        if let Ok(mining_hash) = self.mining_hash(transaction_origin, &hashes) {
            self.orders[index].dual_auth_sig =
                Some(dual_auth.sign(crate::SignAlgorithm::Ethereum, mining_hash.as_bytes()));
        }
        self
    }
}
