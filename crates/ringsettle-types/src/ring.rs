//! Rings: cyclic sequences of orders that trade with each other.
//!
//! ```text
//!   order[0] ──token_s──▶ order[n-1] ──token_s──▶ ... ──token_s──▶ order[1] ──token_s──▶ order[0]
//! ```
//!
//! Member `k` buys `token_b(k)`, which is `token_s(k+1)`: the next member
//! pays it, and member `k` in turn pays its own `token_s` to the previous
//! member. Members are indices into the submission's order array.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{MIN_RING_SIZE, RING_HASH_DOMAIN};
use crate::{Order, OrderHash, RingFailure, RingHash, RingsettleError};

/// A ring of order indices, in ring order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ring {
    pub orders: Vec<usize>,
}

impl Ring {
    #[must_use]
    pub fn new(orders: Vec<usize>) -> Self {
        Self { orders }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Position of the member that receives the `token_s` of `position`.
    #[must_use]
    pub fn previous(&self, position: usize) -> usize {
        (position + self.len() - 1) % self.len()
    }

    /// Position of the member that pays the `token_b` of `position`.
    #[must_use]
    pub fn next(&self, position: usize) -> usize {
        (position + 1) % self.len()
    }

    /// Every index must refer to an order of the submission.
    pub fn check_bounds(&self, order_count: usize) -> Result<(), RingsettleError> {
        match self.orders.iter().find(|&&index| index >= order_count) {
            Some(&index) => Err(RingsettleError::OrderIndexOutOfBounds {
                index,
                count: order_count,
            }),
            None => Ok(()),
        }
    }

    /// Hash of the member order hashes in ring order.
    ///
    /// Callers must have checked bounds first.
    pub fn hash(&self, order_hashes: &[OrderHash]) -> Result<RingHash, RingsettleError> {
        self.check_bounds(order_hashes.len())?;
        let mut hasher = Sha256::new();
        hasher.update(RING_HASH_DOMAIN);
        hasher.update((self.orders.len() as u64).to_le_bytes());
        for &index in &self.orders {
            hasher.update(order_hashes[index].as_bytes());
        }
        Ok(RingHash::from_bytes(hasher.finalize().into()))
    }

    /// Structural checks that do not need ledger state.
    ///
    /// Indices must already be in bounds (see [`Ring::check_bounds`]).
    pub fn check_shape(&self, orders: &[Order], max_ring_size: usize) -> Result<(), RingFailure> {
        if self.len() < MIN_RING_SIZE || self.len() > max_ring_size {
            return Err(RingFailure::InvalidRingSize);
        }
        let distinct: BTreeSet<usize> = self.orders.iter().copied().collect();
        if distinct.len() != self.len() {
            return Err(RingFailure::DuplicateOrder);
        }
        for position in 0..self.len() {
            let order = &orders[self.orders[position]];
            let next = &orders[self.orders[self.next(position)]];
            if order.token_b != next.token_s {
                return Err(RingFailure::TokenMismatch);
            }
            if order.token_type_b != next.token_type_s {
                return Err(RingFailure::TokenTypeMismatch);
            }
        }
        Ok(())
    }
}
