//! Identities used throughout RingSettle.
//!
//! Accounts and token contracts are 20-byte [`Address`]es. Orders, rings and
//! mining commitments are identified by 32-byte SHA-256 digests computed over
//! domain-prefixed canonical bytes, so the same logical object always hashes
//! to the same identity.

use std::fmt;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

pub use alloy_primitives::{Address, U256};

/// Token amounts are unsigned 256-bit integers.
pub type Amount = U256;

// ---------------------------------------------------------------------------
// OrderHash
// ---------------------------------------------------------------------------

/// Deterministic order identity and anti-replay key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderHash(pub B256);

impl OrderHash {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(B256::from(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// RingHash
// ---------------------------------------------------------------------------

/// Identity of a ring: the hash of its member order hashes in ring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RingHash(pub B256);

impl RingHash {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(B256::from(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0.0
    }
}

impl fmt::Display for RingHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ring:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// MiningHash
// ---------------------------------------------------------------------------

/// Commitment signed by the miner and by dual-authorization keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MiningHash(pub B256);

impl MiningHash {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(B256::from(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0.0
    }
}

impl fmt::Display for MiningHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mining:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Tranche
// ---------------------------------------------------------------------------

/// Partition identifier for partitioned tokens. The zero tranche is the
/// default partition and the only one fungible tokens use.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tranche(pub B256);

impl Tranche {
    pub const DEFAULT: Self = Self(B256::ZERO);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(B256::from(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0.0
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == B256::ZERO
    }
}

impl fmt::Display for Tranche {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "tranche:default")
        } else {
            write!(f, "tranche:{}", hex::encode(&self.0[..8]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_hash_display_is_prefixed() {
        let hash = OrderHash::from_bytes([0xab; 32]);
        assert_eq!(format!("{hash}"), "order:abababababababab");
        assert_eq!(hash.short(), "abababab");
    }

    #[test]
    fn default_tranche_is_zero() {
        assert!(Tranche::default().is_default());
        assert_eq!(Tranche::default(), Tranche::DEFAULT);
        assert!(!Tranche::from_bytes([1; 32]).is_default());
        assert_eq!(format!("{}", Tranche::DEFAULT), "tranche:default");
    }

    #[test]
    fn hashes_order_bytewise() {
        let low = RingHash::from_bytes([0x01; 32]);
        let high = RingHash::from_bytes([0x02; 32]);
        assert!(low < high);
    }

    #[test]
    fn order_hash_serde_roundtrip() {
        let hash = OrderHash::from_bytes([7; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        let back: OrderHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, back);
    }
}
