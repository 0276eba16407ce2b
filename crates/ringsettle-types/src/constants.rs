//! System-wide constants for RingSettle.
//!
//! These are compile-time defaults. Runtime-configurable values live in
//! [`ProtocolConfig`](crate::ProtocolConfig).

// ---------------------------------------------------------------------------
// Fees and burning
// ---------------------------------------------------------------------------

/// Denominator for peer-to-peer fee percentages and waive percentages.
pub const FEE_PERCENTAGE_BASE: u16 = 1000;

/// Denominator for burn rates and rebate rates.
pub const BURN_BASE_PERCENTAGE: u16 = 1000;

/// Denominator for the wallet's share of the net fee.
pub const WALLET_SPLIT_PERCENTAGE_BASE: u8 = 100;

// ---------------------------------------------------------------------------
// Rings and submissions
// ---------------------------------------------------------------------------

/// A ring needs at least two orders to close a cycle.
pub const MIN_RING_SIZE: usize = 2;

/// Maximum number of orders in a single ring.
pub const MAX_RING_SIZE: usize = 8;

/// Maximum orders per submission (the wire format counts them in a `u16`).
pub const MAX_ORDERS_PER_SUBMISSION: usize = u16::MAX as usize;

/// Maximum rings per submission (the wire format counts them in a `u16`).
pub const MAX_RINGS_PER_SUBMISSION: usize = u16::MAX as usize;

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Current wire format version.
pub const WIRE_FORMAT_VERSION: u16 = 0;

/// Maximum byte length of an encoded amount (256 bits).
pub const MAX_AMOUNT_BYTES: usize = 32;

/// Maximum byte length of partitioned-transfer data attached to an order.
pub const MAX_TRANSFER_DATA_BYTES: usize = u16::MAX as usize;

// ---------------------------------------------------------------------------
// Hash domains
// ---------------------------------------------------------------------------

pub const ORDER_HASH_DOMAIN: &[u8] = b"ringsettle:order:v1:";
pub const RING_HASH_DOMAIN: &[u8] = b"ringsettle:ring:v1:";
pub const MINING_HASH_DOMAIN: &[u8] = b"ringsettle:mining:v1:";
pub const REPORT_ROOT_DOMAIN: &[u8] = b"ringsettle:report_root:v1:";

/// Prefix of the personal-message signature scheme.
pub const ETHEREUM_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Prefix of the typed-data signature scheme (followed by the domain separator).
pub const EIP712_PREFIX: &[u8] = b"\x19\x01";

/// Seed of the typed-data domain separator.
pub const EIP712_DOMAIN: &[u8] = b"ringsettle:eip712:domain:v1:RingSubmitter";
