//! # ringsettle-matchcore
//!
//! **Pure deterministic ring matching for RingSettle.**
//!
//! MatchCore is the compute plane: given the members of one ring together
//! with what each can spend, it decides how much every member trades and
//! what fees it owes. It has:
//!
//! - **Zero side effects**: no ledger reads or writes, callers pass spendable amounts in
//! - **Integer-only arithmetic**: checked `U256` with floor division, no floats
//! - **Deterministic output**: same members in the same order give the same fills
//!
//! ```text
//! RingMember[] → RingMatcher.match_ring() → Participation[]
//! fee amount   → FeeCalculator.distribute() → FeeShares (rebate / burn / wallet / miner)
//! ```

pub mod fees;
pub mod participation;
pub mod ring_matcher;

pub use fees::{FeeCalculator, FeeShares, GrossFees, gross_fees};
pub use participation::{Participation, RingMember};
pub use ring_matcher::RingMatcher;
