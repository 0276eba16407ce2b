//! # ringsettle-ingress
//!
//! **Admission plane**: everything that decides whether a submission and its
//! orders may enter ring matching at all.
//!
//! ## Architecture
//!
//! 1. **WireCodec**: decodes the compact binary submission format
//! 2. **SubmissionSealer**: bounds-checks rings, computes order / ring /
//!    mining hashes and authorizes the miner (fatal on failure)
//! 3. **OrderValidator**: per-order authenticity, validity window,
//!    cancellation, broker and dual-authorization checks
//!
//! ## Flow
//!
//! ```text
//! bytes → WireCodec.decode() → SubmissionSealer.seal() → SealedSubmission
//!       → OrderValidator.validate() per order → ValidationOutcome → MatchCore
//! ```
//!
//! Seal failures revert the whole submission. Validation failures only
//! invalidate the order, and with it every ring that references it.

pub mod codec;
pub mod sealer;
pub mod validator;

#[cfg(test)]
mod test_support;

pub use codec::WireCodec;
pub use sealer::{MiningAuthorization, SealedSubmission, SubmissionSealer};
pub use validator::OrderValidator;
