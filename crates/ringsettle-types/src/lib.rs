//! # ringsettle-types
//!
//! Shared types, errors, configuration and collaborator interfaces for the
//! **RingSettle** ring-based order settlement engine.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identities**: [`Address`], [`Amount`], [`OrderHash`], [`RingHash`], [`MiningHash`], [`Tranche`]
//! - **Order model**: [`Order`], [`TokenType`]
//! - **Rings and submissions**: [`Ring`], [`Submission`], [`Context`]
//! - **Signatures**: [`Signature`], [`SignAlgorithm`]
//! - **Outcomes**: [`ValidationOutcome`], [`OrderRejection`], [`RingFailure`]
//! - **Settlement output**: [`TransferItem`], [`BalanceBook`], [`SimulatorReport`], [`Fill`]
//! - **Collaborators**: [`ChainState`] and the registry / ledger traits it unites
//! - **Configuration**: [`ProtocolConfig`]
//! - **Errors**: [`RingsettleError`] with `RS_ERR_` prefix codes
//! - **Arithmetic**: checked [`amount`] helpers
//! - **Constants**: fee bases, ring limits, hash domains

pub mod amount;
pub mod balance;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod ids;
pub mod order;
pub mod outcome;
pub mod registry;
pub mod report;
pub mod ring;
pub mod signature;
pub mod submission;
pub mod token;
pub mod transfer;

// Re-export all primary types at crate root for ergonomic imports:
//   use ringsettle_types::{Order, Ring, Submission, SimulatorReport, ...};

pub use balance::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use ids::*;
pub use order::*;
pub use outcome::*;
pub use registry::*;
pub use report::*;
pub use ring::*;
pub use signature::*;
pub use submission::*;
pub use token::*;
pub use transfer::*;

// Constants and amount helpers are accessed via their modules
// (not re-exported to avoid name collisions).
