//! # ringsettle-settlement
//!
//! **Finality Plane**: transfer planning, ledger execution, the settlement
//! oracle and report verification.
//!
//! ## Architecture
//!
//! The [`SettlementOracle`] takes a decoded [`Submission`] and an immutable
//! [`LedgerSnapshot`] and:
//! 1. Seals the submission (bounds, hashes, miner authorization)
//! 2. Validates every order once against the pre-submission state
//! 3. Sizes each ring with MatchCore, net of balances reserved by earlier members
//! 4. Plans the ring's token movements and runs partitioned pre-checks
//! 5. Executes the movements on a private copy of the ledger
//! 6. Emits a [`SimulatorReport`]
//!
//! ## Checking a report
//!
//! - [`determinism`]: SHA-256 report root for replay comparison
//! - [`SupplyConservation`]: supply, fee-ledger and fill invariants
//! - [`verification`]: field-for-field comparison with an observed outcome
//!
//! [`Submission`]: ringsettle_types::Submission
//! [`SimulatorReport`]: ringsettle_types::SimulatorReport

pub mod capability;
pub mod determinism;
pub mod ledger;
pub mod oracle;
pub mod payments;
pub mod planner;
pub mod supply_conservation;
pub mod verification;

pub use capability::{Fungible, Partitioned, TransferCapability, capability_for};
pub use determinism::{check_report_root, compute_report_root, verify_report_root};
pub use ledger::{InterceptorBehavior, LedgerSnapshot};
pub use oracle::SettlementOracle;
pub use planner::TransferPlanner;
pub use supply_conservation::SupplyConservation;
pub use verification::{Discrepancy, ObservedOutcome, compare, verify_outcome};
