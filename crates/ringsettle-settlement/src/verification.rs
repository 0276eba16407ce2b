//! Field-for-field comparison of a simulated report with what the
//! authoritative environment actually did.
//!
//! Transfers are compared as multisets: both sides are sorted by
//! `(token, from, to, amount)` first, since the environment may emit them
//! in a different order than the planner.

use std::collections::BTreeSet;
use std::fmt;

use ringsettle_types::{
    Amount, BalanceBook, InvalidRingEvent, OrderHash, Result, RingMinedEvent, RingsettleError,
    SimulatorReport, TransferItem,
};
use serde::{Deserialize, Serialize};

/// Outcome of a submission as observed on the authoritative environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedOutcome {
    pub reverted: bool,
    pub revert_reason: Option<String>,
    pub transfer_items: Vec<TransferItem>,
    pub balances_after: BalanceBook,
    pub fee_balances_after: BalanceBook,
    pub filled_amounts_after: Vec<(OrderHash, Amount)>,
    pub ring_mined_events: Vec<RingMinedEvent>,
    pub invalid_ring_events: Vec<InvalidRingEvent>,
    pub ring_index_after: u64,
}

impl ObservedOutcome {
    /// The outcome a faithful environment would report for `report`.
    #[must_use]
    pub fn from_report(report: &SimulatorReport) -> Self {
        Self {
            reverted: report.reverted,
            revert_reason: report.revert_reason.clone(),
            transfer_items: report.transfer_items.clone(),
            balances_after: report.balances_after.clone(),
            fee_balances_after: report.fee_balances_after.clone(),
            filled_amounts_after: report
                .filled_amounts_after
                .iter()
                .map(|(hash, amount)| (*hash, *amount))
                .collect(),
            ring_mined_events: report.ring_mined_events.clone(),
            invalid_ring_events: report.invalid_ring_events.clone(),
            ring_index_after: report.ring_index_after,
        }
    }
}

/// One field on which the report and the observation disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub field: &'static str,
    pub detail: String,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.detail)
    }
}

/// Every disagreement between `report` and `observed`.
#[must_use]
pub fn compare(report: &SimulatorReport, observed: &ObservedOutcome) -> Vec<Discrepancy> {
    let mut found = Vec::new();
    let mut differ = |field: &'static str, detail: String| found.push(Discrepancy { field, detail });

    if report.reverted != observed.reverted {
        differ(
            "reverted",
            format!("simulated {}, observed {}", report.reverted, observed.reverted),
        );
    }
    if report.revert_reason != observed.revert_reason {
        differ(
            "revert_reason",
            format!("simulated {:?}, observed {:?}", report.revert_reason, observed.revert_reason),
        );
    }

    let simulated = sorted_transfers(&report.transfer_items);
    let actual = sorted_transfers(&observed.transfer_items);
    if simulated.len() != actual.len() {
        differ(
            "transfer_items",
            format!("simulated {} transfers, observed {}", simulated.len(), actual.len()),
        );
    }
    for (index, (s, o)) in simulated.iter().zip(&actual).enumerate() {
        if s != o {
            differ(
                "transfer_items",
                format!(
                    "#{index}: simulated {} → {} {} of {}, observed {} → {} {} of {}",
                    s.from, s.to, s.amount, s.token, o.from, o.to, o.amount, o.token
                ),
            );
        }
    }

    compare_books("balances_after", &report.balances_after, &observed.balances_after, &mut differ);
    compare_books(
        "fee_balances_after",
        &report.fee_balances_after,
        &observed.fee_balances_after,
        &mut differ,
    );

    let hashes: BTreeSet<OrderHash> = report
        .filled_amounts_after
        .keys()
        .copied()
        .chain(observed.filled_amounts_after.iter().map(|(hash, _)| *hash))
        .collect();
    for hash in hashes {
        let simulated = report.filled_after(&hash);
        let actual = observed
            .filled_amounts_after
            .iter()
            .find(|(observed_hash, _)| *observed_hash == hash)
            .map_or(Amount::ZERO, |(_, amount)| *amount);
        if simulated != actual {
            differ(
                "filled_amounts_after",
                format!("order {}: simulated {simulated}, observed {actual}", hash.short()),
            );
        }
    }

    if report.ring_mined_events != observed.ring_mined_events {
        differ(
            "ring_mined_events",
            format!(
                "simulated {} mined rings, observed {}",
                report.ring_mined_events.len(),
                observed.ring_mined_events.len()
            ),
        );
    }
    if report.invalid_ring_events != observed.invalid_ring_events {
        differ(
            "invalid_ring_events",
            format!(
                "simulated {} invalid rings, observed {}",
                report.invalid_ring_events.len(),
                observed.invalid_ring_events.len()
            ),
        );
    }
    if report.ring_index_after != observed.ring_index_after {
        differ(
            "ring_index_after",
            format!(
                "simulated {}, observed {}",
                report.ring_index_after, observed.ring_index_after
            ),
        );
    }
    found
}

/// Like [`compare`], but fails with the number of discrepancies.
///
/// # Errors
/// [`RingsettleError::ReportMismatch`] if anything differs.
pub fn verify_outcome(report: &SimulatorReport, observed: &ObservedOutcome) -> Result<()> {
    let discrepancies = compare(report, observed);
    if discrepancies.is_empty() {
        return Ok(());
    }
    for discrepancy in &discrepancies {
        tracing::warn!(field = discrepancy.field, detail = %discrepancy.detail, "Report mismatch");
    }
    Err(RingsettleError::ReportMismatch {
        count: discrepancies.len(),
    })
}

fn sorted_transfers(items: &[TransferItem]) -> Vec<&TransferItem> {
    let mut sorted: Vec<&TransferItem> = items.iter().collect();
    sorted.sort_by(|a, b| {
        (a.token, a.from, a.to, a.amount, a.from_tranche, a.to_tranche, &a.data).cmp(&(
            b.token,
            b.from,
            b.to,
            b.amount,
            b.from_tranche,
            b.to_tranche,
            &b.data,
        ))
    });
    sorted
}

fn compare_books(
    field: &'static str,
    simulated: &BalanceBook,
    observed: &BalanceBook,
    differ: &mut impl FnMut(&'static str, String),
) {
    let keys: BTreeSet<_> = simulated
        .iter()
        .chain(observed.iter())
        .map(|(key, _)| *key)
        .collect();
    for key in keys {
        let (s, o) = (simulated.get(&key), observed.get(&key));
        if s != o {
            differ(
                field,
                format!("{} holds {s} of {} in simulation, {o} observed", key.owner, key.token),
            );
        }
    }
}
