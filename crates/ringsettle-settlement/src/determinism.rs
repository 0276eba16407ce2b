//! Report root hashing for replay verification.
//!
//! Every settlement of the same submission against the same snapshot must
//! produce the exact same [`SimulatorReport`]. The report root is a SHA-256
//! over everything a settlement decides, so two runs can be compared without
//! shipping full reports around.

use ringsettle_types::constants::REPORT_ROOT_DOMAIN;
use ringsettle_types::{Amount, BalanceBook, Result, RingsettleError, SimulatorReport};
use sha2::{Digest, Sha256};

/// Compute the root hash of a report.
///
/// Covers, in order:
/// - revert flag and reason
/// - transfer items (in execution order)
/// - mined and invalid ring events
/// - trade and fee ledgers after settlement, filled amounts after settlement
/// - the next ring index
///
/// The before-snapshots are inputs, not decisions, and are left out.
#[must_use]
pub fn compute_report_root(report: &SimulatorReport) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(REPORT_ROOT_DOMAIN);
    hasher.update([u8::from(report.reverted)]);
    hash_str(&mut hasher, report.revert_reason.as_deref().unwrap_or(""));

    hasher.update((report.transfer_items.len() as u64).to_le_bytes());
    for item in &report.transfer_items {
        hasher.update(item.token);
        hasher.update([item.token_type.code()]);
        hasher.update(item.from);
        hasher.update(item.to);
        hash_amount(&mut hasher, item.amount);
        hasher.update(item.from_tranche.as_bytes());
        hasher.update(item.to_tranche.as_bytes());
        hasher.update((item.data.len() as u64).to_le_bytes());
        hasher.update(&item.data);
    }

    hasher.update((report.ring_mined_events.len() as u64).to_le_bytes());
    for event in &report.ring_mined_events {
        hasher.update(event.ring_index.to_le_bytes());
        hasher.update(event.ring_hash.as_bytes());
        hasher.update(event.fee_recipient);
        hasher.update((event.fills.len() as u64).to_le_bytes());
        for fill in &event.fills {
            hasher.update(fill.order_hash.as_bytes());
            hasher.update(fill.owner);
            hasher.update(fill.token_s);
            for amount in [
                fill.amount_s,
                fill.amount_b,
                fill.split,
                fill.fee_amount,
                fill.fee_amount_s,
                fill.fee_amount_b,
            ] {
                hash_amount(&mut hasher, amount);
            }
        }
    }

    hasher.update((report.invalid_ring_events.len() as u64).to_le_bytes());
    for event in &report.invalid_ring_events {
        hasher.update(event.ring_hash.as_bytes());
        hash_str(&mut hasher, &event.reason.to_string());
    }

    hash_book(&mut hasher, &report.balances_after);
    hash_book(&mut hasher, &report.fee_balances_after);
    hasher.update((report.filled_amounts_after.len() as u64).to_le_bytes());
    for (hash, amount) in &report.filled_amounts_after {
        hasher.update(hash.as_bytes());
        hash_amount(&mut hasher, *amount);
    }
    hasher.update(report.ring_index_after.to_le_bytes());

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Verify that a report hashes to `expected_root`.
#[must_use]
pub fn verify_report_root(report: &SimulatorReport, expected_root: &[u8; 32]) -> bool {
    compute_report_root(report) == *expected_root
}

/// Like [`verify_report_root`], but as an error carrying both roots.
pub fn check_report_root(report: &SimulatorReport, expected_root: &[u8; 32]) -> Result<()> {
    let actual = compute_report_root(report);
    if actual == *expected_root {
        Ok(())
    } else {
        Err(RingsettleError::DeterminismViolation {
            expected: hex::encode(expected_root),
            actual: hex::encode(actual),
        })
    }
}

fn hash_amount(hasher: &mut Sha256, amount: Amount) {
    hasher.update(amount.to_be_bytes::<32>());
}

fn hash_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn hash_book(hasher: &mut Sha256, book: &BalanceBook) {
    hasher.update((book.len() as u64).to_le_bytes());
    for (key, amount) in book.iter() {
        hasher.update(key.owner);
        hasher.update(key.token);
        hasher.update(key.tranche.as_bytes());
        hash_amount(hasher, *amount);
    }
}

#[cfg(test)]
mod tests {
    use ringsettle_types::{
        Address, BalanceKey, InvalidRingEvent, RingFailure, RingHash, TokenType, Tranche,
        TransferItem,
    };

    use super::*;

    fn item(from: u8, to: u8, amount: u64) -> TransferItem {
        TransferItem {
            token: Address::repeat_byte(1),
            token_type: TokenType::Fungible,
            from: Address::repeat_byte(from),
            to: Address::repeat_byte(to),
            amount: Amount::from(amount),
            from_tranche: Tranche::DEFAULT,
            to_tranche: Tranche::DEFAULT,
            data: Vec::new(),
        }
    }

    #[test]
    fn empty_report_deterministic() {
        let report = SimulatorReport::default();
        assert_eq!(compute_report_root(&report), compute_report_root(&report.clone()));
    }

    #[test]
    fn transfer_order_matters() {
        let a = SimulatorReport {
            transfer_items: vec![item(1, 2, 5), item(2, 1, 7)],
            ..SimulatorReport::default()
        };
        let b = SimulatorReport {
            transfer_items: vec![item(2, 1, 7), item(1, 2, 5)],
            ..SimulatorReport::default()
        };
        assert_ne!(compute_report_root(&a), compute_report_root(&b));
    }

    #[test]
    fn ledgers_after_are_covered() {
        let a = SimulatorReport::default();
        let mut b = SimulatorReport::default();
        b.balances_after.set(
            BalanceKey::fungible(Address::repeat_byte(1), Address::repeat_byte(2)),
            Amount::from(1u64),
        );
        assert_ne!(compute_report_root(&a), compute_report_root(&b));
    }

    #[test]
    fn before_snapshot_is_not_covered() {
        let a = SimulatorReport::default();
        let mut b = SimulatorReport::default();
        b.balances_before.set(
            BalanceKey::fungible(Address::repeat_byte(1), Address::repeat_byte(2)),
            Amount::from(1u64),
        );
        assert_eq!(compute_report_root(&a), compute_report_root(&b));
    }

    #[test]
    fn invalid_ring_reason_is_covered() {
        let event = |reason| SimulatorReport {
            invalid_ring_events: vec![InvalidRingEvent {
                ring_hash: RingHash::from_bytes([1; 32]),
                reason,
            }],
            ..SimulatorReport::default()
        };
        assert_ne!(
            compute_report_root(&event(RingFailure::ZeroFill)),
            compute_report_root(&event(RingFailure::UnmatchableRates))
        );
    }

    #[test]
    fn check_reports_both_roots() {
        let report = SimulatorReport::default();
        let root = compute_report_root(&report);
        assert!(verify_report_root(&report, &root));
        assert!(check_report_root(&report, &root).is_ok());

        let err = check_report_root(&report, &[0u8; 32]).unwrap_err();
        match err {
            RingsettleError::DeterminismViolation { expected, actual } => {
                assert_eq!(expected, "00".repeat(32));
                assert_eq!(actual, hex::encode(root));
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
