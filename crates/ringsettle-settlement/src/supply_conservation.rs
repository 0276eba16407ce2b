//! Supply conservation invariant checker.
//!
//! Invariants enforced on every settlement report:
//! ```text
//! ∀ token: Σ balances_after(token)       == Σ balances_before(token)
//! ∀ token: Δ Σ fee_balances(token)       == Σ transfers of token into the fee holder
//! ∀ order: filled_before ≤ filled_after  ≤ amount_s
//! ∀ all-or-none order: filled_after ∈ { filled_before, amount_s }
//! ```
//!
//! Settlement only moves tokens between holders. If any of these breaks,
//! the report must not be trusted.

use std::collections::BTreeSet;

use ringsettle_types::amount::{checked_add, checked_sub};
use ringsettle_types::{Address, Amount, Result, RingsettleError, SimulatorReport, Submission};

/// Checks settlement reports produced for one fee holder.
pub struct SupplyConservation {
    fee_holder: Address,
}

impl SupplyConservation {
    #[must_use]
    pub fn new(fee_holder: Address) -> Self {
        Self { fee_holder }
    }

    /// Run every check against `report`, which settled `submission`.
    ///
    /// # Errors
    /// [`RingsettleError::SupplyInvariantViolation`] for balance problems,
    /// [`RingsettleError::FillInvariantViolation`] for filled-amount problems.
    pub fn verify(&self, submission: &Submission, report: &SimulatorReport) -> Result<()> {
        if report.reverted {
            return Self::verify_untouched(report);
        }
        Self::verify_trade_supply(report)?;
        self.verify_fee_ledger(report)?;
        Self::verify_fills(submission, report)
    }

    /// A reverted submission leaves every book as it found it.
    pub fn verify_untouched(report: &SimulatorReport) -> Result<()> {
        if report.balances_after != report.balances_before
            || report.fee_balances_after != report.fee_balances_before
        {
            return Err(RingsettleError::SupplyInvariantViolation {
                reason: "reverted submission changed balances".into(),
            });
        }
        if report.filled_amounts_after != report.filled_amounts_before {
            return Err(RingsettleError::FillInvariantViolation {
                reason: "reverted submission changed filled amounts".into(),
            });
        }
        Ok(())
    }

    /// Per-token totals of the trade ledger are unchanged.
    pub fn verify_trade_supply(report: &SimulatorReport) -> Result<()> {
        let tokens: BTreeSet<Address> = report
            .balances_before
            .tokens()
            .into_iter()
            .chain(report.balances_after.tokens())
            .collect();
        for token in tokens {
            let before = report.balances_before.total_of(&token)?;
            let after = report.balances_after.total_of(&token)?;
            if before != after {
                return Err(RingsettleError::SupplyInvariantViolation {
                    reason: format!("token {token}: supply {before} became {after}"),
                });
            }
        }
        Ok(())
    }

    /// Fee-ledger growth per token equals what was transferred to the fee holder.
    pub fn verify_fee_ledger(&self, report: &SimulatorReport) -> Result<()> {
        let tokens: BTreeSet<Address> = report
            .fee_balances_before
            .tokens()
            .into_iter()
            .chain(report.fee_balances_after.tokens())
            .chain(report.transfer_items.iter().map(|item| item.token))
            .collect();
        for token in tokens {
            let before = report.fee_balances_before.total_of(&token)?;
            let after = report.fee_balances_after.total_of(&token)?;
            let growth = checked_sub(after, before).map_err(|_| {
                RingsettleError::SupplyInvariantViolation {
                    reason: format!("token {token}: fee ledger shrank from {before} to {after}"),
                }
            })?;
            let received = report
                .transfer_items
                .iter()
                .filter(|item| item.token == token && item.to == self.fee_holder)
                .try_fold(Amount::ZERO, |total, item| checked_add(total, item.amount))?;
            if growth != received {
                return Err(RingsettleError::SupplyInvariantViolation {
                    reason: format!(
                        "token {token}: fee ledger grew by {growth} but fee holder received {received}"
                    ),
                });
            }
        }
        Ok(())
    }

    /// Filled amounts only grow, stay within the order size, and respect all-or-none.
    pub fn verify_fills(submission: &Submission, report: &SimulatorReport) -> Result<()> {
        for (order, hash) in submission.orders.iter().zip(submission.order_hashes()) {
            let before = report.filled_before(&hash);
            let after = report.filled_after(&hash);
            if after < before {
                return Err(RingsettleError::FillInvariantViolation {
                    reason: format!("order {}: filled went from {before} down to {after}", hash.short()),
                });
            }
            if after > order.amount_s.max(before) {
                return Err(RingsettleError::FillInvariantViolation {
                    reason: format!(
                        "order {}: filled {after} exceeds amount_s {}",
                        hash.short(),
                        order.amount_s
                    ),
                });
            }
            if order.all_or_none && after != before && after != order.amount_s {
                return Err(RingsettleError::FillInvariantViolation {
                    reason: format!(
                        "order {}: all-or-none order partially filled to {after}",
                        hash.short()
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ringsettle_types::{BalanceKey, Order, Ring, TokenType, Tranche, TransferItem};

    use super::*;

    const FEE_HOLDER: u8 = 0xfe;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn amt(n: u64) -> Amount {
        Amount::from(n)
    }

    fn to_fee_holder(token: u8, amount: u64) -> TransferItem {
        TransferItem {
            token: addr(token),
            token_type: TokenType::Fungible,
            from: addr(0xa0),
            to: addr(FEE_HOLDER),
            amount: amt(amount),
            from_tranche: Tranche::DEFAULT,
            to_tranche: Tranche::DEFAULT,
            data: Vec::new(),
        }
    }

    fn moved() -> SimulatorReport {
        let mut report = SimulatorReport::default();
        report.balances_before.set(BalanceKey::fungible(addr(0xa0), addr(1)), amt(100));
        report.balances_after.set(BalanceKey::fungible(addr(0xa0), addr(1)), amt(40));
        report.balances_after.set(BalanceKey::fungible(addr(0xa1), addr(1)), amt(55));
        report.balances_after.set(BalanceKey::fungible(addr(FEE_HOLDER), addr(1)), amt(5));
        report.transfer_items.push(to_fee_holder(1, 5));
        report.fee_balances_after.set(BalanceKey::fungible(addr(0x0f), addr(1)), amt(3));
        report.fee_balances_after.set(BalanceKey::fungible(addr(FEE_HOLDER), addr(1)), amt(2));
        report
    }

    fn one_order(all_or_none: bool) -> (Submission, Order) {
        let mut order = Order::new(addr(0xa0), addr(1), addr(2), amt(100), amt(10), addr(0x1c));
        order.all_or_none = all_or_none;
        let other = Order::new(addr(0xa1), addr(2), addr(1), amt(10), amt(100), addr(0x1c));
        (
            Submission::new(vec![order.clone(), other], vec![Ring::new(vec![0, 1])]),
            order,
        )
    }

    #[test]
    fn empty_report_conserves() {
        let checker = SupplyConservation::new(addr(FEE_HOLDER));
        let (submission, _) = one_order(false);
        assert!(checker.verify(&submission, &SimulatorReport::default()).is_ok());
    }

    #[test]
    fn moving_tokens_conserves_supply() {
        assert!(SupplyConservation::verify_trade_supply(&moved()).is_ok());
    }

    #[test]
    fn minted_tokens_are_caught() {
        let mut report = moved();
        report.balances_after.set(BalanceKey::fungible(addr(0xa2), addr(1)), amt(1));
        let err = SupplyConservation::verify_trade_supply(&report).unwrap_err();
        assert!(matches!(err, RingsettleError::SupplyInvariantViolation { .. }));
    }

    #[test]
    fn fee_ledger_tracks_fee_holder_inflow() {
        let checker = SupplyConservation::new(addr(FEE_HOLDER));
        assert!(checker.verify_fee_ledger(&moved()).is_ok());

        let mut report = moved();
        report.fee_balances_after.set(BalanceKey::fungible(addr(0x0f), addr(1)), amt(4));
        assert!(checker.verify_fee_ledger(&report).is_err());
    }

    #[test]
    fn fills_must_not_shrink_or_overflow() {
        let (submission, order) = one_order(false);
        let mut report = SimulatorReport::default();
        report.filled_amounts_before.insert(order.hash(), amt(30));
        report.filled_amounts_after.insert(order.hash(), amt(20));
        assert!(SupplyConservation::verify_fills(&submission, &report).is_err());

        report.filled_amounts_after.insert(order.hash(), amt(101));
        assert!(SupplyConservation::verify_fills(&submission, &report).is_err());

        report.filled_amounts_after.insert(order.hash(), amt(100));
        assert!(SupplyConservation::verify_fills(&submission, &report).is_ok());
    }

    #[test]
    fn all_or_none_is_full_or_nothing() {
        let (submission, order) = one_order(true);
        let mut report = SimulatorReport::default();
        report.filled_amounts_after.insert(order.hash(), amt(50));
        let err = SupplyConservation::verify_fills(&submission, &report).unwrap_err();
        assert!(matches!(err, RingsettleError::FillInvariantViolation { .. }));

        report.filled_amounts_after.insert(order.hash(), amt(100));
        assert!(SupplyConservation::verify_fills(&submission, &report).is_ok());
    }

    #[test]
    fn reverted_report_must_be_untouched() {
        let checker = SupplyConservation::new(addr(FEE_HOLDER));
        let (submission, _) = one_order(false);
        let mut report = moved();
        report.reverted = true;
        assert!(checker.verify(&submission, &report).is_err());
        report.balances_after = report.balances_before.clone();
        report.fee_balances_after = report.fee_balances_before.clone();
        assert!(checker.verify(&submission, &report).is_ok());
    }
}
