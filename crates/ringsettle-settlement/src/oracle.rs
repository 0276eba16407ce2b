//! Settlement oracle.
//!
//! Predicts, without side effects, everything a submission does when it is
//! settled against a ledger snapshot:
//!
//! ```text
//! simulate(Submission, LedgerSnapshot) -> SimulatorReport
//! ```
//!
//! ## Pipeline
//!
//! 1. Seal: ring bounds, order limit, hashes, miner authorization (fatal)
//! 2. Validate every order once against the pre-submission state
//! 3. For each ring, strictly in listed order:
//!    - members valid, shape consistent, else the ring is voided
//!    - spendable amounts, net of what earlier members of the ring reserved
//!    - rate matching and gross fees
//!    - fee distribution, transfer planning, partitioned pre-checks
//!    - execution against the working ledger (fatal on failure)
//!    - fee-ledger credits and filled updates, visible to later rings
//! 4. Any fatal error reverts the whole submission: the report carries the
//!    reason, no events, no transfers, and after-books equal to before-books

use std::collections::BTreeMap;

use ringsettle_ingress::{OrderValidator, SealedSubmission, SubmissionSealer, WireCodec};
use ringsettle_matchcore::{FeeCalculator, FeeShares, Participation, RingMatcher, RingMember};
use ringsettle_types::amount::{fill_percentage, mul_div, percentage_of};
use ringsettle_types::{
    Amount, BalanceKey, Context, FilledLedger, Fill, InvalidRingEvent, Order, OrderHash,
    PaymentBreakdown, Result, Ring, RingFailure, RingHash, RingMinedEvent, RingPayments,
    RingsettleError, SimulatorReport, Submission, TokenType, Tranche, TransferItem,
    ValidationOutcome,
};

use crate::capability::{capability_for, check_supported};
use crate::determinism::compute_report_root;
use crate::ledger::LedgerSnapshot;
use crate::payments::{FeeParties, MemberPayments, ring_payments};
use crate::planner::TransferPlanner;

/// Settles submissions for one context.
pub struct SettlementOracle<'a> {
    context: &'a Context,
}

/// What a successful settlement produced.
struct Settlement {
    ledger: LedgerSnapshot,
    transfer_items: Vec<TransferItem>,
    ring_mined_events: Vec<RingMinedEvent>,
    invalid_ring_events: Vec<InvalidRingEvent>,
    payments: Vec<RingPayments>,
}

enum RingOutcome {
    Mined {
        items: Vec<TransferItem>,
        fills: Vec<Fill>,
        payments: RingPayments,
    },
    Voided(RingFailure),
}

/// Per-submission collaborators shared by every ring.
struct RingEngine<'s> {
    context: &'s Context,
    sealed: &'s SealedSubmission,
    outcomes: &'s [ValidationOutcome],
    matcher: RingMatcher,
    fees: FeeCalculator,
    planner: TransferPlanner<'s>,
}

impl<'a> SettlementOracle<'a> {
    #[must_use]
    pub fn new(context: &'a Context) -> Self {
        Self { context }
    }

    /// Settle `submission` against a private copy of `snapshot`.
    pub fn simulate(&self, submission: &Submission, snapshot: &LedgerSnapshot) -> SimulatorReport {
        let filled_before: BTreeMap<OrderHash, Amount> = submission
            .order_hashes()
            .into_iter()
            .map(|hash| (hash, snapshot.filled(&hash)))
            .collect();
        let report = match self.settle(submission, snapshot) {
            Ok(settlement) => SimulatorReport {
                reverted: false,
                revert_reason: None,
                transfer_items: settlement.transfer_items,
                balances_before: snapshot.balances().clone(),
                balances_after: settlement.ledger.balances().clone(),
                fee_balances_before: snapshot.fee_balances().clone(),
                fee_balances_after: settlement.ledger.fee_balances().clone(),
                filled_amounts_after: filled_before
                    .keys()
                    .map(|hash| (*hash, settlement.ledger.filled(hash)))
                    .collect(),
                filled_amounts_before: filled_before,
                ring_index_after: self.context.ring_index
                    + settlement.ring_mined_events.len() as u64,
                ring_mined_events: settlement.ring_mined_events,
                invalid_ring_events: settlement.invalid_ring_events,
                payments: PaymentBreakdown {
                    rings: settlement.payments,
                },
            },
            Err(err) => self.reverted(&err, snapshot, filled_before),
        };

        tracing::info!(
            rings = submission.rings.len(),
            mined = report.ring_mined_events.len(),
            invalid = report.invalid_ring_events.len(),
            transfers = report.transfer_items.len(),
            reverted = report.reverted,
            report_root = %hex::encode(compute_report_root(&report)),
            "Submission simulated"
        );
        report
    }

    /// Decode `bytes` with the wire codec, then [`simulate`](Self::simulate).
    ///
    /// A submission that cannot be decoded is reverted.
    pub fn simulate_encoded(&self, bytes: &[u8], snapshot: &LedgerSnapshot) -> SimulatorReport {
        match WireCodec::new(self.context.base_token).decode(bytes) {
            Ok(submission) => self.simulate(&submission, snapshot),
            Err(err) => {
                tracing::warn!(error = %err, len = bytes.len(), "Submission failed to decode");
                self.reverted(&err, snapshot, BTreeMap::new())
            }
        }
    }

    fn reverted(
        &self,
        err: &RingsettleError,
        snapshot: &LedgerSnapshot,
        filled_before: BTreeMap<OrderHash, Amount>,
    ) -> SimulatorReport {
        tracing::warn!(error = %err, reason = err.revert_reason(), "Submission reverted");
        SimulatorReport {
            reverted: true,
            revert_reason: Some(err.revert_reason().to_string()),
            transfer_items: Vec::new(),
            balances_before: snapshot.balances().clone(),
            balances_after: snapshot.balances().clone(),
            fee_balances_before: snapshot.fee_balances().clone(),
            fee_balances_after: snapshot.fee_balances().clone(),
            filled_amounts_after: filled_before.clone(),
            filled_amounts_before: filled_before,
            ring_mined_events: Vec::new(),
            invalid_ring_events: Vec::new(),
            payments: PaymentBreakdown::default(),
            ring_index_after: self.context.ring_index,
        }
    }

    fn settle(&self, submission: &Submission, snapshot: &LedgerSnapshot) -> Result<Settlement> {
        let sealed = SubmissionSealer::new(self.context).seal(submission)?;
        let validator = OrderValidator::new(self.context).with_mining_hash(sealed.mining_hash);
        let outcomes: Vec<ValidationOutcome> = submission
            .orders
            .iter()
            .map(|order| validator.validate(order, snapshot))
            .collect();

        let engine = RingEngine {
            context: self.context,
            sealed: &sealed,
            outcomes: &outcomes,
            matcher: RingMatcher::new(self.context.fee_percentage_base),
            fees: FeeCalculator::new(
                self.context.burn_base_percentage,
                self.context.fee_holder,
                sealed.miner,
            ),
            planner: TransferPlanner::new(self.context),
        };

        let mut settlement = Settlement {
            ledger: snapshot.clone(),
            transfer_items: Vec::new(),
            ring_mined_events: Vec::new(),
            invalid_ring_events: Vec::new(),
            payments: Vec::new(),
        };

        for (ring, ring_hash) in submission.rings.iter().zip(&sealed.ring_hashes) {
            match engine.settle_ring(submission, ring, *ring_hash, &mut settlement.ledger)? {
                RingOutcome::Mined {
                    items,
                    fills,
                    payments,
                } => {
                    let ring_index =
                        self.context.ring_index + settlement.ring_mined_events.len() as u64;
                    tracing::debug!(
                        ring = %ring_hash,
                        ring_index,
                        transfers = items.len(),
                        "Ring mined"
                    );
                    settlement.transfer_items.extend(items);
                    settlement.payments.push(payments);
                    settlement.ring_mined_events.push(RingMinedEvent {
                        ring_index,
                        ring_hash: *ring_hash,
                        fee_recipient: sealed.fee_recipient,
                        fills,
                    });
                }
                RingOutcome::Voided(reason) => {
                    tracing::warn!(ring = %ring_hash, reason = %reason, "Ring voided");
                    settlement.invalid_ring_events.push(InvalidRingEvent {
                        ring_hash: *ring_hash,
                        reason,
                    });
                }
            }
        }
        Ok(settlement)
    }
}

impl RingEngine<'_> {
    /// Settle one ring on `ledger`. `Err` only for fatal errors.
    fn settle_ring(
        &self,
        submission: &Submission,
        ring: &Ring,
        ring_hash: RingHash,
        ledger: &mut LedgerSnapshot,
    ) -> Result<RingOutcome> {
        for (position, &index) in ring.orders.iter().enumerate() {
            if let Some(rejection) = self.outcomes[index].rejection() {
                return Ok(RingOutcome::Voided(RingFailure::InvalidOrder {
                    position,
                    rejection,
                }));
            }
        }
        if let Err(failure) = ring.check_shape(&submission.orders, self.context.max_ring_size) {
            return Ok(RingOutcome::Voided(failure));
        }

        let orders: Vec<&Order> = ring
            .orders
            .iter()
            .map(|&index| &submission.orders[index])
            .collect();
        let hashes: Vec<OrderHash> = ring
            .orders
            .iter()
            .map(|&index| self.sealed.order_hashes[index])
            .collect();

        let members = self.members(&orders, &hashes, ledger)?;
        let parts = match self.matcher.match_ring(&members) {
            Ok(parts) => parts,
            Err(failure) => return Ok(RingOutcome::Voided(failure)),
        };

        let mut fee_shares = Vec::with_capacity(orders.len());
        for (order, part) in orders.iter().zip(&parts) {
            match self.distribute(order, part, ledger) {
                Ok(shares) => fee_shares.push(shares),
                Err(_) => return Ok(RingOutcome::Voided(RingFailure::ArithmeticOverflow)),
            }
        }

        let items = match self.planner.plan(&orders, &parts) {
            Ok(items) => items,
            Err(failure) => return Ok(RingOutcome::Voided(failure)),
        };
        if let Err(failure) = self.planner.pre_check(&items, ledger) {
            return Ok(RingOutcome::Voided(failure));
        }

        // Commit phase: from here on every failure is fatal.
        for item in &items {
            capability_for(item.token_type).execute(ledger, item, &self.context.trade_delegate)?;
        }
        for (order, shares) in orders.iter().zip(&fee_shares) {
            for share in shares {
                for (recipient, amount) in self.fees.credits(order, share) {
                    ledger.credit_fee(recipient, share.token, amount)?;
                }
            }
        }
        for (order, part) in orders.iter().zip(&parts) {
            ledger.add_filled(part.order_hash, part.fill_s)?;
            tracing::debug!(
                order = %part.order_hash,
                fill_s = %part.fill_s,
                split = %part.split,
                filled_pct = %fill_percentage(ledger.filled(&part.order_hash), order.amount_s),
                "Order filled"
            );
        }

        let n = orders.len();
        let fills = orders
            .iter()
            .zip(&parts)
            .map(|(order, part)| part.to_fill(order))
            .collect();
        let member_payments: Vec<MemberPayments<'_>> = (0..n)
            .map(|i| {
                let j = (i + n - 1) % n;
                MemberPayments {
                    order: orders[i],
                    participation: &parts[i],
                    downstream: orders[j],
                    downstream_participation: &parts[j],
                    fees: &fee_shares[i],
                }
            })
            .collect();
        let parties = FeeParties {
            fee_holder: self.context.fee_holder,
            miner: self.fees.miner(),
        };
        let payments = ring_payments(ring_hash, &member_payments, parties);

        Ok(RingOutcome::Mined {
            items,
            fills,
            payments,
        })
    }

    /// Ring members with spendable amounts.
    ///
    /// Members sharing a balance slot see it net of what earlier members
    /// may take, token_s fees of peer-to-peer members included. A token that does not implement its declared standard is
    /// fatal.
    fn members<'o>(
        &self,
        orders: &[&'o Order],
        hashes: &[OrderHash],
        ledger: &LedgerSnapshot,
    ) -> Result<Vec<RingMember<'o>>> {
        let delegate = self.context.trade_delegate;
        let mut reserved: BTreeMap<BalanceKey, Amount> = BTreeMap::new();
        let mut members = Vec::with_capacity(orders.len());

        for (&order, &hash) in orders.iter().zip(hashes) {
            check_supported(ledger, &order.token_s, order.token_type_s)?;
            let tranche_s = spend_tranche(order.token_type_s, order.tranche_s);
            let key_s = BalanceKey::new(order.owner, order.token_s, tranche_s);
            let spendable_s = capability_for(order.token_type_s)
                .spendable(ledger, &order.token_s, &order.owner, &tranche_s, &delegate)
                .saturating_sub(reserved_in(&reserved, &key_s));

            let needs_fee_balance = !order.is_p2p()
                && !order.fee_amount.is_zero()
                && !order.can_pay_fee_in_token_b();
            let mut key_fee = None;
            let spendable_fee = if needs_fee_balance {
                check_supported(ledger, &order.fee_token, order.token_type_fee)?;
                let key = BalanceKey::new(order.owner, order.fee_token, Tranche::DEFAULT);
                key_fee = Some(key);
                if key == key_s {
                    spendable_s
                } else {
                    capability_for(order.token_type_fee)
                        .spendable(ledger, &order.fee_token, &order.owner, &Tranche::DEFAULT, &delegate)
                        .saturating_sub(reserved_in(&reserved, &key))
                }
            } else {
                Amount::ZERO
            };

            let filled = ledger.filled(&hash);
            let reserve_s = order.remaining(filled).min(spendable_s);
            // A peer-to-peer member also pays its token_s fee out of this slot.
            let spent_s = if order.is_p2p() {
                let base = self.context.fee_percentage_base;
                percentage_of(reserve_s, order.token_s_fee_percentage, base)
                    .map_or(spendable_s, |fee| reserve_s.saturating_add(fee))
                    .min(spendable_s)
            } else {
                reserve_s
            };
            reserve(&mut reserved, key_s, spent_s);
            if let Some(key) = key_fee {
                let fee = mul_div(order.fee_amount, reserve_s, order.amount_s)
                    .unwrap_or(order.fee_amount);
                reserve(&mut reserved, key, fee);
            }

            members.push(RingMember {
                order,
                hash,
                filled,
                spendable_s,
                spendable_fee,
            });
        }
        Ok(members)
    }

    fn distribute(
        &self,
        order: &Order,
        part: &Participation,
        ledger: &LedgerSnapshot,
    ) -> Result<Vec<FeeShares>> {
        [
            (order.fee_token, part.fee_amount),
            (order.token_s, part.fee_amount_s),
            (order.token_b, part.fee_amount_b),
        ]
        .into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(token, amount)| self.fees.distribute(order, token, amount, ledger))
        .collect()
    }
}

fn spend_tranche(token_type: TokenType, tranche: Tranche) -> Tranche {
    match token_type {
        TokenType::Fungible => Tranche::DEFAULT,
        TokenType::Partitioned => tranche,
    }
}

fn reserved_in(reserved: &BTreeMap<BalanceKey, Amount>, key: &BalanceKey) -> Amount {
    reserved.get(key).copied().unwrap_or(Amount::ZERO)
}

fn reserve(reserved: &mut BTreeMap<BalanceKey, Amount>, key: BalanceKey, amount: Amount) {
    let slot = reserved.entry(key).or_insert(Amount::ZERO);
    *slot = slot.saturating_add(amount);
}
