//! Settlement events and the simulator report.
//!
//! The [`SimulatorReport`] is everything the oracle predicts a submission
//! will do: the transfers, before/after snapshots of both ledgers and of the
//! filled amounts, the emitted events and a per-ring/per-order payment
//! breakdown. It is comparable field-for-field with what the authoritative
//! environment observed.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, BalanceBook, OrderHash, RingFailure, RingHash, TransferItem};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// How one order participated in a mined ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub order_hash: OrderHash,
    pub owner: Address,
    pub token_s: Address,
    /// `token_s` sold at the order's own rate this round.
    pub amount_s: Amount,
    /// `token_b` received this round (before any `token_b` fee).
    pub amount_b: Amount,
    /// Surplus `token_s` paid above the downstream member's ask.
    pub split: Amount,
    pub fee_amount: Amount,
    pub fee_amount_s: Amount,
    pub fee_amount_b: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingMinedEvent {
    pub ring_index: u64,
    pub ring_hash: RingHash,
    pub fee_recipient: Address,
    pub fills: Vec<Fill>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRingEvent {
    pub ring_hash: RingHash,
    pub reason: RingFailure,
}

// ---------------------------------------------------------------------------
// Payment breakdown
// ---------------------------------------------------------------------------

/// A described token movement, optionally split into sub-payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedTokenTransfer {
    pub description: String,
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub sub_payments: Vec<DetailedTokenTransfer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayments {
    pub order_hash: Option<OrderHash>,
    pub payments: Vec<DetailedTokenTransfer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingPayments {
    pub ring_hash: Option<RingHash>,
    pub orders: Vec<OrderPayments>,
}

/// Hierarchical rings → orders → payments view of a settled submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    pub rings: Vec<RingPayments>,
}

impl PaymentBreakdown {
    /// Indented, human-readable rendering for audit logs.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (ring_number, ring) in self.rings.iter().enumerate() {
            let _ = writeln!(out, "Ring {ring_number}:");
            for (order_number, order) in ring.orders.iter().enumerate() {
                let _ = writeln!(out, "  Order {order_number}:");
                for payment in &order.payments {
                    render_payment(&mut out, payment, 2);
                }
            }
        }
        out
    }
}

fn render_payment(out: &mut String, payment: &DetailedTokenTransfer, depth: usize) {
    let _ = writeln!(out, "{:indent$}- {payment}", "", indent = depth * 2);
    for sub in &payment.sub_payments {
        render_payment(out, sub, depth + 1);
    }
}

impl fmt::Display for DetailedTokenTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} {} -> {}",
            self.description, self.amount, self.token, self.from, self.to
        )
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Predicted outcome of one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorReport {
    pub reverted: bool,
    pub revert_reason: Option<String>,
    pub transfer_items: Vec<TransferItem>,
    pub balances_before: BalanceBook,
    pub balances_after: BalanceBook,
    pub fee_balances_before: BalanceBook,
    pub fee_balances_after: BalanceBook,
    #[serde(with = "filled_entries")]
    pub filled_amounts_before: BTreeMap<OrderHash, Amount>,
    #[serde(with = "filled_entries")]
    pub filled_amounts_after: BTreeMap<OrderHash, Amount>,
    pub ring_mined_events: Vec<RingMinedEvent>,
    pub invalid_ring_events: Vec<InvalidRingEvent>,
    pub payments: PaymentBreakdown,
    /// Ring index the next submission starts from.
    pub ring_index_after: u64,
}

impl SimulatorReport {
    #[must_use]
    pub fn filled_before(&self, hash: &OrderHash) -> Amount {
        self.filled_amounts_before
            .get(hash)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    #[must_use]
    pub fn filled_after(&self, hash: &OrderHash) -> Amount {
        self.filled_amounts_after
            .get(hash)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// All fills of `hash` across the mined rings.
    pub fn fills_of<'a>(&'a self, hash: &'a OrderHash) -> impl Iterator<Item = &'a Fill> + 'a {
        self.ring_mined_events
            .iter()
            .flat_map(|event| event.fills.iter())
            .filter(move |fill| fill.order_hash == *hash)
    }
}

/// Serializes an `OrderHash`-keyed map as a list of pairs so that formats
/// restricted to string keys can carry it.
mod filled_entries {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::{Amount, OrderHash};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<OrderHash, Amount>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let entries: Vec<(&OrderHash, &Amount)> = map.iter().collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<OrderHash, Amount>, D::Error> {
        let entries: Vec<(OrderHash, Amount)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
