//! Ring members in, participations out.

use ringsettle_types::{Amount, Fill, Order, OrderHash};

/// One order as it enters ring matching.
///
/// `spendable_s` and `spendable_fee` are already net of what earlier members
/// of the same ring reserved from the same balance slot.
#[derive(Debug, Clone, Copy)]
pub struct RingMember<'a> {
    pub order: &'a Order,
    pub hash: OrderHash,
    /// Cumulative `token_s` filled before this ring.
    pub filled: Amount,
    pub spendable_s: Amount,
    pub spendable_fee: Amount,
}

impl<'a> RingMember<'a> {
    #[must_use]
    pub fn new(order: &'a Order, filled: Amount, spendable_s: Amount, spendable_fee: Amount) -> Self {
        Self {
            order,
            hash: order.hash(),
            filled,
            spendable_s,
            spendable_fee,
        }
    }
}

/// How much one member trades in a ring and what it pays in fees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participation {
    pub order_hash: OrderHash,
    /// `token_s` leaving the owner towards the downstream receiver, split included.
    pub fill_s: Amount,
    /// `token_b` arriving from the upstream member, its margin included.
    pub fill_b: Amount,
    /// Part of `fill_s` above what the downstream member asked for.
    pub split: Amount,
    /// Cash fee in the order's fee token.
    pub fee_amount: Amount,
    /// Fee taken in `token_s` on top of `fill_s`.
    pub fee_amount_s: Amount,
    /// Fee withheld from the incoming `token_b`.
    pub fee_amount_b: Amount,
}

impl Participation {
    pub(crate) fn sized(order_hash: OrderHash, fill_s: Amount, fill_b: Amount) -> Self {
        Self {
            order_hash,
            fill_s,
            fill_b,
            split: Amount::ZERO,
            fee_amount: Amount::ZERO,
            fee_amount_s: Amount::ZERO,
            fee_amount_b: Amount::ZERO,
        }
    }

    /// `token_s` sold at the order's own rate, without the split.
    #[must_use]
    pub fn traded_s(&self) -> Amount {
        self.fill_s.saturating_sub(self.split)
    }

    /// The `Fill` record of a mined ring event.
    #[must_use]
    pub fn to_fill(&self, order: &Order) -> Fill {
        Fill {
            order_hash: self.order_hash,
            owner: order.owner,
            token_s: order.token_s,
            amount_s: self.traded_s(),
            amount_b: self.fill_b,
            split: self.split,
            fee_amount: self.fee_amount,
            fee_amount_s: self.fee_amount_s,
            fee_amount_b: self.fee_amount_b,
        }
    }
}
