//! Transfer planning.
//!
//! Turns the participations of a sized ring into the token movements that
//! settle it. For member `p` and its downstream receiver `q`:
//!
//! ```text
//! token_s(p)   p.owner → q.token_recipient   fill_s(p) − fee_amount_b(q)
//! token_s(p)   p.owner → fee holder          fee_amount_b(q)
//! token_s(p)   p.owner → fee holder          fee_amount_s(p)
//! fee_token(p) p.owner → fee holder          fee_amount(p)
//! ```
//!
//! Movements along the same route are merged in first-seen order; zero
//! amounts and moves into the same balance slot are dropped.

use ringsettle_matchcore::Participation;
use ringsettle_types::amount::checked_add;
use ringsettle_types::{
    Address, Amount, Context, Order, RingFailure, TokenLedger, TokenType, Tranche, TransferItem,
};

use crate::capability::capability_for;

/// Plans the transfers of one ring.
pub struct TransferPlanner<'a> {
    context: &'a Context,
}

impl<'a> TransferPlanner<'a> {
    #[must_use]
    pub fn new(context: &'a Context) -> Self {
        Self { context }
    }

    /// Aggregated transfers for `orders` (in ring order) and their participations.
    pub fn plan(
        &self,
        orders: &[&Order],
        parts: &[Participation],
    ) -> Result<Vec<TransferItem>, RingFailure> {
        let n = orders.len();
        let fee_holder = self.context.fee_holder;
        let mut items = Vec::new();

        for i in 0..n {
            let j = (i + n - 1) % n;
            let (p, part) = (orders[i], &parts[i]);
            let (q, downstream) = (orders[j], &parts[j]);

            let to_buyer = part.fill_s.saturating_sub(downstream.fee_amount_b);
            push(&mut items, sell_leg(p, q.token_recipient, q.tranche_b, to_buyer))?;
            // Fees land in the fee holder's default tranche whatever tranche they leave.
            push(&mut items, sell_leg(p, fee_holder, Tranche::DEFAULT, downstream.fee_amount_b))?;
            push(&mut items, sell_leg(p, fee_holder, Tranche::DEFAULT, part.fee_amount_s))?;
            push(
                &mut items,
                TransferItem {
                    token: p.fee_token,
                    token_type: p.token_type_fee,
                    from: p.owner,
                    to: fee_holder,
                    amount: part.fee_amount,
                    from_tranche: Tranche::DEFAULT,
                    to_tranche: Tranche::DEFAULT,
                    data: Vec::new(),
                },
            )?;
        }
        Ok(items)
    }

    /// Ask every partitioned token whether the planned sends may happen.
    pub fn pre_check(&self, items: &[TransferItem], ledger: &dyn TokenLedger) -> Result<(), RingFailure> {
        for item in items {
            capability_for(item.token_type).pre_check(ledger, item, &self.context.trade_delegate)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn fee_holder(&self) -> Address {
        self.context.fee_holder
    }
}

/// A movement of `order.token_s` out of the owner's sell tranche.
fn sell_leg(order: &Order, to: Address, to_tranche: Tranche, amount: Amount) -> TransferItem {
    let partitioned = order.token_type_s == TokenType::Partitioned;
    TransferItem {
        token: order.token_s,
        token_type: order.token_type_s,
        from: order.owner,
        to,
        amount,
        from_tranche: if partitioned { order.tranche_s } else { Tranche::DEFAULT },
        to_tranche: if partitioned { to_tranche } else { Tranche::DEFAULT },
        data: if partitioned {
            order.transfer_data_s.clone()
        } else {
            Vec::new()
        },
    }
}

fn push(items: &mut Vec<TransferItem>, item: TransferItem) -> Result<(), RingFailure> {
    if item.amount.is_zero() || item.is_self_transfer() {
        return Ok(());
    }
    if let Some(existing) = items.iter_mut().find(|existing| existing.same_route(&item)) {
        existing.amount =
            checked_add(existing.amount, item.amount).map_err(|_| RingFailure::ArithmeticOverflow)?;
    } else {
        items.push(item);
    }
    Ok(())
}
