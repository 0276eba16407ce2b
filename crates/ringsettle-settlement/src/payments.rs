//! Human-auditable payment breakdown of a mined ring.

use ringsettle_matchcore::{FeeShares, Participation};
use ringsettle_types::{
    Address, Amount, DetailedTokenTransfer, Order, OrderPayments, RingHash, RingPayments,
};

/// Who receives the shares of a fee.
#[derive(Debug, Clone, Copy)]
pub struct FeeParties {
    pub fee_holder: Address,
    pub miner: Address,
}

/// One ring member with everything it paid.
pub struct MemberPayments<'a> {
    pub order: &'a Order,
    pub participation: &'a Participation,
    pub downstream: &'a Order,
    pub downstream_participation: &'a Participation,
    pub fees: &'a [FeeShares],
}

#[must_use]
pub fn ring_payments(
    ring_hash: RingHash,
    members: &[MemberPayments<'_>],
    parties: FeeParties,
) -> RingPayments {
    RingPayments {
        ring_hash: Some(ring_hash),
        orders: members
            .iter()
            .map(|member| order_payments(member, parties))
            .collect(),
    }
}

fn order_payments(member: &MemberPayments<'_>, parties: FeeParties) -> OrderPayments {
    let order = member.order;
    let part = member.participation;
    let buyer_fee = member.downstream_participation.fee_amount_b;
    let trade = part
        .fill_s
        .saturating_sub(buyer_fee)
        .saturating_sub(part.split);

    let mut sell = transfer(
        "Sell",
        order.token_s,
        order.owner,
        member.downstream.token_recipient,
        part.fill_s,
    );
    sell.sub_payments = [
        transfer("Trade", order.token_s, order.owner, member.downstream.token_recipient, trade),
        transfer("Margin", order.token_s, order.owner, member.downstream.token_recipient, part.split),
        transfer("Buyer fee", order.token_s, order.owner, parties.fee_holder, buyer_fee),
    ]
    .into_iter()
    .filter(|payment| !payment.amount.is_zero())
    .collect();

    let mut payments = vec![sell];
    for shares in member.fees {
        let mut fee = transfer("Fee", shares.token, order.owner, parties.fee_holder, shares.total);
        let mut subs = vec![
            transfer("Rebate", shares.token, parties.fee_holder, order.owner, shares.rebate),
            transfer("Burn", shares.token, parties.fee_holder, parties.fee_holder, shares.burn),
        ];
        if let Some(wallet) = order.wallet_addr {
            subs.push(transfer("Wallet", shares.token, parties.fee_holder, wallet, shares.wallet));
        }
        subs.push(transfer("Miner", shares.token, parties.fee_holder, parties.miner, shares.miner));
        subs.retain(|payment| !payment.amount.is_zero());
        fee.sub_payments = subs;
        payments.push(fee);
    }

    OrderPayments {
        order_hash: Some(part.order_hash),
        payments,
    }
}

fn transfer(
    description: &str,
    token: Address,
    from: Address,
    to: Address,
    amount: Amount,
) -> DetailedTokenTransfer {
    DetailedTokenTransfer {
        description: description.to_string(),
        token,
        from,
        to,
        amount,
        sub_payments: Vec::new(),
    }
}
