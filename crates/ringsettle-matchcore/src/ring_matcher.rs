//! Ring rate matching.
//!
//! Member `i` sells `token_s(i)` to its *downstream* member `prev(i)`, the
//! member before it in ring order, whose `token_b` is that token. A ring is
//! consistent when no member wants to buy more than its upstream seller
//! sells: `fill_b(prev(i)) <= fill_s(i)` for every `i`.
//!
//! ## Algorithm
//!
//! 1. Size every member at its maximum fill: unfilled remainder, capped by
//!    the spendable `token_s` and by what it can pay in fees
//! 2. Forward pass: `resize(i)` cuts `prev(i)` down to `fill_s(i)` at
//!    `prev(i)`'s own rate; the last member that caused a cut is the limit
//! 3. Propagate the cut backwards around the ring from the limit, and again
//!    from any member still violated, at most once per member
//! 4. Margin: each member pays its full `fill_s` downstream; whatever
//!    exceeds the downstream ask is the member's `split` and goes to the
//!    receiver
//! 5. Reject zero fills and partially filled all-or-none orders
//! 6. Attach gross fees

use ringsettle_types::amount::{checked_add, mul_div};
use ringsettle_types::constants::MIN_RING_SIZE;
use ringsettle_types::{Amount, RingFailure, RingsettleError};

use crate::fees::gross_fees;
use crate::participation::{Participation, RingMember};

/// Sizes rings for one protocol fee base.
#[derive(Debug, Clone, Copy)]
pub struct RingMatcher {
    fee_percentage_base: u16,
}

impl RingMatcher {
    #[must_use]
    pub fn new(fee_percentage_base: u16) -> Self {
        Self {
            fee_percentage_base,
        }
    }

    /// Fill every member of one ring.
    ///
    /// `members` are in ring order. The returned participations are in the
    /// same order.
    pub fn match_ring(&self, members: &[RingMember<'_>]) -> Result<Vec<Participation>, RingFailure> {
        let n = members.len();
        if n < MIN_RING_SIZE {
            return Err(RingFailure::InvalidRingSize);
        }

        let mut parts = members
            .iter()
            .map(|member| self.max_fill(member))
            .collect::<Result<Vec<_>, _>>()?;

        let mut limit = 0;
        for i in 0..n {
            if resize(members, &mut parts, i)? {
                limit = i;
            }
        }

        let mut consistent = false;
        for _ in 0..n {
            for k in 0..n - 1 {
                resize(members, &mut parts, (limit + n - k) % n)?;
            }
            match first_violation(&parts) {
                None => {
                    consistent = true;
                    break;
                }
                Some(i) => limit = i,
            }
        }
        if !consistent {
            return Err(RingFailure::UnmatchableRates);
        }

        if parts
            .iter()
            .any(|part| part.fill_s.is_zero() || part.fill_b.is_zero())
        {
            return Err(RingFailure::ZeroFill);
        }

        // Every member delivers its whole fill_s; the surplus over the
        // downstream ask becomes the payer's split.
        for i in 0..n {
            let asked = parts[prev(i, n)].fill_b;
            parts[i].split = parts[i].fill_s - asked;
        }
        for i in 0..n {
            let delivered = parts[i].fill_s;
            parts[prev(i, n)].fill_b = delivered;
        }

        for (member, part) in members.iter().zip(&parts) {
            let order = member.order;
            if order.all_or_none
                && checked_add(member.filled, part.fill_s).map_err(overflow)? != order.amount_s
            {
                return Err(RingFailure::AllOrNoneUnmet);
            }
        }

        for (member, part) in members.iter().zip(parts.iter_mut()) {
            let fees = gross_fees(member.order, part.fill_s, part.fill_b, self.fee_percentage_base)
                .map_err(overflow)?;
            part.fee_amount = fees.fee_amount;
            part.fee_amount_s = fees.fee_amount_s;
            part.fee_amount_b = fees.fee_amount_b;
        }

        tracing::debug!(
            members = n,
            limit,
            fills = ?parts.iter().map(|p| p.fill_s.to_string()).collect::<Vec<_>>(),
            "Ring sized"
        );
        Ok(parts)
    }

    /// Largest fill the member can afford on its own.
    fn max_fill(&self, member: &RingMember<'_>) -> Result<Participation, RingFailure> {
        let order = member.order;
        let mut fill_s = order.remaining(member.filled).min(member.spendable_s);

        if order.is_p2p() {
            if order.token_s_fee_percentage > 0 {
                // fill + fill · pct / base must stay within the spendable amount.
                let base = Amount::from(u64::from(self.fee_percentage_base));
                let with_fee = base + Amount::from(u64::from(order.token_s_fee_percentage));
                let cap = mul_div(member.spendable_s, base, with_fee).map_err(overflow)?;
                fill_s = fill_s.min(cap);
            }
        } else if !order.fee_amount.is_zero() && !order.can_pay_fee_in_token_b() {
            let fee = mul_div(order.fee_amount, fill_s, order.amount_s).map_err(overflow)?;
            let fee_shares_token_s = order.fee_token == order.token_s
                && order.token_type_fee == order.token_type_s
                && order.tranche_s.is_default();
            if fee_shares_token_s && checked_add(fill_s, fee).map_err(overflow)? > member.spendable_s {
                let total = checked_add(order.amount_s, order.fee_amount).map_err(overflow)?;
                fill_s = mul_div(member.spendable_s, order.amount_s, total).map_err(overflow)?;
            } else if fee > member.spendable_fee {
                fill_s = mul_div(member.spendable_fee, order.amount_s, order.fee_amount)
                    .map_err(overflow)?;
            }
        }

        let fill_b = mul_div(fill_s, order.amount_b, order.amount_s).map_err(overflow)?;
        Ok(Participation::sized(member.hash, fill_s, fill_b))
    }
}

fn prev(i: usize, n: usize) -> usize {
    (i + n - 1) % n
}

/// Cut the downstream member of `i` to what `i` sells. Returns `true` on a cut.
fn resize(
    members: &[RingMember<'_>],
    parts: &mut [Participation],
    i: usize,
) -> Result<bool, RingFailure> {
    let j = prev(i, parts.len());
    if parts[j].fill_b <= parts[i].fill_s {
        return Ok(false);
    }
    let order = members[j].order;
    parts[j].fill_b = parts[i].fill_s;
    parts[j].fill_s = mul_div(parts[j].fill_b, order.amount_s, order.amount_b).map_err(overflow)?;
    Ok(true)
}

fn first_violation(parts: &[Participation]) -> Option<usize> {
    let n = parts.len();
    (0..n).find(|&i| parts[prev(i, n)].fill_b > parts[i].fill_s)
}

fn overflow(_: RingsettleError) -> RingFailure {
    RingFailure::ArithmeticOverflow
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use ringsettle_types::constants::FEE_PERCENTAGE_BASE;
    use ringsettle_types::{Address, Order};

    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn e17(n: u64) -> Amount {
        Amount::from(n) * Amount::from(100_000_000_000_000_000u64)
    }

    fn e18(n: u64) -> Amount {
        e17(n * 10)
    }

    fn order(owner: u8, token_s: u8, token_b: u8, amount_s: Amount, amount_b: Amount) -> Order {
        Order::new(addr(owner), addr(token_s), addr(token_b), amount_s, amount_b, addr(0x1c))
    }

    fn unlimited(order: &Order) -> RingMember<'_> {
        RingMember::new(order, Amount::ZERO, Amount::MAX, Amount::MAX)
    }

    fn matcher() -> RingMatcher {
        RingMatcher::new(FEE_PERCENTAGE_BASE)
    }

    #[test]
    fn margin_goes_downstream_and_counts_as_filled() {
        let a = order(0xa0, 1, 2, e18(100), e18(10));
        let b = order(0xa1, 2, 1, e17(51), e18(50));
        let parts = matcher().match_ring(&[unlimited(&a), unlimited(&b)]).unwrap();

        assert_eq!(parts[0].fill_s, e18(51));
        assert_eq!(parts[0].split, e18(1));
        assert_eq!(parts[0].traded_s(), e18(50));
        assert_eq!(parts[0].fill_b, e17(51));
        assert_eq!(parts[1].fill_s, e17(51));
        assert_eq!(parts[1].split, Amount::ZERO);
        assert_eq!(parts[1].fill_b, e18(51));
    }

    #[test]
    fn follow_up_ring_completes_partially_filled_order() {
        let a = order(0xa0, 1, 2, e18(100), e18(10));
        let c = order(0xa2, 2, 1, e18(6), e18(60));
        let members = [
            RingMember::new(&a, e18(51), Amount::MAX, Amount::MAX),
            unlimited(&c),
        ];
        let parts = matcher().match_ring(&members).unwrap();
        assert_eq!(parts[0].fill_s, e18(49));
        assert_eq!(parts[0].split, Amount::ZERO);
        assert_eq!(parts[1].fill_s, e17(49));
        assert_eq!(e18(51) + parts[0].fill_s, e18(100));
    }

    #[test]
    fn limit_propagates_backwards_through_ring() {
        let a = order(0xa0, 1, 2, Amount::from(100u64), Amount::from(100u64));
        let b = order(0xa1, 2, 3, Amount::from(100u64), Amount::from(100u64));
        let c = order(0xa2, 3, 1, Amount::from(10u64), Amount::from(10u64));
        let parts = matcher()
            .match_ring(&[unlimited(&a), unlimited(&b), unlimited(&c)])
            .unwrap();
        for part in &parts {
            assert_eq!(part.fill_s, Amount::from(10u64));
            assert_eq!(part.fill_b, Amount::from(10u64));
        }
    }

    #[test]
    fn limit_in_the_middle_of_a_long_ring() {
        let orders = [
            order(0xa0, 1, 2, Amount::from(1_000u64), Amount::from(1_000u64)),
            order(0xa1, 2, 3, Amount::from(1_000u64), Amount::from(1_000u64)),
            order(0xa2, 3, 4, Amount::from(40u64), Amount::from(40u64)),
            order(0xa3, 4, 5, Amount::from(1_000u64), Amount::from(1_000u64)),
            order(0xa4, 5, 1, Amount::from(1_000u64), Amount::from(1_000u64)),
        ];
        let members: Vec<_> = orders.iter().map(unlimited).collect();
        let parts = matcher().match_ring(&members).unwrap();
        assert!(parts.iter().all(|p| p.fill_s == Amount::from(40u64)));
    }

    #[test]
    fn spendable_caps_fill() {
        let a = order(0xa0, 1, 2, e18(100), e18(10));
        let b = order(0xa1, 2, 1, e18(10), e18(100));
        let members = [
            RingMember::new(&a, Amount::ZERO, e18(50), Amount::MAX),
            unlimited(&b),
        ];
        let parts = matcher().match_ring(&members).unwrap();
        assert_eq!(parts[0].fill_s, e18(50));
        assert_eq!(parts[1].fill_s, e18(5));
    }

    #[test]
    fn fee_balance_caps_fill() {
        let mut a = order(0xa0, 1, 2, e18(100), e18(10));
        a.fee_amount = e18(10);
        let b = order(0xa1, 2, 1, e18(10), e18(100));
        let members = [
            RingMember::new(&a, Amount::ZERO, Amount::MAX, e17(25)),
            unlimited(&b),
        ];
        let parts = matcher().match_ring(&members).unwrap();
        assert_eq!(parts[0].fill_s, e18(25));
        assert_eq!(parts[0].fee_amount, e17(25));
    }

    #[test]
    fn no_fee_balance_means_zero_fill() {
        let mut a = order(0xa0, 1, 2, e18(100), e18(10));
        a.fee_amount = e18(10);
        let b = order(0xa1, 2, 1, e18(10), e18(100));
        let members = [
            RingMember::new(&a, Amount::ZERO, Amount::MAX, Amount::ZERO),
            unlimited(&b),
        ];
        assert_eq!(matcher().match_ring(&members), Err(RingFailure::ZeroFill));
    }

    #[test]
    fn fee_in_token_s_shares_the_balance() {
        let mut a = order(0xa0, 1, 2, Amount::from(100u64), Amount::from(100u64));
        a.fee_token = a.token_s;
        a.fee_amount = Amount::from(25u64);
        let b = order(0xa1, 2, 1, Amount::from(1_000u64), Amount::from(1_000u64));
        let members = [
            RingMember::new(&a, Amount::ZERO, Amount::from(100u64), Amount::from(100u64)),
            unlimited(&b),
        ];
        let parts = matcher().match_ring(&members).unwrap();
        assert_eq!(parts[0].fill_s, Amount::from(80u64));
        assert_eq!(parts[0].fee_amount, Amount::from(20u64));
    }

    #[test]
    fn fee_payable_in_token_b_skips_fee_balance() {
        let mut a = order(0xa0, 1, 2, Amount::from(100u64), Amount::from(100u64));
        a.fee_token = a.token_b;
        a.fee_amount = Amount::from(10u64);
        let b = order(0xa1, 2, 1, Amount::from(100u64), Amount::from(100u64));
        let members = [
            RingMember::new(&a, Amount::ZERO, Amount::MAX, Amount::ZERO),
            unlimited(&b),
        ];
        let parts = matcher().match_ring(&members).unwrap();
        assert_eq!(parts[0].fill_s, Amount::from(100u64));
        assert_eq!(parts[0].fee_amount_b, Amount::from(10u64));
        assert_eq!(parts[0].fee_amount, Amount::ZERO);
    }

    #[test]
    fn p2p_token_s_fee_must_fit_spendable() {
        let mut a = order(0xa0, 1, 2, Amount::from(1_000u64), Amount::from(1_000u64));
        a.waive_fee_percentage = 1;
        a.token_s_fee_percentage = 250;
        let b = order(0xa1, 2, 1, Amount::from(1_000u64), Amount::from(1_000u64));
        let members = [
            RingMember::new(&a, Amount::ZERO, Amount::from(100u64), Amount::ZERO),
            unlimited(&b),
        ];
        let parts = matcher().match_ring(&members).unwrap();
        assert_eq!(parts[0].fill_s, Amount::from(80u64));
        assert_eq!(parts[0].fee_amount_s, Amount::from(20u64));
    }

    #[test]
    fn all_or_none_partial_fill_voids_ring() {
        let mut a = order(0xa0, 1, 2, e18(100), e18(10));
        a.all_or_none = true;
        let b = order(0xa1, 2, 1, e17(51), e18(50));
        assert_eq!(
            matcher().match_ring(&[unlimited(&a), unlimited(&b)]),
            Err(RingFailure::AllOrNoneUnmet)
        );
    }

    #[test]
    fn all_or_none_full_fill_passes() {
        let mut a = order(0xa0, 1, 2, e18(100), e18(10));
        a.all_or_none = true;
        let b = order(0xa1, 2, 1, e18(10), e18(100));
        let parts = matcher().match_ring(&[unlimited(&a), unlimited(&b)]).unwrap();
        assert_eq!(parts[0].fill_s, e18(100));
    }

    #[test]
    fn crossing_rates_never_settle() {
        let a = order(0xa0, 1, 2, Amount::from(100u64), Amount::from(10u64));
        let b = order(0xa1, 2, 1, Amount::from(5u64), Amount::from(100u64));
        let result = matcher().match_ring(&[unlimited(&a), unlimited(&b)]);
        assert!(
            matches!(result, Err(RingFailure::UnmatchableRates | RingFailure::ZeroFill)),
            "{result:?}"
        );
    }

    #[test]
    fn single_member_is_not_a_ring() {
        let a = order(0xa0, 1, 1, Amount::from(1u64), Amount::from(1u64));
        assert_eq!(
            matcher().match_ring(&[unlimited(&a)]),
            Err(RingFailure::InvalidRingSize)
        );
    }

    proptest! {
        #[test]
        fn settled_rings_are_consistent(
            (a_s, a_b, b_s, b_b) in (1u64..1_000_000, 1u64..1_000_000, 1u64..1_000_000, 1u64..1_000_000),
            (a_spend, b_spend) in (0u64..2_000_000, 0u64..2_000_000),
            a_filled in 0u64..1_000_000,
        ) {
            let a = order(0xa0, 1, 2, Amount::from(a_s), Amount::from(a_b));
            let b = order(0xa1, 2, 1, Amount::from(b_s), Amount::from(b_b));
            let filled = Amount::from(a_filled.min(a_s));
            let members = [
                RingMember::new(&a, filled, Amount::from(a_spend), Amount::MAX),
                RingMember::new(&b, Amount::ZERO, Amount::from(b_spend), Amount::MAX),
            ];
            if let Ok(parts) = matcher().match_ring(&members) {
                for (i, (member, part)) in members.iter().zip(&parts).enumerate() {
                    prop_assert!(part.fill_s <= member.spendable_s);
                    prop_assert!(member.filled + part.fill_s <= member.order.amount_s);
                    prop_assert_eq!(part.traded_s() + part.split, part.fill_s);
                    // The downstream member receives exactly what this one sells.
                    prop_assert_eq!(parts[prev(i, 2)].fill_b, part.fill_s);
                    prop_assert!(!part.fill_s.is_zero());
                }
            }
        }
    }
}
