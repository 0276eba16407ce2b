//! Determinism and conservation properties of the settlement oracle.
//!
//! The same submission against the same snapshot must always produce the
//! same report root, and no settlement may create or destroy tokens.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use ringsettle_settlement::{
    LedgerSnapshot, ObservedOutcome, SettlementOracle, SupplyConservation, check_report_root,
    compute_report_root, verify_outcome,
};
use ringsettle_types::constants::{BURN_BASE_PERCENTAGE, FEE_PERCENTAGE_BASE, MAX_RING_SIZE};
use ringsettle_types::*;

fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

fn context() -> Context {
    Context {
        block_number: 7,
        block_timestamp: 1_700_000_000,
        transaction_origin: addr(0x0f),
        trade_delegate: addr(0xde),
        fee_holder: addr(0xfe),
        broker_registry: addr(0xb0),
        order_registry: addr(0xb1),
        order_book: addr(0xb2),
        burn_rate_table: addr(0xb3),
        base_token: addr(0x1c),
        fee_percentage_base: FEE_PERCENTAGE_BASE,
        burn_base_percentage: BURN_BASE_PERCENTAGE,
        max_ring_size: MAX_RING_SIZE,
        max_orders_per_submission: 64,
        ring_index: 40,
    }
}

struct Market {
    submission: Submission,
    ledger: LedgerSnapshot,
}

/// A three-party ring X → Y → Z → X with cash fees and a wallet, funded from
/// the given balances. With `shared_owner` the first and last orders belong
/// to the same account and draw their fees from one base-token balance.
fn market(
    amounts: [u64; 3],
    asks: [u64; 3],
    funds: [u64; 3],
    fee: u64,
    burn: u16,
    shared_owner: bool,
) -> Market {
    let ctx = context();
    let wallet = addr(0x77);
    let tokens = [addr(1), addr(2), addr(3)];
    let mut ledger = LedgerSnapshot::new();
    ledger.set_burn_rate(ctx.base_token, BurnRate { matching: burn, p2p: 0 });

    let orders = (0..3)
        .map(|i| {
            let seed = if shared_owner && i == 2 { 1 } else { i + 1 };
            let account = TestAccount::from_seed(u8::try_from(seed).unwrap_or(1));
            let mut order = Order::new(
                account.address,
                tokens[i],
                tokens[(i + 1) % 3],
                Amount::from(amounts[i]),
                Amount::from(asks[i]),
                ctx.base_token,
            );
            order.fee_amount = Amount::from(fee);
            order.wallet_addr = Some(wallet);
            order.wallet_split_percentage = 20;
            ledger.set_balance(account.address, tokens[i], Amount::from(funds[i]));
            ledger.approve(tokens[i], account.address, ctx.trade_delegate, Amount::from(funds[i]));
            ledger.set_balance(account.address, ctx.base_token, Amount::from(fee));
            ledger.approve(ctx.base_token, account.address, ctx.trade_delegate, Amount::from(fee));
            order.signed_by(&account, SignAlgorithm::Ethereum)
        })
        .collect();

    Market {
        submission: Submission::new(orders, vec![Ring::new(vec![0, 1, 2])]),
        ledger,
    }
}

/// A four-member ring in which X sells token 1 twice, peer-to-peer with a
/// token_s fee, against two Y orders selling token 2.
fn shared_p2p_market(
    amounts: [u64; 2],
    asks: [u64; 2],
    fee_pct: [u16; 2],
    x_funds: u64,
) -> Market {
    let ctx = context();
    let (x, y) = (TestAccount::from_seed(1), TestAccount::from_seed(2));
    let mut ledger = LedgerSnapshot::new();
    ledger.set_balance(x.address, addr(1), Amount::from(x_funds));
    ledger.approve(addr(1), x.address, ctx.trade_delegate, Amount::from(x_funds));
    ledger.set_balance(y.address, addr(2), Amount::from(2_000_000u64));
    ledger.approve(addr(2), y.address, ctx.trade_delegate, Amount::from(2_000_000u64));

    let mut orders = Vec::with_capacity(4);
    for (k, valid_since) in [0u64, 1].into_iter().enumerate() {
        let mut sell = Order::new(
            x.address,
            addr(1),
            addr(2),
            Amount::from(amounts[k]),
            Amount::from(asks[k]),
            ctx.base_token,
        );
        sell.waive_fee_percentage = 1;
        sell.token_s_fee_percentage = fee_pct[k];
        sell.valid_since = valid_since;
        orders.push(sell.signed_by(&x, SignAlgorithm::Ethereum));

        let mut buy = Order::new(
            y.address,
            addr(2),
            addr(1),
            Amount::from(1_000_000u64),
            Amount::from(1_000_000u64),
            ctx.base_token,
        );
        buy.valid_since = valid_since;
        orders.push(buy.signed_by(&y, SignAlgorithm::Ethereum));
    }

    Market {
        submission: Submission::new(orders, vec![Ring::new(vec![0, 1, 2, 3])]),
        ledger,
    }
}

fn assert_settles_within_bounds(ctx: &Context, m: &Market) -> std::result::Result<(), TestCaseError> {
    let report = SettlementOracle::new(ctx).simulate(&m.submission, &m.ledger);

    prop_assert!(!report.reverted, "{:?}", report.revert_reason);
    prop_assert_eq!(report.ring_mined_events.len() + report.invalid_ring_events.len(), 1);
    SupplyConservation::new(ctx.fee_holder)
        .verify(&m.submission, &report)
        .map_err(|err| TestCaseError::fail(err.to_string()))?;

    for (order, hash) in m.submission.orders.iter().zip(m.submission.order_hashes()) {
        let filled = report.filled_after(&hash);
        prop_assert!(filled <= order.amount_s);
        for fill in report.fills_of(&hash) {
            prop_assert!(!fill.amount_s.is_zero());
            prop_assert!(fill.fee_amount <= order.fee_amount);
        }
    }
    Ok(())
}

#[test]
fn same_input_same_root() {
    let ctx = context();
    let m = market([1000, 1000, 1000], [900, 950, 1000], [1000, 600, 1000], 30, 100, false);
    let oracle = SettlementOracle::new(&ctx);

    let first = oracle.simulate(&m.submission, &m.ledger);
    let second = oracle.simulate(&m.submission, &m.ledger);
    assert!(!first.reverted, "{:?}", first.revert_reason);
    assert_eq!(first.ring_mined_events[0].ring_index, 40);
    assert_eq!(first.ring_index_after, 41);

    let root = compute_report_root(&first);
    assert_eq!(root, compute_report_root(&second));
    check_report_root(&second, &root).expect("replay matches");
}

#[test]
fn snapshot_is_not_mutated() {
    let ctx = context();
    let m = market([1000, 1000, 1000], [900, 950, 1000], [1000, 1000, 1000], 30, 100, false);
    let before = m.ledger.clone();
    let report = SettlementOracle::new(&ctx).simulate(&m.submission, &m.ledger);
    assert!(!report.transfer_items.is_empty());
    assert_eq!(m.ledger, before);
}

#[test]
fn reordered_transfers_still_verify() {
    let ctx = context();
    let m = market([1000, 1000, 1000], [900, 950, 1000], [1000, 1000, 1000], 30, 100, false);
    let report = SettlementOracle::new(&ctx).simulate(&m.submission, &m.ledger);

    let mut observed = ObservedOutcome::from_report(&report);
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    observed.transfer_items.shuffle(&mut rng);
    verify_outcome(&report, &observed).expect("order of transfers is irrelevant");

    observed.ring_index_after += 1;
    assert_eq!(
        verify_outcome(&report, &observed),
        Err(RingsettleError::ReportMismatch { count: 1 })
    );
}

#[test]
fn applied_report_matches_next_snapshot() {
    let ctx = context();
    let m = market([1000, 1000, 1000], [900, 950, 1000], [1000, 1000, 1000], 30, 100, false);
    let report = SettlementOracle::new(&ctx).simulate(&m.submission, &m.ledger);

    let mut ledger = m.ledger.clone();
    ledger.apply(&report, &ctx.trade_delegate).expect("applies");
    assert_eq!(ledger.balances(), &report.balances_after);
    assert_eq!(ledger.fee_balances(), &report.fee_balances_after);
    for (hash, amount) in &report.filled_amounts_after {
        assert_eq!(ledger.filled(hash), *amount);
    }

    // Against a different state the same report no longer fits.
    let mut other = m.ledger.clone();
    other.set_balance(addr(0x55), addr(1), Amount::from(1u64));
    let untouched = other.clone();
    assert!(other.apply(&report, &ctx.trade_delegate).is_err());
    assert_eq!(other, untouched);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn settlement_conserves_supply(
        amounts in prop::array::uniform3(1u64..1_000_000),
        asks in prop::array::uniform3(1u64..1_000_000),
        funds in prop::array::uniform3(0u64..1_000_000),
        fee in 0u64..10_000,
        burn in 0u16..=1000,
        shared_owner in any::<bool>(),
    ) {
        let ctx = context();
        assert_settles_within_bounds(&ctx, &market(amounts, asks, funds, fee, burn, shared_owner))?;
    }

    #[test]
    fn shared_p2p_owner_never_overdraws(
        amounts in prop::array::uniform2(1u64..1_000_000),
        asks in prop::array::uniform2(1u64..1_000_000),
        fee_pct in prop::array::uniform2(0u16..=1000),
        x_funds in 0u64..2_000_000,
    ) {
        let ctx = context();
        assert_settles_within_bounds(&ctx, &shared_p2p_market(amounts, asks, fee_pct, x_funds))?;
    }
}
