//! Fee and burn computation.
//!
//! Two fee modes exist per order:
//!
//! - **Cash fee**: `fee_amount` of `fee_token` for a full fill, charged pro
//!   rata to `fill_s`. When the owner receives the bought tokens itself and
//!   pays fees in them, the fee is withheld from `token_b` instead.
//! - **Peer-to-peer**: per-mille percentages of the sold and the bought
//!   tokens, no cash fee.
//!
//! Every fee amount is then distributed in a fixed order:
//!
//! ```text
//! rebate = fee · rebate_rate / burn_base             → owner
//! burn   = (fee − rebate) · burn_rate / burn_base    → fee holder
//! net    = fee − rebate − burn
//! wallet = net · wallet_split / 100   (wallet set)   → wallet
//! miner  = net − wallet                              → miner
//! ```
//!
//! All divisions floor, so the four shares always sum to the fee exactly.

use ringsettle_types::amount::{checked_sub, mul_div, percentage_of};
use ringsettle_types::constants::WALLET_SPLIT_PERCENTAGE_BASE;
use ringsettle_types::{Address, Amount, BurnRateRegistry, Order, RingsettleError};

/// Gross fees of one member before distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrossFees {
    pub fee_amount: Amount,
    pub fee_amount_s: Amount,
    pub fee_amount_b: Amount,
}

/// Fees owed for trading `fill_s` for `fill_b`.
pub fn gross_fees(
    order: &Order,
    fill_s: Amount,
    fill_b: Amount,
    fee_percentage_base: u16,
) -> Result<GrossFees, RingsettleError> {
    if order.is_p2p() {
        return Ok(GrossFees {
            fee_amount: Amount::ZERO,
            fee_amount_s: percentage_of(fill_s, order.token_s_fee_percentage, fee_percentage_base)?,
            fee_amount_b: percentage_of(fill_b, order.token_b_fee_percentage, fee_percentage_base)?,
        });
    }
    let fee = mul_div(order.fee_amount, fill_s, order.amount_s)?;
    if order.can_pay_fee_in_token_b() && fill_b >= fee {
        Ok(GrossFees {
            fee_amount_b: fee,
            ..GrossFees::default()
        })
    } else {
        Ok(GrossFees {
            fee_amount: fee,
            ..GrossFees::default()
        })
    }
}

/// How one fee amount is shared out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeShares {
    pub token: Address,
    pub total: Amount,
    pub rebate: Amount,
    pub burn: Amount,
    pub wallet: Amount,
    pub miner: Amount,
}

/// Distributes fees for one submission.
#[derive(Debug, Clone, Copy)]
pub struct FeeCalculator {
    burn_base_percentage: u16,
    fee_holder: Address,
    /// Resolved miner: explicit miner, else fee recipient, else submitter.
    miner: Address,
}

impl FeeCalculator {
    #[must_use]
    pub fn new(burn_base_percentage: u16, fee_holder: Address, miner: Address) -> Self {
        Self {
            burn_base_percentage,
            fee_holder,
            miner,
        }
    }

    /// Split `amount` of `token` paid by `order`.
    pub fn distribute<R: BurnRateRegistry + ?Sized>(
        &self,
        order: &Order,
        token: Address,
        amount: Amount,
        registry: &R,
    ) -> Result<FeeShares, RingsettleError> {
        let base = self.burn_base_percentage;
        let rebate_rate = registry.rebate_rate(&order.owner).min(base);
        let burn_rate = registry
            .burn_rate(&token)
            .for_mode(order.is_p2p())
            .min(base);

        let rebate = percentage_of(amount, rebate_rate, base)?;
        let after_rebate = checked_sub(amount, rebate)?;
        let burn = percentage_of(after_rebate, burn_rate, base)?;
        let net = checked_sub(after_rebate, burn)?;
        let wallet = if order.wallet_addr.is_some() {
            percentage_of(
                net,
                u16::from(order.wallet_split_percentage.min(WALLET_SPLIT_PERCENTAGE_BASE)),
                u16::from(WALLET_SPLIT_PERCENTAGE_BASE),
            )?
        } else {
            Amount::ZERO
        };
        let miner = checked_sub(net, wallet)?;

        tracing::debug!(
            %token,
            owner = %order.owner,
            total = %amount,
            rebate = %rebate,
            burn = %burn,
            wallet = %wallet,
            miner = %miner,
            burn_rate,
            "Fee distributed"
        );

        Ok(FeeShares {
            token,
            total: amount,
            rebate,
            burn,
            wallet,
            miner,
        })
    }

    /// Fee-ledger credits for `shares`, zero shares omitted.
    ///
    /// Burned fees stay on the fee holder's own account.
    #[must_use]
    pub fn credits(&self, order: &Order, shares: &FeeShares) -> Vec<(Address, Amount)> {
        let mut credits = vec![
            (order.owner, shares.rebate),
            (self.fee_holder, shares.burn),
        ];
        if let Some(wallet) = order.wallet_addr {
            credits.push((wallet, shares.wallet));
        }
        credits.push((self.miner, shares.miner));
        credits.retain(|(_, amount)| !amount.is_zero());
        credits
    }

    #[must_use]
    pub fn miner(&self) -> Address {
        self.miner
    }

    #[must_use]
    pub fn fee_holder(&self) -> Address {
        self.fee_holder
    }
}
