//! In-memory authoritative ledger.
//!
//! A [`LedgerSnapshot`] holds everything the engine reads from the outside
//! world: token standards and balances, allowances and operators, the fee
//! ledger, filled amounts, cancellations, and every registry. It implements
//! all collaborator traits, and offers the mutating operations the real
//! environment would (approve, register, cancel, ...) so tests and replays
//! can build the state a submission runs against.
//!
//! The oracle never mutates a snapshot it is given; it settles on a clone.

use std::collections::{BTreeMap, BTreeSet};

use ringsettle_types::amount::checked_add;
use ringsettle_types::{
    Address, Amount, BalanceBook, BalanceKey, BrokerInterceptor, BrokerRegistration,
    BrokerRegistry, BurnRate, BurnRateRegistry, CancellationLedger, CollaboratorError, FeeLedger,
    FilledLedger, OrderBook, OrderHash, OrderHashRegistry, Result, RingsettleError,
    SimulatorReport, TokenLedger, TokenType, TradeAuthorization, Tranche,
};

use crate::capability::capability_for;

/// How a broker interceptor answers trade authorization requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptorBehavior {
    Allow,
    Deny,
    /// The call itself fails.
    Fail,
    /// Allows trades up to this amount.
    Limit(Amount),
}

/// Snapshot of the authoritative environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    token_types: BTreeMap<Address, TokenType>,
    balances: BalanceBook,
    /// `(token, owner, spender)` → amount.
    allowances: BTreeMap<(Address, Address, Address), Amount>,
    /// `(token, holder, operator)`.
    operators: BTreeSet<(Address, Address, Address)>,
    /// `(token, from)` pairs the partitioned token refuses to send for.
    send_blocks: BTreeSet<(Address, Address)>,
    /// Tokens whose every call fails.
    failing_tokens: BTreeSet<Address>,
    fee_balances: BalanceBook,
    filled: BTreeMap<OrderHash, Amount>,
    cancelled: BTreeSet<OrderHash>,
    cutoffs: BTreeMap<Address, u64>,
    pair_cutoffs: BTreeMap<(Address, Address, Address), u64>,
    registered_hashes: BTreeSet<(Address, OrderHash)>,
    order_book: BTreeSet<OrderHash>,
    brokers: BTreeMap<(Address, Address), BrokerRegistration>,
    interceptors: BTreeMap<Address, InterceptorBehavior>,
    burn_rates: BTreeMap<Address, BurnRate>,
    rebate_rates: BTreeMap<Address, u16>,
}

impl LedgerSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Tokens -----------------------------------------------------------

    pub fn register_token(&mut self, token: Address, token_type: TokenType) {
        self.token_types.insert(token, token_type);
    }

    /// Set a fungible balance. Registers `token` as fungible if unknown.
    pub fn set_balance(&mut self, owner: Address, token: Address, amount: Amount) {
        self.token_types.entry(token).or_insert(TokenType::Fungible);
        self.balances.set(BalanceKey::fungible(owner, token), amount);
    }

    /// Set a balance in one tranche. Registers `token` as partitioned if unknown.
    pub fn set_tranche_balance(
        &mut self,
        owner: Address,
        token: Address,
        tranche: Tranche,
        amount: Amount,
    ) {
        self.token_types
            .entry(token)
            .or_insert(TokenType::Partitioned);
        self.balances.set(BalanceKey::new(owner, token, tranche), amount);
    }

    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: Amount) {
        self.token_types.entry(token).or_insert(TokenType::Fungible);
        if amount.is_zero() {
            self.allowances.remove(&(token, owner, spender));
        } else {
            self.allowances.insert((token, owner, spender), amount);
        }
    }

    pub fn authorize_operator(&mut self, token: Address, holder: Address, operator: Address) {
        self.operators.insert((token, holder, operator));
    }

    pub fn revoke_operator(&mut self, token: Address, holder: Address, operator: Address) {
        self.operators.remove(&(token, holder, operator));
    }

    /// Make the partitioned `token` refuse every send from `from`.
    pub fn block_sends(&mut self, token: Address, from: Address) {
        self.send_blocks.insert((token, from));
    }

    /// Make every call to `token` fail.
    pub fn fail_token(&mut self, token: Address) {
        self.failing_tokens.insert(token);
    }

    // --- Orders -----------------------------------------------------------

    pub fn register_order_hash(&mut self, owner: Address, hash: OrderHash) {
        self.registered_hashes.insert((owner, hash));
    }

    pub fn submit_to_order_book(&mut self, hash: OrderHash) {
        self.order_book.insert(hash);
    }

    pub fn set_filled(&mut self, hash: OrderHash, amount: Amount) {
        self.filled.insert(hash, amount);
    }

    pub fn cancel_order(&mut self, hash: OrderHash) {
        self.cancelled.insert(hash);
    }

    pub fn set_cutoff(&mut self, owner: Address, timestamp: u64) {
        self.cutoffs.insert(owner, timestamp);
    }

    pub fn set_trading_pair_cutoff(
        &mut self,
        owner: Address,
        token_s: Address,
        token_b: Address,
        timestamp: u64,
    ) {
        self.pair_cutoffs.insert((owner, token_s, token_b), timestamp);
    }

    // --- Brokers ----------------------------------------------------------

    pub fn register_broker(&mut self, owner: Address, broker: Address, interceptor: Option<Address>) {
        self.brokers.insert(
            (owner, broker),
            BrokerRegistration {
                broker,
                interceptor,
            },
        );
    }

    pub fn unregister_broker(&mut self, owner: Address, broker: Address) {
        self.brokers.remove(&(owner, broker));
    }

    pub fn set_interceptor(&mut self, interceptor: Address, behavior: InterceptorBehavior) {
        self.interceptors.insert(interceptor, behavior);
    }

    // --- Fees -------------------------------------------------------------

    pub fn set_burn_rate(&mut self, token: Address, rate: BurnRate) {
        self.burn_rates.insert(token, rate);
    }

    pub fn set_rebate_rate(&mut self, owner: Address, rate: u16) {
        self.rebate_rates.insert(owner, rate);
    }

    pub fn set_fee_balance(&mut self, owner: Address, token: Address, amount: Amount) {
        self.fee_balances.set(BalanceKey::fungible(owner, token), amount);
    }

    // --- Views ------------------------------------------------------------

    #[must_use]
    pub fn balances(&self) -> &BalanceBook {
        &self.balances
    }

    #[must_use]
    pub fn fee_balances(&self) -> &BalanceBook {
        &self.fee_balances
    }

    #[must_use]
    pub fn balance(&self, owner: Address, token: Address) -> Amount {
        self.balances.get(&BalanceKey::fungible(owner, token))
    }

    #[must_use]
    pub fn fee_balance_of(&self, owner: Address, token: Address) -> Amount {
        self.fee_balances.get(&BalanceKey::fungible(owner, token))
    }

    #[must_use]
    pub fn is_failing(&self, token: &Address) -> bool {
        self.failing_tokens.contains(token)
    }

    // --- Settlement -------------------------------------------------------

    pub(crate) fn balances_mut(&mut self) -> &mut BalanceBook {
        &mut self.balances
    }

    /// Spend `amount` of the allowance `owner` granted `spender`.
    pub(crate) fn consume_allowance(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<()> {
        let current = self.allowance(&token, &owner, &spender);
        let Some(left) = current.checked_sub(amount) else {
            return Err(RingsettleError::TransferExecutionFailure {
                reason: format!(
                    "allowance of {owner} for token {token} exhausted: need {amount}, have {current}"
                ),
            });
        };
        self.approve(token, owner, spender, left);
        Ok(())
    }

    pub(crate) fn credit_fee(&mut self, owner: Address, token: Address, amount: Amount) -> Result<()> {
        self.fee_balances
            .credit(BalanceKey::fungible(owner, token), amount)
    }

    pub(crate) fn add_filled(&mut self, hash: OrderHash, amount: Amount) -> Result<()> {
        let updated = checked_add(self.filled(&hash), amount)?;
        self.filled.insert(hash, updated);
        Ok(())
    }

    /// Commit a settled report, as the authoritative environment would.
    ///
    /// Replays the report's transfers through `spender` and its mined fills
    /// onto the filled amounts, then takes the fee ledger from the report.
    /// Fails without changing anything if the replayed balances or filled
    /// amounts disagree with the report, which means the report was produced
    /// against a different state.
    pub fn apply(&mut self, report: &SimulatorReport, spender: &Address) -> Result<()> {
        if report.reverted {
            return Ok(());
        }
        let mut next = self.clone();
        for item in &report.transfer_items {
            capability_for(item.token_type).execute(&mut next, item, spender)?;
        }
        for fill in report.ring_mined_events.iter().flat_map(|event| &event.fills) {
            next.add_filled(fill.order_hash, checked_add(fill.amount_s, fill.split)?)?;
        }

        let mut mismatches = usize::from(next.balances != report.balances_after);
        mismatches += report
            .filled_amounts_after
            .iter()
            .filter(|(hash, amount)| next.filled(hash) != **amount)
            .count();
        if mismatches > 0 {
            return Err(RingsettleError::ReportMismatch { count: mismatches });
        }
        next.fee_balances = report.fee_balances_after.clone();
        *self = next;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Collaborator interfaces
// ---------------------------------------------------------------------------

impl OrderHashRegistry for LedgerSnapshot {
    fn is_order_hash_registered(&self, owner: &Address, hash: &OrderHash) -> bool {
        self.registered_hashes.contains(&(*owner, *hash))
    }
}

impl OrderBook for LedgerSnapshot {
    fn is_order_submitted(&self, hash: &OrderHash) -> bool {
        self.order_book.contains(hash)
    }
}

impl BrokerRegistry for LedgerSnapshot {
    fn broker_registration(&self, owner: &Address, broker: &Address) -> Option<BrokerRegistration> {
        self.brokers.get(&(*owner, *broker)).copied()
    }
}

impl BrokerInterceptor for LedgerSnapshot {
    fn authorize_trade(
        &self,
        interceptor: &Address,
        request: &TradeAuthorization,
    ) -> std::result::Result<bool, CollaboratorError> {
        match self.interceptors.get(interceptor) {
            Some(InterceptorBehavior::Allow) => Ok(true),
            Some(InterceptorBehavior::Deny) => Ok(false),
            Some(InterceptorBehavior::Limit(limit)) => Ok(request.amount <= *limit),
            Some(InterceptorBehavior::Fail) => Err(CollaboratorError::new(
                format!("interceptor {interceptor}"),
                "call reverted",
            )),
            None => Err(CollaboratorError::new(
                format!("interceptor {interceptor}"),
                "no contract at address",
            )),
        }
    }
}

impl BurnRateRegistry for LedgerSnapshot {
    fn burn_rate(&self, token: &Address) -> BurnRate {
        self.burn_rates.get(token).copied().unwrap_or_default()
    }

    fn rebate_rate(&self, owner: &Address) -> u16 {
        self.rebate_rates.get(owner).copied().unwrap_or(0)
    }
}

impl FilledLedger for LedgerSnapshot {
    fn filled(&self, hash: &OrderHash) -> Amount {
        self.filled.get(hash).copied().unwrap_or(Amount::ZERO)
    }
}

impl CancellationLedger for LedgerSnapshot {
    fn is_cancelled(&self, hash: &OrderHash) -> bool {
        self.cancelled.contains(hash)
    }

    fn cutoff(&self, owner: &Address) -> Option<u64> {
        self.cutoffs.get(owner).copied()
    }

    fn trading_pair_cutoff(
        &self,
        owner: &Address,
        token_s: &Address,
        token_b: &Address,
    ) -> Option<u64> {
        self.pair_cutoffs.get(&(*owner, *token_s, *token_b)).copied()
    }
}

impl FeeLedger for LedgerSnapshot {
    fn fee_balance(&self, owner: &Address, token: &Address) -> Amount {
        self.fee_balance_of(*owner, *token)
    }
}

impl TokenLedger for LedgerSnapshot {
    fn token_type(&self, token: &Address) -> Option<TokenType> {
        self.token_types.get(token).copied()
    }

    fn balance_of(&self, token: &Address, owner: &Address, tranche: &Tranche) -> Amount {
        self.balances.get(&BalanceKey::new(*owner, *token, *tranche))
    }

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn is_operator(&self, token: &Address, holder: &Address, operator: &Address) -> bool {
        self.operators.contains(&(*token, *holder, *operator))
    }

    fn can_send(
        &self,
        token: &Address,
        from: &Address,
        _to: &Address,
        tranche: &Tranche,
        amount: Amount,
    ) -> std::result::Result<bool, CollaboratorError> {
        if self.failing_tokens.contains(token) {
            return Err(CollaboratorError::new(format!("token {token}"), "canSend reverted"));
        }
        if self.send_blocks.contains(&(*token, *from)) {
            return Ok(false);
        }
        Ok(self.balance_of(token, from, tranche) >= amount)
    }
}
