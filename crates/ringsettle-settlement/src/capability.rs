//! Per-standard transfer behaviour.
//!
//! Fungible and partitioned tokens differ in how much an owner can spend,
//! in what must be checked before a transfer is planned, and in how the
//! transfer moves balances. Each standard implements [`TransferCapability`];
//! [`capability_for`] selects the implementation from the declared
//! [`TokenType`] tag.

use ringsettle_types::{
    Address, Amount, BalanceKey, Result, RingFailure, RingsettleError, TokenLedger, TokenType,
    Tranche, TransferItem,
};

use crate::ledger::LedgerSnapshot;

pub trait TransferCapability: Sync {
    fn token_type(&self) -> TokenType;

    /// Amount of `token` the `spender` can move out of `owner`'s `tranche`.
    fn spendable(
        &self,
        ledger: &dyn TokenLedger,
        token: &Address,
        owner: &Address,
        tranche: &Tranche,
        spender: &Address,
    ) -> Amount;

    /// Planning-phase check. A failure voids the ring, not the submission.
    fn pre_check(
        &self,
        ledger: &dyn TokenLedger,
        item: &TransferItem,
        operator: &Address,
    ) -> std::result::Result<(), RingFailure>;

    /// Move the tokens. A failure aborts the submission.
    fn execute(&self, ledger: &mut LedgerSnapshot, item: &TransferItem, spender: &Address) -> Result<()>;
}

/// Allowance-based tokens: the owner approves the trade delegate.
#[derive(Debug, Clone, Copy)]
pub struct Fungible;

/// Tranche-based tokens: the holder authorizes the trade delegate as
/// operator, and the token vets each send.
#[derive(Debug, Clone, Copy)]
pub struct Partitioned;

#[must_use]
pub fn capability_for(token_type: TokenType) -> &'static dyn TransferCapability {
    match token_type {
        TokenType::Fungible => &Fungible,
        TokenType::Partitioned => &Partitioned,
    }
}

/// Check that `token` really implements the `declared` standard.
pub fn check_supported(ledger: &dyn TokenLedger, token: &Address, declared: TokenType) -> Result<()> {
    match ledger.token_type(token) {
        Some(actual) if actual == declared => Ok(()),
        Some(actual) => Err(RingsettleError::UnsupportedTokenTypeCombination {
            token: *token,
            reason: format!("declared {declared}, token implements {actual}"),
        }),
        None => Err(RingsettleError::UnsupportedTokenTypeCombination {
            token: *token,
            reason: "unknown token".into(),
        }),
    }
}

fn failing(item: &TransferItem) -> RingsettleError {
    RingsettleError::TransferExecutionFailure {
        reason: format!("token {} rejected transfer from {}", item.token, item.from),
    }
}

impl TransferCapability for Fungible {
    fn token_type(&self) -> TokenType {
        TokenType::Fungible
    }

    fn spendable(
        &self,
        ledger: &dyn TokenLedger,
        token: &Address,
        owner: &Address,
        _tranche: &Tranche,
        spender: &Address,
    ) -> Amount {
        let balance = ledger.balance_of(token, owner, &Tranche::DEFAULT);
        balance.min(ledger.allowance(token, owner, spender))
    }

    fn pre_check(
        &self,
        _ledger: &dyn TokenLedger,
        _item: &TransferItem,
        _operator: &Address,
    ) -> std::result::Result<(), RingFailure> {
        Ok(())
    }

    fn execute(&self, ledger: &mut LedgerSnapshot, item: &TransferItem, spender: &Address) -> Result<()> {
        if ledger.is_failing(&item.token) {
            return Err(failing(item));
        }
        let from = BalanceKey::fungible(item.from, item.token);
        ledger.balances_mut().debit(from, item.amount)?;
        ledger.consume_allowance(item.token, item.from, *spender, item.amount)?;
        ledger
            .balances_mut()
            .credit(BalanceKey::fungible(item.to, item.token), item.amount)
    }
}

impl TransferCapability for Partitioned {
    fn token_type(&self) -> TokenType {
        TokenType::Partitioned
    }

    fn spendable(
        &self,
        ledger: &dyn TokenLedger,
        token: &Address,
        owner: &Address,
        tranche: &Tranche,
        _spender: &Address,
    ) -> Amount {
        ledger.balance_of(token, owner, tranche)
    }

    fn pre_check(
        &self,
        ledger: &dyn TokenLedger,
        item: &TransferItem,
        operator: &Address,
    ) -> std::result::Result<(), RingFailure> {
        if !ledger.is_operator(&item.token, &item.from, operator) {
            return Err(RingFailure::AuthorizationDenied);
        }
        match ledger.can_send(&item.token, &item.from, &item.to, &item.from_tranche, item.amount) {
            Ok(true) => Ok(()),
            Ok(false) => Err(RingFailure::AuthorizationDenied),
            Err(err) => {
                tracing::warn!(token = %item.token, from = %item.from, error = %err, "can_send failed");
                Err(RingFailure::AuthorizationDenied)
            }
        }
    }

    fn execute(&self, ledger: &mut LedgerSnapshot, item: &TransferItem, spender: &Address) -> Result<()> {
        if ledger.is_failing(&item.token) || !ledger.is_operator(&item.token, &item.from, spender) {
            return Err(failing(item));
        }
        let from = BalanceKey::new(item.from, item.token, item.from_tranche);
        ledger.balances_mut().debit(from, item.amount)?;
        ledger
            .balances_mut()
            .credit(BalanceKey::new(item.to, item.token, item.to_tranche), item.amount)
    }
}
