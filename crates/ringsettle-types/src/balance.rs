//! Balance books.
//!
//! A [`BalanceBook`] is an ordered map from `(owner, token, tranche)` to an
//! amount. The same structure records trade-ledger balances and fee-ledger
//! balances (where the tranche is always the default one). Ordering makes
//! before/after snapshots and their serialized form reproducible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::amount::{checked_add, checked_sub};
use crate::{Address, Amount, RingsettleError, Tranche};

/// Key of one balance slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BalanceKey {
    pub owner: Address,
    pub token: Address,
    pub tranche: Tranche,
}

impl BalanceKey {
    #[must_use]
    pub fn new(owner: Address, token: Address, tranche: Tranche) -> Self {
        Self {
            owner,
            token,
            tranche,
        }
    }

    /// Slot in the default tranche.
    #[must_use]
    pub fn fungible(owner: Address, token: Address) -> Self {
        Self::new(owner, token, Tranche::DEFAULT)
    }
}

/// A single serialized balance slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    #[serde(flatten)]
    pub key: BalanceKey,
    pub amount: Amount,
}

/// Ordered balances. Zero slots are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<BalanceEntry>", into = "Vec<BalanceEntry>")]
pub struct BalanceBook {
    balances: BTreeMap<BalanceKey, Amount>,
}

impl BalanceBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &BalanceKey) -> Amount {
        self.balances.get(key).copied().unwrap_or(Amount::ZERO)
    }

    pub fn set(&mut self, key: BalanceKey, amount: Amount) {
        if amount.is_zero() {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, amount);
        }
    }

    pub fn credit(&mut self, key: BalanceKey, amount: Amount) -> Result<(), RingsettleError> {
        let updated = checked_add(self.get(&key), amount)?;
        self.set(key, updated);
        Ok(())
    }

    /// Fails without changing anything if the slot holds less than `amount`.
    pub fn debit(&mut self, key: BalanceKey, amount: Amount) -> Result<(), RingsettleError> {
        let current = self.get(&key);
        let updated = checked_sub(current, amount).map_err(|_| {
            RingsettleError::TransferExecutionFailure {
                reason: format!(
                    "insufficient balance for {} of token {}: need {amount}, have {current}",
                    key.owner, key.token
                ),
            }
        })?;
        self.set(key, updated);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BalanceKey, &Amount)> {
        self.balances.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Total held of `token` across all owners and tranches.
    pub fn total_of(&self, token: &Address) -> Result<Amount, RingsettleError> {
        self.balances
            .iter()
            .filter(|(key, _)| key.token == *token)
            .try_fold(Amount::ZERO, |acc, (_, amount)| checked_add(acc, *amount))
    }

    /// Every token that appears in the book.
    #[must_use]
    pub fn tokens(&self) -> Vec<Address> {
        let mut tokens: Vec<Address> = self.balances.keys().map(|key| key.token).collect();
        tokens.sort();
        tokens.dedup();
        tokens
    }
}

impl From<Vec<BalanceEntry>> for BalanceBook {
    fn from(entries: Vec<BalanceEntry>) -> Self {
        let mut book = Self::new();
        for entry in entries {
            book.set(entry.key, entry.amount);
        }
        book
    }
}

impl From<BalanceBook> for Vec<BalanceEntry> {
    fn from(book: BalanceBook) -> Self {
        book.balances
            .into_iter()
            .map(|(key, amount)| BalanceEntry { key, amount })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(owner: u8, token: u8) -> BalanceKey {
        BalanceKey::fungible(Address::repeat_byte(owner), Address::repeat_byte(token))
    }

    fn amt(n: u64) -> Amount {
        Amount::from(n)
    }

    #[test]
    fn credit_and_debit() {
        let mut book = BalanceBook::new();
        book.credit(key(1, 9), amt(100)).unwrap();
        book.debit(key(1, 9), amt(40)).unwrap();
        assert_eq!(book.get(&key(1, 9)), amt(60));
    }

    #[test]
    fn overdraw_is_transfer_failure_and_leaves_balance() {
        let mut book = BalanceBook::new();
        book.credit(key(1, 9), amt(10)).unwrap();
        let err = book.debit(key(1, 9), amt(11)).unwrap_err();
        assert_eq!(err.revert_reason(), "TRANSFER_EXECUTION_FAILURE");
        assert_eq!(book.get(&key(1, 9)), amt(10));
    }

    #[test]
    fn zero_slots_are_dropped() {
        let mut book = BalanceBook::new();
        book.credit(key(1, 9), amt(10)).unwrap();
        book.debit(key(1, 9), amt(10)).unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn totals_per_token() {
        let mut book = BalanceBook::new();
        book.credit(key(1, 9), amt(10)).unwrap();
        book.credit(key(2, 9), amt(5)).unwrap();
        book.credit(key(2, 8), amt(7)).unwrap();
        assert_eq!(book.total_of(&Address::repeat_byte(9)).unwrap(), amt(15));
        assert_eq!(
            book.tokens(),
            vec![Address::repeat_byte(8), Address::repeat_byte(9)]
        );
    }

    #[test]
    fn serde_roundtrip_as_entry_list() {
        let mut book = BalanceBook::new();
        book.credit(key(1, 9), amt(10)).unwrap();
        book.credit(
            BalanceKey::new(
                Address::repeat_byte(2),
                Address::repeat_byte(9),
                Tranche::from_bytes([3; 32]),
            ),
            amt(4),
        )
        .unwrap();
        let json = serde_json::to_string(&book).unwrap();
        assert!(json.starts_with('['));
        let back: BalanceBook = serde_json::from_str(&json).unwrap();
        assert_eq!(book, back);
    }
}
