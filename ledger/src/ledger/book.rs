//! The low-level balance/frozen/supply book.
//!
//! Pure arithmetic over `HashMap<HolderId, u64>` with checked operations
//! and structured errors. Policy (identity, compliance, pause, recovery)
//! lives one layer up in [`Ledger`](super::Ledger); the book only knows
//! about amounts and the two invariants it can enforce locally:
//! `sum(balances) == total_supply` and `frozen(h) <= balance(h)`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use crate::identity::HolderId;

/// Balance, frozen-amount, and supply storage for one ledger.
///
/// Balance entries are created implicitly at zero and never removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldingsBook {
    balances: HashMap<HolderId, u64>,
    frozen: HashMap<HolderId, u64>,
    total_supply: u64,
}

impl HoldingsBook {
    /// Creates an empty book with zero supply.
    pub fn new() -> Self {
        Self::default()
    }

    /// The holder's balance (0 if never credited).
    pub fn balance_of(&self, holder: &str) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// The holder's frozen amount (0 if never frozen).
    pub fn frozen_of(&self, holder: &str) -> u64 {
        self.frozen.get(holder).copied().unwrap_or(0)
    }

    /// Balance minus frozen: what the holder can actually move.
    pub fn available_of(&self, holder: &str) -> u64 {
        // frozen <= balance is a book invariant, so this cannot underflow.
        self.balance_of(holder) - self.frozen_of(holder)
    }

    /// The current total supply.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Holders with a non-zero balance.
    pub fn active_holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    /// Creates `amount` new units at `holder`, growing total supply.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ExceedsMaxSupply`] if the new supply would
    /// exceed `cap` (or overflow `u64` when no cap is set).
    pub fn mint(&mut self, holder: &str, amount: u64, cap: Option<u64>) -> Result<(), LedgerError> {
        let effective_cap = cap.unwrap_or(u64::MAX);
        let new_supply = match self.total_supply.checked_add(amount) {
            Some(s) if s <= effective_cap => s,
            _ => {
                return Err(LedgerError::ExceedsMaxSupply {
                    supply: self.total_supply,
                    amount,
                    cap: effective_cap,
                })
            }
        };

        // Balance cannot overflow: balance <= total_supply and the new
        // supply fits in u64.
        let new_balance = self.balance_of(holder) + amount;
        self.total_supply = new_supply;
        self.balances.insert(holder.to_string(), new_balance);
        Ok(())
    }

    /// Destroys `amount` units at `holder`, shrinking total supply.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientUnfrozenBalance`] if the amount
    /// exceeds the holder's unfrozen balance.
    pub fn burn(&mut self, holder: &str, amount: u64) -> Result<(), LedgerError> {
        let available = self.available_of(holder);
        if amount > available {
            return Err(LedgerError::InsufficientUnfrozenBalance {
                available,
                requested: amount,
            });
        }

        self.balances
            .insert(holder.to_string(), self.balance_of(holder) - amount);
        self.total_supply -= amount;
        Ok(())
    }

    /// Moves `amount` from `from` to `to` as one atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientUnfrozenBalance`] if the amount
    /// exceeds the sender's unfrozen balance. Nothing moves on failure.
    pub fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<(), LedgerError> {
        let available = self.available_of(from);
        if amount > available {
            return Err(LedgerError::InsufficientUnfrozenBalance {
                available,
                requested: amount,
            });
        }

        self.balances
            .insert(from.to_string(), self.balance_of(from) - amount);
        // Read after the debit so a self-transfer nets to zero. The credit
        // cannot overflow: sum of balances equals total supply.
        self.balances
            .insert(to.to_string(), self.balance_of(to) + amount);
        Ok(())
    }

    /// Freezes an additional `amount` of the holder's balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientUnfrozenBalance`] if the
    /// resulting frozen amount would exceed the balance.
    pub fn freeze(&mut self, holder: &str, amount: u64) -> Result<(), LedgerError> {
        let available = self.available_of(holder);
        if amount > available {
            return Err(LedgerError::InsufficientUnfrozenBalance {
                available,
                requested: amount,
            });
        }

        self.frozen
            .insert(holder.to_string(), self.frozen_of(holder) + amount);
        Ok(())
    }

    /// Releases `amount` of the holder's frozen balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientFrozenBalance`] if the resulting
    /// frozen amount would go below zero.
    pub fn unfreeze(&mut self, holder: &str, amount: u64) -> Result<(), LedgerError> {
        let frozen = self.frozen_of(holder);
        if amount > frozen {
            return Err(LedgerError::InsufficientFrozenBalance {
                frozen,
                requested: amount,
            });
        }

        self.frozen.insert(holder.to_string(), frozen - amount);
        Ok(())
    }

    /// Empties a holder completely, returning `(balance, frozen)`.
    /// Supply is untouched; the caller re-homes the units.
    pub fn drain(&mut self, holder: &str) -> (u64, u64) {
        let balance = self.balances.insert(holder.to_string(), 0).unwrap_or(0);
        let frozen = self.frozen.insert(holder.to_string(), 0).unwrap_or(0);
        (balance, frozen)
    }

    /// Absorbs drained units at a destination holder, preserving the
    /// frozen portion's numeric value. Counterpart of [`drain`](Self::drain).
    pub fn absorb(&mut self, holder: &str, balance: u64, frozen: u64) {
        // Cannot overflow: the units came out of this same book, so the
        // totals stay bounded by total supply.
        self.balances
            .insert(holder.to_string(), self.balance_of(holder) + balance);
        self.frozen
            .insert(holder.to_string(), self.frozen_of(holder) + frozen);
    }

    /// Sum of all balances. Test/diagnostic helper for the supply
    /// conservation invariant.
    pub fn balance_sum(&self) -> u64 {
        self.balances.values().sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
