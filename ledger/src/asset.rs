//! # Asset Subledger
//!
//! Optional secondary accounting that tags portions of a holder's general
//! balance to a specific underlying asset: the deed, the vault receipt,
//! the share class the units actually represent.
//!
//! Two invariants hold at all times:
//!
//! 1. Per asset: the sum of all holders' tagged balances equals the asset's
//!    recorded total supply.
//! 2. Per holder: the sum of that holder's tagged balances across all
//!    assets never exceeds the holder's general ledger balance. Tags are
//!    a view over real units, never more units.
//!
//! The subledger enforces (1) internally; (2) needs the general balance,
//! so the [`Ledger`](crate::ledger::Ledger) checks it on every path that
//! touches tagged balances (and on plain transfers/burns that would shrink
//! a balance below its tagged total).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::HolderId;

/// Identifier of an underlying asset. Free-form, issuer-assigned.
pub type AssetId = String;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by subledger bookkeeping.
#[derive(Debug, Error)]
pub enum AssetError {
    /// An asset with this identifier is already registered.
    #[error("asset already registered: {0}")]
    AlreadyRegistered(AssetId),

    /// No asset with this identifier exists.
    #[error("unknown asset: {0}")]
    UnknownAsset(AssetId),

    /// A debit would take a tagged balance below zero.
    #[error("insufficient tagged balance for asset {asset}: tagged {tagged}, requested {requested}")]
    InsufficientTagged {
        /// The asset being debited.
        asset: AssetId,
        /// The holder's current tagged amount.
        tagged: u64,
        /// The amount the caller tried to remove.
        requested: u64,
    },

    /// A credit would overflow a tagged total.
    #[error("tagged balance overflow for asset {0}")]
    Overflow(AssetId),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Registry entry for one underlying asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    /// The asset's identifier.
    pub asset_id: AssetId,
    /// Total units currently tagged to this asset across all holders.
    pub total_supply: u64,
}

/// The tagged-balance book: asset registry plus per-asset holder balances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetSubledger {
    assets: HashMap<AssetId, AssetRecord>,
    /// `asset -> holder -> tagged amount`.
    holdings: HashMap<AssetId, HashMap<HolderId, u64>>,
    /// `holder -> sum of tags across all assets`, maintained so the ledger
    /// can check its bounding invariant in O(1).
    tagged_totals: HashMap<HolderId, u64>,
}

impl AssetSubledger {
    /// Creates an empty subledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new asset identifier. Once per id.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::AlreadyRegistered`] on a repeat registration.
    pub fn register_asset(&mut self, asset_id: &str) -> Result<(), AssetError> {
        if self.assets.contains_key(asset_id) {
            return Err(AssetError::AlreadyRegistered(asset_id.to_string()));
        }

        self.assets.insert(
            asset_id.to_string(),
            AssetRecord {
                asset_id: asset_id.to_string(),
                total_supply: 0,
            },
        );
        self.holdings.insert(asset_id.to_string(), HashMap::new());
        Ok(())
    }

    /// Returns `true` if the asset id is registered.
    pub fn is_registered(&self, asset_id: &str) -> bool {
        self.assets.contains_key(asset_id)
    }

    /// Tags `amount` units at `holder` for `asset_id`.
    ///
    /// Pure bookkeeping; the caller is responsible for the per-holder
    /// bound against the general balance.
    ///
    /// # Errors
    ///
    /// [`AssetError::UnknownAsset`] or [`AssetError::Overflow`].
    pub fn credit(&mut self, asset_id: &str, holder: &str, amount: u64) -> Result<(), AssetError> {
        let record = self
            .assets
            .get(asset_id)
            .ok_or_else(|| AssetError::UnknownAsset(asset_id.to_string()))?;

        // Validate both additions before committing either.
        let new_supply = record
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| AssetError::Overflow(asset_id.to_string()))?;

        let current = self
            .holdings
            .get(asset_id)
            .and_then(|h| h.get(holder))
            .copied()
            .unwrap_or(0);
        let new_tagged = current
            .checked_add(amount)
            .ok_or_else(|| AssetError::Overflow(asset_id.to_string()))?;

        let holder_total = self.tagged_totals.get(holder).copied().unwrap_or(0);
        let new_holder_total = holder_total
            .checked_add(amount)
            .ok_or_else(|| AssetError::Overflow(asset_id.to_string()))?;

        self.assets.get_mut(asset_id).expect("checked above").total_supply = new_supply;
        self.holdings
            .get_mut(asset_id)
            .expect("registered asset has a holdings map")
            .insert(holder.to_string(), new_tagged);
        self.tagged_totals
            .insert(holder.to_string(), new_holder_total);
        Ok(())
    }

    /// Removes `amount` tagged units from `holder` for `asset_id`.
    ///
    /// # Errors
    ///
    /// [`AssetError::UnknownAsset`] or [`AssetError::InsufficientTagged`].
    pub fn debit(&mut self, asset_id: &str, holder: &str, amount: u64) -> Result<(), AssetError> {
        if !self.assets.contains_key(asset_id) {
            return Err(AssetError::UnknownAsset(asset_id.to_string()));
        }

        let tagged = self
            .holdings
            .get(asset_id)
            .and_then(|h| h.get(holder))
            .copied()
            .unwrap_or(0);

        if tagged < amount {
            return Err(AssetError::InsufficientTagged {
                asset: asset_id.to_string(),
                tagged,
                requested: amount,
            });
        }

        self.holdings
            .get_mut(asset_id)
            .expect("checked above")
            .insert(holder.to_string(), tagged - amount);
        let record = self.assets.get_mut(asset_id).expect("checked above");
        record.total_supply -= amount;
        let holder_total = self.tagged_totals.get(holder).copied().unwrap_or(0);
        self.tagged_totals
            .insert(holder.to_string(), holder_total - amount);
        Ok(())
    }

    /// Moves every tagged position of `from` to `to`, asset by asset.
    /// Used by ledger recovery so the per-holder bound survives the move.
    pub fn migrate_holder(&mut self, from: &str, to: &str) {
        for holdings in self.holdings.values_mut() {
            if let Some(amount) = holdings.remove(from) {
                if amount > 0 {
                    let dest = holdings.entry(to.to_string()).or_insert(0);
                    *dest = dest.saturating_add(amount);
                }
            }
        }

        if let Some(total) = self.tagged_totals.remove(from) {
            if total > 0 {
                let dest = self.tagged_totals.entry(to.to_string()).or_insert(0);
                *dest = dest.saturating_add(total);
            }
        }
    }

    /// The holder's tagged balance for one asset (0 if unknown asset).
    pub fn asset_balance(&self, asset_id: &str, holder: &str) -> u64 {
        self.holdings
            .get(asset_id)
            .and_then(|h| h.get(holder))
            .copied()
            .unwrap_or(0)
    }

    /// Total units tagged to an asset across all holders (0 if unknown).
    pub fn asset_total_supply(&self, asset_id: &str) -> u64 {
        self.assets
            .get(asset_id)
            .map(|r| r.total_supply)
            .unwrap_or(0)
    }

    /// The holder's tagged total across all assets.
    pub fn tagged_total(&self, holder: &str) -> u64 {
        self.tagged_totals.get(holder).copied().unwrap_or(0)
    }

    /// Registered asset ids, unordered.
    pub fn asset_ids(&self) -> Vec<&AssetId> {
        self.assets.keys().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
