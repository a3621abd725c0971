//! The orchestrator: policy-gated mutations over the holdings book.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::book::HoldingsBook;
use super::error::LedgerError;
use crate::asset::AssetSubledger;
use crate::compliance::{ComplianceEngine, TransferContext};
use crate::dividend::{DividendDistributor, DividendId, PayoutSink};
use crate::identity::{HolderId, IdentityDirectory};
use crate::snapshot::{SnapshotId, SnapshotStore};

/// Construction-time parameters for a ledger.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Hard cap on total supply. `None` means only `u64` bounds apply.
    pub max_supply: Option<u64>,
}

/// The compliance-gated ledger.
///
/// Owns the identity directory, the compliance engine (bound at
/// construction), the holdings book, the snapshot store, the dividend
/// distributor, and, when enabled, the asset subledger. All mutating
/// operations are serially applied: each either fully commits or fully
/// aborts, and validation always completes before the first mutation.
pub struct Ledger {
    id: Uuid,
    config: LedgerConfig,
    identity: IdentityDirectory,
    compliance: ComplianceEngine,
    book: HoldingsBook,
    snapshots: SnapshotStore,
    dividends: DividendDistributor,
    assets: Option<AssetSubledger>,
    /// Holders fully frozen by policy. Reversible.
    address_frozen: HashSet<HolderId>,
    /// Holders emptied by recovery. Permanent, blocks both directions.
    recovered: HashSet<HolderId>,
    paused: bool,
}

impl Ledger {
    /// Creates a ledger with an empty book and a freshly bound, empty
    /// compliance engine.
    pub fn new(identity: IdentityDirectory, config: LedgerConfig) -> Self {
        let id = Uuid::new_v4();
        let mut compliance = ComplianceEngine::new();
        // Binding a fresh engine cannot fail.
        compliance
            .bind(id)
            .expect("fresh compliance engine is unbound");

        Self {
            id,
            config,
            identity,
            compliance,
            book: HoldingsBook::new(),
            snapshots: SnapshotStore::new(),
            dividends: DividendDistributor::new(),
            assets: None,
            address_frozen: HashSet::new(),
            recovered: HashSet::new(),
            paused: false,
        }
    }

    /// This ledger's identifier, as seen by the compliance engine binding.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Replaces the compliance engine with a pre-configured one, binding
    /// it to this ledger.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyBound`] if the engine already serves
    /// another ledger; the current engine stays installed in that case.
    pub fn install_compliance(&mut self, mut engine: ComplianceEngine) -> Result<(), LedgerError> {
        engine.bind(self.id)?;
        self.compliance = engine;
        Ok(())
    }

    /// Read access to the compliance engine.
    pub fn compliance(&self) -> &ComplianceEngine {
        &self.compliance
    }

    /// Administrative access to the compliance engine (add/remove modules,
    /// configuration setters).
    pub fn compliance_mut(&mut self) -> &mut ComplianceEngine {
        &mut self.compliance
    }

    /// Read access to the identity directory.
    pub fn identity(&self) -> &IdentityDirectory {
        &self.identity
    }

    /// Administrative access to the identity directory.
    pub fn identity_mut(&mut self) -> &mut IdentityDirectory {
        &mut self.identity
    }

    /// Switches on the asset subledger. Idempotent; existing tags survive
    /// repeated calls.
    pub fn enable_asset_subledger(&mut self) {
        if self.assets.is_none() {
            self.assets = Some(AssetSubledger::new());
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The holder's balance.
    pub fn balance_of(&self, holder: &str) -> u64 {
        self.book.balance_of(holder)
    }

    /// The holder's frozen amount.
    pub fn frozen_of(&self, holder: &str) -> u64 {
        self.book.frozen_of(holder)
    }

    /// Balance minus frozen.
    pub fn available_of(&self, holder: &str) -> u64 {
        self.book.available_of(holder)
    }

    /// Current total supply.
    pub fn total_supply(&self) -> u64 {
        self.book.total_supply()
    }

    /// Holders with a non-zero balance.
    pub fn active_holder_count(&self) -> usize {
        self.book.active_holder_count()
    }

    /// Whether the ledger is globally paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the holder is fully frozen by policy or recovered.
    pub fn is_address_frozen(&self, holder: &str) -> bool {
        self.address_frozen.contains(holder) || self.recovered.contains(holder)
    }

    /// The highest snapshot id issued so far (0 if none).
    pub fn current_snapshot(&self) -> SnapshotId {
        self.snapshots.current()
    }

    /// The holder's balance at a past snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidSnapshotId`] for id 0 or an id beyond
    /// the current counter.
    pub fn balance_of_at(&self, holder: &str, id: SnapshotId) -> Result<u64, LedgerError> {
        Ok(self.snapshots.balance_of_at(holder, id)?)
    }

    /// Total supply at a past snapshot.
    ///
    /// # Errors
    ///
    /// Same failure mode as [`balance_of_at`](Self::balance_of_at).
    pub fn total_supply_at(&self, id: SnapshotId) -> Result<u64, LedgerError> {
        Ok(self.snapshots.total_supply_at(id)?)
    }

    /// The holder's tagged balance for one asset (0 when the subledger is
    /// disabled or the asset unknown).
    pub fn asset_balance(&self, asset_id: &str, holder: &str) -> u64 {
        self.assets
            .as_ref()
            .map(|a| a.asset_balance(asset_id, holder))
            .unwrap_or(0)
    }

    /// Units tagged to an asset across all holders.
    pub fn asset_total_supply(&self, asset_id: &str) -> u64 {
        self.assets
            .as_ref()
            .map(|a| a.asset_total_supply(asset_id))
            .unwrap_or(0)
    }

    /// A dividend event, if it exists.
    pub fn dividend_event(&self, id: DividendId) -> Option<&crate::dividend::DividendEvent> {
        self.dividends.event(id)
    }

    // -----------------------------------------------------------------------
    // Supply operations
    // -----------------------------------------------------------------------

    /// Creates `amount` units at `holder`.
    ///
    /// # Errors
    ///
    /// `Paused`, `AddressFrozen`, `IdentityNotVerified`,
    /// `ExceedsMaxSupply`, or `ComplianceRejected`. No state changes on
    /// failure.
    pub fn mint(&mut self, holder: &str, amount: u64) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        self.ensure_transactable(holder)?;
        self.ensure_verified(holder)?;

        // Cap validation up front so compliance modules never see a mint
        // the book would refuse.
        let effective_cap = self.config.max_supply.unwrap_or(u64::MAX);
        match self.book.total_supply().checked_add(amount) {
            Some(s) if s <= effective_cap => {}
            _ => {
                return Err(LedgerError::ExceedsMaxSupply {
                    supply: self.book.total_supply(),
                    amount,
                    cap: effective_cap,
                })
            }
        }

        let ctx = TransferContext::mint(
            holder,
            amount,
            self.book.balance_of(holder),
            self.identity.jurisdiction_of(holder),
            Utc::now(),
        );
        let decision = self.compliance.can_transfer(&ctx);
        if !decision.is_allowed() {
            return Err(LedgerError::from_decision(decision));
        }

        // Commit.
        self.book.mint(holder, amount, self.config.max_supply)?;
        self.snapshots
            .record_balance(holder, self.book.balance_of(holder));
        self.snapshots.record_supply(self.book.total_supply());
        self.compliance.notify_mint(&ctx);

        tracing::info!(holder, amount, supply = self.book.total_supply(), "minted");
        Ok(())
    }

    /// Destroys `amount` units at `holder`.
    ///
    /// # Errors
    ///
    /// `Paused`, `AddressFrozen`, `InsufficientUnfrozenBalance`,
    /// `IdentityNotVerified`, `InsufficientAssetCapacity` (subledger
    /// enabled and the burn would cut under the holder's tagged total),
    /// or `ComplianceRejected`.
    pub fn burn(&mut self, holder: &str, amount: u64) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        self.ensure_transactable(holder)?;
        self.ensure_available(holder, amount)?;
        self.ensure_verified(holder)?;
        self.ensure_untagged_capacity(holder, amount)?;

        let ctx = TransferContext::burn(holder, amount, Utc::now());
        let decision = self.compliance.can_transfer(&ctx);
        if !decision.is_allowed() {
            return Err(LedgerError::from_decision(decision));
        }

        // Commit.
        self.book.burn(holder, amount)?;
        self.snapshots
            .record_balance(holder, self.book.balance_of(holder));
        self.snapshots.record_supply(self.book.total_supply());
        self.compliance.notify_burn(&ctx);

        tracing::info!(holder, amount, supply = self.book.total_supply(), "burned");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Transfers
    // -----------------------------------------------------------------------

    /// Moves `amount` from `from` to `to` as one atomic step.
    ///
    /// # Errors
    ///
    /// `Paused`, `AddressFrozen` (either side fully frozen or recovered),
    /// `InsufficientUnfrozenBalance`, `IdentityNotVerified` (either side),
    /// `InsufficientAssetCapacity` (sender would cut under their tagged
    /// total), or `ComplianceRejected`. Both balances are untouched on
    /// failure.
    pub fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<(), LedgerError> {
        let ctx = self.validate_transfer(from, to, amount)?;

        // Commit.
        self.book.transfer(from, to, amount)?;
        self.snapshots
            .record_balance(from, self.book.balance_of(from));
        self.snapshots.record_balance(to, self.book.balance_of(to));
        self.compliance.notify_transfer(&ctx);

        tracing::info!(from, to, amount, "transferred");
        Ok(())
    }

    /// Moves `amount` of `from`'s general balance to `to`, tagging it to
    /// `asset_id` at the destination.
    ///
    /// # Errors
    ///
    /// Everything [`transfer`](Self::transfer) can raise, plus
    /// `UnknownAsset` for an unregistered asset (or a disabled subledger).
    pub fn transfer_with_asset(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
        asset_id: &str,
    ) -> Result<(), LedgerError> {
        match &self.assets {
            Some(assets) if assets.is_registered(asset_id) => {}
            _ => return Err(LedgerError::UnknownAsset(asset_id.to_string())),
        }

        let ctx = self.validate_transfer(from, to, amount)?;

        // Commit. Both steps were validated above: the book transfer by
        // the available check, the tag credit by the supply bound.
        self.book.transfer(from, to, amount)?;
        self.assets
            .as_mut()
            .expect("subledger checked enabled")
            .credit(asset_id, to, amount)?;
        self.snapshots
            .record_balance(from, self.book.balance_of(from));
        self.snapshots.record_balance(to, self.book.balance_of(to));
        self.compliance.notify_transfer(&ctx);

        tracing::info!(from, to, amount, asset = asset_id, "transferred with asset tag");
        Ok(())
    }

    /// Burns `amount` of `holder`'s units tagged to `asset_id`, removing
    /// the tag and the general balance together.
    ///
    /// # Errors
    ///
    /// `Paused`, `UnknownAsset`, `InsufficientAssetCapacity` (tagged
    /// amount too small), `AddressFrozen`,
    /// `InsufficientUnfrozenBalance`, `IdentityNotVerified`, or
    /// `ComplianceRejected`.
    pub fn burn_asset_tokens(
        &mut self,
        holder: &str,
        asset_id: &str,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;

        let tagged = match &self.assets {
            Some(assets) if assets.is_registered(asset_id) => {
                assets.asset_balance(asset_id, holder)
            }
            _ => return Err(LedgerError::UnknownAsset(asset_id.to_string())),
        };
        if amount > tagged {
            return Err(LedgerError::InsufficientAssetCapacity {
                available: tagged,
                requested: amount,
            });
        }

        self.ensure_transactable(holder)?;
        self.ensure_available(holder, amount)?;
        self.ensure_verified(holder)?;

        let ctx = TransferContext::burn(holder, amount, Utc::now());
        let decision = self.compliance.can_transfer(&ctx);
        if !decision.is_allowed() {
            return Err(LedgerError::from_decision(decision));
        }

        // Commit. Both mutations were validated above.
        self.assets
            .as_mut()
            .expect("subledger checked enabled")
            .debit(asset_id, holder, amount)?;
        self.book.burn(holder, amount)?;
        self.snapshots
            .record_balance(holder, self.book.balance_of(holder));
        self.snapshots.record_supply(self.book.total_supply());
        self.compliance.notify_burn(&ctx);

        tracing::info!(holder, amount, asset = asset_id, "burned tagged units");
        Ok(())
    }

    /// Registers a new asset in the subledger, enabling it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyRegistered`] for a repeated id.
    pub fn register_asset(&mut self, asset_id: &str) -> Result<(), LedgerError> {
        self.enable_asset_subledger();
        self.assets
            .as_mut()
            .expect("subledger just enabled")
            .register_asset(asset_id)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Freezes, recovery, pause
    // -----------------------------------------------------------------------

    /// Freezes an additional `amount` of the holder's balance.
    ///
    /// # Errors
    ///
    /// `Paused`, or `InsufficientUnfrozenBalance` if the resulting frozen
    /// amount would exceed the balance.
    pub fn freeze(&mut self, holder: &str, amount: u64) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        self.book.freeze(holder, amount)?;
        tracing::info!(holder, amount, frozen = self.book.frozen_of(holder), "froze");
        Ok(())
    }

    /// Releases `amount` of the holder's frozen balance.
    ///
    /// # Errors
    ///
    /// `Paused`, or `InsufficientFrozenBalance`.
    pub fn unfreeze(&mut self, holder: &str, amount: u64) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        self.book.unfreeze(holder, amount)?;
        tracing::info!(holder, amount, frozen = self.book.frozen_of(holder), "unfroze");
        Ok(())
    }

    /// Fully freezes or unfreezes a holder by policy.
    ///
    /// A fully frozen holder can neither send nor receive, regardless of
    /// partial frozen amounts. Reversible, unlike recovery.
    ///
    /// # Errors
    ///
    /// `Paused`.
    pub fn set_address_frozen(&mut self, holder: &str, frozen: bool) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        if frozen {
            self.address_frozen.insert(holder.to_string());
        } else {
            self.address_frozen.remove(holder);
        }
        tracing::info!(holder, frozen, "address freeze updated");
        Ok(())
    }

    /// Moves `from`'s entire holdings to `to`, balance and frozen portion
    /// alike, preserving the frozen amount's numeric value, and marks
    /// `from` permanently non-transactable. Asset tags migrate along.
    ///
    /// Used when a holder's key material is compromised or lost. The
    /// compliance modules are not consulted: recovery is a forced
    /// administrative rescue, not a market transfer.
    ///
    /// # Errors
    ///
    /// `Paused`; `AddressFrozen` if `from` was already recovered, if the
    /// destination is blocked, or if `from == to` (recovering in place
    /// would immediately strand the units); `IdentityNotVerified` if the
    /// destination is unverified.
    pub fn recover(&mut self, from: &str, to: &str) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        if from == to || self.recovered.contains(from) {
            return Err(LedgerError::AddressFrozen(from.to_string()));
        }
        if self.is_address_frozen(to) {
            return Err(LedgerError::AddressFrozen(to.to_string()));
        }
        self.ensure_verified(to)?;

        // Commit.
        let (balance, frozen) = self.book.drain(from);
        self.book.absorb(to, balance, frozen);
        if let Some(assets) = self.assets.as_mut() {
            assets.migrate_holder(from, to);
        }
        self.recovered.insert(from.to_string());
        self.snapshots.record_balance(from, 0);
        self.snapshots.record_balance(to, self.book.balance_of(to));

        tracing::warn!(from, to, balance, frozen, "holder recovered");
        Ok(())
    }

    /// Raises the global pause flag. Idempotent. While paused, every
    /// mutating operation fails `Paused` and leaves state untouched.
    pub fn pause(&mut self) {
        self.paused = true;
        tracing::warn!("ledger paused");
    }

    /// Clears the global pause flag. Idempotent.
    pub fn unpause(&mut self) {
        self.paused = false;
        tracing::info!("ledger unpaused");
    }

    // -----------------------------------------------------------------------
    // Snapshots & dividends
    // -----------------------------------------------------------------------

    /// Takes a new snapshot and returns its id. Read-only with respect to
    /// balances, so it works while paused.
    pub fn snapshot(&mut self) -> SnapshotId {
        self.snapshots.snapshot()
    }

    /// Deposits `amount` for pro-rata distribution, pinned to a fresh
    /// snapshot taken at this instant. Returns the dividend event id.
    pub fn deposit_dividend(&mut self, amount: u64) -> DividendId {
        self.dividends.deposit(&mut self.snapshots, amount)
    }

    /// Claims `holder`'s share of a dividend event through `sink`.
    /// Returns the paid amount.
    ///
    /// # Errors
    ///
    /// `InvalidDividendId`, `AlreadyClaimed`, or
    /// `BelowMinimumAcceptable`.
    pub fn claim_dividend(
        &mut self,
        holder: &str,
        dividend_id: DividendId,
        min_acceptable: u64,
        sink: &mut dyn PayoutSink,
    ) -> Result<u64, LedgerError> {
        Ok(self
            .dividends
            .claim(&self.snapshots, holder, dividend_id, min_acceptable, sink)?)
    }

    /// Claims every pending dividend for `holder`, bounded per call.
    /// Returns the (event id, amount) pairs claimed.
    ///
    /// # Errors
    ///
    /// Propagates the first claim failure, if any.
    pub fn claim_all_pending(
        &mut self,
        holder: &str,
        sink: &mut dyn PayoutSink,
    ) -> Result<Vec<(DividendId, u64)>, LedgerError> {
        Ok(self.dividends.claim_all_pending(&self.snapshots, holder, sink)?)
    }

    // -----------------------------------------------------------------------
    // Validation helpers
    // -----------------------------------------------------------------------

    fn ensure_not_paused(&self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        Ok(())
    }

    fn ensure_transactable(&self, holder: &str) -> Result<(), LedgerError> {
        if self.is_address_frozen(holder) {
            return Err(LedgerError::AddressFrozen(holder.to_string()));
        }
        Ok(())
    }

    fn ensure_verified(&self, holder: &str) -> Result<(), LedgerError> {
        if !self.identity.is_verified(holder) {
            return Err(LedgerError::IdentityNotVerified(holder.to_string()));
        }
        Ok(())
    }

    fn ensure_available(&self, holder: &str, amount: u64) -> Result<(), LedgerError> {
        let available = self.book.available_of(holder);
        if amount > available {
            return Err(LedgerError::InsufficientUnfrozenBalance {
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    /// With the subledger enabled, rejects debits that would leave the
    /// holder's balance below their tagged total.
    fn ensure_untagged_capacity(&self, holder: &str, amount: u64) -> Result<(), LedgerError> {
        let Some(assets) = &self.assets else {
            return Ok(());
        };
        let tagged = assets.tagged_total(holder);
        let balance = self.book.balance_of(holder);
        // balance >= tagged is the subledger invariant.
        let untagged = balance - tagged;
        if amount > untagged {
            return Err(LedgerError::InsufficientAssetCapacity {
                available: untagged,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Shared validation for plain and asset-tagged transfers. Returns the
    /// compliance context so commit paths can reuse it for notification.
    fn validate_transfer(
        &self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<TransferContext, LedgerError> {
        self.ensure_not_paused()?;
        self.ensure_transactable(from)?;
        self.ensure_transactable(to)?;
        self.ensure_available(from, amount)?;
        self.ensure_verified(from)?;
        self.ensure_verified(to)?;
        self.ensure_untagged_capacity(from, amount)?;

        let ctx = TransferContext::transfer(
            from,
            to,
            amount,
            self.book.balance_of(to),
            self.identity.jurisdiction_of(to),
            Utc::now(),
        );
        let decision = self.compliance.can_transfer(&ctx);
        if !decision.is_allowed() {
            return Err(LedgerError::from_decision(decision));
        }
        Ok(ctx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
