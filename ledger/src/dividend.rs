//! # Dividend Distribution
//!
//! Pro-rata value distributions pinned to snapshots.
//!
//! A deposit takes a fresh snapshot at that instant, so the payout
//! proportions are fixed by ownership *as of the deposit*: shuffling
//! balances afterwards cannot inflate anyone's share. Each holder can
//! claim each event exactly once.
//!
//! ## Reentrancy
//!
//! Paying a holder may trigger holder-controlled code (the [`PayoutSink`]
//! implementation) that calls back into `claim`. The mitigation is
//! check-effects-interactions ordering: the claimed flag and the claimed
//! total are recorded strictly *before* the sink is invoked, so a reentrant
//! call observes `AlreadyClaimed` and aborts harmlessly.
//!
//! ## Rounding
//!
//! Shares use integer division and round toward zero. The residue, always
//! strictly less than the number of holders in smallest units, stays in
//! the event as permanently undistributed dust; it is never silently lost
//! and never lets claims exceed the deposit.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MAX_CLAIMS_PER_CALL;
use crate::identity::HolderId;
use crate::snapshot::{SnapshotError, SnapshotId, SnapshotStore};

/// Identifier of a dividend event, sequential from 0.
pub type DividendId = u64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by dividend operations.
#[derive(Debug, Error)]
pub enum DividendError {
    /// No event exists with this id.
    #[error("invalid dividend id {0}")]
    InvalidDividendId(DividendId),

    /// This holder already claimed this event.
    #[error("holder {holder} already claimed dividend {dividend}")]
    AlreadyClaimed {
        /// The claiming holder.
        holder: HolderId,
        /// The event in question.
        dividend: DividendId,
    },

    /// The computed share falls below the caller's acceptable minimum.
    #[error("share {share} below minimum acceptable {minimum}")]
    BelowMinimumAcceptable {
        /// The pro-rata share that was computed.
        share: u64,
        /// The floor the caller demanded.
        minimum: u64,
    },

    /// The underlying snapshot query failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

// ---------------------------------------------------------------------------
// Payout seam
// ---------------------------------------------------------------------------

/// The interaction step of a claim: actually delivering value.
///
/// Implementations are external collaborators: a cash treasury, a payment
/// rail, a test recorder. The distributor invokes `pay` only after the
/// claim has been recorded, and `pay` is infallible so a claim commits
/// atomically.
pub trait PayoutSink {
    /// Delivers `amount` (smallest units) to `holder`.
    fn pay(&mut self, holder: &str, amount: u64);
}

/// A sink that accumulates payouts in memory. Useful as a default treasury
/// and in tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingSink {
    /// Every payout in delivery order.
    pub payouts: Vec<(HolderId, u64)>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total value delivered to `holder` across all payouts.
    pub fn total_paid(&self, holder: &str) -> u64 {
        self.payouts
            .iter()
            .filter(|(h, _)| h == holder)
            .map(|(_, amount)| amount)
            .sum()
    }
}

impl PayoutSink for RecordingSink {
    fn pay(&mut self, holder: &str, amount: u64) {
        self.payouts.push((holder.to_string(), amount));
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One deposited distribution, pinned to the snapshot taken at deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendEvent {
    /// Sequential event identifier.
    pub id: DividendId,
    /// The snapshot whose balances fix the payout proportions.
    pub snapshot_id: SnapshotId,
    /// Value deposited for distribution, smallest units.
    pub deposited: u64,
    /// Sum of all shares paid out so far. Never exceeds `deposited`.
    pub total_claimed: u64,
    /// When the deposit happened.
    pub deposited_at: DateTime<Utc>,
    /// Holders who have claimed. Never shrinks.
    claimed: HashSet<HolderId>,
}

impl DividendEvent {
    /// Whether `holder` has claimed this event.
    pub fn has_claimed(&self, holder: &str) -> bool {
        self.claimed.contains(holder)
    }

    /// The undistributed remainder (unclaimed shares plus rounding dust).
    pub fn remaining(&self) -> u64 {
        self.deposited - self.total_claimed
    }
}

/// Manages dividend events and their at-most-once claims.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DividendDistributor {
    events: Vec<DividendEvent>,
}

impl DividendDistributor {
    /// Creates a distributor with no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposits `amount` for distribution, pinning proportions to a fresh
    /// snapshot taken right now. Returns the new event's id.
    pub fn deposit(&mut self, store: &mut SnapshotStore, amount: u64) -> DividendId {
        let snapshot_id = store.snapshot();
        let id = self.events.len() as DividendId;

        self.events.push(DividendEvent {
            id,
            snapshot_id,
            deposited: amount,
            total_claimed: 0,
            deposited_at: Utc::now(),
            claimed: HashSet::new(),
        });

        tracing::info!(dividend = id, snapshot = snapshot_id, amount, "dividend deposited");
        id
    }

    /// Returns the event with the given id, if any.
    pub fn event(&self, id: DividendId) -> Option<&DividendEvent> {
        self.events.get(id as usize)
    }

    /// Number of events ever deposited.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Claims `holder`'s share of event `dividend_id` and delivers it
    /// through `sink`. Returns the paid amount.
    ///
    /// The share is `deposited * balance_at_snapshot / supply_at_snapshot`
    /// with integer division (`u128` intermediates, so the product cannot
    /// overflow). A zero snapshot supply yields a zero share.
    ///
    /// The claimed flag is recorded *before* `sink.pay` runs, so a
    /// reentrant claim from inside the sink fails `AlreadyClaimed`.
    ///
    /// # Errors
    ///
    /// [`DividendError::InvalidDividendId`], [`DividendError::AlreadyClaimed`],
    /// [`DividendError::BelowMinimumAcceptable`], or a snapshot failure.
    pub fn claim(
        &mut self,
        store: &SnapshotStore,
        holder: &str,
        dividend_id: DividendId,
        min_acceptable: u64,
        sink: &mut dyn PayoutSink,
    ) -> Result<u64, DividendError> {
        // Validation pass: nothing below mutates until every check passed.
        let event = self
            .events
            .get(dividend_id as usize)
            .ok_or(DividendError::InvalidDividendId(dividend_id))?;

        if event.claimed.contains(holder) {
            return Err(DividendError::AlreadyClaimed {
                holder: holder.to_string(),
                dividend: dividend_id,
            });
        }

        let balance = store.balance_of_at(holder, event.snapshot_id)?;
        let supply = store.total_supply_at(event.snapshot_id)?;
        let share = pro_rata_share(event.deposited, balance, supply);

        if share < min_acceptable {
            return Err(DividendError::BelowMinimumAcceptable {
                share,
                minimum: min_acceptable,
            });
        }

        // Effects before interaction: record the claim, then pay.
        let event = &mut self.events[dividend_id as usize];
        event.claimed.insert(holder.to_string());
        event.total_claimed += share;

        sink.pay(holder, share);

        tracing::info!(dividend = dividend_id, holder, share, "dividend claimed");
        Ok(share)
    }

    /// Claims every event `holder` has not yet claimed, oldest first, up
    /// to [`MAX_CLAIMS_PER_CALL`] events in one call. Returns the
    /// (event id, paid amount) pairs in claim order.
    ///
    /// Uses `min_acceptable = 0`, so zero-balance events are marked claimed
    /// with a zero payout and never revisited.
    pub fn claim_all_pending(
        &mut self,
        store: &SnapshotStore,
        holder: &str,
        sink: &mut dyn PayoutSink,
    ) -> Result<Vec<(DividendId, u64)>, DividendError> {
        let pending: Vec<DividendId> = self
            .events
            .iter()
            .filter(|e| !e.claimed.contains(holder))
            .map(|e| e.id)
            .take(MAX_CLAIMS_PER_CALL)
            .collect();

        let mut claimed = Vec::with_capacity(pending.len());
        for id in pending {
            let share = self.claim(store, holder, id, 0, sink)?;
            claimed.push((id, share));
        }
        Ok(claimed)
    }
}

/// Integer pro-rata arithmetic: `deposited * balance / supply`, rounding
/// toward zero. Zero supply means nobody held anything at the snapshot,
/// so the share is zero.
fn pro_rata_share(deposited: u64, balance: u64, supply: u64) -> u64 {
    if supply == 0 {
        return 0;
    }
    let share = (deposited as u128 * balance as u128) / supply as u128;
    // balance <= supply, so share <= deposited <= u64::MAX.
    share as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
