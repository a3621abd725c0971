//! # Snapshot Store
//!
//! Point-in-time balance and supply views without copying the ledger.
//!
//! Conceptually a snapshot is a full balance/supply picture at the instant
//! [`SnapshotStore::snapshot`] was called. The implementation is an
//! append-only per-holder checkpoint list: a balance write while the
//! counter stands at `c` lands in a checkpoint with effective id `c + 1`
//! (updating the open checkpoint in place if one exists), and `snapshot()`
//! simply advances the counter. A historical query walks back to the
//! latest checkpoint with id ≤ the requested snapshot.
//!
//! Immutability falls out of the id discipline: a snapshot id only becomes
//! queryable once the counter has reached it, and from then on every write
//! carries a strictly larger effective id, so nothing can ever alter what
//! `balance_of_at` returns for an id already passed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::HolderId;

/// Identifier of a point-in-time snapshot. Starts at 1.
pub type SnapshotId = u64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by historical queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// The requested id is 0 or exceeds the current snapshot counter.
    #[error("invalid snapshot id {requested} (current counter {current})")]
    InvalidSnapshotId {
        /// The id the caller asked for.
        requested: SnapshotId,
        /// The highest id issued so far.
        current: SnapshotId,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One (snapshot id, value) pair in a holder's or the supply's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Checkpoint {
    /// The first snapshot id at which `value` is the answer.
    id: SnapshotId,
    /// Balance or supply value.
    value: u64,
}

/// The append-only checkpoint store behind historical queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotStore {
    /// Highest snapshot id issued. 0 means none taken yet.
    counter: SnapshotId,
    /// Per-holder balance history, ids strictly increasing per vector.
    balance_history: HashMap<HolderId, Vec<Checkpoint>>,
    /// Total-supply history, ids strictly increasing.
    supply_history: Vec<Checkpoint>,
}

impl SnapshotStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates and returns the next snapshot id.
    ///
    /// Monotonically increasing; the first call returns 1. All balance
    /// values written before this call become immutable for the returned
    /// id and every id below it.
    pub fn snapshot(&mut self) -> SnapshotId {
        self.counter += 1;
        tracing::debug!(id = self.counter, "snapshot taken");
        self.counter
    }

    /// The highest snapshot id issued so far (0 if none).
    pub fn current(&self) -> SnapshotId {
        self.counter
    }

    /// Records a holder's new balance after a committed mutation.
    ///
    /// Called by the ledger on every balance write. Idempotent with respect
    /// to the open window: writes between two `snapshot()` calls collapse
    /// into a single checkpoint carrying the latest value.
    pub fn record_balance(&mut self, holder: &str, value: u64) {
        let effective = self.counter + 1;
        let history = self.balance_history.entry(holder.to_string()).or_default();
        Self::upsert(history, effective, value);
    }

    /// Records the new total supply after a committed mint or burn.
    pub fn record_supply(&mut self, value: u64) {
        let effective = self.counter + 1;
        Self::upsert(&mut self.supply_history, effective, value);
    }

    /// The holder's balance in effect at snapshot `id`.
    ///
    /// Resolved as the latest checkpoint with id ≤ the requested snapshot;
    /// a holder with no checkpoint that early had a zero balance.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidSnapshotId`] if `id` is 0 or
    /// exceeds the current counter.
    pub fn balance_of_at(&self, holder: &str, id: SnapshotId) -> Result<u64, SnapshotError> {
        self.check_id(id)?;
        Ok(self
            .balance_history
            .get(holder)
            .map(|history| Self::lookup(history, id))
            .unwrap_or(0))
    }

    /// The total supply in effect at snapshot `id`.
    ///
    /// # Errors
    ///
    /// Same failure mode as [`balance_of_at`](Self::balance_of_at).
    pub fn total_supply_at(&self, id: SnapshotId) -> Result<u64, SnapshotError> {
        self.check_id(id)?;
        Ok(Self::lookup(&self.supply_history, id))
    }

    fn check_id(&self, id: SnapshotId) -> Result<(), SnapshotError> {
        if id == 0 || id > self.counter {
            return Err(SnapshotError::InvalidSnapshotId {
                requested: id,
                current: self.counter,
            });
        }
        Ok(())
    }

    /// Appends a checkpoint, or updates the open one in place if the
    /// effective id matches. Ids in a history stay strictly increasing.
    fn upsert(history: &mut Vec<Checkpoint>, effective: SnapshotId, value: u64) {
        match history.last_mut() {
            Some(last) if last.id == effective => last.value = value,
            _ => history.push(Checkpoint {
                id: effective,
                value,
            }),
        }
    }

    /// Latest checkpoint with id ≤ requested, or 0 if none exists.
    fn lookup(history: &[Checkpoint], id: SnapshotId) -> u64 {
        // partition_point: first index whose checkpoint id exceeds `id`.
        let idx = history.partition_point(|c| c.id <= id);
        if idx == 0 {
            0
        } else {
            history[idx - 1].value
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
