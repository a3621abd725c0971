// Copyright (c) 2026 Veris Systems. MIT License.
// See LICENSE for details.

//! # VERIS Ledger — Core Library
//!
//! A compliance-gated value ledger for fractional ownership of real-world
//! assets. Every balance-changing operation is validated against an ordered
//! set of pluggable regulatory rules before it is allowed to commit, and the
//! ledger keeps a full set of interacting invariants consistent across an
//! unbounded sequence of serially-applied operations: supply conservation,
//! frozen-balance bounds, per-asset sub-balance bounds, at-most-once dividend
//! claims, and immutable historical snapshots.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of a
//! regulated asset registry:
//!
//! - **identity** — Holder verification status and jurisdiction attributes.
//!   The cryptographic verification of claims happens off-ledger; this is
//!   the directory the ledger consults.
//! - **compliance** — The ordered rule-module engine. Country restrictions,
//!   balance caps, and transfer velocity limits, each independently pluggable.
//! - **ledger** — The authoritative balance/supply store and its mutating
//!   operations: mint, burn, transfer, freeze, recovery, pause.
//! - **snapshot** — Point-in-time balance views without full-ledger copies.
//! - **dividend** — Pro-rata value distributions pinned to snapshots,
//!   claimable exactly once per holder.
//! - **asset** — Secondary accounting that tags portions of a holder's
//!   balance to a specific underlying asset.
//! - **authz** — The capability class required by each operation. The
//!   enforcement mechanism is the caller's responsibility.
//! - **config** — Protocol constants and tuning parameters.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow — `checked_add` and
//!    `checked_sub` everywhere, because wrapping arithmetic and money do
//!    not mix.
//! 2. Validate-then-commit: every failure is detected before the first
//!    field mutation, so a failing operation leaves no trace.
//! 3. Stateful rule modules are notified only after a mutation has fully
//!    committed — a rejected attempt never moves a counter.
//! 4. Every public state type is serializable (serde) for wire transport
//!    and persistent storage.

pub mod asset;
pub mod authz;
pub mod compliance;
pub mod config;
pub mod dividend;
pub mod identity;
pub mod ledger;
pub mod snapshot;

pub use asset::{AssetId, AssetSubledger};
pub use compliance::{ComplianceEngine, Decision, RuleModule, TransferContext, TransferKind};
pub use dividend::{DividendDistributor, DividendEvent, PayoutSink};
pub use identity::{HolderId, IdentityDirectory, JurisdictionCode};
pub use ledger::{Ledger, LedgerConfig, LedgerError};
pub use snapshot::{SnapshotId, SnapshotStore};
