//! The unified error surface of ledger operations.

use thiserror::Error;

use crate::asset::{AssetError, AssetId};
use crate::compliance::{ComplianceError, Decision};
use crate::dividend::{DividendError, DividendId};
use crate::identity::HolderId;
use crate::snapshot::{SnapshotError, SnapshotId};

/// Errors raised by [`Ledger`](super::Ledger) operations.
///
/// Every variant is detected during the pre-mutation validation pass and
/// is fail-fast: the ledger never retries, and a failing operation leaves
/// no partial state. Variants carry enough structure for a caller to
/// render a precise, typed diagnosis.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A party to the operation is not (or no longer) verified.
    #[error("identity not verified: {0}")]
    IdentityNotVerified(HolderId),

    /// The holder is fully frozen by policy, or permanently blocked after
    /// a recovery.
    #[error("address frozen: {0}")]
    AddressFrozen(HolderId),

    /// The amount exceeds the holder's balance minus their frozen amount.
    #[error("insufficient unfrozen balance: available {available}, requested {requested}")]
    InsufficientUnfrozenBalance {
        /// Balance minus frozen, before the operation.
        available: u64,
        /// The amount the caller asked to move.
        requested: u64,
    },

    /// An unfreeze would take the frozen amount below zero.
    #[error("insufficient frozen balance: frozen {frozen}, requested {requested}")]
    InsufficientFrozenBalance {
        /// Currently frozen amount.
        frozen: u64,
        /// The amount the caller asked to unfreeze.
        requested: u64,
    },

    /// A rule module rejected the mutation.
    #[error("compliance rejected by {module}: {reason}")]
    ComplianceRejected {
        /// Name of the rejecting module.
        module: String,
        /// The module's reason.
        reason: String,
    },

    /// A historical query used an id that was never issued.
    #[error("invalid snapshot id {requested} (current counter {current})")]
    InvalidSnapshotId {
        /// The id the caller asked for.
        requested: SnapshotId,
        /// The highest id issued so far.
        current: SnapshotId,
    },

    /// No dividend event exists with this id.
    #[error("invalid dividend id {0}")]
    InvalidDividendId(DividendId),

    /// The holder already claimed this dividend event.
    #[error("holder {holder} already claimed dividend {dividend}")]
    AlreadyClaimed {
        /// The claiming holder.
        holder: HolderId,
        /// The event in question.
        dividend: DividendId,
    },

    /// The computed dividend share fell below the caller's floor.
    #[error("share {share} below minimum acceptable {minimum}")]
    BelowMinimumAcceptable {
        /// The computed pro-rata share.
        share: u64,
        /// The caller's floor.
        minimum: u64,
    },

    /// A mint would push total supply past the configured cap (or `u64`).
    #[error("exceeds max supply: supply {supply}, minting {amount}, cap {cap}")]
    ExceedsMaxSupply {
        /// Supply before the mint.
        supply: u64,
        /// The amount being minted.
        amount: u64,
        /// The effective cap.
        cap: u64,
    },

    /// The ledger is globally paused.
    #[error("ledger is paused")]
    Paused,

    /// The identifier (holder, asset) is already registered.
    #[error("already registered: {0}")]
    AlreadyRegistered(String),

    /// The compliance engine is already bound to a ledger.
    #[error("compliance engine already bound")]
    AlreadyBound,

    /// The caller lacks the capability class this operation requires.
    /// Raised by the hosting layer, not by the core operations themselves.
    #[error("unauthorized: operation requires the {0} capability")]
    Unauthorized(String),

    /// No asset with this identifier is registered (or the subledger is
    /// not enabled).
    #[error("unknown asset: {0}")]
    UnknownAsset(AssetId),

    /// An operation would leave a holder with more tagged units than
    /// general balance, or remove more tagged units than exist.
    #[error("insufficient asset capacity: available {available}, requested {requested}")]
    InsufficientAssetCapacity {
        /// Units available for the tagged operation.
        available: u64,
        /// Units requested.
        requested: u64,
    },
}

impl LedgerError {
    /// Builds a [`LedgerError::ComplianceRejected`] from an engine decision.
    ///
    /// Callers must only pass denials; an `Allow` decision indicates a
    /// logic error upstream and is reported as a rejection by an
    /// impossible module name to keep the function total.
    pub(crate) fn from_decision(decision: Decision) -> Self {
        match decision {
            Decision::Deny { module, reason } => LedgerError::ComplianceRejected { module, reason },
            Decision::Allow => LedgerError::ComplianceRejected {
                module: "<none>".to_string(),
                reason: "allow decision treated as rejection".to_string(),
            },
        }
    }
}

impl From<SnapshotError> for LedgerError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::InvalidSnapshotId { requested, current } => {
                LedgerError::InvalidSnapshotId { requested, current }
            }
        }
    }
}

impl From<DividendError> for LedgerError {
    fn from(err: DividendError) -> Self {
        match err {
            DividendError::InvalidDividendId(id) => LedgerError::InvalidDividendId(id),
            DividendError::AlreadyClaimed { holder, dividend } => {
                LedgerError::AlreadyClaimed { holder, dividend }
            }
            DividendError::BelowMinimumAcceptable { share, minimum } => {
                LedgerError::BelowMinimumAcceptable { share, minimum }
            }
            DividendError::Snapshot(inner) => inner.into(),
        }
    }
}

impl From<ComplianceError> for LedgerError {
    fn from(err: ComplianceError) -> Self {
        match err {
            ComplianceError::AlreadyBound(_) => LedgerError::AlreadyBound,
        }
    }
}

impl From<AssetError> for LedgerError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::AlreadyRegistered(id) => LedgerError::AlreadyRegistered(id),
            AssetError::UnknownAsset(id) => LedgerError::UnknownAsset(id),
            AssetError::InsufficientTagged {
                tagged, requested, ..
            } => LedgerError::InsufficientAssetCapacity {
                available: tagged,
                requested,
            },
            // Unreachable through ledger paths: tagged totals are bounded
            // by balances, which are bounded by total supply.
            AssetError::Overflow(_) => LedgerError::InsufficientAssetCapacity {
                available: u64::MAX,
                requested: u64::MAX,
            },
        }
    }
}
