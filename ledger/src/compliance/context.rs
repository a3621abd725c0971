//! The snapshot of a proposed mutation handed to rule modules, and the
//! decision type they render.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{HolderId, JurisdictionCode};

/// The kind of balance mutation under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
    /// Supply creation: no sender, one recipient.
    Mint,
    /// Holder-to-holder movement.
    Transfer,
    /// Supply destruction: one sender, no recipient.
    Burn,
}

/// Everything a rule module may consult about a proposed mutation.
///
/// The ledger resolves balances and jurisdictions from its own state before
/// evaluation so that modules stay self-contained: no module ever reaches
/// back into the ledger or the identity directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferContext {
    /// What kind of mutation this is.
    pub kind: TransferKind,
    /// The debited holder. `None` for mints.
    pub from: Option<HolderId>,
    /// The credited holder. `None` for burns.
    pub to: Option<HolderId>,
    /// Amount in smallest units.
    pub amount: u64,
    /// The recipient's balance before the operation. Zero for burns.
    pub recipient_balance: u64,
    /// The recipient's jurisdiction, if the recipient is registered.
    pub recipient_jurisdiction: Option<JurisdictionCode>,
    /// When the operation is being evaluated. Window-based modules roll
    /// their buckets against this instant.
    pub timestamp: DateTime<Utc>,
}

impl TransferContext {
    /// Builds a mint context.
    pub fn mint(
        to: &str,
        amount: u64,
        recipient_balance: u64,
        recipient_jurisdiction: Option<JurisdictionCode>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: TransferKind::Mint,
            from: None,
            to: Some(to.to_string()),
            amount,
            recipient_balance,
            recipient_jurisdiction,
            timestamp,
        }
    }

    /// Builds a holder-to-holder transfer context.
    pub fn transfer(
        from: &str,
        to: &str,
        amount: u64,
        recipient_balance: u64,
        recipient_jurisdiction: Option<JurisdictionCode>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: TransferKind::Transfer,
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            amount,
            recipient_balance,
            recipient_jurisdiction,
            timestamp,
        }
    }

    /// Builds a burn context.
    pub fn burn(from: &str, amount: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: TransferKind::Burn,
            from: Some(from.to_string()),
            to: None,
            amount,
            recipient_balance: 0,
            recipient_jurisdiction: None,
            timestamp,
        }
    }
}

/// The outcome a rule module (or the whole engine) renders for a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The module has no objection.
    Allow,
    /// The module rejects the mutation, with the module's name and a
    /// human-readable reason for the caller's diagnostics.
    Deny {
        /// Name of the rejecting module.
        module: String,
        /// Why the module rejected.
        reason: String,
    },
}

impl Decision {
    /// Convenience constructor for a rejection.
    pub fn deny(module: &str, reason: impl Into<String>) -> Self {
        Decision::Deny {
            module: module.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`Decision::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}
