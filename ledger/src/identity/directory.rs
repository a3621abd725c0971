//! The holder attribute directory: registration, verification status,
//! jurisdiction lookups, and permanent removal.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{HolderId, JurisdictionCode};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during identity directory operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// A record already exists for this holder.
    #[error("holder already registered: {0}")]
    AlreadyRegistered(HolderId),

    /// The holder has never been registered.
    #[error("holder not registered: {0}")]
    NotRegistered(HolderId),

    /// The holder was removed; removal is permanent and the record can
    /// never be re-verified or modified.
    #[error("holder permanently removed: {0}")]
    PermanentlyRemoved(HolderId),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single holder's attribute record.
///
/// Created on registration and retained forever: "removal" only clears the
/// verification flag, so snapshots taken while the holder owned balance
/// remain meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderRecord {
    /// The holder this record describes.
    pub holder: HolderId,
    /// Whether the external claim verifier currently vouches for this holder.
    pub verified: bool,
    /// ISO 3166-1 numeric jurisdiction code.
    pub jurisdiction: JurisdictionCode,
    /// Set once the holder is removed; a removed holder can never be
    /// verified again.
    pub removed: bool,
    /// Timestamp of registration.
    pub registered_at: DateTime<Utc>,
    /// Timestamp of the most recent attribute change.
    pub updated_at: DateTime<Utc>,
}

/// The directory of holder attributes consulted by the ledger.
///
/// A pure capability/attribute store: `HashMap<HolderId, HolderRecord>`
/// plus the registration/removal rules. Never mutates balances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityDirectory {
    records: HashMap<HolderId, HolderRecord>,
}

impl IdentityDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Registers a holder under the given jurisdiction.
    ///
    /// The holder enters the directory verified; registration only happens
    /// after the external claim verifier has accepted the holder's claims.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::AlreadyRegistered`] if a record exists for
    /// this holder, including records of removed holders.
    pub fn register(
        &mut self,
        holder: &str,
        jurisdiction: JurisdictionCode,
    ) -> Result<(), IdentityError> {
        if self.records.contains_key(holder) {
            return Err(IdentityError::AlreadyRegistered(holder.to_string()));
        }

        let now = Utc::now();
        self.records.insert(
            holder.to_string(),
            HolderRecord {
                holder: holder.to_string(),
                verified: true,
                jurisdiction,
                removed: false,
                registered_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    /// Removes a holder. Permanent.
    ///
    /// Sets `verified` to false and marks the record removed. The record
    /// itself stays in the directory so historical snapshot queries keep
    /// resolving; the holder can never be re-verified.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotRegistered`] for an unknown holder.
    /// Removing an already-removed holder is a no-op success.
    pub fn remove(&mut self, holder: &str) -> Result<(), IdentityError> {
        let record = self
            .records
            .get_mut(holder)
            .ok_or_else(|| IdentityError::NotRegistered(holder.to_string()))?;

        record.verified = false;
        record.removed = true;
        record.updated_at = Utc::now();
        Ok(())
    }

    /// Applies a fresh signal from the external claim verifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotRegistered`] for an unknown holder and
    /// [`IdentityError::PermanentlyRemoved`] for a removed one: removal
    /// wins over any later verifier signal.
    pub fn refresh_verification(
        &mut self,
        holder: &str,
        verified: bool,
    ) -> Result<(), IdentityError> {
        let record = self
            .records
            .get_mut(holder)
            .ok_or_else(|| IdentityError::NotRegistered(holder.to_string()))?;

        if record.removed {
            return Err(IdentityError::PermanentlyRemoved(holder.to_string()));
        }

        record.verified = verified;
        record.updated_at = Utc::now();
        Ok(())
    }

    /// Updates a holder's jurisdiction (relocation, re-domiciliation).
    ///
    /// # Errors
    ///
    /// Same failure modes as [`refresh_verification`](Self::refresh_verification).
    pub fn update_jurisdiction(
        &mut self,
        holder: &str,
        jurisdiction: JurisdictionCode,
    ) -> Result<(), IdentityError> {
        let record = self
            .records
            .get_mut(holder)
            .ok_or_else(|| IdentityError::NotRegistered(holder.to_string()))?;

        if record.removed {
            return Err(IdentityError::PermanentlyRemoved(holder.to_string()));
        }

        record.jurisdiction = jurisdiction;
        record.updated_at = Utc::now();
        Ok(())
    }

    /// Returns `true` if the holder is currently verified.
    ///
    /// Unknown and removed holders are both unverified.
    pub fn is_verified(&self, holder: &str) -> bool {
        self.records.get(holder).map(|r| r.verified).unwrap_or(false)
    }

    /// Returns the holder's jurisdiction code, or `None` if unregistered.
    ///
    /// Removed holders keep their last jurisdiction; policy modules may
    /// still need it when reasoning about historical state.
    pub fn jurisdiction_of(&self, holder: &str) -> Option<JurisdictionCode> {
        self.records.get(holder).map(|r| r.jurisdiction)
    }

    /// Returns the full record for a holder, if any.
    pub fn record(&self, holder: &str) -> Option<&HolderRecord> {
        self.records.get(holder)
    }

    /// Returns the number of records in the directory (removed included).
    pub fn holder_count(&self) -> usize {
        self.records.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
