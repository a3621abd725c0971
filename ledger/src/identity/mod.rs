//! # Identity Module
//!
//! The attribute directory the ledger consults before every mutating
//! operation. Each participant is a [`HolderId`] mapped to a verification
//! flag and a jurisdiction code.
//!
//! The directory deliberately does **not** verify identity claims itself;
//! that is delegated to an external claim verifier which yields a boolean
//! "verified" signal and a jurisdiction code. What lives here is the
//! resulting capability/attribute store:
//!
//! 1. **Registration** — a holder enters the directory with a jurisdiction,
//!    verified from the start (the external verifier has already spoken).
//! 2. **Re-verification** — the external verifier can flip the flag either
//!    way over a holder's life.
//! 3. **Removal** — permanent. The record is never physically deleted, so
//!    historical snapshots that reference the holder keep their meaning;
//!    the holder simply can never be verified again.
//!
//! No operation in this module touches balances.

mod directory;

pub use directory::{HolderRecord, IdentityDirectory, IdentityError};

/// An account-like entity capable of owning ledger balance.
///
/// Free-form address string; the ledger treats it as opaque.
pub type HolderId = String;

/// ISO 3166-1 numeric country code used by policy modules.
pub type JurisdictionCode = u16;
