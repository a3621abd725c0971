//! # Ledger Module
//!
//! The authoritative balance store and the orchestration of every mutating
//! operation. Layered in two:
//!
//! - [`HoldingsBook`] — the low-level balance/frozen/supply arithmetic.
//!   Checked operations, structured errors, no policy.
//! - [`Ledger`] — the orchestrator. Consults the identity directory and
//!   the compliance engine, enforces pause/recovery/asset-bound policy,
//!   writes snapshot checkpoints, and notifies stateful rule modules
//!   strictly after commit.
//!
//! Every operation follows the validate-then-commit discipline: all
//! failure checks run before the first field mutation, so a failing
//! operation is indistinguishable from one that never happened.

mod book;
mod error;
#[allow(clippy::module_inception)]
mod ledger;

pub use book::HoldingsBook;
pub use error::LedgerError;
pub use ledger::{Ledger, LedgerConfig};
