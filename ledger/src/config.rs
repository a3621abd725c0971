//! # Ledger Configuration & Constants
//!
//! Every tuning parameter in VERIS lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong.
//!
//! These values are consulted by live code paths (the transfer-limit
//! windows and the dividend claim batch bound in particular), so changing
//! them changes observable behavior for every deployed registry.

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// Ledger core version string, reported by the node's status surface.
pub const LEDGER_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Transfer-Limit Windows
// ---------------------------------------------------------------------------

/// Length of the daily transfer-limit window in seconds.
///
/// A sender's daily bucket restarts the first time an operation is
/// evaluated after this much time has elapsed since the bucket opened;
/// there is no background timer.
pub const DAILY_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Length of the monthly transfer-limit window in seconds.
///
/// Thirty fixed days, not a calendar month. Regulators count in days;
/// calendars count in lawyers.
pub const MONTHLY_WINDOW_SECS: i64 = 30 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Dividend Distribution
// ---------------------------------------------------------------------------

/// Upper bound on the number of dividend events a single
/// `claim_all_pending` call will process.
///
/// Keeps one call from walking an unbounded event history. Callers with
/// more pending events than this simply call again.
pub const MAX_CLAIMS_PER_CALL: usize = 32;
