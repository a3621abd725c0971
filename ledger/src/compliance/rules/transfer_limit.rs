//! Per-sender transfer velocity limits over rolling day/month windows.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::compliance::context::{Decision, TransferContext, TransferKind};
use crate::compliance::RuleModule;
use crate::config::{DAILY_WINDOW_SECS, MONTHLY_WINDOW_SECS};
use crate::identity::HolderId;

/// One accumulation window for one sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Bucket {
    /// When this window opened.
    window_start: DateTime<Utc>,
    /// Total transferred out within the window.
    total: u64,
}

impl Bucket {
    fn new(opened_at: DateTime<Utc>) -> Self {
        Self {
            window_start: opened_at,
            total: 0,
        }
    }

    /// Whether the window had fully elapsed by `now`.
    fn elapsed(&self, now: DateTime<Utc>, window_secs: i64) -> bool {
        now.signed_duration_since(self.window_start) >= Duration::seconds(window_secs)
    }

    /// The total that counts against the allowance at `now`: zero once
    /// the window has elapsed, even before any operation resets it.
    fn effective_total(&self, now: DateTime<Utc>, window_secs: i64) -> u64 {
        if self.elapsed(now, window_secs) {
            0
        } else {
            self.total
        }
    }
}

/// Per-sender outbound totals for the two windows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SenderCounters {
    day: Bucket,
    month: Bucket,
}

/// Limits each sender's outbound transfer volume per day and per month.
///
/// The windows are rolling, not calendar-aligned: a sender's daily bucket
/// opens at their first counted transfer and restarts at the first
/// operation evaluated after 24 hours have fully elapsed; there is no
/// background timer doing resets.
///
/// Only holder-to-holder transfers count. Mints have no sender and burns
/// move nothing between holders, so neither consumes allowance.
///
/// Stateful, but carefully so: [`evaluate`](RuleModule::evaluate) computes
/// the rolled-over view without touching the buckets, and only
/// [`notify`](RuleModule::notify), which the ledger calls strictly after
/// a commit, performs the roll and accumulates. A rejected attempt
/// therefore never moves a counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferLimitRule {
    daily_allowance: u64,
    monthly_allowance: u64,
    counters: HashMap<HolderId, SenderCounters>,
}

impl TransferLimitRule {
    /// Module name used for registration-order removal and rejections.
    pub const NAME: &'static str = "transfer_limit";

    /// Creates a rule with the given per-sender allowances.
    pub fn new(daily_allowance: u64, monthly_allowance: u64) -> Self {
        Self {
            daily_allowance,
            monthly_allowance,
            counters: HashMap::new(),
        }
    }

    /// Replaces both allowances. Existing bucket totals are retained and
    /// judged against the new allowances on the next evaluation.
    pub fn set_allowances(&mut self, daily: u64, monthly: u64) {
        self.daily_allowance = daily;
        self.monthly_allowance = monthly;
    }

    /// The configured (daily, monthly) allowances.
    pub fn allowances(&self) -> (u64, u64) {
        (self.daily_allowance, self.monthly_allowance)
    }

    /// The sender's currently counted (daily, monthly) totals as of `now`.
    pub fn counted_totals(&self, sender: &str, now: DateTime<Utc>) -> (u64, u64) {
        match self.counters.get(sender) {
            Some(c) => (
                c.day.effective_total(now, DAILY_WINDOW_SECS),
                c.month.effective_total(now, MONTHLY_WINDOW_SECS),
            ),
            None => (0, 0),
        }
    }

    /// Whether this context counts against the limits at all.
    fn counts(ctx: &TransferContext) -> Option<&HolderId> {
        match ctx.kind {
            TransferKind::Transfer => ctx.from.as_ref(),
            TransferKind::Mint | TransferKind::Burn => None,
        }
    }
}

impl RuleModule for TransferLimitRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(&self, ctx: &TransferContext) -> Decision {
        let Some(sender) = Self::counts(ctx) else {
            return Decision::Allow;
        };

        let (day_total, month_total) = self.counted_totals(sender, ctx.timestamp);

        match day_total.checked_add(ctx.amount) {
            Some(after) if after <= self.daily_allowance => {}
            _ => {
                return Decision::deny(
                    Self::NAME,
                    format!(
                        "daily allowance exceeded: {day_total} counted, {} requested, {} allowed",
                        ctx.amount, self.daily_allowance
                    ),
                )
            }
        }

        match month_total.checked_add(ctx.amount) {
            Some(after) if after <= self.monthly_allowance => Decision::Allow,
            _ => Decision::deny(
                Self::NAME,
                format!(
                    "monthly allowance exceeded: {month_total} counted, {} requested, {} allowed",
                    ctx.amount, self.monthly_allowance
                ),
            ),
        }
    }

    fn notify(&mut self, ctx: &TransferContext) {
        let Some(sender) = Self::counts(ctx) else {
            return;
        };
        let now = ctx.timestamp;

        let counters = self.counters.entry(sender.clone()).or_insert(SenderCounters {
            day: Bucket::new(now),
            month: Bucket::new(now),
        });

        if counters.day.elapsed(now, DAILY_WINDOW_SECS) {
            counters.day = Bucket::new(now);
        }
        if counters.month.elapsed(now, MONTHLY_WINDOW_SECS) {
            counters.month = Bucket::new(now);
        }

        counters.day.total = counters.day.total.saturating_add(ctx.amount);
        counters.month.total = counters.month.total.saturating_add(ctx.amount);
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
