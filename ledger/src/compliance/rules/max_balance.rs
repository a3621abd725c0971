//! Recipient balance caps.

use serde::{Deserialize, Serialize};

use crate::compliance::context::{Decision, TransferContext};
use crate::compliance::RuleModule;

/// Caps any single holder's balance.
///
/// Rejects when the recipient's balance *after* the operation would exceed
/// the configured cap. Operations without a recipient (burns) always pass.
///
/// Stateless: the post-operation balance is computed from the context, so
/// `notify` is the default no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxBalanceRule {
    cap: u64,
}

impl MaxBalanceRule {
    /// Module name used for registration-order removal and rejections.
    pub const NAME: &'static str = "max_balance";

    /// Creates a rule with the given per-holder cap.
    pub fn new(cap: u64) -> Self {
        Self { cap }
    }

    /// Replaces the cap. Applies to subsequent evaluations only; existing
    /// balances above a lowered cap are grandfathered until they next move.
    pub fn set_cap(&mut self, cap: u64) {
        self.cap = cap;
    }

    /// The current cap.
    pub fn cap(&self) -> u64 {
        self.cap
    }
}

impl RuleModule for MaxBalanceRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(&self, ctx: &TransferContext) -> Decision {
        if ctx.to.is_none() {
            return Decision::Allow;
        }

        match ctx.recipient_balance.checked_add(ctx.amount) {
            Some(after) if after <= self.cap => Decision::Allow,
            Some(after) => Decision::deny(
                Self::NAME,
                format!("resulting balance {after} exceeds cap {}", self.cap),
            ),
            None => Decision::deny(Self::NAME, "resulting balance overflows u64"),
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
