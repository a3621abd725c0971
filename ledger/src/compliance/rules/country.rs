//! Jurisdiction-based receive restrictions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::compliance::context::{Decision, TransferContext};
use crate::compliance::RuleModule;
use crate::identity::JurisdictionCode;

/// Blocks any operation whose recipient sits in a restricted jurisdiction.
///
/// The counterparty that matters is the one *receiving* units: the
/// recipient of a transfer or mint. Burns have no recipient and always
/// pass. A recipient with no known jurisdiction (unregistered) also passes
/// here; identity gating is the ledger's job, not this module's.
///
/// Stateless: `notify` is the default no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryRestrictionRule {
    blocked: HashSet<JurisdictionCode>,
}

impl CountryRestrictionRule {
    /// Module name used for registration-order removal and rejections.
    pub const NAME: &'static str = "country_restriction";

    /// Creates a rule with no blocked jurisdictions.
    pub fn new() -> Self {
        Self {
            blocked: HashSet::new(),
        }
    }

    /// Creates a rule blocking the given jurisdiction codes.
    pub fn with_blocked(codes: impl IntoIterator<Item = JurisdictionCode>) -> Self {
        Self {
            blocked: codes.into_iter().collect(),
        }
    }

    /// Adds a jurisdiction to the blocked set. Idempotent.
    pub fn block(&mut self, code: JurisdictionCode) {
        self.blocked.insert(code);
    }

    /// Removes a jurisdiction from the blocked set. Idempotent.
    pub fn unblock(&mut self, code: JurisdictionCode) {
        self.blocked.remove(&code);
    }

    /// Returns `true` if the code is currently blocked.
    pub fn is_blocked(&self, code: JurisdictionCode) -> bool {
        self.blocked.contains(&code)
    }
}

impl RuleModule for CountryRestrictionRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(&self, ctx: &TransferContext) -> Decision {
        match ctx.recipient_jurisdiction {
            Some(code) if self.blocked.contains(&code) => Decision::deny(
                Self::NAME,
                format!("recipient jurisdiction {code} is blocked"),
            ),
            _ => Decision::Allow,
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
