//! Integration tests for the compliance engine and its rule modules,
//! exercised through full ledger operations.
//!
//! The central property: a rejection from any module aborts the mutation
//! with the rejecting module's name, and stateful modules never observe
//! the attempt — notify fires only after a commit.

use veris_ledger::compliance::{
    ComplianceEngine, CountryRestrictionRule, Decision, MaxBalanceRule, RuleModule,
    TransferContext, TransferLimitRule,
};
use veris_ledger::{IdentityDirectory, Ledger, LedgerConfig, LedgerError};

/// Helper: ledger with three verified holders; 156 deliberately present so
/// country tests have a live blocked-jurisdiction holder.
fn ledger() -> Ledger {
    let mut identity = IdentityDirectory::new();
    identity.register("alice", 76).unwrap();
    identity.register("bob", 840).unwrap();
    identity.register("wei", 156).unwrap();
    Ledger::new(identity, LedgerConfig::default())
}

// ---------------------------------------------------------------------------
// Country Restriction
// ---------------------------------------------------------------------------

#[test]
fn blocked_jurisdiction_cannot_receive_mints_or_transfers() {
    let mut l = ledger();
    l.compliance_mut()
        .add_module(Box::new(CountryRestrictionRule::with_blocked([156])));
    l.mint("alice", 1_000).unwrap();

    // The same policy binds both inbound paths.
    assert!(matches!(
        l.mint("wei", 100),
        Err(LedgerError::ComplianceRejected { module, .. })
            if module == CountryRestrictionRule::NAME
    ));
    assert!(matches!(
        l.transfer("alice", "wei", 100),
        Err(LedgerError::ComplianceRejected { module, .. })
            if module == CountryRestrictionRule::NAME
    ));
    assert_eq!(l.balance_of("wei"), 0);
    assert_eq!(l.total_supply(), 1_000);
}

#[test]
fn blocked_jurisdiction_holder_can_still_send_and_burn() {
    let mut l = ledger();
    l.mint("wei", 500).unwrap();

    // Block 156 only afterwards: wei is stuck receiving, not sending.
    l.compliance_mut()
        .add_module(Box::new(CountryRestrictionRule::with_blocked([156])));

    l.transfer("wei", "bob", 200).unwrap();
    l.burn("wei", 100).unwrap();
    assert_eq!(l.balance_of("wei"), 200);
}

#[test]
fn unblocking_a_jurisdiction_reopens_the_gate() {
    let mut l = ledger();
    l.compliance_mut()
        .add_module(Box::new(CountryRestrictionRule::with_blocked([156])));

    assert!(l.mint("wei", 100).is_err());

    assert!(l.compliance_mut().remove_module(CountryRestrictionRule::NAME));
    l.mint("wei", 100).unwrap();
    assert_eq!(l.balance_of("wei"), 100);
}

// ---------------------------------------------------------------------------
// Max Balance
// ---------------------------------------------------------------------------

#[test]
fn max_balance_caps_the_post_operation_balance() {
    let mut l = ledger();
    l.compliance_mut()
        .add_module(Box::new(MaxBalanceRule::new(1_000)));

    l.mint("alice", 1_000).unwrap();
    assert!(matches!(
        l.mint("alice", 1),
        Err(LedgerError::ComplianceRejected { module, .. })
            if module == MaxBalanceRule::NAME
    ));

    // Transfers into a capped holder are judged the same way.
    l.mint("bob", 500).unwrap();
    assert!(l.transfer("bob", "alice", 1).is_err());
    l.transfer("alice", "bob", 500).unwrap();
    l.transfer("bob", "alice", 500).unwrap();
    assert_eq!(l.balance_of("alice"), 1_000);
}

// ---------------------------------------------------------------------------
// Transfer Limits (stateful)
// ---------------------------------------------------------------------------

#[test]
fn transfer_limit_accumulates_only_on_committed_transfers() {
    let mut l = ledger();
    l.compliance_mut()
        .add_module(Box::new(TransferLimitRule::new(1_000, 10_000)));
    l.mint("alice", 5_000).unwrap();

    l.transfer("alice", "bob", 600).unwrap();

    // 600 counted. 500 more would breach the daily 1000.
    assert!(matches!(
        l.transfer("alice", "bob", 500),
        Err(LedgerError::ComplianceRejected { module, .. })
            if module == TransferLimitRule::NAME
    ));

    // The rejected 500 left no trace: 400 still fits exactly.
    l.transfer("alice", "bob", 400).unwrap();
    assert_eq!(l.balance_of("bob"), 1_000);
}

#[test]
fn rejections_from_other_modules_do_not_feed_the_limit_counters() {
    let mut l = ledger();
    // Order matters: the limit module sits after the country module and
    // must not see attempts the country module killed.
    l.compliance_mut()
        .add_module(Box::new(CountryRestrictionRule::with_blocked([156])));
    l.compliance_mut()
        .add_module(Box::new(TransferLimitRule::new(1_000, 10_000)));
    l.mint("alice", 5_000).unwrap();

    // Rejected by country restriction, upstream of the limit module.
    assert!(l.transfer("alice", "wei", 900).is_err());

    // The full daily allowance is still available.
    l.transfer("alice", "bob", 1_000).unwrap();
}

#[test]
fn mints_do_not_consume_transfer_allowance() {
    let mut l = ledger();
    l.compliance_mut()
        .add_module(Box::new(TransferLimitRule::new(1_000, 10_000)));

    l.mint("alice", 50_000).unwrap();
    l.burn("alice", 10_000).unwrap();

    // Supply operations dwarf the allowance and yet the full 1000 remains.
    l.transfer("alice", "bob", 1_000).unwrap();
}

// ---------------------------------------------------------------------------
// Engine Semantics
// ---------------------------------------------------------------------------

/// A test module that records whether it was ever evaluated or notified.
struct Probe {
    evaluated: std::sync::Arc<std::sync::atomic::AtomicU32>,
    notified: std::sync::Arc<std::sync::atomic::AtomicU32>,
}

impl RuleModule for Probe {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn evaluate(&self, _ctx: &TransferContext) -> Decision {
        self.evaluated
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Decision::Allow
    }

    fn notify(&mut self, _ctx: &TransferContext) {
        self.notified
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[test]
fn evaluation_short_circuits_before_later_modules() {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    let evaluated = Arc::new(AtomicU32::new(0));
    let notified = Arc::new(AtomicU32::new(0));

    let mut l = ledger();
    l.compliance_mut()
        .add_module(Box::new(CountryRestrictionRule::with_blocked([156])));
    l.compliance_mut().add_module(Box::new(Probe {
        evaluated: Arc::clone(&evaluated),
        notified: Arc::clone(&notified),
    }));
    l.mint("alice", 1_000).unwrap();
    let after_mint = evaluated.load(Ordering::Relaxed);

    // Killed by the country module: the probe is never consulted.
    assert!(l.transfer("alice", "wei", 100).is_err());
    assert_eq!(evaluated.load(Ordering::Relaxed), after_mint);

    // A committed transfer reaches the probe twice: evaluate + notify.
    l.transfer("alice", "bob", 100).unwrap();
    assert_eq!(evaluated.load(Ordering::Relaxed), after_mint + 1);
    assert_eq!(notified.load(Ordering::Relaxed), 2); // mint + transfer
}

#[test]
fn engine_binds_to_exactly_one_ledger() {
    let a = ledger();
    let b = ledger();

    let mut engine = ComplianceEngine::new();
    engine.bind(a.id()).unwrap();
    assert!(engine.bind(b.id()).is_err());
    assert_eq!(engine.bound_ledger(), Some(a.id()));
}

#[test]
fn module_configuration_applies_in_place() {
    let mut l = ledger();
    l.compliance_mut()
        .add_module(Box::new(MaxBalanceRule::new(100)));

    assert!(l.mint("alice", 500).is_err());

    // Raise the cap through the engine's typed configuration handle. The
    // module keeps its position in the evaluation order.
    l.compliance_mut()
        .module_config_mut::<MaxBalanceRule>(MaxBalanceRule::NAME)
        .expect("module installed")
        .set_cap(1_000);

    l.mint("alice", 500).unwrap();
}

#[test]
fn reconfiguring_transfer_limits_preserves_accumulated_counters() {
    let mut l = ledger();
    l.compliance_mut()
        .add_module(Box::new(TransferLimitRule::new(1_000, 10_000)));
    l.mint("alice", 5_000).unwrap();
    l.transfer("alice", "bob", 900).unwrap();

    // Tighten the daily allowance in place: the 900 already spent counts.
    l.compliance_mut()
        .module_config_mut::<TransferLimitRule>(TransferLimitRule::NAME)
        .expect("module installed")
        .set_allowances(1_000, 1_000);

    assert!(l.transfer("alice", "bob", 200).is_err());
    l.transfer("alice", "bob", 100).unwrap();
}
