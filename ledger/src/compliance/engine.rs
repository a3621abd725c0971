//! The ordered rule-module evaluator bound to exactly one ledger.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use super::context::{Decision, TransferContext};
use super::RuleModule;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by engine administration.
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// `bind` was called on an engine that is already bound to a ledger.
    #[error("compliance engine already bound to ledger {0}")]
    AlreadyBound(Uuid),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Holds an ordered list of [`RuleModule`]s and aggregates their decisions.
///
/// An engine serves exactly one ledger: [`bind`](Self::bind) is one-shot and
/// a second call fails with [`ComplianceError::AlreadyBound`]. Modules are
/// evaluated in registration order and the first rejection short-circuits
/// the walk; approval requires every module to allow.
///
/// Module state is mutated only through the `notify_*` calls the ledger
/// issues after a commit, and through explicit administrative add/remove.
#[derive(Default)]
pub struct ComplianceEngine {
    bound_to: Option<Uuid>,
    modules: Vec<Box<dyn RuleModule>>,
}

impl ComplianceEngine {
    /// Creates an empty, unbound engine.
    pub fn new() -> Self {
        Self {
            bound_to: None,
            modules: Vec::new(),
        }
    }

    /// Binds the engine to a ledger. One-time.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::AlreadyBound`] on a second call, carrying
    /// the id of the ledger the engine already serves.
    pub fn bind(&mut self, ledger_id: Uuid) -> Result<(), ComplianceError> {
        if let Some(existing) = self.bound_to {
            return Err(ComplianceError::AlreadyBound(existing));
        }
        self.bound_to = Some(ledger_id);
        Ok(())
    }

    /// Returns the ledger this engine is bound to, if any.
    pub fn bound_ledger(&self) -> Option<Uuid> {
        self.bound_to
    }

    /// Appends a module to the evaluation order.
    pub fn add_module(&mut self, module: Box<dyn RuleModule>) {
        tracing::debug!(module = module.name(), "compliance module added");
        self.modules.push(module);
    }

    /// Removes the first module with the given name.
    ///
    /// Returns `true` if a module was removed. Later modules keep their
    /// relative order.
    pub fn remove_module(&mut self, name: &str) -> bool {
        match self.modules.iter().position(|m| m.name() == name) {
            Some(index) => {
                self.modules.remove(index);
                tracing::debug!(module = name, "compliance module removed");
                true
            }
            None => false,
        }
    }

    /// Returns a mutable handle to the first module with the given name,
    /// e.g. for wholesale replacement.
    pub fn module_mut(&mut self, name: &str) -> Option<&mut Box<dyn RuleModule>> {
        self.modules.iter_mut().find(|m| m.name() == name)
    }

    /// Returns the first module with the given name downcast to its
    /// concrete type, for configuration setters (blocked countries, caps,
    /// window allowances) that must not disturb accumulated state.
    pub fn module_config_mut<M: RuleModule>(&mut self, name: &str) -> Option<&mut M> {
        self.modules
            .iter_mut()
            .find(|m| m.name() == name)
            .and_then(|m| m.as_any_mut().downcast_mut::<M>())
    }

    /// Module names in evaluation order.
    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Evaluates a proposed mutation against every module in order.
    ///
    /// Short-circuits on the first rejection, returning that module's
    /// decision. An empty module list allows everything.
    pub fn can_transfer(&self, ctx: &TransferContext) -> Decision {
        for module in &self.modules {
            let decision = module.evaluate(ctx);
            if !decision.is_allowed() {
                return decision;
            }
        }
        Decision::Allow
    }

    /// Informs stateful modules of a committed transfer.
    ///
    /// Must be called only after the ledger has fully applied the mutation;
    /// the ledger upholds that contract.
    pub fn notify_transfer(&mut self, ctx: &TransferContext) {
        for module in &mut self.modules {
            module.notify(ctx);
        }
    }

    /// Informs stateful modules of a committed mint.
    pub fn notify_mint(&mut self, ctx: &TransferContext) {
        for module in &mut self.modules {
            module.notify(ctx);
        }
    }

    /// Informs stateful modules of a committed burn.
    pub fn notify_burn(&mut self, ctx: &TransferContext) {
        for module in &mut self.modules {
            module.notify(ctx);
        }
    }
}

impl fmt::Debug for ComplianceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComplianceEngine")
            .field("bound_to", &self.bound_to)
            .field("modules", &self.module_names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::context::TransferKind;
    use chrono::Utc;

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// A module that always allows and counts its notifications.
    struct CountingAllow {
        notified: Arc<AtomicU32>,
    }

    impl RuleModule for CountingAllow {
        fn name(&self) -> &'static str {
            "counting_allow"
        }

        fn evaluate(&self, _ctx: &TransferContext) -> Decision {
            Decision::Allow
        }

        fn notify(&mut self, _ctx: &TransferContext) {
            self.notified.fetch_add(1, Ordering::Relaxed);
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    /// A module that always denies.
    struct AlwaysDeny;

    impl RuleModule for AlwaysDeny {
        fn name(&self) -> &'static str {
            "always_deny"
        }

        fn evaluate(&self, _ctx: &TransferContext) -> Decision {
            Decision::deny("always_deny", "computer says no")
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    fn ctx() -> TransferContext {
        TransferContext {
            kind: TransferKind::Transfer,
            from: Some("alice".into()),
            to: Some("bob".into()),
            amount: 100,
            recipient_balance: 0,
            recipient_jurisdiction: Some(76),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn bind_is_one_shot() {
        let mut engine = ComplianceEngine::new();
        let first = Uuid::new_v4();

        engine.bind(first).unwrap();
        let result = engine.bind(Uuid::new_v4());

        assert!(matches!(result, Err(ComplianceError::AlreadyBound(id)) if id == first));
        assert_eq!(engine.bound_ledger(), Some(first));
    }

    #[test]
    fn empty_engine_allows() {
        let engine = ComplianceEngine::new();
        assert!(engine.can_transfer(&ctx()).is_allowed());
    }

    #[test]
    fn first_rejection_short_circuits() {
        let mut engine = ComplianceEngine::new();
        engine.add_module(Box::new(AlwaysDeny));
        engine.add_module(Box::new(CountingAllow {
            notified: Arc::new(AtomicU32::new(0)),
        }));

        let decision = engine.can_transfer(&ctx());
        assert!(matches!(
            decision,
            Decision::Deny { module, .. } if module == "always_deny"
        ));
    }

    #[test]
    fn remove_module_by_name() {
        let mut engine = ComplianceEngine::new();
        engine.add_module(Box::new(AlwaysDeny));

        assert!(engine.remove_module("always_deny"));
        assert!(!engine.remove_module("always_deny"));
        assert!(engine.can_transfer(&ctx()).is_allowed());
    }

    #[test]
    fn notify_reaches_every_module() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut engine = ComplianceEngine::new();
        engine.add_module(Box::new(CountingAllow {
            notified: Arc::clone(&counter),
        }));

        engine.notify_transfer(&ctx());
        engine.notify_mint(&ctx());
        engine.notify_burn(&ctx());

        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }
}
