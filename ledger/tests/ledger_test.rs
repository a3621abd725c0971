//! Integration tests for the core ledger lifecycle.
//!
//! These exercise full operation sequences across module boundaries:
//! supply conservation under arbitrary mint/burn/transfer interleavings,
//! frozen-balance bounds, identity gating, pause semantics, recovery,
//! and the asset subledger's dual-accounting invariants.

use veris_ledger::{IdentityDirectory, Ledger, LedgerConfig, LedgerError};

/// Helper: a ledger with the given (holder, jurisdiction) pairs registered
/// and verified.
fn ledger_with(holders: &[(&str, u16)]) -> Ledger {
    let mut identity = IdentityDirectory::new();
    for (holder, jurisdiction) in holders {
        identity.register(holder, *jurisdiction).unwrap();
    }
    Ledger::new(identity, LedgerConfig::default())
}

/// Helper: asserts `sum(balances) == total_supply` over the given holders.
fn assert_supply_conserved(ledger: &Ledger, holders: &[&str]) {
    let sum: u64 = holders.iter().map(|h| ledger.balance_of(h)).sum();
    assert_eq!(sum, ledger.total_supply(), "supply conservation violated");
}

// ---------------------------------------------------------------------------
// Supply Conservation
// ---------------------------------------------------------------------------

#[test]
fn supply_equals_balance_sum_after_every_operation() {
    let mut ledger = ledger_with(&[("h1", 76), ("h2", 840), ("h3", 276)]);
    let holders = ["h1", "h2", "h3"];

    ledger.mint("h1", 1_000).unwrap();
    assert_supply_conserved(&ledger, &holders);

    ledger.transfer("h1", "h2", 400).unwrap();
    assert_supply_conserved(&ledger, &holders);

    ledger.mint("h3", 250).unwrap();
    assert_supply_conserved(&ledger, &holders);

    ledger.burn("h2", 100).unwrap();
    assert_supply_conserved(&ledger, &holders);

    ledger.transfer("h2", "h3", 300).unwrap();
    ledger.burn("h3", 550).unwrap();
    assert_supply_conserved(&ledger, &holders);

    assert_eq!(ledger.total_supply(), 800);
}

#[test]
fn failed_operations_leave_supply_untouched() {
    let mut ledger = ledger_with(&[("h1", 76), ("h2", 840)]);
    ledger.mint("h1", 1_000).unwrap();

    // A rejected transfer, burn, and mint in sequence.
    assert!(ledger.transfer("h1", "h2", 2_000).is_err());
    assert!(ledger.burn("h1", 2_000).is_err());
    assert!(ledger.mint("stranger", 1).is_err());

    assert_eq!(ledger.total_supply(), 1_000);
    assert_eq!(ledger.balance_of("h1"), 1_000);
    assert_eq!(ledger.balance_of("h2"), 0);
}

// ---------------------------------------------------------------------------
// Concrete Scenarios
// ---------------------------------------------------------------------------

#[test]
fn mint_1000_to_verified_holder() {
    let mut ledger = ledger_with(&[("h1", 76)]);
    ledger.mint("h1", 1_000).unwrap();

    assert_eq!(ledger.balance_of("h1"), 1_000);
    assert_eq!(ledger.total_supply(), 1_000);
}

#[test]
fn overdrawn_transfer_fails_and_changes_nothing() {
    let mut ledger = ledger_with(&[("h1", 76), ("h2", 840)]);
    ledger.mint("h1", 1_000).unwrap();

    let result = ledger.transfer("h1", "h2", 1_500);
    assert!(matches!(
        result,
        Err(LedgerError::InsufficientUnfrozenBalance {
            available: 1_000,
            requested: 1_500
        })
    ));
    assert_eq!(ledger.balance_of("h1"), 1_000);
    assert_eq!(ledger.balance_of("h2"), 0);
}

#[test]
fn frozen_balance_limits_transfers_to_the_unfrozen_remainder() {
    let mut ledger = ledger_with(&[("h1", 76), ("h2", 840)]);
    ledger.mint("h1", 1_000).unwrap();
    ledger.freeze("h1", 600).unwrap();

    // Only 400 available.
    assert!(ledger.transfer("h1", "h2", 500).is_err());

    ledger.transfer("h1", "h2", 400).unwrap();
    assert_eq!(ledger.balance_of("h1"), 600);
    assert_eq!(ledger.frozen_of("h1"), 600);
    assert_eq!(ledger.available_of("h1"), 0);
}

// ---------------------------------------------------------------------------
// Freeze / Unfreeze
// ---------------------------------------------------------------------------

#[test]
fn freeze_then_unfreeze_restores_prior_state() {
    let mut ledger = ledger_with(&[("h1", 76)]);
    ledger.mint("h1", 1_000).unwrap();
    ledger.freeze("h1", 250).unwrap();
    let before = ledger.frozen_of("h1");

    ledger.freeze("h1", 300).unwrap();
    ledger.unfreeze("h1", 300).unwrap();

    assert_eq!(ledger.frozen_of("h1"), before);
    assert_eq!(ledger.available_of("h1"), 750);
}

#[test]
fn freezing_more_than_the_balance_always_fails() {
    let mut ledger = ledger_with(&[("h1", 76)]);
    ledger.mint("h1", 1_000).unwrap();

    assert!(ledger.freeze("h1", 1_001).is_err());
    assert_eq!(ledger.frozen_of("h1"), 0);

    // Also with a partial freeze already in place.
    ledger.freeze("h1", 800).unwrap();
    assert!(ledger.freeze("h1", 201).is_err());
    assert_eq!(ledger.frozen_of("h1"), 800);
}

#[test]
fn unfreeze_below_zero_fails() {
    let mut ledger = ledger_with(&[("h1", 76)]);
    ledger.mint("h1", 1_000).unwrap();
    ledger.freeze("h1", 100).unwrap();

    assert!(matches!(
        ledger.unfreeze("h1", 150),
        Err(LedgerError::InsufficientFrozenBalance {
            frozen: 100,
            requested: 150
        })
    ));
}

// ---------------------------------------------------------------------------
// Identity Gating
// ---------------------------------------------------------------------------

#[test]
fn every_mutation_involving_an_unverified_party_fails_cleanly() {
    let mut ledger = ledger_with(&[("h1", 76)]);
    ledger.mint("h1", 1_000).unwrap();

    // Unregistered counterparty.
    assert!(matches!(
        ledger.transfer("h1", "ghost", 100),
        Err(LedgerError::IdentityNotVerified(_))
    ));
    assert!(matches!(
        ledger.mint("ghost", 100),
        Err(LedgerError::IdentityNotVerified(_))
    ));

    // De-verified holder: existing balance is stuck until re-verified.
    ledger
        .identity_mut()
        .refresh_verification("h1", false)
        .unwrap();
    assert!(matches!(
        ledger.transfer("h1", "h1", 1),
        Err(LedgerError::IdentityNotVerified(_))
    ));
    assert!(matches!(
        ledger.burn("h1", 1),
        Err(LedgerError::IdentityNotVerified(_))
    ));

    assert_eq!(ledger.balance_of("h1"), 1_000);
    assert_eq!(ledger.total_supply(), 1_000);
}

#[test]
fn removed_holder_is_permanently_blocked_from_moving_funds() {
    let mut ledger = ledger_with(&[("h1", 76), ("h2", 840)]);
    ledger.mint("h1", 1_000).unwrap();

    ledger.identity_mut().remove("h1").unwrap();
    assert!(ledger.transfer("h1", "h2", 100).is_err());

    // Re-verification is refused; recovery is the only way out.
    assert!(ledger
        .identity_mut()
        .refresh_verification("h1", true)
        .is_err());
    ledger.recover("h1", "h2").unwrap();
    assert_eq!(ledger.balance_of("h2"), 1_000);
}

// ---------------------------------------------------------------------------
// Pause
// ---------------------------------------------------------------------------

#[test]
fn pause_rejects_all_mutations_and_unpause_restores_them() {
    let mut ledger = ledger_with(&[("h1", 76), ("h2", 840)]);
    ledger.mint("h1", 1_000).unwrap();

    ledger.pause();
    assert!(ledger.is_paused());
    assert!(matches!(ledger.mint("h1", 1), Err(LedgerError::Paused)));
    assert!(matches!(
        ledger.transfer("h1", "h2", 1),
        Err(LedgerError::Paused)
    ));
    assert!(matches!(ledger.burn("h1", 1), Err(LedgerError::Paused)));
    assert!(matches!(ledger.freeze("h1", 1), Err(LedgerError::Paused)));
    assert!(matches!(ledger.unfreeze("h1", 0), Err(LedgerError::Paused)));
    assert!(matches!(
        ledger.set_address_frozen("h1", true),
        Err(LedgerError::Paused)
    ));
    assert!(matches!(
        ledger.recover("h1", "h2"),
        Err(LedgerError::Paused)
    ));
    assert_eq!(ledger.balance_of("h1"), 1_000);

    ledger.unpause();
    ledger.transfer("h1", "h2", 100).unwrap();
    assert_eq!(ledger.balance_of("h2"), 100);
}

#[test]
fn historical_queries_keep_working_while_paused() {
    let mut ledger = ledger_with(&[("h1", 76)]);
    ledger.mint("h1", 1_000).unwrap();
    let snap = ledger.snapshot();

    ledger.pause();
    assert_eq!(ledger.balance_of_at("h1", snap).unwrap(), 1_000);
    assert_eq!(ledger.total_supply_at(snap).unwrap(), 1_000);
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

#[test]
fn recovery_preserves_balance_frozen_and_asset_tags() {
    let mut ledger = ledger_with(&[("h1", 76), ("h2", 840)]);
    ledger.register_asset("deed-7").unwrap();
    ledger.mint("h1", 1_000).unwrap();
    ledger.mint("h2", 500).unwrap();
    ledger.transfer_with_asset("h2", "h1", 300, "deed-7").unwrap();
    ledger.freeze("h1", 200).unwrap();

    // h1 now holds 1300 (300 tagged), 200 frozen. Key lost — recover to h2.
    ledger.recover("h1", "h2").unwrap();

    assert_eq!(ledger.balance_of("h1"), 0);
    assert_eq!(ledger.balance_of("h2"), 1_500);
    assert_eq!(ledger.frozen_of("h2"), 200);
    assert_eq!(ledger.asset_balance("deed-7", "h1"), 0);
    assert_eq!(ledger.asset_balance("deed-7", "h2"), 300);
    assert_eq!(ledger.total_supply(), 1_500);

    // The recovered identity is dead in both directions.
    assert!(ledger.mint("h1", 1).is_err());
    assert!(ledger.transfer("h2", "h1", 1).is_err());
}

// ---------------------------------------------------------------------------
// Asset Subledger Invariants
// ---------------------------------------------------------------------------

#[test]
fn asset_conservation_and_holder_bound_hold_across_operations() {
    let mut ledger = ledger_with(&[("h1", 76), ("h2", 840), ("h3", 276)]);
    ledger.register_asset("deed-7").unwrap();
    ledger.register_asset("vault-9").unwrap();
    ledger.mint("h1", 2_000).unwrap();

    ledger.transfer_with_asset("h1", "h2", 600, "deed-7").unwrap();
    ledger.transfer_with_asset("h1", "h3", 400, "deed-7").unwrap();
    ledger.transfer_with_asset("h1", "h2", 300, "vault-9").unwrap();
    ledger.burn_asset_tokens("h2", "deed-7", 100).unwrap();

    // Per-asset conservation.
    for asset in ["deed-7", "vault-9"] {
        let holder_sum: u64 = ["h1", "h2", "h3"]
            .iter()
            .map(|h| ledger.asset_balance(asset, h))
            .sum();
        assert_eq!(holder_sum, ledger.asset_total_supply(asset));
    }

    // Per-holder bound: tags never exceed the general balance.
    for holder in ["h1", "h2", "h3"] {
        let tagged: u64 = ["deed-7", "vault-9"]
            .iter()
            .map(|a| ledger.asset_balance(a, holder))
            .sum();
        assert!(tagged <= ledger.balance_of(holder));
    }

    assert_eq!(ledger.asset_total_supply("deed-7"), 900);
    assert_eq!(ledger.asset_total_supply("vault-9"), 300);
}

#[test]
fn plain_debits_cannot_cut_under_a_holders_tagged_total() {
    let mut ledger = ledger_with(&[("h1", 76), ("h2", 840)]);
    ledger.register_asset("deed-7").unwrap();
    ledger.mint("h1", 1_000).unwrap();
    ledger.transfer_with_asset("h1", "h2", 500, "deed-7").unwrap();

    // h2: balance 500, all tagged. No plain transfer or burn may touch it.
    assert!(matches!(
        ledger.transfer("h2", "h1", 1),
        Err(LedgerError::InsufficientAssetCapacity { .. })
    ));
    assert!(matches!(
        ledger.burn("h2", 1),
        Err(LedgerError::InsufficientAssetCapacity { .. })
    ));

    // Burning the tag releases the capacity.
    ledger.burn_asset_tokens("h2", "deed-7", 500).unwrap();
    assert_eq!(ledger.balance_of("h2"), 0);
    assert_eq!(ledger.asset_total_supply("deed-7"), 0);
}

// ---------------------------------------------------------------------------
// Max Supply
// ---------------------------------------------------------------------------

#[test]
fn max_supply_cap_binds_across_mints() {
    let mut identity = IdentityDirectory::new();
    identity.register("h1", 76).unwrap();
    identity.register("h2", 840).unwrap();
    let mut ledger = Ledger::new(
        identity,
        LedgerConfig {
            max_supply: Some(10_000),
        },
    );

    ledger.mint("h1", 6_000).unwrap();
    ledger.mint("h2", 4_000).unwrap();
    assert!(matches!(
        ledger.mint("h1", 1),
        Err(LedgerError::ExceedsMaxSupply { .. })
    ));

    // Burning frees headroom under the cap.
    ledger.burn("h2", 500).unwrap();
    ledger.mint("h1", 500).unwrap();
    assert_eq!(ledger.total_supply(), 10_000);
}
