// Core ledger benchmarks.
//
// Covers the hot paths of a registry under load: gated transfers with a
// full compliance stack installed, snapshot checkpoint lookups at various
// history depths, and dividend share arithmetic.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use veris_ledger::compliance::{CountryRestrictionRule, MaxBalanceRule, TransferLimitRule};
use veris_ledger::dividend::RecordingSink;
use veris_ledger::{IdentityDirectory, Ledger, LedgerConfig};

/// Builds a ledger with `n` verified holders named `h0..h{n-1}`, each
/// holding 1_000_000 units, and the full three-module compliance stack.
fn populated_ledger(n: usize) -> Ledger {
    let mut identity = IdentityDirectory::new();
    for i in 0..n {
        identity.register(&format!("h{i}"), 76).unwrap();
    }
    let mut ledger = Ledger::new(identity, LedgerConfig::default());
    ledger
        .compliance_mut()
        .add_module(Box::new(CountryRestrictionRule::with_blocked([156, 408])));
    ledger
        .compliance_mut()
        .add_module(Box::new(MaxBalanceRule::new(u64::MAX / 2)));
    ledger
        .compliance_mut()
        .add_module(Box::new(TransferLimitRule::new(u64::MAX / 2, u64::MAX / 2)));

    for i in 0..n {
        ledger.mint(&format!("h{i}"), 1_000_000).unwrap();
    }
    ledger
}

fn bench_gated_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/transfer");
    group.throughput(Throughput::Elements(1));

    group.bench_function("three_module_stack", |b| {
        let mut ledger = populated_ledger(64);
        let mut i = 0u64;
        b.iter(|| {
            // Ping-pong a single unit so balances never drain.
            let (from, to) = if i % 2 == 0 { ("h0", "h1") } else { ("h1", "h0") };
            i += 1;
            ledger.transfer(from, to, 1).unwrap();
        });
    });

    group.bench_function("no_modules", |b| {
        let mut identity = IdentityDirectory::new();
        identity.register("h0", 76).unwrap();
        identity.register("h1", 76).unwrap();
        let mut ledger = Ledger::new(identity, LedgerConfig::default());
        ledger.mint("h0", 1_000_000).unwrap();
        let mut i = 0u64;
        b.iter(|| {
            let (from, to) = if i % 2 == 0 { ("h0", "h1") } else { ("h1", "h0") };
            i += 1;
            ledger.transfer(from, to, 1).unwrap();
        });
    });

    group.finish();
}

fn bench_snapshot_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot/balance_of_at");

    for depth in [16u64, 256, 4_096] {
        // One checkpoint per snapshot window: alternate snapshot + mutation.
        let mut ledger = populated_ledger(2);
        for _ in 0..depth {
            ledger.snapshot();
            ledger.transfer("h0", "h1", 1).unwrap();
        }
        let mid = depth / 2;

        group.bench_with_input(BenchmarkId::from_parameter(depth), &mid, |b, &id| {
            b.iter(|| ledger.balance_of_at("h0", id.max(1)).unwrap());
        });
    }

    group.finish();
}

fn bench_dividend_claims(c: &mut Criterion) {
    let mut group = c.benchmark_group("dividend/claim");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_claim", |b| {
        let mut ledger = populated_ledger(64);
        let mut sink = RecordingSink::new();
        // A fresh event per iteration batch would distort timing; instead
        // deposit many events up front and claim one per iteration.
        let ids: Vec<u64> = (0..100_000).map(|_| ledger.deposit_dividend(1_000_000)).collect();
        let mut next = 0usize;
        b.iter(|| {
            let id = ids[next % ids.len()];
            next += 1;
            // Each holder claims each event once; rotate holders too.
            let holder = format!("h{}", next % 64);
            let _ = ledger.claim_dividend(&holder, id, 0, &mut sink);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_gated_transfer,
    bench_snapshot_lookup,
    bench_dividend_claims
);
criterion_main!(benches);
