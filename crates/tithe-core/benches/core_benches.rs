//! Criterion benchmarks for tithe-core critical operations.
//!
//! Covers: header hashing, delta digests, and the full conservation scan.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tithe_core::genesis::genesis_header;
use tithe_core::ledger::{LedgerStore, MemoryLedger};
use tithe_core::types::{Account, AccountId, LedgerDelta, LedgerHeader};

/// `n` accounts with deterministic ids and 1000 stroops each.
fn make_accounts(n: u64) -> Vec<Account> {
    (0..n)
        .map(|i| Account::new(AccountId::from_seed(&i.to_le_bytes()), 1_000))
        .collect()
}

fn make_ledger(n: u64) -> MemoryLedger {
    let header = LedgerHeader {
        total_coins: n * 1_000,
        ..genesis_header()
    };
    MemoryLedger::new(header, make_accounts(n))
}

fn bench_header_hash(c: &mut Criterion) {
    let header = genesis_header();
    c.bench_function("header_hash", |b| b.iter(|| black_box(&header).hash()));
}

fn bench_delta_digest(c: &mut Criterion) {
    let mut delta = LedgerDelta::new(1);
    for account in make_accounts(2_000) {
        delta.put_account(account);
    }
    c.bench_function("delta_digest_2000_accounts", |b| {
        b.iter(|| black_box(&delta).digest())
    });
}

fn bench_conservation_scan(c: &mut Criterion) {
    let ledger = make_ledger(100_000);
    c.bench_function("conservation_scan_100k", |b| {
        b.iter(|| black_box(&ledger).check_conservation())
    });
}

criterion_group!(benches, bench_header_hash, bench_delta_digest, bench_conservation_scan);
criterion_main!(benches);
