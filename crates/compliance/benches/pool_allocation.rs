use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use fueleu_compliance::{allocate, plan_consumption, LedgerEntry};
use fueleu_core::RouteId;

/// Alternating donors/recipients with a small positive pool total.
fn pool_members(size: usize) -> Vec<(RouteId, f64)> {
    (0..size)
        .map(|i| {
            let id = RouteId::new(format!("R{i:05}")).unwrap();
            let magnitude = 1_000_000.0 + (i % 97) as f64 * 10_000.0;
            let cb = if i % 2 == 0 { magnitude * 1.05 } else { -magnitude };
            (id, cb)
        })
        .collect()
}

fn bench_greedy_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_allocation");

    for size in [2usize, 16, 256, 4_096] {
        let members = pool_members(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &members, |b, members| {
            b.iter(|| allocate(black_box(members.clone())).unwrap());
        });
    }

    group.finish();
}

fn bench_ledger_consumption(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_consumption");

    for size in [10usize, 1_000] {
        let owner = RouteId::new("R002").unwrap();
        let entries: Vec<LedgerEntry> = (0..size)
            .map(|i| LedgerEntry::bank(owner.clone(), 2000 + (i % 30) as i32, 1_000.0).unwrap())
            .collect();
        let amount = 1_000.0 * size as f64 / 2.0;

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &entries, |b, entries| {
            b.iter(|| plan_consumption(black_box(entries), amount, 2031).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_greedy_allocation, bench_ledger_consumption);
criterion_main!(benches);
