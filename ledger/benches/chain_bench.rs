// Ledger core benchmarks.
//
// Covers block hashing across payload sizes, appends onto a growing chain,
// and full-chain verification.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use mhchain::crypto::block_digest;
use mhchain::storage::Chain;

fn build_chain(len: usize, payload_size: usize) -> Chain {
    let mut chain = Chain::genesis();
    for i in 1..len {
        chain.append(vec![(i % 251) as u8; payload_size]).unwrap();
    }
    chain
}

fn bench_block_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash/block_digest");
    let prev = [0xABu8; 32];

    for size in [0usize, 64, 1024, 64 * 1024] {
        let payload = vec![0x42u8; size];
        group.throughput(Throughput::Bytes(size as u64 + 32));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| block_digest(payload, &prev));
        });
    }
    group.finish();
}

fn bench_append(c: &mut Criterion) {
    c.bench_function("chain/append_256b", |b| {
        let mut chain = Chain::genesis();
        let payload = vec![0x11u8; 256];
        b.iter(|| {
            chain.append(payload.clone()).unwrap();
        });
    });
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain/verify");

    for len in [10usize, 100, 1_000] {
        let chain = build_chain(len, 256);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &chain, |b, chain| {
            b.iter(|| chain.verify().unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_block_digest, bench_append, bench_verify);
criterion_main!(benches);
