//! Identity tree and game setup benchmarks
//!
//! Run with: cargo bench

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use werewolf_node::{
    core::hash::Digest,
    game::{Game, GameConfig},
    proof::{IdentitySecret, IdentityTree, InMemoryLedger, MasterSecret},
};

fn leaves(count: usize) -> Vec<Digest> {
    (0..count).map(|_| IdentitySecret::generate().leaf()).collect()
}

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("identity_tree_build");

    for count in [8usize, 64, 1024] {
        let leaves = leaves(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &leaves, |b, leaves| {
            b.iter(|| IdentityTree::build(black_box(leaves)).unwrap())
        });
    }

    group.finish();
}

fn bench_proof_and_verify(c: &mut Criterion) {
    let leaves = leaves(1024);
    let tree = IdentityTree::build(&leaves).unwrap();
    let root = tree.root();

    c.bench_function("identity_tree_proof", |b| {
        b.iter(|| tree.proof(black_box(517)).unwrap())
    });

    let path = tree.proof(517).unwrap();
    c.bench_function("identity_tree_verify", |b| {
        b.iter(|| path.verify(black_box(&root), black_box(&leaves[517])))
    });
}

fn bench_game_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("game_create");
    let master = MasterSecret::from_bytes([7; 32]);

    for count in [16usize, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                Game::create(
                    [1; 32],
                    GameConfig::new(count, count / 4),
                    &master,
                    [0; 32],
                    Arc::new(InMemoryLedger::new()),
                )
                .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tree_build, bench_proof_and_verify, bench_game_setup);
criterion_main!(benches);
