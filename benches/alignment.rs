//! Benchmarks for cluster alignment.
//!
//! Compares the Hungarian solver against greedy assignment on square cost
//! matrices, and times full document scoring on synthetic annotations.
//! With `--features parallel` the document benchmark runs on rayon.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use typealign::cluster::group_documents;
use typealign::eval::{AssignmentSolver, CostMatrix, Evaluator, GreedyAssignment, Hungarian, ScoringConfig};
use typealign::events::EventLog;
use typealign::mention::{Mention, MentionKey};
use typealign::types::Ontology;

/// Costs in `0..50` from a 64-bit linear congruential generator seeded by `seed`.
fn cost_matrix(size: usize, seed: u64) -> CostMatrix {
    let mut state = seed;
    let mut matrix = CostMatrix::filled(size, 0);
    for row in 0..size {
        for col in 0..size {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            matrix.set(row, col, ((state >> 33) % 50) as i64);
        }
    }
    matrix
}

/// `documents` documents of `entities` clusters, system clusters shifted by one slot.
fn annotations(documents: usize, entities: usize) -> (Vec<Mention>, Vec<Mention>) {
    const TYPES: [&str; 4] = ["PER.Politician", "PER.Athlete", "ORG.Company", "GPE.City"];
    let mut gold = Vec::new();
    let mut system = Vec::new();
    for doc in 0..documents {
        let document_id = format!("D{:04}", doc);
        for entity in 0..entities {
            for slot in 0..3u64 {
                let begin = (entity as u64 * 3 + slot) * 10;
                let key = MentionKey::new(document_id.as_str(), begin, begin + 5);
                gold.push(
                    Mention::new(format!("g{}-{}", entity, slot), format!("E{}", entity), key.clone())
                        .with_types([TYPES[entity % TYPES.len()]]),
                );
                let shifted = (entity + slot as usize) % entities;
                system.push(
                    Mention::new(format!("s{}-{}", entity, slot), format!("S{}", shifted), key)
                        .with_types([TYPES[shifted % TYPES.len()]])
                        .with_confidence(0.5 + 0.1 * slot as f64),
                );
            }
        }
    }
    (gold, system)
}

fn bench_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("assignment");
    for &size in &[8usize, 32, 128] {
        let costs = cost_matrix(size, size as u64);
        group.bench_with_input(BenchmarkId::new("hungarian", size), &costs, |b, costs| {
            b.iter(|| black_box(Hungarian.solve(black_box(costs))))
        });
        group.bench_with_input(BenchmarkId::new("greedy", size), &costs, |b, costs| {
            b.iter(|| black_box(GreedyAssignment.solve(black_box(costs))))
        });
    }
    group.finish();
}

fn bench_documents(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_documents");
    group.sample_size(10);
    let evaluator = Evaluator::new(ScoringConfig::default());
    for &documents in &[10usize, 100] {
        let (gold, system) = annotations(documents, 12);
        let Ok(grouped) = group_documents(gold, system, &Ontology::default()) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(documents), &grouped, |b, grouped| {
            b.iter(|| {
                let events = EventLog::default();
                black_box(evaluator.evaluate_documents(grouped, &events).total_rows())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_solvers, bench_documents);
criterion_main!(benches);
