//! # playrandom Performance Benchmarks
//!
//! Measures the hot paths of a selection cycle on a large library.
//!
//! ## Benchmark Categories
//!
//! - **Selection**: newest and random picks over 10k candidates
//! - **Ledger**: loading a long history file and membership checks
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench selection
//! cargo bench ledger
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::hint::black_box;
use std::time::Duration;
use tempfile::TempDir;

use playrandom::candidates::CandidateSet;
use playrandom::ledger::Ledger;
use playrandom::selector::{AgeSource, SelectionContext, Selector};

/// Deterministic pseudo-ages so no filesystem is involved.
struct HashedAges;

impl AgeSource for HashedAges {
    fn age(&self, path: &str) -> Duration {
        let hash = path.bytes().fold(7u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
        Duration::from_secs(hash % 1200)
    }
}

fn library(size: usize) -> CandidateSet {
    let paths = (0..size)
        .map(|i| format!("/media/Artist{}/Album{}/Track{i:05}.mp3", i / 100, i / 10))
        .collect();
    CandidateSet::new(paths, &[]).expect("non-empty library")
}

/// Ledger holding every `stride`-th candidate.
fn played(candidates: &CandidateSet, stride: usize) -> Ledger {
    let mut ledger = Ledger::in_memory();
    for path in candidates.iter().step_by(stride) {
        ledger.record(path).expect("in-memory record");
    }
    ledger
}

fn benchmark_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");

    for size in [1_000, 10_000] {
        let candidates = library(size);

        group.bench_with_input(BenchmarkId::new("newest_pick", size), &candidates, |b, candidates| {
            b.iter_batched(
                || {
                    let selector = Selector::with_age_source(
                        StdRng::seed_from_u64(1),
                        SelectionContext {
                            newest_threshold: Duration::from_secs(u64::MAX / 2),
                            ..SelectionContext::default()
                        },
                        Box::new(HashedAges),
                    );
                    (selector, played(candidates, 3))
                },
                |(mut selector, mut ledger)| black_box(selector.pick(candidates, &mut ledger)),
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("random_pick", size), &candidates, |b, candidates| {
            let mut selector = Selector::with_age_source(
                StdRng::seed_from_u64(1),
                SelectionContext {
                    newest_threshold: Duration::ZERO,
                    ..SelectionContext::default()
                },
                Box::new(HashedAges),
            );
            let mut ledger = played(candidates, 2);
            b.iter(|| black_box(selector.pick(candidates, &mut ledger)))
        });
    }

    group.finish();
}

fn benchmark_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger");

    let dir = TempDir::new().expect("Failed to create temp directory");
    let file = dir.path().join(".playrandoms");
    let history: String = (0..20_000)
        .map(|i| format!("{} /media/Artist{}/Track {i:05}.mkv\n", 1_700_000_000 + i, i / 100))
        .collect();
    fs::write(&file, history).expect("Failed to write ledger");

    group.bench_function("load_20k", |b| b.iter(|| black_box(Ledger::load(&file))));

    let ledger = Ledger::load(&file);
    group.bench_function("contains", |b| {
        b.iter(|| {
            black_box(ledger.contains("/media/Artist100/Track 10000.mkv"));
            black_box(ledger.contains("/media/not/there.mkv"))
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_selection, benchmark_ledger);

criterion_main!(benches);
