//! Parsing and aggregation benchmarks
//!
//! Synthetic ten-task runs with random window lengths and crossing
//! epochs, shaped like the sequential benchmark.
//!
//! Run with: cargo bench --bench aggregation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use taskseq_analysis::analysis::{Aggregator, RunParser, TaskIdentityAccumulator};
use taskseq_analysis::config::AnalysisConfig;
use taskseq_analysis::experiment::{ExperimentStore, RunHistory, RunRecord};

const NUM_TASKS: usize = 10;
const RUN_COUNTS: [usize; 3] = [10, 30, 90];

/// Accuracy columns of one random run
fn random_columns(rng: &mut StdRng) -> Vec<(String, Vec<Option<f64>>)> {
    let windows: Vec<usize> = (0..NUM_TASKS).map(|_| rng.gen_range(5..30)).collect();
    let total: usize = windows.iter().sum();
    let starts: Vec<usize> = windows
        .iter()
        .scan(0, |acc, &w| {
            let start = *acc;
            *acc += w;
            Some(start)
        })
        .collect();

    (1..=NUM_TASKS)
        .map(|task| {
            let mut values = vec![None; total];
            for window in task..=NUM_TASKS {
                let len = windows[window - 1];
                let crossing = rng.gen_range(0..len);
                for k in 0..len {
                    let accuracy = if k >= crossing {
                        rng.gen_range(0.951..1.0)
                    } else {
                        rng.gen_range(0.3..0.95)
                    };
                    values[starts[window - 1] + k] = Some(accuracy);
                }
            }
            (format!("Test Accuracy, Query #{task}"), values)
        })
        .collect()
}

fn random_store(runs: usize, seed: u64) -> (ExperimentStore, Vec<RunRecord>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut store = ExperimentStore::new();
    let mut records = Vec::with_capacity(runs);
    for i in 0..runs {
        let run_id = format!("run-{i:03}");
        let mut order: Vec<usize> = (0..30).collect();
        for j in 0..NUM_TASKS {
            let k = rng.gen_range(j..order.len());
            order.swap(j, k);
        }
        order.truncate(NUM_TASKS);

        let run = RunRecord::builder(run_id.as_str(), "bench/sequential-benchmark")
            .query_order(order)
            .build();
        store.add_run(run.clone());
        for (key, values) in random_columns(&mut rng) {
            for (step, value) in values.into_iter().enumerate() {
                if let Some(value) = value {
                    store.log(&run_id, step as u64, &[(key.as_str(), value)]);
                }
            }
        }
        records.push(run);
    }
    (store, records)
}

fn config() -> AnalysisConfig {
    AnalysisConfig::builder()
        .num_tasks(NUM_TASKS)
        .build()
        .expect("valid benchmark config")
}

/// Benchmark parsing one run history into its matrices
fn bench_parse(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let history = RunHistory::from_columns("bench", random_columns(&mut rng)).expect("history");
    let parser = RunParser::new(config());

    c.bench_function("parse_run_10_tasks", |b| {
        b.iter(|| parser.parse(black_box(&history)).expect("parse"));
    });
}

/// Benchmark the full fetch, parse and summarise path
fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_runs");

    for runs in RUN_COUNTS {
        let (store, records) = random_store(runs, 42);
        let aggregator = Aggregator::new(config());
        group.bench_with_input(BenchmarkId::new("store", runs), &records, |b, records| {
            b.iter(|| aggregator.aggregate(&store, black_box(records)).expect("aggregate"));
        });
    }

    group.finish();
}

/// Benchmark mean/std summaries over already parsed runs
fn bench_summarise(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarise_parsed");

    for runs in RUN_COUNTS {
        let (store, records) = random_store(runs, 1337);
        let (_, parsed) = Aggregator::new(config())
            .aggregate_with_matrices(&store, &records)
            .expect("aggregate");
        let mut by_task = TaskIdentityAccumulator::new(30, NUM_TASKS);
        for (matrices, run) in parsed.iter().zip(&records) {
            by_task
                .add_run(&matrices.examples, run.query_order())
                .expect("query order in range");
        }

        group.bench_with_input(BenchmarkId::new("matrices", runs), &parsed, |b, parsed| {
            b.iter(|| Aggregator::summarise(black_box(parsed), &by_task).expect("summarise"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_aggregate, bench_summarise);
criterion_main!(benches);
