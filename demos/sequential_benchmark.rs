//! Sequential Benchmark Example
//!
//! Logs synthetic baseline and query-modulated runs, aggregates them per
//! condition, refreshes the analysis cache and saves the summary figures.
//!
//! Run with: RUST_LOG=info cargo run --example sequential_benchmark

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use taskseq_analysis::analysis::{
    query_modulated_runs_by_dimension, runs_by_dimension, Aggregator, AnalysisField, Condition,
};
use taskseq_analysis::cache::{AnalysisCache, CachedAnalysis};
use taskseq_analysis::config::AnalysisConfig;
use taskseq_analysis::experiment::{
    ExperimentStore, ProjectRecord, RunRecord, BASELINE_PROJECT, MODULATED_PROJECT,
};
use taskseq_analysis::figure::{
    combined_comparison_plots, comparison_levels, plot_processed_results_all_dimensions,
    Comparison, FigureConfig, PanelStyle,
};
use tracing_subscriber::EnvFilter;

const NUM_TASKS: usize = 5;
const REPLICATIONS: u32 = 3;

/// Log one synthetic run whose tasks get easier the more often they were trained.
fn log_synthetic_run(
    store: &mut ExperimentStore,
    rng: &mut StdRng,
    project: &str,
    run_id: &str,
    description: &str,
    difficulty: f64,
) {
    let mut order: Vec<usize> = (0..30).collect();
    for j in 0..NUM_TASKS {
        let k = rng.gen_range(j..order.len());
        order.swap(j, k);
    }
    order.truncate(NUM_TASKS);

    let run = RunRecord::builder(run_id, project)
        .description(description)
        .query_order(order)
        .build();
    store.add_run(run);

    let mut step = 0_u64;
    for window in 1..=NUM_TASKS {
        let crossings: Vec<usize> = (1..=window)
            .map(|task| {
                let times = (window - task + 1) as f64;
                let epochs = difficulty * 12.0 / times.sqrt() + rng.gen_range(0.0..2.0);
                epochs.round().max(1.0) as usize
            })
            .collect();
        let len = crossings.iter().copied().max().unwrap_or(1) + 1;

        for k in 1..=len {
            let values: Vec<(String, f64)> = crossings
                .iter()
                .enumerate()
                .map(|(i, &crossing)| {
                    let accuracy = if k >= crossing {
                        rng.gen_range(0.955..0.99)
                    } else {
                        0.5 + 0.4 * k as f64 / crossing as f64
                    };
                    (format!("Test Accuracy, Query #{}", i + 1), accuracy)
                })
                .collect();
            let values: Vec<(&str, f64)> = values.iter().map(|(k, v)| (k.as_str(), *v)).collect();
            store.log(run_id, step, &values);
            step += 1;
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Sequential Benchmark Analysis ===\n");

    let mut rng = StdRng::seed_from_u64(2024);
    let mut store = ExperimentStore::new();
    store.add_project(ProjectRecord::new(BASELINE_PROJECT));
    store.add_project(ProjectRecord::new(MODULATED_PROJECT));

    // -------------------------------------------------------------------------
    // 1. Log baseline and query-modulated runs
    // -------------------------------------------------------------------------
    println!("1. Logging synthetic runs...");

    let mut baseline = Vec::new();
    let mut modulated = Vec::new();
    for dimension in 1..=3_u32 {
        for rep in 0..REPLICATIONS {
            let id = dimension * 1000 + rep;
            let run_id = format!("baseline-{id}");
            log_synthetic_run(
                &mut store,
                &mut rng,
                BASELINE_PROJECT,
                &run_id,
                &format!("sequential baseline {id}"),
                1.0,
            );
            baseline.extend(store.get_run(&run_id).cloned());

            for level in [1_u32, 3] {
                let run_id = format!("modulated-{level}-{id}");
                log_synthetic_run(
                    &mut store,
                    &mut rng,
                    MODULATED_PROJECT,
                    &run_id,
                    &format!("conv modulation {level}-{id}"),
                    0.8,
                );
                modulated.extend(store.get_run(&run_id).cloned());
            }
        }
    }
    println!("   Runs: {}, metric samples: {}", store.run_count(), store.metric_count());

    // -------------------------------------------------------------------------
    // 2. Aggregate per condition
    // -------------------------------------------------------------------------
    println!("\n2. Aggregating...");

    let config = AnalysisConfig::builder().num_tasks(NUM_TASKS).build()?;
    let aggregator = Aggregator::new(config);

    let baseline_analyses =
        aggregator.aggregate_conditions(&store, &runs_by_dimension(baseline, 10)?)?;
    let levels = query_modulated_runs_by_dimension(modulated, 10)?;
    let modulated_analyses = aggregator.aggregate_levels(&store, &levels)?;

    let combined = baseline_analyses.get(Condition::Combined);
    println!("   Mean examples to criterion (combined):");
    for row in 0..NUM_TASKS {
        let cells: Vec<String> = (0..NUM_TASKS)
            .map(|col| {
                combined
                    .examples
                    .mean
                    .get(row, col)
                    .map_or_else(|| format!("{:>9}", "."), |v| format!("{v:>9.0}"))
            })
            .collect();
        println!("   {}", cells.join(" "));
    }

    // -------------------------------------------------------------------------
    // 3. Refresh the analysis cache
    // -------------------------------------------------------------------------
    println!("\n3. Caching analyses...");

    let cache_dir = std::env::temp_dir().join("taskseq-analysis-demo");
    let cache = AnalysisCache::new(cache_dir.join("analyses_cache.json"));
    let merged = cache.refresh(BTreeMap::from([
        (
            "baseline".to_string(),
            CachedAnalysis::Conditions(baseline_analyses.clone()),
        ),
        (
            "query_modulated".to_string(),
            CachedAnalysis::Modulated(modulated_analyses.clone()),
        ),
    ]))?;
    println!("   Cache: {} ({} entries)", cache.path().display(), merged.len());

    // -------------------------------------------------------------------------
    // 4. Save figures
    // -------------------------------------------------------------------------
    println!("\n4. Saving figures...");

    let figures = FigureConfig {
        save_path_prefix: cache_dir.join("figures"),
        ..FigureConfig::default()
    };
    let style = PanelStyle {
        shade_error: true,
        legend: true,
        ..PanelStyle::default()
    };

    let saved = figures.save("baseline/all_dimensions", (2, Condition::ALL.len()), |root| {
        plot_processed_results_all_dimensions(
            root,
            &baseline_analyses,
            AnalysisField::LogExamples,
            &Condition::ALL,
            "Baseline",
            &style,
        )
    })?;
    println!("   {}", saved.path.display());

    let levels_grid = (2, comparison_levels(&modulated_analyses, Condition::Combined).len());
    let saved = figures.save("query_modulated/combined_difference", levels_grid, |root| {
        combined_comparison_plots(
            root,
            &baseline_analyses,
            &modulated_analyses,
            Condition::Combined,
            AnalysisField::LogExamples,
            Comparison::Subtract,
            false,
            "Query modulated minus baseline",
            &PanelStyle::default(),
        )
    })?;
    println!("   {}", saved.path.display());
    println!("\n{}", saved.latex.figure);

    Ok(())
}
