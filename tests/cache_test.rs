//! Analysis cache tests: merge, persistence and timestamped backups

mod common;

use std::collections::BTreeMap;
use std::fs;

use common::{log_run, run};
use taskseq_analysis::analysis::{runs_by_dimension, Aggregator, AnalysisSet, ConditionAnalyses};
use taskseq_analysis::cache::{AnalysisCache, CacheMap, CachedAnalysis};
use taskseq_analysis::config::AnalysisConfig;
use taskseq_analysis::experiment::ExperimentStore;

fn analysis(crossing: usize) -> AnalysisSet {
    let mut store = ExperimentStore::new();
    let r = run("r", "baseline 1000", vec![0, 1, 2]);
    log_run(&mut store, &r, &[3, 4, 4], move |_, _| Some(crossing));
    Aggregator::new(AnalysisConfig::builder().num_tasks(3).build().unwrap())
        .aggregate(&store, &[r])
        .unwrap()
}

fn entry(key: &str, value: CachedAnalysis) -> CacheMap {
    BTreeMap::from([(key.to_string(), value)])
}

fn backups(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != "cache.json")
        .collect();
    names.sort();
    names
}

#[test]
fn test_refresh_creates_file_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let cache = AnalysisCache::new(dir.path().join("caches").join("cache.json"));

    let value = CachedAnalysis::Analysis(analysis(1));
    let merged = cache.refresh(entry("baseline", value.clone())).unwrap();
    assert_eq!(merged.len(), 1);

    let loaded = cache.load().unwrap();
    assert_eq!(loaded.get("baseline"), Some(&value));
    assert!(backups(&dir.path().join("caches")).is_empty());
}

#[test]
fn test_second_refresh_merges_and_backs_up() {
    let dir = tempfile::tempdir().unwrap();
    let cache = AnalysisCache::new(dir.path().join("cache.json"));

    cache
        .refresh(entry("first", CachedAnalysis::Analysis(analysis(1))))
        .unwrap();
    let merged = cache
        .refresh(entry("second", CachedAnalysis::Analysis(analysis(2))))
        .unwrap();
    assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["first", "second"]);

    let names = backups(dir.path());
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("cache_"));
    assert!(names[0].ends_with(".json"));

    let backup = AnalysisCache::new(dir.path().join(&names[0])).load().unwrap();
    assert_eq!(backup.keys().collect::<Vec<_>>(), vec!["first"]);
}

#[test]
fn test_refresh_overwrites_existing_key() {
    let dir = tempfile::tempdir().unwrap();
    let cache = AnalysisCache::new(dir.path().join("cache.json"));

    cache
        .refresh(entry("baseline", CachedAnalysis::Analysis(analysis(1))))
        .unwrap();
    let newer = CachedAnalysis::Analysis(analysis(3));
    cache.refresh(entry("baseline", newer.clone())).unwrap();

    assert_eq!(cache.load().unwrap().get("baseline"), Some(&newer));
}

#[test]
fn test_rapid_refreshes_keep_every_backup() {
    let dir = tempfile::tempdir().unwrap();
    let cache = AnalysisCache::new(dir.path().join("cache.json"));

    for i in 0..4 {
        cache
            .refresh(entry(&format!("k{i}"), CachedAnalysis::Analysis(analysis(1))))
            .unwrap();
    }
    assert_eq!(backups(dir.path()).len(), 3);
    assert_eq!(cache.load().unwrap().len(), 4);
}

#[test]
fn test_condition_analyses_survive_unset_cells() {
    let mut store = ExperimentStore::new();
    let runs = vec![
        run("a", "baseline 1000", vec![0, 1, 2]),
        run("b", "baseline 2000", vec![0, 1, 2]),
        run("c", "baseline 3000", vec![0, 1, 2]),
    ];
    for r in &runs {
        log_run(&mut store, r, &[3, 3, 3], |_, _| Some(1));
    }
    let buckets = runs_by_dimension(runs, 5).unwrap();
    let analyses = Aggregator::new(AnalysisConfig::builder().num_tasks(3).build().unwrap())
        .aggregate_conditions(&store, &buckets)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let cache = AnalysisCache::new(dir.path().join("cache.json"));
    let value = CachedAnalysis::Conditions(analyses);
    cache.refresh(entry("conditions", value.clone())).unwrap();

    // lower triangle is unset and must come back unset
    assert_eq!(cache.load().unwrap().get("conditions"), Some(&value));
}

#[test]
fn test_modulated_levels_round_trip() {
    let a = analysis(1);
    let buckets = ConditionAnalyses {
        color: Some(a.clone()),
        shape: None,
        texture: Some(analysis(2)),
        combined: Some(a),
    };
    let levels = BTreeMap::from([(2_u32, buckets)]);
    let value = CachedAnalysis::Modulated(levels);

    let dir = tempfile::tempdir().unwrap();
    let cache = AnalysisCache::new(dir.path().join("cache.json"));
    cache.refresh(entry("modulated", value.clone())).unwrap();
    assert_eq!(cache.load().unwrap().get("modulated"), Some(&value));
}

#[test]
fn test_negative_infinity_survives_reload() {
    // task 2 starts at the second sample: zero examples, log is -inf
    let mut store = ExperimentStore::new();
    let r = run("quick", "baseline 1000", vec![0, 1, 2]);
    log_run(&mut store, &r, &[1, 3, 3], |_, _| Some(1));
    let analysis = Aggregator::new(AnalysisConfig::builder().num_tasks(3).build().unwrap())
        .aggregate(&store, &[r])
        .unwrap();
    assert_eq!(analysis.examples.mean.get(0, 0), Some(0.0));
    assert_eq!(analysis.log_examples.mean.get(0, 0), Some(f64::NEG_INFINITY));

    let dir = tempfile::tempdir().unwrap();
    let cache = AnalysisCache::new(dir.path().join("cache.json"));
    let value = CachedAnalysis::Analysis(analysis);
    cache.refresh(entry("quick", value.clone())).unwrap();

    let loaded = cache.load().unwrap();
    assert_eq!(loaded.get("quick"), Some(&value));
    let Some(CachedAnalysis::Analysis(back)) = loaded.get("quick") else {
        panic!("expected a single analysis");
    };
    assert_eq!(back.log_examples.mean.get(0, 0), Some(f64::NEG_INFINITY));
}

#[test]
fn test_truncated_matrix_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    let cache = AnalysisCache::new(&path);
    cache
        .refresh(entry("baseline", CachedAnalysis::Analysis(analysis(1))))
        .unwrap();

    // drop one cell from the first matrix
    let text = fs::read_to_string(&path).unwrap();
    let mut json: serde_json::Value = serde_json::from_str(&text).unwrap();
    json["baseline"]["value"]["examples"]["mean"]["cells"]
        .as_array_mut()
        .unwrap()
        .pop();
    fs::write(&path, json.to_string()).unwrap();

    assert!(cache.load().is_err());
}
