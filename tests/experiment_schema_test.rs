//! Experiment schema tests
//!
//! Records coming from the tracking boundary, the in-memory store and the
//! directory export.

use taskseq_analysis::experiment::{
    Dimension, DirectoryRunSource, ExperimentStore, MetricRecord, ProjectRecord, RunDescriptor,
    RunRecord, RunSource, RunStatus, BASELINE_PROJECT, MANIFEST_FILE, MODULATED_PROJECT,
};
use taskseq_analysis::Error;

// =============================================================================
// ProjectRecord Tests
// =============================================================================

#[test]
fn test_project_record_creation() {
    let record = ProjectRecord::new(BASELINE_PROJECT);

    assert_eq!(record.path(), BASELINE_PROJECT);
    assert_eq!(record.entity(), "meta-learning-scaling");
    assert_eq!(record.name(), "sequential-benchmark-baseline");
    assert!(record.created_at().timestamp() > 0);
    assert!(record.config().is_none());
}

#[test]
fn test_project_record_with_config() {
    let config = serde_json::json!({
        "dataset_coreset_size": 22500,
        "accuracy_threshold": 0.95,
    });

    let record = ProjectRecord::new(MODULATED_PROJECT).with_config(config.clone());

    assert_eq!(record.name(), "sequential-benchmark-task-modulated");
    assert_eq!(record.config(), Some(&config));
}

#[test]
fn test_project_record_serialization() {
    let record = ProjectRecord::new("lab/project");

    let json = serde_json::to_string(&record).expect("serialization failed");
    let deserialized: ProjectRecord = serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(record.path(), deserialized.path());
    assert_eq!(record.created_at(), deserialized.created_at());
}

// =============================================================================
// RunRecord Tests
// =============================================================================

#[test]
fn test_run_record_creation() {
    let run = RunRecord::new("3kd9x0", BASELINE_PROJECT);

    assert_eq!(run.run_id(), "3kd9x0");
    assert_eq!(run.name(), "3kd9x0");
    assert_eq!(run.project(), BASELINE_PROJECT);
    assert_eq!(run.status(), RunStatus::Finished);
    assert!(run.query_order().is_empty());
    assert!(run.descriptor().is_none());
}

#[test]
fn test_run_record_builder() {
    let run = RunRecord::builder("3kd9x0", BASELINE_PROJECT)
        .name("sunny-forest-12")
        .description("baseline run 2004\nsecond line ignored")
        .query_order(vec![12, 3, 27])
        .status(RunStatus::Crashed)
        .build();

    assert_eq!(run.name(), "sunny-forest-12");
    assert_eq!(run.query_order(), &[12, 3, 27]);
    assert_eq!(run.status(), RunStatus::Crashed);
}

#[test]
fn test_run_record_resolves_descriptor_once() {
    let mut run = RunRecord::builder("r", MODULATED_PROJECT)
        .description("query modulated 3-1007")
        .build();

    let descriptor = run.resolve_descriptor().unwrap();
    assert_eq!(descriptor.level(), Some(3));
    assert_eq!(descriptor.run_id(), 1007);
    assert_eq!(run.descriptor(), Some(descriptor));
}

#[test]
fn test_run_record_serialization() {
    let run = RunRecord::builder("r1", "lab/p")
        .query_order(vec![1, 2])
        .descriptor(RunDescriptor::baseline(3002).unwrap())
        .build();

    let json = serde_json::to_string(&run).expect("serialization failed");
    let deserialized: RunRecord = serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(run, deserialized);
}

#[test]
fn test_run_status_variants() {
    assert_eq!(format!("{:?}", RunStatus::Running), "Running");
    assert_eq!(format!("{:?}", RunStatus::Finished), "Finished");
    assert_eq!(format!("{:?}", RunStatus::Crashed), "Crashed");
}

// =============================================================================
// RunDescriptor Tests
// =============================================================================

#[test]
fn test_descriptor_dimension_and_replication() {
    let descriptor = RunDescriptor::parse_baseline("baseline 2015").unwrap();
    assert_eq!(descriptor.dimension(), Dimension::Shape);
    assert_eq!(descriptor.replication(), 15);
    assert_eq!(descriptor.level(), None);
}

#[test]
fn test_descriptor_rejects_bad_suffix() {
    assert!(matches!(
        RunDescriptor::parse_baseline("no identifier"),
        Err(Error::InvalidRunDescriptor(_))
    ));
    assert!(RunDescriptor::parse_modulated("level 0-1001").is_err());
    // 4xxx does not map to color, shape or texture
    assert!(RunDescriptor::parse_baseline("run 4001").is_err());
}

// =============================================================================
// MetricRecord Tests
// =============================================================================

#[test]
fn test_metric_record_creation() {
    let metric = MetricRecord::new("run-001", "Test Accuracy, Query #1", 3, 0.5);

    assert_eq!(metric.run_id(), "run-001");
    assert_eq!(metric.key(), "Test Accuracy, Query #1");
    assert_eq!(metric.step(), 3);
    assert!((metric.value() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_metric_record_serialization() {
    let metric = MetricRecord::new("run-001", "loss", 50, 0.25);

    let json = serde_json::to_string(&metric).expect("serialization failed");
    let deserialized: MetricRecord = serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(metric.key(), deserialized.key());
    assert_eq!(metric.step(), deserialized.step());
    assert!((metric.value() - deserialized.value()).abs() < f64::EPSILON);
}

// =============================================================================
// ExperimentStore Tests
// =============================================================================

#[test]
fn test_store_history_has_gaps_for_late_columns() {
    let mut store = ExperimentStore::new();
    let run = RunRecord::new("r1", "lab/p");
    store.add_run(run.clone());
    store.log("r1", 0, &[("Test Accuracy, Query #1", 0.4)]);
    store.log("r1", 1, &[("Test Accuracy, Query #1", 0.96)]);
    store.log(
        "r1",
        2,
        &[("Test Accuracy, Query #1", 0.97), ("Test Accuracy, Query #2", 0.3)],
    );

    let history = store.history(&run).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(
        history.first_valid_index("Test Accuracy, Query #2").unwrap(),
        Some(2)
    );
    assert!(history.value("Test Accuracy, Query #2", 0).unwrap().is_nan());
    assert!(matches!(
        history.first_valid_index("Test Accuracy, Query #3"),
        Err(Error::MissingColumn { .. })
    ));
}

#[test]
fn test_store_lists_runs_per_project() {
    let mut store = ExperimentStore::new();
    store.add_project(ProjectRecord::new(BASELINE_PROJECT));
    store.add_run(RunRecord::new("a", BASELINE_PROJECT));
    store.add_run(RunRecord::new("b", MODULATED_PROJECT));
    store.add_run(RunRecord::new("c", BASELINE_PROJECT));

    let ids: Vec<String> = store
        .runs(BASELINE_PROJECT)
        .unwrap()
        .iter()
        .map(|r| r.run_id().to_string())
        .collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert!(store.get_project(BASELINE_PROJECT).is_some());
}

// =============================================================================
// DirectoryRunSource Tests
// =============================================================================

#[test]
fn test_directory_source_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let source = DirectoryRunSource::new(dir.path().join("export"));

    let mut store = ExperimentStore::new();
    let run = RunRecord::builder("r1", BASELINE_PROJECT)
        .description("baseline 1001")
        .query_order(vec![5, 9])
        .build();
    store.add_run(run.clone());
    store.log("r1", 0, &[("Test Accuracy, Query #1", 0.5)]);
    store.log(
        "r1",
        1,
        &[("Test Accuracy, Query #1", 0.97), ("Test Accuracy, Query #2", 0.2)],
    );
    let history = store.history(&run).unwrap();

    source.write_run(&run, &history).unwrap();
    assert!(dir.path().join("export").join(MANIFEST_FILE).exists());

    let listed = source.runs(BASELINE_PROJECT).unwrap();
    assert_eq!(listed, vec![run.clone()]);
    assert!(source.runs(MODULATED_PROJECT).unwrap().is_empty());

    let loaded = source.history(&listed[0]).unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(loaded.value("Test Accuracy, Query #2", 0).unwrap().is_nan());
    assert!((loaded.value("Test Accuracy, Query #2", 1).unwrap() - 0.2).abs() < 1e-12);
}

#[test]
fn test_directory_source_missing_history_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = DirectoryRunSource::new(dir.path());
    assert!(source.runs("lab/p").unwrap().is_empty());
    assert!(source.history(&RunRecord::new("ghost", "lab/p")).is_err());
}
