//! End-to-end pipeline tests
//!
//! Exercise the full flow the tool runs: thresholds gate a check, outcomes
//! accumulate and persist, the persisted file is read back and turned into
//! a recommendation report.

use doctor_lib::recommender::{RecommendationEngine, RecommendationPaths};
use doctor_lib::thresholds::{ShapePaths, ThresholdError, ThresholdStore};
use doctor_lib::{
    load_latest, PersistMode, RecommendationKind, ResultStore, TestOutcome, TestStatus,
    FALLBACK_SUMMARY_MARKER,
};
use std::fs;
use tempfile::TempDir;

const SHAPES_JSON: &str = r#"{
    "BM.GPU.H100.8": {
        "rx_discards_check": {
            "enabled": true,
            "category": "network",
            "threshold": 100
        },
        "gpu_count_check": {
            "enabled": true,
            "category": "gpu",
            "threshold": 8
        }
    }
}"#;

const RECOMMENDATIONS_JSON: &str = r#"{
    "recommendations": {
        "gpu_count_check": {
            "fail": {
                "type": "critical",
                "issue": "GPU count mismatch (found: {gpu_count})",
                "suggestion": "Reseat or replace the missing GPU",
                "commands": ["nvidia-smi --list-gpus"]
            }
        }
    }
}"#;

fn shape_store(dir: &TempDir) -> ThresholdStore {
    let path = dir.path().join("shapes.json");
    fs::write(&path, SHAPES_JSON).unwrap();
    ThresholdStore::load(&ShapePaths {
        override_path: Some(path),
        configured: None,
    })
    .unwrap()
}

#[test]
fn threshold_lookup_drives_check_gating() {
    let dir = TempDir::new().unwrap();
    let store = shape_store(&dir);

    // The known shape resolves its tuned threshold.
    let threshold = store
        .threshold("BM.GPU.H100.8", "rx_discards_check")
        .unwrap();
    assert_eq!(threshold.as_f64(), Some(100.0));

    // An absent shape is a typed miss, distinct from "disabled".
    let err = store
        .threshold("BM.GPU.B200.8", "rx_discards_check")
        .unwrap_err();
    assert!(matches!(err, ThresholdError::ShapeNotFound { .. }));
}

#[test]
fn appended_runs_accumulate_and_feed_recommendations() {
    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("results.json");

    // First run: everything passed, persisted as a bare result set.
    let mut first = ResultStore::new();
    first.record("gpu_count_check", TestOutcome::new(TestStatus::Pass));
    first.persist(&results_path, PersistMode::Overwrite).unwrap();

    // Second run fails the GPU count and appends, normalizing the existing
    // single-run file into a history of two runs.
    let mut second = ResultStore::new();
    let mut failed = TestOutcome::new(TestStatus::Fail);
    failed.gpu_count = Some(7);
    second.record("gpu_count_check", failed);
    second.persist(&results_path, PersistMode::Append).unwrap();

    let history = doctor_lib::load_history(&results_path).unwrap();
    assert_eq!(history.test_runs.len(), 2);
    assert_eq!(
        history.test_runs[1].test_results["gpu_count_check"][0].status,
        TestStatus::Fail
    );

    // The reader hands downstream the latest run only.
    let latest = load_latest(&results_path).unwrap();
    assert_eq!(latest["gpu_count_check"][0].gpu_count, Some(7));

    // Recommendation engine maps the failure through its template.
    let config_path = dir.path().join("recommendations.json");
    fs::write(&config_path, RECOMMENDATIONS_JSON).unwrap();
    let engine = RecommendationEngine::new(&RecommendationPaths::single(&config_path));
    assert!(!engine.is_fallback());

    let report = engine.generate_report(&latest);
    assert_eq!(report.total_issues, 1);
    assert_eq!(report.critical_issues, 1);
    assert_eq!(
        report.recommendations[0].issue,
        "GPU count mismatch (found: 7)"
    );
}

#[test]
fn missing_recommendation_config_falls_back_with_marker() {
    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("results.json");

    let mut store = ResultStore::new();
    let mut failed = TestOutcome::new(TestStatus::Fail);
    failed.gpu_count = Some(6);
    store.record("gpu_count_check", failed);
    store.persist(&results_path, PersistMode::Overwrite).unwrap();

    // No configuration anywhere in the search path.
    let engine = RecommendationEngine::new(&RecommendationPaths {
        candidates: vec![dir.path().join("absent.json")],
    });
    assert!(engine.is_fallback());

    let latest = load_latest(&results_path).unwrap();
    let report = engine.generate_report(&latest);

    assert_eq!(report.recommendations.len(), 1);
    assert_eq!(report.recommendations[0].kind, RecommendationKind::Critical);
    assert!(report.summary.contains(FALLBACK_SUMMARY_MARKER));
}
