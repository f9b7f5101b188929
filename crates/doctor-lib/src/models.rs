//! Core data models for the diagnostic pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Status reported by a single check execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    /// Observed value is within the shape's threshold
    Pass,
    /// Observed value is out of bounds but not yet service-impacting
    Warn,
    /// Observed value violates the shape's threshold
    Fail,
    /// Check did not run (disabled, or prerequisite missing)
    Skip,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "PASS",
            TestStatus::Warn => "WARN",
            TestStatus::Fail => "FAIL",
            TestStatus::Skip => "SKIP",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported result of a check execution
///
/// A check only populates the fields relevant to it; everything beyond
/// `status` and `timestamp` is sparse. Outcomes are immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub status: TestStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_gpu_indexes: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_rdma_nics: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_interfaces: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uncorrectable: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_correctable: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth0_present: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_loaded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_version: Option<String>,
    /// Device the outcome refers to when a check runs per device (e.g. one
    /// outcome per RDMA NIC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TestOutcome {
    /// Create an outcome with the given status, stamped now
    pub fn new(status: TestStatus) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
            gpu_count: None,
            enabled_gpu_indexes: None,
            num_rdma_nics: None,
            failed_interfaces: None,
            max_uncorrectable: None,
            max_correctable: None,
            eth0_present: None,
            module_loaded: None,
            driver_version: None,
            device: None,
            message: None,
        }
    }
}

/// All outcomes of one diagnostic run, keyed by test name
///
/// A test that runs against multiple devices contributes multiple outcomes;
/// per-test ordering is insertion order.
pub type HostResultSet = HashMap<String, Vec<TestOutcome>>;

/// One complete execution of the diagnostic battery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub test_results: HostResultSet,
}

/// Append-mode results file: the ordered list of persisted runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunHistory {
    pub test_runs: Vec<Run>,
}

/// Severity of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Critical,
    Warning,
    Info,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::Critical => "critical",
            RecommendationKind::Warning => "warning",
            RecommendationKind::Info => "info",
        }
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved remediation guidance for one test outcome
///
/// Produced by the recommendation engine with all placeholders substituted;
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub test_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_code: Option<String>,
    pub issue: String,
    pub suggestion: String,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
}

/// Final recommendation report handed to the presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub summary: String,
    pub total_issues: usize,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub info_issues: usize,
    pub recommendations: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&TestStatus::Fail).unwrap();
        assert_eq!(json, "\"FAIL\"");

        let parsed: TestStatus = serde_json::from_str("\"WARN\"").unwrap();
        assert_eq!(parsed, TestStatus::Warn);
    }

    #[test]
    fn test_outcome_skips_unset_fields() {
        let outcome = TestOutcome::new(TestStatus::Pass);
        let json = serde_json::to_value(&outcome).unwrap();
        let object = json.as_object().unwrap();

        assert!(object.contains_key("status"));
        assert!(object.contains_key("timestamp"));
        assert!(!object.contains_key("gpu_count"));
        assert!(!object.contains_key("failed_interfaces"));
    }

    #[test]
    fn test_outcome_roundtrip() {
        let mut outcome = TestOutcome::new(TestStatus::Fail);
        outcome.gpu_count = Some(7);
        outcome.failed_interfaces = Some(vec!["rdma3".to_string()]);

        let json = serde_json::to_string(&outcome).unwrap();
        let parsed: TestOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outcome);
    }

    #[test]
    fn test_recommendation_kind_lowercase() {
        let json = serde_json::to_string(&RecommendationKind::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
