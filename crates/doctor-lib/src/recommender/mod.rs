//! Recommendation engine
//!
//! Maps persisted test outcomes to remediation guidance. Guidance normally
//! comes from a user-editable template document found through a prioritized
//! search path; when no document loads, the engine falls back to a built-in
//! table of generic recommendations and says so in the report summary.

mod fallback;
mod template;

pub use fallback::FALLBACK_SUMMARY_MARKER;
pub use template::{
    substitute, RecommendationConfig, RecommendationTemplate, SummaryTemplates,
    TestRecommendationSet,
};

use crate::models::{
    HostResultSet, Recommendation, RecommendationKind, RecommendationReport, TestOutcome,
    TestStatus,
};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Local override in the working directory, highest priority
pub const CWD_RECOMMENDATIONS_FILE: &str = "hpc-doctor-recommendations.json";

/// System-wide locations, tried in order
pub const SYSTEM_RECOMMENDATIONS_FILES: &[&str] = &[
    "/etc/hpc-doctor/recommendations.json",
    "/usr/share/hpc-doctor/recommendations.json",
];

/// Development-tree location, lowest priority
pub const DEV_RECOMMENDATIONS_FILE: &str = "configs/recommendations.json";

/// Errors from recommendation configuration loading
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("no recommendation configuration found (searched: {})", format_searched(.searched))]
    ConfigNotFound { searched: Vec<PathBuf> },

    #[error("failed to read recommendation configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse recommendation configuration {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn format_searched(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Search path for the recommendation configuration
///
/// The default order is: working-directory override, user config home,
/// system-wide locations, development-relative file.
#[derive(Debug, Clone)]
pub struct RecommendationPaths {
    pub candidates: Vec<PathBuf>,
}

impl Default for RecommendationPaths {
    fn default() -> Self {
        let mut candidates = vec![PathBuf::from(CWD_RECOMMENDATIONS_FILE)];
        if let Some(config_home) = dirs_next::config_dir() {
            candidates.push(config_home.join("hpc-doctor").join("recommendations.json"));
        }
        candidates.extend(SYSTEM_RECOMMENDATIONS_FILES.iter().map(PathBuf::from));
        candidates.push(PathBuf::from(DEV_RECOMMENDATIONS_FILE));
        Self { candidates }
    }
}

impl RecommendationPaths {
    /// Search only the given file (e.g. a CLI flag)
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            candidates: vec![path.into()],
        }
    }
}

/// Load the first existing recommendation configuration from the search path
///
/// A missing candidate moves on to the next; a candidate that exists but
/// fails to parse is a hard error for the whole load — deliberately not
/// skipped, so a broken local override is noticed instead of silently
/// shadowed by a system file.
pub fn load_config(
    paths: &RecommendationPaths,
) -> Result<(RecommendationConfig, PathBuf), RecommendationError> {
    for candidate in &paths.candidates {
        if !candidate.exists() {
            debug!(path = %candidate.display(), "Recommendation config candidate not present");
            continue;
        }

        let data = fs::read_to_string(candidate).map_err(|source| RecommendationError::Io {
            path: candidate.clone(),
            source,
        })?;
        let config: RecommendationConfig =
            serde_json::from_str(&data).map_err(|source| RecommendationError::ConfigParse {
                path: candidate.clone(),
                source,
            })?;

        info!(
            path = %candidate.display(),
            tests = config.recommendations.len(),
            "Loaded recommendation templates"
        );
        return Ok((config, candidate.clone()));
    }

    Err(RecommendationError::ConfigNotFound {
        searched: paths.candidates.clone(),
    })
}

/// Turns test outcomes into remediation guidance
pub struct RecommendationEngine {
    /// Loaded configuration, or `None` in fallback mode
    config: Option<RecommendationConfig>,
    source: Option<PathBuf>,
}

impl RecommendationEngine {
    /// Build an engine from the search path, falling back to the built-in
    /// table when nothing usable loads
    pub fn new(paths: &RecommendationPaths) -> Self {
        match load_config(paths) {
            Ok((config, source)) => Self {
                config: Some(config),
                source: Some(source),
            },
            Err(e) => {
                warn!(error = %e, "Using built-in recommendations");
                Self::fallback()
            }
        }
    }

    /// Engine backed by an already-parsed configuration
    pub fn with_config(config: RecommendationConfig) -> Self {
        Self {
            config: Some(config),
            source: None,
        }
    }

    /// Engine in fallback mode
    pub fn fallback() -> Self {
        Self {
            config: None,
            source: None,
        }
    }

    /// Whether the engine is running on the built-in table
    pub fn is_fallback(&self) -> bool {
        self.config.is_none()
    }

    /// Path the configuration was loaded from, when it came from a file
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Resolve guidance for one outcome
    ///
    /// `Fail` and `Warn` select the test's `fail` template (a warning needs
    /// the same guidance as a failure); `Pass` selects the `pass` template;
    /// `Skip` yields nothing. A test absent from the configuration or an
    /// unset template slot also yields nothing — that is not an error.
    pub fn recommendation(
        &self,
        test_name: &str,
        status: TestStatus,
        outcome: &TestOutcome,
    ) -> Option<Recommendation> {
        let config = match &self.config {
            Some(config) => config,
            None => return fallback::fallback_recommendation(test_name, status, outcome),
        };

        let slots = config.recommendations.get(test_name)?;
        let tpl = match status {
            TestStatus::Fail | TestStatus::Warn => slots.fail.as_ref()?,
            TestStatus::Pass => slots.pass.as_ref()?,
            TestStatus::Skip => return None,
        };

        Some(Recommendation {
            kind: tpl.kind,
            test_name: test_name.to_string(),
            fault_code: tpl.fault_code.clone(),
            issue: substitute(&tpl.issue, outcome),
            suggestion: substitute(&tpl.suggestion, outcome),
            commands: tpl
                .commands
                .iter()
                .map(|command| substitute(command, outcome))
                .collect(),
            references: tpl.references.clone(),
        })
    }

    /// Render the report summary line
    pub fn summary(&self, total_issues: usize, critical_count: usize, warning_count: usize) -> String {
        let templates = self
            .config
            .as_ref()
            .map(|config| &config.summary_templates);

        let text = if total_issues == 0 {
            match templates.and_then(|t| t.no_issues.as_deref()) {
                Some(tpl) => template::substitute_counts(tpl, total_issues, critical_count, warning_count),
                None => "All diagnostic tests passed. No issues detected.".to_string(),
            }
        } else {
            match templates.and_then(|t| t.has_issues.as_deref()) {
                Some(tpl) => template::substitute_counts(tpl, total_issues, critical_count, warning_count),
                None => format!(
                    "Found {} issue(s): {} critical, {} warning.",
                    total_issues, critical_count, warning_count
                ),
            }
        };

        if self.is_fallback() {
            format!(
                "{} ({}: using built-in recommendations)",
                text, FALLBACK_SUMMARY_MARKER
            )
        } else {
            text
        }
    }

    /// Generate the full recommendation report for a result set
    ///
    /// Tests are processed in sorted name order so the report is
    /// deterministic; per-test outcomes keep their recorded order.
    pub fn generate_report(&self, results: &HostResultSet) -> RecommendationReport {
        let mut names: Vec<&String> = results.keys().collect();
        names.sort_unstable();

        let mut recommendations = Vec::new();
        let (mut critical, mut warning, mut info) = (0usize, 0usize, 0usize);

        for name in names {
            for outcome in &results[name] {
                if let Some(rec) = self.recommendation(name, outcome.status, outcome) {
                    match rec.kind {
                        RecommendationKind::Critical => critical += 1,
                        RecommendationKind::Warning => warning += 1,
                        RecommendationKind::Info => info += 1,
                    }
                    recommendations.push(rec);
                }
            }
        }

        // Informational entries (e.g. pass templates) are guidance, not
        // issues.
        let total_issues = critical + warning;

        RecommendationReport {
            summary: self.summary(total_issues, critical, warning),
            total_issues,
            critical_issues: critical,
            warning_issues: warning,
            info_issues: info,
            recommendations,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG_JSON: &str = r#"{
        "recommendations": {
            "gpu_count_check": {
                "fail": {
                    "type": "critical",
                    "fault_code": "HPCD-0001",
                    "issue": "GPU count mismatch (found: {gpu_count})",
                    "suggestion": "Reseat or replace the missing GPU",
                    "commands": ["nvidia-smi --list-gpus"],
                    "references": ["https://docs.example.com/gpu-count"]
                },
                "pass": {
                    "type": "info",
                    "issue": "GPU count matches ({gpu_count})",
                    "suggestion": "No action needed"
                }
            },
            "rx_discards_check": {
                "fail": {
                    "type": "warning",
                    "issue": "RX discards above threshold on {failed_interfaces}",
                    "suggestion": "Inspect {failed_interfaces} for congestion",
                    "commands": ["ethtool -S {failed_interfaces}"]
                }
            }
        },
        "summary_templates": {
            "no_issues": "Node healthy: {total_issues} issues.",
            "has_issues": "Node needs attention: {total_issues} total ({critical_count} critical, {warning_count} warning)."
        }
    }"#;

    fn config() -> RecommendationConfig {
        serde_json::from_str(CONFIG_JSON).unwrap()
    }

    fn fail_outcome(gpu_count: u32) -> TestOutcome {
        let mut o = TestOutcome::new(TestStatus::Fail);
        o.gpu_count = Some(gpu_count);
        o
    }

    #[test]
    fn test_load_first_existing_candidate_wins() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        fs::write(&first, CONFIG_JSON).unwrap();
        fs::write(&second, r#"{"recommendations": {}}"#).unwrap();

        let paths = RecommendationPaths {
            candidates: vec![dir.path().join("absent.json"), first.clone(), second],
        };
        let (_, source) = load_config(&paths).unwrap();
        assert_eq!(source, first);
    }

    #[test]
    fn test_load_parse_failure_is_hard_error() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.json");
        let valid = dir.path().join("valid.json");
        fs::write(&broken, "{").unwrap();
        fs::write(&valid, CONFIG_JSON).unwrap();

        // The broken higher-priority file must not be skipped in favor of
        // the valid lower-priority one.
        let err = load_config(&RecommendationPaths {
            candidates: vec![broken, valid],
        })
        .unwrap_err();
        assert!(matches!(err, RecommendationError::ConfigParse { .. }));
    }

    #[test]
    fn test_load_nothing_found() {
        let dir = TempDir::new().unwrap();
        let err = load_config(&RecommendationPaths {
            candidates: vec![dir.path().join("absent.json")],
        })
        .unwrap_err();
        assert!(matches!(err, RecommendationError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_engine_enters_fallback_when_nothing_loads() {
        let dir = TempDir::new().unwrap();
        let engine = RecommendationEngine::new(&RecommendationPaths {
            candidates: vec![dir.path().join("absent.json")],
        });
        assert!(engine.is_fallback());
    }

    #[test]
    fn test_fail_selects_fail_template_with_substitution() {
        let engine = RecommendationEngine::with_config(config());
        let rec = engine
            .recommendation("gpu_count_check", TestStatus::Fail, &fail_outcome(4))
            .unwrap();

        assert_eq!(rec.kind, RecommendationKind::Critical);
        assert_eq!(rec.fault_code.as_deref(), Some("HPCD-0001"));
        assert_eq!(rec.issue, "GPU count mismatch (found: 4)");
        assert_eq!(rec.references, vec!["https://docs.example.com/gpu-count"]);
    }

    #[test]
    fn test_warn_selects_same_template_as_fail() {
        let engine = RecommendationEngine::with_config(config());
        let outcome = fail_outcome(4);

        let from_fail = engine
            .recommendation("gpu_count_check", TestStatus::Fail, &outcome)
            .unwrap();
        let from_warn = engine
            .recommendation("gpu_count_check", TestStatus::Warn, &outcome)
            .unwrap();
        assert_eq!(from_fail, from_warn);
    }

    #[test]
    fn test_pass_selects_pass_template() {
        let engine = RecommendationEngine::with_config(config());
        let mut outcome = TestOutcome::new(TestStatus::Pass);
        outcome.gpu_count = Some(8);

        let rec = engine
            .recommendation("gpu_count_check", TestStatus::Pass, &outcome)
            .unwrap();
        assert_eq!(rec.kind, RecommendationKind::Info);
        assert_eq!(rec.issue, "GPU count matches (8)");
    }

    #[test]
    fn test_missing_slots_and_unknown_inputs_yield_none() {
        let engine = RecommendationEngine::with_config(config());
        let outcome = TestOutcome::new(TestStatus::Pass);

        // rx_discards_check has no pass template.
        assert!(engine
            .recommendation("rx_discards_check", TestStatus::Pass, &outcome)
            .is_none());
        // Unknown test name.
        assert!(engine
            .recommendation("no_such_check", TestStatus::Fail, &outcome)
            .is_none());
        // Skip never maps to guidance.
        assert!(engine
            .recommendation("gpu_count_check", TestStatus::Skip, &outcome)
            .is_none());
    }

    #[test]
    fn test_commands_are_substituted_per_entry() {
        let engine = RecommendationEngine::with_config(config());
        let mut outcome = TestOutcome::new(TestStatus::Fail);
        outcome.failed_interfaces = Some(vec!["rdma3".to_string()]);

        let rec = engine
            .recommendation("rx_discards_check", TestStatus::Fail, &outcome)
            .unwrap();
        assert_eq!(rec.commands, vec!["ethtool -S rdma3"]);
        assert_eq!(rec.suggestion, "Inspect rdma3 for congestion");
    }

    #[test]
    fn test_summary_uses_templates() {
        let engine = RecommendationEngine::with_config(config());
        assert_eq!(engine.summary(0, 0, 0), "Node healthy: 0 issues.");
        assert_eq!(
            engine.summary(3, 2, 1),
            "Node needs attention: 3 total (2 critical, 1 warning)."
        );
    }

    #[test]
    fn test_summary_defaults_without_templates() {
        let engine = RecommendationEngine::with_config(RecommendationConfig::default());
        assert_eq!(
            engine.summary(0, 0, 0),
            "All diagnostic tests passed. No issues detected."
        );
        assert_eq!(
            engine.summary(2, 1, 1),
            "Found 2 issue(s): 1 critical, 1 warning."
        );
    }

    #[test]
    fn test_fallback_summary_carries_marker() {
        let engine = RecommendationEngine::fallback();
        assert!(engine.summary(0, 0, 0).contains(FALLBACK_SUMMARY_MARKER));
        assert!(engine.summary(2, 2, 0).contains(FALLBACK_SUMMARY_MARKER));
    }

    #[test]
    fn test_generate_report_counts_and_summary() {
        let engine = RecommendationEngine::with_config(config());

        let mut results: HostResultSet = HostResultSet::new();
        results.insert("gpu_count_check".to_string(), vec![fail_outcome(4)]);
        let mut discards = TestOutcome::new(TestStatus::Warn);
        discards.failed_interfaces = Some(vec!["rdma1".to_string()]);
        results.insert("rx_discards_check".to_string(), vec![discards]);

        let report = engine.generate_report(&results);
        assert_eq!(report.total_issues, 2);
        assert_eq!(report.critical_issues, 1);
        assert_eq!(report.warning_issues, 1);
        assert_eq!(report.info_issues, 0);
        assert_eq!(report.recommendations.len(), 2);
        // Sorted test order: gpu_count_check before rx_discards_check.
        assert_eq!(report.recommendations[0].test_name, "gpu_count_check");
        assert_eq!(
            report.summary,
            "Node needs attention: 2 total (1 critical, 1 warning)."
        );
    }

    #[test]
    fn test_generate_report_pass_templates_are_not_issues() {
        let engine = RecommendationEngine::with_config(config());

        let mut outcome = TestOutcome::new(TestStatus::Pass);
        outcome.gpu_count = Some(8);
        let mut results = HostResultSet::new();
        results.insert("gpu_count_check".to_string(), vec![outcome]);

        let report = engine.generate_report(&results);
        assert_eq!(report.total_issues, 0);
        assert_eq!(report.info_issues, 1);
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(
            report.summary,
            "Node healthy: 0 issues."
        );
    }

    #[test]
    fn test_generate_report_fallback_end_to_end() {
        let engine = RecommendationEngine::fallback();

        let mut results = HostResultSet::new();
        results.insert("gpu_count_check".to_string(), vec![fail_outcome(7)]);

        let report = engine.generate_report(&results);
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(
            report.recommendations[0].kind,
            RecommendationKind::Critical
        );
        assert!(report.summary.contains(FALLBACK_SUMMARY_MARKER));
    }

    #[test]
    fn test_multiple_outcomes_per_test_each_get_guidance() {
        let engine = RecommendationEngine::with_config(config());

        let mut first = TestOutcome::new(TestStatus::Fail);
        first.failed_interfaces = Some(vec!["rdma0".to_string()]);
        let mut second = TestOutcome::new(TestStatus::Fail);
        second.failed_interfaces = Some(vec!["rdma4".to_string()]);

        let mut results = HostResultSet::new();
        results.insert("rx_discards_check".to_string(), vec![first, second]);

        let report = engine.generate_report(&results);
        assert_eq!(report.warning_issues, 2);
        assert_eq!(report.recommendations[0].commands, vec!["ethtool -S rdma0"]);
        assert_eq!(report.recommendations[1].commands, vec!["ethtool -S rdma4"]);
    }
}
