//! Recommendation templates and placeholder substitution
//!
//! Templates carry `{placeholder}` tokens resolved against an outcome's
//! fields through a closed accessor table. Substitution is a pure function:
//! identical (template, outcome) inputs always yield identical output.

use crate::models::{RecommendationKind, TestOutcome};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A text pattern with named placeholders for one test/status slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationTemplate {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault_code: Option<String>,
    pub issue: String,
    pub suggestion: String,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
}

/// Per-test template slots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestRecommendationSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<RecommendationTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<RecommendationTemplate>,
}

/// Report summary templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTemplates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_issues: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<String>,
}

/// The full recommendation configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default)]
    pub recommendations: HashMap<String, TestRecommendationSet>,
    #[serde(default)]
    pub summary_templates: SummaryTemplates,
}

/// Replace recognized `{placeholder}` tokens with the outcome's fields
///
/// Unrecognized placeholders, and recognized placeholders whose field the
/// outcome did not populate, are left as literal text.
pub fn substitute(template: &str, outcome: &TestOutcome) -> String {
    substitute_with(template, |name| placeholder_value(outcome, name))
}

/// Replace the summary count placeholders
pub fn substitute_counts(
    template: &str,
    total_issues: usize,
    critical_count: usize,
    warning_count: usize,
) -> String {
    substitute_with(template, |name| match name {
        "total_issues" => Some(total_issues.to_string()),
        "critical_count" => Some(critical_count.to_string()),
        "warning_count" => Some(warning_count.to_string()),
        _ => None,
    })
}

/// One-pass `{name}` scanner; tokens the resolver declines stay literal
fn substitute_with(template: &str, resolve: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find(['{', '}']) {
            Some(end) if after.as_bytes()[end] == b'}' => {
                let name = &after[..end];
                match resolve(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            // Unclosed brace (or a nested one): emit it literally and keep
            // scanning from the next character.
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// The closed table of recognized placeholders
///
/// Integers format as decimal, booleans as `true`/`false`, lists comma-join
/// with no leading or trailing separator (an empty list yields the empty
/// string).
fn placeholder_value(outcome: &TestOutcome, name: &str) -> Option<String> {
    match name {
        "status" => Some(outcome.status.to_string()),
        "gpu_count" => outcome.gpu_count.map(|v| v.to_string()),
        "num_rdma_nics" => outcome.num_rdma_nics.map(|v| v.to_string()),
        "max_uncorrectable" => outcome.max_uncorrectable.map(|v| v.to_string()),
        "max_correctable" => outcome.max_correctable.map(|v| v.to_string()),
        "eth0_present" => outcome.eth0_present.map(|v| v.to_string()),
        "module_loaded" => outcome.module_loaded.map(|v| v.to_string()),
        "driver_version" => outcome.driver_version.clone(),
        "device" => outcome.device.clone(),
        "enabled_gpu_indexes" => outcome.enabled_gpu_indexes.as_ref().map(|indexes| {
            indexes
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(",")
        }),
        "failed_interfaces" => outcome
            .failed_interfaces
            .as_ref()
            .map(|interfaces| interfaces.join(",")),
        _ => None,
    }
}
