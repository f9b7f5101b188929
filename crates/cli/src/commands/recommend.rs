//! Recommendation report generation

use anyhow::{Context, Result};
use doctor_lib::recommender::{RecommendationEngine, RecommendationPaths};
use doctor_lib::{load_latest, Recommendation, RecommendationReport};
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{color_kind, format_timestamp, print_success, print_warning, OutputFormat};
use crate::settings::Settings;

/// Row for the recommendations table
#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Test")]
    test: String,
    #[tabled(rename = "Fault Code")]
    fault_code: String,
    #[tabled(rename = "Issue")]
    issue: String,
}

/// Generate and print the recommendation report
pub fn generate(
    settings: &Settings,
    results_override: Option<PathBuf>,
    recommendations_override: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let results_path = results_override.unwrap_or_else(|| settings.results_file.clone());
    let results = load_latest(&results_path)
        .with_context(|| format!("failed to load results from {}", results_path.display()))?;

    let paths = recommendations_override
        .or_else(|| settings.recommendations_file.clone())
        .map(RecommendationPaths::single)
        .unwrap_or_default();
    let engine = RecommendationEngine::new(&paths);

    let report = engine.generate_report(&results);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
        }
        OutputFormat::Table => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &RecommendationReport) {
    if report.total_issues == 0 {
        print_success(&report.summary);
    } else {
        print_warning(&report.summary);
    }
    println!("Generated: {}\n", format_timestamp(&report.generated_at));

    if report.recommendations.is_empty() {
        return;
    }

    let rows: Vec<RecommendationRow> = report
        .recommendations
        .iter()
        .map(|r| RecommendationRow {
            kind: color_kind(r.kind),
            test: r.test_name.clone(),
            fault_code: r.fault_code.clone().unwrap_or_default(),
            issue: r.issue.clone(),
        })
        .collect();

    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);

    for rec in &report.recommendations {
        print_details(rec);
    }
}

fn print_details(rec: &Recommendation) {
    println!("\n[{}] {}", rec.test_name, rec.issue);
    println!("  Suggestion: {}", rec.suggestion);
    for command in &rec.commands {
        println!("  Run: {}", command);
    }
    for reference in &rec.references {
        println!("  See: {}", reference);
    }
}
