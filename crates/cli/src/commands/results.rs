//! Persisted-result inspection commands

use anyhow::{Context, Result};
use doctor_lib::{load_history, load_latest, HostResultSet, TestOutcome};
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{color_status, format_timestamp, print_warning, OutputFormat};
use crate::settings::Settings;

/// Row for the outcomes table
#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Test")]
    test: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Details")]
    details: String,
}

/// Show outcomes from the results file
pub fn show(
    settings: &Settings,
    results_override: Option<PathBuf>,
    all_runs: bool,
    format: OutputFormat,
) -> Result<()> {
    let path = results_override.unwrap_or_else(|| settings.results_file.clone());

    if all_runs {
        let history = load_history(&path)
            .with_context(|| format!("failed to load results from {}", path.display()))?;

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&history)?);
            }
            OutputFormat::Table => {
                for run in &history.test_runs {
                    println!(
                        "Run {} ({})",
                        run.run_id,
                        format_timestamp(&run.timestamp)
                    );
                    print_result_table(&run.test_results);
                    println!();
                }
            }
        }
        return Ok(());
    }

    let results = load_latest(&path)
        .with_context(|| format!("failed to load results from {}", path.display()))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        OutputFormat::Table => print_result_table(&results),
    }

    Ok(())
}

fn print_result_table(results: &HostResultSet) {
    if results.is_empty() {
        print_warning("No outcomes recorded");
        return;
    }

    let mut names: Vec<&String> = results.keys().collect();
    names.sort_unstable();

    let rows: Vec<OutcomeRow> = names
        .iter()
        .flat_map(|name| {
            results[*name].iter().map(move |outcome| OutcomeRow {
                test: name.to_string(),
                status: color_status(outcome.status),
                timestamp: format_timestamp(&outcome.timestamp),
                details: outcome_details(outcome),
            })
        })
        .collect();

    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}

/// One-line summary of the fields an outcome populated
fn outcome_details(outcome: &TestOutcome) -> String {
    let mut parts = Vec::new();

    if let Some(device) = &outcome.device {
        parts.push(format!("device={}", device));
    }
    if let Some(count) = outcome.gpu_count {
        parts.push(format!("gpus={}", count));
    }
    if let Some(count) = outcome.num_rdma_nics {
        parts.push(format!("rdma_nics={}", count));
    }
    if let Some(interfaces) = &outcome.failed_interfaces {
        parts.push(format!("failed={}", interfaces.join(",")));
    }
    if let Some(max) = outcome.max_uncorrectable {
        parts.push(format!("uncorrectable={}", max));
    }
    if let Some(max) = outcome.max_correctable {
        parts.push(format!("correctable={}", max));
    }
    if let Some(present) = outcome.eth0_present {
        parts.push(format!("eth0={}", present));
    }
    if let Some(loaded) = outcome.module_loaded {
        parts.push(format!("module_loaded={}", loaded));
    }
    if let Some(version) = &outcome.driver_version {
        parts.push(format!("driver={}", version));
    }
    if let Some(message) = &outcome.message {
        parts.push(message.clone());
    }

    parts.join(" ")
}
