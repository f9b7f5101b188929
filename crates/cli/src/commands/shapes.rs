//! Shape threshold inspection commands

use anyhow::Result;
use doctor_lib::thresholds::{ShapePaths, ThresholdStore};
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{print_warning, OutputFormat};
use crate::settings::Settings;

/// Row for the shapes table
#[derive(Tabled)]
struct ShapeRow {
    #[tabled(rename = "Shape")]
    shape: String,
    #[tabled(rename = "Tests")]
    tests: usize,
    #[tabled(rename = "Enabled")]
    enabled: usize,
}

/// Row for the per-shape test table
#[derive(Tabled)]
struct TestRow {
    #[tabled(rename = "Test")]
    test: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
}

fn load_store(settings: &Settings, override_path: Option<PathBuf>) -> Result<ThresholdStore> {
    let paths = ShapePaths {
        override_path,
        configured: settings.shapes_file.clone(),
    };
    Ok(ThresholdStore::load(&paths)?)
}

/// List shapes present in the threshold configuration
pub fn list(
    settings: &Settings,
    override_path: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let store = load_store(settings, override_path)?;

    let mut shapes = store.available_shapes();
    shapes.sort_unstable();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&shapes)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if shapes.is_empty() {
                print_warning("No shapes configured");
                return Ok(());
            }

            let rows: Vec<ShapeRow> = shapes
                .iter()
                .map(|shape| {
                    let tests = store.shape_tests(shape).unwrap_or_default();
                    ShapeRow {
                        shape: shape.to_string(),
                        tests: tests.len(),
                        enabled: tests.iter().filter(|(_, entry)| entry.enabled).count(),
                    }
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nSource: {}", store.source().display());
        }
    }

    Ok(())
}

/// Show configured tests for one shape
pub fn show(
    settings: &Settings,
    shape: &str,
    override_path: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let store = load_store(settings, override_path)?;
    let mut tests = store.shape_tests(shape)?;
    tests.sort_unstable_by_key(|(name, _)| *name);

    match format {
        OutputFormat::Json => {
            let entries: serde_json::Map<String, serde_json::Value> = tests
                .into_iter()
                .map(|(name, entry)| Ok((name.to_string(), serde_json::to_value(entry)?)))
                .collect::<Result<_, serde_json::Error>>()?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Table => {
            if tests.is_empty() {
                print_warning("No tests configured for this shape");
                return Ok(());
            }

            let rows: Vec<TestRow> = tests
                .iter()
                .map(|(name, entry)| TestRow {
                    test: name.to_string(),
                    category: entry.category.clone(),
                    enabled: if entry.enabled {
                        "✓".to_string()
                    } else {
                        "".to_string()
                    },
                    threshold: entry
                        .threshold
                        .as_ref()
                        .map(|t| t.to_string())
                        .unwrap_or_default(),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
