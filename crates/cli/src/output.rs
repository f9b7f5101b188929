//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use doctor_lib::{RecommendationKind, TestStatus};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
#[allow(dead_code)]
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Color a test status for terminal display
pub fn color_status(status: TestStatus) -> String {
    match status {
        TestStatus::Pass => status.as_str().green().to_string(),
        TestStatus::Warn => status.as_str().yellow().to_string(),
        TestStatus::Fail => status.as_str().red().to_string(),
        TestStatus::Skip => status.as_str().dimmed().to_string(),
    }
}

/// Color a recommendation kind for terminal display
pub fn color_kind(kind: RecommendationKind) -> String {
    match kind {
        RecommendationKind::Critical => kind.as_str().red().bold().to_string(),
        RecommendationKind::Warning => kind.as_str().yellow().to_string(),
        RecommendationKind::Info => kind.as_str().blue().to_string(),
    }
}

/// Format a timestamp for display
pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
