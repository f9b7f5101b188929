//! HPC Node Doctor CLI
//!
//! A command-line tool for inspecting shape thresholds, viewing persisted
//! diagnostic results, and generating recommendation reports.

mod commands;
mod output;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{recommend, results, shapes};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// HPC Node Doctor CLI
#[derive(Parser)]
#[command(name = "hpc-doctor")]
#[command(author, version, about = "Hardware health diagnostics for HPC nodes", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the recommendation report from persisted results
    Recommend {
        /// Results file to read (defaults to the configured location)
        #[arg(long, env = "HPC_DOCTOR_RESULTS_FILE")]
        results: Option<PathBuf>,

        /// Recommendation template file (bypasses the standard search path)
        #[arg(long)]
        recommendations: Option<PathBuf>,
    },

    /// Inspect shape thresholds
    #[command(subcommand)]
    Shapes(ShapesCommands),

    /// Inspect persisted results
    #[command(subcommand)]
    Results(ResultsCommands),
}

#[derive(Subcommand)]
pub enum ShapesCommands {
    /// List shapes present in the threshold configuration
    List {
        /// Threshold file override
        #[arg(long, env = "HPC_DOCTOR_SHAPES_FILE")]
        shapes: Option<PathBuf>,
    },

    /// Show configured tests for one shape
    Show {
        /// Shape name (e.g. BM.GPU.H100.8)
        shape: String,

        /// Threshold file override
        #[arg(long, env = "HPC_DOCTOR_SHAPES_FILE")]
        shapes: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ResultsCommands {
    /// Show outcomes from the results file
    Show {
        /// Results file to read (defaults to the configured location)
        #[arg(long, env = "HPC_DOCTOR_RESULTS_FILE")]
        results: Option<PathBuf>,

        /// Include every persisted run, not just the latest
        #[arg(long)]
        all_runs: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so tables and JSON stay pipeable.
    let default_filter = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = settings::Settings::load()?;
    tracing::info!(results_file = %settings.results_file.display(), "Settings loaded");

    match cli.command {
        Commands::Recommend {
            results,
            recommendations,
        } => {
            recommend::generate(&settings, results, recommendations, cli.format)?;
        }
        Commands::Shapes(shapes_cmd) => match shapes_cmd {
            ShapesCommands::List { shapes: file } => {
                shapes::list(&settings, file, cli.format)?;
            }
            ShapesCommands::Show { shape, shapes: file } => {
                shapes::show(&settings, &shape, file, cli.format)?;
            }
        },
        Commands::Results(results_cmd) => match results_cmd {
            ResultsCommands::Show { results, all_runs } => {
                results::show(&settings, results, all_runs, cli.format)?;
            }
        },
    }

    Ok(())
}
