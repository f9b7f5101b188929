//! Result persistence for diagnostic runs
//!
//! Accumulates per-test outcomes during a run and persists them as either a
//! single latest result set (overwrite) or an append-only run history. The
//! reader is format-tolerant: it accepts both file shapes and picks the most
//! recent result set.

use crate::models::{HostResultSet, Run, RunHistory, TestOutcome};
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from results persistence and reading
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("failed to access results file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "results file {} matches neither shape (run history: {history_error}; result set: {set_error})",
        .path.display()
    )]
    Parse {
        path: PathBuf,
        history_error: String,
        set_error: String,
    },

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Write policy for [`ResultStore::persist`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    /// Replace the target file with the current result set
    Overwrite,
    /// Append the current result set as a new run, keeping prior runs
    Append,
}

/// In-memory accumulator for one run's outcomes
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    results: HostResultSet,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outcome for `test`; a test may record several (one per
    /// device), kept in insertion order
    pub fn record(&mut self, test: impl Into<String>, outcome: TestOutcome) {
        self.results.entry(test.into()).or_default().push(outcome);
    }

    /// Current result set
    pub fn results(&self) -> &HostResultSet {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Serialize the current result set to `path` under the given policy
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// an interrupted write leaves the prior contents intact.
    pub fn persist(&self, path: &Path, mode: PersistMode) -> Result<(), ResultsError> {
        match mode {
            PersistMode::Overwrite => {
                let json = serde_json::to_vec_pretty(&self.results)?;
                write_atomic(path, &json)?;
                info!(path = %path.display(), tests = self.results.len(), "Wrote result set");
            }
            PersistMode::Append => {
                let mut history = match read_file(path) {
                    Ok(data) => normalize_history(&data, path)?,
                    Err(ResultsError::Io { ref source, .. })
                        if source.kind() == std::io::ErrorKind::NotFound =>
                    {
                        RunHistory::default()
                    }
                    Err(e) => return Err(e),
                };

                let timestamp = Utc::now();
                history.test_runs.push(Run {
                    run_id: run_id(&timestamp),
                    timestamp,
                    test_results: self.results.clone(),
                });

                let json = serde_json::to_vec_pretty(&history)?;
                write_atomic(path, &json)?;
                info!(
                    path = %path.display(),
                    runs = history.test_runs.len(),
                    "Appended run to result history"
                );
            }
        }
        Ok(())
    }
}

/// Read back the most recent result set from `path`
///
/// Tries the multi-run history shape first and uses the last run; if that
/// parse fails or the run list is empty, tries the bare result-set shape.
/// There is no third fallback.
pub fn load_latest(path: &Path) -> Result<HostResultSet, ResultsError> {
    let data = read_file(path)?;

    let history_error = match serde_json::from_str::<RunHistory>(&data) {
        Ok(history) => {
            if let Some(run) = history.test_runs.last() {
                debug!(
                    path = %path.display(),
                    runs = history.test_runs.len(),
                    "Results file is a run history; using latest run"
                );
                return Ok(run.test_results.clone());
            }
            debug!(path = %path.display(), "Run history has no runs; trying bare result set");
            "run history has an empty test_runs list".to_string()
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Results file is not a run history; trying bare result set");
            e.to_string()
        }
    };

    parse_bare_set(&data, path, history_error)
}

/// Read back every persisted run from `path`
///
/// A bare result-set file is surfaced as a one-element history with no
/// run id, so callers see a uniform shape.
pub fn load_history(path: &Path) -> Result<RunHistory, ResultsError> {
    let data = read_file(path)?;

    let history_error = match serde_json::from_str::<RunHistory>(&data) {
        Ok(history) if !history.test_runs.is_empty() => return Ok(history),
        Ok(_) => "run history has an empty test_runs list".to_string(),
        Err(e) => e.to_string(),
    };

    let results = parse_bare_set(&data, path, history_error)?;
    Ok(RunHistory {
        test_runs: vec![Run {
            run_id: "unrecorded".to_string(),
            timestamp: Utc::now(),
            test_results: results,
        }],
    })
}

fn run_id(timestamp: &DateTime<Utc>) -> String {
    format!("run_{}", timestamp.format("%Y%m%d_%H%M%S%3f"))
}

fn read_file(path: &Path) -> Result<String, ResultsError> {
    fs::read_to_string(path).map_err(|source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Interpret an existing file as a run history for appending
///
/// A file already in the multi-run shape is used as-is; a bare result set is
/// first wrapped into a one-element run list. Anything else is a parse error
/// so a corrupt file is never clobbered.
fn normalize_history(data: &str, path: &Path) -> Result<RunHistory, ResultsError> {
    let history_error = match serde_json::from_str::<RunHistory>(data) {
        Ok(history) => return Ok(history),
        Err(e) => e.to_string(),
    };

    let results = parse_bare_set(data, path, history_error)?;
    let timestamp = Utc::now();
    debug!(path = %path.display(), "Normalizing single result set into a run history");
    Ok(RunHistory {
        test_runs: vec![Run {
            run_id: run_id(&timestamp),
            timestamp,
            test_results: results,
        }],
    })
}

fn parse_bare_set(
    data: &str,
    path: &Path,
    history_error: String,
) -> Result<HostResultSet, ResultsError> {
    match serde_json::from_str::<HostResultSet>(data) {
        // A result set with a test_runs key is a malformed run history, not
        // a check named "test_runs".
        Ok(results) if results.contains_key("test_runs") => Err(ResultsError::Parse {
            path: path.to_path_buf(),
            history_error,
            set_error: "result set contains a reserved test_runs key".to_string(),
        }),
        Ok(results) => Ok(results),
        Err(e) => Err(ResultsError::Parse {
            path: path.to_path_buf(),
            history_error,
            set_error: e.to_string(),
        }),
    }
}

/// Write atomically using a temp file and rename
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ResultsError> {
    let io_err = |source: std::io::Error| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(io_err)?;
    file.write_all(contents).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;

    fs::rename(&temp_path, path).map_err(io_err)?;
    Ok(())
}
