//! Shape threshold configuration
//!
//! Loads the JSON document mapping shape -> test name -> threshold entry and
//! answers enable/threshold lookups keyed by `(shape, test)`. The document is
//! found through a prioritized search path; the first existing file is used,
//! and a file that exists but does not parse is an error rather than a reason
//! to try the next candidate.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Development-tree location, relative to the working directory
pub const DEV_SHAPES_FILE: &str = "configs/shapes.json";

/// Fixed system-wide location
pub const SYSTEM_SHAPES_FILE: &str = "/etc/hpc-doctor/shapes.json";

/// Errors from threshold loading and lookup
#[derive(Debug, Error)]
pub enum ThresholdError {
    #[error("no shape threshold file found (searched: {})", format_searched(.searched))]
    ConfigNotFound { searched: Vec<PathBuf> },

    #[error("failed to read shape threshold file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse shape threshold file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("shape {shape} is not present in {}", .path.display())]
    ShapeNotFound { shape: String, path: PathBuf },

    #[error("test {test} is not configured for shape {shape}")]
    TestNotFound { shape: String, test: String },

    #[error("test {test} is disabled for shape {shape}")]
    TestDisabled { shape: String, test: String },

    #[error("test {test} has no threshold value for shape {shape}")]
    ThresholdNotDefined { shape: String, test: String },
}

fn format_searched(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Search-path inputs for the threshold file
///
/// Candidates are tried highest priority first: explicit override, configured
/// path, development-relative file, fixed system location. The candidate list
/// is computable without filesystem access so the order itself is testable.
#[derive(Debug, Clone, Default)]
pub struct ShapePaths {
    /// Explicit override (e.g. a CLI flag)
    pub override_path: Option<PathBuf>,
    /// Path from the tool configuration (`HPC_DOCTOR_SHAPES_FILE`)
    pub configured: Option<PathBuf>,
}

impl ShapePaths {
    /// Candidate files in priority order
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(4);
        if let Some(path) = &self.override_path {
            candidates.push(path.clone());
        }
        if let Some(path) = &self.configured {
            candidates.push(path.clone());
        }
        candidates.push(PathBuf::from(DEV_SHAPES_FILE));
        candidates.push(PathBuf::from(SYSTEM_SHAPES_FILE));
        candidates
    }
}

/// A threshold value as stored in the shape file
///
/// The file is free to store a plain number, a string, a list of allowed
/// values, or an object with named sub-fields. The store never interprets
/// the inner shape; callers pick the accessor matching the test they
/// represent.
#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    Number(serde_json::Number),
    Text(String),
    List(Vec<Value>),
    Object(serde_json::Map<String, Value>),
}

impl Threshold {
    /// Numeric threshold, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Threshold::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Integral threshold, if this is a whole number
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Threshold::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// String threshold, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Threshold::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Allowed-value list, if this is an array
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Threshold::List(items) => Some(items),
            _ => None,
        }
    }

    /// Named sub-field, if this is an object
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Threshold::Object(fields) => fields.get(name),
            _ => None,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Number(n) => write!(f, "{}", n),
            Threshold::Text(s) => f.write_str(s),
            Threshold::List(items) => write!(f, "{}", Value::Array(items.clone())),
            Threshold::Object(fields) => write!(f, "{}", Value::Object(fields.clone())),
        }
    }
}

// Decoded by inspecting the JSON kind; booleans and null are not meaningful
// threshold values and are rejected up front.
impl<'de> Deserialize<'de> for Threshold {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Number(n) => Ok(Threshold::Number(n)),
            Value::String(s) => Ok(Threshold::Text(s)),
            Value::Array(items) => Ok(Threshold::List(items)),
            Value::Object(fields) => Ok(Threshold::Object(fields)),
            Value::Bool(_) => Err(de::Error::custom("threshold cannot be a boolean")),
            Value::Null => Err(de::Error::custom("threshold cannot be null")),
        }
    }
}

impl Serialize for Threshold {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Threshold::Number(n) => n.serialize(serializer),
            Threshold::Text(s) => serializer.serialize_str(s),
            Threshold::List(items) => items.serialize(serializer),
            Threshold::Object(fields) => fields.serialize(serializer),
        }
    }
}

/// Per-shape configuration of one test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEntry {
    pub enabled: bool,
    pub category: String,
    /// Absent for pure presence checks that have no tunable boundary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Threshold>,
}

type ShapeConfig = HashMap<String, HashMap<String, ThresholdEntry>>;

/// Resolves per-shape test thresholds loaded from the shape file
#[derive(Debug, Clone)]
pub struct ThresholdStore {
    shapes: ShapeConfig,
    source: PathBuf,
}

impl ThresholdStore {
    /// Load the first existing threshold file from the search path
    ///
    /// A missing file moves on to the next candidate; a file that exists but
    /// fails to parse is fatal for the load.
    pub fn load(paths: &ShapePaths) -> Result<Self, ThresholdError> {
        let candidates = paths.candidates();
        for candidate in &candidates {
            if !candidate.exists() {
                debug!(path = %candidate.display(), "Shape threshold candidate not present");
                continue;
            }

            let data = fs::read_to_string(candidate).map_err(|source| ThresholdError::Io {
                path: candidate.clone(),
                source,
            })?;
            let shapes: ShapeConfig =
                serde_json::from_str(&data).map_err(|source| ThresholdError::ConfigParse {
                    path: candidate.clone(),
                    source,
                })?;

            info!(
                path = %candidate.display(),
                shapes = shapes.len(),
                "Loaded shape thresholds"
            );
            return Ok(Self {
                shapes,
                source: candidate.clone(),
            });
        }

        Err(ThresholdError::ConfigNotFound {
            searched: candidates,
        })
    }

    /// Path of the file this store was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Resolve the entry for `(shape, test)`
    pub fn resolve(&self, shape: &str, test: &str) -> Result<&ThresholdEntry, ThresholdError> {
        let tests = self
            .shapes
            .get(shape)
            .ok_or_else(|| ThresholdError::ShapeNotFound {
                shape: shape.to_string(),
                path: self.source.clone(),
            })?;
        tests.get(test).ok_or_else(|| ThresholdError::TestNotFound {
            shape: shape.to_string(),
            test: test.to_string(),
        })
    }

    /// Whether `test` is enabled for `shape`
    pub fn enabled(&self, shape: &str, test: &str) -> Result<bool, ThresholdError> {
        Ok(self.resolve(shape, test)?.enabled)
    }

    /// Threshold value for an enabled `(shape, test)` pair
    ///
    /// A disabled test's threshold is not meaningful, so this fails with
    /// `TestDisabled` even when the file carries a value.
    pub fn threshold(&self, shape: &str, test: &str) -> Result<&Threshold, ThresholdError> {
        let entry = self.resolve(shape, test)?;
        if !entry.enabled {
            return Err(ThresholdError::TestDisabled {
                shape: shape.to_string(),
                test: test.to_string(),
            });
        }
        entry
            .threshold
            .as_ref()
            .ok_or_else(|| ThresholdError::ThresholdNotDefined {
                shape: shape.to_string(),
                test: test.to_string(),
            })
    }

    /// Names of the tests enabled for `shape`, in file order
    pub fn enabled_tests(&self, shape: &str) -> Result<Vec<&str>, ThresholdError> {
        let tests = self
            .shapes
            .get(shape)
            .ok_or_else(|| ThresholdError::ShapeNotFound {
                shape: shape.to_string(),
                path: self.source.clone(),
            })?;
        Ok(tests
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(name, _)| name.as_str())
            .collect())
    }

    /// Every configured test for `shape`, enabled or not, in file order
    pub fn shape_tests(
        &self,
        shape: &str,
    ) -> Result<Vec<(&str, &ThresholdEntry)>, ThresholdError> {
        let tests = self
            .shapes
            .get(shape)
            .ok_or_else(|| ThresholdError::ShapeNotFound {
                shape: shape.to_string(),
                path: self.source.clone(),
            })?;
        Ok(tests
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
            .collect())
    }

    /// Distinct shape keys present in the configuration
    pub fn available_shapes(&self) -> Vec<&str> {
        self.shapes.keys().map(|s| s.as_str()).collect()
    }
}
