//! Core library for the HPC node doctor
//!
//! This crate provides the pieces every diagnostic check is built on:
//! - Shape-keyed threshold resolution from a prioritized config search path
//! - Multi-run result persistence with a format-tolerant reader
//! - Template-based recommendation generation with a built-in fallback

pub mod models;
pub mod recommender;
pub mod results;
pub mod thresholds;

pub use models::*;
pub use recommender::{
    RecommendationEngine, RecommendationError, RecommendationPaths, FALLBACK_SUMMARY_MARKER,
};
pub use results::{load_history, load_latest, PersistMode, ResultStore, ResultsError};
pub use thresholds::{ShapePaths, Threshold, ThresholdEntry, ThresholdError, ThresholdStore};
