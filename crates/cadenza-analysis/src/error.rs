//! Error and warning types for the analysis pipeline

use cadenza_core::TheoryError;
use cadenza_patterns::LibraryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request-time analysis failures.
///
/// Parse failures abort the request; everything that can be answered
/// partially is reported as a warning on a successful result instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Theory(#[from] TheoryError),

    #[error("melody length {melody} does not match chord count {chords}")]
    MelodyLengthMismatch { melody: usize, chords: usize },
}

/// Startup-time failures while loading shared artifacts
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

/// Errors raised while loading or validating a calibration artifact
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("invalid calibration artifact: {reason}")]
    InvalidArtifact { reason: String },

    #[error("malformed calibration document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Warnings accompanying a successful result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// No candidate key scored above the ambiguity threshold
    AmbiguousKey { best_score: f64 },
    /// The deadline expired; the result covers what was finished in time
    PartialResult,
}
