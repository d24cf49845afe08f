//! Confidence calibration
//!
//! Raw track scores pass through a bucketed monotone remap loaded from a
//! calibration artifact: a Platt sigmoid followed by isotonic
//! piecewise-linear interpolation, per track and bucket. Buckets that could
//! not be reliably learned declare `method: "identity"` and pass scores
//! through untouched; that fallback is part of the contract, not an error.

use crate::error::CalibrationError;
use cadenza_config::CALIBRATION_BANDS;
use cadenza_patterns::TrackKind;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default all-identity artifact shipped with the crate
const BUILTIN_CALIBRATION: &str = include_str!("../data/calibration.json");

/// Bucket name used when no feature-derived bucket is present
pub const GLOBAL_BUCKET: &str = "GLOBAL";

/// Platt scaling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattParams {
    pub a: f64,
    pub b: f64,
}

/// Isotonic regression knots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotonicKnots {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// How a bucket's curve was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveMethod {
    Learned,
    Identity,
}

/// One bucket's calibration curve.
///
/// Unknown sibling fields (version markers, fix notes) are informational
/// and ignored on load.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BucketCurve {
    pub platt: PlattParams,
    pub isotonic: IsotonicKnots,
    pub method: CurveMethod,
}

impl BucketCurve {
    /// The explicit pass-through curve
    pub fn identity() -> Self {
        BucketCurve {
            platt: PlattParams { a: 1.0, b: 0.0 },
            isotonic: IsotonicKnots {
                x: vec![0.0, 1.0],
                y: vec![0.0, 1.0],
            },
            method: CurveMethod::Identity,
        }
    }

    fn validate(&self, track: &str, bucket: &str) -> Result<(), CalibrationError> {
        // A negative Platt slope would make the remap decreasing; the
        // calibration contract is monotone non-decreasing in the raw score
        if self.method == CurveMethod::Learned && self.platt.a < 0.0 {
            return Err(CalibrationError::InvalidArtifact {
                reason: format!("{track}/{bucket}: platt slope must be non-negative"),
            });
        }
        let IsotonicKnots { x, y } = &self.isotonic;
        if x.len() != y.len() {
            return Err(CalibrationError::InvalidArtifact {
                reason: format!("{track}/{bucket}: isotonic knot lengths differ"),
            });
        }
        if x.is_empty() {
            return Err(CalibrationError::InvalidArtifact {
                reason: format!("{track}/{bucket}: isotonic knots are empty"),
            });
        }
        if x.windows(2).any(|w| w[0] > w[1]) {
            return Err(CalibrationError::InvalidArtifact {
                reason: format!("{track}/{bucket}: isotonic x knots must be non-decreasing"),
            });
        }
        if y.windows(2).any(|w| w[0] > w[1]) {
            return Err(CalibrationError::InvalidArtifact {
                reason: format!("{track}/{bucket}: isotonic y knots must be non-decreasing"),
            });
        }
        Ok(())
    }

    /// Apply the curve: Platt sigmoid, then clamped isotonic interpolation
    pub fn apply(&self, raw: f64) -> f64 {
        if self.method == CurveMethod::Identity {
            return raw;
        }
        let p = sigmoid(self.platt.a * raw + self.platt.b);
        interpolate(&self.isotonic, p)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Piecewise-linear interpolation clamped to the knot endpoints
fn interpolate(knots: &IsotonicKnots, value: f64) -> f64 {
    let IsotonicKnots { x, y } = knots;
    let first = x[0];
    let last = x[x.len() - 1];
    if value <= first {
        return y[0];
    }
    if value >= last {
        return y[y.len() - 1];
    }
    for i in 1..x.len() {
        if value <= x[i] {
            let span = x[i] - x[i - 1];
            if span <= f64::EPSILON {
                return y[i];
            }
            let t = (value - x[i - 1]) / span;
            return y[i - 1] + t * (y[i] - y[i - 1]);
        }
    }
    y[y.len() - 1]
}

/// Features routing an interpretation to a calibration bucket.
///
/// An explicit struct stands in for the dynamic feature lookup of looser
/// runtimes: the bucket name is a pure function of these four fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFeatures {
    pub chord_count: usize,
    pub outside_key_ratio: f64,
    pub evidence_strength: f64,
    pub is_melody: bool,
}

impl CalibrationFeatures {
    /// Band the chord count: short, medium, or long
    pub fn count_band(&self) -> &'static str {
        let bands = &CALIBRATION_BANDS;
        if self.chord_count <= bands.chord_count_short_max {
            "short"
        } else if self.chord_count >= bands.chord_count_long_min {
            "long"
        } else {
            "medium"
        }
    }

    /// Band the outside-key ratio: low, mid, or high
    pub fn outside_band(&self) -> &'static str {
        let bands = &CALIBRATION_BANDS;
        if self.outside_key_ratio < bands.outside_ratio_low_max {
            "low"
        } else if self.outside_key_ratio >= bands.outside_ratio_high_min {
            "high"
        } else {
            "mid"
        }
    }

    /// Band the evidence strength: weak, moderate, or strong
    pub fn evidence_band(&self) -> &'static str {
        let bands = &CALIBRATION_BANDS;
        if self.evidence_strength < bands.evidence_weak_max {
            "weak"
        } else if self.evidence_strength >= bands.evidence_strong_min {
            "strong"
        } else {
            "moderate"
        }
    }

    /// The bucket this feature combination routes to
    pub fn bucket_name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.count_band(),
            self.outside_band(),
            self.evidence_band(),
            if self.is_melody { "melody" } else { "chords" }
        )
    }
}

/// Serde mirror of the artifact document; lenient about unknown fields
#[derive(Debug, Deserialize)]
struct ArtifactDoc {
    version: String,
    tracks: BTreeMap<TrackKind, BTreeMap<String, BucketCurve>>,
}

/// A loaded calibration artifact: per-track, per-bucket curves
#[derive(Debug, Clone)]
pub struct CalibrationArtifact {
    version: String,
    tracks: BTreeMap<TrackKind, BTreeMap<String, BucketCurve>>,
}

impl CalibrationArtifact {
    /// Load and validate an artifact from JSON
    pub fn from_json_str(json: &str) -> Result<Self, CalibrationError> {
        let doc: ArtifactDoc = serde_json::from_str(json)?;
        for (track, buckets) in &doc.tracks {
            for (bucket, curve) in buckets {
                curve.validate(track.name(), bucket)?;
            }
        }
        debug!(
            "loaded calibration artifact {} ({} tracks)",
            doc.version,
            doc.tracks.len()
        );
        Ok(CalibrationArtifact {
            version: doc.version,
            tracks: doc.tracks,
        })
    }

    /// Load the identity artifact shipped with the crate
    pub fn builtin() -> Result<Self, CalibrationError> {
        Self::from_json_str(BUILTIN_CALIBRATION)
    }

    /// An artifact with no learned curves at all; every lookup falls
    /// through to the identity mapping.
    pub fn identity() -> Self {
        CalibrationArtifact {
            version: "identity".to_string(),
            tracks: BTreeMap::new(),
        }
    }

    /// Artifact version string (opaque)
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Calibrate a raw score for one track, routing by features.
    ///
    /// Lookup order: the feature-derived bucket, then `GLOBAL`, then the
    /// identity mapping.
    pub fn calibrate(&self, raw: f64, track: TrackKind, features: &CalibrationFeatures) -> f64 {
        let curve = self.tracks.get(&track).and_then(|buckets| {
            buckets
                .get(&features.bucket_name())
                .or_else(|| buckets.get(GLOBAL_BUCKET))
        });
        match curve {
            Some(curve) => curve.apply(raw),
            None => raw,
        }
    }
}
