//! Tuning constants and analysis parameters for Cadenza
//!
//! Every numeric knob of the analysis pipeline lives here: matcher bonus
//! values, aggregator coefficients, arbitration thresholds, calibration band
//! edges, and the per-profile weight multipliers. The pipeline crates read
//! these tables; nothing mutates them at runtime.

use serde::{Deserialize, Serialize};

/// Musical constants shared across the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicalConstants {
    pub scale_degrees: u8,
    pub chromatic_notes: u8,
    pub max_inversion: u8,
}

/// Default musical constants
pub const MUSICAL: MusicalConstants = MusicalConstants {
    scale_degrees: 7,
    chromatic_notes: 12,
    max_inversion: 3,
};

/// Pattern matcher limits and default bonus values
///
/// Bonuses are additive on top of a pattern's base weight and the sum is
/// clamped to [0, 1]. Individual patterns may override the bonus amounts in
/// their evidence block; these are the stock values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConstants {
    /// Largest admissible pattern window
    pub max_window: usize,
    /// Bonus when the final root motion in a window is a perfect fifth
    pub fifth_motion_bonus: f64,
    /// Bonus when a match terminates the progression
    pub closure_bonus: f64,
    /// Bonus for a root-position, stepwise-or-cadential resolution
    pub voice_leading_bonus: f64,
}

/// Default matcher constants
pub const MATCHER: MatcherConstants = MatcherConstants {
    max_window: 16,
    fifth_motion_bonus: 0.1,
    closure_bonus: 0.15,
    voice_leading_bonus: 0.2,
};

/// Track aggregator coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConstants {
    /// Multiplier on `ln(n + 1)` in the length normalizer
    pub normalizer_coefficient: f64,
    /// Span lengths below this are deprioritised linearly
    pub decay_full_length: usize,
    /// Added to the modal score when the mode's characteristic degree is used
    pub characteristic_bonus: f64,
    /// Linear weight on the outside-key ratio in the chromatic score
    pub outside_key_coefficient: f64,
    /// Expected evidence per chord, used by the uncertainty estimate
    pub expected_evidence_per_chord: f64,
}

/// Default scoring constants
pub const SCORING: ScoringConstants = ScoringConstants {
    normalizer_coefficient: 0.8,
    decay_full_length: 2,
    characteristic_bonus: 0.2,
    outside_key_coefficient: 0.35,
    expected_evidence_per_chord: 0.5,
};

/// Arbitration and ranking thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationConstants {
    /// Two track scores closer than this are treated as tied
    pub track_tie_delta: f64,
    /// Primary interpretations scoring below this raise an ambiguity warning
    pub ambiguous_key_threshold: f64,
    /// Default cap on reported alternatives
    pub max_alternatives: usize,
    /// Cap on candidate keys evaluated per request
    pub max_candidate_keys: usize,
}

/// Default arbitration constants
pub const ARBITRATION: ArbitrationConstants = ArbitrationConstants {
    track_tie_delta: 0.05,
    ambiguous_key_threshold: 0.2,
    max_alternatives: 4,
    max_candidate_keys: 6,
};

/// Band edges for calibration bucket routing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBands {
    /// Progressions up to this many chords are "short"
    pub chord_count_short_max: usize,
    /// Progressions of at least this many chords are "long"
    pub chord_count_long_min: usize,
    /// Outside-key ratios strictly below this are "low"
    pub outside_ratio_low_max: f64,
    /// Outside-key ratios at or above this are "high"
    pub outside_ratio_high_min: f64,
    /// Evidence strengths strictly below this are "weak"
    pub evidence_weak_max: f64,
    /// Evidence strengths at or above this are "strong"
    pub evidence_strong_min: f64,
}

/// Default calibration bands
pub const CALIBRATION_BANDS: CalibrationBands = CalibrationBands {
    chord_count_short_max: 4,
    chord_count_long_min: 9,
    outside_ratio_low_max: 0.1,
    outside_ratio_high_min: 0.35,
    evidence_weak_max: 0.25,
    evidence_strong_min: 0.6,
};

/// Style profile selecting a pattern subset and weight multipliers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Classical,
    Jazz,
    Pop,
    Modal,
    Folk,
    Choral,
}

impl Profile {
    /// All profiles, in declaration order
    pub const ALL: [Profile; 6] = [
        Profile::Classical,
        Profile::Jazz,
        Profile::Pop,
        Profile::Modal,
        Profile::Folk,
        Profile::Choral,
    ];

    /// Parse a profile name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "classical" => Some(Profile::Classical),
            "jazz" => Some(Profile::Jazz),
            "pop" => Some(Profile::Pop),
            "modal" => Some(Profile::Modal),
            "folk" => Some(Profile::Folk),
            "choral" => Some(Profile::Choral),
            _ => None,
        }
    }

    /// The profile's name
    pub fn name(self) -> &'static str {
        match self {
            Profile::Classical => "classical",
            Profile::Jazz => "jazz",
            Profile::Pop => "pop",
            Profile::Modal => "modal",
            Profile::Folk => "folk",
            Profile::Choral => "choral",
        }
    }

    /// Weight multiplier applied to patterns of the given family.
    ///
    /// A multiplier of zero removes the family from the profile's view of
    /// the library. `Classical` is the neutral profile: every family at 1.0.
    pub fn family_multiplier(self, family: &str) -> f64 {
        match self {
            Profile::Classical => 1.0,
            Profile::Jazz => match family {
                "progression" => 1.2,
                "chromatic" => 1.15,
                "modal" => 0.9,
                _ => 1.0,
            },
            Profile::Pop => match family {
                "progression" => 1.25,
                "chromatic" => 0.8,
                _ => 1.0,
            },
            Profile::Modal => match family {
                "modal" => 1.25,
                "cadence" => 0.9,
                _ => 1.0,
            },
            Profile::Folk => match family {
                "modal" => 1.1,
                "chromatic" => 0.7,
                _ => 1.0,
            },
            Profile::Choral => match family {
                "cadence" => 1.2,
                "melodic" => 1.1,
                _ => 1.0,
            },
        }
    }
}

/// Error type for configuration validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("configuration value out of range: {field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },
}

/// Validation trait for configuration structures
pub trait Validate {
    /// Validate the configuration values
    fn validate(&self) -> Result<(), ConfigError>;
}

impl Validate for MusicalConstants {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.chromatic_notes != 12 {
            return Err(ConfigError::InvalidValue {
                field: "chromatic_notes".to_string(),
                value: self.chromatic_notes.to_string(),
            });
        }
        if self.scale_degrees == 0 || self.scale_degrees > 12 {
            return Err(ConfigError::OutOfRange {
                field: "scale_degrees".to_string(),
                min: "1".to_string(),
                max: "12".to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for MatcherConstants {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_window".to_string(),
                value: "0".to_string(),
            });
        }
        for (field, value) in [
            ("fifth_motion_bonus", self.fifth_motion_bonus),
            ("closure_bonus", self.closure_bonus),
            ("voice_leading_bonus", self.voice_leading_bonus),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field: field.to_string(),
                    min: "0".to_string(),
                    max: "1".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Validate for ScoringConstants {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.normalizer_coefficient <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "normalizer_coefficient".to_string(),
                value: self.normalizer_coefficient.to_string(),
            });
        }
        if self.expected_evidence_per_chord <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "expected_evidence_per_chord".to_string(),
                value: self.expected_evidence_per_chord.to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for ArbitrationConstants {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.track_tie_delta) {
            return Err(ConfigError::OutOfRange {
                field: "track_tie_delta".to_string(),
                min: "0".to_string(),
                max: "1".to_string(),
            });
        }
        if self.max_candidate_keys == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_candidate_keys".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for CalibrationBands {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.chord_count_short_max >= self.chord_count_long_min {
            return Err(ConfigError::OutOfRange {
                field: "chord_count bands".to_string(),
                min: self.chord_count_short_max.to_string(),
                max: self.chord_count_long_min.to_string(),
            });
        }
        if self.outside_ratio_low_max >= self.outside_ratio_high_min {
            return Err(ConfigError::OutOfRange {
                field: "outside_ratio bands".to_string(),
                min: self.outside_ratio_low_max.to_string(),
                max: self.outside_ratio_high_min.to_string(),
            });
        }
        if self.evidence_weak_max >= self.evidence_strong_min {
            return Err(ConfigError::OutOfRange {
                field: "evidence bands".to_string(),
                min: self.evidence_weak_max.to_string(),
                max: self.evidence_strong_min.to_string(),
            });
        }
        Ok(())
    }
}
