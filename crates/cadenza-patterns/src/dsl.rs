//! The JSON pattern DSL: document model, validation, and compilation
//!
//! The document model is strict: unknown fields are rejected, enums must
//! match, and cross-field rules are checked before anything is accepted.
//! Loading is all-or-nothing; a single bad definition fails the whole
//! document.

use crate::error::{LibraryError, LibraryResult};
use cadenza_config::MATCHER;
use cadenza_core::{Accidental, ChordQuality, HarmonicRole, InversionFigure, Mode};
use crate::evidence::TrackWeights;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Supported document version
pub const PATTERN_FILE_VERSION: u32 = 1;

/// Pattern id grammar: dotted lower-case segments
static PATTERN_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z0-9_]+)*$").unwrap_or_else(|_| unreachable!())
});

/// What stream a pattern reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Harmonic,
    Melodic,
    Scale,
}

/// Root document of a pattern library file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternFile {
    pub version: u32,
    pub patterns: Vec<PatternDef>,
}

/// One pattern definition, as written in the document
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternDef {
    pub id: String,
    pub name: String,
    #[serde(default = "default_scope")]
    pub scope: Vec<Scope>,
    pub track: TrackWeights,
    pub window: WindowSpec,
    pub sequence: Vec<StepPredicate>,
    #[serde(default)]
    pub constraints: ConstraintSet,
    pub evidence: EvidenceSpec,
    #[serde(default)]
    pub priority: u8,
}

fn default_scope() -> Vec<Scope> {
    vec![Scope::Harmonic]
}

/// Admissible window lengths for a pattern
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowSpec {
    pub min: usize,
    pub max: usize,
    #[serde(default)]
    pub overlap_ok: bool,
}

/// Predicate over a single Roman token.
///
/// Every present field must hold; an empty predicate matches any token. A
/// step with `gap: true` stands for a variable-length run of arbitrary
/// tokens; at most one gap is allowed per sequence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StepPredicate {
    pub gap: bool,
    pub role: Option<HarmonicRole>,
    pub degree_any_of: Vec<u8>,
    pub quality_any_of: Vec<ChordQuality>,
    pub accidental: Option<Accidental>,
    pub figure_any_of: Vec<String>,
    pub figure_regex: Option<String>,
    pub root_position: Option<bool>,
    pub is_secondary: Option<bool>,
    pub is_borrowed: Option<bool>,
}

/// Contextual facts a match must satisfy
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ConstraintSet {
    pub mode_any_of: Vec<String>,
    pub key_context: Option<KeyContext>,
    pub bass_motion_any_of: Vec<i8>,
    pub soprano_degree: Option<u8>,
    pub ends_on_role: Option<HarmonicRole>,
    pub is_section_closure: Option<bool>,
    pub requires_characteristic_interval: Option<bool>,
}

/// Coarse major/minor gate on the key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyContext {
    Major,
    Minor,
}

/// Scoring block of a pattern definition
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvidenceSpec {
    pub weight: f64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub confidence_fn: ConfidenceFn,
    #[serde(default)]
    pub bonuses: BonusSpec,
}

/// Per-pattern bonus overrides; zero means the bonus never applies
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BonusSpec {
    pub fifth_motion: f64,
    pub closure: f64,
    pub voice_leading: f64,
}

/// How a match's uncertainty is derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceFn {
    /// No uncertainty attached
    #[default]
    Stable,
    /// Uncertainty grows as the span undershoots the window maximum
    SpanScaled,
    /// Uncertainty is the complement of the raw score
    EvidenceWeighted,
}

/// A validated, compiled pattern ready for matching
#[derive(Debug, Clone)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    /// First dotted segment of the id
    pub family: String,
    pub scope: Vec<Scope>,
    pub track: TrackWeights,
    pub window: WindowSpec,
    pub steps: Vec<CompiledStep>,
    /// Index of the gap step within `steps`, when one exists
    pub gap_index: Option<usize>,
    pub constraints: CompiledConstraints,
    pub weight: f64,
    pub features: Vec<String>,
    pub confidence_fn: ConfidenceFn,
    pub bonuses: BonusSpec,
    pub priority: u8,
}

/// A step predicate with its figure list and regex resolved
#[derive(Debug, Clone)]
pub struct CompiledStep {
    pub gap: bool,
    pub role: Option<HarmonicRole>,
    pub degree_any_of: Vec<u8>,
    pub quality_any_of: Vec<ChordQuality>,
    pub accidental: Option<Accidental>,
    pub figure_any_of: Vec<InversionFigure>,
    pub figure_regex: Option<Regex>,
    pub root_position: Option<bool>,
    pub is_secondary: Option<bool>,
    pub is_borrowed: Option<bool>,
}

/// Constraint set with mode names resolved
#[derive(Debug, Clone)]
pub struct CompiledConstraints {
    pub modes: Vec<Mode>,
    pub key_context: Option<KeyContext>,
    pub bass_motion_any_of: Vec<i8>,
    pub soprano_degree: Option<u8>,
    pub ends_on_role: Option<HarmonicRole>,
    pub is_section_closure: Option<bool>,
    pub requires_characteristic_interval: bool,
}

impl Pattern {
    /// Number of non-gap steps in the sequence
    pub fn fixed_step_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.gap).count()
    }
}

fn invalid(id: &str, reason: impl Into<String>) -> LibraryError {
    LibraryError::InvalidPatternDefinition {
        id: id.to_string(),
        reason: reason.into(),
    }
}

fn parse_figure(id: &str, text: &str) -> LibraryResult<InversionFigure> {
    match text {
        "" | "none" => Ok(InversionFigure::None),
        "6" => Ok(InversionFigure::Six),
        "64" => Ok(InversionFigure::SixFour),
        "7" => Ok(InversionFigure::Seven),
        "65" => Ok(InversionFigure::SixFive),
        "43" => Ok(InversionFigure::FourThree),
        "42" => Ok(InversionFigure::FourTwo),
        other => Err(invalid(id, format!("unknown inversion figure {other:?}"))),
    }
}

impl PatternDef {
    /// Validate this definition and compile it for matching
    pub fn compile(self) -> LibraryResult<Pattern> {
        let id = self.id.clone();
        if !PATTERN_ID.is_match(&id) {
            return Err(invalid(&id, "id does not match the pattern id grammar"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid(&id, "name must not be empty"));
        }
        if self.scope.is_empty() {
            return Err(invalid(&id, "scope must not be empty"));
        }
        if self.track.is_empty() {
            return Err(invalid(&id, "at least one track weight must be positive"));
        }
        if !self.track.in_range() {
            return Err(invalid(&id, "track weights must lie in [0, 1]"));
        }
        if self.window.min == 0 {
            return Err(invalid(&id, "window.min must be at least 1"));
        }
        if self.window.min > self.window.max {
            return Err(invalid(&id, "window.min must not exceed window.max"));
        }
        if self.window.max > MATCHER.max_window {
            return Err(invalid(
                &id,
                format!("window.max exceeds the limit of {}", MATCHER.max_window),
            ));
        }
        if self.sequence.is_empty() {
            return Err(invalid(&id, "sequence must not be empty"));
        }
        let gap_count = self.sequence.iter().filter(|s| s.gap).count();
        if gap_count > 1 {
            return Err(invalid(&id, "at most one gap step is allowed"));
        }
        let fixed = self.sequence.len() - gap_count;
        if fixed > self.window.max {
            return Err(invalid(
                &id,
                "sequence has more fixed steps than window.max admits",
            ));
        }
        if !(0.0..=1.0).contains(&self.evidence.weight) {
            return Err(invalid(&id, "evidence.weight must lie in [0, 1]"));
        }
        for (label, value) in [
            ("fifth_motion", self.evidence.bonuses.fifth_motion),
            ("closure", self.evidence.bonuses.closure),
            ("voice_leading", self.evidence.bonuses.voice_leading),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(&id, format!("bonus {label} must lie in [0, 1]")));
            }
        }
        if self.priority > 100 {
            return Err(invalid(&id, "priority must lie in 0..=100"));
        }

        let mut modes = Vec::with_capacity(self.constraints.mode_any_of.len());
        for name in &self.constraints.mode_any_of {
            let mode = Mode::from_name(name)
                .ok_or_else(|| invalid(&id, format!("unknown mode {name:?}")))?;
            modes.push(mode);
        }
        if let Some(degree) = self.constraints.soprano_degree {
            if !(1..=7).contains(&degree) {
                return Err(invalid(&id, "soprano_degree must lie in 1..=7"));
            }
        }

        let gap_index = self.sequence.iter().position(|s| s.gap);
        let mut steps = Vec::with_capacity(self.sequence.len());
        for step in &self.sequence {
            if step.gap {
                let bare = step.role.is_none()
                    && step.degree_any_of.is_empty()
                    && step.quality_any_of.is_empty()
                    && step.accidental.is_none()
                    && step.figure_any_of.is_empty()
                    && step.figure_regex.is_none()
                    && step.root_position.is_none()
                    && step.is_secondary.is_none()
                    && step.is_borrowed.is_none();
                if !bare {
                    return Err(invalid(&id, "a gap step must not carry predicates"));
                }
            }
            for &degree in &step.degree_any_of {
                if !(1..=7).contains(&degree) {
                    return Err(invalid(&id, "degree_any_of entries must lie in 1..=7"));
                }
            }
            let mut figures = Vec::with_capacity(step.figure_any_of.len());
            for text in &step.figure_any_of {
                figures.push(parse_figure(&id, text)?);
            }
            let figure_regex = match &step.figure_regex {
                Some(text) => Some(
                    Regex::new(text)
                        .map_err(|e| invalid(&id, format!("bad figure_regex: {e}")))?,
                ),
                None => None,
            };
            steps.push(CompiledStep {
                gap: step.gap,
                role: step.role,
                degree_any_of: step.degree_any_of.clone(),
                quality_any_of: step.quality_any_of.clone(),
                accidental: step.accidental,
                figure_any_of: figures,
                figure_regex,
                root_position: step.root_position,
                is_secondary: step.is_secondary,
                is_borrowed: step.is_borrowed,
            });
        }

        let family = id.split('.').next().unwrap_or(&id).to_string();
        Ok(Pattern {
            family,
            id,
            name: self.name,
            scope: self.scope,
            track: self.track,
            window: self.window,
            steps,
            gap_index,
            constraints: CompiledConstraints {
                modes,
                key_context: self.constraints.key_context,
                bass_motion_any_of: self.constraints.bass_motion_any_of,
                soprano_degree: self.constraints.soprano_degree,
                ends_on_role: self.constraints.ends_on_role,
                is_section_closure: self.constraints.is_section_closure,
                requires_characteristic_interval: self
                    .constraints
                    .requires_characteristic_interval
                    .unwrap_or(false),
            },
            weight: self.evidence.weight,
            features: self.evidence.features,
            confidence_fn: self.evidence.confidence_fn,
            bonuses: self.evidence.bonuses,
            priority: self.priority,
        })
    }
}
