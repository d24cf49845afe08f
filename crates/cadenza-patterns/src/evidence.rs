//! Evidence records emitted by the pattern matcher

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The three analytical perspectives a pattern can contribute to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Functional,
    Modal,
    Chromatic,
}

impl TrackKind {
    /// All tracks, in the arbitration preference order
    pub const ALL: [TrackKind; 3] = [TrackKind::Functional, TrackKind::Modal, TrackKind::Chromatic];

    /// Lower-case track name
    pub fn name(self) -> &'static str {
        match self {
            TrackKind::Functional => "functional",
            TrackKind::Modal => "modal",
            TrackKind::Chromatic => "chromatic",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-track pattern weights
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackWeights {
    #[serde(default)]
    pub functional: f64,
    #[serde(default)]
    pub modal: f64,
    #[serde(default)]
    pub chromatic: f64,
}

impl TrackWeights {
    /// Weight on the given track
    pub fn get(&self, track: TrackKind) -> f64 {
        match track {
            TrackKind::Functional => self.functional,
            TrackKind::Modal => self.modal,
            TrackKind::Chromatic => self.chromatic,
        }
    }

    /// True when every weight is zero
    pub fn is_empty(&self) -> bool {
        self.functional == 0.0 && self.modal == 0.0 && self.chromatic == 0.0
    }

    /// True when every weight lies in [0, 1]
    pub fn in_range(&self) -> bool {
        [self.functional, self.modal, self.chromatic]
            .iter()
            .all(|w| (0.0..=1.0).contains(w))
    }
}

/// Inclusive index span of a match within the token stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Span covering tokens `start..=end`
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Number of tokens covered
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    /// Spans are never empty; kept for symmetry with `len`
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True when the spans share at least one index
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Span shifted right by `offset` positions
    pub fn shifted(&self, offset: usize) -> Span {
        Span::new(self.start + offset, self.end + offset)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// One successful pattern match: the pattern, where it landed, its score,
/// and the per-track weights it contributes with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Dotted pattern id
    pub pattern_id: String,
    /// Matched token span, inclusive
    pub span: Span,
    /// Clamped score: pattern weight plus earned bonuses
    pub raw_score: f64,
    /// The pattern's per-track weights (aggregators multiply by raw_score)
    pub track_weights: TrackWeights,
    /// Feature flags copied from the pattern definition
    pub features: BTreeMap<String, f64>,
    /// Optional uncertainty, shaped by the pattern's confidence function
    pub uncertainty: Option<f64>,
}

impl Evidence {
    /// The evidence's contribution to one track before span decay
    pub fn track_contribution(&self, track: TrackKind) -> f64 {
        self.raw_score * self.track_weights.get(track)
    }
}
