//! Track aggregators
//!
//! Three parallel folds over the evidence list, one per analytical track.
//! Each produces a raw score in [0, 1] for the candidate key: a span-decayed
//! weighted sum over the evidence, length-normalized, plus the track's own
//! contextual term (characteristic-degree bonus for modal, outside-key
//! ratio for chromatic).

use crate::context::AnalysisContext;
use cadenza_config::SCORING;
use cadenza_patterns::{Evidence, TrackKind};
use serde::{Deserialize, Serialize};

/// Raw per-track scores for one candidate key
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackScores {
    pub functional: f64,
    pub modal: f64,
    pub chromatic: f64,
}

impl TrackScores {
    /// Score on one track
    pub fn get(&self, track: TrackKind) -> f64 {
        match track {
            TrackKind::Functional => self.functional,
            TrackKind::Modal => self.modal,
            TrackKind::Chromatic => self.chromatic,
        }
    }

    /// The largest of the three scores
    pub fn max(&self) -> f64 {
        self.functional.max(self.modal).max(self.chromatic)
    }
}

/// Per-track uncertainty estimates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackUncertainties {
    pub functional: f64,
    pub modal: f64,
    pub chromatic: f64,
}

/// Short spans count for less; a single-chord match carries half weight
fn span_decay(len: usize) -> f64 {
    (len as f64 / SCORING.decay_full_length as f64).min(1.0)
}

/// Bounds long progressions: max(1, ln(n + 1) * c)
fn normalizer(n: usize) -> f64 {
    (((n + 1) as f64).ln() * SCORING.normalizer_coefficient).max(1.0)
}

/// Fold the evidence into per-track scores and uncertainties
pub fn aggregate(
    ctx: &AnalysisContext,
    evidence: &[Evidence],
) -> (TrackScores, TrackUncertainties) {
    let n = ctx.len();
    let norm = normalizer(n);

    let mut sums = TrackScores::default();
    let mut counts = [0usize; 3];
    for ev in evidence {
        let decay = span_decay(ev.span.len());
        sums.functional += ev.track_contribution(TrackKind::Functional) * decay;
        sums.modal += ev.track_contribution(TrackKind::Modal) * decay;
        sums.chromatic += ev.track_contribution(TrackKind::Chromatic) * decay;
        for (i, track) in TrackKind::ALL.iter().enumerate() {
            if ev.track_weights.get(*track) > 0.0 {
                counts[i] += 1;
            }
        }
    }

    let mut modal = sums.modal / norm;
    if ctx.characteristic_present {
        modal += SCORING.characteristic_bonus;
    }

    let chromatic =
        sums.chromatic / norm + ctx.outside_key_ratio * SCORING.outside_key_coefficient;

    let scores = TrackScores {
        functional: (sums.functional / norm).clamp(0.0, 1.0),
        modal: modal.clamp(0.0, 1.0),
        chromatic: chromatic.clamp(0.0, 1.0),
    };

    let expected = (n as f64 * SCORING.expected_evidence_per_chord).max(1.0);
    let uncertainty = |count: usize| (1.0 - count as f64 / expected).clamp(0.0, 1.0);
    let uncertainties = TrackUncertainties {
        functional: uncertainty(counts[0]),
        modal: uncertainty(counts[1]),
        chromatic: uncertainty(counts[2]),
    };

    (scores, uncertainties)
}
