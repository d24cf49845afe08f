//! Result assembly
//!
//! Builds the immutable analysis report: the ranked interpretations, a
//! one-line summary, pattern summaries, and deterministic reasoning text
//! generated from fixed templates keyed on pattern families.

use crate::error::AnalysisWarning;
use crate::tracks::{TrackScores, TrackUncertainties};
use cadenza_core::{Key, RomanToken};
use cadenza_patterns::{Evidence, Span, TrackKind};
use serde::{Deserialize, Serialize};

/// A compact view of one pattern match, for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub pattern_id: String,
    pub name: String,
    pub span: Span,
    pub raw_score: f64,
}

/// One ranked reading of the progression: a key, a track label, the Roman
/// stream, supporting patterns, and confidences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub key: Key,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub romans: Vec<RomanToken>,
    pub rendered_romans: Vec<String>,
    pub patterns: Vec<PatternSummary>,
    pub raw_confidence: TrackScores,
    pub uncertainty: TrackUncertainties,
    pub calibrated_confidence: f64,
    pub reasoning: String,
}

/// The analysis result: primary interpretation, ranked alternatives,
/// summary, detected patterns, and any warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub primary: Option<Interpretation>,
    pub alternatives: Vec<Interpretation>,
    pub summary: String,
    pub patterns_detected: Vec<PatternSummary>,
    pub warnings: Vec<AnalysisWarning>,
    pub partial: bool,
}

impl AnalysisReport {
    /// The sentinel result for an empty chord list
    pub fn empty() -> Self {
        AnalysisReport {
            primary: None,
            alternatives: Vec::new(),
            summary: "No chords to analyze.".to_string(),
            patterns_detected: Vec::new(),
            warnings: Vec::new(),
            partial: false,
        }
    }
}

/// Deterministic reasoning text from the strongest supporting patterns.
///
/// One clause per pattern family template, strongest first, capped at
/// three; no free-form generation.
pub fn build_reasoning(key: &Key, kind: TrackKind, tokens: &[RomanToken], top: &[(&Evidence, &str)]) -> String {
    if top.is_empty() {
        return format!(
            "{} ({}) rests on diatonic fit alone; no configured pattern matched.",
            key.display(),
            kind
        );
    }
    let clauses: Vec<String> = top
        .iter()
        .take(3)
        .map(|&(evidence, name)| clause_for(evidence, name, tokens))
        .collect();
    format!("{} ({}): {}.", key.display(), kind, clauses.join("; "))
}

fn clause_for(evidence: &Evidence, name: &str, tokens: &[RomanToken]) -> String {
    let family = evidence
        .pattern_id
        .split('.')
        .next()
        .unwrap_or(&evidence.pattern_id);
    let span = evidence.span;
    match family {
        "cadence" => {
            let resolution = tokens
                .get(span.end)
                .filter(|t| t.is_root_position())
                .map(|_| " with root-position resolution")
                .unwrap_or("");
            format!("{name} at span {span}{resolution}")
        }
        "progression" => format!("{name} spanning chords {}-{}", span.start, span.end),
        "modal" => format!("{name} colouring span {span}"),
        "chromatic" => {
            if span.len() == 1 {
                format!("{name} at chord {}", span.start)
            } else {
                format!("{name} across span {span}")
            }
        }
        "melodic" => format!("{name} in the melody at span {span}"),
        _ => format!("{name} at span {span}"),
    }
}

/// One-line report summary
pub fn build_summary(primary: Option<&Interpretation>, alternative_count: usize) -> String {
    match primary {
        Some(p) => format!(
            "Primary interpretation: {} ({}), confidence {:.2}; {} alternative(s) considered.",
            p.key.display(),
            p.kind,
            p.calibrated_confidence,
            alternative_count
        ),
        None => "No chords to analyze.".to_string(),
    }
}
