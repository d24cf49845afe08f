//! The analysis engine
//!
//! Owns the shared read-only artifacts (pattern library, calibration) and
//! runs the per-request pipeline: parse, enumerate candidate keys, encode,
//! match, aggregate, arbitrate, calibrate, rank, and assemble the report.
//! Candidate keys are independent and evaluated in parallel; results are
//! identical to sequential evaluation.

use crate::arbitration::choose_track;
use crate::calibration::{CalibrationArtifact, CalibrationFeatures};
use crate::context::AnalysisContext;
use crate::error::{AnalysisError, AnalysisWarning, SetupError};
use crate::report::{
    build_reasoning, build_summary, AnalysisReport, Interpretation, PatternSummary,
};
use crate::tracks::aggregate;
use cadenza_config::{Profile, ARBITRATION};
use cadenza_core::{
    detect_parent_scales, parse_chord_symbol, parse_key_hint, parse_note_name, split_symbols,
    Chord, Key, Mode, NoteName, PitchClass,
};
use cadenza_patterns::{match_patterns, LibraryView, MatchOptions, PatternLibrary};
use log::debug;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-request switches
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    /// Style profile selecting the pattern subset and weight multipliers
    pub profile: Profile,
    /// Cap on reported alternatives
    pub max_alternatives: usize,
    /// Reduce each key's evidence to a non-overlapping best cover
    pub best_cover: bool,
    /// Soft deadline; on expiry the best result so far is returned,
    /// flagged partial
    pub deadline: Option<Duration>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            profile: Profile::default(),
            max_alternatives: ARBITRATION.max_alternatives,
            best_cover: false,
            deadline: None,
        }
    }
}

/// One analysis request: chord text plus optional key hint, melody, and
/// options.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Raw chord input; tokens separated by whitespace, commas, or newlines
    pub chords: String,
    /// Optional key hint ("C major", "f# dorian")
    pub key_hint: Option<String>,
    /// Optional melody note names, one per chord
    pub melody: Option<Vec<String>>,
    /// Request options
    pub options: AnalysisOptions,
}

impl AnalysisRequest {
    /// A request over raw chord text with default options
    pub fn new(chords: impl Into<String>) -> Self {
        AnalysisRequest {
            chords: chords.into(),
            key_hint: None,
            melody: None,
            options: AnalysisOptions::default(),
        }
    }

    /// Attach a key hint
    pub fn with_key_hint(mut self, hint: impl Into<String>) -> Self {
        self.key_hint = Some(hint.into());
        self
    }

    /// Attach a melody line, one note per chord
    pub fn with_melody(mut self, notes: Vec<String>) -> Self {
        self.melody = Some(notes);
        self
    }

    /// Select a style profile
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.options.profile = profile;
        self
    }

    /// Enable best-cover evidence selection
    pub fn with_best_cover(mut self) -> Self {
        self.options.best_cover = true;
        self
    }

    /// Attach a soft deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.options.deadline = Some(deadline);
        self
    }
}

/// The engine: explicit shared values, no hidden state.
///
/// Both artifacts are loaded once and shared by read-only reference; the
/// engine itself is cheap to clone and safe to call from many threads.
#[derive(Clone)]
pub struct AnalysisEngine {
    library: Arc<PatternLibrary>,
    calibration: Arc<CalibrationArtifact>,
}

struct CandidateOutcome {
    interpretation: Interpretation,
    complete: bool,
}

impl AnalysisEngine {
    /// Build an engine over already-loaded artifacts
    pub fn new(library: Arc<PatternLibrary>, calibration: Arc<CalibrationArtifact>) -> Self {
        AnalysisEngine {
            library,
            calibration,
        }
    }

    /// Build an engine over the artifacts shipped with the crates
    pub fn with_defaults() -> Result<Self, SetupError> {
        Ok(AnalysisEngine {
            library: Arc::new(PatternLibrary::builtin()?),
            calibration: Arc::new(CalibrationArtifact::builtin()?),
        })
    }

    /// The engine's pattern library
    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// The engine's calibration artifact
    pub fn calibration(&self) -> &CalibrationArtifact {
        &self.calibration
    }

    /// Analyze a chord progression.
    ///
    /// Parse failures abort the request with an error; analysis warnings
    /// (ambiguous key, deadline expiry) accompany a successful report.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
        let symbols = split_symbols(&request.chords);
        if symbols.is_empty() {
            return Ok(AnalysisReport::empty());
        }

        let chords = symbols
            .iter()
            .map(|s| parse_chord_symbol(s))
            .collect::<Result<Vec<Chord>, _>>()?;

        let melody: Option<Vec<NoteName>> = match &request.melody {
            Some(notes) => {
                if notes.len() != chords.len() {
                    return Err(AnalysisError::MelodyLengthMismatch {
                        melody: notes.len(),
                        chords: chords.len(),
                    });
                }
                Some(
                    notes
                        .iter()
                        .map(|n| parse_note_name(n))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
            None => None,
        };

        let hint = match &request.key_hint {
            Some(text) => Some(parse_key_hint(text)?),
            None => None,
        };

        let candidates = candidate_keys(hint, &chords);
        debug!(
            "analyzing {} chords across {} candidate key(s), profile {}",
            chords.len(),
            candidates.len(),
            request.options.profile.name()
        );

        let deadline = request.options.deadline.map(|d| Instant::now() + d);
        let view = self.library.view(request.options.profile);

        let outcomes: Vec<Result<Option<CandidateOutcome>, AnalysisError>> = if candidates.len()
            > 1
        {
            candidates
                .par_iter()
                .map(|key| self.evaluate_candidate(key, &chords, melody.as_deref(), &view, request, deadline))
                .collect()
        } else {
            candidates
                .iter()
                .map(|key| self.evaluate_candidate(key, &chords, melody.as_deref(), &view, request, deadline))
                .collect()
        };

        let mut interpretations = Vec::with_capacity(candidates.len());
        let mut partial = false;
        for outcome in outcomes {
            match outcome? {
                Some(candidate) => {
                    partial |= !candidate.complete;
                    interpretations.push(candidate.interpretation);
                }
                None => partial = true,
            }
        }

        // Stable sort: exact calibrated ties keep candidate ranking order
        interpretations.sort_by(|a, b| {
            b.calibrated_confidence
                .total_cmp(&a.calibrated_confidence)
        });

        let mut warnings = Vec::new();
        let mut iter = interpretations.into_iter();
        let primary = iter.next();
        let alternatives: Vec<Interpretation> =
            iter.take(request.options.max_alternatives).collect();

        if let Some(p) = &primary {
            let best_raw = p.raw_confidence.max();
            if best_raw < ARBITRATION.ambiguous_key_threshold {
                warnings.push(AnalysisWarning::AmbiguousKey {
                    best_score: best_raw,
                });
            }
        }
        if partial {
            warnings.push(AnalysisWarning::PartialResult);
        }

        let patterns_detected = primary
            .as_ref()
            .map(|p| p.patterns.clone())
            .unwrap_or_default();
        let summary = if primary.is_none() && partial {
            "Deadline expired before any interpretation completed.".to_string()
        } else {
            build_summary(primary.as_ref(), alternatives.len())
        };

        Ok(AnalysisReport {
            primary,
            alternatives,
            summary,
            patterns_detected,
            warnings,
            partial,
        })
    }

    /// Evaluate one candidate key's subtree: encode, match, aggregate,
    /// arbitrate, calibrate.
    fn evaluate_candidate(
        &self,
        key: &Key,
        chords: &[Chord],
        melody: Option<&[NoteName]>,
        view: &LibraryView<'_>,
        request: &AnalysisRequest,
        deadline: Option<Instant>,
    ) -> Result<Option<CandidateOutcome>, AnalysisError> {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Ok(None);
            }
        }

        let ctx = AnalysisContext::build(key, chords, melody)?;
        let outcome = match_patterns(
            ctx.match_input(),
            view,
            &MatchOptions {
                best_cover: request.options.best_cover,
                deadline,
            },
        );

        let (scores, uncertainties) = aggregate(&ctx, &outcome.evidence);
        let (kind, best_raw) = choose_track(&scores);

        let features = CalibrationFeatures {
            chord_count: chords.len(),
            outside_key_ratio: ctx.outside_key_ratio,
            evidence_strength: best_raw,
            is_melody: melody.is_some(),
        };
        let calibrated = self.calibration.calibrate(best_raw, kind, &features);

        let mut ranked_evidence: Vec<&cadenza_patterns::Evidence> =
            outcome.evidence.iter().collect();
        ranked_evidence.sort_by(|a, b| {
            b.raw_score
                .total_cmp(&a.raw_score)
                .then_with(|| a.span.cmp(&b.span))
                .then_with(|| a.pattern_id.cmp(&b.pattern_id))
        });

        let named: Vec<(&cadenza_patterns::Evidence, &str)> = ranked_evidence
            .iter()
            .map(|e| {
                let name = self
                    .library
                    .get(&e.pattern_id)
                    .map(|p| p.name.as_str())
                    .unwrap_or(e.pattern_id.as_str());
                (*e, name)
            })
            .collect();

        let reasoning = build_reasoning(key, kind, &ctx.tokens, &named);
        let patterns: Vec<PatternSummary> = named
            .iter()
            .map(|(e, name)| PatternSummary {
                pattern_id: e.pattern_id.clone(),
                name: (*name).to_string(),
                span: e.span,
                raw_score: e.raw_score,
            })
            .collect();

        let interpretation = Interpretation {
            key: *key,
            kind,
            romans: ctx.tokens.clone(),
            rendered_romans: ctx.rendered.clone(),
            patterns,
            raw_confidence: scores,
            uncertainty: uncertainties,
            calibrated_confidence: calibrated,
            reasoning,
        };

        Ok(Some(CandidateOutcome {
            interpretation,
            complete: outcome.complete,
        }))
    }
}

/// Enumerate candidate keys: the hint first, then detected parent scales,
/// deduplicated by tonic, with a chromatic fallback on the outer chords.
fn candidate_keys(hint: Option<Key>, chords: &[Chord]) -> Vec<Key> {
    let mut union: Vec<PitchClass> = Vec::new();
    for chord in chords {
        for pc in chord.tone_classes() {
            if !union.contains(&pc) {
                union.push(pc);
            }
        }
    }

    let mut out: Vec<Key> = Vec::new();
    if let Some(key) = hint {
        out.push(key);
    }
    for key in detect_parent_scales(&union) {
        if !out.iter().any(|k| k.tonic == key.tonic) {
            out.push(key);
        }
    }

    if out.is_empty() {
        if let (Some(first), Some(last)) = (chords.first(), chords.last()) {
            out.push(Key::from_pitch_class(first.root, Mode::Ionian));
            if !out.iter().any(|k| k.tonic == last.root) {
                out.push(Key::from_pitch_class(last.root, Mode::Aeolian));
            }
        }
    }

    out.truncate(ARBITRATION.max_candidate_keys);
    out
}
