//! Per-candidate-key analysis context
//!
//! A context bundles everything one key's subtree needs: the encoded Roman
//! stream, the bass and root lines, soprano degrees when a melody was
//! supplied, and the contextual facts (outside-key ratio, characteristic
//! degree usage) the aggregators read. Contexts are immutable once built.

use cadenza_core::{
    encode_progression, Accidental, Chord, Key, NoteName, PitchClass, RomanToken, TheoryResult,
};
use cadenza_patterns::MatchInput;

/// Immutable inputs for one candidate key's evaluation
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    /// The candidate key
    pub key: Key,
    /// Roman tokens, one per chord
    pub tokens: Vec<RomanToken>,
    /// Rendered token texts, aligned with `tokens`
    pub rendered: Vec<String>,
    /// Chord roots
    pub roots: Vec<PitchClass>,
    /// Sounding bass line
    pub bass: Vec<PitchClass>,
    /// Soprano scale degrees, when a melody was supplied
    pub soprano_degrees: Option<Vec<u8>>,
    /// Fraction of chords outside the key
    pub outside_key_ratio: f64,
    /// True when the mode's characteristic degree is used by some token
    pub characteristic_present: bool,
}

impl AnalysisContext {
    /// Build the context for one candidate key
    pub fn build(
        key: &Key,
        chords: &[Chord],
        melody: Option<&[NoteName]>,
    ) -> TheoryResult<AnalysisContext> {
        let tokens = encode_progression(chords, key)?;
        let rendered = tokens.iter().map(RomanToken::render).collect();
        let roots = chords.iter().map(|c| c.root).collect();
        let bass = chords.iter().map(Chord::bass_class).collect();
        let soprano_degrees = melody.map(|notes| {
            notes
                .iter()
                .map(|n| key.degree_of_chromatic(n.pitch_class()).0)
                .collect()
        });

        let outside = chords.iter().filter(|c| !key.is_diatonic(c)).count();
        let outside_key_ratio = if chords.is_empty() {
            0.0
        } else {
            outside as f64 / chords.len() as f64
        };

        let characteristic_present = match key.mode.characteristic_degree() {
            Some((_, degree)) => tokens
                .iter()
                .any(|t: &RomanToken| t.degree == degree && t.accidental == Accidental::Natural),
            None => false,
        };

        Ok(AnalysisContext {
            key: *key,
            tokens,
            rendered,
            roots,
            bass,
            soprano_degrees,
            outside_key_ratio,
            characteristic_present,
        })
    }

    /// Number of chords in the progression
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True for the empty progression
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Borrow the context as matcher input
    pub fn match_input(&self) -> MatchInput<'_> {
        MatchInput {
            tokens: &self.tokens,
            key: &self.key,
            roots: &self.roots,
            bass: &self.bass,
            soprano_degrees: self.soprano_degrees.as_deref(),
        }
    }
}
