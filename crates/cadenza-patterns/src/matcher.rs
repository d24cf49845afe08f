//! The pattern matcher
//!
//! Slides every pattern of a library view across the Roman-token stream of
//! one candidate key, checks step predicates and contextual constraints,
//! and emits scored evidence. The matcher is a pure function of its inputs;
//! evaluation order is priority descending then id ascending, which also
//! breaks every tie.

use crate::dsl::{CompiledStep, ConfidenceFn, Pattern, Scope};
use crate::evidence::{Evidence, Span};
use crate::library::{LibraryView, ViewEntry};
use cadenza_core::{shortest_motion, HarmonicRole, Key, PitchClass, RomanToken};
use log::trace;
use std::collections::BTreeMap;
use std::time::Instant;

/// Immutable per-key inputs to one matcher run
#[derive(Debug, Clone, Copy)]
pub struct MatchInput<'a> {
    /// Roman tokens, one per chord
    pub tokens: &'a [RomanToken],
    /// The candidate key the tokens were encoded against
    pub key: &'a Key,
    /// Chord roots, aligned with `tokens`
    pub roots: &'a [PitchClass],
    /// Sounding bass line, aligned with `tokens`
    pub bass: &'a [PitchClass],
    /// Soprano scale degrees when a melody was supplied
    pub soprano_degrees: Option<&'a [u8]>,
}

/// Matcher switches
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Reduce the evidence to a non-overlapping best cover
    pub best_cover: bool,
    /// Cooperative deadline, checked between pattern evaluations
    pub deadline: Option<Instant>,
}

/// The matcher's result: evidence plus a completeness flag
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub evidence: Vec<Evidence>,
    /// False when the deadline expired before every pattern was evaluated
    pub complete: bool,
}

/// Run every visible pattern over the token stream
pub fn match_patterns(
    input: MatchInput<'_>,
    view: &LibraryView<'_>,
    options: &MatchOptions,
) -> MatchOutcome {
    let n = input.tokens.len();
    let mut evidence: Vec<Evidence> = Vec::new();
    let mut complete = true;

    if n > 0 {
        for entry in view.entries() {
            if let Some(deadline) = options.deadline {
                if Instant::now() >= deadline {
                    complete = false;
                    break;
                }
            }
            let matches = match_one_pattern(&input, entry, n);
            if !matches.is_empty() {
                trace!(
                    "pattern {} produced {} match(es)",
                    entry.pattern.id,
                    matches.len()
                );
            }
            evidence.extend(resolve_same_pattern_overlaps(entry.pattern, matches));
        }
    }

    if options.best_cover {
        evidence = best_cover(evidence);
    }

    MatchOutcome { evidence, complete }
}

/// All accepted windows of one pattern, before overlap resolution
fn match_one_pattern(input: &MatchInput<'_>, entry: &ViewEntry<'_>, n: usize) -> Vec<Evidence> {
    let pattern = entry.pattern;
    let melodic_only = !pattern.scope.contains(&Scope::Harmonic)
        && !pattern.scope.contains(&Scope::Scale)
        && pattern.scope.contains(&Scope::Melodic);
    if melodic_only && input.soprano_degrees.is_none() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let fixed = pattern.fixed_step_count();
    for window_len in pattern.window.min..=pattern.window.max {
        if window_len > n || window_len < fixed {
            continue;
        }
        // Fixed-length sequences only fit windows of their own length
        if pattern.gap_index.is_none() && window_len != pattern.steps.len() {
            continue;
        }
        for start in 0..=(n - window_len) {
            if let Some(ev) = try_window(input, entry, start, window_len, n, melodic_only) {
                out.push(ev);
            }
        }
    }
    out
}

/// Evaluate one (pattern, start, length) window
fn try_window(
    input: &MatchInput<'_>,
    entry: &ViewEntry<'_>,
    start: usize,
    window_len: usize,
    n: usize,
    melodic: bool,
) -> Option<Evidence> {
    let pattern = entry.pattern;

    if !sequence_matches(input, pattern, start, window_len, melodic) {
        return None;
    }
    if !constraints_hold(input, pattern, start, window_len, n, melodic) {
        return None;
    }

    let end = start + window_len - 1;
    let mut raw = pattern.weight * entry.multiplier;
    if window_len >= 2 && !melodic {
        let root_motion = shortest_motion(input.roots[end - 1], input.roots[end]);
        if root_motion.abs() == 5 {
            raw += pattern.bonuses.fifth_motion;
        }
        let bass_motion = shortest_motion(input.bass[end - 1], input.bass[end]);
        if input.tokens[end].is_root_position() && matches!(bass_motion.abs(), 1 | 2 | 5) {
            raw += pattern.bonuses.voice_leading;
        }
    }
    if end + 1 == n {
        raw += pattern.bonuses.closure;
    }
    let raw = raw.clamp(0.0, 1.0);
    if raw == 0.0 {
        // A zero-weight pattern never changes the evidence set
        return None;
    }

    let uncertainty = match pattern.confidence_fn {
        ConfidenceFn::Stable => None,
        ConfidenceFn::SpanScaled => {
            let max = pattern.window.max.max(1) as f64;
            Some((1.0 - window_len as f64 / max).clamp(0.0, 1.0))
        }
        ConfidenceFn::EvidenceWeighted => Some((1.0 - raw).clamp(0.0, 1.0)),
    };

    let features: BTreeMap<String, f64> = pattern
        .features
        .iter()
        .map(|name| (name.clone(), 1.0))
        .collect();

    Some(Evidence {
        pattern_id: pattern.id.clone(),
        span: Span::new(start, end),
        raw_score: raw,
        track_weights: pattern.track,
        features,
        uncertainty,
    })
}

/// Align the step sequence against the window, honouring a single optional
/// variable-length gap.
fn sequence_matches(
    input: &MatchInput<'_>,
    pattern: &Pattern,
    start: usize,
    window_len: usize,
    melodic: bool,
) -> bool {
    match pattern.gap_index {
        None => {
            debug_assert_eq!(window_len, pattern.steps.len());
            pattern
                .steps
                .iter()
                .enumerate()
                .all(|(offset, step)| step_matches(input, step, start + offset, melodic))
        }
        Some(gap) => {
            let pre = &pattern.steps[..gap];
            let post = &pattern.steps[gap + 1..];
            if pre.len() + post.len() > window_len {
                return false;
            }
            let pre_ok = pre
                .iter()
                .enumerate()
                .all(|(offset, step)| step_matches(input, step, start + offset, melodic));
            let post_base = start + window_len - post.len();
            let post_ok = post
                .iter()
                .enumerate()
                .all(|(offset, step)| step_matches(input, step, post_base + offset, melodic));
            pre_ok && post_ok
        }
    }
}

/// Evaluate one step predicate against one position
fn step_matches(input: &MatchInput<'_>, step: &CompiledStep, index: usize, melodic: bool) -> bool {
    if melodic {
        // Melodic matching reads the soprano line; only degree and role
        // predicates are meaningful there.
        let Some(soprano) = input.soprano_degrees else {
            return false;
        };
        let degree = soprano[index];
        if !step.degree_any_of.is_empty() && !step.degree_any_of.contains(&degree) {
            return false;
        }
        if let Some(role) = step.role {
            if HarmonicRole::from_degree(degree) != role {
                return false;
            }
        }
        return step.quality_any_of.is_empty()
            && step.figure_any_of.is_empty()
            && step.figure_regex.is_none()
            && step.accidental.is_none()
            && step.root_position.is_none()
            && step.is_secondary.is_none()
            && step.is_borrowed.is_none();
    }

    let token = &input.tokens[index];
    if let Some(role) = step.role {
        if token.role() != role {
            return false;
        }
    }
    if !step.degree_any_of.is_empty() && !step.degree_any_of.contains(&token.degree) {
        return false;
    }
    if !step.quality_any_of.is_empty() && !step.quality_any_of.contains(&token.quality) {
        return false;
    }
    if let Some(accidental) = step.accidental {
        if token.accidental != accidental {
            return false;
        }
    }
    if !step.figure_any_of.is_empty() && !step.figure_any_of.contains(&token.figure) {
        return false;
    }
    if let Some(regex) = &step.figure_regex {
        if !regex.is_match(&token.render()) {
            return false;
        }
    }
    if let Some(root_position) = step.root_position {
        if token.is_root_position() != root_position {
            return false;
        }
    }
    if let Some(secondary) = step.is_secondary {
        if token.is_secondary() != secondary {
            return false;
        }
    }
    if let Some(borrowed) = step.is_borrowed {
        if token.is_borrowed() != borrowed {
            return false;
        }
    }
    true
}

/// Evaluate the constraint set over a window
fn constraints_hold(
    input: &MatchInput<'_>,
    pattern: &Pattern,
    start: usize,
    window_len: usize,
    n: usize,
    melodic: bool,
) -> bool {
    let constraints = &pattern.constraints;
    let end = start + window_len - 1;

    if !constraints.modes.is_empty() && !constraints.modes.contains(&input.key.mode) {
        return false;
    }
    if let Some(context) = constraints.key_context {
        let minorish = input.key.mode.is_minorish();
        let ok = match context {
            crate::dsl::KeyContext::Major => !minorish,
            crate::dsl::KeyContext::Minor => minorish,
        };
        if !ok {
            return false;
        }
    }
    if !constraints.bass_motion_any_of.is_empty() && !melodic {
        for j in start..end {
            let delta = shortest_motion(input.bass[j], input.bass[j + 1]);
            if !constraints.bass_motion_any_of.contains(&delta) {
                return false;
            }
        }
    }
    if let Some(required) = constraints.soprano_degree {
        if let Some(soprano) = input.soprano_degrees {
            if soprano[end] != required {
                return false;
            }
        }
        // Without a supplied soprano the constraint is unconstrained
    }
    if let Some(role) = constraints.ends_on_role {
        let end_role = if melodic {
            input
                .soprano_degrees
                .map(|s| HarmonicRole::from_degree(s[end]))
        } else {
            Some(input.tokens[end].role())
        };
        if end_role != Some(role) {
            return false;
        }
    }
    if let Some(required) = constraints.is_section_closure {
        if (end + 1 == n) != required {
            return false;
        }
    }
    if constraints.requires_characteristic_interval {
        let Some((_, degree)) = input.key.mode.characteristic_degree() else {
            return false;
        };
        let present = if melodic {
            input.soprano_degrees.is_some_and(|soprano| {
                soprano[start..=end].iter().any(|&d| d == degree)
            })
        } else {
            input.tokens[start..=end]
                .iter()
                .any(|t| t.degree == degree && t.accidental == cadenza_core::Accidental::Natural)
        };
        if !present {
            return false;
        }
    }
    true
}

/// Overlap policy for matches of the same pattern id: keep everything when
/// the pattern allows it, otherwise greedily keep the highest-scored,
/// earliest-starting, longest matches that do not overlap.
fn resolve_same_pattern_overlaps(pattern: &Pattern, mut matches: Vec<Evidence>) -> Vec<Evidence> {
    if pattern.window.overlap_ok || matches.len() <= 1 {
        return matches;
    }
    matches.sort_by(|a, b| {
        b.raw_score
            .total_cmp(&a.raw_score)
            .then_with(|| a.span.start.cmp(&b.span.start))
            .then_with(|| b.span.len().cmp(&a.span.len()))
    });
    let mut kept: Vec<Evidence> = Vec::new();
    for candidate in matches {
        if kept.iter().all(|k| !k.span.overlaps(&candidate.span)) {
            kept.push(candidate);
        }
    }
    kept.sort_by(|a, b| a.span.cmp(&b.span));
    kept
}

/// Non-overlapping subset maximising total raw score, by weighted interval
/// scheduling over spans sorted by end index.
fn best_cover(mut evidence: Vec<Evidence>) -> Vec<Evidence> {
    if evidence.len() <= 1 {
        return evidence;
    }
    evidence.sort_by(|a, b| {
        a.span
            .end
            .cmp(&b.span.end)
            .then_with(|| a.span.start.cmp(&b.span.start))
            .then_with(|| a.pattern_id.cmp(&b.pattern_id))
    });

    let m = evidence.len();
    // prev[j]: rightmost index ending before evidence[j] starts
    let prev: Vec<Option<usize>> = (0..m)
        .map(|j| {
            evidence[..j]
                .iter()
                .rposition(|e| e.span.end < evidence[j].span.start)
        })
        .collect();

    let mut dp = vec![0.0f64; m + 1];
    for j in 1..=m {
        let with = evidence[j - 1].raw_score + prev[j - 1].map_or(0.0, |p| dp[p + 1]);
        dp[j] = if with > dp[j - 1] { with } else { dp[j - 1] };
    }

    let mut selected = Vec::new();
    let mut j = m;
    while j > 0 {
        let with = evidence[j - 1].raw_score + prev[j - 1].map_or(0.0, |p| dp[p + 1]);
        if with > dp[j - 1] {
            selected.push(j - 1);
            j = prev[j - 1].map_or(0, |p| p + 1);
        } else {
            j -= 1;
        }
    }
    selected.reverse();
    selected.into_iter().map(|i| evidence[i].clone()).collect()
}
