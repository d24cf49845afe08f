//! End-to-end scenarios against the shipped pattern library and the
//! identity calibration artifact.

use cadenza_analysis::{
    AnalysisEngine, AnalysisReport, AnalysisRequest, AnalysisWarning, Interpretation,
};
use cadenza_config::Profile;
use cadenza_patterns::TrackKind;
use std::time::Duration;

fn engine() -> AnalysisEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    AnalysisEngine::with_defaults().expect("builtin artifacts load")
}

fn analyze(chords: &str, hint: &str) -> AnalysisReport {
    engine()
        .analyze(&AnalysisRequest::new(chords).with_key_hint(hint))
        .expect("analysis succeeds")
}

fn primary(report: &AnalysisReport) -> &Interpretation {
    report.primary.as_ref().expect("primary interpretation")
}

fn assert_primary_beats_alternatives(report: &AnalysisReport) {
    let p = primary(report);
    for alt in &report.alternatives {
        assert!(
            p.calibrated_confidence > alt.calibrated_confidence,
            "alternative {} ({:.3}) not below primary {} ({:.3})",
            alt.key,
            alt.calibrated_confidence,
            p.key,
            p.calibrated_confidence
        );
    }
}

fn detected_ids(report: &AnalysisReport) -> Vec<&str> {
    report
        .patterns_detected
        .iter()
        .map(|p| p.pattern_id.as_str())
        .collect()
}

#[test]
fn scenario_authentic_cadence() {
    let report = analyze("C F G C", "C major");
    let p = primary(&report);
    assert_eq!(p.key.display(), "C major");
    assert_eq!(p.rendered_romans, vec!["I", "IV", "V", "I"]);
    assert_eq!(p.kind, TrackKind::Functional);
    assert!(detected_ids(&report).contains(&"cadence.authentic.perfect"));
    assert_primary_beats_alternatives(&report);
}

#[test]
fn scenario_pop_loop() {
    let report = analyze("Am F C G", "C major");
    let p = primary(&report);
    assert_eq!(p.key.display(), "C major");
    assert_eq!(p.rendered_romans, vec!["vi", "IV", "I", "V"]);
    assert!(detected_ids(&report).contains(&"progression.pop.vi_iv_i_v"));
    assert_primary_beats_alternatives(&report);
}

#[test]
fn scenario_ii_v_i() {
    let report = analyze("Dm7 G7 Cmaj7", "C major");
    let p = primary(&report);
    assert_eq!(p.rendered_romans, vec!["ii7", "V7", "Imaj7"]);
    let ids = detected_ids(&report);
    assert!(ids.contains(&"cadence.authentic.perfect"));
    assert!(ids.contains(&"progression.ii_v_i"));
    assert_primary_beats_alternatives(&report);
}

#[test]
fn scenario_secondary_dominant() {
    let report = analyze("C A7 Dm G7 C", "C major");
    let p = primary(&report);
    assert_eq!(
        p.rendered_romans,
        vec!["I", "V7/ii", "ii", "V7", "I"]
    );
    assert_eq!(p.kind, TrackKind::Functional);
    let ids = detected_ids(&report);
    assert!(ids.contains(&"chromatic.secondary_dominant"));
    assert!(ids.contains(&"cadence.authentic.perfect"));
    let secondary = report
        .patterns_detected
        .iter()
        .find(|s| s.pattern_id == "chromatic.secondary_dominant")
        .unwrap();
    assert_eq!((secondary.span.start, secondary.span.end), (1, 1));
    assert_primary_beats_alternatives(&report);
}

#[test]
fn scenario_phrygian_cadence() {
    let report = analyze("Am Dm/F E", "A minor");
    let p = primary(&report);
    assert_eq!(p.key.display(), "A minor");
    assert_eq!(p.rendered_romans, vec!["i", "iv6", "V"]);
    assert!(detected_ids(&report).contains(&"cadence.phrygian"));
    assert_primary_beats_alternatives(&report);
}

#[test]
fn scenario_mixolydian_vamp_is_modal() {
    let report = analyze("G F G F", "C major");
    let p = primary(&report);
    assert_eq!(p.rendered_romans, vec!["V", "IV", "V", "IV"]);
    assert_eq!(p.kind, TrackKind::Modal, "vamp should read as modal");
    assert!(detected_ids(&report).contains(&"modal.mixolydian.bvii_vamp"));
    assert_primary_beats_alternatives(&report);
}

#[test]
fn empty_input_yields_sentinel() {
    let report = engine()
        .analyze(&AnalysisRequest::new("  ,\n "))
        .expect("empty input is not an error");
    assert!(report.primary.is_none());
    assert!(report.alternatives.is_empty());
    assert!(report.patterns_detected.is_empty());
    assert!(!report.partial);
}

#[test]
fn single_chord_matches_only_unit_spans() {
    let report = analyze("C", "C major");
    for summary in &report.patterns_detected {
        assert_eq!(summary.span.len(), 1);
    }
    assert!(detected_ids(&report)
        .iter()
        .all(|id| !id.starts_with("cadence.")));
}

#[test]
fn weak_evidence_raises_ambiguity_warning() {
    // A lone suspended chord supports no configured pattern in any key
    let report = analyze("Dsus4", "C major");
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, AnalysisWarning::AmbiguousKey { .. })));
}

#[test]
fn strong_evidence_raises_no_warning() {
    let report = analyze("C F G C", "C major");
    assert!(report.warnings.is_empty());
    assert!(!report.partial);
}

#[test]
fn transposition_yields_isomorphic_reports() {
    let c = analyze("C F G C", "C major");
    let d = analyze("D G A D", "D major");
    let pc = primary(&c);
    let pd = primary(&d);
    assert_eq!(pc.rendered_romans, pd.rendered_romans);
    assert_eq!(detected_ids(&c), detected_ids(&d));
    for (a, b) in c.patterns_detected.iter().zip(&d.patterns_detected) {
        assert!((a.raw_score - b.raw_score).abs() < 1e-12);
        assert_eq!(a.span, b.span);
    }
    assert!((pc.calibrated_confidence - pd.calibrated_confidence).abs() < 1e-12);
}

#[test]
fn analysis_is_deterministic() {
    let request = AnalysisRequest::new("C A7 Dm G7 C").with_key_hint("C major");
    let engine = engine();
    let first = engine.analyze(&request).unwrap();
    let second = engine.analyze(&request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn no_hint_still_finds_the_home_key() {
    let report = engine()
        .analyze(&AnalysisRequest::new("Dm7 G7 Cmaj7"))
        .unwrap();
    let p = primary(&report);
    assert_eq!(p.key.display(), "C major");
    assert_eq!(p.rendered_romans, vec!["ii7", "V7", "Imaj7"]);
}

#[test]
fn melody_feeds_melodic_patterns() {
    let request = AnalysisRequest::new("C G G C")
        .with_key_hint("C major")
        .with_melody(vec![
            "G".to_string(),
            "E".to_string(),
            "D".to_string(),
            "C".to_string(),
        ]);
    let report = engine().analyze(&request).unwrap();
    assert!(detected_ids(&report).contains(&"melodic.cadential_descent"));
}

#[test]
fn melody_length_mismatch_is_an_error() {
    let request = AnalysisRequest::new("C G C")
        .with_key_hint("C major")
        .with_melody(vec!["E".to_string()]);
    assert!(engine().analyze(&request).is_err());
}

#[test]
fn parse_failures_abort_the_request() {
    assert!(engine().analyze(&AnalysisRequest::new("C Qm7 G")).is_err());
    assert!(engine()
        .analyze(&AnalysisRequest::new("C F G").with_key_hint("C zork"))
        .is_err());
}

#[test]
fn expired_deadline_returns_partial() {
    let request = AnalysisRequest::new("C F G C")
        .with_key_hint("C major")
        .with_deadline(Duration::ZERO);
    let report = engine().analyze(&request).unwrap();
    assert!(report.partial);
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, AnalysisWarning::PartialResult)));
}

#[test]
fn profiles_share_the_pipeline() {
    for profile in Profile::ALL {
        let request = AnalysisRequest::new("Dm7 G7 Cmaj7")
            .with_key_hint("C major")
            .with_profile(profile);
        let report = engine().analyze(&request).unwrap();
        let p = primary(&report);
        assert_eq!(p.rendered_romans, vec!["ii7", "V7", "Imaj7"]);
        assert_eq!(p.key.display(), "C major");
    }
}

#[test]
fn best_cover_reports_disjoint_patterns() {
    let request = AnalysisRequest::new("C A7 Dm G7 C")
        .with_key_hint("C major")
        .with_best_cover();
    let report = engine().analyze(&request).unwrap();
    let spans: Vec<_> = report.patterns_detected.iter().map(|p| p.span).collect();
    for (i, a) in spans.iter().enumerate() {
        for b in spans.iter().skip(i + 1) {
            assert!(!a.overlaps(b));
        }
    }
}

#[test]
fn report_serialises_with_stable_shape() {
    let report = analyze("Dm7 G7 Cmaj7", "C major");
    let json = serde_json::to_value(&report).unwrap();
    let primary = json.get("primary").unwrap();
    assert!(primary.get("type").is_some());
    assert!(primary.get("rendered_romans").is_some());
    assert!(primary.get("calibrated_confidence").is_some());
    assert!(primary.get("raw_confidence").unwrap().get("functional").is_some());
    assert!(json.get("patterns_detected").unwrap().is_array());
    assert!(json.get("summary").unwrap().is_string());
}

#[test]
fn reasoning_mentions_the_leading_pattern() {
    let report = analyze("C F G C", "C major");
    let p = primary(&report);
    assert!(p.reasoning.contains("Perfect authentic cadence"));
    assert!(p.reasoning.contains("C major"));
}
