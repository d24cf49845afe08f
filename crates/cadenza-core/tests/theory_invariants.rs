//! Property tests for the parser and the Roman-numeral encoder
//!
//! Covers the canonicalisation fixed point, the encode/decode round trip,
//! and transposition equivariance.

use cadenza_core::{
    decode, encode, parse_chord_symbol, transpose, Chord, ChordQuality, Key, Mode, NoteName,
};
use proptest::prelude::*;
use smallvec::SmallVec;

fn arb_root() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("C"),
        Just("C#"),
        Just("Db"),
        Just("D"),
        Just("Eb"),
        Just("E"),
        Just("F"),
        Just("F#"),
        Just("G"),
        Just("Ab"),
        Just("A"),
        Just("Bb"),
        Just("B"),
    ]
}

fn arb_suffix() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(""),
        Just("m"),
        Just("7"),
        Just("m7"),
        Just("maj7"),
        Just("dim"),
        Just("dim7"),
        Just("m7b5"),
        Just("aug"),
        Just("sus2"),
        Just("sus4"),
        Just("9"),
        Just("m9"),
        Just("6"),
        Just("7b9"),
        Just("maj7#11"),
    ]
}

fn arb_quality() -> impl Strategy<Value = ChordQuality> {
    prop_oneof![
        Just(ChordQuality::Major),
        Just(ChordQuality::Minor),
        Just(ChordQuality::Diminished),
        Just(ChordQuality::Augmented),
        Just(ChordQuality::HalfDiminished),
        Just(ChordQuality::Dominant7),
        Just(ChordQuality::Major7),
        Just(ChordQuality::Minor7),
        Just(ChordQuality::Diminished7),
    ]
}

fn arb_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![
        Just(Mode::Ionian),
        Just(Mode::Dorian),
        Just(Mode::Phrygian),
        Just(Mode::Lydian),
        Just(Mode::Mixolydian),
        Just(Mode::Aeolian),
        Just(Mode::Locrian),
        Just(Mode::HarmonicMinor),
        Just(Mode::MelodicMinor),
        Just(Mode::HarmonicMajor),
    ]
}

fn build_chord(root: u8, quality: ChordQuality, inversion: usize) -> Chord {
    let tones: Vec<u8> = quality
        .intervals()
        .iter()
        .map(|&o| transpose(root, o as i16))
        .collect();
    let bass = if inversion == 0 {
        None
    } else {
        Some(tones[inversion % tones.len()])
    };
    Chord::new(
        NoteName::sharp_spelling(root),
        quality,
        SmallVec::new(),
        bass,
    )
}

proptest! {
    /// parse -> render -> parse reaches a fixed point for every accepted
    /// symbol shape.
    #[test]
    fn render_is_a_fixed_point(root in arb_root(), suffix in arb_suffix()) {
        let symbol = format!("{root}{suffix}");
        let parsed = parse_chord_symbol(&symbol).unwrap();
        let rendered = parsed.render();
        let reparsed = parse_chord_symbol(&rendered).unwrap();
        prop_assert_eq!(rendered.clone(), reparsed.render());
        prop_assert_eq!(parsed.root, reparsed.root);
        prop_assert_eq!(parsed.quality, reparsed.quality);
    }

    /// encode and decode invert each other for chords expressible in the key
    #[test]
    fn encode_decode_round_trip(
        root in 0u8..12,
        quality in arb_quality(),
        inversion in 0usize..4,
        tonic in 0u8..12,
        mode in arb_mode(),
    ) {
        let inversion = inversion % quality.intervals().len();
        let chord = build_chord(root, quality, inversion);
        let key = Key::from_pitch_class(tonic, mode);
        let token = encode(&chord, &key, 0).unwrap();
        let decoded = decode(&token, &key).unwrap();
        let token_again = encode(&decoded, &key, 0).unwrap();
        prop_assert_eq!(token, token_again);
    }

    /// Transposing chord and key together leaves the Roman stream
    /// byte-identical.
    #[test]
    fn transposition_equivariance(
        roots in prop::collection::vec(0u8..12, 1..8),
        quality in arb_quality(),
        tonic in 0u8..12,
        mode in arb_mode(),
        shift in 0i16..12,
    ) {
        let key_a = Key::from_pitch_class(tonic, mode);
        let key_b = Key::from_pitch_class(transpose(tonic, shift), mode);
        for &root in &roots {
            let a = build_chord(root, quality, 0);
            let b = build_chord(transpose(root, shift), quality, 0);
            let token_a = encode(&a, &key_a, 0).unwrap();
            let token_b = encode(&b, &key_b, 0).unwrap();
            prop_assert_eq!(token_a.render(), token_b.render());
        }
    }
}

#[test]
fn decode_rejects_impossible_figures() {
    use cadenza_core::{Accidental, InversionFigure, RomanToken};
    let key = Key::from_pitch_class(0, Mode::Ionian);
    // A third-inversion figure on a triad has no bass tone to stand on
    let token = RomanToken {
        chord_index: 0,
        degree: 1,
        accidental: Accidental::Natural,
        quality: ChordQuality::Major,
        figure: InversionFigure::FourTwo,
        secondary: None,
        borrowed_from: None,
    };
    assert!(decode(&token, &key).is_err());
}
