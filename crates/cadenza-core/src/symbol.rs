//! Chord-symbol lexer
//!
//! Lexing is greedy longest-match: root (letter plus accidentals), then the
//! quality marker, then the extension list, then an optional slash bass.
//! Quality markers are case-sensitive: `m`/`min` read minor, `M`/`maj` read
//! the major-seventh family when a numeral follows and a plain major triad
//! otherwise.

use crate::chord::{Chord, ChordQuality, Extension};
use crate::error::{TheoryError, TheoryResult};
use crate::pitch::{parse_note_name, Accidental, Letter, NoteName};
use smallvec::SmallVec;

/// Splits raw chord input into symbol tokens.
///
/// Tokens are separated by any run of whitespace, commas, or newlines.
pub fn split_symbols(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parses a single chord symbol such as `Cm7`, `G7/B`, `F\u{266f}dim`,
/// `A\u{266d}maj7`, or `Dsus4`.
pub fn parse_chord_symbol(symbol: &str) -> TheoryResult<Chord> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(TheoryError::InvalidChordSymbol {
            symbol: symbol.to_string(),
        });
    }

    let (root_name, rest) = lex_root(trimmed)?;
    let (body, bass_text) = match rest.split_once('/') {
        Some((b, bass)) => (b, Some(bass)),
        None => (rest, None),
    };

    let (mut quality, mut extensions, ext_text) = lex_quality(body);
    lex_extensions(trimmed, ext_text, &mut quality, &mut extensions)?;

    let bass = match bass_text {
        Some(text) => Some(
            parse_note_name(text)
                .map_err(|_| TheoryError::InvalidChordSymbol {
                    symbol: symbol.to_string(),
                })?
                .pitch_class(),
        ),
        None => None,
    };

    let mut chord = Chord::new(root_name, quality, extensions, bass);
    chord.symbol = trimmed.to_string();
    Ok(chord)
}

/// Lex the chord root: an upper-case letter plus zero or more accidentals,
/// greedy on the accidental run.
fn lex_root(s: &str) -> TheoryResult<(NoteName, &str)> {
    let mut chars = s.char_indices();
    let (_, first) = chars.next().ok_or_else(|| TheoryError::InvalidChordSymbol {
        symbol: s.to_string(),
    })?;
    if !first.is_ascii_uppercase() {
        return Err(TheoryError::InvalidChordSymbol {
            symbol: s.to_string(),
        });
    }
    let letter = Letter::from_char(first).ok_or_else(|| TheoryError::InvalidChordSymbol {
        symbol: s.to_string(),
    })?;

    let mut offset: i8 = 0;
    let mut end = first.len_utf8();
    for (idx, c) in chars {
        match c {
            '#' | '\u{266f}' => offset += 1,
            // Greedy: a `b` after the letter is always a flat, so "Cbb"
            // reads as C double-flat rather than C with a b-suffix
            'b' | '\u{266d}' => offset -= 1,
            _ => {
                end = idx;
                return finish_root(s, letter, offset, end);
            }
        }
        end = idx + c.len_utf8();
    }
    finish_root(s, letter, offset, end)
}

fn finish_root(s: &str, letter: Letter, offset: i8, end: usize) -> TheoryResult<(NoteName, &str)> {
    let accidental =
        Accidental::from_offset(offset).ok_or_else(|| TheoryError::InvalidChordSymbol {
            symbol: s.to_string(),
        })?;
    Ok((NoteName { letter, accidental }, &s[end..]))
}

/// Lex the quality marker, returning the quality, any extensions it
/// implies, and the remaining extension text.
fn lex_quality(body: &str) -> (ChordQuality, SmallVec<[Extension; 4]>, &str) {
    let mut extensions: SmallVec<[Extension; 4]> = SmallVec::new();

    // Half-diminished spellings first: they embed shorter aliases
    for alias in ["m7b5", "m7\u{266d}5", "\u{00f8}7", "\u{00f8}"] {
        if let Some(rest) = body.strip_prefix(alias) {
            return (ChordQuality::HalfDiminished, extensions, rest);
        }
    }

    for (alias, quality) in [
        ("dim7", ChordQuality::Diminished7),
        ("\u{00b0}7", ChordQuality::Diminished7),
        ("dim", ChordQuality::Diminished),
        ("\u{00b0}", ChordQuality::Diminished),
        ("aug", ChordQuality::Augmented),
        ("+", ChordQuality::Augmented),
        ("sus2", ChordQuality::Suspended2),
        ("sus4", ChordQuality::Suspended4),
        ("sus", ChordQuality::Suspended4),
    ] {
        if let Some(rest) = body.strip_prefix(alias) {
            return (quality, extensions, rest);
        }
    }

    // Letter families, longest alias first so "maj" wins over "m":
    // "m"/"min" read minor, "M"/"maj" read the major-seventh family when a
    // numeral follows and a plain major triad otherwise.
    for (alias, minor) in [("min", true), ("maj", false), ("m", true), ("M", false)] {
        if let Some(rest) = body.strip_prefix(alias) {
            if minor {
                return match lex_numeral(rest) {
                    Some((7, rest)) => (ChordQuality::Minor7, extensions, rest),
                    Some((9, rest)) => {
                        extensions.push(Extension::Nine);
                        (ChordQuality::Minor7, extensions, rest)
                    }
                    Some((11, rest)) => {
                        extensions.push(Extension::Eleven);
                        (ChordQuality::Minor7, extensions, rest)
                    }
                    Some((13, rest)) => {
                        extensions.push(Extension::Thirteen);
                        (ChordQuality::Minor7, extensions, rest)
                    }
                    Some((6, rest)) => {
                        extensions.push(Extension::Six);
                        (ChordQuality::Minor, extensions, rest)
                    }
                    _ => (ChordQuality::Minor, extensions, rest),
                };
            }
            return match lex_numeral(rest) {
                Some((7, rest)) => (ChordQuality::Major7, extensions, rest),
                Some((9, rest)) => {
                    extensions.push(Extension::Nine);
                    (ChordQuality::Major7, extensions, rest)
                }
                Some((11, rest)) => {
                    extensions.push(Extension::Eleven);
                    (ChordQuality::Major7, extensions, rest)
                }
                Some((13, rest)) => {
                    extensions.push(Extension::Thirteen);
                    (ChordQuality::Major7, extensions, rest)
                }
                _ => (ChordQuality::Major, extensions, rest),
            };
        }
    }

    // Bare numerals: dominant-seventh family, the sixth, and power chords
    match lex_numeral(body) {
        Some((7, rest)) => (ChordQuality::Dominant7, extensions, rest),
        Some((9, rest)) => {
            extensions.push(Extension::Nine);
            (ChordQuality::Dominant7, extensions, rest)
        }
        Some((11, rest)) => {
            extensions.push(Extension::Eleven);
            (ChordQuality::Dominant7, extensions, rest)
        }
        Some((13, rest)) => {
            extensions.push(Extension::Thirteen);
            (ChordQuality::Dominant7, extensions, rest)
        }
        Some((6, rest)) => {
            extensions.push(Extension::Six);
            (ChordQuality::Major, extensions, rest)
        }
        Some((5, rest)) => (ChordQuality::Power, extensions, rest),
        _ => (ChordQuality::Major, extensions, body),
    }
}

/// Lex a leading chord numeral (5, 6, 7, 9, 11, 13)
fn lex_numeral(s: &str) -> Option<(u8, &str)> {
    for (text, value) in [("13", 13u8), ("11", 11), ("9", 9), ("7", 7), ("6", 6), ("5", 5)] {
        if let Some(rest) = s.strip_prefix(text) {
            return Some((value, rest));
        }
    }
    None
}

/// Lex the extension list after the quality marker.
///
/// Accepts optional parentheses around alterations (`C7(\u{266d}9)`), and a
/// trailing `sus2`/`sus4`, which converts the quality (so `G7sus4` reads as
/// a suspended chord with a seventh).
fn lex_extensions(
    symbol: &str,
    text: &str,
    quality: &mut ChordQuality,
    extensions: &mut SmallVec<[Extension; 4]>,
) -> TheoryResult<()> {
    let mut rest = text;
    'outer: while !rest.is_empty() {
        if let Some(r) = rest.strip_prefix(['(', ')']) {
            rest = r;
            continue;
        }
        for (alias, ext) in EXTENSION_ALIASES {
            if let Some(r) = rest.strip_prefix(alias) {
                if !extensions.contains(ext) {
                    extensions.push(*ext);
                }
                rest = r;
                continue 'outer;
            }
        }
        for (alias, sus) in [
            ("sus2", ChordQuality::Suspended2),
            ("sus4", ChordQuality::Suspended4),
        ] {
            if let Some(r) = rest.strip_prefix(alias) {
                if *quality == ChordQuality::Dominant7 && !extensions.contains(&Extension::Seven) {
                    extensions.insert(0, Extension::Seven);
                }
                *quality = sus;
                rest = r;
                continue 'outer;
            }
        }
        return Err(TheoryError::UnrecognizedQuality {
            symbol: symbol.to_string(),
            suffix: rest.to_string(),
        });
    }
    Ok(())
}

const EXTENSION_ALIASES: &[(&str, Extension)] = &[
    ("add9", Extension::Add9),
    ("add11", Extension::Add11),
    ("#11", Extension::SharpEleven),
    ("\u{266f}11", Extension::SharpEleven),
    ("b13", Extension::FlatThirteen),
    ("\u{266d}13", Extension::FlatThirteen),
    ("b9", Extension::FlatNine),
    ("\u{266d}9", Extension::FlatNine),
    ("#9", Extension::SharpNine),
    ("\u{266f}9", Extension::SharpNine),
    ("b5", Extension::FlatFive),
    ("\u{266d}5", Extension::FlatFive),
    ("#5", Extension::SharpFive),
    ("\u{266f}5", Extension::SharpFive),
    ("13", Extension::Thirteen),
    ("11", Extension::Eleven),
    ("9", Extension::Nine),
    ("7", Extension::Seven),
    ("6", Extension::Six),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_triads() {
        let c = parse_chord_symbol("C").unwrap();
        assert_eq!((c.root, c.quality), (0, ChordQuality::Major));

        let am = parse_chord_symbol("Am").unwrap();
        assert_eq!((am.root, am.quality), (9, ChordQuality::Minor));

        let fsharp_dim = parse_chord_symbol("F\u{266f}dim").unwrap();
        assert_eq!((fsharp_dim.root, fsharp_dim.quality), (6, ChordQuality::Diminished));

        let caug = parse_chord_symbol("C+").unwrap();
        assert_eq!(caug.quality, ChordQuality::Augmented);
    }

    #[test]
    fn test_parse_sevenths() {
        let cm7 = parse_chord_symbol("Cm7").unwrap();
        assert_eq!(cm7.quality, ChordQuality::Minor7);

        let g7 = parse_chord_symbol("G7").unwrap();
        assert_eq!(g7.quality, ChordQuality::Dominant7);

        let abmaj7 = parse_chord_symbol("A\u{266d}maj7").unwrap();
        assert_eq!((abmaj7.root, abmaj7.quality), (8, ChordQuality::Major7));

        let bdim7 = parse_chord_symbol("Bdim7").unwrap();
        assert_eq!(bdim7.quality, ChordQuality::Diminished7);

        let half_dim = parse_chord_symbol("Bm7b5").unwrap();
        assert_eq!(half_dim.quality, ChordQuality::HalfDiminished);
    }

    #[test]
    fn test_bare_m_is_major_triad() {
        // `M` needs an explicit numeral to reach the major-seventh family
        let cm = parse_chord_symbol("CM").unwrap();
        assert_eq!(cm.quality, ChordQuality::Major);

        let cm7 = parse_chord_symbol("CM7").unwrap();
        assert_eq!(cm7.quality, ChordQuality::Major7);

        let cmaj = parse_chord_symbol("Cmaj").unwrap();
        assert_eq!(cmaj.quality, ChordQuality::Major);
    }

    #[test]
    fn test_case_sensitivity() {
        assert_eq!(
            parse_chord_symbol("Cm").unwrap().quality,
            ChordQuality::Minor
        );
        assert_eq!(
            parse_chord_symbol("CM").unwrap().quality,
            ChordQuality::Major
        );
    }

    #[test]
    fn test_ascii_and_unicode_accidentals() {
        let sharp_ascii = parse_chord_symbol("F#m").unwrap();
        let sharp_unicode = parse_chord_symbol("F\u{266f}m").unwrap();
        assert_eq!(sharp_ascii.root, sharp_unicode.root);

        let flat_ascii = parse_chord_symbol("Bb7").unwrap();
        let flat_unicode = parse_chord_symbol("B\u{266d}7").unwrap();
        assert_eq!(flat_ascii.root, flat_unicode.root);
        assert_eq!(flat_ascii.root, 10);
    }

    #[test]
    fn test_slash_bass() {
        let g7_b = parse_chord_symbol("G7/B").unwrap();
        assert_eq!(g7_b.bass, Some(11));
        assert_eq!(g7_b.inversion, 1);

        let dm_f = parse_chord_symbol("Dm/F").unwrap();
        assert_eq!(dm_f.bass, Some(5));
        assert_eq!(dm_f.inversion, 1);

        let c_g = parse_chord_symbol("C/G").unwrap();
        assert_eq!(c_g.inversion, 2);
    }

    #[test]
    fn test_extensions() {
        let c9 = parse_chord_symbol("C9").unwrap();
        assert_eq!(c9.quality, ChordQuality::Dominant7);
        assert!(c9.extensions.contains(&Extension::Nine));

        let c6 = parse_chord_symbol("C6").unwrap();
        assert_eq!(c6.quality, ChordQuality::Major);
        assert!(c6.extensions.contains(&Extension::Six));

        let alt = parse_chord_symbol("G7b9").unwrap();
        assert!(alt.extensions.contains(&Extension::FlatNine));

        let paren = parse_chord_symbol("G7(b9)").unwrap();
        assert!(paren.extensions.contains(&Extension::FlatNine));

        let sharp11 = parse_chord_symbol("Cmaj7#11").unwrap();
        assert_eq!(sharp11.quality, ChordQuality::Major7);
        assert!(sharp11.extensions.contains(&Extension::SharpEleven));
    }

    #[test]
    fn test_suspended() {
        let dsus4 = parse_chord_symbol("Dsus4").unwrap();
        assert_eq!(dsus4.quality, ChordQuality::Suspended4);

        let asus2 = parse_chord_symbol("Asus2").unwrap();
        assert_eq!(asus2.quality, ChordQuality::Suspended2);

        let g7sus4 = parse_chord_symbol("G7sus4").unwrap();
        assert_eq!(g7sus4.quality, ChordQuality::Suspended4);
        assert!(g7sus4.extensions.contains(&Extension::Seven));
    }

    #[test]
    fn test_power_chord() {
        let c5 = parse_chord_symbol("C5").unwrap();
        assert_eq!(c5.quality, ChordQuality::Power);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse_chord_symbol(""),
            Err(TheoryError::InvalidChordSymbol { .. })
        ));
        assert!(matches!(
            parse_chord_symbol("7"),
            Err(TheoryError::InvalidChordSymbol { .. })
        ));
        assert!(matches!(
            parse_chord_symbol("Hm"),
            Err(TheoryError::InvalidChordSymbol { .. })
        ));
        assert!(matches!(
            parse_chord_symbol("Cxyz"),
            Err(TheoryError::UnrecognizedQuality { .. })
        ));
        assert!(matches!(
            parse_chord_symbol("C/Q"),
            Err(TheoryError::InvalidChordSymbol { .. })
        ));
    }

    #[test]
    fn test_parse_render_fixed_point() {
        for symbol in [
            "C", "Am", "Cm7", "G7", "A\u{266d}maj7", "Dsus4", "F\u{266f}\u{00b0}", "C9",
            "G7sus4", "Dm/F", "G7/B", "B\u{00f8}", "C5", "E\u{266d}m7",
        ] {
            let once = parse_chord_symbol(symbol).unwrap();
            let rendered = once.render();
            let twice = parse_chord_symbol(&rendered).unwrap();
            assert_eq!(rendered, twice.render(), "not a fixed point: {symbol}");
        }
    }

    #[test]
    fn test_canonicalisation() {
        // ASCII accidentals normalise to Unicode, aliases to canonical form
        assert_eq!(parse_chord_symbol("F#m").unwrap().render(), "F\u{266f}m");
        assert_eq!(parse_chord_symbol("Bb7").unwrap().render(), "B\u{266d}7");
        assert_eq!(parse_chord_symbol("Cdim").unwrap().render(), "C\u{00b0}");
        assert_eq!(parse_chord_symbol("CM7").unwrap().render(), "Cmaj7");
        assert_eq!(parse_chord_symbol("Cmin7").unwrap().render(), "Cm7");
        assert_eq!(parse_chord_symbol("Caug").unwrap().render(), "C+");
    }

    #[test]
    fn test_split_symbols() {
        assert_eq!(split_symbols("C F G C"), vec!["C", "F", "G", "C"]);
        assert_eq!(split_symbols("Dm7, G7,Cmaj7"), vec!["Dm7", "G7", "Cmaj7"]);
        assert_eq!(split_symbols("Am\nF\n\nC  G"), vec!["Am", "F", "C", "G"]);
        assert!(split_symbols("  ,\n ").is_empty());
    }
}
