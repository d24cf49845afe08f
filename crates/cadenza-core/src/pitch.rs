//! Pitch-class arithmetic and enharmonic spelling
//!
//! Pitch classes are plain integers 0-11 (C = 0). Spelled note names carry a
//! letter and an accidental so that enharmonic choices survive parsing;
//! arithmetic always happens on the integer.

use crate::error::{TheoryError, TheoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pitch class, 0 (C) through 11 (B)
pub type PitchClass = u8;

/// Note letters C through B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    /// All letters in scale order starting from C
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Pitch class of the natural note
    pub fn natural_pitch_class(self) -> PitchClass {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    /// Parse a letter from a character, accepting either case
    pub fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }

    /// Upper-case character for this letter
    pub fn as_char(self) -> char {
        match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        }
    }

    /// Position of the letter in the C-based cycle (C = 0)
    pub fn index(self) -> usize {
        match self {
            Letter::C => 0,
            Letter::D => 1,
            Letter::E => 2,
            Letter::F => 3,
            Letter::G => 4,
            Letter::A => 5,
            Letter::B => 6,
        }
    }

    /// Letter `steps` positions above this one in the cycle
    pub fn step(self, steps: usize) -> Letter {
        Letter::ALL[(self.index() + steps) % 7]
    }
}

/// Accidentals from double flat to double sharp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accidental {
    DoubleFlat,
    Flat,
    #[default]
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Semitone offset from the natural note
    pub fn offset(self) -> i8 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    /// Accidental with the given semitone offset, if in range
    pub fn from_offset(offset: i8) -> Option<Accidental> {
        match offset {
            -2 => Some(Accidental::DoubleFlat),
            -1 => Some(Accidental::Flat),
            0 => Some(Accidental::Natural),
            1 => Some(Accidental::Sharp),
            2 => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }

    /// Unicode glyph; naturals render as the empty string
    pub fn glyph(self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "\u{266d}\u{266d}",
            Accidental::Flat => "\u{266d}",
            Accidental::Natural => "",
            Accidental::Sharp => "\u{266f}",
            Accidental::DoubleSharp => "\u{266f}\u{266f}",
        }
    }
}

/// A spelled note name: letter plus accidental
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteName {
    pub letter: Letter,
    pub accidental: Accidental,
}

impl NoteName {
    /// A natural note
    pub fn natural(letter: Letter) -> Self {
        NoteName {
            letter,
            accidental: Accidental::Natural,
        }
    }

    /// The pitch class this name denotes
    pub fn pitch_class(self) -> PitchClass {
        let pc = self.letter.natural_pitch_class() as i16 + self.accidental.offset() as i16;
        pc.rem_euclid(12) as PitchClass
    }

    /// Canonical Unicode rendering ("F\u{266f}", "B\u{266d}", "C")
    pub fn render(self) -> String {
        format!("{}{}", self.letter.as_char(), self.accidental.glyph())
    }

    /// Flat-preferring spelling of a pitch class
    pub fn flat_spelling(pc: PitchClass) -> NoteName {
        FLAT_SPELLINGS[(pc % 12) as usize]
    }

    /// Sharp-preferring spelling of a pitch class
    pub fn sharp_spelling(pc: PitchClass) -> NoteName {
        SHARP_SPELLINGS[(pc % 12) as usize]
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Sharp spellings of the chromatic scale
const SHARP_SPELLINGS: [NoteName; 12] = [
    NoteName { letter: Letter::C, accidental: Accidental::Natural },
    NoteName { letter: Letter::C, accidental: Accidental::Sharp },
    NoteName { letter: Letter::D, accidental: Accidental::Natural },
    NoteName { letter: Letter::D, accidental: Accidental::Sharp },
    NoteName { letter: Letter::E, accidental: Accidental::Natural },
    NoteName { letter: Letter::F, accidental: Accidental::Natural },
    NoteName { letter: Letter::F, accidental: Accidental::Sharp },
    NoteName { letter: Letter::G, accidental: Accidental::Natural },
    NoteName { letter: Letter::G, accidental: Accidental::Sharp },
    NoteName { letter: Letter::A, accidental: Accidental::Natural },
    NoteName { letter: Letter::A, accidental: Accidental::Sharp },
    NoteName { letter: Letter::B, accidental: Accidental::Natural },
];

/// Flat spellings of the chromatic scale
const FLAT_SPELLINGS: [NoteName; 12] = [
    NoteName { letter: Letter::C, accidental: Accidental::Natural },
    NoteName { letter: Letter::D, accidental: Accidental::Flat },
    NoteName { letter: Letter::D, accidental: Accidental::Natural },
    NoteName { letter: Letter::E, accidental: Accidental::Flat },
    NoteName { letter: Letter::E, accidental: Accidental::Natural },
    NoteName { letter: Letter::F, accidental: Accidental::Natural },
    NoteName { letter: Letter::G, accidental: Accidental::Flat },
    NoteName { letter: Letter::G, accidental: Accidental::Natural },
    NoteName { letter: Letter::A, accidental: Accidental::Flat },
    NoteName { letter: Letter::A, accidental: Accidental::Natural },
    NoteName { letter: Letter::B, accidental: Accidental::Flat },
    NoteName { letter: Letter::B, accidental: Accidental::Natural },
];

/// Parses a note name such as `C`, `F#`, `B\u{266d}`, or `Abb`.
///
/// Accidentals are accepted in both Unicode (`\u{266f}`, `\u{266d}`) and
/// ASCII (`#`, `b`) forms, doubled for double accidentals. The letter may be
/// in either case.
pub fn parse_note_name(token: &str) -> TheoryResult<NoteName> {
    let mut chars = token.chars();
    let first = chars.next().ok_or_else(|| TheoryError::InvalidNoteName {
        token: token.to_string(),
    })?;
    let letter = Letter::from_char(first).ok_or_else(|| TheoryError::InvalidNoteName {
        token: token.to_string(),
    })?;

    let mut offset: i8 = 0;
    for c in chars {
        match c {
            '#' | '\u{266f}' => offset += 1,
            'b' | '\u{266d}' => offset -= 1,
            'x' | '\u{1d12a}' => offset += 2,
            '\u{1d12b}' => offset -= 2,
            _ => {
                return Err(TheoryError::InvalidNoteName {
                    token: token.to_string(),
                })
            }
        }
    }

    let accidental = Accidental::from_offset(offset).ok_or_else(|| TheoryError::InvalidNoteName {
        token: token.to_string(),
    })?;

    Ok(NoteName { letter, accidental })
}

/// Pitch class of a parsed note name
pub fn to_pitch_class(name: NoteName) -> PitchClass {
    name.pitch_class()
}

/// Ascending interval from `a` to `b`, in semitones (0-11)
pub fn interval(a: PitchClass, b: PitchClass) -> u8 {
    (b as i16 - a as i16).rem_euclid(12) as u8
}

/// Transpose a pitch class by a signed number of semitones
pub fn transpose(pc: PitchClass, semitones: i16) -> PitchClass {
    (pc as i16 + semitones).rem_euclid(12) as PitchClass
}

/// Signed shortest motion from `a` to `b`, in the range [-5, 6]
pub fn shortest_motion(a: PitchClass, b: PitchClass) -> i8 {
    let up = interval(a, b) as i8;
    if up > 6 {
        up - 12
    } else {
        up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_naturals() {
        for (token, pc) in [("C", 0), ("D", 2), ("E", 4), ("F", 5), ("G", 7), ("A", 9), ("B", 11)]
        {
            let name = parse_note_name(token).unwrap();
            assert_eq!(name.pitch_class(), pc);
            assert_eq!(name.accidental, Accidental::Natural);
        }
    }

    #[test]
    fn test_parse_accidentals() {
        assert_eq!(parse_note_name("F#").unwrap().pitch_class(), 6);
        assert_eq!(parse_note_name("F\u{266f}").unwrap().pitch_class(), 6);
        assert_eq!(parse_note_name("Bb").unwrap().pitch_class(), 10);
        assert_eq!(parse_note_name("B\u{266d}").unwrap().pitch_class(), 10);
        assert_eq!(parse_note_name("Abb").unwrap().pitch_class(), 7);
        assert_eq!(parse_note_name("Cx").unwrap().pitch_class(), 2);
        // Letter case is accepted either way
        assert_eq!(parse_note_name("f#").unwrap().pitch_class(), 6);
    }

    #[test]
    fn test_parse_wraps_octave() {
        // Cb is enharmonically B
        assert_eq!(parse_note_name("Cb").unwrap().pitch_class(), 11);
        assert_eq!(parse_note_name("B#").unwrap().pitch_class(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_note_name("").is_err());
        assert!(parse_note_name("H").is_err());
        assert!(parse_note_name("C%").is_err());
        assert!(parse_note_name("Cbbb").is_err());
    }

    #[test]
    fn test_interval_and_transpose() {
        assert_eq!(interval(0, 7), 7);
        assert_eq!(interval(7, 0), 5);
        assert_eq!(interval(11, 0), 1);
        assert_eq!(transpose(0, -1), 11);
        assert_eq!(transpose(11, 3), 2);
    }

    #[test]
    fn test_shortest_motion() {
        assert_eq!(shortest_motion(5, 4), -1);
        assert_eq!(shortest_motion(7, 0), 5);
        assert_eq!(shortest_motion(0, 6), 6);
        assert_eq!(shortest_motion(0, 7), -5);
    }

    #[test]
    fn test_render() {
        assert_eq!(parse_note_name("F#").unwrap().render(), "F\u{266f}");
        assert_eq!(parse_note_name("Eb").unwrap().render(), "E\u{266d}");
        assert_eq!(parse_note_name("G").unwrap().render(), "G");
    }

    #[test]
    fn test_spelling_tables() {
        for pc in 0..12u8 {
            assert_eq!(NoteName::flat_spelling(pc).pitch_class(), pc);
            assert_eq!(NoteName::sharp_spelling(pc).pitch_class(), pc);
        }
    }

    #[test]
    fn test_letter_step() {
        assert_eq!(Letter::C.step(2), Letter::E);
        assert_eq!(Letter::B.step(1), Letter::C);
        assert_eq!(Letter::A.step(6), Letter::G);
    }
}
