//! Chord data structure and canonical rendering

use crate::pitch::{transpose, NoteName, PitchClass};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Chord quality, covering triads, sevenths, suspensions, and power chords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    HalfDiminished,
    Dominant7,
    Major7,
    Minor7,
    Diminished7,
    Suspended2,
    Suspended4,
    Power,
}

impl ChordQuality {
    /// Interval structure above the root, in semitones
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::HalfDiminished => &[0, 3, 6, 10],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::Diminished7 => &[0, 3, 6, 9],
            ChordQuality::Suspended2 => &[0, 2, 7],
            ChordQuality::Suspended4 => &[0, 5, 7],
            ChordQuality::Power => &[0, 7],
        }
    }

    /// True for four-tone qualities carrying a seventh
    pub fn is_seventh(self) -> bool {
        matches!(
            self,
            ChordQuality::HalfDiminished
                | ChordQuality::Dominant7
                | ChordQuality::Major7
                | ChordQuality::Minor7
                | ChordQuality::Diminished7
        )
    }

    /// True for qualities with a major third
    pub fn has_major_third(self) -> bool {
        matches!(
            self,
            ChordQuality::Major
                | ChordQuality::Augmented
                | ChordQuality::Dominant7
                | ChordQuality::Major7
        )
    }

    /// True for qualities with a minor third
    pub fn has_minor_third(self) -> bool {
        matches!(
            self,
            ChordQuality::Minor
                | ChordQuality::Diminished
                | ChordQuality::HalfDiminished
                | ChordQuality::Minor7
                | ChordQuality::Diminished7
        )
    }

    /// Canonical symbol suffix ("m", "maj7", "\u{00f8}", ...)
    pub fn canonical_suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "\u{00b0}",
            ChordQuality::Augmented => "+",
            ChordQuality::HalfDiminished => "\u{00f8}",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::Diminished7 => "\u{00b0}7",
            ChordQuality::Suspended2 => "sus2",
            ChordQuality::Suspended4 => "sus4",
            ChordQuality::Power => "5",
        }
    }

    /// The name used in pattern definitions
    pub fn name(self) -> &'static str {
        match self {
            ChordQuality::Major => "major",
            ChordQuality::Minor => "minor",
            ChordQuality::Diminished => "diminished",
            ChordQuality::Augmented => "augmented",
            ChordQuality::HalfDiminished => "half_diminished",
            ChordQuality::Dominant7 => "dominant7",
            ChordQuality::Major7 => "major7",
            ChordQuality::Minor7 => "minor7",
            ChordQuality::Diminished7 => "diminished7",
            ChordQuality::Suspended2 => "suspended2",
            ChordQuality::Suspended4 => "suspended4",
            ChordQuality::Power => "power",
        }
    }
}

/// Chord extensions and alterations beyond the base quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extension {
    Six,
    Seven,
    Nine,
    Eleven,
    Thirteen,
    FlatFive,
    SharpFive,
    FlatNine,
    SharpNine,
    SharpEleven,
    FlatThirteen,
    Add9,
    Add11,
}

impl Extension {
    /// Pitch-class offset above the root contributed by this extension
    pub fn semitone_offset(self) -> u8 {
        match self {
            Extension::Six => 9,
            Extension::Seven => 10,
            Extension::Nine => 2,
            Extension::Eleven => 5,
            Extension::Thirteen => 9,
            Extension::FlatFive => 6,
            Extension::SharpFive => 8,
            Extension::FlatNine => 1,
            Extension::SharpNine => 3,
            Extension::SharpEleven => 6,
            Extension::FlatThirteen => 8,
            Extension::Add9 => 2,
            Extension::Add11 => 5,
        }
    }

    /// True for the altered-fifth extensions, which replace the fifth
    pub fn replaces_fifth(self) -> bool {
        matches!(self, Extension::FlatFive | Extension::SharpFive)
    }

    /// Canonical suffix in a chord symbol
    pub fn canonical_suffix(self) -> &'static str {
        match self {
            Extension::Six => "6",
            Extension::Seven => "7",
            Extension::Nine => "9",
            Extension::Eleven => "11",
            Extension::Thirteen => "13",
            Extension::FlatFive => "\u{266d}5",
            Extension::SharpFive => "\u{266f}5",
            Extension::FlatNine => "\u{266d}9",
            Extension::SharpNine => "\u{266f}9",
            Extension::SharpEleven => "\u{266f}11",
            Extension::FlatThirteen => "\u{266d}13",
            Extension::Add9 => "add9",
            Extension::Add11 => "add11",
        }
    }
}

/// A parsed chord symbol.
///
/// Immutable once built by the parser: the original text is retained in
/// `symbol`, while `root`/`quality`/`extensions`/`bass` carry the structured
/// reading and `inversion` is derived from the bass against the chord-tone
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    /// The symbol as supplied
    pub symbol: String,
    /// Root pitch class
    pub root: PitchClass,
    /// Spelled root name
    pub root_name: NoteName,
    /// Base quality
    pub quality: ChordQuality,
    /// Extensions, deduplicated in first-seen order
    pub extensions: SmallVec<[Extension; 4]>,
    /// Bass pitch class when a slash bass was given
    pub bass: Option<PitchClass>,
    /// Inversion level (0 = root position, 3 = third inversion)
    pub inversion: u8,
}

impl Chord {
    /// Build a chord from structured parts, deriving the inversion from the
    /// bass note.
    pub fn new(
        root_name: NoteName,
        quality: ChordQuality,
        extensions: SmallVec<[Extension; 4]>,
        bass: Option<PitchClass>,
    ) -> Self {
        let root = root_name.pitch_class();
        let inversion = match bass {
            Some(b) => Self::derive_inversion(root, quality, b),
            None => 0,
        };
        let mut chord = Chord {
            symbol: String::new(),
            root,
            root_name,
            quality,
            extensions,
            bass,
            inversion,
        };
        chord.symbol = chord.render();
        chord
    }

    fn derive_inversion(root: PitchClass, quality: ChordQuality, bass: PitchClass) -> u8 {
        for (i, &offset) in quality.intervals().iter().enumerate() {
            if transpose(root, offset as i16) == bass {
                return i.min(3) as u8;
            }
        }
        // Non-chord bass: retained, root position
        0
    }

    /// Ordered chord tones as pitch classes: base quality tones followed by
    /// extension tones, with altered fifths replacing the perfect fifth.
    pub fn tone_classes(&self) -> SmallVec<[PitchClass; 8]> {
        let mut tones: SmallVec<[PitchClass; 8]> = SmallVec::new();
        let fifth_replaced = self.extensions.iter().any(|e| e.replaces_fifth());
        for &offset in self.quality.intervals() {
            if fifth_replaced && offset == 7 {
                continue;
            }
            tones.push(transpose(self.root, offset as i16));
        }
        for ext in &self.extensions {
            let pc = transpose(self.root, ext.semitone_offset() as i16);
            if !tones.contains(&pc) {
                tones.push(pc);
            }
        }
        tones
    }

    /// Pitch class sounding in the bass
    pub fn bass_class(&self) -> PitchClass {
        self.bass.unwrap_or(self.root)
    }

    /// True when the chord (quality included) carries a seventh
    pub fn is_seventh_chord(&self) -> bool {
        self.quality.is_seventh() || self.extensions.contains(&Extension::Seven)
    }

    /// True when no inversion applies
    pub fn is_root_position(&self) -> bool {
        self.inversion == 0
    }

    /// Canonical symbol: Unicode accidentals, canonical quality suffix,
    /// extensions in stored order, slash bass spelled flat-first.
    ///
    /// Suspended chords print their numeric extensions before the sus
    /// suffix, so a dominant-seventh sus reads `G7sus4` rather than
    /// `Gsus47`.
    pub fn render(&self) -> String {
        let mut out = self.root_name.render();
        let suspended = matches!(
            self.quality,
            ChordQuality::Suspended2 | ChordQuality::Suspended4
        );
        let leads_number = |e: &Extension| {
            matches!(
                e,
                Extension::Six
                    | Extension::Seven
                    | Extension::Nine
                    | Extension::Eleven
                    | Extension::Thirteen
            )
        };

        // A seventh-family quality followed by a leading 9/11/13 extension
        // collapses into the compound symbol (C9, Cm11, Cmaj13).
        let compound_base = match self.quality {
            ChordQuality::Dominant7 => Some(""),
            ChordQuality::Minor7 => Some("m"),
            ChordQuality::Major7 => Some("maj"),
            _ => None,
        };
        let compound = compound_base.and_then(|base| match self.extensions.first() {
            Some(Extension::Nine) => Some((base, "9")),
            Some(Extension::Eleven) => Some((base, "11")),
            Some(Extension::Thirteen) => Some((base, "13")),
            _ => None,
        });

        let mut skip_first = false;
        if let Some((base, number)) = compound {
            out.push_str(base);
            out.push_str(number);
            skip_first = true;
        } else {
            if suspended {
                for ext in self.extensions.iter().filter(|e| leads_number(*e)) {
                    out.push_str(ext.canonical_suffix());
                }
            }
            out.push_str(self.quality.canonical_suffix());
        }
        for (i, ext) in self.extensions.iter().enumerate() {
            if skip_first && i == 0 {
                continue;
            }
            if !skip_first && suspended && leads_number(ext) {
                continue;
            }
            out.push_str(ext.canonical_suffix());
        }
        if let Some(bass) = self.bass {
            out.push('/');
            // Prefer the spelling matching a chord tone's conventional name
            out.push_str(&NoteName::flat_spelling(bass).render());
        }
        out
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
