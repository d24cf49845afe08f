//! Scale systems, modes, and keys
//!
//! Seven parent scale systems provide the interval material; each mode is a
//! rotation of its parent. The 46 recognized modes cover the diatonic set,
//! the exotic modes of melodic minor, harmonic minor, harmonic major, and
//! double harmonic major, plus the pentatonic and blues rotations.

use crate::chord::{Chord, ChordQuality};
use crate::error::{TheoryError, TheoryResult};
use crate::pitch::{interval, parse_note_name, Accidental, NoteName, PitchClass};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Parent scale families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleSystem {
    Diatonic,
    MelodicMinor,
    HarmonicMinor,
    HarmonicMajor,
    DoubleHarmonicMajor,
    MajorPentatonic,
    Blues,
}

impl ScaleSystem {
    /// Interval pattern of the parent scale, from its first mode
    pub fn parent_intervals(self) -> &'static [u8] {
        match self {
            ScaleSystem::Diatonic => &[0, 2, 4, 5, 7, 9, 11],
            ScaleSystem::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            ScaleSystem::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleSystem::HarmonicMajor => &[0, 2, 4, 5, 7, 8, 11],
            ScaleSystem::DoubleHarmonicMajor => &[0, 1, 4, 5, 7, 8, 11],
            ScaleSystem::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleSystem::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }

    /// Number of notes per octave in this system
    pub fn len(self) -> usize {
        self.parent_intervals().len()
    }

    /// True when the system is heptatonic (supports full degree analysis)
    pub fn is_heptatonic(self) -> bool {
        self.len() == 7
    }

    /// Modes of this system, in rotation order
    pub fn modes(self) -> &'static [Mode] {
        match self {
            ScaleSystem::Diatonic => &DIATONIC_MODES,
            ScaleSystem::MelodicMinor => &MELODIC_MINOR_MODES,
            ScaleSystem::HarmonicMinor => &HARMONIC_MINOR_MODES,
            ScaleSystem::HarmonicMajor => &HARMONIC_MAJOR_MODES,
            ScaleSystem::DoubleHarmonicMajor => &DOUBLE_HARMONIC_MODES,
            ScaleSystem::MajorPentatonic => &PENTATONIC_MODES,
            ScaleSystem::Blues => &BLUES_MODES,
        }
    }
}

const DIATONIC_MODES: [Mode; 7] = [
    Mode::Ionian,
    Mode::Dorian,
    Mode::Phrygian,
    Mode::Lydian,
    Mode::Mixolydian,
    Mode::Aeolian,
    Mode::Locrian,
];

const MELODIC_MINOR_MODES: [Mode; 7] = [
    Mode::MelodicMinor,
    Mode::DorianFlat2,
    Mode::LydianAugmented,
    Mode::LydianDominant,
    Mode::MixolydianFlat6,
    Mode::LocrianNatural2,
    Mode::Altered,
];

const HARMONIC_MINOR_MODES: [Mode; 7] = [
    Mode::HarmonicMinor,
    Mode::LocrianNatural6,
    Mode::IonianSharp5,
    Mode::DorianSharp4,
    Mode::PhrygianDominant,
    Mode::LydianSharp2,
    Mode::UltraLocrian,
];

const HARMONIC_MAJOR_MODES: [Mode; 7] = [
    Mode::HarmonicMajor,
    Mode::DorianFlat5,
    Mode::PhrygianFlat4,
    Mode::LydianFlat3,
    Mode::MixolydianFlat2,
    Mode::LydianAugmentedSharp2,
    Mode::LocrianDoubleFlat7,
];

const DOUBLE_HARMONIC_MODES: [Mode; 7] = [
    Mode::DoubleHarmonicMajor,
    Mode::LydianSharp2Sharp6,
    Mode::UltraPhrygian,
    Mode::HungarianMinor,
    Mode::Oriental,
    Mode::IonianAugmentedSharp2,
    Mode::LocrianDoubleFlat3DoubleFlat7,
];

const PENTATONIC_MODES: [Mode; 5] = [
    Mode::MajorPentatonic,
    Mode::SuspendedPentatonic,
    Mode::BluesMinorPentatonic,
    Mode::BluesMajorPentatonic,
    Mode::MinorPentatonic,
];

const BLUES_MODES: [Mode; 6] = [
    Mode::Blues,
    Mode::MajorBlues,
    Mode::BluesMode3,
    Mode::BluesMode4,
    Mode::BluesMode5,
    Mode::BluesMode6,
];

/// The 46 recognized modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    // Diatonic
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    // Melodic minor
    MelodicMinor,
    DorianFlat2,
    LydianAugmented,
    LydianDominant,
    MixolydianFlat6,
    LocrianNatural2,
    Altered,
    // Harmonic minor
    HarmonicMinor,
    LocrianNatural6,
    IonianSharp5,
    DorianSharp4,
    PhrygianDominant,
    LydianSharp2,
    UltraLocrian,
    // Harmonic major
    HarmonicMajor,
    DorianFlat5,
    PhrygianFlat4,
    LydianFlat3,
    MixolydianFlat2,
    LydianAugmentedSharp2,
    LocrianDoubleFlat7,
    // Double harmonic major
    DoubleHarmonicMajor,
    LydianSharp2Sharp6,
    UltraPhrygian,
    HungarianMinor,
    Oriental,
    IonianAugmentedSharp2,
    LocrianDoubleFlat3DoubleFlat7,
    // Major pentatonic
    MajorPentatonic,
    SuspendedPentatonic,
    BluesMinorPentatonic,
    BluesMajorPentatonic,
    MinorPentatonic,
    // Blues
    Blues,
    MajorBlues,
    BluesMode3,
    BluesMode4,
    BluesMode5,
    BluesMode6,
}

impl Mode {
    /// Every recognized mode
    pub fn all() -> impl Iterator<Item = Mode> {
        DIATONIC_MODES
            .iter()
            .chain(MELODIC_MINOR_MODES.iter())
            .chain(HARMONIC_MINOR_MODES.iter())
            .chain(HARMONIC_MAJOR_MODES.iter())
            .chain(DOUBLE_HARMONIC_MODES.iter())
            .chain(PENTATONIC_MODES.iter())
            .chain(BLUES_MODES.iter())
            .copied()
    }

    /// The parent scale family of this mode
    pub fn system(self) -> ScaleSystem {
        match self {
            Mode::Ionian
            | Mode::Dorian
            | Mode::Phrygian
            | Mode::Lydian
            | Mode::Mixolydian
            | Mode::Aeolian
            | Mode::Locrian => ScaleSystem::Diatonic,
            Mode::MelodicMinor
            | Mode::DorianFlat2
            | Mode::LydianAugmented
            | Mode::LydianDominant
            | Mode::MixolydianFlat6
            | Mode::LocrianNatural2
            | Mode::Altered => ScaleSystem::MelodicMinor,
            Mode::HarmonicMinor
            | Mode::LocrianNatural6
            | Mode::IonianSharp5
            | Mode::DorianSharp4
            | Mode::PhrygianDominant
            | Mode::LydianSharp2
            | Mode::UltraLocrian => ScaleSystem::HarmonicMinor,
            Mode::HarmonicMajor
            | Mode::DorianFlat5
            | Mode::PhrygianFlat4
            | Mode::LydianFlat3
            | Mode::MixolydianFlat2
            | Mode::LydianAugmentedSharp2
            | Mode::LocrianDoubleFlat7 => ScaleSystem::HarmonicMajor,
            Mode::DoubleHarmonicMajor
            | Mode::LydianSharp2Sharp6
            | Mode::UltraPhrygian
            | Mode::HungarianMinor
            | Mode::Oriental
            | Mode::IonianAugmentedSharp2
            | Mode::LocrianDoubleFlat3DoubleFlat7 => ScaleSystem::DoubleHarmonicMajor,
            Mode::MajorPentatonic
            | Mode::SuspendedPentatonic
            | Mode::BluesMinorPentatonic
            | Mode::BluesMajorPentatonic
            | Mode::MinorPentatonic => ScaleSystem::MajorPentatonic,
            Mode::Blues
            | Mode::MajorBlues
            | Mode::BluesMode3
            | Mode::BluesMode4
            | Mode::BluesMode5
            | Mode::BluesMode6 => ScaleSystem::Blues,
        }
    }

    /// Rotation index of this mode within its parent system
    pub fn rotation(self) -> usize {
        let modes = self.system().modes();
        modes.iter().position(|&m| m == self).unwrap_or(0)
    }

    /// Interval pattern of this mode, from its own tonic
    pub fn intervals(self) -> SmallVec<[u8; 7]> {
        let parent = self.system().parent_intervals();
        let len = parent.len();
        let r = self.rotation();
        let anchor = parent[r];
        (0..len)
            .map(|i| (parent[(r + i) % len] + 12 - anchor) % 12)
            .collect()
    }

    /// Snake-case mode name
    pub fn name(self) -> &'static str {
        match self {
            Mode::Ionian => "ionian",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Aeolian => "aeolian",
            Mode::Locrian => "locrian",
            Mode::MelodicMinor => "melodic_minor",
            Mode::DorianFlat2 => "dorian_flat2",
            Mode::LydianAugmented => "lydian_augmented",
            Mode::LydianDominant => "lydian_dominant",
            Mode::MixolydianFlat6 => "mixolydian_flat6",
            Mode::LocrianNatural2 => "locrian_natural2",
            Mode::Altered => "altered",
            Mode::HarmonicMinor => "harmonic_minor",
            Mode::LocrianNatural6 => "locrian_natural6",
            Mode::IonianSharp5 => "ionian_sharp5",
            Mode::DorianSharp4 => "dorian_sharp4",
            Mode::PhrygianDominant => "phrygian_dominant",
            Mode::LydianSharp2 => "lydian_sharp2",
            Mode::UltraLocrian => "ultra_locrian",
            Mode::HarmonicMajor => "harmonic_major",
            Mode::DorianFlat5 => "dorian_flat5",
            Mode::PhrygianFlat4 => "phrygian_flat4",
            Mode::LydianFlat3 => "lydian_flat3",
            Mode::MixolydianFlat2 => "mixolydian_flat2",
            Mode::LydianAugmentedSharp2 => "lydian_augmented_sharp2",
            Mode::LocrianDoubleFlat7 => "locrian_double_flat7",
            Mode::DoubleHarmonicMajor => "double_harmonic_major",
            Mode::LydianSharp2Sharp6 => "lydian_sharp2_sharp6",
            Mode::UltraPhrygian => "ultra_phrygian",
            Mode::HungarianMinor => "hungarian_minor",
            Mode::Oriental => "oriental",
            Mode::IonianAugmentedSharp2 => "ionian_augmented_sharp2",
            Mode::LocrianDoubleFlat3DoubleFlat7 => "locrian_double_flat3_double_flat7",
            Mode::MajorPentatonic => "major_pentatonic",
            Mode::SuspendedPentatonic => "suspended_pentatonic",
            Mode::BluesMinorPentatonic => "blues_minor_pentatonic",
            Mode::BluesMajorPentatonic => "blues_major_pentatonic",
            Mode::MinorPentatonic => "minor_pentatonic",
            Mode::Blues => "blues",
            Mode::MajorBlues => "major_blues",
            Mode::BluesMode3 => "blues_mode3",
            Mode::BluesMode4 => "blues_mode4",
            Mode::BluesMode5 => "blues_mode5",
            Mode::BluesMode6 => "blues_mode6",
        }
    }

    /// Parse a mode name (canonical snake-case or a common alias),
    /// case-insensitively.
    pub fn from_name(name: &str) -> Option<Mode> {
        let lowered = name.to_ascii_lowercase().replace([' ', '-'], "_");
        match lowered.as_str() {
            "major" => return Some(Mode::Ionian),
            "minor" | "natural_minor" => return Some(Mode::Aeolian),
            "byzantine" => return Some(Mode::DoubleHarmonicMajor),
            "super_locrian" => return Some(Mode::Altered),
            _ => {}
        }
        Mode::all().find(|m| m.name() == lowered)
    }

    /// Human-facing name ("major", "minor", "mixolydian", "harmonic minor")
    pub fn display_name(self) -> String {
        match self {
            Mode::Ionian => "major".to_string(),
            Mode::Aeolian => "minor".to_string(),
            other => other.name().replace('_', " "),
        }
    }

    /// True for modes with a minor (and no major) third
    pub fn is_minorish(self) -> bool {
        let iv = self.intervals();
        iv.contains(&3) && !iv.contains(&4)
    }

    /// The scale degree distinguishing this mode from its major/minor
    /// parent, where one is conventionally named.
    pub fn characteristic_degree(self) -> Option<(Accidental, u8)> {
        match self {
            Mode::Dorian => Some((Accidental::Natural, 6)),
            Mode::Phrygian => Some((Accidental::Flat, 2)),
            Mode::Lydian => Some((Accidental::Sharp, 4)),
            Mode::Mixolydian => Some((Accidental::Flat, 7)),
            Mode::Aeolian => Some((Accidental::Flat, 6)),
            Mode::Locrian => Some((Accidental::Flat, 5)),
            Mode::LydianDominant => Some((Accidental::Sharp, 4)),
            Mode::PhrygianDominant => Some((Accidental::Flat, 2)),
            Mode::MixolydianFlat6 => Some((Accidental::Flat, 6)),
            Mode::DorianSharp4 => Some((Accidental::Sharp, 4)),
            Mode::HungarianMinor => Some((Accidental::Sharp, 4)),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Quality classification of a chord built on one scale degree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegreeChord {
    /// Degree within the mode, 1-based
    pub degree: u8,
    /// Root pitch class
    pub root: PitchClass,
    /// Triad quality, when the stacked tones form a recognized triad
    pub triad: Option<ChordQuality>,
    /// Seventh-chord quality, when recognized
    pub seventh: Option<ChordQuality>,
}

/// A key: a tonic pitch with a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Tonic pitch class
    pub tonic: PitchClass,
    /// Spelled tonic
    pub tonic_name: NoteName,
    /// Mode of the key
    pub mode: Mode,
    /// Parent scale family (derived from the mode)
    pub system: ScaleSystem,
}

impl Key {
    /// Build a key from a spelled tonic and mode
    pub fn new(tonic_name: NoteName, mode: Mode) -> Self {
        Key {
            tonic: tonic_name.pitch_class(),
            tonic_name,
            mode,
            system: mode.system(),
        }
    }

    /// Build a key from a bare pitch class, choosing a conventional spelling
    pub fn from_pitch_class(tonic: PitchClass, mode: Mode) -> Self {
        let name = if matches!(tonic, 1 | 3 | 6 | 8 | 10) {
            NoteName::flat_spelling(tonic)
        } else {
            NoteName::sharp_spelling(tonic)
        };
        Key::new(name, mode)
    }

    /// Pitch classes of the key's scale, tonic first
    pub fn pitch_classes(&self) -> SmallVec<[PitchClass; 7]> {
        self.mode
            .intervals()
            .iter()
            .map(|&iv| (self.tonic + iv) % 12)
            .collect()
    }

    /// True when the pitch class belongs to the scale
    pub fn contains(&self, pc: PitchClass) -> bool {
        let iv = interval(self.tonic, pc);
        self.mode.intervals().contains(&iv)
    }

    /// Exact scale degree of a pitch class, 1-based
    pub fn degree_of(&self, pc: PitchClass) -> Option<u8> {
        let iv = interval(self.tonic, pc);
        self.mode
            .intervals()
            .iter()
            .position(|&p| p == iv)
            .map(|i| (i + 1) as u8)
    }

    /// Pitch class of a scale degree, 1-based
    pub fn pitch_of_degree(&self, degree: u8) -> TheoryResult<PitchClass> {
        let intervals = self.mode.intervals();
        if degree == 0 || degree as usize > intervals.len() {
            return Err(TheoryError::ScaleDegreeOutOfRange { degree });
        }
        Ok((self.tonic + intervals[(degree - 1) as usize]) % 12)
    }

    /// Degree with accidental for any chromatic pitch class.
    ///
    /// Scale members map exactly; outsiders take the flattened upper
    /// neighbour when one exists (so pitch class 10 in C major reads as a
    /// flattened seventh degree rather than a sharpened sixth), else the
    /// sharpened lower neighbour.
    pub fn degree_of_chromatic(&self, pc: PitchClass) -> (u8, Accidental) {
        let iv = interval(self.tonic, pc);
        let intervals = self.mode.intervals();
        if let Some(pos) = intervals.iter().position(|&p| p == iv) {
            return ((pos + 1) as u8, Accidental::Natural);
        }
        let up = (iv + 1) % 12;
        if let Some(pos) = intervals.iter().position(|&p| p == up) {
            return ((pos + 1) as u8, Accidental::Flat);
        }
        let down = (iv + 11) % 12;
        if let Some(pos) = intervals.iter().position(|&p| p == down) {
            return ((pos + 1) as u8, Accidental::Sharp);
        }
        // Two semitones from any scale tone can only happen in the sparse
        // systems; widen the same preference.
        let up2 = (iv + 2) % 12;
        if let Some(pos) = intervals.iter().position(|&p| p == up2) {
            return ((pos + 1) as u8, Accidental::DoubleFlat);
        }
        (1, Accidental::Natural)
    }

    /// Deterministic enharmonic spelling of a pitch class in this key:
    /// the diatonic spelling when the pitch is a scale member, otherwise
    /// flats in minor-type keys and sharps in major-type keys.
    pub fn spell(&self, pc: PitchClass) -> NoteName {
        if self.system.is_heptatonic() {
            if let Some(degree) = self.degree_of(pc) {
                let letter = self.tonic_name.letter.step((degree - 1) as usize);
                let offset =
                    (pc as i16 - letter.natural_pitch_class() as i16 + 6).rem_euclid(12) - 6;
                if let Some(acc) = Accidental::from_offset(offset as i8) {
                    return NoteName {
                        letter,
                        accidental: acc,
                    };
                }
            }
        }
        if self.mode.is_minorish() {
            NoteName::flat_spelling(pc)
        } else {
            NoteName::sharp_spelling(pc)
        }
    }

    /// Stacked-third chords on every degree of a heptatonic key
    pub fn degree_chords(&self) -> Vec<DegreeChord> {
        if !self.system.is_heptatonic() {
            return Vec::new();
        }
        let pcs = self.pitch_classes();
        (0..7)
            .map(|d| {
                let root = pcs[d];
                let third = interval(root, pcs[(d + 2) % 7]);
                let fifth = interval(root, pcs[(d + 4) % 7]);
                let seventh = interval(root, pcs[(d + 6) % 7]);
                let triad = match (third, fifth) {
                    (4, 7) => Some(ChordQuality::Major),
                    (3, 7) => Some(ChordQuality::Minor),
                    (3, 6) => Some(ChordQuality::Diminished),
                    (4, 8) => Some(ChordQuality::Augmented),
                    _ => None,
                };
                let seventh_quality = match (third, fifth, seventh) {
                    (4, 7, 11) => Some(ChordQuality::Major7),
                    (4, 7, 10) => Some(ChordQuality::Dominant7),
                    (3, 7, 10) => Some(ChordQuality::Minor7),
                    (3, 6, 10) => Some(ChordQuality::HalfDiminished),
                    (3, 6, 9) => Some(ChordQuality::Diminished7),
                    _ => None,
                };
                DegreeChord {
                    degree: (d + 1) as u8,
                    root,
                    triad,
                    seventh: seventh_quality,
                }
            })
            .collect()
    }

    /// Diatonic triads and sevenths on each degree, as chord records
    pub fn diatonic_chords(&self) -> Vec<Chord> {
        let mut out = Vec::new();
        for dc in self.degree_chords() {
            let name = self.spell(dc.root);
            if let Some(q) = dc.triad {
                out.push(Chord::new(name, q, SmallVec::new(), None));
            }
            if let Some(q) = dc.seventh {
                out.push(Chord::new(name, q, SmallVec::new(), None));
            }
        }
        out
    }

    /// True when every base tone of the chord belongs to this key's scale
    pub fn is_diatonic(&self, chord: &Chord) -> bool {
        chord
            .quality
            .intervals()
            .iter()
            .all(|&offset| self.contains((chord.root + offset) % 12))
    }

    /// Mode produced by reading this key's scale from the given degree
    pub fn mode_of_degree(&self, degree: u8) -> TheoryResult<Mode> {
        let modes = self.system.modes();
        if degree == 0 || degree as usize > modes.len() {
            return Err(TheoryError::ScaleDegreeOutOfRange { degree });
        }
        let rotation = (self.mode.rotation() + degree as usize - 1) % modes.len();
        Ok(modes[rotation])
    }

    /// "C major"-style display
    pub fn display(&self) -> String {
        format!("{} {}", self.tonic_name.render(), self.mode.display_name())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Detection order: representative modes per system, most conventional
/// reading first.
const DETECTION_MODES: [Mode; 8] = [
    Mode::Ionian,
    Mode::Aeolian,
    Mode::MelodicMinor,
    Mode::HarmonicMinor,
    Mode::HarmonicMajor,
    Mode::DoubleHarmonicMajor,
    Mode::MajorPentatonic,
    Mode::Blues,
];

/// Finds every key whose scale contains the given note set.
///
/// Candidates come back in a fixed ranking: diatonic major then minor, then
/// melodic and harmonic minor, harmonic and double harmonic major, the
/// pentatonic and blues systems, with ties within a ranking tier broken by
/// ascending tonic.
pub fn detect_parent_scales(notes: &[PitchClass]) -> Vec<Key> {
    let mut out = Vec::new();
    if notes.is_empty() {
        return out;
    }
    for mode in DETECTION_MODES {
        for tonic in 0..12u8 {
            let key = Key::from_pitch_class(tonic, mode);
            if notes.iter().all(|&pc| key.contains(pc)) {
                out.push(key);
            }
        }
    }
    out
}

/// Parses a key hint of the form `<note>[ ]<mode>`, e.g. `C major`,
/// `f# dorian`, `Bb harmonic minor`. The mode name is case-insensitive and
/// may be omitted, defaulting to major.
pub fn parse_key_hint(text: &str) -> TheoryResult<Key> {
    let mut words = text.split_whitespace();
    let note_token = words.next().ok_or_else(|| TheoryError::InvalidKeyHint {
        text: text.to_string(),
    })?;
    let tonic = parse_note_name(note_token).map_err(|_| TheoryError::InvalidKeyHint {
        text: text.to_string(),
    })?;
    let rest: Vec<&str> = words.collect();
    let mode = if rest.is_empty() {
        Mode::Ionian
    } else {
        Mode::from_name(&rest.join("_")).ok_or_else(|| TheoryError::InvalidKeyHint {
            text: text.to_string(),
        })?
    };
    Ok(Key::new(tonic, mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_count() {
        assert_eq!(Mode::all().count(), 46);
    }

    #[test]
    fn test_rotations() {
        assert_eq!(
            Mode::Mixolydian.intervals().as_slice(),
            &[0, 2, 4, 5, 7, 9, 10]
        );
        assert_eq!(Mode::Dorian.intervals().as_slice(), &[0, 2, 3, 5, 7, 9, 10]);
        assert_eq!(Mode::Aeolian.intervals().as_slice(), &[0, 2, 3, 5, 7, 8, 10]);
        assert_eq!(
            Mode::PhrygianDominant.intervals().as_slice(),
            &[0, 1, 4, 5, 7, 8, 10]
        );
        // The second blues mode is the major blues scale
        assert_eq!(Mode::MajorBlues.intervals().as_slice(), &[0, 2, 3, 4, 7, 9]);
    }

    #[test]
    fn test_every_mode_starts_at_zero() {
        for mode in Mode::all() {
            let iv = mode.intervals();
            assert_eq!(iv[0], 0, "{} does not start at 0", mode.name());
            assert!(iv.windows(2).all(|w| w[0] < w[1]), "{} not ascending", mode.name());
        }
    }

    #[test]
    fn test_mode_names_round_trip() {
        for mode in Mode::all() {
            assert_eq!(Mode::from_name(mode.name()), Some(mode));
        }
        assert_eq!(Mode::from_name("major"), Some(Mode::Ionian));
        assert_eq!(Mode::from_name("MINOR"), Some(Mode::Aeolian));
        assert_eq!(Mode::from_name("harmonic minor"), Some(Mode::HarmonicMinor));
        assert_eq!(Mode::from_name("nonsense"), None);
    }

    #[test]
    fn test_key_membership() {
        let c_major = Key::from_pitch_class(0, Mode::Ionian);
        for pc in [0, 2, 4, 5, 7, 9, 11] {
            assert!(c_major.contains(pc));
        }
        for pc in [1, 3, 6, 8, 10] {
            assert!(!c_major.contains(pc));
        }
        assert_eq!(c_major.degree_of(7), Some(5));
        assert_eq!(c_major.degree_of(10), None);
    }

    #[test]
    fn test_degree_of_chromatic_prefers_flat_upper_neighbour() {
        let c_major = Key::from_pitch_class(0, Mode::Ionian);
        assert_eq!(c_major.degree_of_chromatic(10), (7, Accidental::Flat));
        assert_eq!(c_major.degree_of_chromatic(1), (2, Accidental::Flat));
        assert_eq!(c_major.degree_of_chromatic(7), (5, Accidental::Natural));
    }

    #[test]
    fn test_spell_in_key() {
        let d_major = Key::new(
            NoteName::natural(crate::pitch::Letter::D),
            Mode::Ionian,
        );
        assert_eq!(d_major.spell(6).render(), "F\u{266f}");
        assert_eq!(d_major.spell(1).render(), "C\u{266f}");

        let f_minor = Key::from_pitch_class(5, Mode::Aeolian);
        assert_eq!(f_minor.spell(8).render(), "A\u{266d}");
        assert_eq!(f_minor.spell(1).render(), "D\u{266d}");
    }

    #[test]
    fn test_degree_chords_major() {
        let c_major = Key::from_pitch_class(0, Mode::Ionian);
        let chords = c_major.degree_chords();
        assert_eq!(chords[0].triad, Some(ChordQuality::Major));
        assert_eq!(chords[1].triad, Some(ChordQuality::Minor));
        assert_eq!(chords[4].triad, Some(ChordQuality::Major));
        assert_eq!(chords[6].triad, Some(ChordQuality::Diminished));
        assert_eq!(chords[0].seventh, Some(ChordQuality::Major7));
        assert_eq!(chords[4].seventh, Some(ChordQuality::Dominant7));
        assert_eq!(chords[6].seventh, Some(ChordQuality::HalfDiminished));
    }

    #[test]
    fn test_degree_chords_harmonic_minor_dominant() {
        let a_hm = Key::from_pitch_class(9, Mode::HarmonicMinor);
        let chords = a_hm.degree_chords();
        // The fifth degree of harmonic minor carries a major triad
        assert_eq!(chords[4].triad, Some(ChordQuality::Major));
        assert_eq!(chords[4].seventh, Some(ChordQuality::Dominant7));
        assert_eq!(chords[6].seventh, Some(ChordQuality::Diminished7));
    }

    #[test]
    fn test_mode_of_degree() {
        let c_major = Key::from_pitch_class(0, Mode::Ionian);
        assert_eq!(c_major.mode_of_degree(2).unwrap(), Mode::Dorian);
        assert_eq!(c_major.mode_of_degree(5).unwrap(), Mode::Mixolydian);
        assert_eq!(c_major.mode_of_degree(6).unwrap(), Mode::Aeolian);
        assert!(c_major.mode_of_degree(8).is_err());
    }

    #[test]
    fn test_detect_parent_scales_diatonic() {
        let notes = [0, 2, 4, 5, 7, 9, 11];
        let keys = detect_parent_scales(&notes);
        assert!(!keys.is_empty());
        // C major ranks first, A minor next
        assert_eq!(keys[0].tonic, 0);
        assert_eq!(keys[0].mode, Mode::Ionian);
        assert_eq!(keys[1].tonic, 9);
        assert_eq!(keys[1].mode, Mode::Aeolian);
    }

    #[test]
    fn test_detect_parent_scales_harmonic_minor() {
        // A harmonic minor: A B C D E F G#
        let notes = [9, 11, 0, 2, 4, 5, 8];
        let keys = detect_parent_scales(&notes);
        assert!(keys
            .iter()
            .any(|k| k.tonic == 9 && k.mode == Mode::HarmonicMinor));
        // No full diatonic scale contains G# alongside F natural and C
        assert!(keys.iter().all(|k| k.mode != Mode::Ionian));
    }

    #[test]
    fn test_detect_parent_scales_empty() {
        assert!(detect_parent_scales(&[]).is_empty());
    }

    #[test]
    fn test_parse_key_hint() {
        let c = parse_key_hint("C major").unwrap();
        assert_eq!((c.tonic, c.mode), (0, Mode::Ionian));

        let am = parse_key_hint("A minor").unwrap();
        assert_eq!((am.tonic, am.mode), (9, Mode::Aeolian));

        let fsharp = parse_key_hint("f# dorian").unwrap();
        assert_eq!((fsharp.tonic, fsharp.mode), (6, Mode::Dorian));

        let bb_hm = parse_key_hint("Bb harmonic minor").unwrap();
        assert_eq!((bb_hm.tonic, bb_hm.mode), (10, Mode::HarmonicMinor));

        let bare = parse_key_hint("G").unwrap();
        assert_eq!((bare.tonic, bare.mode), (7, Mode::Ionian));

        assert!(parse_key_hint("").is_err());
        assert!(parse_key_hint("C nonsense").is_err());
        assert!(parse_key_hint("X major").is_err());
    }

    #[test]
    fn test_minorish() {
        assert!(Mode::Aeolian.is_minorish());
        assert!(Mode::Dorian.is_minorish());
        assert!(Mode::HarmonicMinor.is_minorish());
        assert!(!Mode::Ionian.is_minorish());
        assert!(!Mode::Mixolydian.is_minorish());
        assert!(!Mode::Lydian.is_minorish());
    }

    #[test]
    fn test_characteristic_degrees() {
        assert_eq!(
            Mode::Mixolydian.characteristic_degree(),
            Some((Accidental::Flat, 7))
        );
        assert_eq!(
            Mode::Lydian.characteristic_degree(),
            Some((Accidental::Sharp, 4))
        );
        assert_eq!(Mode::Ionian.characteristic_degree(), None);
    }
}
