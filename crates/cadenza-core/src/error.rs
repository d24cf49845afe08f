//! Error types for theory operations

use thiserror::Error;

/// Error types for pitch, chord, key, and Roman-numeral operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TheoryError {
    #[error("invalid note name: {token:?}")]
    InvalidNoteName { token: String },

    #[error("invalid chord symbol: {symbol:?}")]
    InvalidChordSymbol { symbol: String },

    #[error("unrecognized quality suffix {suffix:?} in chord symbol {symbol:?}")]
    UnrecognizedQuality { symbol: String, suffix: String },

    #[error("invalid key hint: {text:?}")]
    InvalidKeyHint { text: String },

    #[error("Roman numeral input requires a key")]
    MissingKeyForRomanInput,

    #[error("invalid Roman numeral input: {text:?}")]
    InvalidRomanInput { text: String },

    #[error("scale degree out of range: {degree}. Must be 1-7")]
    ScaleDegreeOutOfRange { degree: u8 },

    #[error("chord {symbol:?} is not expressible in the given key")]
    NotExpressibleInKey { symbol: String },
}

/// Result type for theory operations
pub type TheoryResult<T> = Result<T, TheoryError>;

impl TheoryError {
    /// True for errors caused by malformed source text (as opposed to
    /// structurally impossible requests).
    pub fn is_input_error(&self) -> bool {
        match self {
            TheoryError::InvalidNoteName { .. }
            | TheoryError::InvalidChordSymbol { .. }
            | TheoryError::UnrecognizedQuality { .. }
            | TheoryError::InvalidKeyHint { .. }
            | TheoryError::InvalidRomanInput { .. }
            | TheoryError::MissingKeyForRomanInput => true,

            TheoryError::ScaleDegreeOutOfRange { .. }
            | TheoryError::NotExpressibleInKey { .. } => false,
        }
    }
}
