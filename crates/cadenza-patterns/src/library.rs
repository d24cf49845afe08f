//! The loaded, indexed pattern library
//!
//! A library is built once at startup from a JSON document, indexed by
//! family, scope, and track, and shared read-only across analysis calls.
//! Profiles are applied as lightweight views: a subset of pattern indices
//! with per-family weight multipliers.

use crate::dsl::{Pattern, PatternFile, Scope, PATTERN_FILE_VERSION};
use crate::error::{LibraryError, LibraryResult};
use crate::evidence::TrackKind;
use ahash::AHashMap;
use cadenza_config::Profile;
use log::debug;

/// Default pattern library shipped with the crate
const BUILTIN_PATTERNS: &str = include_str!("../data/patterns.json");

/// An immutable, indexed pattern library
#[derive(Debug)]
pub struct PatternLibrary {
    /// Patterns ordered by priority descending, then id ascending
    patterns: Vec<Pattern>,
    by_family: AHashMap<String, Vec<usize>>,
    by_scope: AHashMap<Scope, Vec<usize>>,
    by_track: AHashMap<TrackKind, Vec<usize>>,
}

impl PatternLibrary {
    /// Load and validate a library from a JSON document.
    ///
    /// Loading is all-or-nothing: any invalid definition rejects the whole
    /// document.
    pub fn from_json_str(json: &str) -> LibraryResult<Self> {
        let file: PatternFile = serde_json::from_str(json)?;
        if file.version != PATTERN_FILE_VERSION {
            return Err(LibraryError::UnsupportedVersion {
                version: file.version,
            });
        }

        let mut patterns = Vec::with_capacity(file.patterns.len());
        for def in file.patterns {
            patterns.push(def.compile()?);
        }
        for (i, pattern) in patterns.iter().enumerate() {
            if patterns[..i].iter().any(|p| p.id == pattern.id) {
                return Err(LibraryError::InvalidPatternDefinition {
                    id: pattern.id.clone(),
                    reason: "duplicate pattern id".to_string(),
                });
            }
        }

        patterns.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

        let mut by_family: AHashMap<String, Vec<usize>> = AHashMap::new();
        let mut by_scope: AHashMap<Scope, Vec<usize>> = AHashMap::new();
        let mut by_track: AHashMap<TrackKind, Vec<usize>> = AHashMap::new();
        for (i, pattern) in patterns.iter().enumerate() {
            by_family.entry(pattern.family.clone()).or_default().push(i);
            for &scope in &pattern.scope {
                by_scope.entry(scope).or_default().push(i);
            }
            for track in TrackKind::ALL {
                if pattern.track.get(track) > 0.0 {
                    by_track.entry(track).or_default().push(i);
                }
            }
        }

        debug!(
            "loaded pattern library: {} patterns, {} families",
            patterns.len(),
            by_family.len()
        );

        Ok(PatternLibrary {
            patterns,
            by_family,
            by_scope,
            by_track,
        })
    }

    /// Load the library shipped with the crate
    pub fn builtin() -> LibraryResult<Self> {
        Self::from_json_str(BUILTIN_PATTERNS)
    }

    /// All patterns in priority order
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Number of loaded patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when the library holds no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Look a pattern up by id
    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    /// Patterns in one family, in priority order
    pub fn by_family(&self, family: &str) -> impl Iterator<Item = &Pattern> {
        self.by_family
            .get(family)
            .into_iter()
            .flatten()
            .map(move |&i| &self.patterns[i])
    }

    /// Patterns carrying the given scope, in priority order
    pub fn by_scope(&self, scope: Scope) -> impl Iterator<Item = &Pattern> {
        self.by_scope
            .get(&scope)
            .into_iter()
            .flatten()
            .map(move |&i| &self.patterns[i])
    }

    /// Patterns contributing to the given track, in priority order
    pub fn by_track(&self, track: TrackKind) -> impl Iterator<Item = &Pattern> {
        self.by_track
            .get(&track)
            .into_iter()
            .flatten()
            .map(move |&i| &self.patterns[i])
    }

    /// The library as seen through a profile: excluded families dropped,
    /// per-family multipliers attached.
    pub fn view(&self, profile: Profile) -> LibraryView<'_> {
        let entries = self
            .patterns
            .iter()
            .filter_map(|pattern| {
                let multiplier = profile.family_multiplier(&pattern.family);
                if multiplier > 0.0 {
                    Some(ViewEntry {
                        pattern,
                        multiplier,
                    })
                } else {
                    None
                }
            })
            .collect();
        LibraryView { entries }
    }
}

/// One pattern as seen through a profile
#[derive(Debug, Clone, Copy)]
pub struct ViewEntry<'a> {
    pub pattern: &'a Pattern,
    pub multiplier: f64,
}

/// A profile-filtered view over a library, preserving priority order
#[derive(Debug)]
pub struct LibraryView<'a> {
    entries: Vec<ViewEntry<'a>>,
}

impl<'a> LibraryView<'a> {
    /// Entries in priority order
    pub fn entries(&self) -> &[ViewEntry<'a>] {
        &self.entries
    }

    /// Number of visible patterns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the profile filtered everything out
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
