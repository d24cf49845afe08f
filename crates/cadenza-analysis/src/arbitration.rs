//! Track arbitration
//!
//! Each candidate key's three raw track scores are reduced to one labelled
//! interpretation type. Near-ties resolve by the stable pedagogical
//! preference functional > modal > chromatic; ranking across keys happens
//! downstream on post-calibration scores.

use crate::tracks::TrackScores;
use cadenza_config::ARBITRATION;
use cadenza_patterns::TrackKind;

/// Choose the interpretation type for one candidate key.
///
/// The winner is the highest raw score; any track within the tie delta of
/// the top takes precedence in the order functional, modal, chromatic.
pub fn choose_track(scores: &TrackScores) -> (TrackKind, f64) {
    let best = scores.max();
    for track in TrackKind::ALL {
        if best - scores.get(track) < ARBITRATION.track_tie_delta {
            return (track, scores.get(track));
        }
    }
    // Unreachable: the maximum itself is always within the delta
    (TrackKind::Functional, scores.functional)
}
