//! Fixture helpers: what is left to play.

use crate::models::MatchDay;

/// First match-day, in creation order, that still has an unplayed match.
pub fn next_match_day(match_days: &[MatchDay]) -> Option<&MatchDay> {
    match_days.iter().find(|d| d.has_unplayed())
}

/// Count of (played, total) matches across the given match-days.
pub fn progress(match_days: &[MatchDay]) -> (usize, usize) {
    match_days
        .iter()
        .flat_map(|d| &d.matches)
        .fold((0, 0), |(played, total), m| {
            (played + usize::from(m.is_played()), total + 1)
        })
}
