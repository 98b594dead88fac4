//! Player leaderboard built from per-match kills and deaths.

use crate::models::{MatchStats, PlayerId, PlayerStats, Team};
use std::collections::HashMap;

/// Default number of players shown on the leaderboard.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// Aggregate `stats` per player and return the top `limit` players.
///
/// Sorted by kills (desc), then deaths (asc), then name. Players on a roster
/// without any stats line are left out; stats lines for players missing from
/// every roster are skipped.
pub fn player_leaderboard(teams: &[Team], stats: &[MatchStats], limit: usize) -> Vec<PlayerStats> {
    let mut totals: HashMap<PlayerId, PlayerStats> = HashMap::new();
    let roster: HashMap<PlayerId, _> = teams
        .iter()
        .flat_map(|t| &t.players)
        .map(|p| (p.id, p))
        .collect();

    for line in stats {
        let Some(player) = roster.get(&line.player_id) else {
            log::warn!("Skipping stats line {}: player {} not on any roster", line.id, line.player_id);
            continue;
        };
        totals
            .entry(line.player_id)
            .or_insert_with(|| PlayerStats::from_player(player))
            .add(line);
    }

    let mut board: Vec<PlayerStats> = totals.into_values().collect();
    board.sort_by(|a, b| {
        b.kills
            .cmp(&a.kills)
            .then_with(|| a.deaths.cmp(&b.deaths))
            .then_with(|| a.player_name.cmp(&b.player_name))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    board.truncate(limit);
    board
}
