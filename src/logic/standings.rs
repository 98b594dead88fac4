//! Group stage standings: scoring and tie-breaking.

use crate::models::{GameMatch, Team, TeamId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Highest winning score that still counts as a regulation win.
pub const REGULATION_MAX_SCORE: u32 = 16;
/// Points for a regulation win.
pub const REGULATION_WIN_POINTS: u32 = 3;
/// Points for a win past the regulation score (overtime).
pub const OVERTIME_WIN_POINTS: u32 = 2;
/// A loser scoring at least this many gets a consolation point.
pub const CONSOLATION_MIN_SCORE: u32 = 12;

/// One line of the points table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub team_id: TeamId,
    pub team_name: String,
    pub wins: u32,
    pub losses: u32,
    pub points: u32,
}

impl StandingsRow {
    fn new(team: &Team) -> Self {
        Self {
            team_id: team.id,
            team_name: team.name.clone(),
            wins: 0,
            losses: 0,
            points: 0,
        }
    }
}

/// Points awarded to the winner of a decided match.
pub fn winner_points(winner_score: u32) -> u32 {
    if winner_score <= REGULATION_MAX_SCORE {
        REGULATION_WIN_POINTS
    } else {
        OVERTIME_WIN_POINTS
    }
}

/// Consolation points awarded to the loser of a decided match.
pub fn loser_points(loser_score: u32) -> u32 {
    u32::from(loser_score >= CONSOLATION_MIN_SCORE)
}

/// Number of times the first team beat the second, keyed by (winner, loser).
type HeadToHead = HashMap<(TeamId, TeamId), u32>;

/// Compute the ranked standings table for `teams` from `matches`.
///
/// Only group-stage matches with a decided result count. Rows come back
/// ordered by points, then head-to-head wins between the two compared teams,
/// then total wins, then fewest losses; teams still level keep their order in
/// `teams`.
pub fn compute_standings(teams: &[Team], matches: &[GameMatch]) -> Vec<StandingsRow> {
    let mut rows: Vec<StandingsRow> = teams.iter().map(StandingsRow::new).collect();
    let index: HashMap<TeamId, usize> = teams.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
    let mut head_to_head = HeadToHead::new();
    let mut counted = 0usize;

    for m in matches.iter().filter(|m| !m.stage.is_knockout()) {
        let Some(o) = m.outcome() else {
            continue;
        };
        let (Some(&w), Some(&l)) = (index.get(&o.winner), index.get(&o.loser)) else {
            log::warn!("Skipping match {}: team not registered in tournament", m.id);
            continue;
        };
        rows[w].wins += 1;
        rows[w].points += winner_points(o.winner_score);
        rows[l].losses += 1;
        rows[l].points += loser_points(o.loser_score);
        *head_to_head.entry((o.winner, o.loser)).or_default() += 1;
        counted += 1;
    }

    log::debug!(
        "Computed standings for {} teams from {} decided group stage matches",
        rows.len(),
        counted
    );

    sort_rows(&mut rows, &head_to_head);
    rows
}

fn compare_rows(a: &StandingsRow, b: &StandingsRow, head_to_head: &HeadToHead) -> Ordering {
    let beat = |x: TeamId, y: TeamId| head_to_head.get(&(x, y)).copied().unwrap_or(0);
    b.points
        .cmp(&a.points)
        .then_with(|| beat(b.team_id, a.team_id).cmp(&beat(a.team_id, b.team_id)))
        .then_with(|| b.wins.cmp(&a.wins))
        .then_with(|| a.losses.cmp(&b.losses))
}

/// Stable insertion sort.
///
/// Head-to-head is not transitive (three level teams can beat each other in a
/// cycle), so `compare_rows` is not a total order and must not be handed to
/// `slice::sort_by`, which may panic on inconsistent comparators.
fn sort_rows(rows: &mut [StandingsRow], head_to_head: &HeadToHead) {
    for i in 1..rows.len() {
        let mut j = i;
        while j > 0 && compare_rows(&rows[j - 1], &rows[j], head_to_head) == Ordering::Greater {
            rows.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Write the table as CSV, header row first.
pub fn write_standings_csv<W: std::io::Write>(
    rows: &[StandingsRow],
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
