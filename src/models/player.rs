//! Player, per-match MatchStats and aggregated PlayerStats.

use crate::models::game::MatchId;
use crate::models::team::TeamId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in rosters and match stats).
pub type PlayerId = Uuid;

/// Unique identifier for a match stats line.
pub type MatchStatsId = Uuid;

/// A player on a team roster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team_id: TeamId,
}

impl Player {
    pub fn new(name: impl Into<String>, team_id: TeamId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            team_id,
        }
    }
}

/// Kills and deaths of one player in one match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub id: MatchStatsId,
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub kills: u32,
    pub deaths: u32,
}

impl MatchStats {
    pub fn new(match_id: MatchId, player_id: PlayerId, team_id: TeamId, kills: u32, deaths: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            player_id,
            team_id,
            kills,
            deaths,
        }
    }
}

/// Statistics view of a player over a whole tournament (for API / display).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team_id: TeamId,
    pub kills: u32,
    pub deaths: u32,
    /// Matches with a stats line for this player.
    pub matches: u32,
}

impl PlayerStats {
    pub fn from_player(p: &Player) -> Self {
        Self {
            player_id: p.id,
            player_name: p.name.clone(),
            team_id: p.team_id,
            kills: 0,
            deaths: 0,
            matches: 0,
        }
    }

    /// Fold one match stats line into the totals.
    pub fn add(&mut self, line: &MatchStats) {
        self.kills += line.kills;
        self.deaths += line.deaths;
        self.matches += 1;
    }
}
