//! Match (game) between two teams, and its optional result.

use crate::models::match_day::{MatchDayId, StageTag};
use crate::models::team::TeamId;
use crate::models::tournament::TournamentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Final score of a match: rounds won by team A and team B.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score_a: u32,
    pub score_b: u32,
}

impl MatchResult {
    pub fn new(score_a: u32, score_b: u32) -> Self {
        Self { score_a, score_b }
    }

    /// True when one side scored more than the other.
    pub fn is_decided(&self) -> bool {
        self.score_a != self.score_b
    }
}

/// Winner and loser of a decided match, with their scores.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Outcome {
    pub winner: TeamId,
    pub winner_score: u32,
    pub loser: TeamId,
    pub loser_score: u32,
}

/// A single match: team A against team B, inside one match-day.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub match_day_id: MatchDayId,
    /// Copied from the owning match-day.
    pub stage: StageTag,
    pub team_a: TeamId,
    pub team_b: TeamId,
    /// None if not yet played.
    pub result: Option<MatchResult>,
    /// Map the match was played on, if recorded.
    pub map: Option<String>,
}

impl GameMatch {
    pub fn new(
        tournament_id: TournamentId,
        match_day_id: MatchDayId,
        stage: StageTag,
        team_a: TeamId,
        team_b: TeamId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            match_day_id,
            stage,
            team_a,
            team_b,
            result: None,
            map: None,
        }
    }

    pub fn is_played(&self) -> bool {
        self.result.is_some()
    }

    /// Winner/loser split, or None if unplayed or level.
    pub fn outcome(&self) -> Option<Outcome> {
        let r = self.result.filter(MatchResult::is_decided)?;
        let outcome = if r.score_a > r.score_b {
            Outcome {
                winner: self.team_a,
                winner_score: r.score_a,
                loser: self.team_b,
                loser_score: r.score_b,
            }
        } else {
            Outcome {
                winner: self.team_b,
                winner_score: r.score_b,
                loser: self.team_a,
                loser_score: r.score_a,
            }
        };
        Some(outcome)
    }
}
