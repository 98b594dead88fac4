//! Knockout rounds: semifinal seeding from the standings, final seeding from the semifinals.

use crate::logic::standings::StandingsRow;
use crate::models::{GameMatch, TeamId, TournamentError};
use serde::{Deserialize, Serialize};

/// Teams ranked this high or better reach the semifinals.
pub const SEMIFINAL_TEAMS: usize = 4;

/// Two teams drawn against each other; `team_a` is listed first on the match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub team_a: TeamId,
    pub team_b: TeamId,
}

impl Pairing {
    pub fn new(team_a: TeamId, team_b: TeamId) -> Self {
        Self { team_a, team_b }
    }
}

/// Semifinal pairings: 1st v 4th and 2nd v 3rd.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SemifinalDraw {
    pub first: Pairing,
    pub second: Pairing,
}

impl SemifinalDraw {
    /// Pairings in the order of `StageTag::SEMIFINALS`.
    pub fn pairings(&self) -> [Pairing; 2] {
        [self.first, self.second]
    }
}

/// Third place and final pairings.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FinalDraw {
    pub third_place: Pairing,
    pub final_pair: Pairing,
}

impl FinalDraw {
    /// Pairings in the order of `StageTag::FINALS`.
    pub fn pairings(&self) -> [Pairing; 2] {
        [self.third_place, self.final_pair]
    }
}

/// Seed the semifinals from ranked standings: rank 1 v rank 4, rank 2 v rank 3.
pub fn seed_semifinals(standings: &[StandingsRow]) -> Result<SemifinalDraw, TournamentError> {
    if standings.len() < SEMIFINAL_TEAMS {
        return Err(TournamentError::InsufficientTeams {
            required: SEMIFINAL_TEAMS,
            available: standings.len(),
        });
    }
    let s = standings;
    Ok(SemifinalDraw {
        first: Pairing::new(s[0].team_id, s[3].team_id),
        second: Pairing::new(s[1].team_id, s[2].team_id),
    })
}

/// Seed third place and final from the two semifinals, given in slot order.
///
/// Winners meet in the final, losers play for third place; semifinal 1's team
/// is listed first in both pairings.
pub fn seed_final(semifinals: &[GameMatch]) -> Result<FinalDraw, TournamentError> {
    let [first, second] = semifinals else {
        return Err(TournamentError::SemifinalsIncomplete);
    };
    let (Some(a), Some(b)) = (first.outcome(), second.outcome()) else {
        return Err(TournamentError::SemifinalsIncomplete);
    };
    Ok(FinalDraw {
        third_place: Pairing::new(a.loser, b.loser),
        final_pair: Pairing::new(a.winner, b.winner),
    })
}
