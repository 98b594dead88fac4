//! Tournament, TournamentStage and TournamentError.

use crate::models::match_day::{MatchDay, StageTag};
use crate::models::team::{Team, TeamId};
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during tournament operations.
#[derive(Debug, Error)]
pub enum TournamentError {
    /// No tournament with this id.
    #[error("Tournament {0} not found")]
    TournamentNotFound(TournamentId),
    /// No tournament is marked active.
    #[error("No active tournament")]
    NoActiveTournament,
    /// Not enough ranked teams to seed the semifinals.
    #[error("Need at least {required} teams to seed the semifinals (have {available})")]
    InsufficientTeams { required: usize, available: usize },
    /// Final requested before both semifinals have a decided result.
    #[error("Both semifinals need a decided result before the final can be seeded")]
    SemifinalsIncomplete,
    /// A match-day of the bracket already exists with teams the current
    /// draw no longer puts there.
    #[error("Existing {stage} match-day does not match the current draw")]
    BracketConflict { stage: StageTag },
    /// Requested stage lies behind the current one.
    #[error("Cannot move tournament from {from} back to {to}")]
    InvalidStageTransition {
        from: TournamentStage,
        to: TournamentStage,
    },
    /// Storage collaborator failed.
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Current phase of the tournament. Stages only move forward, in declaration order.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStage {
    /// Round robin; every match feeds the standings table.
    #[default]
    GroupStage,
    /// Top four play 1v4 and 2v3.
    Semifinals,
    /// Status only: no transition generates a bracket for it.
    ThirdPlace,
    /// Third place match and final are scheduled.
    Final,
    /// Tournament finished.
    Completed,
}

impl fmt::Display for TournamentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TournamentStage::GroupStage => "GROUP_STAGE",
            TournamentStage::Semifinals => "SEMIFINALS",
            TournamentStage::ThirdPlace => "THIRD_PLACE",
            TournamentStage::Final => "FINAL",
            TournamentStage::Completed => "COMPLETED",
        };
        f.write_str(s)
    }
}

/// Full tournament state: teams, match-days and phase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub stage: TournamentStage,
    /// Only active tournaments are picked up by "active" queries.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub teams: Vec<Team>,
    /// Match-days in creation order.
    pub match_days: Vec<MatchDay>,
}

impl Tournament {
    /// Create a new active tournament in the group stage with no teams.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            stage: TournamentStage::GroupStage,
            active: true,
            created_at: Utc::now(),
            teams: Vec::new(),
            match_days: Vec::new(),
        }
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn team_mut(&mut self, id: TeamId) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.id == id)
    }
}
