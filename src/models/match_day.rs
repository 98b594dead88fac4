//! MatchDay and the stage tag every match-day carries.

use crate::models::game::GameMatch;
use crate::models::tournament::TournamentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a match-day.
pub type MatchDayId = Uuid;

/// Which of the two semifinals.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemifinalSlot {
    First,
    Second,
}

/// Phase of the tournament a match-day belongs to.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageTag {
    #[default]
    GroupStage,
    Semifinal(SemifinalSlot),
    ThirdPlace,
    Final,
}

impl StageTag {
    pub const SEMIFINALS: [StageTag; 2] = [
        StageTag::Semifinal(SemifinalSlot::First),
        StageTag::Semifinal(SemifinalSlot::Second),
    ];

    /// Third place first, then the final.
    pub const FINALS: [StageTag; 2] = [StageTag::ThirdPlace, StageTag::Final];

    /// Display name given to generated knockout match-days.
    pub fn label(&self) -> &'static str {
        match self {
            StageTag::GroupStage => "Fase de Grupos",
            StageTag::Semifinal(SemifinalSlot::First) => "Semifinal 1",
            StageTag::Semifinal(SemifinalSlot::Second) => "Semifinal 2",
            StageTag::ThirdPlace => "Tercer y Cuarto Puesto",
            StageTag::Final => "Partido Final",
        }
    }

    pub fn is_knockout(&self) -> bool {
        !matches!(self, StageTag::GroupStage)
    }
}

impl fmt::Display for StageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A match-day: a named, ordered set of matches in one tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchDay {
    pub id: MatchDayId,
    pub tournament_id: TournamentId,
    /// Free text for group-stage days (e.g. "Fecha 1"); the stage label otherwise.
    pub name: String,
    pub stage: StageTag,
    pub matches: Vec<GameMatch>,
}

impl MatchDay {
    /// Empty group-stage match-day.
    pub fn group_stage(tournament_id: TournamentId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            name: name.into(),
            stage: StageTag::GroupStage,
            matches: Vec::new(),
        }
    }

    /// Empty knockout match-day, named after its stage.
    pub fn knockout(tournament_id: TournamentId, stage: StageTag) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            name: stage.label().to_string(),
            stage,
            matches: Vec::new(),
        }
    }

    /// True if at least one match has no result yet.
    pub fn has_unplayed(&self) -> bool {
        self.matches.iter().any(|m| !m.is_played())
    }
}
