//! Storage collaborators used by the progression engine.
//!
//! The engine only talks to these traits; `MemoryStore` is the in-process
//! implementation used by the web binary and the tests.

mod memory;

pub use memory::MemoryStore;

use crate::models::{
    GameMatch, MatchDay, MatchDayId, MatchStats, StageTag, Team, TeamId, Tournament, TournamentId,
    TournamentStage,
};
use async_trait::async_trait;
use thiserror::Error;

/// Failures raised by a storage backend. Passed through to callers unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: uuid::Uuid },
    #[error("storage lock poisoned")]
    LockPoisoned,
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to a tournament's teams and recorded results.
#[async_trait]
pub trait MatchResultStore: Send + Sync {
    /// All matches of the tournament, across every match-day.
    async fn list_matches(&self, tournament_id: TournamentId) -> StoreResult<Vec<GameMatch>>;

    /// Teams in registration order, with rosters.
    async fn list_teams(&self, tournament_id: TournamentId) -> StoreResult<Vec<Team>>;

    /// Match-days in creation order, with nested matches.
    async fn list_match_days(&self, tournament_id: TournamentId) -> StoreResult<Vec<MatchDay>>;

    /// Per-player stats lines of every match in the tournament.
    async fn list_match_stats(&self, tournament_id: TournamentId) -> StoreResult<Vec<MatchStats>>;
}

/// Materializes generated bracket match-days.
#[async_trait]
pub trait MatchDayFactory: Send + Sync {
    /// Persist a match-day for `stage` holding one unplayed match `team_a` vs `team_b`.
    async fn create(
        &self,
        tournament_id: TournamentId,
        stage: StageTag,
        team_a: TeamId,
        team_b: TeamId,
    ) -> StoreResult<MatchDayId>;

    /// The tournament's match-day tagged `stage`, if one exists.
    async fn find_by_stage(
        &self,
        tournament_id: TournamentId,
        stage: StageTag,
    ) -> StoreResult<Option<MatchDay>>;
}

/// Read/write of the tournament record and its stage field.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    async fn get(&self, tournament_id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// Most recently created active tournament.
    async fn get_active(&self) -> StoreResult<Option<Tournament>>;

    async fn set_stage(
        &self,
        tournament_id: TournamentId,
        stage: TournamentStage,
    ) -> StoreResult<Tournament>;
}
