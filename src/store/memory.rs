//! In-memory store: every tournament lives in one process-wide lock.

use super::{MatchDayFactory, MatchResultStore, StoreError, StoreResult, TournamentStore};
use crate::models::{
    GameMatch, MatchDay, MatchDayId, MatchId, MatchResult, MatchStats, Player, PlayerId, StageTag,
    Team, TeamId, Tournament, TournamentId, TournamentStage,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Inner {
    /// Creation order.
    tournaments: Vec<Tournament>,
    match_stats: HashMap<TournamentId, Vec<MatchStats>>,
}

impl Inner {
    fn tournament(&self, id: TournamentId) -> StoreResult<&Tournament> {
        self.tournaments
            .iter()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound { kind: "tournament", id })
    }

    fn tournament_mut(&mut self, id: TournamentId) -> StoreResult<&mut Tournament> {
        self.tournaments
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound { kind: "tournament", id })
    }
}

/// Thread-safe in-memory implementation of every storage trait, plus the
/// administrative CRUD needed to set a tournament up.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

fn find_match_mut(t: &mut Tournament, match_id: MatchId) -> StoreResult<&mut GameMatch> {
    t.match_days
        .iter_mut()
        .flat_map(|d| d.matches.iter_mut())
        .find(|m| m.id == match_id)
        .ok_or(StoreError::NotFound { kind: "match", id: match_id })
}

fn ensure_team(t: &Tournament, team_id: TeamId) -> StoreResult<()> {
    t.team(team_id)
        .map(|_| ())
        .ok_or(StoreError::NotFound { kind: "team", id: team_id })
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Create a new active tournament in the group stage.
    pub fn create_tournament(&self, name: impl Into<String>) -> StoreResult<Tournament> {
        let tournament = Tournament::new(name);
        let mut g = self.write()?;
        g.tournaments.push(tournament.clone());
        Ok(tournament)
    }

    /// Mark a tournament active or inactive.
    pub fn set_active(&self, tournament_id: TournamentId, active: bool) -> StoreResult<Tournament> {
        let mut g = self.write()?;
        let t = g.tournament_mut(tournament_id)?;
        t.active = active;
        Ok(t.clone())
    }

    /// Register a team (empty roster).
    pub fn add_team(&self, tournament_id: TournamentId, name: impl Into<String>) -> StoreResult<Team> {
        let team = Team::new(name);
        let mut g = self.write()?;
        g.tournament_mut(tournament_id)?.teams.push(team.clone());
        Ok(team)
    }

    /// Add a player to a team's roster.
    pub fn add_player(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
        name: impl Into<String>,
    ) -> StoreResult<Player> {
        let player = Player::new(name, team_id);
        let mut g = self.write()?;
        let team = g
            .tournament_mut(tournament_id)?
            .team_mut(team_id)
            .ok_or(StoreError::NotFound { kind: "team", id: team_id })?;
        team.players.push(player.clone());
        Ok(player)
    }

    /// Create a group-stage match-day with one unplayed match per pairing.
    pub fn create_match_day(
        &self,
        tournament_id: TournamentId,
        name: impl Into<String>,
        pairings: &[(TeamId, TeamId)],
    ) -> StoreResult<MatchDay> {
        let mut g = self.write()?;
        let t = g.tournament_mut(tournament_id)?;
        for &(a, b) in pairings {
            ensure_team(t, a)?;
            ensure_team(t, b)?;
        }
        let mut day = MatchDay::group_stage(tournament_id, name);
        let (day_id, stage) = (day.id, day.stage);
        day.matches = pairings
            .iter()
            .map(|&(a, b)| GameMatch::new(tournament_id, day_id, stage, a, b))
            .collect();
        t.match_days.push(day.clone());
        Ok(day)
    }

    /// Record (or overwrite) the result of a match.
    pub fn record_result(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        result: MatchResult,
        map: Option<String>,
    ) -> StoreResult<GameMatch> {
        let mut g = self.write()?;
        let m = find_match_mut(g.tournament_mut(tournament_id)?, match_id)?;
        m.result = Some(result);
        if map.is_some() {
            m.map = map;
        }
        Ok(m.clone())
    }

    /// Record kills/deaths for a player in a match. The team is taken from the roster.
    pub fn record_match_stats(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        player_id: PlayerId,
        kills: u32,
        deaths: u32,
    ) -> StoreResult<MatchStats> {
        let mut g = self.write()?;
        let t = g.tournament(tournament_id)?;
        if !t.match_days.iter().flat_map(|d| &d.matches).any(|m| m.id == match_id) {
            return Err(StoreError::NotFound { kind: "match", id: match_id });
        }
        let team_id = t
            .teams
            .iter()
            .find(|team| team.players.iter().any(|p| p.id == player_id))
            .map(|team| team.id)
            .ok_or(StoreError::NotFound { kind: "player", id: player_id })?;
        let line = MatchStats::new(match_id, player_id, team_id, kills, deaths);
        g.match_stats.entry(tournament_id).or_default().push(line.clone());
        Ok(line)
    }
}

#[async_trait]
impl MatchResultStore for MemoryStore {
    async fn list_matches(&self, tournament_id: TournamentId) -> StoreResult<Vec<GameMatch>> {
        let g = self.read()?;
        let t = g.tournament(tournament_id)?;
        Ok(t.match_days.iter().flat_map(|d| d.matches.iter().cloned()).collect())
    }

    async fn list_teams(&self, tournament_id: TournamentId) -> StoreResult<Vec<Team>> {
        Ok(self.read()?.tournament(tournament_id)?.teams.clone())
    }

    async fn list_match_days(&self, tournament_id: TournamentId) -> StoreResult<Vec<MatchDay>> {
        Ok(self.read()?.tournament(tournament_id)?.match_days.clone())
    }

    async fn list_match_stats(&self, tournament_id: TournamentId) -> StoreResult<Vec<MatchStats>> {
        let g = self.read()?;
        g.tournament(tournament_id)?;
        Ok(g.match_stats.get(&tournament_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl MatchDayFactory for MemoryStore {
    async fn create(
        &self,
        tournament_id: TournamentId,
        stage: StageTag,
        team_a: TeamId,
        team_b: TeamId,
    ) -> StoreResult<MatchDayId> {
        let mut g = self.write()?;
        let t = g.tournament_mut(tournament_id)?;
        ensure_team(t, team_a)?;
        ensure_team(t, team_b)?;
        let mut day = MatchDay::knockout(tournament_id, stage);
        day.matches
            .push(GameMatch::new(tournament_id, day.id, stage, team_a, team_b));
        let id = day.id;
        t.match_days.push(day);
        Ok(id)
    }

    async fn find_by_stage(
        &self,
        tournament_id: TournamentId,
        stage: StageTag,
    ) -> StoreResult<Option<MatchDay>> {
        let g = self.read()?;
        let t = g.tournament(tournament_id)?;
        Ok(t.match_days.iter().find(|d| d.stage == stage).cloned())
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn get(&self, tournament_id: TournamentId) -> StoreResult<Option<Tournament>> {
        let g = self.read()?;
        Ok(g.tournaments.iter().find(|t| t.id == tournament_id).cloned())
    }

    async fn get_active(&self) -> StoreResult<Option<Tournament>> {
        let g = self.read()?;
        // max_by_key keeps the last of equal keys, i.e. the later insert.
        Ok(g.tournaments
            .iter()
            .filter(|t| t.active)
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn set_stage(
        &self,
        tournament_id: TournamentId,
        stage: TournamentStage,
    ) -> StoreResult<Tournament> {
        let mut g = self.write()?;
        let t = g.tournament_mut(tournament_id)?;
        t.stage = stage;
        Ok(t.clone())
    }
}
