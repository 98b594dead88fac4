//! Stage progression: group stage -> semifinals -> final -> completed.

use crate::logic::finals::{seed_final, seed_semifinals, Pairing};
use crate::logic::standings::{compute_standings, StandingsRow};
use crate::models::{
    GameMatch, MatchDay, StageTag, Tournament, TournamentError, TournamentId, TournamentStage,
};
use crate::store::{MatchDayFactory, MatchResultStore, TournamentStore};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Result of `StageMachine::advance_stage`.
#[derive(Clone, Debug, Serialize)]
pub struct StageAdvance {
    pub tournament: Tournament,
    /// Knockout match-days of the requested stage (empty for plain status edits).
    pub bracket: Vec<MatchDay>,
    /// True when the bracket already existed and nothing was created.
    pub already_advanced: bool,
}

/// Drives a tournament through its stages against the storage collaborators.
///
/// Calls to `advance_stage` for the same tournament run one at a time.
pub struct StageMachine {
    results: Arc<dyn MatchResultStore>,
    match_days: Arc<dyn MatchDayFactory>,
    tournaments: Arc<dyn TournamentStore>,
    locks: Mutex<HashMap<TournamentId, Arc<tokio::sync::Mutex<()>>>>,
}

impl StageMachine {
    pub fn new(
        results: Arc<dyn MatchResultStore>,
        match_days: Arc<dyn MatchDayFactory>,
        tournaments: Arc<dyn TournamentStore>,
    ) -> Self {
        Self {
            results,
            match_days,
            tournaments,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Use one store for every collaborator.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: MatchResultStore + MatchDayFactory + TournamentStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store)
    }

    fn lock_for(&self, tournament_id: TournamentId) -> LockLease<'_> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = locks.entry(tournament_id).or_default().clone();
        LockLease {
            locks: &self.locks,
            tournament_id,
            lock,
        }
    }

    async fn require(&self, tournament_id: TournamentId) -> Result<Tournament, TournamentError> {
        self.tournaments
            .get(tournament_id)
            .await?
            .ok_or(TournamentError::TournamentNotFound(tournament_id))
    }

    /// Most recently created active tournament.
    pub async fn active_tournament(&self) -> Result<Tournament, TournamentError> {
        self.tournaments
            .get_active()
            .await?
            .ok_or(TournamentError::NoActiveTournament)
    }

    /// Ranked points table of the tournament's group stage.
    pub async fn standings(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<StandingsRow>, TournamentError> {
        self.require(tournament_id).await?;
        let teams = self.results.list_teams(tournament_id).await?;
        let matches = self.results.list_matches(tournament_id).await?;
        Ok(compute_standings(&teams, &matches))
    }

    /// Semifinal matches that exist so far, semifinal 1 first.
    pub async fn semifinal_results(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<GameMatch>, TournamentError> {
        self.require(tournament_id).await?;
        let days = self.existing(tournament_id, &StageTag::SEMIFINALS).await?;
        Ok(days.into_iter().filter_map(|d| d.matches.into_iter().next()).collect())
    }

    /// Every generated knockout match-day, in bracket order.
    pub async fn bracket(&self, tournament_id: TournamentId) -> Result<Vec<MatchDay>, TournamentError> {
        self.require(tournament_id).await?;
        let mut days = self.existing(tournament_id, &StageTag::SEMIFINALS).await?;
        days.extend(self.existing(tournament_id, &StageTag::FINALS).await?);
        Ok(days)
    }

    async fn existing(
        &self,
        tournament_id: TournamentId,
        stages: &[StageTag],
    ) -> Result<Vec<MatchDay>, TournamentError> {
        let mut days = Vec::with_capacity(stages.len());
        for &stage in stages {
            if let Some(day) = self.match_days.find_by_stage(tournament_id, stage).await? {
                days.push(day);
            }
        }
        Ok(days)
    }

    /// Move the tournament to `requested`.
    ///
    /// SEMIFINALS seeds 1v4 and 2v3 from the standings; FINAL seeds third
    /// place and final from the semifinal results. Match-days that already
    /// exist for the target stage are kept, so repeating a call (or retrying
    /// one that failed halfway) never duplicates the bracket; a kept day whose
    /// teams disagree with the recomputed draw is a `BracketConflict`. Any
    /// other stage is stored as-is.
    pub async fn advance_stage(
        &self,
        tournament_id: TournamentId,
        requested: TournamentStage,
    ) -> Result<StageAdvance, TournamentError> {
        self.require(tournament_id).await?;
        let lease = self.lock_for(tournament_id);
        let _guard = lease.lock.lock().await;

        // Re-read under the lock: a concurrent call may have moved the stage.
        let tournament = self.require(tournament_id).await?;
        if requested < tournament.stage {
            return Err(TournamentError::InvalidStageTransition {
                from: tournament.stage,
                to: requested,
            });
        }

        let stages = match requested {
            TournamentStage::Semifinals => StageTag::SEMIFINALS,
            TournamentStage::Final => StageTag::FINALS,
            _ => {
                let tournament = self.tournaments.set_stage(tournament_id, requested).await?;
                log::info!("Tournament {} stage set to {}", tournament_id, requested);
                return Ok(StageAdvance {
                    tournament,
                    bracket: Vec::new(),
                    already_advanced: false,
                });
            }
        };

        let mut existing = Vec::with_capacity(stages.len());
        for stage in stages {
            existing.push(self.match_days.find_by_stage(tournament_id, stage).await?);
        }
        let already_advanced = existing.iter().all(Option::is_some);

        if already_advanced {
            log::info!(
                "Tournament {} already has its {} bracket, nothing to create",
                tournament_id,
                requested
            );
        } else {
            let pairings = match requested {
                TournamentStage::Semifinals => {
                    let standings = self.standings(tournament_id).await?;
                    seed_semifinals(&standings)?.pairings()
                }
                _ => {
                    let semifinals = self.semifinal_results(tournament_id).await?;
                    seed_final(&semifinals)?.pairings()
                }
            };
            // Days left by an interrupted call stay; they must agree with the draw.
            for ((stage, day), pairing) in stages.into_iter().zip(&existing).zip(pairings) {
                if let Some(day) = day {
                    if scheduled_pairing(day) != Some(pairing) {
                        log::warn!(
                            "Tournament {}: existing {} no longer matches the draw ({} vs {})",
                            tournament_id,
                            stage,
                            pairing.team_a,
                            pairing.team_b
                        );
                        return Err(TournamentError::BracketConflict { stage });
                    }
                }
            }
            for ((stage, day), pairing) in stages.into_iter().zip(&existing).zip(pairings) {
                if day.is_none() {
                    self.create_match_day(tournament_id, stage, pairing).await?;
                }
            }
        }

        let tournament = if tournament.stage == requested {
            tournament
        } else {
            let tournament = self.tournaments.set_stage(tournament_id, requested).await?;
            log::info!("Tournament {} advanced to {}", tournament_id, requested);
            tournament
        };
        let bracket = self.existing(tournament_id, &stages).await?;

        Ok(StageAdvance {
            tournament,
            bracket,
            already_advanced,
        })
    }

    async fn create_match_day(
        &self,
        tournament_id: TournamentId,
        stage: StageTag,
        pairing: Pairing,
    ) -> Result<(), TournamentError> {
        let id = self
            .match_days
            .create(tournament_id, stage, pairing.team_a, pairing.team_b)
            .await?;
        log::info!(
            "Created match-day {} ({}) for tournament {}: {} vs {}",
            id,
            stage,
            tournament_id,
            pairing.team_a,
            pairing.team_b
        );
        Ok(())
    }
}

/// Pairing of a knockout match-day's single match.
fn scheduled_pairing(day: &MatchDay) -> Option<Pairing> {
    day.matches.first().map(|m| Pairing::new(m.team_a, m.team_b))
}

/// Holds a tournament's lock entry; drops the entry once nobody else uses it.
struct LockLease<'a> {
    locks: &'a Mutex<HashMap<TournamentId, Arc<tokio::sync::Mutex<()>>>>,
    tournament_id: TournamentId,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here: no other caller holds or waits.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.tournament_id);
        }
    }
}
