//! Data structures for the team tournament: teams, players, matches, match-days, tournament state.

mod game;
mod match_day;
mod player;
mod team;
mod tournament;

pub use game::{GameMatch, MatchId, MatchResult, Outcome};
pub use match_day::{MatchDay, MatchDayId, SemifinalSlot, StageTag};
pub use player::{MatchStats, MatchStatsId, Player, PlayerId, PlayerStats};
pub use team::{Team, TeamId};
pub use tournament::{Tournament, TournamentError, TournamentId, TournamentStage};
