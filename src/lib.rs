//! Team tournament tracker: library with models, progression logic and storage.

pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    compute_standings, next_match_day, player_leaderboard, progress, seed_final, seed_semifinals,
    write_standings_csv, FinalDraw, Pairing, SemifinalDraw, StageAdvance, StageMachine,
    StandingsRow,
};
pub use models::{
    GameMatch, MatchDay, MatchDayId, MatchId, MatchResult, MatchStats, Player, PlayerId,
    PlayerStats, SemifinalSlot, StageTag, Team, TeamId, Tournament, TournamentError, TournamentId,
    TournamentStage,
};
pub use store::{MatchDayFactory, MatchResultStore, MemoryStore, StoreError, TournamentStore};
