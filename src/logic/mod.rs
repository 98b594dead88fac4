//! Tournament business logic: standings, bracket seeding, stage progression, fixture views.

mod finals;
mod fixture;
mod leaderboard;
mod stage;
mod standings;

pub use finals::{seed_final, seed_semifinals, FinalDraw, Pairing, SemifinalDraw, SEMIFINAL_TEAMS};
pub use fixture::{next_match_day, progress};
pub use leaderboard::{player_leaderboard, DEFAULT_LEADERBOARD_SIZE};
pub use stage::{StageAdvance, StageMachine};
pub use standings::{
    compute_standings, loser_points, winner_points, write_standings_csv, StandingsRow,
    CONSOLATION_MIN_SCORE, OVERTIME_WIN_POINTS, REGULATION_MAX_SCORE, REGULATION_WIN_POINTS,
};
