//! Single binary web server: tournament admin, standings, bracket and stage progression via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080), RUST_LOG (e.g. debug).

use actix_web::{
    get, post, put,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use serde::Deserialize;
use std::sync::Arc;
use team_tournament_web::logic::DEFAULT_LEADERBOARD_SIZE;
use team_tournament_web::{
    next_match_day, player_leaderboard, progress, write_standings_csv, MatchId, MatchResult,
    MatchResultStore, MemoryStore, Pairing, PlayerId, StageMachine, StoreError, TeamId,
    TournamentError, TournamentId, TournamentStage, TournamentStore,
};

/// Shared state: the in-memory store and the stage machine running on top of it.
struct AppContext {
    store: Arc<MemoryStore>,
    machine: StageMachine,
}

type AppState = Data<AppContext>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

#[derive(Deserialize)]
struct CreateMatchDayBody {
    name: String,
    #[serde(default)]
    pairings: Vec<Pairing>,
}

#[derive(Deserialize)]
struct RecordResultBody {
    score_a: u32,
    score_b: u32,
    #[serde(default)]
    map: Option<String>,
}

#[derive(Deserialize)]
struct RecordStatsBody {
    player_id: PlayerId,
    kills: u32,
    deaths: u32,
}

#[derive(Deserialize)]
struct SetStageBody {
    stage: TournamentStage,
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    limit: Option<usize>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and team id.
#[derive(Deserialize)]
struct TournamentTeamPath {
    id: TournamentId,
    team_id: TeamId,
}

/// Path segments: tournament id and match id.
#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: MatchId,
}

/// Map an engine error to its HTTP response: 404 for unknown records, 409 for
/// seeding/transition conflicts, 500 for storage failures.
fn error_response(e: TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::TournamentNotFound(_)
        | TournamentError::NoActiveTournament
        | TournamentError::Persistence(StoreError::NotFound { .. }) => HttpResponse::NotFound().json(body),
        TournamentError::InsufficientTeams { .. }
        | TournamentError::SemifinalsIncomplete
        | TournamentError::BracketConflict { .. }
        | TournamentError::InvalidStageTransition { .. } => HttpResponse::Conflict().json(body),
        TournamentError::Persistence(err) => {
            log::error!("Storage failure: {}", err);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": "storage error" }))
        }
    }
}

fn store_error_response(e: StoreError) -> HttpResponse {
    error_response(TournamentError::from(e))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "team-tournament-web",
    })
}

/// Create a new tournament; it becomes the active one.
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<NameBody>) -> HttpResponse {
    match state.store.create_tournament(body.name.trim()) {
        Ok(t) => {
            log::info!("Created tournament {} ({})", t.name, t.id);
            HttpResponse::Ok().json(t)
        }
        Err(e) => store_error_response(e),
    }
}

/// Fixture: the active tournament with its teams, match-days and matches.
#[get("/api/tournaments/active")]
async fn api_active_tournament(state: AppState) -> HttpResponse {
    match state.machine.active_tournament().await {
        Ok(t) => HttpResponse::Ok().json(t),
        Err(e) => error_response(e),
    }
}

/// Get a tournament by id (404 if not found).
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.store.get(path.id).await {
        Ok(Some(t)) => HttpResponse::Ok().json(t),
        Ok(None) => error_response(TournamentError::TournamentNotFound(path.id)),
        Err(e) => store_error_response(e),
    }
}

/// Register a team.
#[post("/api/tournaments/{id}/teams")]
async fn api_add_team(state: AppState, path: Path<TournamentPath>, body: Json<NameBody>) -> HttpResponse {
    match state.store.add_team(path.id, body.name.trim()) {
        Ok(team) => HttpResponse::Ok().json(team),
        Err(e) => store_error_response(e),
    }
}

/// Add a player to a team's roster.
#[post("/api/tournaments/{id}/teams/{team_id}/players")]
async fn api_add_player(
    state: AppState,
    path: Path<TournamentTeamPath>,
    body: Json<NameBody>,
) -> HttpResponse {
    match state.store.add_player(path.id, path.team_id, body.name.trim()) {
        Ok(player) => HttpResponse::Ok().json(player),
        Err(e) => store_error_response(e),
    }
}

/// Create a group stage match-day from a list of pairings.
#[post("/api/tournaments/{id}/match-days")]
async fn api_create_match_day(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<CreateMatchDayBody>,
) -> HttpResponse {
    let pairings: Vec<(TeamId, TeamId)> = body.pairings.iter().map(|p| (p.team_a, p.team_b)).collect();
    match state.store.create_match_day(path.id, body.name.trim(), &pairings) {
        Ok(day) => HttpResponse::Ok().json(day),
        Err(e) => store_error_response(e),
    }
}

/// Record the result (and optionally the map) of a match.
#[put("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_record_result(
    state: AppState,
    path: Path<TournamentMatchPath>,
    body: Json<RecordResultBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let result = MatchResult::new(body.score_a, body.score_b);
    match state.store.record_result(path.id, path.match_id, result, body.map) {
        Ok(m) => HttpResponse::Ok().json(m),
        Err(e) => store_error_response(e),
    }
}

/// Record kills/deaths of a player in a match.
#[post("/api/tournaments/{id}/matches/{match_id}/stats")]
async fn api_record_stats(
    state: AppState,
    path: Path<TournamentMatchPath>,
    body: Json<RecordStatsBody>,
) -> HttpResponse {
    match state
        .store
        .record_match_stats(path.id, path.match_id, body.player_id, body.kills, body.deaths)
    {
        Ok(line) => HttpResponse::Ok().json(line),
        Err(e) => store_error_response(e),
    }
}

/// Ranked points table.
#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.machine.standings(path.id).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => error_response(e),
    }
}

/// Ranked points table as CSV.
#[get("/api/tournaments/{id}/standings.csv")]
async fn api_standings_csv(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let rows = match state.machine.standings(path.id).await {
        Ok(rows) => rows,
        Err(e) => return error_response(e),
    };
    let mut buf = Vec::new();
    match write_standings_csv(&rows, &mut buf) {
        Ok(()) => HttpResponse::Ok().content_type("text/csv; charset=utf-8").body(buf),
        Err(e) => {
            log::error!("CSV export failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": "csv export failed" }))
        }
    }
}

/// Advance (or edit) the tournament stage; generates the bracket for SEMIFINALS and FINAL.
#[put("/api/tournaments/{id}/stage")]
async fn api_set_stage(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<SetStageBody>,
) -> HttpResponse {
    match state.machine.advance_stage(path.id, body.stage).await {
        Ok(advance) => HttpResponse::Ok().json(advance),
        Err(e) => error_response(e),
    }
}

/// Generated knockout match-days (semifinals, third place, final).
#[get("/api/tournaments/{id}/bracket")]
async fn api_bracket(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.machine.bracket(path.id).await {
        Ok(days) => HttpResponse::Ok().json(days),
        Err(e) => error_response(e),
    }
}

/// The two semifinal matches with their results, semifinal 1 first.
#[get("/api/tournaments/{id}/semifinal-results")]
async fn api_semifinal_results(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.machine.semifinal_results(path.id).await {
        Ok(matches) => HttpResponse::Ok().json(matches),
        Err(e) => error_response(e),
    }
}

/// First match-day that still has unplayed matches (null if everything is played).
#[get("/api/tournaments/{id}/next-match-day")]
async fn api_next_match_day(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let days = match state.store.list_match_days(path.id).await {
        Ok(days) => days,
        Err(e) => return store_error_response(e),
    };
    let (played, total) = progress(&days);
    HttpResponse::Ok().json(serde_json::json!({
        "match_day": next_match_day(&days),
        "played": played,
        "total": total,
    }))
}

/// Top players by kills.
#[get("/api/tournaments/{id}/leaderboard")]
async fn api_leaderboard(
    state: AppState,
    path: Path<TournamentPath>,
    query: Query<LeaderboardQuery>,
) -> HttpResponse {
    let teams = match state.store.list_teams(path.id).await {
        Ok(teams) => teams,
        Err(e) => return store_error_response(e),
    };
    let stats = match state.store.list_match_stats(path.id).await {
        Ok(stats) => stats,
        Err(e) => return store_error_response(e),
    };
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE);
    HttpResponse::Ok().json(player_leaderboard(&teams, &stats, limit))
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let store = Arc::new(MemoryStore::new());
    let state = Data::new(AppContext {
        machine: StageMachine::from_store(store.clone()),
        store,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            // Registered before /{id} so "active" is not parsed as an id.
            .service(api_active_tournament)
            .service(api_get_tournament)
            .service(api_add_team)
            .service(api_add_player)
            .service(api_create_match_day)
            .service(api_record_result)
            .service(api_record_stats)
            .service(api_standings)
            .service(api_standings_csv)
            .service(api_set_stage)
            .service(api_bracket)
            .service(api_semifinal_results)
            .service(api_next_match_day)
            .service(api_leaderboard)
    })
    .bind(bind)?
    .run()
    .await
}
