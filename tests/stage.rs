//! Integration tests for stage progression against the in-memory store.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use team_tournament_web::{
    MatchDay, MatchDayFactory, MatchDayId, MatchResult, MatchResultStore, MemoryStore,
    SemifinalSlot, StageMachine, StageTag, StoreError, Team, TeamId, TournamentError,
    TournamentId, TournamentStage, TournamentStore,
};

struct Setup {
    store: Arc<MemoryStore>,
    machine: StageMachine,
    id: TournamentId,
    teams: Vec<Team>,
}

/// Four teams, full round robin: standings end up D, A, C, B.
fn group_stage_played() -> Setup {
    let store = Arc::new(MemoryStore::new());
    let t = store.create_tournament("Copa").unwrap();
    let teams: Vec<Team> = ["A", "B", "C", "D"]
        .iter()
        .map(|n| store.add_team(t.id, *n).unwrap())
        .collect();
    let (a, b, c, d) = (teams[0].id, teams[1].id, teams[2].id, teams[3].id);
    let day = store
        .create_match_day(t.id, "Fecha 1", &[(a, b), (a, c), (a, d), (b, c), (b, d), (c, d)])
        .unwrap();
    let scores = [(16, 10), (16, 14), (13, 16), (16, 9), (11, 16), (16, 15)];
    for (m, (x, y)) in day.matches.iter().zip(scores) {
        store.record_result(t.id, m.id, MatchResult::new(x, y), None).unwrap();
    }
    Setup {
        machine: StageMachine::from_store(store.clone()),
        store,
        id: t.id,
        teams,
    }
}

fn only_match(day: &MatchDay) -> (TeamId, TeamId) {
    assert_eq!(day.matches.len(), 1);
    let m = &day.matches[0];
    assert!(m.result.is_none());
    (m.team_a, m.team_b)
}

async fn knockout_days(store: &MemoryStore, id: TournamentId) -> Vec<MatchDay> {
    store
        .list_match_days(id)
        .await
        .unwrap()
        .into_iter()
        .filter(|d| d.stage.is_knockout())
        .collect()
}

/// Fails the n-th `create` call, delegates everything else.
struct FlakyFactory {
    inner: Arc<MemoryStore>,
    fail_on: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl MatchDayFactory for FlakyFactory {
    async fn create(
        &self,
        tournament_id: TournamentId,
        stage: StageTag,
        team_a: TeamId,
        team_b: TeamId,
    ) -> Result<MatchDayId, StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner.create(tournament_id, stage, team_a, team_b).await
    }

    async fn find_by_stage(
        &self,
        tournament_id: TournamentId,
        stage: StageTag,
    ) -> Result<Option<MatchDay>, StoreError> {
        self.inner.find_by_stage(tournament_id, stage).await
    }
}

#[tokio::test]
async fn semifinals_are_seeded_from_standings() {
    let s = group_stage_played();
    let (a, b, c, d) = (s.teams[0].id, s.teams[1].id, s.teams[2].id, s.teams[3].id);

    let advance = s.machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap();

    assert!(!advance.already_advanced);
    assert_eq!(advance.tournament.stage, TournamentStage::Semifinals);
    assert_eq!(advance.bracket.len(), 2);
    assert_eq!(advance.bracket[0].stage, StageTag::Semifinal(SemifinalSlot::First));
    assert_eq!(advance.bracket[0].name, "Semifinal 1");
    assert_eq!(only_match(&advance.bracket[0]), (d, b));
    assert_eq!(advance.bracket[1].stage, StageTag::Semifinal(SemifinalSlot::Second));
    assert_eq!(advance.bracket[1].name, "Semifinal 2");
    assert_eq!(only_match(&advance.bracket[1]), (a, c));

    let stored = s.store.get(s.id).await.unwrap().unwrap();
    assert_eq!(stored.stage, TournamentStage::Semifinals);
}

#[tokio::test]
async fn advancing_twice_does_not_duplicate_semifinals() {
    let s = group_stage_played();

    let first = s.machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap();
    let second = s.machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap();

    assert!(!first.already_advanced);
    assert!(second.already_advanced);
    assert_eq!(first.bracket, second.bracket);
    assert_eq!(knockout_days(&s.store, s.id).await.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_advances_create_one_bracket() {
    let s = group_stage_played();
    let machine = Arc::new(s.machine);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let machine = machine.clone();
            let id = s.id;
            tokio::spawn(async move { machine.advance_stage(id, TournamentStage::Semifinals).await })
        })
        .collect();
    let mut created = 0;
    for h in handles {
        let advance = h.await.unwrap().unwrap();
        if !advance.already_advanced {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(knockout_days(&s.store, s.id).await.len(), 2);
}

#[tokio::test]
async fn interrupted_semifinal_creation_is_completed_on_retry() {
    let s = group_stage_played();
    let (a, c) = (s.teams[0].id, s.teams[2].id);
    let flaky = Arc::new(FlakyFactory {
        inner: s.store.clone(),
        fail_on: 2,
        calls: AtomicUsize::new(0),
    });
    let machine = StageMachine::new(s.store.clone(), flaky, s.store.clone());

    let err = machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap_err();
    assert!(matches!(err, TournamentError::Persistence(StoreError::Backend(_))));
    assert_eq!(knockout_days(&s.store, s.id).await.len(), 1);
    let stored = s.store.get(s.id).await.unwrap().unwrap();
    assert_eq!(stored.stage, TournamentStage::GroupStage);

    let advance = machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap();

    assert!(!advance.already_advanced);
    assert_eq!(advance.tournament.stage, TournamentStage::Semifinals);
    assert_eq!(knockout_days(&s.store, s.id).await.len(), 2);
    assert_eq!(only_match(&advance.bracket[1]), (a, c));
}

#[tokio::test]
async fn final_pairs_semifinal_winners_and_losers() {
    let s = group_stage_played();
    let (a, b, c, d) = (s.teams[0].id, s.teams[1].id, s.teams[2].id, s.teams[3].id);
    let semis = s.machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap();
    // D 16-10 B, A 9-16 C
    let sf1 = semis.bracket[0].matches[0].id;
    let sf2 = semis.bracket[1].matches[0].id;
    s.store.record_result(s.id, sf1, MatchResult::new(16, 10), Some("Mirage".into())).unwrap();
    s.store.record_result(s.id, sf2, MatchResult::new(9, 16), None).unwrap();

    let advance = s.machine.advance_stage(s.id, TournamentStage::Final).await.unwrap();

    assert_eq!(advance.tournament.stage, TournamentStage::Final);
    assert_eq!(advance.bracket.len(), 2);
    assert_eq!(advance.bracket[0].stage, StageTag::ThirdPlace);
    assert_eq!(advance.bracket[0].name, "Tercer y Cuarto Puesto");
    assert_eq!(only_match(&advance.bracket[0]), (b, a));
    assert_eq!(advance.bracket[1].stage, StageTag::Final);
    assert_eq!(advance.bracket[1].name, "Partido Final");
    assert_eq!(only_match(&advance.bracket[1]), (d, c));

    let bracket = s.machine.bracket(s.id).await.unwrap();
    assert_eq!(bracket.len(), 4);

    // Knockout results never touch the group table.
    let standings = s.machine.standings(s.id).await.unwrap();
    let d_row = standings.iter().find(|r| r.team_id == d).unwrap();
    assert_eq!((d_row.wins, d_row.points), (2, 7));
}

/// Semifinals created and decided: D 16-10 B, A 9-16 C.
async fn semifinals_played(machine: &StageMachine, s: &Setup) {
    let semis = machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap();
    let sf1 = semis.bracket[0].matches[0].id;
    let sf2 = semis.bracket[1].matches[0].id;
    s.store.record_result(s.id, sf1, MatchResult::new(16, 10), None).unwrap();
    s.store.record_result(s.id, sf2, MatchResult::new(9, 16), None).unwrap();
}

#[tokio::test]
async fn advancing_to_final_twice_does_not_duplicate_it() {
    let s = group_stage_played();
    semifinals_played(&s.machine, &s).await;

    let first = s.machine.advance_stage(s.id, TournamentStage::Final).await.unwrap();
    let second = s.machine.advance_stage(s.id, TournamentStage::Final).await.unwrap();

    assert!(!first.already_advanced);
    assert!(second.already_advanced);
    assert_eq!(first.bracket, second.bracket);
    assert_eq!(second.tournament.stage, TournamentStage::Final);
    assert_eq!(knockout_days(&s.store, s.id).await.len(), 4);
}

#[tokio::test]
async fn interrupted_final_creation_is_completed_on_retry() {
    let s = group_stage_played();
    let (a, b, c, d) = (s.teams[0].id, s.teams[1].id, s.teams[2].id, s.teams[3].id);
    // Calls 1 and 2 create the semifinals, 3 the third place match, 4 fails.
    let flaky = Arc::new(FlakyFactory {
        inner: s.store.clone(),
        fail_on: 4,
        calls: AtomicUsize::new(0),
    });
    let machine = StageMachine::new(s.store.clone(), flaky, s.store.clone());
    semifinals_played(&machine, &s).await;

    let err = machine.advance_stage(s.id, TournamentStage::Final).await.unwrap_err();
    assert!(matches!(err, TournamentError::Persistence(StoreError::Backend(_))));
    assert_eq!(knockout_days(&s.store, s.id).await.len(), 3);
    let stored = s.store.get(s.id).await.unwrap().unwrap();
    assert_eq!(stored.stage, TournamentStage::Semifinals);

    let advance = machine.advance_stage(s.id, TournamentStage::Final).await.unwrap();

    assert!(!advance.already_advanced);
    assert_eq!(advance.tournament.stage, TournamentStage::Final);
    assert_eq!(knockout_days(&s.store, s.id).await.len(), 4);
    assert_eq!(only_match(&advance.bracket[0]), (b, a));
    assert_eq!(only_match(&advance.bracket[1]), (d, c));
}

#[tokio::test]
async fn retry_refuses_to_mix_a_stale_semifinal_with_a_new_draw() {
    let s = group_stage_played();
    let (a, b, c, d) = (s.teams[0].id, s.teams[1].id, s.teams[2].id, s.teams[3].id);
    let flaky = Arc::new(FlakyFactory {
        inner: s.store.clone(),
        fail_on: 2,
        calls: AtomicUsize::new(0),
    });
    let machine = StageMachine::new(s.store.clone(), flaky, s.store.clone());
    machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap_err();
    let semis = knockout_days(&s.store, s.id).await;
    assert_eq!(only_match(&semis[0]), (d, b));

    // B now beats D 16-11: table becomes A, B, C, D and semifinal 1 would be A v D.
    let b_v_d = s
        .store
        .list_matches(s.id)
        .await
        .unwrap()
        .into_iter()
        .find(|m| m.team_a == b && m.team_b == d)
        .unwrap();
    s.store.record_result(s.id, b_v_d.id, MatchResult::new(16, 11), None).unwrap();

    let err = machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap_err();

    assert!(matches!(
        err,
        TournamentError::BracketConflict {
            stage: StageTag::Semifinal(SemifinalSlot::First)
        }
    ));
    assert_eq!(knockout_days(&s.store, s.id).await.len(), 1);
    let stored = s.store.get(s.id).await.unwrap().unwrap();
    assert_eq!(stored.stage, TournamentStage::GroupStage);

    // Restoring the result makes the retry consistent again.
    s.store.record_result(s.id, b_v_d.id, MatchResult::new(11, 16), None).unwrap();
    let advance = machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap();
    assert_eq!(only_match(&advance.bracket[0]), (d, b));
    assert_eq!(only_match(&advance.bracket[1]), (a, c));
}

#[tokio::test]
async fn final_requires_decided_semifinals() {
    let s = group_stage_played();
    s.machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap();
    let semis = s.machine.semifinal_results(s.id).await.unwrap();
    s.store.record_result(s.id, semis[0].id, MatchResult::new(16, 4), None).unwrap();

    let err = s.machine.advance_stage(s.id, TournamentStage::Final).await.unwrap_err();

    assert!(matches!(err, TournamentError::SemifinalsIncomplete));
    let stored = s.store.get(s.id).await.unwrap().unwrap();
    assert_eq!(stored.stage, TournamentStage::Semifinals);
    assert_eq!(knockout_days(&s.store, s.id).await.len(), 2);
}

#[tokio::test]
async fn final_straight_from_group_stage_has_no_semifinals() {
    let s = group_stage_played();
    let err = s.machine.advance_stage(s.id, TournamentStage::Final).await.unwrap_err();
    assert!(matches!(err, TournamentError::SemifinalsIncomplete));
}

#[tokio::test]
async fn semifinals_need_four_teams() {
    let store = Arc::new(MemoryStore::new());
    let t = store.create_tournament("Small").unwrap();
    for n in ["A", "B", "C"] {
        store.add_team(t.id, n).unwrap();
    }
    let machine = StageMachine::from_store(store.clone());

    let err = machine.advance_stage(t.id, TournamentStage::Semifinals).await.unwrap_err();

    assert!(matches!(
        err,
        TournamentError::InsufficientTeams {
            required: 4,
            available: 3
        }
    ));
    assert!(knockout_days(&store, t.id).await.is_empty());
    let stored = store.get(t.id).await.unwrap().unwrap();
    assert_eq!(stored.stage, TournamentStage::GroupStage);
}

#[tokio::test]
async fn other_stages_are_plain_status_edits() {
    let s = group_stage_played();

    let third = s.machine.advance_stage(s.id, TournamentStage::ThirdPlace).await.unwrap();
    assert_eq!(third.tournament.stage, TournamentStage::ThirdPlace);
    assert!(third.bracket.is_empty());

    let done = s.machine.advance_stage(s.id, TournamentStage::Completed).await.unwrap();
    assert_eq!(done.tournament.stage, TournamentStage::Completed);
    assert!(done.bracket.is_empty());
    assert!(knockout_days(&s.store, s.id).await.is_empty());
}

#[tokio::test]
async fn stage_never_moves_backwards() {
    let s = group_stage_played();
    s.machine.advance_stage(s.id, TournamentStage::Semifinals).await.unwrap();

    let err = s.machine.advance_stage(s.id, TournamentStage::GroupStage).await.unwrap_err();

    assert!(matches!(
        err,
        TournamentError::InvalidStageTransition {
            from: TournamentStage::Semifinals,
            to: TournamentStage::GroupStage
        }
    ));
}

#[tokio::test]
async fn unknown_tournament_is_reported() {
    let s = group_stage_played();
    let missing = uuid::Uuid::new_v4();

    let err = s.machine.advance_stage(missing, TournamentStage::Semifinals).await.unwrap_err();
    assert_eq!(err.to_string(), format!("Tournament {missing} not found"));
    assert!(matches!(err, TournamentError::TournamentNotFound(id) if id == missing));
    assert!(matches!(
        s.machine.standings(missing).await,
        Err(TournamentError::TournamentNotFound(_))
    ));
}

#[tokio::test]
async fn active_tournament_is_latest_active_one() {
    let store = Arc::new(MemoryStore::new());
    let machine = StageMachine::from_store(store.clone());
    assert!(matches!(
        machine.active_tournament().await,
        Err(TournamentError::NoActiveTournament)
    ));

    let first = store.create_tournament("2025").unwrap();
    let second = store.create_tournament("2026").unwrap();
    assert_eq!(machine.active_tournament().await.unwrap().id, second.id);

    store.set_active(second.id, false).unwrap();
    assert_eq!(machine.active_tournament().await.unwrap().id, first.id);
}
