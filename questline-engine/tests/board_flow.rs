//! End-to-end board flows: select, link, boost, boss, claim.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use questline_engine::{
    BoardError, BossPhase, CompletionEvent, ManualClock, MemoryBoardStore, MissionBoardEngine,
    MissionCatalog, NoModeProvider, SelectionStatus, SlotKey,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

fn engine(clock: &ManualClock) -> MissionBoardEngine<MemoryBoardStore, NoModeProvider, ManualClock>
{
    MissionBoardEngine::new(
        MissionCatalog::load_from_static(),
        MemoryBoardStore::new(),
        NoModeProvider,
        clock.clone(),
        1337,
    )
}

fn event(date: &str, tasks: &[&str], base: i64, total: i64) -> CompletionEvent {
    CompletionEvent {
        date: date.parse::<NaiveDate>().unwrap(),
        completed_task_ids: tasks.iter().map(ToString::to_string).collect(),
        base_xp_delta: base,
        xp_total_today: total,
    }
}

/// Select the hunt proposal whose first objective target is 3 and link it
/// to the given daily task. Returns the committed mission id.
fn select_and_link(
    engine: &MissionBoardEngine<MemoryBoardStore, NoModeProvider, ManualClock>,
    user: &str,
    task: &str,
) -> String {
    let board = engine.board(user).unwrap();
    let proposal_id = board
        .slot(SlotKey::Hunt)
        .unwrap()
        .proposals
        .iter()
        .find(|p| p.template.objectives[0].target == 3)
        .expect("catalog carries a target-3 hunt mission")
        .id
        .clone();
    let board = engine
        .select_mission(user, SlotKey::Hunt, &proposal_id)
        .unwrap();
    let mission_id = board
        .slot(SlotKey::Hunt)
        .unwrap()
        .selected
        .as_ref()
        .unwrap()
        .mission
        .id
        .clone();
    engine
        .link_daily_to_hunt_mission(user, &mission_id, task)
        .unwrap();
    mission_id
}

#[test]
fn booster_scenario_applies_once_and_replays_unchanged() {
    let clock = ManualClock::new(t0());
    let engine = engine(&clock);
    select_and_link(&engine, "user-1", "T1");

    let shield_max = engine.board("user-1").unwrap().boss.shield.max;
    let submission = event("2024-01-01", &["T1"], 10, 40);

    let first = engine.apply_hunt_xp_boost("user-1", &submission).unwrap();
    assert!(first.booster_applied);
    assert!((first.multiplier - 1.5).abs() < f64::EPSILON);
    assert_eq!(first.xp_delta, 15, "bonus = round(10 * 0.5) = 5");
    assert_eq!(first.xp_total_today, 45);

    let board = engine.board("user-1").unwrap();
    let selection = board.slot(SlotKey::Hunt).unwrap().selected.as_ref().unwrap();
    assert_eq!(selection.progress.current, 1);
    assert_eq!(board.boss.shield.current, shield_max - 1);

    // Exact replay of the same submission (e.g. a retried HTTP request).
    let replay = engine.apply_hunt_xp_boost("user-1", &submission).unwrap();
    assert!(!replay.booster_applied);
    assert_eq!(replay.xp_delta, 10);
    assert_eq!(replay.xp_total_today, 40);

    let board = engine.board("user-1").unwrap();
    let selection = board.slot(SlotKey::Hunt).unwrap().selected.as_ref().unwrap();
    assert_eq!(selection.progress.current, 1, "no duplicate progress");
    assert_eq!(board.boss.shield.current, shield_max - 1);
}

#[test]
fn distinct_dates_deplete_shield_and_unlock_phase2_once() {
    let clock = ManualClock::new(t0());
    let engine = engine(&clock);
    let mission_id = select_and_link(&engine, "user-1", "T1");

    let shield_max = engine.board("user-1").unwrap().boss.shield.max;
    for day in 1..=shield_max {
        let board = engine.board("user-1").unwrap();
        assert!(
            board.boss.phase == BossPhase::Shielded || board.boss.shield.current == 0,
            "phase 2 never observed while the shield holds"
        );
        let date = format!("2024-01-{day:02}");
        let out = engine
            .apply_hunt_xp_boost("user-1", &event(&date, &["T1"], 10, 10))
            .unwrap();
        assert!(out.booster_applied);
        clock.advance(Duration::hours(6));
    }

    let board = engine.board("user-1").unwrap();
    assert_eq!(board.boss.shield.current, 0);
    assert_eq!(board.boss.phase, BossPhase::Exposed);
    assert!(board.boss.phase2.ready);

    let boss = engine
        .register_boss_phase2("user-1", &mission_id, "clip-001")
        .unwrap();
    assert_eq!(boss.phase2.proof.as_deref(), Some("clip-001"));
    let submitted_at = boss.phase2.submitted_at;

    // A repeat submission converges instead of erroring or re-stamping.
    let boss = engine
        .register_boss_phase2("user-1", &mission_id, "clip-002")
        .unwrap();
    assert_eq!(boss.phase2.proof.as_deref(), Some("clip-001"));
    assert_eq!(boss.phase2.submitted_at, submitted_at);
}

#[test]
fn phase2_rejected_while_shield_holds() {
    let clock = ManualClock::new(t0());
    let engine = engine(&clock);
    let mission_id = select_and_link(&engine, "user-1", "T1");

    let err = engine
        .register_boss_phase2("user-1", &mission_id, "too-early")
        .unwrap_err();
    assert!(matches!(err, BoardError::BossNotReady { .. }));

    let err = engine
        .register_boss_phase2("user-1", "wrong-mission", "proof")
        .unwrap_err();
    assert!(matches!(err, BoardError::MissionMismatch { .. }));
}

#[test]
fn completed_mission_claims_exactly_once() {
    let clock = ManualClock::new(t0());
    let engine = engine(&clock);
    let mission_id = select_and_link(&engine, "user-1", "T1");

    let err = engine
        .claim_mission_reward("user-1", &mission_id)
        .unwrap_err();
    assert!(matches!(
        err,
        BoardError::ClaimNotReady {
            status: SelectionStatus::Active,
            ..
        }
    ));

    for day in 1..=3 {
        let date = format!("2024-01-{day:02}");
        engine
            .apply_hunt_xp_boost("user-1", &event(&date, &["T1"], 10, 10))
            .unwrap();
    }
    let board = engine.board("user-1").unwrap();
    let selection = board.slot(SlotKey::Hunt).unwrap().selected.as_ref().unwrap();
    assert_eq!(selection.status, SelectionStatus::Completed);

    let claimed = engine.claim_mission_reward("user-1", &mission_id).unwrap();
    assert_eq!(claimed.status, SelectionStatus::Claimed);
    let receipt = claimed.claim.as_ref().unwrap();
    assert_eq!(receipt.reward, claimed.mission.template.reward);
    let claimed_at = receipt.claimed_at;

    clock.advance(Duration::hours(3));
    let again = engine.claim_mission_reward("user-1", &mission_id).unwrap();
    assert_eq!(
        again.claim.as_ref().unwrap().claimed_at,
        claimed_at,
        "repeat claims return the original receipt"
    );

    let err = engine
        .claim_mission_reward("user-1", "ghost-mission")
        .unwrap_err();
    assert!(matches!(err, BoardError::MissionNotActive { .. }));
}

#[test]
fn maintenance_recycles_only_a_defeated_boss() {
    let clock = ManualClock::new(t0());
    let engine = engine(&clock);
    let mission_id = select_and_link(&engine, "user-1", "T1");

    // Not defeated yet: maintenance leaves the encounter alone.
    let before = engine.board("user-1").unwrap();
    let after = engine.run_fortnightly_boss_maintenance("user-1").unwrap();
    assert_eq!(after.boss, before.boss);

    let shield_max = before.boss.shield.max;
    for day in 1..=shield_max {
        let date = format!("2024-01-{day:02}");
        engine
            .apply_hunt_xp_boost("user-1", &event(&date, &["T1"], 10, 10))
            .unwrap();
    }
    engine
        .register_boss_phase2("user-1", &mission_id, "clip-001")
        .unwrap();

    let hunt_proposals_before: Vec<String> = engine
        .board("user-1")
        .unwrap()
        .slot(SlotKey::Hunt)
        .unwrap()
        .proposals
        .iter()
        .map(|p| p.id.clone())
        .collect();

    let after = engine.run_fortnightly_boss_maintenance("user-1").unwrap();
    assert_eq!(after.boss.phase, BossPhase::Shielded);
    assert_eq!(after.boss.shield.current, shield_max);
    assert!(after.boss.linked_daily_task_id.is_none());
    assert!(after.boss.phase2.proof.is_none());
    let hunt_proposals_after: Vec<String> = after
        .slot(SlotKey::Hunt)
        .unwrap()
        .proposals
        .iter()
        .map(|p| p.id.clone())
        .collect();
    assert_ne!(hunt_proposals_after, hunt_proposals_before);
}

#[test]
fn relinking_restarts_the_encounter() {
    let clock = ManualClock::new(t0());
    let engine = engine(&clock);
    let mission_id = select_and_link(&engine, "user-1", "T1");

    engine
        .apply_hunt_xp_boost("user-1", &event("2024-01-01", &["T1"], 10, 10))
        .unwrap();
    let board = engine.board("user-1").unwrap();
    assert!(board.boss.shield.current < board.boss.shield.max);

    let board = engine
        .link_daily_to_hunt_mission("user-1", &mission_id, "T2")
        .unwrap();
    assert_eq!(board.boss.shield.current, board.boss.shield.max);
    assert_eq!(board.boss.linked_daily_task_id.as_deref(), Some("T2"));
    assert_eq!(board.boss.phase, BossPhase::Shielded);
    assert!(!board.boss.phase2.ready);
}

#[test]
fn selecting_an_unknown_proposal_reports_slot_context() {
    let clock = ManualClock::new(t0());
    let engine = engine(&clock);
    engine.board("user-1").unwrap();

    let err = engine
        .select_mission("user-1", SlotKey::Skill, "not-a-proposal")
        .unwrap_err();
    match err {
        BoardError::MissionNotFound {
            user_id,
            slot,
            mission_id,
        } => {
            assert_eq!(user_id, "user-1");
            assert_eq!(slot, SlotKey::Skill);
            assert_eq!(mission_id, "not-a-proposal");
        }
        other => panic!("expected MissionNotFound, got {other:?}"),
    }
}
