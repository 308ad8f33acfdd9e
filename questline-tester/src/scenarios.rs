//! Deterministic logic scenarios exercising the mission board engine.
use anyhow::{Result, bail, ensure};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use questline_engine::{
    BoardError, BossPhase, CompletionEvent, GameModeCode, ManualClock, MemoryBoardStore,
    MissionBoardEngine, MissionCatalog, SelectionStatus, SlotKey, StaticModeProvider,
};

pub type TesterEngine = MissionBoardEngine<MemoryBoardStore, StaticModeProvider, ManualClock>;

/// Fresh engine, clock, and RNG for one scenario iteration.
pub struct ScenarioCtx {
    pub engine: TesterEngine,
    pub clock: ManualClock,
    pub rng: SmallRng,
    pub user_id: String,
}

impl ScenarioCtx {
    pub fn new(seed: u64, mode: Option<GameModeCode>) -> Self {
        let user_id = format!("tester-{seed:08x}");
        let modes = match mode {
            Some(mode) => StaticModeProvider::default().with_mode(&user_id, mode),
            None => StaticModeProvider::default(),
        };
        let clock = ManualClock::new(start_instant());
        let engine = MissionBoardEngine::new(
            MissionCatalog::load_from_static(),
            MemoryBoardStore::new(),
            modes,
            clock.clone(),
            seed,
        );
        Self {
            engine,
            clock,
            rng: SmallRng::seed_from_u64(seed),
            user_id,
        }
    }

    fn event(&self, day: i64, tasks: &[&str], base: i64, total: i64) -> CompletionEvent {
        CompletionEvent {
            date: start_date() + Duration::days(day),
            completed_task_ids: tasks.iter().map(ToString::to_string).collect(),
            base_xp_delta: base,
            xp_total_today: total,
        }
    }

    /// Select the first hunt proposal and link it to `task`, returning the
    /// committed mission id.
    fn select_and_link_hunt(&self, task: &str) -> Result<String> {
        let board = self.engine.board(&self.user_id)?;
        let proposal_id = board
            .slot(SlotKey::Hunt)
            .and_then(|slot| slot.proposals.first())
            .map(|p| p.id.clone());
        let Some(proposal_id) = proposal_id else {
            bail!("hunt slot offered no proposals");
        };
        let board = self
            .engine
            .select_mission(&self.user_id, SlotKey::Hunt, &proposal_id)?;
        let mission_id = board
            .slot(SlotKey::Hunt)
            .and_then(|slot| slot.selected.as_ref())
            .map(|sel| sel.mission.id.clone());
        let Some(mission_id) = mission_id else {
            bail!("hunt selection missing after select");
        };
        self.engine
            .link_daily_to_hunt_mission(&self.user_id, &mission_id, task)?;
        Ok(mission_id)
    }
}

fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

pub struct Scenario {
    pub name: &'static str,
    pub summary: &'static str,
    pub mode: Option<GameModeCode>,
    pub run: fn(&mut ScenarioCtx) -> Result<()>,
}

pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "booster-idempotency",
            summary: "Replayed submissions never double-apply the XP booster",
            mode: None,
            run: booster_idempotency,
        },
        Scenario {
            name: "reroll-window",
            summary: "Reroll quota exhausts and reopens after seven days",
            mode: None,
            run: reroll_window,
        },
        Scenario {
            name: "boss-cycle",
            summary: "Shield depletion, phase-2 proof, and fortnightly recycling",
            mode: None,
            run: boss_cycle,
        },
        Scenario {
            name: "weekly-autofill",
            summary: "Weekly sweep fills empty slots per game-mode policy",
            mode: Some(GameModeCode::Evolve),
            run: weekly_autofill,
        },
        Scenario {
            name: "claim-flow",
            summary: "Claims require completion and stamp the receipt once",
            mode: None,
            run: claim_flow,
        },
    ]
}

pub fn scenarios_by_names(names: &[String]) -> Vec<Scenario> {
    if names.iter().any(|n| n.eq_ignore_ascii_case("all")) {
        return all_scenarios();
    }
    all_scenarios()
        .into_iter()
        .filter(|s| {
            names
                .iter()
                .any(|name| s.name.contains(&name.to_lowercase()))
        })
        .collect()
}

fn booster_idempotency(ctx: &mut ScenarioCtx) -> Result<()> {
    ctx.select_and_link_hunt("task-a")?;
    let base: i64 = ctx.rng.gen_range(0..50);
    let total: i64 = base + ctx.rng.gen_range(0..100);
    let submission = ctx.event(0, &["task-a"], base, total);

    let first = ctx.engine.apply_hunt_xp_boost(&ctx.user_id, &submission)?;
    ensure!(first.booster_applied, "first application must boost");
    ensure!(
        first.xp_delta > base,
        "boosted delta {} must exceed base {base}",
        first.xp_delta
    );
    let bonus = first.xp_delta - base;
    ensure!(
        first.xp_total_today == total + bonus,
        "total must grow by the same bonus"
    );

    for _ in 0..3 {
        let replay = ctx.engine.apply_hunt_xp_boost(&ctx.user_id, &submission)?;
        ensure!(!replay.booster_applied, "replay must not re-apply");
        ensure!(
            replay.xp_delta == base && replay.xp_total_today == total,
            "replay must pass inputs through unchanged"
        );
    }

    let board = ctx.engine.board(&ctx.user_id)?;
    let progress = board
        .slot(SlotKey::Hunt)
        .and_then(|s| s.selected.as_ref())
        .map(|sel| sel.progress.current);
    ensure!(progress == Some(1), "exactly one progress step recorded");
    Ok(())
}

fn reroll_window(ctx: &mut ScenarioCtx) -> Result<()> {
    let slot = ctx.engine.reroll(&ctx.user_id, SlotKey::Main)?;
    ensure!(slot.reroll.remaining == 0, "quota spent after reroll");

    ctx.clock.advance(Duration::days(3));
    match ctx.engine.reroll(&ctx.user_id, SlotKey::Main) {
        Err(BoardError::RerollExhausted { .. }) => {}
        Err(other) => bail!("expected RerollExhausted, got {other}"),
        Ok(_) => bail!("reroll inside the cooldown must fail"),
    }

    ctx.clock.advance(Duration::days(4));
    let slot = ctx.engine.reroll(&ctx.user_id, SlotKey::Main)?;
    ensure!(
        slot.reroll.remaining == 0,
        "restored quota spent by the second reroll"
    );
    Ok(())
}

fn boss_cycle(ctx: &mut ScenarioCtx) -> Result<()> {
    let mission_id = ctx.select_and_link_hunt("task-b")?;

    let board = ctx.engine.board(&ctx.user_id)?;
    let shield_max = board.boss.shield.max;
    for day in 0..i64::from(shield_max) {
        let board = ctx.engine.board(&ctx.user_id)?;
        if board.boss.phase == BossPhase::Exposed && board.boss.shield.current > 0 {
            bail!("phase 2 observed while the shield holds");
        }
        let out = ctx
            .engine
            .apply_hunt_xp_boost(&ctx.user_id, &ctx.event(day, &["task-b"], 10, 10))?;
        ensure!(out.booster_applied, "distinct-date boost on day {day}");
        ctx.clock.advance(Duration::hours(12));
    }

    let board = ctx.engine.board(&ctx.user_id)?;
    ensure!(board.boss.shield.current == 0, "shield depleted");
    ensure!(board.boss.phase2.ready, "phase 2 unlocked at zero shield");

    let boss = ctx
        .engine
        .register_boss_phase2(&ctx.user_id, &mission_id, "proof")?;
    let submitted_at = boss.phase2.submitted_at;
    let boss = ctx
        .engine
        .register_boss_phase2(&ctx.user_id, &mission_id, "late-proof")?;
    ensure!(
        boss.phase2.proof.as_deref() == Some("proof"),
        "proof never re-stamped"
    );
    ensure!(boss.phase2.submitted_at == submitted_at, "timestamp stable");

    let after = ctx.engine.run_fortnightly_boss_maintenance(&ctx.user_id)?;
    ensure!(
        after.boss.phase == BossPhase::Shielded
            && after.boss.shield.current == after.boss.shield.max,
        "maintenance recycles the defeated boss"
    );
    ensure!(
        after.boss.linked_daily_task_id.is_none(),
        "maintenance clears the link"
    );
    Ok(())
}

fn weekly_autofill(ctx: &mut ScenarioCtx) -> Result<()> {
    let snapshot = ctx.engine.run_weekly_auto_selection(&ctx.user_id)?;
    for slot in SlotKey::ALL {
        let selected = snapshot.slot(slot).and_then(|s| s.selected.as_ref());
        ensure!(selected.is_some(), "{slot} slot auto-filled");
    }
    let hunt = snapshot
        .slot(SlotKey::Hunt)
        .and_then(|s| s.selected.as_ref());
    ensure!(
        hunt.map(|sel| sel.progress.target) == Some(4),
        "EVOLVE overrides the hunt target to its tier"
    );

    let repeat = ctx.engine.run_weekly_auto_selection(&ctx.user_id)?;
    ensure!(repeat == snapshot, "repeated sweep is a no-op");
    Ok(())
}

fn claim_flow(ctx: &mut ScenarioCtx) -> Result<()> {
    let mission_id = ctx.select_and_link_hunt("task-c")?;

    match ctx.engine.claim_mission_reward(&ctx.user_id, &mission_id) {
        Err(BoardError::ClaimNotReady { .. }) => {}
        Err(other) => bail!("expected ClaimNotReady, got {other}"),
        Ok(_) => bail!("active mission must not be claimable"),
    }

    let board = ctx.engine.board(&ctx.user_id)?;
    let target = board
        .slot(SlotKey::Hunt)
        .and_then(|s| s.selected.as_ref())
        .map_or(0, |sel| sel.progress.target);
    for day in 0..i64::from(target) {
        ctx.engine
            .apply_hunt_xp_boost(&ctx.user_id, &ctx.event(day, &["task-c"], 10, 10))?;
    }

    let claimed = ctx.engine.claim_mission_reward(&ctx.user_id, &mission_id)?;
    ensure!(
        claimed.status == SelectionStatus::Claimed,
        "claim transitions to claimed"
    );
    let Some(receipt) = claimed.claim else {
        bail!("claim receipt missing");
    };

    ctx.clock.advance(Duration::hours(1));
    let again = ctx.engine.claim_mission_reward(&ctx.user_id, &mission_id)?;
    ensure!(
        again.claim.map(|c| c.claimed_at) == Some(receipt.claimed_at),
        "repeat claim keeps the original receipt"
    );
    Ok(())
}
