//! Tests for the match engine, scoreboard, scheduler, win evaluation,
//! arena and worker.

use std::sync::{Arc, Mutex};

use glam::Vec3;
use proptest::prelude::*;

use warfront_core::effects::{Broadcast, Effect, Notice, RewardGrant};
use warfront_core::enums::*;
use warfront_core::interactions::Interaction;
use warfront_core::state::RoundView;
use warfront_core::topology::*;
use warfront_core::types::{ObjectiveId, PerTeam, Team};

use crate::arena::{Arena, ArenaError};
use crate::engine::{MatchEngine, MatchOptions};
use crate::scoreboard::ScoreBoard;
use crate::sink::EffectSink;
use crate::victory::{self, WinInputs};
use crate::worker::spawn_match_worker;

const WINDOW: u64 = 1_000;

fn def(id: u16, kind: ObjectiveKind, initial: Holder) -> ObjectiveDef {
    ObjectiveDef {
        id: ObjectiveId(id),
        key: format!("test.{id}"),
        kind,
        initial,
        capture: CaptureMode::Timed,
        capture_ms: Some(WINDOW),
        home: None,
        world_state: None,
        position: Vec3::ZERO,
        requires_destroyed: Vec::new(),
        destroy_penalty: 0,
        reward: RewardTable::default(),
        yields: None,
    }
}

fn scoring(mode: ScoreMode) -> ScoringRules {
    ScoringRules {
        mode,
        near_threshold: None,
        resource_ticks: None,
        flags: FlagRules::default(),
        kills: KillRules::default(),
    }
}

/// Topology with no warmup, so a zero tick opens the doors.
fn topology(objectives: Vec<ObjectiveDef>, mode: ScoreMode) -> Topology {
    Topology {
        map: "test".into(),
        objectives,
        pairs: Vec::new(),
        scoring: scoring(mode),
        schedule: ScheduleRules {
            warmup_ms: 0,
            announce_at_ms: Vec::new(),
            time_limit_ms: None,
            relay: None,
        },
        rewards: RewardRules::default(),
        win: WinRules::default(),
    }
}

fn ticks(intervals_ms: Vec<u64>, points: Vec<u32>) -> Option<ResourceTicks> {
    Some(ResourceTicks {
        counted: vec![ObjectiveKind::Grave],
        intervals_ms,
        points,
    })
}

fn relay_topology(first_attackers: AttackerPick) -> Topology {
    let gate = def(0, ObjectiveKind::Gate, Holder::Defenders);
    let mut relic = def(1, ObjectiveKind::RelicPoint, Holder::Defenders);
    relic.requires_destroyed.push(ObjectiveId(0));
    let mut topo = topology(vec![gate, relic], ScoreMode::Unscored);
    topo.schedule.relay = Some(RelayRules {
        round_ms: 600_000,
        intermission_ms: 60_000,
        first_attackers,
    });
    topo.win.hold_all = Some(ObjectiveKind::RelicPoint);
    topo
}

fn started(topology: Topology) -> MatchEngine {
    let mut engine = MatchEngine::new(topology, MatchOptions::default()).unwrap();
    engine.tick(0);
    assert!(engine.phase().is_live());
    engine
}

fn use_on(id: u16, team: Team) -> Interaction {
    Interaction::Use {
        objective: ObjectiveId(id),
        team,
    }
}

fn has_notice(effects: &[Effect], notice: Notice) -> bool {
    effects
        .iter()
        .any(|e| matches!(e, Effect::Broadcast(b) if b.notice == notice))
}

fn ended_with(effects: &[Effect]) -> Option<MatchResult> {
    effects.iter().find_map(|e| match e {
        Effect::MatchEnded { result } => Some(*result),
        _ => None,
    })
}

// ---- Warmup ----

#[test]
fn test_warmup_announcements_then_doors_open() {
    let mut topo = topology(
        vec![def(0, ObjectiveKind::Grave, Holder::Neutral)],
        ScoreMode::Race { max_score: 10 },
    );
    topo.schedule = ScheduleRules::default();
    let mut engine = MatchEngine::new(topo, MatchOptions::default()).unwrap();
    assert_eq!(engine.phase(), MatchPhase::Warmup);

    // Doors closed: interactions are ignored.
    assert!(engine.handle_interaction(&use_on(0, Team::A)).is_empty());

    assert_eq!(
        engine.tick(60_000),
        vec![Effect::Broadcast(Broadcast::match_wide(Notice::StartingIn {
            secs: 60
        }))]
    );
    assert_eq!(
        engine.tick(30_000),
        vec![Effect::Broadcast(Broadcast::match_wide(Notice::StartingIn {
            secs: 30
        }))]
    );
    assert_eq!(
        engine.tick(30_000),
        vec![
            Effect::PhaseChanged {
                phase: MatchPhase::RoundInProgress
            },
            Effect::DoorsOpened,
            Effect::Broadcast(Broadcast::match_wide(Notice::BattleBegun)),
        ]
    );
    assert!(!engine.handle_interaction(&use_on(0, Team::A)).is_empty());
}

#[test]
fn test_single_large_tick_crosses_warmup() {
    let mut topo = topology(
        vec![def(0, ObjectiveKind::Grave, Holder::TeamA)],
        ScoreMode::Race { max_score: 100 },
    );
    topo.schedule = ScheduleRules::default();
    topo.scoring.resource_ticks = ticks(vec![0, 1_000], vec![0, 1]);
    let mut engine = MatchEngine::new(topo, MatchOptions::default()).unwrap();

    let effects = engine.tick(125_000);
    assert!(has_notice(&effects, Notice::StartingIn { secs: 60 }));
    assert!(has_notice(&effects, Notice::StartingIn { secs: 30 }));
    assert!(effects.contains(&Effect::DoorsOpened));
    // Only the 5 s after the doors opened earn resources.
    assert_eq!(engine.score(Team::A), 5);
}

// ---- Scoring ----

#[test]
fn test_tick_reaching_max_score_wins_and_locks_board() {
    let mut topo = topology(
        vec![def(0, ObjectiveKind::Grave, Holder::TeamA)],
        ScoreMode::Race { max_score: 3 },
    );
    topo.scoring.resource_ticks = ticks(vec![0, 1_000], vec![0, 1]);
    let mut engine = started(topo);

    engine.tick(2_000);
    assert_eq!(engine.score(Team::A), 2);
    assert_eq!(engine.result(), None);

    let effects = engine.tick(1_000);
    assert!(effects.contains(&Effect::ScoreChanged {
        team: Team::A,
        score: 3
    }));
    assert_eq!(ended_with(&effects), Some(MatchResult::Victory(Team::A)));
    assert_eq!(engine.winner(), Some(Team::A));
    assert_eq!(engine.phase(), MatchPhase::Ended);

    let inputs = WinInputs {
        scores: engine.scoreboard(),
        holds_all: None,
        time_up: false,
        last_capture: None,
    };
    assert_eq!(
        victory::evaluate_win_condition(&inputs),
        Some(MatchResult::Victory(Team::A))
    );

    // Nothing mutates the board any more.
    assert!(engine.tick(10_000).is_empty());
    assert!(engine.handle_interaction(&use_on(0, Team::B)).is_empty());
    assert!(engine.scoreboard_mut().add_points(Team::A, -2).is_empty());
    assert!(engine.scoreboard_mut().add_points(Team::B, 2).is_empty());
    assert_eq!(engine.score(Team::A), 3);
    assert_eq!(engine.score(Team::B), 0);
}

#[test]
fn test_large_delta_stops_at_winning_tick() {
    let mut topo = topology(
        vec![def(0, ObjectiveKind::Grave, Holder::TeamA)],
        ScoreMode::Race { max_score: 3 },
    );
    topo.scoring.resource_ticks = ticks(vec![0, 1_000], vec![0, 1]);
    let mut engine = started(topo);

    let effects = engine.tick(60_000);
    assert_eq!(engine.score(Team::A), 3);
    let ended = effects
        .iter()
        .filter(|e| matches!(e, Effect::MatchEnded { .. }))
        .count();
    assert_eq!(ended, 1);
}

#[test]
fn test_tick_table_uses_held_count() {
    let mut topo = topology(
        vec![
            def(0, ObjectiveKind::Grave, Holder::TeamA),
            def(1, ObjectiveKind::Grave, Holder::TeamA),
            def(2, ObjectiveKind::Grave, Holder::TeamB),
        ],
        ScoreMode::Race { max_score: 1_000 },
    );
    topo.scoring.resource_ticks = ticks(vec![0, 3_000, 1_000], vec![0, 10, 30]);
    let mut engine = started(topo);

    engine.tick(6_000);
    assert_eq!(engine.score(Team::A), 6 * 30);
    assert_eq!(engine.score(Team::B), 2 * 10);
}

#[test]
fn test_periodic_rewards_from_ticks() {
    let mut topo = topology(
        vec![def(0, ObjectiveKind::Grave, Holder::TeamA)],
        ScoreMode::Race { max_score: 1_000 },
    );
    topo.scoring.resource_ticks = ticks(vec![0, 1_000], vec![0, 10]);
    topo.rewards.periodic.push(PeriodicReward {
        threshold: 25,
        honor: 7,
        reputation: 0,
    });
    let mut engine = started(topo);

    let rewards = |effects: &[Effect]| -> Vec<RewardGrant> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Reward(g) => Some(*g),
                _ => None,
            })
            .collect()
    };

    // 10, 20: nothing yet. 30: one batch, 5 carried.
    assert!(rewards(&engine.tick(2_000)).is_empty());
    let granted = rewards(&engine.tick(1_000));
    assert_eq!(granted.len(), 1);
    assert_eq!(granted[0].honor, 7);
    assert_eq!(granted[0].reason, RewardReason::Periodic);
}

#[test]
fn test_scoreboard_batches_periodic_rewards() {
    let rewards = RewardRules {
        periodic: vec![
            PeriodicReward {
                threshold: 260,
                honor: 10,
                reputation: 0,
            },
            PeriodicReward {
                threshold: 160,
                honor: 0,
                reputation: 5,
            },
        ],
        ..Default::default()
    };
    let mut board = ScoreBoard::new(&scoring(ScoreMode::Race { max_score: 2_000 }), &rewards);

    assert!(board.accumulate_periodic(Team::A, 100).is_empty());

    // 300 honor-track, 300 rep-track: one batch each.
    let effects = board.accumulate_periodic(Team::A, 200);
    assert_eq!(effects.len(), 2);

    // Honor track at 40 + 600 = 640: exactly one grant for two batches.
    let effects = board.accumulate_periodic(Team::A, 600);
    let honor: Vec<_> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::Reward(g) if g.honor > 0 => Some(g.honor),
            _ => None,
        })
        .collect();
    assert_eq!(honor, vec![20]);

    // Team B's accumulators are separate.
    assert!(board.accumulate_periodic(Team::B, 100).is_empty());
}

#[test]
fn test_scoreboard_clamps_to_range() {
    let mut board = ScoreBoard::new(
        &scoring(ScoreMode::Race { max_score: 100 }),
        &RewardRules::default(),
    );
    board.add_points(Team::A, 250);
    assert_eq!(board.score(Team::A), 100);
    board.add_points(Team::B, -5);
    assert_eq!(board.score(Team::B), 0);
    assert!(board.add_points(Team::B, -5).is_empty());

    let mut pool = ScoreBoard::new(
        &scoring(ScoreMode::Elimination { initial_pool: 50 }),
        &RewardRules::default(),
    );
    pool.add_points(Team::A, 10);
    assert_eq!(pool.score(Team::A), 50);
    pool.add_points(Team::A, -80);
    assert_eq!(pool.score(Team::A), 0);
    assert_eq!(pool.depleted(), Some(Team::A));
}

#[test]
fn test_restored_board_out_of_range_is_clamped() {
    let board = ScoreBoard::new(
        &scoring(ScoreMode::Race { max_score: 100 }),
        &RewardRules::default(),
    );
    let mut value = serde_json::to_value(&board).unwrap();
    value["scores"]["a"] = serde_json::json!(999);
    let mut restored: ScoreBoard = serde_json::from_value(value).unwrap();
    assert_eq!(restored.score(Team::A), 999);

    let effects = restored.add_points(Team::A, -1);
    assert_eq!(
        effects,
        vec![Effect::ScoreChanged {
            team: Team::A,
            score: 100
        }]
    );
    assert_eq!(restored.score(Team::A), 100);
}

#[test]
fn test_near_victory_fires_once_per_team() {
    let mut rules = scoring(ScoreMode::Race { max_score: 100 });
    rules.near_threshold = Some(80);
    let mut board = ScoreBoard::new(&rules, &RewardRules::default());

    let near = |effects: &[Effect]| has_notice(effects, Notice::NearVictory);
    assert!(!near(&board.add_points(Team::A, 79)));
    assert!(near(&board.add_points(Team::A, 6)));
    assert!(!near(&board.add_points(Team::A, 5)));
    assert!(near(&board.add_points(Team::B, 90)));
}

#[test]
fn test_near_defeat_for_elimination_pool() {
    let mut rules = scoring(ScoreMode::Elimination { initial_pool: 600 });
    rules.near_threshold = Some(120);
    let mut board = ScoreBoard::new(&rules, &RewardRules::default());
    assert!(!has_notice(&board.add_points(Team::B, -400), Notice::NearDefeat));
    assert!(has_notice(&board.add_points(Team::B, -100), Notice::NearDefeat));
    assert!(!has_notice(&board.add_points(Team::B, -1), Notice::NearDefeat));
}

// ---- Elimination ----

#[test]
fn test_kill_emptying_pool_ends_match() {
    let topo = topology(
        vec![def(0, ObjectiveKind::Grave, Holder::TeamA)],
        ScoreMode::Elimination { initial_pool: 1 },
    );
    let mut engine = started(topo);

    let effects = engine.handle_interaction(&Interaction::Kill {
        victim: Team::A,
        role: UnitRole::Player,
    });
    assert!(effects.contains(&Effect::ScoreDelta {
        team: Team::A,
        delta: -1
    }));
    assert_eq!(ended_with(&effects), Some(MatchResult::Victory(Team::B)));
    assert_eq!(engine.winner(), Some(Team::B));
}

#[test]
fn test_captain_and_commander_kills() {
    let mut topo = topology(
        vec![def(0, ObjectiveKind::Grave, Holder::TeamA)],
        ScoreMode::Elimination { initial_pool: 600 },
    );
    topo.scoring.kills = KillRules {
        player_penalty: 1,
        captain_penalty: 100,
        captain_reward: RewardTable {
            honor: 50,
            reputation: 0,
        },
        commander_ends_match: true,
    };
    let mut engine = started(topo);

    let effects = engine.handle_interaction(&Interaction::Kill {
        victim: Team::B,
        role: UnitRole::Captain,
    });
    assert_eq!(engine.score(Team::B), 500);
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::Reward(g) if g.team == Team::A && g.reason == RewardReason::Kill
    )));

    // B still has the bigger pool, but losing the commander decides it.
    engine.handle_interaction(&Interaction::Kill {
        victim: Team::A,
        role: UnitRole::Player,
    });
    let effects = engine.handle_interaction(&Interaction::Kill {
        victim: Team::A,
        role: UnitRole::Commander,
    });
    assert_eq!(ended_with(&effects), Some(MatchResult::Victory(Team::B)));
}

#[test]
fn test_kills_do_not_score_in_race_mode() {
    let topo = topology(
        vec![def(0, ObjectiveKind::Grave, Holder::TeamA)],
        ScoreMode::Race { max_score: 10 },
    );
    let mut engine = started(topo);
    let effects = engine.handle_interaction(&Interaction::Kill {
        victim: Team::A,
        role: UnitRole::Player,
    });
    assert!(effects.is_empty());
    assert_eq!(engine.score(Team::A), 0);
}

#[test]
fn test_tower_destruction_drains_owner_pool() {
    let mut tower = def(0, ObjectiveKind::Tower, Holder::TeamA);
    tower.destroy_penalty = 75;
    let topo = topology(vec![tower], ScoreMode::Elimination { initial_pool: 600 });
    let mut engine = started(topo);

    engine.handle_interaction(&use_on(0, Team::B));
    engine.tick(WINDOW);
    assert!(engine.objective(ObjectiveId(0)).unwrap().is_destroyed());
    assert_eq!(engine.score(Team::A), 525);
    assert_eq!(engine.score(Team::B), 600);
}

#[test]
fn test_mine_yield_refills_pool() {
    let mut mine = def(0, ObjectiveKind::Mine, Holder::Neutral);
    mine.yields = Some(YieldRule {
        interval_ms: 45_000,
        points: 1,
        target: YieldTarget::Holder,
    });
    let topo = topology(vec![mine], ScoreMode::Elimination { initial_pool: 600 });
    let mut engine = started(topo);

    for _ in 0..3 {
        engine.handle_interaction(&Interaction::Kill {
            victim: Team::A,
            role: UnitRole::Player,
        });
    }
    assert_eq!(engine.score(Team::A), 597);

    engine.handle_interaction(&Interaction::Capture {
        objective: ObjectiveId(0),
        by: Team::A,
    });
    engine.tick(90_000);
    assert_eq!(engine.score(Team::A), 599);
}

// ---- Time limit ----

#[test]
fn test_time_limit_tie_without_captures_is_draw() {
    let mut topo = topology(
        vec![def(0, ObjectiveKind::Grave, Holder::Neutral)],
        ScoreMode::Race { max_score: 3 },
    );
    topo.schedule.time_limit_ms = Some(10_000);
    let mut engine = started(topo);

    assert!(ended_with(&engine.tick(9_999)).is_none());
    let effects = engine.tick(1);
    assert_eq!(ended_with(&effects), Some(MatchResult::Draw));
    assert_eq!(engine.winner(), None);
}

#[test]
fn test_time_limit_tie_goes_to_last_capture() {
    let mut topo = topology(
        vec![def(0, ObjectiveKind::Grave, Holder::Neutral)],
        ScoreMode::Race { max_score: 3 },
    );
    topo.schedule.time_limit_ms = Some(10_000);
    let mut engine = started(topo);

    engine.handle_interaction(&use_on(0, Team::B));
    engine.tick(WINDOW);
    assert_eq!(engine.last_capture(), Some(Team::B));

    engine.tick(9_000);
    assert_eq!(engine.result(), Some(MatchResult::Victory(Team::B)));
}

#[test]
fn test_time_limit_higher_score_beats_last_capture() {
    let mut topo = topology(
        vec![
            def(0, ObjectiveKind::Grave, Holder::TeamA),
            def(1, ObjectiveKind::Grave, Holder::Neutral),
        ],
        ScoreMode::Race { max_score: 100 },
    );
    topo.schedule.time_limit_ms = Some(10_000);
    topo.scoring.resource_ticks = ticks(vec![0, 1_000, 1_000], vec![0, 1, 1]);
    let mut engine = started(topo);

    engine.tick(5_000);
    engine.handle_interaction(&use_on(1, Team::B));
    engine.tick(5_000);

    assert_eq!(engine.last_capture(), Some(Team::B));
    assert!(engine.score(Team::A) > engine.score(Team::B));
    assert_eq!(engine.winner(), Some(Team::A));
}

#[test]
fn test_holding_every_objective_of_kind_wins() {
    let mut topo = topology(
        vec![
            def(0, ObjectiveKind::Grave, Holder::TeamA),
            def(1, ObjectiveKind::Grave, Holder::TeamB),
        ],
        ScoreMode::Race { max_score: 100 },
    );
    topo.win.hold_all = Some(ObjectiveKind::Grave);
    let mut engine = started(topo);

    engine.handle_interaction(&use_on(1, Team::A));
    let effects = engine.tick(WINDOW);
    assert_eq!(ended_with(&effects), Some(MatchResult::Victory(Team::A)));
}

#[test]
fn test_flag_capture_at_limit_ends_in_same_effect_list() {
    let mut home_a = def(0, ObjectiveKind::Flag, Holder::Neutral);
    home_a.home = Some(Team::A);
    let mut home_b = def(1, ObjectiveKind::Flag, Holder::Neutral);
    home_b.home = Some(Team::B);
    let mut engine = started(topology(
        vec![home_a, home_b],
        ScoreMode::Race { max_score: 1 },
    ));

    engine.handle_interaction(&Interaction::PickUpFlag {
        flag: ObjectiveId(1),
        team: Team::A,
    });
    let effects = engine.handle_interaction(&Interaction::CaptureFlag {
        flag: ObjectiveId(1),
        at: ObjectiveId(0),
        team: Team::A,
    });
    assert!(has_notice(&effects, Notice::FlagCaptured));
    assert!(effects.contains(&Effect::ScoreChanged {
        team: Team::A,
        score: 1
    }));
    assert_eq!(ended_with(&effects), Some(MatchResult::Victory(Team::A)));
    assert_eq!(engine.last_capture(), Some(Team::A));
}

// ---- Relay ----

#[test]
fn test_relay_lower_elapsed_time_wins() {
    let mut engine = started(relay_topology(AttackerPick::TeamA));
    assert_eq!(engine.attackers(), Some(Team::A));
    assert_eq!(
        engine.objective(ObjectiveId(1)).unwrap().controller(),
        Some(Team::B)
    );

    // Round one: A attacks, breaks the gate, takes the relic at 480 s.
    engine.tick(479_000);
    engine.handle_interaction(&Interaction::Destroy {
        objective: ObjectiveId(0),
        by: Team::A,
    });
    engine.tick(1_000);
    let effects = engine.handle_interaction(&Interaction::Capture {
        objective: ObjectiveId(1),
        by: Team::A,
    });
    assert!(has_notice(&effects, Notice::RoundEnded { round: 1 }));
    assert_eq!(engine.phase(), MatchPhase::Intermission);
    assert_eq!(engine.attackers(), Some(Team::B));

    // Roles swapped, objectives reset for the new defenders.
    let gate = engine.objective(ObjectiveId(0)).unwrap();
    assert_eq!(gate.state(), ObjectiveState::Controlled(Team::A));
    assert_eq!(
        engine.objective(ObjectiveId(1)).unwrap().controller(),
        Some(Team::A)
    );

    engine.tick(60_000);
    assert_eq!(engine.phase(), MatchPhase::RoundTwo);

    // B would need 500 s; the round is lost as soon as it passes 480 s.
    let effects = engine.tick(499_000);
    assert_eq!(ended_with(&effects), Some(MatchResult::Victory(Team::A)));
    let rounds = engine.snapshot().rounds;
    assert_eq!(
        rounds,
        vec![
            RoundView {
                attackers: Team::A,
                elapsed_ms: 480_000,
                completed: true
            },
            RoundView {
                attackers: Team::B,
                elapsed_ms: 480_001,
                completed: false
            },
        ]
    );
}

#[test]
fn test_relay_faster_second_round_wins() {
    let mut engine = started(relay_topology(AttackerPick::TeamA));
    engine.tick(400_000);
    engine.handle_interaction(&Interaction::Destroy {
        objective: ObjectiveId(0),
        by: Team::A,
    });
    engine.handle_interaction(&Interaction::Capture {
        objective: ObjectiveId(1),
        by: Team::A,
    });
    engine.tick(60_000);

    engine.tick(300_000);
    engine.handle_interaction(&Interaction::Destroy {
        objective: ObjectiveId(0),
        by: Team::B,
    });
    let effects = engine.handle_interaction(&Interaction::Capture {
        objective: ObjectiveId(1),
        by: Team::B,
    });
    assert_eq!(ended_with(&effects), Some(MatchResult::Victory(Team::B)));
}

#[test]
fn test_relay_both_rounds_timed_out_is_draw() {
    let mut engine = started(relay_topology(AttackerPick::TeamB));
    engine.tick(600_000);
    assert_eq!(engine.phase(), MatchPhase::Intermission);
    engine.tick(60_000);
    assert_eq!(engine.phase(), MatchPhase::RoundTwo);
    let effects = engine.tick(600_000);
    assert_eq!(ended_with(&effects), Some(MatchResult::Draw));
}

#[test]
fn test_relay_result_compares_round_times() {
    let round = |attackers, secs: u64| RoundView {
        attackers,
        elapsed_ms: secs * 1_000,
        completed: true,
    };
    assert_eq!(
        victory::relay_result(&[round(Team::A, 480), round(Team::B, 500)]),
        MatchResult::Victory(Team::A)
    );
    assert_eq!(
        victory::relay_result(&[round(Team::A, 600), round(Team::B, 600)]),
        MatchResult::Draw
    );
}

#[test]
fn test_seeded_first_attackers() {
    let picks: Vec<Team> = (0..16)
        .map(|seed| {
            MatchEngine::new(relay_topology(AttackerPick::Seeded), MatchOptions { seed })
                .unwrap()
                .attackers()
                .unwrap()
        })
        .collect();
    assert!(picks.contains(&Team::A));
    assert!(picks.contains(&Team::B));

    // Same seed, same pick, including after a reset.
    let mut engine = started(relay_topology(AttackerPick::Seeded));
    let first = engine.attackers();
    engine.tick(600_000);
    assert_ne!(engine.attackers(), first);
    engine.reset();
    assert_eq!(engine.attackers(), first);
}

// ---- Premature end ----

#[test]
fn test_premature_winner_score_then_population() {
    let mut topo = topology(
        vec![def(0, ObjectiveKind::Grave, Holder::TeamA)],
        ScoreMode::Race { max_score: 100 },
    );
    topo.scoring.resource_ticks = ticks(vec![0, 1_000], vec![0, 1]);
    let mut engine = started(topo.clone());

    // Level scores: population decides, equal population decides nothing.
    assert_eq!(engine.premature_winner(PerTeam::new(3, 5)), Some(Team::B));
    assert_eq!(engine.premature_winner(PerTeam::new(5, 5)), None);

    engine.tick(1_000);
    assert_eq!(engine.premature_winner(PerTeam::new(1, 15)), Some(Team::A));

    let mut level = started(topo);
    let effects = level.end_early(PerTeam::new(5, 5));
    assert_eq!(ended_with(&effects), Some(MatchResult::Draw));
    assert!(level.end_early(PerTeam::new(9, 0)).is_empty());
}

#[test]
fn test_premature_winner_unscored_uses_population() {
    let engine = started(relay_topology(AttackerPick::TeamA));
    assert_eq!(engine.premature_winner(PerTeam::new(10, 4)), Some(Team::A));
}

// ---- Graveyards ----

#[test]
fn test_nearest_graveyard_of_team() {
    let mut near = def(0, ObjectiveKind::Grave, Holder::TeamA);
    near.position = Vec3::new(100.0, 0.0, 0.0);
    let far = def(1, ObjectiveKind::Grave, Holder::TeamA);
    let mut enemy = def(2, ObjectiveKind::Grave, Holder::TeamB);
    enemy.position = Vec3::new(95.0, 0.0, 0.0);
    let engine = started(topology(
        vec![near, far, enemy],
        ScoreMode::Race { max_score: 10 },
    ));

    let at = Vec3::new(90.0, 0.0, 0.0);
    assert_eq!(engine.nearest_graveyard(Team::A, at), Some(ObjectiveId(0)));
    assert_eq!(engine.nearest_graveyard(Team::B, at), Some(ObjectiveId(2)));
}

// ---- Determinism ----

enum Step {
    Interact(Interaction),
    Tick(u64),
}

fn basin() -> Topology {
    let mut topo = topology(
        (0..3)
            .map(|id| def(id, ObjectiveKind::Grave, Holder::Neutral))
            .collect(),
        ScoreMode::Race { max_score: 200 },
    );
    topo.scoring.resource_ticks = ticks(vec![0, 2_000, 1_500, 1_000], vec![0, 10, 10, 20]);
    topo.rewards.periodic.push(PeriodicReward {
        threshold: 50,
        honor: 5,
        reputation: 0,
    });
    topo
}

fn script() -> Vec<Step> {
    vec![
        Step::Tick(0),
        Step::Interact(use_on(0, Team::A)),
        Step::Interact(use_on(1, Team::B)),
        Step::Tick(700),
        Step::Interact(use_on(1, Team::A)),
        Step::Tick(1_300),
        Step::Interact(use_on(2, Team::B)),
        Step::Tick(4_000),
        Step::Interact(use_on(0, Team::B)),
        Step::Interact(use_on(0, Team::A)),
        Step::Tick(12_345),
    ]
}

fn run_script(engine: &mut MatchEngine, steps: &[Step]) -> Vec<Effect> {
    let mut effects = Vec::new();
    for step in steps {
        match step {
            Step::Interact(interaction) => effects.extend(engine.handle_interaction(interaction)),
            Step::Tick(delta) => effects.extend(engine.tick(*delta)),
        }
    }
    effects
}

#[test]
fn test_determinism_same_inputs() {
    let mut engine_a = MatchEngine::new(basin(), MatchOptions { seed: 12345 }).unwrap();
    let mut engine_b = MatchEngine::new(basin(), MatchOptions { seed: 12345 }).unwrap();

    for step in script() {
        let (ea, eb) = match &step {
            Step::Interact(i) => (engine_a.handle_interaction(i), engine_b.handle_interaction(i)),
            Step::Tick(d) => (engine_a.tick(*d), engine_b.tick(*d)),
        };
        assert_eq!(ea, eb);
        let json_a = serde_json::to_string(&engine_a.snapshot()).unwrap();
        let json_b = serde_json::to_string(&engine_b.snapshot()).unwrap();
        assert_eq!(json_a, json_b, "Snapshots diverged with same inputs");
    }
}

#[test]
fn test_reset_then_replay_is_identical() {
    let mut engine = MatchEngine::new(basin(), MatchOptions::default()).unwrap();
    let fresh = serde_json::to_string(&engine.snapshot()).unwrap();

    let first_effects = run_script(&mut engine, &script());
    let first = serde_json::to_string(&engine.snapshot()).unwrap();
    assert_ne!(first, fresh);

    engine.reset();
    assert_eq!(serde_json::to_string(&engine.snapshot()).unwrap(), fresh);

    let second_effects = run_script(&mut engine, &script());
    assert_eq!(second_effects, first_effects);
    assert_eq!(serde_json::to_string(&engine.snapshot()).unwrap(), first);
}

#[test]
fn test_split_ticks_match_single_tick() {
    let mut whole = started(basin());
    let mut split = started(basin());
    for engine in [&mut whole, &mut split] {
        engine.handle_interaction(&use_on(0, Team::A));
        engine.handle_interaction(&use_on(2, Team::B));
    }
    whole.tick(9_000);
    for _ in 0..90 {
        split.tick(100);
    }
    assert_eq!(whole.snapshot().scores, split.snapshot().scores);
    assert_eq!(whole.snapshot().objectives, split.snapshot().objectives);
}

// ---- Arena ----

#[test]
fn test_arena_handles() {
    let mut arena = Arena::new();
    let first = arena.create_match(basin()).unwrap();
    let second = arena.create_match(basin()).unwrap();
    assert_ne!(first, second);
    assert_eq!(arena.len(), 2);

    assert_eq!(arena.tick_all(0).len(), 2);
    assert!(!arena
        .handle_interaction(first, &use_on(0, Team::A))
        .unwrap()
        .is_empty());
    arena.tick(first, WINDOW).unwrap();
    assert_eq!(arena.winner(first).unwrap(), None);
    assert_eq!(
        arena.snapshot(first).unwrap().objectives[0].state,
        ObjectiveState::Controlled(Team::A)
    );
    // Matches are independent.
    assert_eq!(
        arena.snapshot(second).unwrap().objectives[0].state,
        ObjectiveState::Neutral
    );

    arena.reset(first).unwrap();
    assert_eq!(arena.snapshot(first).unwrap().phase, MatchPhase::Warmup);

    arena.remove(first).unwrap();
    assert!(matches!(
        arena.tick(first, 0),
        Err(ArenaError::UnknownMatch(handle)) if handle == first
    ));
}

#[test]
fn test_arena_rejects_invalid_topology() {
    let mut arena = Arena::new();
    let result = arena.create_match(topology(Vec::new(), ScoreMode::Race { max_score: 1 }));
    assert!(matches!(
        result,
        Err(ArenaError::Topology(TopologyError::NoObjectives { .. }))
    ));
    assert!(arena.is_empty());
}

// ---- Worker ----

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<Effect>>>);

impl EffectSink for SharedSink {
    fn apply(&mut self, effect: &Effect) {
        self.0.lock().unwrap().push(effect.clone());
    }
}

#[test]
fn test_worker_applies_commands_in_order() {
    let engine = MatchEngine::new(basin(), MatchOptions::default()).unwrap();
    let sink = SharedSink::default();
    let worker = spawn_match_worker(engine, Box::new(sink.clone())).unwrap();

    worker.tick(0).unwrap();
    worker.interact(use_on(0, Team::A)).unwrap();
    worker.tick(WINDOW).unwrap();

    let snapshot = worker.snapshot().unwrap();
    assert_eq!(
        snapshot.objectives[0].state,
        ObjectiveState::Controlled(Team::A)
    );
    assert_eq!(worker.winner().unwrap(), None);

    let engine = worker.shutdown().unwrap();
    assert_eq!(
        engine.objective(ObjectiveId(0)).unwrap().controller(),
        Some(Team::A)
    );

    let applied = sink.0.lock().unwrap();
    assert!(applied.contains(&Effect::DoorsOpened));
    assert!(has_notice(&applied, Notice::Captured));
}

// ---- Invariants ----

#[derive(Debug, Clone)]
enum Op {
    Interact(Interaction),
    Tick(u64),
}

fn arb_team() -> impl Strategy<Value = Team> {
    prop_oneof![Just(Team::A), Just(Team::B)]
}

fn arb_op() -> impl Strategy<Value = Op> {
    let role = prop_oneof![
        Just(UnitRole::Player),
        Just(UnitRole::Captain),
        Just(UnitRole::Commander)
    ];
    prop_oneof![
        (0u16..4, arb_team()).prop_map(|(id, team)| Op::Interact(use_on(id, team))),
        (0u16..4, arb_team()).prop_map(|(id, by)| Op::Interact(Interaction::Destroy {
            objective: ObjectiveId(id),
            by
        })),
        (arb_team(), role).prop_map(|(victim, role)| Op::Interact(Interaction::Kill {
            victim,
            role
        })),
        (0u64..120_000).prop_map(Op::Tick),
    ]
}

fn valley() -> Topology {
    let mut tower_a = def(2, ObjectiveKind::Tower, Holder::TeamA);
    tower_a.destroy_penalty = 75;
    let mut tower_b = def(3, ObjectiveKind::Tower, Holder::TeamB);
    tower_b.destroy_penalty = 75;
    let mut topo = topology(
        vec![
            def(0, ObjectiveKind::Grave, Holder::TeamA),
            def(1, ObjectiveKind::Grave, Holder::Neutral),
            tower_a,
            tower_b,
        ],
        ScoreMode::Elimination { initial_pool: 300 },
    );
    topo.scoring.kills.captain_penalty = 40;
    topo.schedule.time_limit_ms = Some(1_800_000);
    topo
}

proptest! {
    #[test]
    fn prop_scores_stay_in_bounds_and_freeze_after_end(
        ops in proptest::collection::vec(arb_op(), 1..80)
    ) {
        let mut engine = started(valley());
        let mut frozen = None;
        for op in ops {
            match &op {
                Op::Interact(interaction) => { engine.handle_interaction(interaction); }
                Op::Tick(delta) => { engine.tick(*delta); }
            }
            let scores = engine.snapshot().scores;
            prop_assert!(scores.a <= 300 && scores.b <= 300);
            for id in 0..4 {
                prop_assert!(engine.objective(ObjectiveId(id)).unwrap().ownership_consistent());
            }
            match frozen {
                Some(previous) => prop_assert_eq!(scores, previous),
                None if engine.result().is_some() => frozen = Some(scores),
                None => {}
            }
        }
    }
}
