#[cfg(test)]
mod tests {
    use crate::clock::Clock;
    use crate::effects::{Broadcast, Effect, Notice, RewardGrant};
    use crate::enums::*;
    use crate::interactions::Interaction;
    use crate::topology::*;
    use crate::types::{ObjectiveId, PerTeam, Team};

    fn def(id: u16, kind: ObjectiveKind) -> ObjectiveDef {
        ObjectiveDef {
            id: ObjectiveId(id),
            key: format!("test.{id}"),
            kind,
            initial: Holder::Neutral,
            capture: CaptureMode::Timed,
            capture_ms: None,
            home: None,
            world_state: None,
            position: glam::Vec3::ZERO,
            requires_destroyed: Vec::new(),
            destroy_penalty: 0,
            reward: RewardTable::default(),
            yields: None,
        }
    }

    fn topology(objectives: Vec<ObjectiveDef>) -> Topology {
        Topology {
            map: "test".into(),
            objectives,
            pairs: Vec::new(),
            scoring: ScoringRules {
                mode: ScoreMode::Race { max_score: 100 },
                near_threshold: None,
                resource_ticks: None,
                flags: FlagRules::default(),
                kills: KillRules::default(),
            },
            schedule: ScheduleRules::default(),
            rewards: RewardRules::default(),
            win: WinRules::default(),
        }
    }

    // ---- Clock ----

    #[test]
    fn test_clock_disarmed_advance_is_noop() {
        let mut clock = Clock::default();
        assert!(!clock.advance(10_000));
        assert!(!clock.elapsed());
        assert_eq!(clock.remaining(), 0);
    }

    #[test]
    fn test_clock_elapses_exactly_at_duration() {
        let mut clock = Clock::armed(1_000);
        assert!(!clock.advance(999));
        assert!(!clock.elapsed());
        assert_eq!(clock.remaining(), 1);
        assert!(clock.advance(1));
        assert!(clock.elapsed());
    }

    #[test]
    fn test_clock_stays_elapsed_until_rearmed() {
        let mut clock = Clock::armed(100);
        assert!(clock.advance(500));
        // Further advances do not re-report the expiry.
        assert!(!clock.advance(500));
        assert!(clock.elapsed());

        clock.arm(200);
        assert!(!clock.elapsed());
        assert_eq!(clock.remaining(), 200);
    }

    #[test]
    fn test_clock_zero_duration_is_immediately_elapsed() {
        let clock = Clock::armed(0);
        assert!(clock.elapsed());
    }

    // ---- Teams ----

    #[test]
    fn test_faction_team_boundary() {
        assert_eq!(Team::from(Faction::Alliance), Team::A);
        assert_eq!(Team::from(Faction::Horde), Team::B);
        for team in Team::ALL {
            assert_eq!(Team::from(Faction::from(team)), team);
        }
    }

    #[test]
    fn test_per_team_indexing() {
        let mut scores = PerTeam::splat(0u32);
        scores[Team::B] += 5;
        assert_eq!(scores[Team::A], 0);
        assert_eq!(scores[Team::B], 5);
        assert_eq!(Team::A.opponent(), Team::B);

        let doubled = scores.map(|_, v| v * 2);
        assert_eq!(doubled, PerTeam::new(0, 10));
    }

    // ---- Serde ----

    #[test]
    fn test_objective_state_serde() {
        let variants = vec![
            ObjectiveState::Neutral,
            ObjectiveState::Assaulted(Team::A),
            ObjectiveState::Controlled(Team::B),
            ObjectiveState::Destroyed,
            ObjectiveState::InBase,
            ObjectiveState::Taken(Team::A),
            ObjectiveState::Dropped,
            ObjectiveState::Respawning,
        ];
        for v in variants {
            let json = serde_json::to_string(&v).unwrap();
            let back: ObjectiveState = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn test_effect_serde() {
        let effects = vec![
            Effect::ScoreDelta {
                team: Team::A,
                delta: -75,
            },
            Effect::Reward(RewardGrant {
                team: Team::B,
                honor: 20,
                reputation: 10,
                reason: RewardReason::Periodic,
            }),
            Effect::Broadcast(Broadcast {
                notice: Notice::StartingIn { secs: 30 },
                team: None,
                objective: None,
                key: None,
            }),
            Effect::MatchEnded {
                result: MatchResult::Draw,
            },
        ];
        for effect in effects {
            let json = serde_json::to_string(&effect).unwrap();
            let back: Effect = serde_json::from_str(&json).unwrap();
            assert_eq!(effect, back);
        }
    }

    #[test]
    fn test_interaction_json_shape() {
        let json = r#"{"type":"Use","objective":3,"team":"B"}"#;
        let interaction: Interaction = serde_json::from_str(json).unwrap();
        assert_eq!(
            interaction,
            Interaction::Use {
                objective: ObjectiveId(3),
                team: Team::B
            }
        );
        assert_eq!(interaction.objective(), Some(ObjectiveId(3)));
    }

    #[test]
    fn test_capturing_team_only_for_captures() {
        let captured = Effect::Broadcast(Broadcast {
            notice: Notice::Captured,
            team: Some(Team::A),
            objective: Some(ObjectiveId(0)),
            key: None,
        });
        let assaulted = Effect::Broadcast(Broadcast {
            notice: Notice::Assaulted,
            team: Some(Team::A),
            objective: Some(ObjectiveId(0)),
            key: None,
        });
        assert_eq!(captured.capturing_team(), Some(Team::A));
        assert_eq!(assaulted.capturing_team(), None);
    }

    // ---- Topology validation ----

    #[test]
    fn test_minimal_topology_validates() {
        let topo = topology(vec![def(0, ObjectiveKind::Grave)]);
        assert_eq!(topo.validate(), Ok(()));
    }

    #[test]
    fn test_topology_rejects_empty() {
        let topo = topology(Vec::new());
        assert!(matches!(
            topo.validate(),
            Err(TopologyError::NoObjectives { .. })
        ));
    }

    #[test]
    fn test_topology_rejects_misnumbered_ids() {
        let topo = topology(vec![def(0, ObjectiveKind::Grave), def(5, ObjectiveKind::Grave)]);
        assert_eq!(
            topo.validate(),
            Err(TopologyError::IdOutOfOrder {
                index: 1,
                found: ObjectiveId(5)
            })
        );
    }

    #[test]
    fn test_topology_rejects_dangling_prerequisite() {
        let mut relic = def(0, ObjectiveKind::RelicPoint);
        relic.requires_destroyed.push(ObjectiveId(9));
        let topo = topology(vec![relic]);
        assert_eq!(
            topo.validate(),
            Err(TopologyError::UnknownObjective {
                referenced_by: ObjectiveId(0),
                missing: ObjectiveId(9)
            })
        );
    }

    #[test]
    fn test_topology_rejects_non_structure_prerequisite() {
        let mut relic = def(1, ObjectiveKind::RelicPoint);
        relic.requires_destroyed.push(ObjectiveId(0));
        let topo = topology(vec![def(0, ObjectiveKind::Grave), relic]);
        assert!(matches!(
            topo.validate(),
            Err(TopologyError::PrerequisiteNotDestructible { .. })
        ));
    }

    #[test]
    fn test_topology_rejects_bad_pairs() {
        let mut topo = topology(vec![def(0, ObjectiveKind::Gate), def(1, ObjectiveKind::Grave)]);
        topo.pairs.push(PairRule {
            first: ObjectiveId(0),
            second: ObjectiveId(4),
            policy: PairPolicy::SuppressRewardWhenPartnerDestroyed,
        });
        assert_eq!(
            topo.validate(),
            Err(TopologyError::UnknownPairMember(ObjectiveId(4)))
        );

        topo.pairs[0].second = ObjectiveId(1);
        assert_eq!(
            topo.validate(),
            Err(TopologyError::PairMemberNotStructure(ObjectiveId(1)))
        );
    }

    #[test]
    fn test_topology_rejects_tick_table_mismatch() {
        let mut topo = topology(vec![def(0, ObjectiveKind::Grave)]);
        topo.scoring.resource_ticks = Some(ResourceTicks {
            counted: vec![ObjectiveKind::Grave],
            intervals_ms: vec![0, 2_000],
            points: vec![0],
        });
        assert_eq!(
            topo.validate(),
            Err(TopologyError::TickTableMismatch {
                intervals: 2,
                points: 1
            })
        );
    }

    #[test]
    fn test_topology_role_holder_requires_relay() {
        let mut gate = def(0, ObjectiveKind::Gate);
        gate.initial = Holder::Defenders;
        let topo = topology(vec![gate]);
        assert_eq!(
            topo.validate(),
            Err(TopologyError::RoleHolderWithoutRelay(ObjectiveId(0)))
        );
    }

    #[test]
    fn test_holder_resolution() {
        assert_eq!(Holder::Neutral.resolve(Some(Team::A)), None);
        assert_eq!(Holder::TeamB.resolve(None), Some(Team::B));
        assert_eq!(Holder::Attackers.resolve(Some(Team::B)), Some(Team::B));
        assert_eq!(Holder::Defenders.resolve(Some(Team::B)), Some(Team::A));
    }

    #[test]
    fn test_topology_defaults_from_minimal_json() {
        let json = r#"{
            "map": "tiny",
            "objectives": [
                { "id": 0, "key": "tiny.flag", "kind": "flag", "home": "A" }
            ],
            "scoring": { "mode": { "mode": "race", "max_score": 3 } }
        }"#;
        let topo: Topology = serde_json::from_str(json).unwrap();
        assert_eq!(topo.validate(), Ok(()));
        assert_eq!(topo.scoring.flags.capture_points, vec![1]);
        assert_eq!(topo.schedule.warmup_ms, crate::constants::DEFAULT_WARMUP_MS);
        assert_eq!(topo.objectives[0].home, Some(Team::A));
        assert_eq!(
            topo.objectives[0].capture_window_ms(),
            crate::constants::DEFAULT_CAPTURE_MS
        );
    }
}
