//! Opponent controller behavior over whole matches.

use frontline_core::ai::{Difficulty, WavePhase};
use frontline_core::components::Team;
use frontline_core::effects::SimEvent;
use frontline_test_utils::determinism::{
    find_first_divergence, run_parallel_simulations, verify_simulation_determinism,
};
use frontline_test_utils::fixtures::{skirmish, standard_simulation};

#[test]
fn wave_phases_only_take_legal_transitions() {
    for difficulty in Difficulty::ALL {
        let mut sim = standard_simulation(11, difficulty);
        let mut phase = WavePhase::Hold;
        let mut changes = 0;
        for _ in 0..6000 {
            for event in sim.tick().events {
                if let SimEvent::WavePhaseChanged { from, to } = event {
                    assert_eq!(from, phase);
                    assert!(from.can_transition_to(to), "{from:?} -> {to:?}");
                    phase = to;
                    changes += 1;
                }
            }
        }
        assert_eq!(sim.ai().waves.phase(), phase);
        assert!(changes > 0, "{difficulty} never left hold");
    }
}

#[test]
fn spawner_fields_units_over_time() {
    let mut sim = standard_simulation(12, Difficulty::Elite);
    let mut enemy_spawns = 0;
    for _ in 0..1800 {
        enemy_spawns += sim
            .tick()
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::UnitSpawned { team: Team::Enemy, .. }))
            .count();
    }
    assert!(enemy_spawns >= 5, "only {enemy_spawns} enemy units in 30s");
    assert!(sim.world().stats.enemy_units_produced >= 5);
}

#[test]
fn harder_profiles_spawn_faster() {
    let count = |difficulty| {
        let mut sim = standard_simulation(13, difficulty);
        for _ in 0..3600 {
            sim.tick();
        }
        sim.world().stats.enemy_units_produced
    };
    assert!(count(Difficulty::Elite) >= count(Difficulty::Recruit));
}

#[test]
fn full_matches_are_deterministic() {
    assert!(verify_simulation_determinism(|| standard_simulation(99, Difficulty::Elite), 1200));
    assert_eq!(find_first_divergence(|| skirmish(99), 600), None);
    run_parallel_simulations(|| skirmish(5), 3, 600).assert_deterministic();
}
