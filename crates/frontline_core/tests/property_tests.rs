//! Property tests for invariants that must hold for any input.

use frontline_core::catalog::Catalog;
use frontline_core::components::{Body, Team};
use frontline_core::economy::SideEconomy;
use frontline_core::math::{Fixed, Vec2Fixed};
use frontline_core::world::World;
use frontline_test_utils::fixtures::{fixed, skirmish, standard_simulation};
use frontline_test_utils::strategies::{difficulty, unit_command, unit_key};
use proptest::prelude::*;

fn target_is_hostile(world: &World, team: Team, target: u64) -> bool {
    let owner = world
        .unit(target)
        .map(|u| u.team())
        .or_else(|| world.building(target).map(|b| b.body.team));
    owner.map_or(true, |owner| team.is_hostile_to(owner))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn hp_stays_in_bounds(max in 1u32..5000, hits in prop::collection::vec(0u32..3000, 1..20)) {
        let mut body = Body::new(1, Vec2Fixed::ZERO, Team::Player, max, fixed(10), fixed(10));
        for hit in hits {
            body.apply_damage(hit);
            prop_assert!(body.health.current <= body.health.max);
            if body.health.current == 0 {
                prop_assert!(body.is_dead());
            }
        }
    }

    #[test]
    fn production_decrements_stock_once_or_changes_nothing(
        key in unit_key(),
        supply in 0i32..400,
        orders in 1usize..6,
    ) {
        let catalog = Catalog::standard();
        let mut economy = SideEconomy::new(&catalog);
        economy.set_supply(Fixed::from_num(supply));
        let archetype = catalog.resolve_unit(&key);

        for _ in 0..orders {
            let before = economy.clone();
            match economy.request_production(&archetype) {
                Ok(_) => {
                    prop_assert_eq!(economy.stock(&key) + 1, before.stock(&key));
                    prop_assert_eq!(
                        economy.supply() + Fixed::from_num(archetype.cost),
                        before.supply()
                    );
                }
                Err(_) => prop_assert_eq!(&economy, &before),
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn supply_stays_in_bounds_under_random_orders(
        level in difficulty(),
        seed in any::<u64>(),
        keys in prop::collection::vec(unit_key(), 1..30),
    ) {
        let mut sim = standard_simulation(seed, level);
        for (i, key) in keys.iter().cycle().take(240).enumerate() {
            if i % 8 == 0 {
                let _ = sim.request_production(key);
            }
            sim.tick();
            for team in [Team::Player, Team::Enemy] {
                let economy = sim.world().economy(team);
                prop_assert!(economy.supply() >= Fixed::ZERO);
                prop_assert!(economy.supply() <= Fixed::from_num(economy.max_supply()));
            }
        }
    }

    #[test]
    fn units_only_ever_target_hostiles(
        seed in 0u64..1000,
        commands in prop::collection::vec(unit_command(), 1..6),
    ) {
        let mut sim = skirmish(seed);
        for (round, command) in commands.into_iter().enumerate() {
            let ids: Vec<_> = sim.world().players.iter().map(|u| u.id()).collect();
            sim.issue_command(&ids, command);
            for _ in 0..40 {
                sim.tick();
            }
            let world = sim.world();
            for unit in world.players.iter().chain(&world.enemies) {
                if let Some(target) = unit.attack.target {
                    prop_assert!(
                        target_is_hostile(world, unit.team(), target),
                        "round {}: {} targets friendly {}", round, unit.id(), target
                    );
                }
            }
        }
    }
}
