//! Worker-driven building construction.
//!
//! A request binds a building to a builder unit. The builder first walks to
//! the site, then opens a construction record that the building update
//! advances each tick. Cost is paid and unique structures are reserved when
//! the request is accepted.

use crate::components::{EntityId, Team};
use crate::error::ProductionError;
use crate::math::{Fixed, Vec2Fixed};
use crate::units::{BehaviorState, BuilderTask};
use crate::world::World;

/// Order builder `worker` of `team` to construct `key` at `site`.
///
/// Checks everything before mutating: a declined request leaves the
/// economy and the worker unchanged.
pub fn request_construction(
    world: &mut World,
    team: Team,
    worker: EntityId,
    key: &str,
    site: Vec2Fixed,
) -> Result<(), ProductionError> {
    let archetype = world
        .catalog()
        .building(key)
        .ok_or_else(|| ProductionError::UnknownBuilding(key.to_string()))?;

    let unit = world
        .units(team)
        .iter()
        .find(|u| u.id() == worker && u.is_alive())
        .ok_or(ProductionError::NotABuilder(worker))?;
    match &unit.behavior {
        BehaviorState::Builder(BuilderTask::Idle) => {}
        BehaviorState::Builder(_) => return Err(ProductionError::WorkerBusy(worker)),
        _ => return Err(ProductionError::NotABuilder(worker)),
    }

    let economy = world.economy(team);
    if archetype.unique && economy.unique_built(key) {
        return Err(ProductionError::UniqueAlreadyBuilt {
            key: key.to_string(),
        });
    }
    if economy.supply() < Fixed::from_num(archetype.cost) {
        return Err(ProductionError::InsufficientSupply {
            required: archetype.cost,
            available: economy.whole_supply(),
        });
    }

    let economy = world.economy_mut(team);
    economy.spend(archetype.cost)?;
    if archetype.unique {
        economy.reserve_unique(key)?;
    }

    let site = world.clamp_to_map(site);

    if let Some(unit) = world.units_mut(team).iter_mut().find(|u| u.id() == worker) {
        unit.behavior = BehaviorState::Builder(BuilderTask::Move {
            site,
            key: key.to_string(),
        });
        unit.attack.target = None;
    }

    tracing::debug!(tick = world.tick, building = key, worker, "Construction ordered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::Catalog;

    fn setup() -> (World, EntityId) {
        let mut world = World::empty(Arc::new(Catalog::standard()), 9);
        let engineer = world.spawn_unit(Team::Player, "engineer", Vec2Fixed::from_ints(200, 200));
        (world, engineer)
    }

    #[test]
    fn test_accepted_order_pays_and_assigns_task() {
        let (mut world, engineer) = setup();
        let site = Vec2Fixed::from_ints(400, 200);

        request_construction(&mut world, Team::Player, engineer, "bunker", site).expect("accepted");
        assert_eq!(world.player_economy.supply(), Fixed::from_num(20));
        let unit = world.unit(engineer).expect("engineer");
        assert!(matches!(
            &unit.behavior,
            BehaviorState::Builder(BuilderTask::Move { key, .. }) if key == "bunker"
        ));

        assert_eq!(
            request_construction(&mut world, Team::Player, engineer, "bunker", site),
            Err(ProductionError::WorkerBusy(engineer))
        );
    }

    #[test]
    fn test_unique_structure_only_once() {
        let (mut world, first) = setup();
        let second = world.spawn_unit(Team::Player, "engineer", Vec2Fixed::from_ints(220, 200));
        world.player_economy.set_supply(Fixed::from_num(400));
        let site = Vec2Fixed::from_ints(300, 100);

        request_construction(&mut world, Team::Player, first, "logistics_center", site)
            .expect("first accepted");
        let supply = world.player_economy.supply();
        assert_eq!(
            request_construction(&mut world, Team::Player, second, "logistics_center", site),
            Err(ProductionError::UniqueAlreadyBuilt {
                key: "logistics_center".to_string()
            })
        );
        assert_eq!(world.player_economy.supply(), supply);
    }

    #[test]
    fn test_non_builders_are_rejected() {
        let (mut world, _) = setup();
        let tank = world.spawn_unit(Team::Player, "tank", Vec2Fixed::ZERO);
        assert_eq!(
            request_construction(&mut world, Team::Player, tank, "bunker", Vec2Fixed::ZERO),
            Err(ProductionError::NotABuilder(tank))
        );
        assert!(matches!(
            request_construction(&mut world, Team::Player, tank, "castle", Vec2Fixed::ZERO),
            Err(ProductionError::UnknownBuilding(_))
        ));
    }

    #[test]
    fn test_insufficient_supply_is_declined() {
        let (mut world, engineer) = setup();
        world.player_economy.set_supply(Fixed::from_num(10));
        let result = request_construction(&mut world, Team::Player, engineer, "bunker", Vec2Fixed::ZERO);
        assert_eq!(
            result,
            Err(ProductionError::InsufficientSupply {
                required: 80,
                available: 10
            })
        );
    }
}
