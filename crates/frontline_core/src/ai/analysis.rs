//! Read-only analysis of the player's force.

use crate::catalog::{BehaviorKind, UnitCategory};
use crate::components::Team;
use crate::math::{Fixed, Vec2Fixed};
use crate::world::World;

/// Radius used to score cluster targets.
pub const CLUSTER_RADIUS: i32 = 150;

/// Counts of the player's visible force by role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Composition {
    /// Aircraft, bombers and drones.
    pub air: u32,
    /// Tanks, artillery and transports.
    pub armor: u32,
    /// Infantry of any kind.
    pub infantry: u32,
    /// Turrets and armed structures.
    pub fortified: u32,
    /// Every visible unit.
    pub total: u32,
}

impl Composition {
    /// Whether at least a third of the force is airborne.
    #[must_use]
    pub const fn air_heavy(&self) -> bool {
        self.air > 0 && self.air * 3 >= self.total
    }

    /// Whether at least a third of the force is armor.
    #[must_use]
    pub const fn armor_heavy(&self) -> bool {
        self.armor > 0 && self.armor * 3 >= self.total
    }

    /// Whether at least half of the force is infantry.
    #[must_use]
    pub const fn infantry_heavy(&self) -> bool {
        self.infantry > 0 && self.infantry * 2 >= self.total
    }
}

/// Count what the player currently fields. Stealth units are not seen.
#[must_use]
pub fn assess(world: &World) -> Composition {
    let mut composition = Composition::default();
    for unit in world.units(Team::Player).iter().filter(|u| u.is_alive()) {
        let archetype = &unit.archetype;
        if archetype.stealth {
            continue;
        }
        if archetype.behavior == BehaviorKind::Turret {
            composition.fortified += 1;
            continue;
        }
        composition.total += 1;
        if archetype.is_air() || archetype.category == UnitCategory::Drone {
            composition.air += 1;
        } else if archetype.category.is_armor() {
            composition.armor += 1;
        } else if archetype.category.is_infantry() {
            composition.infantry += 1;
        }
    }
    composition.fortified += world
        .buildings
        .iter()
        .filter(|b| b.body.team == Team::Player && !b.body.is_dead() && b.archetype.weapon.is_some())
        .count() as u32;
    composition
}

/// Best point to strike and how many units it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster {
    /// Strike point, the position of the best-covered unit.
    pub center: Vec2Fixed,
    /// Units within [`CLUSTER_RADIUS`] of it.
    pub count: u32,
}

/// Find the player unit position with the most player ground units nearby.
///
/// Ties keep the earliest unit. Returns `None` when nothing is targetable.
#[must_use]
pub fn best_cluster(world: &World) -> Option<Cluster> {
    let radius = Fixed::from_num(CLUSTER_RADIUS);
    let positions: Vec<Vec2Fixed> = world
        .units(Team::Player)
        .iter()
        .filter(|u| u.is_alive() && !u.archetype.invulnerable && !u.archetype.is_air())
        .map(|u| u.position())
        .collect();

    let mut best: Option<Cluster> = None;
    for &center in &positions {
        let count = positions.iter().filter(|p| center.within(**p, radius)).count() as u32;
        if best.map_or(true, |b| count > b.count) {
            best = Some(Cluster { center, count });
        }
    }
    best
}

/// Position of the player's first armed structure, if any.
#[must_use]
pub fn fortified_position(world: &World) -> Option<Vec2Fixed> {
    world
        .buildings
        .iter()
        .find(|b| b.body.team == Team::Player && !b.body.is_dead() && b.archetype.weapon.is_some())
        .map(|b| b.body.position)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::Catalog;

    fn world() -> World {
        World::empty(Arc::new(Catalog::standard()), 1)
    }

    #[test]
    fn test_composition_counts_roles() {
        let mut world = world();
        for key in ["tank", "tank", "infantry", "attack_heli", "specter", "sentry_gun"] {
            world.spawn_unit(Team::Player, key, Vec2Fixed::ZERO);
        }
        world.spawn_building(Team::Player, "bunker", Vec2Fixed::ZERO, true);

        let composition = assess(&world);
        assert_eq!(composition.total, 4);
        assert_eq!(composition.armor, 2);
        assert_eq!(composition.infantry, 1);
        assert_eq!(composition.air, 1);
        assert_eq!(composition.fortified, 2);
        assert!(composition.armor_heavy());
        assert!(!composition.infantry_heavy());
    }

    #[test]
    fn test_best_cluster_picks_densest_group() {
        let mut world = world();
        world.spawn_unit(Team::Player, "infantry", Vec2Fixed::from_ints(100, 200));
        for dx in 0..4 {
            world.spawn_unit(Team::Player, "infantry", Vec2Fixed::from_ints(1000 + dx * 20, 200));
        }

        let cluster = best_cluster(&world).expect("cluster");
        assert_eq!(cluster.count, 4);
        assert!(cluster.center.x >= Fixed::from_num(1000));
    }

    #[test]
    fn test_no_cluster_without_units() {
        assert_eq!(best_cluster(&world()), None);
    }
}
