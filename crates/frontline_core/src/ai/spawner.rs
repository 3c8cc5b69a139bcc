//! Timer-gated production decisions for the AI side.
//!
//! Every interval the spawner scores each affordable roster entry against
//! the player's composition and picks one by weighted roll. Higher
//! difficulty adds more weight to hard counters.

use std::sync::Arc;

use rand::Rng;

use super::analysis::Composition;
use super::difficulty::DifficultyProfile;
use crate::catalog::{UnitArchetype, UnitCategory};
use crate::components::Team;
use crate::economy::ProductionReceipt;
use crate::math::Fixed;
use crate::world::World;

/// Base weight of every eligible roster entry.
const BASE_WEIGHT: u32 = 20;

/// Production timer for the AI side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawner {
    timer: u32,
}

impl Spawner {
    /// Start with a full interval.
    #[must_use]
    pub fn new(profile: &DifficultyProfile) -> Self {
        Self {
            timer: profile.spawn_interval,
        }
    }

    /// Ticks until the next decision.
    #[must_use]
    pub fn timer(&self) -> u32 {
        self.timer
    }

    /// Count down and, when due, order one unit. Returns the key ordered.
    pub fn update(
        &mut self,
        world: &mut World,
        profile: &DifficultyProfile,
        composition: &Composition,
    ) -> Option<String> {
        self.timer = self.timer.saturating_sub(1);
        if self.timer > 0 {
            return None;
        }
        self.timer = next_interval(world, profile);

        let candidates = score_roster(world, profile, composition);
        let archetype = weighted_pick(world, &candidates)?;

        match world.enemy_economy.request_production(&archetype) {
            Ok(ProductionReceipt::Queued { key }) => {
                tracing::debug!(tick = world.tick, unit = %key, "AI ordered unit");
                Some(key)
            }
            Ok(ProductionReceipt::AwaitingTarget { key, .. }) => {
                // Roster never holds abilities; disarm anything that slipped in.
                match world.enemy_economy.cancel_designation() {
                    Ok(_) => tracing::warn!(unit = %key, "AI roster entry is an ability, refunded"),
                    Err(reason) => {
                        tracing::warn!(unit = %key, %reason, "AI could not disarm ability entry");
                    }
                }
                None
            }
            Err(reason) => {
                tracing::debug!(tick = world.tick, %reason, "AI production declined");
                None
            }
        }
    }
}

/// Decision interval, shortened when the player heavily outnumbers the AI.
fn next_interval(world: &World, profile: &DifficultyProfile) -> u32 {
    let players = world.units(Team::Player).len() as u32;
    let enemies = world.units(Team::Enemy).len() as u32;
    if players * 2 > enemies * 3 + 4 {
        (profile.spawn_interval * 3 / 5).max(1)
    } else {
        profile.spawn_interval
    }
}

fn counter_weight(archetype: &UnitArchetype, composition: &Composition, bias: u32) -> u32 {
    let category = archetype.category;
    let mut weight = BASE_WEIGHT;
    if composition.air_heavy() && archetype.anti_air {
        weight += bias;
    }
    if composition.armor_heavy() && matches!(category, UnitCategory::AntiArmor | UnitCategory::Tank) {
        weight += bias;
    }
    if composition.infantry_heavy()
        && (archetype.splash_radius > Fixed::ZERO || category == UnitCategory::LightVehicle)
    {
        weight += bias / 2;
    }
    if composition.fortified > 0 && category == UnitCategory::Artillery {
        weight += bias / 2;
    }
    weight
}

fn score_roster(
    world: &World,
    profile: &DifficultyProfile,
    composition: &Composition,
) -> Vec<(Arc<UnitArchetype>, u32)> {
    let economy = &world.enemy_economy;
    profile
        .roster
        .iter()
        .filter_map(|key| world.catalog().unit(key).ok())
        .filter(|a| {
            economy.stock(&a.key) > 0
                && economy.cooldown(&a.key) == 0
                && economy.supply() >= Fixed::from_num(a.cost)
        })
        .map(|a| {
            let weight = counter_weight(&a, composition, profile.counter_bias);
            (a, weight)
        })
        .collect()
}

fn weighted_pick(
    world: &mut World,
    candidates: &[(Arc<UnitArchetype>, u32)],
) -> Option<Arc<UnitArchetype>> {
    let total: u32 = candidates.iter().map(|(_, w)| w).sum();
    if total == 0 {
        return None;
    }
    let mut roll = world.rng().gen_range(0..total);
    for (archetype, weight) in candidates {
        if roll < *weight {
            return Some(Arc::clone(archetype));
        }
        roll -= weight;
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ai::analysis::assess;
    use crate::ai::difficulty::{profile, Difficulty};
    use crate::catalog::Catalog;
    use crate::math::Vec2Fixed;

    fn world() -> World {
        World::empty(Arc::new(Catalog::standard()), 11)
    }

    #[test]
    fn test_orders_once_per_interval() {
        let mut world = world();
        let profile = profile(Difficulty::Recruit);
        let mut spawner = Spawner::new(&profile);
        let composition = Composition::default();

        let mut ordered = Vec::new();
        for _ in 0..profile.spawn_interval {
            if let Some(key) = spawner.update(&mut world, &profile, &composition) {
                ordered.push(key);
            }
        }
        assert_eq!(ordered.len(), 1);
        assert!(profile.roster.contains(&ordered[0].as_str()));
        assert_eq!(world.enemy_economy.queue().count(), 1);
        assert_eq!(spawner.timer(), profile.spawn_interval);
    }

    #[test]
    fn test_outnumbered_shortens_interval() {
        let mut world = world();
        for i in 0..10 {
            world.spawn_unit(Team::Player, "infantry", Vec2Fixed::from_ints(i * 10, 0));
        }
        let profile = profile(Difficulty::Veteran);
        assert_eq!(next_interval(&world, &profile), profile.spawn_interval * 3 / 5);
    }

    #[test]
    fn test_counter_bias_favors_anti_air_against_air() {
        let mut world = world();
        for _ in 0..3 {
            world.spawn_unit(Team::Player, "attack_heli", Vec2Fixed::ZERO);
        }
        let composition = assess(&world);
        let catalog = Catalog::standard();
        let jeep = catalog.unit("aa_jeep").expect("aa_jeep");
        let tank = catalog.unit("tank").expect("tank");
        assert!(counter_weight(&jeep, &composition, 100) > counter_weight(&tank, &composition, 100));
        assert_eq!(counter_weight(&jeep, &composition, 0), BASE_WEIGHT);
    }

    #[test]
    fn test_no_order_when_broke() {
        let mut world = world();
        world.enemy_economy.set_supply(Fixed::ZERO);
        let profile = profile(Difficulty::Elite);
        let mut spawner = Spawner::new(&profile);
        for _ in 0..profile.spawn_interval {
            assert_eq!(spawner.update(&mut world, &profile, &Composition::default()), None);
        }
        assert_eq!(world.enemy_economy.queue().count(), 0);
    }

    #[test]
    fn test_ability_in_roster_is_refunded() {
        let mut world = world();
        let mut profile = profile(Difficulty::Recruit);
        profile.roster = &["airstrike"];
        let supply = world.enemy_economy.supply();
        let stock = world.enemy_economy.stock("airstrike");
        assert!(stock > 0);
        let mut spawner = Spawner::new(&profile);

        for _ in 0..profile.spawn_interval {
            assert_eq!(spawner.update(&mut world, &profile, &Composition::default()), None);
        }
        assert!(world.enemy_economy.pending_designation().is_none());
        assert_eq!(world.enemy_economy.supply(), supply);
        assert_eq!(world.enemy_economy.stock("airstrike"), stock);
        assert_eq!(world.enemy_economy.queue().count(), 0);
    }
}
