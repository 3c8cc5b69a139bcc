//! Test fixtures and helpers.
//!
//! Pre-built worlds, simulations and scenario descriptions for consistent
//! testing.

use std::sync::Arc;

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

use frontline_core::ai::Difficulty;
use frontline_core::catalog::Catalog;
use frontline_core::components::{EntityId, Team};
use frontline_core::math::Vec2Fixed;
use frontline_core::simulation::{MatchConfig, Simulation};
use frontline_core::world::World;

/// Seed used by fixtures that do not care about randomness.
pub const DEFAULT_SEED: u64 = 0x5EED;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Point from integer coordinates.
#[must_use]
pub fn point(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Shared handle to the built-in catalog.
#[must_use]
pub fn standard_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::standard())
}

/// A world with economies but no entities.
#[must_use]
pub fn empty_world() -> World {
    World::empty(standard_catalog(), DEFAULT_SEED)
}

/// A world with both bases laid out.
#[must_use]
pub fn base_world(seed: u64) -> World {
    World::new(standard_catalog(), seed)
}

/// A simulation on the standard layout.
#[must_use]
pub fn standard_simulation(seed: u64, difficulty: Difficulty) -> Simulation {
    Simulation::standard(&MatchConfig {
        seed,
        difficulty,
        ..MatchConfig::default()
    })
}

/// A simulation on an empty field with no AI headquarters, so the
/// controller stays idle. Useful for isolated combat scenarios.
#[must_use]
pub fn sandbox_simulation(seed: u64) -> Simulation {
    let config = MatchConfig {
        seed,
        ..MatchConfig::default()
    };
    Simulation::from_world(World::empty(standard_catalog(), seed), &config)
}

/// Spawn `count` units of `key` in a column starting at `origin`.
pub fn spawn_column(world: &mut World, team: Team, key: &str, count: u32, origin: Vec2Fixed) -> Vec<EntityId> {
    (0..count)
        .map(|i| {
            let y = origin.y + fixed(i as i32 * 12);
            world.spawn_unit(team, key, Vec2Fixed::new(origin.x, y))
        })
        .collect()
}

/// One unit placement in a [`Scenario`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Owner.
    pub team: Team,
    /// Archetype key.
    pub key: String,
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
}

/// Declarative battle setup, loadable from RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// RNG seed.
    pub seed: u64,
    /// Opponent strength.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Start from the standard base layout instead of an empty field.
    #[serde(default)]
    pub with_bases: bool,
    /// Units placed at start.
    #[serde(default)]
    pub units: Vec<Placement>,
}

impl Scenario {
    /// Parse a scenario from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Build the simulation this scenario describes.
    #[must_use]
    pub fn build(&self) -> Simulation {
        let catalog = standard_catalog();
        let mut world = if self.with_bases {
            World::new(catalog, self.seed)
        } else {
            World::empty(catalog, self.seed)
        };
        for placement in &self.units {
            world.spawn_unit(placement.team, &placement.key, point(placement.x, placement.y));
        }
        tracing::debug!(seed = self.seed, units = self.units.len(), "Scenario built");
        Simulation::from_world(
            world,
            &MatchConfig {
                seed: self.seed,
                difficulty: self.difficulty,
                ..MatchConfig::default()
            },
        )
    }
}

/// A mid-sized skirmish on the standard layout, used by determinism tests
/// and benchmarks.
#[must_use]
pub fn skirmish(seed: u64) -> Simulation {
    let mut sim = standard_simulation(seed, Difficulty::Elite);
    let world = sim.world_mut();
    spawn_column(world, Team::Player, "infantry", 8, point(900, 120));
    spawn_column(world, Team::Player, "tank", 3, point(850, 150));
    spawn_column(world, Team::Player, "aa_jeep", 2, point(820, 200));
    spawn_column(world, Team::Enemy, "infantry", 8, point(2300, 120));
    spawn_column(world, Team::Enemy, "apc", 2, point(2350, 180));
    spawn_column(world, Team::Enemy, "artillery", 2, point(2500, 200));
    sim
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_from_ron() {
        let scenario = Scenario::from_ron(
            r#"(
                seed: 3,
                units: [
                    (team: Player, key: "tank", x: 100, y: 200),
                    (team: Enemy, key: "infantry", x: 300, y: 200),
                ],
            )"#,
        )
        .expect("valid scenario");
        assert_eq!(scenario.difficulty, Difficulty::Veteran);

        let sim = scenario.build();
        assert_eq!(sim.world().players.len(), 1);
        assert_eq!(sim.world().enemies.len(), 1);
        assert!(sim.world().buildings.is_empty());
    }

    #[test]
    fn test_spawn_column_spacing() {
        let mut world = empty_world();
        let ids = spawn_column(&mut world, Team::Player, "infantry", 3, point(10, 10));
        assert_eq!(ids.len(), 3);
        let last = world.unit(ids[2]).expect("spawned");
        assert_eq!(last.position(), point(10, 34));
    }
}
