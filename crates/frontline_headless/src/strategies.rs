//! Scripted player strategies for headless playtesting.
//!
//! A strategy is a build order followed by a repeating production cycle,
//! plus attack timing and a regroup rule. The [`ScriptedPlayer`] drives a
//! [`Simulation`] through the same public calls a human player would make:
//! production requests, ability designation, construction with engineers
//! and unit commands.

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use frontline_core::commands::{selectable_units, UnitCommand};
use frontline_core::components::{EntityId, Team};
use frontline_core::economy::ProductionReceipt;
use frontline_core::error::ProductionError;
use frontline_core::math::{Fixed, Vec2Fixed};
use frontline_core::simulation::Simulation;
use frontline_core::units::{BehaviorState, BuilderTask};
use frontline_core::world::World;

use crate::config::HeadlessError;

/// Ticks between scripted decisions.
pub const DECISION_INTERVAL: u64 = 30;

/// Distance in front of the headquarters where structures go.
const BUILD_OFFSET: i32 = 420;

/// Built-in strategy presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Mixed army, one forward bunker, abilities on the front line.
    #[default]
    Balanced,
    /// Cheap infantry early and constant pressure.
    Rush,
    /// Fortify, expand supply, then push late.
    Turtle,
}

impl StrategyKind {
    /// All presets.
    pub const ALL: [Self; 3] = [Self::Balanced, Self::Rush, Self::Turtle];

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Rush => "rush",
            Self::Turtle => "turtle",
        }
    }

    /// The preset's strategy.
    #[must_use]
    pub fn strategy(self) -> Strategy {
        match self {
            Self::Balanced => Strategy::balanced(),
            Self::Rush => Strategy::rush(),
            Self::Turtle => Strategy::turtle(),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown strategy '{s}' (expected balanced, rush or turtle)"))
    }
}

/// A single item in a build order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildOrderItem {
    /// Produce a unit.
    Unit(String),
    /// Have an engineer construct a building.
    Building(String),
    /// Buy a targeted ability and use it on the front line.
    Ability(String),
    /// Wait until supply reaches an amount.
    WaitForSupply(u32),
    /// Wait for a certain number of a unit type.
    WaitForUnits(String, u32),
    /// Wait for a specific tick.
    WaitForTick(u64),
}

/// A complete scripted strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Strategy name.
    pub name: String,
    /// Opening build order.
    pub build_order: Vec<BuildOrderItem>,
    /// Production cycle repeated once the build order is done.
    pub cycle: Vec<String>,
    /// Tick of the first attack order.
    pub attack_timing: u64,
    /// Ticks between attack orders.
    pub attack_interval: u64,
    /// Pull the army home when it shrinks below this many units.
    pub regroup_below: usize,
}

impl Strategy {
    /// Load a strategy from a RON file.
    pub fn load(path: &Path) -> Result<Self, HeadlessError> {
        let text = std::fs::read_to_string(path).map_err(|source| HeadlessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|source| HeadlessError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Mixed army with a forward bunker and ability support.
    #[must_use]
    pub fn balanced() -> Self {
        use BuildOrderItem::{Ability, Building, Unit, WaitForSupply, WaitForUnits};
        Self {
            name: "Balanced".to_string(),
            build_order: vec![
                Unit("infantry".to_string()),
                Unit("engineer".to_string()),
                Unit("rocket_infantry".to_string()),
                WaitForUnits("engineer".to_string(), 1),
                WaitForSupply(80),
                Building("bunker".to_string()),
                Unit("tank".to_string()),
                Unit("aa_jeep".to_string()),
                WaitForSupply(90),
                Ability("guided_missile".to_string()),
            ],
            cycle: vec![
                "infantry".to_string(),
                "tank".to_string(),
                "rocket_infantry".to_string(),
                "aa_jeep".to_string(),
                "infantry".to_string(),
                "artillery".to_string(),
            ],
            attack_timing: 5400,
            attack_interval: 2400,
            regroup_below: 3,
        }
    }

    /// Early infantry pressure with an airstrike.
    #[must_use]
    pub fn rush() -> Self {
        use BuildOrderItem::{Ability, Unit, WaitForSupply, WaitForUnits};
        Self {
            name: "Rush".to_string(),
            build_order: vec![
                Unit("infantry".to_string()),
                Unit("infantry".to_string()),
                Unit("infantry".to_string()),
                Unit("rocket_infantry".to_string()),
                WaitForUnits("infantry".to_string(), 3),
                WaitForSupply(90),
                Ability("airstrike".to_string()),
            ],
            cycle: vec![
                "infantry".to_string(),
                "infantry".to_string(),
                "aa_jeep".to_string(),
            ],
            attack_timing: 1800,
            attack_interval: 900,
            regroup_below: 0,
        }
    }

    /// Fortify first, raise the supply cap, then push with heavy units.
    #[must_use]
    pub fn turtle() -> Self {
        use BuildOrderItem::{Ability, Building, Unit, WaitForSupply, WaitForTick, WaitForUnits};
        Self {
            name: "Turtle".to_string(),
            build_order: vec![
                Unit("engineer".to_string()),
                Unit("engineer".to_string()),
                WaitForUnits("engineer".to_string(), 2),
                Building("bunker".to_string()),
                WaitForSupply(100),
                Building("logistics_center".to_string()),
                WaitForSupply(100),
                Building("aa_site".to_string()),
                WaitForTick(7200),
                Ability("guided_missile".to_string()),
            ],
            cycle: vec![
                "tank".to_string(),
                "artillery".to_string(),
                "rocket_infantry".to_string(),
                "aa_jeep".to_string(),
            ],
            attack_timing: 14_400,
            attack_interval: 3600,
            regroup_below: 5,
        }
    }
}

/// Runtime state for executing a strategy against a simulation.
#[derive(Debug, Clone)]
pub struct ScriptedPlayer {
    strategy: Strategy,
    build_queue: VecDeque<BuildOrderItem>,
    cycle_index: usize,
    next_attack: u64,
    regrouping: bool,
    structures: usize,
    declined: u32,
}

impl ScriptedPlayer {
    /// Create a player for a strategy.
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self {
            build_queue: strategy.build_order.iter().cloned().collect(),
            cycle_index: 0,
            next_attack: strategy.attack_timing,
            regrouping: false,
            structures: 0,
            declined: 0,
            strategy,
        }
    }

    /// Strategy being executed.
    #[must_use]
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Build order items not yet completed.
    #[must_use]
    pub fn remaining_build_order(&self) -> usize {
        self.build_queue.len()
    }

    /// Requests the simulation declined so far.
    #[must_use]
    pub fn declined(&self) -> u32 {
        self.declined
    }

    /// Act for the current tick. Decisions happen every [`DECISION_INTERVAL`].
    pub fn act(&mut self, sim: &mut Simulation) {
        let tick = sim.world().tick;
        if tick % DECISION_INTERVAL != 0 || sim.world().is_over() {
            return;
        }
        self.advance_build_order(sim, tick);
        self.command_army(sim, tick);
    }

    fn advance_build_order(&mut self, sim: &mut Simulation, tick: u64) {
        let Some(item) = self.build_queue.front().cloned() else {
            self.run_cycle(sim);
            return;
        };

        let done = match &item {
            BuildOrderItem::Unit(key) => self.produce(sim, key),
            BuildOrderItem::Building(key) => self.construct(sim, key),
            BuildOrderItem::Ability(key) => self.use_ability(sim, key),
            BuildOrderItem::WaitForSupply(amount) => {
                sim.world().player_economy.whole_supply() >= *amount
            }
            BuildOrderItem::WaitForUnits(key, count) => {
                let have = sim
                    .world()
                    .players
                    .iter()
                    .filter(|u| u.archetype.key == *key)
                    .count();
                have >= *count as usize
            }
            BuildOrderItem::WaitForTick(at) => tick >= *at,
        };

        if done {
            tracing::debug!(tick, ?item, "Build order step done");
            self.build_queue.pop_front();
        }
    }

    fn run_cycle(&mut self, sim: &mut Simulation) {
        if self.strategy.cycle.is_empty() {
            return;
        }
        let key = self.strategy.cycle[self.cycle_index % self.strategy.cycle.len()].clone();
        if self.produce(sim, &key) {
            self.cycle_index += 1;
        }
    }

    /// Returns true once the step should be dropped from the queue.
    fn produce(&mut self, sim: &mut Simulation, key: &str) -> bool {
        match sim.request_production(key) {
            Ok(_) => true,
            Err(reason) => self.declined_is_final(&reason),
        }
    }

    fn declined_is_final(&mut self, reason: &ProductionError) -> bool {
        self.declined += 1;
        matches!(
            reason,
            ProductionError::OutOfStock { .. }
                | ProductionError::UniqueAlreadyBuilt { .. }
                | ProductionError::UnknownBuilding(_)
                | ProductionError::MatchOver
        )
    }

    fn construct(&mut self, sim: &mut Simulation, key: &str) -> bool {
        let Some(worker) = idle_engineer(sim.world()) else {
            if !has_engineer(sim.world()) {
                self.produce(sim, "engineer");
            }
            return false;
        };
        let site = build_site(sim.world(), self.structures);
        match sim.request_construction(worker, key, site) {
            Ok(()) => {
                self.structures += 1;
                true
            }
            Err(reason) => self.declined_is_final(&reason),
        }
    }

    fn use_ability(&mut self, sim: &mut Simulation, key: &str) -> bool {
        let Some(target) = strike_point(sim.world()) else {
            return false;
        };
        match sim.request_production(key) {
            Ok(ProductionReceipt::AwaitingTarget { .. }) => {
                if let Err(reason) = sim.designate(target) {
                    tracing::warn!(%reason, "Designation failed");
                    let _ = sim.cancel_designation();
                }
                true
            }
            Ok(ProductionReceipt::Queued { .. }) => true,
            Err(reason) => self.declined_is_final(&reason),
        }
    }

    fn command_army(&mut self, sim: &mut Simulation, tick: u64) {
        let army: Vec<EntityId> = selectable_units(sim.world(), Team::Player)
            .into_iter()
            .filter(|&id| {
                sim.world()
                    .unit(id)
                    .is_some_and(|u| !matches!(u.behavior, BehaviorState::Builder(_)))
            })
            .collect();

        if !self.regrouping && tick >= self.strategy.attack_timing && army.len() < self.strategy.regroup_below {
            self.regrouping = true;
            let n = sim.issue_command(&army, UnitCommand::Retreat);
            tracing::debug!(tick, units = n, "Regrouping");
            return;
        }

        if tick >= self.next_attack {
            self.next_attack = tick + self.strategy.attack_interval;
            if army.len() >= self.strategy.regroup_below {
                self.regrouping = false;
                let n = sim.issue_command(&army, UnitCommand::Attack(None));
                tracing::debug!(tick, units = n, "Attack ordered");
            }
        }
    }
}

fn is_engineer(behavior: &BehaviorState) -> bool {
    matches!(behavior, BehaviorState::Builder(_))
}

fn has_engineer(world: &World) -> bool {
    world
        .players
        .iter()
        .any(|u| u.is_alive() && is_engineer(&u.behavior))
}

fn idle_engineer(world: &World) -> Option<EntityId> {
    world
        .players
        .iter()
        .find(|u| u.is_alive() && u.behavior == BehaviorState::Builder(BuilderTask::Idle))
        .map(|u| u.id())
}

/// Spread structures along the lane in front of the base.
fn build_site(world: &World, slot: usize) -> Vec2Fixed {
    let base = world.base_anchor(Team::Player);
    let lane = world.tunables().lane_height;
    let lanes = 3;
    let row = (slot % lanes) as i32 - 1;
    Vec2Fixed::new(
        base.x + Fixed::from_num(BUILD_OFFSET),
        base.y + lane / Fixed::from_num(4) * Fixed::from_num(row),
    )
}

/// Frontmost visible enemy unit, else the nearest enemy building.
fn strike_point(world: &World) -> Option<Vec2Fixed> {
    let units = world
        .enemies
        .iter()
        .filter(|u| u.is_alive() && !u.archetype.stealth)
        .map(|u| u.position());
    let buildings = world
        .buildings
        .iter()
        .filter(|b| b.body.team == Team::Enemy && !b.body.is_dead())
        .map(|b| b.body.position);
    units
        .min_by_key(|p| p.x)
        .or_else(|| buildings.min_by_key(|p| p.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontline_core::ai::Difficulty;
    use frontline_test_utils::fixtures::standard_simulation;

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!("RUSH".parse::<StrategyKind>(), Ok(StrategyKind::Rush));
        assert_eq!(StrategyKind::Turtle.to_string(), "turtle");
        assert!("zerg".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_strategy_from_ron() {
        let text = ron::ser::to_string(&Strategy::rush()).expect("serialize");
        let strategy: Strategy = ron::from_str(&text).expect("parse");
        assert_eq!(strategy, Strategy::rush());
    }

    #[test]
    fn test_rush_orders_infantry_first() {
        let mut sim = standard_simulation(1, Difficulty::Recruit);
        let mut player = ScriptedPlayer::new(Strategy::rush());
        for _ in 0..DECISION_INTERVAL {
            sim.tick();
        }
        player.act(&mut sim);
        assert_eq!(player.remaining_build_order(), Strategy::rush().build_order.len() - 1);
        assert_eq!(sim.world().player_economy.stock("infantry"), 29);
    }

    #[test]
    fn test_turtle_gets_an_engineer_building() {
        let mut sim = standard_simulation(2, Difficulty::Recruit);
        let mut player = ScriptedPlayer::new(Strategy::turtle());
        let mut started = false;
        for _ in 0..3600 {
            sim.tick();
            player.act(&mut sim);
            started |= sim
                .world()
                .buildings
                .iter()
                .any(|b| b.body.team == Team::Player && b.archetype.key == "bunker");
            if started {
                break;
            }
        }
        assert!(started, "turtle never placed its bunker");
    }

    #[test]
    fn test_strike_point_prefers_front_enemy() {
        let mut sim = standard_simulation(3, Difficulty::Recruit);
        let world = sim.world_mut();
        world.spawn_unit(Team::Enemy, "infantry", Vec2Fixed::from_ints(1500, 200));
        world.spawn_unit(Team::Enemy, "infantry", Vec2Fixed::from_ints(1000, 150));
        assert_eq!(strike_point(sim.world()), Some(Vec2Fixed::from_ints(1000, 150)));
    }
}
