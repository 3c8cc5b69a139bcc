//! Core simulation loop.
//!
//! [`Simulation`] owns the [`World`] and the [`AiController`] and advances
//! them one logical tick at a time. Display frames map onto ticks through
//! the speed multiplier: half speed runs a tick on even engine frames only,
//! normal speed one tick per frame, double speed two.
//!
//! # Tick order
//!
//! 1. Regenerate supply for both sides.
//! 2. Deploy queued units whose delay elapsed.
//! 3. Count down unit, building and production timers.
//! 4. Run deferred actions due this tick.
//! 5. Update buildings, player units, enemy units, projectiles, effects.
//! 6. Remove dead entities.
//! 7. Clamp invariants.
//! 8. Decide the match if a headquarters fell.
//! 9. Let the AI think.
//!
//! A failing entity update or AI cycle is logged and skipped; the rest of
//! the tick still runs.
//!
//! # Example
//!
//! ```
//! use frontline_core::simulation::{MatchConfig, Simulation};
//!
//! let mut sim = Simulation::standard(&MatchConfig::default());
//! sim.request_production("infantry").expect("affordable");
//! for _ in 0..120 {
//!     sim.tick();
//! }
//! assert!(!sim.world().players.is_empty());
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::weapons::launch_guided_missile;
use crate::ai::{AiController, Difficulty};
use crate::behavior::update_unit;
use crate::buildings::update_building;
use crate::catalog::{AbilityKind, Catalog};
use crate::combat::{deliver_area, TargetIndex};
use crate::commands::{issue_command, UnitCommand};
use crate::components::{EntityId, Team};
use crate::construction::request_construction;
use crate::economy::{drain_production_queues, PendingDesignation, ProductionReceipt};
use crate::effects::{
    EffectKind, ExplosionClass, FxCue, FxSink, Notice, NoticeLevel, Notifier, SimEvent,
};
use crate::error::{GameError, ProductionError};
use crate::math::{Fixed, Vec2Fixed};
use crate::projectiles::{detonate, update_projectile, Payload};
use crate::scheduler::ScheduledAction;
use crate::units::BehaviorState;
use crate::world::{MatchOutcome, World};

/// Logical ticks per second at normal speed.
pub const TICK_RATE: u32 = 60;

/// Speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameSpeed {
    /// 0.5x: a tick every other frame.
    Half,
    /// 1x: a tick per frame.
    #[default]
    Normal,
    /// 2x: two ticks per frame.
    Double,
}

impl GameSpeed {
    /// Ticks to run on engine frame `frame`.
    #[must_use]
    pub const fn ticks_for_frame(self, frame: u64) -> u32 {
        match self {
            Self::Half => {
                if frame % 2 == 0 {
                    1
                } else {
                    0
                }
            }
            Self::Normal => 1,
            Self::Double => 2,
        }
    }
}

/// Match setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchConfig {
    /// RNG seed.
    pub seed: u64,
    /// Opponent strength.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Initial speed.
    #[serde(default)]
    pub speed: GameSpeed,
}

/// Summary of one logical tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number after the update.
    pub tick: u64,
    /// Units that entered play.
    pub spawned: u32,
    /// Units destroyed in combat.
    pub deaths: u32,
    /// Damage dealt by both sides.
    pub damage: u64,
    /// Everything that happened, in order.
    pub events: Vec<SimEvent>,
}

/// The simulation context for one match.
pub struct Simulation {
    world: World,
    ai: AiController,
    speed: GameSpeed,
    engine_frame: u64,
    paused: bool,
    fx: Option<Box<dyn FxSink>>,
    notifier: Option<Box<dyn Notifier>>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.world.tick)
            .field("speed", &self.speed)
            .field("engine_frame", &self.engine_frame)
            .field("paused", &self.paused)
            .field("outcome", &self.world.outcome)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Start a match with the standard base layout.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: &MatchConfig) -> Self {
        Self::from_world(World::new(catalog, config.seed), config)
    }

    /// Start a match on the built-in catalog.
    #[must_use]
    pub fn standard(config: &MatchConfig) -> Self {
        Self::new(Arc::new(Catalog::standard()), config)
    }

    /// Run a prepared world.
    #[must_use]
    pub fn from_world(world: World, config: &MatchConfig) -> Self {
        tracing::info!(
            seed = config.seed,
            difficulty = %config.difficulty,
            speed = ?config.speed,
            "Match started"
        );
        Self {
            world,
            ai: AiController::new(config.difficulty),
            speed: config.speed,
            engine_frame: 0,
            paused: false,
            fx: None,
            notifier: None,
        }
    }

    /// Attach a play-effect sink.
    pub fn set_fx_sink(&mut self, sink: Box<dyn FxSink>) {
        self.fx = Some(sink);
    }

    /// Attach a notice sink.
    pub fn set_notifier(&mut self, notifier: Box<dyn Notifier>) {
        self.notifier = Some(notifier);
    }

    /// Match state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable match state, for scenario setup.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The AI controller.
    #[must_use]
    pub fn ai(&self) -> &AiController {
        &self.ai
    }

    /// Current speed.
    #[must_use]
    pub fn speed(&self) -> GameSpeed {
        self.speed
    }

    /// Change speed. Takes effect on the next frame.
    pub fn set_speed(&mut self, speed: GameSpeed) {
        self.speed = speed;
    }

    /// Stop issuing ticks. Deferred actions keep their logical trigger ticks.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume issuing ticks.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether ticks are suspended.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// How the match ended, if it has.
    #[must_use]
    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.world.outcome
    }

    /// Engine frames delivered so far.
    #[must_use]
    pub fn engine_frame(&self) -> u64 {
        self.engine_frame
    }

    /// Deterministic hash of the match state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.world.state_hash()
    }

    /// Handle one display frame: run zero, one or two ticks.
    pub fn frame(&mut self) -> Vec<TickReport> {
        let frame = self.engine_frame;
        self.engine_frame += 1;
        if self.paused || self.world.is_over() {
            return Vec::new();
        }
        (0..self.speed.ticks_for_frame(frame))
            .map(|_| self.tick())
            .collect()
    }

    /// Run one logical tick.
    pub fn tick(&mut self) -> TickReport {
        if self.world.is_over() {
            return TickReport {
                tick: self.world.tick,
                ..TickReport::default()
            };
        }
        let damage_before = self.world.stats.player_damage_dealt + self.world.stats.enemy_damage_dealt;

        self.world.tick += 1;
        self.world.player_economy.regenerate();
        self.world.enemy_economy.regenerate();

        drain_production_queues(&mut self.world);
        self.tick_timers();

        let mut index = TargetIndex::build(&self.world);
        self.run_scheduled(&mut index);
        self.update_entities(&mut index);

        self.world.filter_dead();
        self.world.clamp_invariants();
        #[cfg(feature = "debug-validation")]
        self.world.validate();

        self.decide_outcome();

        if let Err(err) = self.ai.think(&mut self.world) {
            tracing::error!(tick = self.world.tick, %err, "AI think cycle failed");
        }

        let events = self.world.take_events();
        self.dispatch(&events);

        let damage_after = self.world.stats.player_damage_dealt + self.world.stats.enemy_damage_dealt;
        let count = |pred: fn(&SimEvent) -> bool| events.iter().filter(|e| pred(e)).count() as u32;
        TickReport {
            tick: self.world.tick,
            spawned: count(|e| matches!(e, SimEvent::UnitSpawned { .. })),
            deaths: count(|e| matches!(e, SimEvent::UnitDestroyed { .. })),
            damage: damage_after - damage_before,
            events,
        }
    }

    fn tick_timers(&mut self) {
        let world = &mut self.world;
        for unit in world.players.iter_mut().chain(&mut world.enemies) {
            unit.tick_timers();
        }
        for building in &mut world.buildings {
            building.attack.tick();
        }
        world.player_economy.tick_cooldowns();
        world.enemy_economy.tick_cooldowns();
    }

    fn run_scheduled(&mut self, index: &mut TargetIndex) {
        let world = &mut self.world;
        for action in world.scheduler.drain_due(world.tick) {
            let result = match action {
                ScheduledAction::Detonation {
                    team,
                    center,
                    radius,
                    damage,
                } => deliver_area(world, index, team, center, radius, |_| damage).map(|hits| {
                    tracing::info!(tick = world.tick, hits, "Strike detonated");
                    world.emit_fx(FxCue::Explosion(ExplosionClass::Nuclear), center);
                    world.spawn_effect(EffectKind::Explosion(ExplosionClass::Nuclear), center);
                }),
                ScheduledAction::MissileImpact { projectile } => {
                    let found = world
                        .projectiles
                        .iter_mut()
                        .find(|p| p.id == projectile && !p.spent)
                        .map(|p| {
                            p.spent = true;
                            p.clone()
                        });
                    match found {
                        Some(missile) => {
                            detonate(world, index, &missile, None, missile.destination())
                        }
                        None => Err(GameError::EntityNotFound(projectile)),
                    }
                }
                ScheduledAction::Reinforcement {
                    team,
                    key,
                    position,
                } => {
                    world.spawn_unit(team, &key, position);
                    Ok(())
                }
            };
            if let Err(err) = result {
                tracing::error!(tick = world.tick, %err, "Scheduled action failed");
            }
        }
    }

    fn update_entities(&mut self, index: &mut TargetIndex) {
        let world = &mut self.world;

        // Buildings stay in place so turrets can hit hostile structures.
        for slot in 0..world.buildings.len() {
            let mut building = world.buildings[slot].clone();
            if let Err(err) = update_building(world, index, &mut building) {
                tracing::error!(tick = world.tick, building = building.body.id, %err, "Building update failed");
            }
            world.buildings[slot] = building;
        }

        for team in [Team::Player, Team::Enemy] {
            let mut units = std::mem::take(world.units_mut(team));
            for unit in &mut units {
                if let Err(err) = update_unit(world, index, unit) {
                    tracing::error!(tick = world.tick, unit = unit.id(), %err, "Unit update failed");
                }
                index.update_position(unit.id(), unit.position());
            }
            units.append(world.units_mut(team));
            *world.units_mut(team) = units;
        }
        world.flush_spawns();

        let mut projectiles = std::mem::take(&mut world.projectiles);
        for projectile in &mut projectiles {
            if let Err(err) = update_projectile(world, index, projectile) {
                tracing::error!(tick = world.tick, projectile = projectile.id, %err, "Projectile update failed");
            }
        }
        projectiles.append(&mut world.projectiles);
        world.projectiles = projectiles;

        world.update_effects();
    }

    fn decide_outcome(&mut self) {
        let mut player_hq_lost = false;
        let mut enemy_hq_lost = false;
        for event in self.world.events() {
            if let SimEvent::BuildingDestroyed {
                team,
                headquarters: true,
                ..
            } = event
            {
                match team {
                    Team::Player => player_hq_lost = true,
                    Team::Enemy => enemy_hq_lost = true,
                    Team::Neutral => {}
                }
            }
        }
        let outcome = match (player_hq_lost, enemy_hq_lost) {
            (true, true) => MatchOutcome::Draw,
            (true, false) => MatchOutcome::Defeat,
            (false, true) => MatchOutcome::Victory,
            (false, false) => return,
        };

        self.world.outcome = Some(outcome);
        let discarded = self.world.scheduler.len();
        self.world.scheduler.clear();
        self.world.push_event(SimEvent::MatchEnded(outcome));
        tracing::info!(tick = self.world.tick, ?outcome, discarded, "Match decided");
    }

    fn dispatch(&mut self, events: &[SimEvent]) {
        for event in events {
            if let (SimEvent::Fx { cue, position }, Some(fx)) = (event, self.fx.as_mut()) {
                fx.play(*cue, *position);
            }
            if let Some(notice) = notice_for(event) {
                self.notify(&notice);
            }
        }
    }

    fn notify(&mut self, notice: &Notice) {
        if let Some(notifier) = self.notifier.as_mut() {
            notifier.notify(notice);
        }
    }

    fn decline(&mut self, reason: &ProductionError) {
        tracing::debug!(tick = self.world.tick, %reason, "Request declined");
        self.notify(&Notice::new(NoticeLevel::Warning, reason.to_string()));
    }

    // ========================================================================
    // Player command surface
    // ========================================================================

    /// Order one unit or ability for the player.
    ///
    /// Unknown keys fall back to a placeholder archetype, which has no
    /// stock, so the request is declined rather than failing.
    pub fn request_production(&mut self, key: &str) -> std::result::Result<ProductionReceipt, ProductionError> {
        if self.world.is_over() {
            return Err(ProductionError::MatchOver);
        }
        let archetype = self.world.catalog().resolve_unit(key);
        match self.world.player_economy.request_production(&archetype) {
            Ok(receipt) => {
                let text = match &receipt {
                    ProductionReceipt::Queued { .. } => format!("{} queued", archetype.name),
                    ProductionReceipt::AwaitingTarget { .. } => {
                        format!("{} ready: designate a target", archetype.name)
                    }
                };
                tracing::debug!(tick = self.world.tick, unit = key, "Production accepted");
                self.notify(&Notice::new(NoticeLevel::Info, text));
                Ok(receipt)
            }
            Err(reason) => {
                self.decline(&reason);
                Err(reason)
            }
        }
    }

    /// Deliver the armed ability at `point`, clamped to the map.
    pub fn designate(&mut self, point: Vec2Fixed) -> std::result::Result<EntityId, ProductionError> {
        if self.world.is_over() {
            return Err(ProductionError::MatchOver);
        }
        let point = self.world.clamp_to_map(point);
        let pending = match self.world.player_economy.take_designation() {
            Ok(pending) => pending,
            Err(reason) => {
                self.decline(&reason);
                return Err(reason);
            }
        };
        let id = self.deliver_ability(&pending, point);
        self.notify(&Notice::new(
            NoticeLevel::Info,
            format!("{} inbound", pending.key),
        ));
        Ok(id)
    }

    fn deliver_ability(&mut self, pending: &PendingDesignation, point: Vec2Fixed) -> EntityId {
        let world = &mut self.world;
        let archetype = world.catalog().resolve_unit(&pending.key);
        match pending.ability {
            AbilityKind::Airstrike => {
                let edge = world.map_edge(Team::Player);
                let mut jet = world.make_unit(Team::Player, "strike_jet", Vec2Fixed::new(edge, point.y));
                jet.behavior = BehaviorState::Strike { destination: point };
                jet.locked = true;
                tracing::debug!(tick = world.tick, "Airstrike designated");
                world.insert_unit(jet)
            }
            AbilityKind::GuidedMissile => {
                let origin = world.base_position(Team::Player);
                let payload = Payload::Blast {
                    damage: archetype.damage,
                    radius: archetype.splash_radius,
                };
                tracing::debug!(tick = world.tick, "Guided missile launched");
                launch_guided_missile(world, Team::Player, origin, point, payload, archetype.projectile_speed)
            }
        }
    }

    /// Disarm the pending ability with a full refund.
    pub fn cancel_designation(&mut self) -> std::result::Result<PendingDesignation, ProductionError> {
        match self.world.player_economy.cancel_designation() {
            Ok(pending) => {
                self.notify(&Notice::new(
                    NoticeLevel::Info,
                    format!("{} cancelled", pending.key),
                ));
                Ok(pending)
            }
            Err(reason) => {
                self.decline(&reason);
                Err(reason)
            }
        }
    }

    /// Order player builder `worker` to construct `key` at `site`.
    pub fn request_construction(
        &mut self,
        worker: EntityId,
        key: &str,
        site: Vec2Fixed,
    ) -> std::result::Result<(), ProductionError> {
        if self.world.is_over() {
            return Err(ProductionError::MatchOver);
        }
        match request_construction(&mut self.world, Team::Player, worker, key, site) {
            Ok(()) => {
                self.notify(&Notice::new(NoticeLevel::Info, format!("Constructing {key}")));
                Ok(())
            }
            Err(reason) => {
                self.decline(&reason);
                Err(reason)
            }
        }
    }

    /// Give `command` to the listed player units. Returns how many took it.
    pub fn issue_command(&mut self, ids: &[EntityId], command: UnitCommand) -> usize {
        if self.world.is_over() {
            return 0;
        }
        issue_command(&mut self.world, Team::Player, ids, command)
    }

    /// Run ticks until the match ends or `max_ticks` have run.
    pub fn run_until_decided(&mut self, max_ticks: u64) -> Option<MatchOutcome> {
        for _ in 0..max_ticks {
            if self.world.is_over() {
                break;
            }
            self.tick();
        }
        self.world.outcome
    }
}

fn notice_for(event: &SimEvent) -> Option<Notice> {
    let notice = match event {
        SimEvent::WeaponLaunched {
            team: Team::Enemy,
            weapon,
            ..
        } => Notice::new(NoticeLevel::Alert, format!("Incoming {weapon:?} strike")),
        SimEvent::TotalWar { units } => Notice::new(
            NoticeLevel::Alert,
            format!("Enemy committing its reserve: {units} units inbound"),
        ),
        SimEvent::BuildingCompleted {
            team: Team::Player,
            key,
            ..
        } => Notice::new(NoticeLevel::Info, format!("{key} complete")),
        SimEvent::BuildingDestroyed {
            team: Team::Enemy,
            forward_defense: true,
            ..
        } => Notice::new(NoticeLevel::Info, "Enemy forward position destroyed"),
        SimEvent::MatchEnded(outcome) => Notice::new(NoticeLevel::Alert, format!("{outcome:?}")),
        _ => return None,
    };
    Some(notice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::RecordingSink;

    #[test]
    fn test_speed_frame_mapping() {
        let mut sim = Simulation::standard(&MatchConfig::default());
        assert_eq!(sim.frame().len(), 1);

        sim.set_speed(GameSpeed::Double);
        assert_eq!(sim.frame().len(), 2);

        sim.set_speed(GameSpeed::Half);
        let ticks: usize = (0..4).map(|_| sim.frame().len()).sum();
        assert_eq!(ticks, 2);
        assert_eq!(sim.world().tick, 5);
        assert_eq!(sim.engine_frame(), 6);
    }

    #[test]
    fn test_pause_stops_ticks() {
        let mut sim = Simulation::standard(&MatchConfig::default());
        sim.pause();
        assert!(sim.frame().is_empty());
        assert_eq!(sim.world().tick, 0);
        sim.resume();
        assert_eq!(sim.frame().len(), 1);
    }

    #[test]
    fn test_declined_requests_return_reason() {
        let mut sim = Simulation::standard(&MatchConfig::default());
        sim.world_mut().player_economy.set_supply(Fixed::ZERO);

        let result = sim.request_production("tank");
        assert!(matches!(result, Err(ProductionError::InsufficientSupply { .. })));
        sim.cancel_designation().expect_err("nothing armed");
    }

    #[test]
    fn test_enemy_hq_loss_is_victory_and_clears_schedule() {
        let mut sim = Simulation::standard(&MatchConfig::default());
        sim.set_notifier(Box::new(RecordingSink::default()));
        let world = sim.world_mut();
        world.scheduler.schedule(
            500,
            ScheduledAction::Reinforcement {
                team: Team::Enemy,
                key: "tank".to_string(),
                position: Vec2Fixed::ZERO,
            },
        );
        let hq = world.hq(Team::Enemy).expect("enemy hq").body.position;
        world.scheduler.schedule(
            1,
            ScheduledAction::Detonation {
                team: Team::Player,
                center: hq,
                radius: Fixed::from_num(10),
                damage: 10_000,
            },
        );

        let report = sim.tick();
        assert_eq!(sim.outcome(), Some(MatchOutcome::Victory));
        assert!(sim.world().scheduler.is_empty());
        assert!(report.events.contains(&SimEvent::MatchEnded(MatchOutcome::Victory)));
        assert!(sim.frame().is_empty());
        assert_eq!(sim.request_production("infantry"), Err(ProductionError::MatchOver));
    }

    #[test]
    fn test_off_map_orders_are_clamped_and_tick_safely() {
        let mut sim = Simulation::standard(&MatchConfig::default());
        let far = Vec2Fixed::from_ints(100_000, 200);
        let tank = sim
            .world_mut()
            .spawn_unit(Team::Player, "tank", Vec2Fixed::from_ints(400, 200));
        assert_eq!(sim.issue_command(&[tank], UnitCommand::Move(far)), 1);

        sim.request_production("guided_missile").expect("missile armed");
        let missile = sim.designate(far).expect("missile launched");
        let destination = sim
            .world()
            .projectiles
            .iter()
            .find(|p| p.id == missile)
            .map(|p| p.destination());
        assert_eq!(destination, Some(Vec2Fixed::from_ints(3200, 200)));

        for _ in 0..30 {
            sim.tick();
        }
        assert_eq!(sim.world().tick, 30);
        let unit = sim.world().unit(tank).expect("tank");
        assert!(unit.position().x > Fixed::from_num(400));
        assert!(unit.position().x <= Fixed::from_num(3200));
    }

    #[test]
    fn test_airstrike_designated_off_map_flies_to_edge() {
        let mut sim = Simulation::standard(&MatchConfig::default());
        sim.request_production("airstrike").expect("airstrike armed");
        let jet = sim.designate(Vec2Fixed::from_ints(100_000, 200)).expect("jet");
        let destination = match sim.world().unit(jet).expect("jet").behavior {
            BehaviorState::Strike { destination } => Some(destination),
            _ => None,
        };
        assert_eq!(destination, Some(Vec2Fixed::from_ints(3200, 200)));
        sim.tick();
        assert_eq!(sim.world().tick, 1);
    }

    #[test]
    fn test_failed_scheduled_action_does_not_abort_tick() {
        let mut world = World::empty(Arc::new(Catalog::standard()), 3);
        let tank = world.spawn_unit(Team::Player, "tank", Vec2Fixed::from_ints(400, 200));
        world
            .scheduler
            .schedule(1, ScheduledAction::MissileImpact { projectile: 9_999 });
        world.scheduler.schedule(
            1,
            ScheduledAction::Reinforcement {
                team: Team::Player,
                key: "infantry".to_string(),
                position: Vec2Fixed::from_ints(300, 100),
            },
        );
        let mut sim = Simulation::from_world(world, &MatchConfig::default());
        sim.issue_command(&[tank], UnitCommand::Move(Vec2Fixed::from_ints(800, 200)));

        let report = sim.tick();
        assert_eq!(report.tick, 1);
        assert_eq!(sim.world().tick, 1);
        assert!(sim.world().scheduler.is_empty());
        assert_eq!(sim.world().units(Team::Player).len(), 2);
        let unit = sim.world().unit(tank).expect("tank");
        assert!(unit.position().x > Fixed::from_num(400));

        sim.tick();
        assert_eq!(sim.world().tick, 2);
    }
}
