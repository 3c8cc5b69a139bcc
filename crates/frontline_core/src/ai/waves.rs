//! Front-line wave controller.
//!
//! A three-phase state machine over the AI's ground force:
//!
//! - **Hold**: units near the current waypoint stop and defend, stragglers
//!   are recalled to it.
//! - **Push**: most units advance to the next waypoint while a
//!   difficulty-dependent rear guard keeps the current one. From the last
//!   waypoint the push becomes an assault on the player base.
//! - **Retreat**: entered from either other phase when the player masses
//!   near the front; the force falls back to the rearmost waypoint.
//!
//! Orders go through the regular command layer, so AI units obey the same
//! stop/move/attack rules as player units.

use super::difficulty::DifficultyProfile;
use super::WavePhase;
use crate::commands::{apply_command, UnitCommand};
use crate::components::{CommandMode, EntityId, Team};
use crate::effects::SimEvent;
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::units::{BehaviorState, Unit};
use crate::world::World;

/// Waypoint x positions as percent of map width, rearmost first.
pub const WAYPOINT_PERCENTS: [u32; 4] = [85, 70, 55, 40];
/// Radius around a waypoint counted as holding it.
pub const HOLD_RADIUS: i32 = 200;
/// Hold duration while the match is young.
pub const EARLY_HOLD_TICKS: u32 = 900;
/// Hold duration later on.
pub const LATE_HOLD_TICKS: u32 = 600;
/// Tick after which holds use the late duration.
pub const EARLY_HOLD_UNTIL: u64 = 10_800;
/// A push that has not arrived by now is considered complete anyway.
pub const PUSH_TIMEOUT: u32 = 900;
/// Ticks spent falling back.
pub const RETREAT_TICKS: u32 = 600;
/// Ticks between threat assessments.
pub const THREAT_INTERVAL: u64 = 60;
/// Radius around the front used for threat assessment.
pub const THREAT_RADIUS: i32 = 400;
/// Tick until which the assessment is hypersensitive.
pub const EARLY_THREAT_UNTIL: u64 = 5_400;
/// Minimum massed player units that can trigger a retreat.
pub const THREAT_MIN_UNITS: u32 = 3;
/// Ticks between hold regroup orders.
pub const REGROUP_INTERVAL: u64 = 60;

/// Wave controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveController {
    phase: WavePhase,
    waypoint: usize,
    timer: u32,
    vanguard: Vec<EntityId>,
    assault: bool,
}

impl Default for WaveController {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveController {
    /// Start holding the rearmost waypoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: WavePhase::Hold,
            waypoint: 0,
            timer: EARLY_HOLD_TICKS,
            vanguard: Vec::new(),
            assault: false,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Index of the waypoint being held.
    #[must_use]
    pub fn waypoint(&self) -> usize {
        self.waypoint
    }

    /// Ticks left in the current phase.
    #[must_use]
    pub fn timer(&self) -> u32 {
        self.timer
    }

    /// Advance one tick.
    pub fn update(&mut self, world: &mut World, profile: &DifficultyProfile) -> Result<()> {
        self.timer = self.timer.saturating_sub(1);

        if self.phase != WavePhase::Retreat
            && world.tick % THREAT_INTERVAL == 0
            && self.threatened(world)
        {
            return self.begin_retreat(world);
        }

        match self.phase {
            WavePhase::Hold => {
                if world.tick % REGROUP_INTERVAL == 0 {
                    self.hold_orders(world);
                }
                if self.timer == 0 {
                    if world.enemies.iter().any(is_wave_unit) {
                        self.begin_push(world, profile)?;
                    } else {
                        self.timer = hold_duration(world.tick);
                    }
                }
            }
            WavePhase::Push => {
                if self.timer == 0 || self.push_arrived(world) {
                    self.finish_push(world)?;
                }
            }
            WavePhase::Retreat => {
                if self.timer == 0 {
                    self.enter_hold(world)?;
                }
            }
        }
        Ok(())
    }

    fn transition(&mut self, world: &mut World, to: WavePhase) -> Result<()> {
        let from = self.phase;
        if !from.can_transition_to(to) {
            return Err(GameError::InvalidState(format!(
                "wave phase {from:?} cannot become {to:?}"
            )));
        }
        self.phase = to;
        world.push_event(SimEvent::WavePhaseChanged { from, to });
        tracing::info!(tick = world.tick, ?from, ?to, waypoint = self.waypoint, "Wave phase changed");
        Ok(())
    }

    fn threatened(&self, world: &World) -> bool {
        let front = waypoint_position(world, self.waypoint);
        let radius = Fixed::from_num(THREAT_RADIUS);
        let count = |team: Team| {
            world
                .units(team)
                .iter()
                .filter(|u| u.is_alive() && front.within(u.position(), radius))
                .count() as u32
        };
        let players = count(Team::Player);
        let defenders = count(Team::Enemy);
        // Ratio in tenths.
        let ratio = if world.tick < EARLY_THREAT_UNTIL { 12 } else { 20 };
        players >= THREAT_MIN_UNITS && players * 10 > defenders * ratio
    }

    fn hold_orders(&mut self, world: &mut World) {
        let point = waypoint_position(world, self.waypoint);
        let radius = Fixed::from_num(HOLD_RADIUS);
        order_each(world, |_, unit| {
            if point.within(unit.position(), radius) {
                (unit.command.mode != CommandMode::Stop).then_some(UnitCommand::Stop)
            } else {
                let recalled = unit.command.mode == CommandMode::Move
                    && unit.command.destination == Some(point);
                (!recalled).then_some(UnitCommand::Move(point))
            }
        });
    }

    fn begin_push(&mut self, world: &mut World, profile: &DifficultyProfile) -> Result<()> {
        let last = WAYPOINT_PERCENTS.len() - 1;
        self.assault = self.waypoint == last;
        let command = if self.assault {
            UnitCommand::Attack(Some(world.base_position(Team::Player)))
        } else {
            UnitCommand::Move(waypoint_position(world, self.waypoint + 1))
        };

        let force = world.enemies.iter().filter(|u| is_wave_unit(u)).count();
        let rear_guard = force * profile.hold_back as usize / 100;
        let advancing = force - rear_guard;

        let mut vanguard = Vec::with_capacity(advancing);
        order_each(world, |i, unit| {
            if i < advancing {
                vanguard.push(unit.id());
                Some(command)
            } else {
                Some(UnitCommand::Stop)
            }
        });
        self.vanguard = vanguard;
        self.timer = PUSH_TIMEOUT;
        self.transition(world, WavePhase::Push)
    }

    fn push_arrived(&self, world: &World) -> bool {
        if self.assault {
            return false;
        }
        let target = waypoint_position(world, self.waypoint + 1);
        let radius = Fixed::from_num(HOLD_RADIUS);
        let living: Vec<&Unit> = world
            .enemies
            .iter()
            .filter(|u| u.is_alive() && self.vanguard.contains(&u.id()))
            .collect();
        if living.is_empty() {
            return true;
        }
        let arrived = living
            .iter()
            .filter(|u| target.within(u.position(), radius))
            .count();
        arrived * 2 >= living.len()
    }

    fn finish_push(&mut self, world: &mut World) -> Result<()> {
        let survivors = world
            .enemies
            .iter()
            .any(|u| u.is_alive() && self.vanguard.contains(&u.id()));
        if survivors && !self.assault {
            self.waypoint += 1;
        }
        self.enter_hold(world)
    }

    fn enter_hold(&mut self, world: &mut World) -> Result<()> {
        self.vanguard.clear();
        self.assault = false;
        self.timer = hold_duration(world.tick);
        self.transition(world, WavePhase::Hold)?;
        self.hold_orders(world);
        Ok(())
    }

    fn begin_retreat(&mut self, world: &mut World) -> Result<()> {
        self.waypoint = 0;
        self.vanguard.clear();
        self.assault = false;
        self.timer = RETREAT_TICKS;
        let rally = waypoint_position(world, 0);
        order_each(world, |_, _| Some(UnitCommand::Move(rally)));
        self.transition(world, WavePhase::Retreat)
    }
}

/// Position of waypoint `index` on the lane center.
#[must_use]
pub fn waypoint_position(world: &World, index: usize) -> Vec2Fixed {
    let percent = WAYPOINT_PERCENTS[index.min(WAYPOINT_PERCENTS.len() - 1)];
    world.tunables().lane_point(percent)
}

fn hold_duration(tick: u64) -> u32 {
    if tick < EARLY_HOLD_UNTIL {
        EARLY_HOLD_TICKS
    } else {
        LATE_HOLD_TICKS
    }
}

/// Ground units that take wave orders. Aircraft fly sorties on their own.
fn is_wave_unit(unit: &Unit) -> bool {
    unit.accepts_commands()
        && !unit.archetype.is_air()
        && !matches!(unit.behavior, BehaviorState::Builder(_))
}

/// Give each wave unit, in collection order, the command `decide` returns.
fn order_each<F>(world: &mut World, mut decide: F)
where
    F: FnMut(usize, &Unit) -> Option<UnitCommand>,
{
    let tick = world.tick;
    for (i, unit) in world.enemies.iter_mut().filter(|u| is_wave_unit(u)).enumerate() {
        if let Some(command) = decide(i, unit) {
            apply_command(unit, command, tick);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ai::difficulty::{profile, Difficulty};
    use crate::catalog::Catalog;

    fn world() -> World {
        World::empty(Arc::new(Catalog::standard()), 2)
    }

    fn run(controller: &mut WaveController, world: &mut World, ticks: u32) -> Vec<(WavePhase, WavePhase)> {
        let profile = profile(Difficulty::Veteran);
        let mut changes = Vec::new();
        for _ in 0..ticks {
            world.tick += 1;
            controller.update(world, &profile).expect("wave update");
            for event in world.take_events() {
                if let SimEvent::WavePhaseChanged { from, to } = event {
                    changes.push((from, to));
                }
            }
        }
        changes
    }

    #[test]
    fn test_hold_then_push_splits_force() {
        let mut world = world();
        let hold = waypoint_position(&world, 0);
        let ids: Vec<_> = (0..10)
            .map(|i| world.spawn_unit(Team::Enemy, "infantry", Vec2Fixed::new(hold.x, hold.y + Fixed::from_num(i))))
            .collect();
        let mut controller = WaveController::new();

        let changes = run(&mut controller, &mut world, EARLY_HOLD_TICKS);
        assert_eq!(changes, vec![(WavePhase::Hold, WavePhase::Push)]);

        let next = waypoint_position(&world, 1);
        let movers = ids
            .iter()
            .filter(|id| world.unit(**id).expect("unit").command.destination == Some(next))
            .count();
        assert_eq!(movers, 7);
    }

    #[test]
    fn test_push_completes_on_arrival() {
        let mut world = world();
        let mut controller = WaveController::new();
        let next = waypoint_position(&world, 1);
        let id = world.spawn_unit(Team::Enemy, "infantry", waypoint_position(&world, 0));
        run(&mut controller, &mut world, EARLY_HOLD_TICKS);
        assert_eq!(controller.phase(), WavePhase::Push);

        world.unit_mut(id).expect("unit").body.position = next;
        let changes = run(&mut controller, &mut world, 1);
        assert_eq!(changes, vec![(WavePhase::Push, WavePhase::Hold)]);
        assert_eq!(controller.waypoint(), 1);
    }

    #[test]
    fn test_massed_player_triggers_retreat_then_hold() {
        let mut world = world();
        let front = waypoint_position(&world, 0);
        world.spawn_unit(Team::Enemy, "infantry", front);
        for i in 0..4 {
            world.spawn_unit(Team::Player, "infantry", Vec2Fixed::new(front.x - Fixed::from_num(100 + i), front.y));
        }
        let mut controller = WaveController::new();

        let changes = run(&mut controller, &mut world, 60);
        assert_eq!(changes, vec![(WavePhase::Hold, WavePhase::Retreat)]);

        world.players.clear();
        let changes = run(&mut controller, &mut world, RETREAT_TICKS);
        assert_eq!(changes, vec![(WavePhase::Retreat, WavePhase::Hold)]);
        assert_eq!(controller.waypoint(), 0);
    }

    #[test]
    fn test_empty_force_keeps_holding() {
        let mut world = world();
        let mut controller = WaveController::new();
        let changes = run(&mut controller, &mut world, EARLY_HOLD_TICKS * 2);
        assert!(changes.is_empty());
        assert_eq!(controller.phase(), WavePhase::Hold);
    }
}
