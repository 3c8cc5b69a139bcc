//! Unified per-tick unit update.
//!
//! One dispatcher per unit: stunned units skip the tick, the active command
//! runs first, and anything not overridden by a command falls through to the
//! default routine of the unit's behavior kind.

use std::sync::Arc;

use crate::catalog::Domain;
use crate::combat::{acquire_target, fire_weapon, resolve_impact, select_target, TargetIndex, WeaponProfile};
use crate::components::{CommandMode, EntityId};
use crate::effects::{ExplosionClass, FxCue};
use crate::error::Result;
use crate::math::{Fixed, Vec2Fixed};
use crate::units::{BehaviorState, BuilderTask, OperatorPhase, Unit};
use crate::world::World;

/// Retreating units stop once this close to their base.
pub const RETREAT_MARGIN: i32 = 100;

/// Aircraft leave play this far past the map edge.
pub const AIRCRAFT_EXIT_MARGIN: i32 = 60;

/// Ticks an operator waits after losing its drone.
pub const DRONE_REDEPLOY_TICKS: u32 = 300;

/// Update one unit for the current tick.
///
/// The unit has been taken out of its collection for the duration of the
/// call; everything else is reached through `world` and `index`.
pub fn update_unit(world: &mut World, index: &mut TargetIndex, unit: &mut Unit) -> Result<()> {
    if !unit.is_alive() || unit.status.is_stunned() {
        return Ok(());
    }

    if unit.lifetime == Some(0) {
        tracing::debug!(unit = unit.id(), "Lifetime expired");
        unit.retire();
        index.mark_dead(unit.id());
        return Ok(());
    }

    match unit.behavior.clone() {
        BehaviorState::Standard => command_or_default(world, index, unit),
        BehaviorState::Turret => engage(world, index, unit).map(|_| ()),
        BehaviorState::Strike { destination } => update_strike(world, index, unit, destination),
        BehaviorState::Drone { operator } => update_drone(world, index, unit, operator),
        BehaviorState::DroneOperator { phase, redeploy } => {
            update_operator(world, index, unit, phase, redeploy)
        }
        BehaviorState::Transport { loaded } => update_transport(world, index, unit, loaded),
        BehaviorState::Builder(task) => update_builder(world, index, unit, task),
    }
}

// ============================================================================
// Command stage
// ============================================================================

fn command_or_default(world: &mut World, index: &mut TargetIndex, unit: &mut Unit) -> Result<()> {
    if unit.accepts_commands() && run_command(world, index, unit)? {
        return Ok(());
    }
    advance_and_engage(world, index, unit)
}

/// Apply the active command. Returns false when default behavior should run.
fn run_command(world: &mut World, index: &mut TargetIndex, unit: &mut Unit) -> Result<bool> {
    let tick = world.tick;
    let command = unit.command;

    match command.mode {
        CommandMode::None => Ok(false),
        CommandMode::Stop => {
            engage(world, index, unit)?;
            Ok(true)
        }
        CommandMode::Move => {
            let Some(destination) = command.destination else {
                unit.command.stop(tick);
                return Ok(true);
            };
            if unit.status.damaged_since(command.issued_at, tick) {
                unit.command.stop(tick);
                engage(world, index, unit)?;
                return Ok(true);
            }
            if enemy_in_range(index, unit) {
                unit.command.stop(tick);
                engage(world, index, unit)?;
                return Ok(true);
            }
            if move_towards(index, unit, destination) {
                unit.command.stop(tick);
            }
            Ok(true)
        }
        CommandMode::Retreat => {
            let base = world.base_position(unit.team());
            if unit.position().within(base, Fixed::from_num(RETREAT_MARGIN)) {
                unit.command.stop(tick);
                return Ok(true);
            }
            unit.attack.target = None;
            move_towards(index, unit, base);
            if unit.position().within(base, Fixed::from_num(RETREAT_MARGIN)) {
                unit.command.stop(tick);
            }
            Ok(true)
        }
        CommandMode::Attack => {
            let Some(destination) = command.destination else {
                return Ok(false);
            };
            if engage(world, index, unit)? && unit.archetype.domain == Domain::Ground {
                return Ok(true);
            }
            if move_towards(index, unit, destination) {
                unit.command.set(CommandMode::None, None, tick);
            }
            Ok(true)
        }
    }
}

fn enemy_in_range(index: &TargetIndex, unit: &Unit) -> bool {
    unit.archetype.is_armed()
        && acquire_target(
            index,
            unit.team(),
            unit.position(),
            &WeaponProfile::from_unit(&unit.archetype),
        )
        .is_some()
}

// ============================================================================
// Movement and engagement
// ============================================================================

fn set_position(index: &mut TargetIndex, unit: &mut Unit, position: Vec2Fixed) {
    unit.facing = unit.facing.toward(position.x - unit.body.position.x);
    unit.body.position = position;
    index.update_position(unit.id(), position);
}

/// Step toward `destination`; returns true on arrival.
fn move_towards(index: &mut TargetIndex, unit: &mut Unit, destination: Vec2Fixed) -> bool {
    let (position, arrived) = unit
        .position()
        .step_towards(destination, unit.archetype.speed);
    set_position(index, unit, position);
    arrived
}

/// Keep or acquire a target and fire when ready. Returns whether a target is held.
fn engage(world: &mut World, index: &mut TargetIndex, unit: &mut Unit) -> Result<bool> {
    if !unit.archetype.is_armed() {
        unit.attack.target = None;
        return Ok(false);
    }

    let weapon = WeaponProfile::from_unit(&unit.archetype);
    let team = unit.team();
    let position = unit.position();

    unit.attack.target = select_target(index, team, position, &weapon, unit.attack.target);
    let Some(target) = unit.attack.target else {
        return Ok(false);
    };

    if let Some(entry) = index.get(target) {
        unit.facing = unit.facing.toward(entry.position.x - position.x);
    }
    if unit.attack.is_ready() {
        unit.attack.cooldown = weapon.cooldown;
        fire_weapon(world, index, team, position, &weapon, target)?;
    }
    Ok(true)
}

/// Constant-speed advance toward the enemy side.
fn advance(world: &mut World, index: &mut TargetIndex, unit: &mut Unit) {
    let width = world.tunables().map_width;
    let mut position = unit.position();
    position.x += unit.archetype.speed * unit.team().advance_sign();

    if unit.archetype.is_air() {
        let margin = Fixed::from_num(AIRCRAFT_EXIT_MARGIN);
        if position.x < -margin || position.x > width + margin {
            if matches!(unit.behavior, BehaviorState::Drone { .. }) {
                unit.retire();
            } else {
                world.return_to_stock(unit);
            }
            index.mark_dead(unit.id());
            return;
        }
    } else {
        position.x = position.x.max(Fixed::ZERO).min(width);
    }
    set_position(index, unit, position);
}

/// Default routine: ground units stop to fight, aircraft attack on the move.
fn advance_and_engage(world: &mut World, index: &mut TargetIndex, unit: &mut Unit) -> Result<()> {
    let engaged = engage(world, index, unit)?;
    if !engaged || unit.archetype.is_air() {
        advance(world, index, unit);
    }
    Ok(())
}

// ============================================================================
// Behavior kinds
// ============================================================================

fn update_strike(
    world: &mut World,
    index: &mut TargetIndex,
    unit: &mut Unit,
    destination: Vec2Fixed,
) -> Result<()> {
    if !move_towards(index, unit, destination) {
        return Ok(());
    }

    let weapon = WeaponProfile::from_unit(&unit.archetype);
    tracing::debug!(tick = world.tick, unit = unit.id(), "Strike delivered");
    resolve_impact(world, index, unit.team(), &weapon, None, destination)?;
    world.emit_fx(FxCue::Explosion(ExplosionClass::Large), destination);
    unit.retire();
    index.mark_dead(unit.id());
    Ok(())
}

fn update_drone(
    world: &mut World,
    index: &mut TargetIndex,
    unit: &mut Unit,
    operator: Option<EntityId>,
) -> Result<()> {
    if let Some(operator) = operator {
        if !index.is_alive(operator) {
            tracing::debug!(unit = unit.id(), operator, "Operator lost, drone disabled");
            unit.retire();
            index.mark_dead(unit.id());
            return Ok(());
        }
    }
    advance_and_engage(world, index, unit)
}

fn update_operator(
    world: &mut World,
    index: &mut TargetIndex,
    unit: &mut Unit,
    phase: OperatorPhase,
    redeploy: u32,
) -> Result<()> {
    match phase {
        OperatorPhase::Controlling { drone } => {
            if index.is_alive(drone) {
                unit.attack.target = None;
                return Ok(());
            }
            unit.behavior = BehaviorState::DroneOperator {
                phase: OperatorPhase::Active,
                redeploy: DRONE_REDEPLOY_TICKS,
            };
            command_or_default(world, index, unit)
        }
        OperatorPhase::Active => {
            let launch = redeploy == 0 && enemy_in_range(index, unit);
            match (&unit.archetype.drone_key, launch) {
                (Some(key), true) => {
                    let key = key.clone();
                    let mut drone = world.make_unit(unit.team(), &key, unit.position());
                    drone.behavior = BehaviorState::Drone {
                        operator: Some(unit.id()),
                    };
                    let drone = world.queue_unit(drone);
                    tracing::debug!(operator = unit.id(), drone, "Drone launched");
                    unit.attack.target = None;
                    unit.behavior = BehaviorState::DroneOperator {
                        phase: OperatorPhase::Controlling { drone },
                        redeploy,
                    };
                    Ok(())
                }
                _ => command_or_default(world, index, unit),
            }
        }
    }
}

fn update_transport(
    world: &mut World,
    index: &mut TargetIndex,
    unit: &mut Unit,
    loaded: bool,
) -> Result<()> {
    if loaded {
        let position = unit.position();
        let range = unit.archetype.range;
        let contact = index
            .hostile_to(unit.team())
            .any(|e| !e.is_building() && position.within(e.position, range));
        if contact {
            unit.behavior = BehaviorState::Transport { loaded: false };
            let archetype = Arc::clone(&unit.archetype);
            world.unload_cargo(unit.team(), &archetype, position);
        }
    }
    command_or_default(world, index, unit)
}

fn update_builder(
    world: &mut World,
    index: &mut TargetIndex,
    unit: &mut Unit,
    task: BuilderTask,
) -> Result<()> {
    match task {
        BuilderTask::Idle => {
            if unit.accepts_commands() {
                run_command(world, index, unit)?;
            }
            Ok(())
        }
        BuilderTask::Move { site, key } => {
            if !move_towards(index, unit, site) {
                return Ok(());
            }
            let team = unit.team();
            unit.behavior = match world.spawn_building(team, &key, site, false) {
                Some(site_id) => {
                    tracing::debug!(tick = world.tick, building = %key, site_id, "Construction started");
                    BuilderTask::Build { site_id }.into()
                }
                None => BuilderTask::Idle.into(),
            };
            Ok(())
        }
        BuilderTask::Build { site_id } => {
            let working = world
                .building(site_id)
                .is_some_and(|b| !b.body.is_dead() && !b.is_complete());
            if !working {
                unit.behavior = BuilderTask::Idle.into();
            }
            Ok(())
        }
    }
}

impl From<BuilderTask> for BehaviorState {
    fn from(task: BuilderTask) -> Self {
        Self::Builder(task)
    }
}
