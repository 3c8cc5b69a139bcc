//! Command and selection layer.
//!
//! Orders from the player (and from the AI wave controller) override default
//! combat behavior until they complete. Locked units, such as strike craft
//! already flying to a resolved destination, never accept orders.

use crate::components::{CommandMode, EntityId, Team};
use crate::math::Vec2Fixed;
use crate::units::Unit;
use crate::world::World;

/// An order for a set of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitCommand {
    /// Hold position; still fire at anything in range.
    Stop,
    /// Travel to a point.
    Move(Vec2Fixed),
    /// Resume the default advance, or attack-move toward a point.
    Attack(Option<Vec2Fixed>),
    /// Fall back to base.
    Retreat,
}

impl UnitCommand {
    /// Mode and destination this order sets.
    #[must_use]
    pub fn mode(self) -> (CommandMode, Option<Vec2Fixed>) {
        match self {
            Self::Stop => (CommandMode::Stop, None),
            Self::Move(point) => (CommandMode::Move, Some(point)),
            Self::Attack(point) => (CommandMode::Attack, point),
            Self::Retreat => (CommandMode::Retreat, None),
        }
    }

    /// The same order with its destination pulled inside the lane.
    #[must_use]
    pub fn within_map(self, world: &World) -> Self {
        match self {
            Self::Move(point) => Self::Move(world.clamp_to_map(point)),
            Self::Attack(Some(point)) => Self::Attack(Some(world.clamp_to_map(point))),
            other => other,
        }
    }
}

/// Give `command` to one unit. Returns false if the unit refuses orders.
pub fn apply_command(unit: &mut Unit, command: UnitCommand, tick: u64) -> bool {
    if !unit.accepts_commands() {
        return false;
    }
    let (mode, destination) = command.mode();
    unit.command.set(mode, destination, tick);
    if matches!(command, UnitCommand::Retreat | UnitCommand::Move(_)) {
        unit.attack.target = None;
    }
    true
}

/// Give `command` to every listed unit owned by `team`.
///
/// Unknown, dead, locked and foreign units are skipped. Destinations off the
/// map are clamped to its edge. Returns how many units took the order.
pub fn issue_command(world: &mut World, team: Team, ids: &[EntityId], command: UnitCommand) -> usize {
    let command = command.within_map(world);
    let tick = world.tick;
    let mut accepted = 0;
    for unit in world.units_mut(team).iter_mut() {
        if ids.contains(&unit.id()) && apply_command(unit, command, tick) {
            accepted += 1;
        }
    }
    tracing::debug!(tick, ?command, requested = ids.len(), accepted, "Command issued");
    accepted
}

/// Ids of the units of `team` that currently accept orders.
#[must_use]
pub fn selectable_units(world: &World, team: Team) -> Vec<EntityId> {
    world
        .units(team)
        .iter()
        .filter(|u| u.accepts_commands())
        .map(Unit::id)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_locked_and_foreign_units_are_skipped() {
        let mut world = World::empty(Arc::new(Catalog::standard()), 3);
        let rifles = world.spawn_unit(Team::Player, "infantry", Vec2Fixed::ZERO);
        let jet = world.spawn_unit(Team::Player, "strike_jet", Vec2Fixed::ZERO);
        let enemy = world.spawn_unit(Team::Enemy, "infantry", Vec2Fixed::ZERO);

        let accepted = issue_command(&mut world, Team::Player, &[rifles, jet, enemy], UnitCommand::Retreat);
        assert_eq!(accepted, 1);
        assert_eq!(world.unit(rifles).expect("rifles").command.mode, CommandMode::Retreat);
        assert_eq!(world.unit(jet).expect("jet").command.mode, CommandMode::None);
        assert_eq!(world.unit(enemy).expect("enemy").command.mode, CommandMode::None);
        assert_eq!(selectable_units(&world, Team::Player), vec![rifles]);
    }

    #[test]
    fn test_move_records_issue_tick() {
        let mut world = World::empty(Arc::new(Catalog::standard()), 3);
        world.tick = 42;
        let id = world.spawn_unit(Team::Player, "tank", Vec2Fixed::ZERO);
        let point = Vec2Fixed::from_ints(300, 100);

        issue_command(&mut world, Team::Player, &[id], UnitCommand::Move(point));
        let unit = world.unit(id).expect("tank");
        assert_eq!(unit.command.mode, CommandMode::Move);
        assert_eq!(unit.command.destination, Some(point));
        assert_eq!(unit.command.issued_at, 42);
    }

    #[test]
    fn test_destination_off_map_is_clamped() {
        let mut world = World::empty(Arc::new(Catalog::standard()), 3);
        let id = world.spawn_unit(Team::Player, "tank", Vec2Fixed::ZERO);

        issue_command(&mut world, Team::Player, &[id], UnitCommand::Move(Vec2Fixed::from_ints(100_000, 200)));
        let unit = world.unit(id).expect("tank");
        assert_eq!(unit.command.destination, Some(Vec2Fixed::from_ints(3200, 200)));

        issue_command(&mut world, Team::Player, &[id], UnitCommand::Attack(Some(Vec2Fixed::from_ints(-5, 900))));
        let unit = world.unit(id).expect("tank");
        assert_eq!(unit.command.destination, Some(Vec2Fixed::from_ints(0, 400)));
    }
}
