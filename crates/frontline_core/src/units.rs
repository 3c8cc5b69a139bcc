//! Unit instances and their behavior-specific state.

use std::sync::Arc;

use crate::catalog::{BehaviorKind, UnitArchetype};
use crate::components::{
    AttackState, Body, CommandState, EntityId, Facing, StatusEffects, Team,
};
use crate::math::Vec2Fixed;

/// Phase of a drone operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorPhase {
    /// Fighting normally; may launch a drone.
    Active,
    /// Passive while its drone is alive.
    Controlling {
        /// The deployed drone.
        drone: EntityId,
    },
}

/// Construction task of a builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BuilderTask {
    /// No task.
    Idle,
    /// Walking to the site.
    Move {
        /// Site center.
        site: Vec2Fixed,
        /// Building key.
        key: String,
    },
    /// Attending a construction until it completes.
    Build {
        /// The building under construction.
        site_id: EntityId,
    },
}

/// Per-instance state matching the archetype's [`BehaviorKind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BehaviorState {
    /// No extra state.
    Standard,
    /// Drone tied to an operator.
    Drone {
        /// Operator that launched it, if any.
        operator: Option<EntityId>,
    },
    /// Drone operator cycle.
    DroneOperator {
        /// Current phase.
        phase: OperatorPhase,
        /// Ticks until another drone can be launched.
        redeploy: u32,
    },
    /// Transport cargo flag.
    Transport {
        /// Cargo still aboard.
        loaded: bool,
    },
    /// Builder task.
    Builder(BuilderTask),
    /// Stationary turret.
    Turret,
    /// Strike craft heading to its point.
    Strike {
        /// Detonation point.
        destination: Vec2Fixed,
    },
}

impl BehaviorState {
    /// Initial state for an archetype.
    #[must_use]
    pub fn initial(kind: BehaviorKind) -> Self {
        match kind {
            BehaviorKind::Standard => Self::Standard,
            BehaviorKind::Drone => Self::Drone { operator: None },
            BehaviorKind::DroneOperator => Self::DroneOperator {
                phase: OperatorPhase::Active,
                redeploy: 0,
            },
            BehaviorKind::Transport => Self::Transport { loaded: true },
            BehaviorKind::Builder => Self::Builder(BuilderTask::Idle),
            BehaviorKind::Turret => Self::Turret,
            BehaviorKind::Strike => Self::Strike {
                destination: Vec2Fixed::ZERO,
            },
        }
    }
}

/// A live unit.
#[derive(Debug, Clone)]
pub struct Unit {
    /// Shared entity state.
    pub body: Body,
    /// Immutable archetype.
    pub archetype: Arc<UnitArchetype>,
    /// Weapon state.
    pub attack: AttackState,
    /// Active order.
    pub command: CommandState,
    /// Stun and damage timers.
    pub status: StatusEffects,
    /// Horizontal facing.
    pub facing: Facing,
    /// Behavior-specific state.
    pub behavior: BehaviorState,
    /// Excluded from manual selection while true.
    pub locked: bool,
    /// Ticks until the unit expires, if it has a lifetime.
    pub lifetime: Option<u32>,
    /// Left the battlefield rather than being destroyed.
    pub retired: bool,
}

impl Unit {
    /// Create a unit from its archetype.
    #[must_use]
    pub fn new(id: EntityId, archetype: Arc<UnitArchetype>, team: Team, position: Vec2Fixed) -> Self {
        let body = Body::new(
            id,
            position,
            team,
            archetype.hp,
            archetype.width,
            archetype.height,
        );
        Self {
            body,
            attack: AttackState::default(),
            command: CommandState::default(),
            status: StatusEffects::default(),
            facing: Facing::for_team(team),
            behavior: BehaviorState::initial(archetype.behavior),
            locked: archetype.behavior == BehaviorKind::Strike,
            lifetime: archetype.lifetime,
            retired: false,
            archetype,
        }
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.body.id
    }

    /// Owning team.
    #[must_use]
    pub fn team(&self) -> Team {
        self.body.team
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec2Fixed {
        self.body.position
    }

    /// Whether the unit is still in play.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.body.is_dead()
    }

    /// Remove the unit without counting it as a loss.
    pub fn retire(&mut self) {
        self.retired = true;
        self.body.kill();
    }

    /// Whether orders from the command layer apply to this unit.
    #[must_use]
    pub fn accepts_commands(&self) -> bool {
        !self.locked
            && self.is_alive()
            && !matches!(
                self.behavior,
                BehaviorState::Turret | BehaviorState::Drone { .. } | BehaviorState::Strike { .. }
            )
    }

    /// Count per-unit timers down by one tick.
    pub fn tick_timers(&mut self) {
        self.attack.tick();
        self.status.tick();
        if let BehaviorState::DroneOperator { redeploy, .. } = &mut self.behavior {
            *redeploy = redeploy.saturating_sub(1);
        }
        if let Some(remaining) = &mut self.lifetime {
            *remaining = remaining.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_new_unit_state_matches_archetype() {
        let catalog = Catalog::standard();
        let apc = Unit::new(7, catalog.resolve_unit("apc"), Team::Enemy, Vec2Fixed::ZERO);
        assert_eq!(apc.behavior, BehaviorState::Transport { loaded: true });
        assert_eq!(apc.facing, Facing::Left);
        assert!(apc.accepts_commands());

        let jet = Unit::new(8, catalog.resolve_unit("strike_jet"), Team::Player, Vec2Fixed::ZERO);
        assert!(jet.locked);
        assert!(!jet.accepts_commands());
    }

    #[test]
    fn test_timers_clamp_at_zero() {
        let catalog = Catalog::standard();
        let mut drone = Unit::new(1, catalog.resolve_unit("drone"), Team::Player, Vec2Fixed::ZERO);
        drone.attack.cooldown = 1;
        drone.tick_timers();
        drone.tick_timers();
        assert_eq!(drone.attack.cooldown, 0);
        assert_eq!(drone.lifetime, Some(598));
    }
}
