//! Shared entity state.
//!
//! Every unit and building embeds a [`Body`]: position, team, health,
//! footprint and the monotonic dead flag. Behavior-specific state lives on
//! the owning type.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// Unique identifier for entities.
pub type EntityId = u64;

/// Ticks a unit counts as "recently damaged" after a hit.
pub const RECENT_DAMAGE_WINDOW: u64 = 90;

/// Side an entity fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    /// Human-controlled side, based on the left.
    Player,
    /// AI-controlled side, based on the right.
    Enemy,
    /// Scenery; never attacks and is never attacked.
    Neutral,
}

impl Team {
    /// The side this team fights, if any.
    #[must_use]
    pub const fn opponent(self) -> Option<Self> {
        match self {
            Self::Player => Some(Self::Enemy),
            Self::Enemy => Some(Self::Player),
            Self::Neutral => None,
        }
    }

    /// Whether `self` and `other` are at war.
    #[must_use]
    pub fn is_hostile_to(self, other: Self) -> bool {
        self.opponent() == Some(other)
    }

    /// Sign of the x axis this team advances along.
    #[must_use]
    pub fn advance_sign(self) -> Fixed {
        match self {
            Self::Player => Fixed::from_num(1),
            Self::Enemy => Fixed::from_num(-1),
            Self::Neutral => Fixed::ZERO,
        }
    }
}

/// Health component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if health is exhausted.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }

    /// Get health as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            ((u64::from(self.current) * 100) / u64::from(self.max)) as u32
        }
    }

    /// Pull `current` back into `[0, max]`.
    pub fn clamp(&mut self) {
        self.current = self.current.min(self.max);
    }
}

/// Position, ownership, health and footprint shared by every entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Body {
    /// Unique id.
    pub id: EntityId,
    /// Center point.
    pub position: Vec2Fixed,
    /// Owning side.
    pub team: Team,
    /// Hit points.
    pub health: Health,
    /// Footprint width.
    pub width: Fixed,
    /// Footprint height.
    pub height: Fixed,
    dead: bool,
}

impl Body {
    /// Create a living body at full health.
    #[must_use]
    pub fn new(
        id: EntityId,
        position: Vec2Fixed,
        team: Team,
        max_hp: u32,
        width: Fixed,
        height: Fixed,
    ) -> Self {
        Self {
            id,
            position,
            team,
            health: Health::new(max_hp),
            width,
            height,
            dead: false,
        }
    }

    /// Whether the entity has died. Once true this never reverts.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Mark the entity dead.
    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// Apply damage and return `(dealt, died_now)`.
    ///
    /// Reaching zero health sets the dead flag within the same call.
    pub fn apply_damage(&mut self, amount: u32) -> (u32, bool) {
        if self.dead {
            return (0, false);
        }
        self.health.clamp();
        let dealt = self.health.apply_damage(amount);
        if self.health.is_depleted() {
            self.dead = true;
            return (dealt, true);
        }
        (dealt, false)
    }
}

/// Sticky weapon state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AttackState {
    /// Target retained across ticks until invalid.
    pub target: Option<EntityId>,
    /// Ticks until the weapon can fire again.
    pub cooldown: u32,
}

impl AttackState {
    /// Whether the weapon can fire this tick.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.cooldown == 0
    }

    /// Count the cooldown down by one tick.
    pub fn tick(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }
}

/// Externally issued order overriding default behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandMode {
    /// Default combat behavior.
    #[default]
    None,
    /// Hold position, still firing at anything in range.
    Stop,
    /// Travel to a point.
    Move,
    /// Advance and engage, optionally toward a point.
    Attack,
    /// Fall back to the home base.
    Retreat,
}

/// Active order on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CommandState {
    /// Current mode.
    pub mode: CommandMode,
    /// Destination for move and attack orders.
    pub destination: Option<Vec2Fixed>,
    /// Tick the order was given.
    pub issued_at: u64,
}

impl CommandState {
    /// Replace the order.
    pub fn set(&mut self, mode: CommandMode, destination: Option<Vec2Fixed>, tick: u64) {
        self.mode = mode;
        self.destination = destination;
        self.issued_at = tick;
    }

    /// Switch to holding position.
    pub fn stop(&mut self, tick: u64) {
        self.set(CommandMode::Stop, None, tick);
    }
}

/// Timed status effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusEffects {
    /// Ticks of stun remaining.
    pub stun_ticks: u32,
    /// Tick of the most recent damage taken.
    pub last_damaged: Option<u64>,
}

impl StatusEffects {
    /// Whether the unit is currently stunned.
    #[must_use]
    pub const fn is_stunned(&self) -> bool {
        self.stun_ticks > 0
    }

    /// Apply a stun, keeping the longer of the two durations.
    pub fn stun(&mut self, ticks: u32) {
        self.stun_ticks = self.stun_ticks.max(ticks);
    }

    /// Whether damage was taken at or after `since` and within the recent window.
    #[must_use]
    pub fn damaged_since(&self, since: u64, now: u64) -> bool {
        self.last_damaged
            .is_some_and(|t| t >= since && now.saturating_sub(t) < RECENT_DAMAGE_WINDOW)
    }

    /// Count timers down by one tick.
    pub fn tick(&mut self) {
        self.stun_ticks = self.stun_ticks.saturating_sub(1);
    }
}

/// Horizontal facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Toward +x.
    #[default]
    Right,
    /// Toward -x.
    Left,
}

impl Facing {
    /// Facing for a unit moving by `dx`; keeps `self` when not moving horizontally.
    #[must_use]
    pub fn toward(self, dx: Fixed) -> Self {
        if dx > Fixed::ZERO {
            Self::Right
        } else if dx < Fixed::ZERO {
            Self::Left
        } else {
            self
        }
    }

    /// Default facing for a team.
    #[must_use]
    pub fn for_team(team: Team) -> Self {
        match team {
            Team::Enemy => Self::Left,
            _ => Self::Right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(hp: u32) -> Body {
        Body::new(
            1,
            Vec2Fixed::ZERO,
            Team::Player,
            hp,
            Fixed::from_num(16),
            Fixed::from_num(16),
        )
    }

    #[test]
    fn test_lethal_damage_kills_in_same_call() {
        let mut body = body(100);
        body.health.current = 50;

        let (dealt, died) = body.apply_damage(60);
        assert_eq!(dealt, 50);
        assert!(died);
        assert_eq!(body.health.current, 0);
        assert!(body.is_dead());
    }

    #[test]
    fn test_dead_flag_is_monotonic() {
        let mut body = body(10);
        body.apply_damage(10);
        body.health.current = 5;
        assert!(body.is_dead());
        assert_eq!(body.apply_damage(1), (0, false));
    }

    #[test]
    fn test_health_percentage() {
        let mut health = Health::new(200);
        health.apply_damage(50);
        assert_eq!(health.percentage(), 75);
    }

    #[test]
    fn test_team_hostility() {
        assert!(Team::Player.is_hostile_to(Team::Enemy));
        assert!(Team::Enemy.is_hostile_to(Team::Player));
        assert!(!Team::Player.is_hostile_to(Team::Player));
        assert!(!Team::Player.is_hostile_to(Team::Neutral));
        assert!(!Team::Neutral.is_hostile_to(Team::Enemy));
    }

    #[test]
    fn test_damaged_since_respects_order_time_and_window() {
        let mut status = StatusEffects::default();
        status.last_damaged = Some(100);
        assert!(status.damaged_since(90, 120));
        assert!(!status.damaged_since(101, 120));
        assert!(!status.damaged_since(90, 100 + RECENT_DAMAGE_WINDOW));
    }
}
