//! Projectiles.
//!
//! Trajectories are simple kinematics: homing shells chase their target,
//! point shots fly straight, and timed munitions interpolate from launch to
//! impact while the scheduler decides when they actually land.

use crate::combat::{deliver_area, resolve_impact, TargetIndex, WeaponProfile};
use crate::components::{EntityId, Team};
use crate::effects::{EffectKind, ExplosionClass, FxCue};
use crate::error::Result;
use crate::math::{Fixed, Vec2Fixed};
use crate::world::World;

/// How a projectile finds its impact point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Guidance {
    /// Follows a target, falling back to its last known position.
    Homing {
        /// Target entity.
        target: EntityId,
        /// Last position the target was seen at.
        last_known: Vec2Fixed,
    },
    /// Flies straight to a point.
    Point {
        /// Impact point.
        destination: Vec2Fixed,
    },
    /// Interpolates between launch and impact; detonation is scheduled.
    Timed {
        /// Launch point.
        origin: Vec2Fixed,
        /// Impact point.
        destination: Vec2Fixed,
        /// Tick of launch.
        launched_at: u64,
        /// Tick of impact.
        arrives_at: u64,
    },
}

/// What a projectile does on impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Damage of the firing weapon (single target or its splash).
    Weapon(WeaponProfile),
    /// Flat damage to everything hostile in a radius.
    Blast {
        /// Damage per entity.
        damage: u32,
        /// Blast radius.
        radius: Fixed,
    },
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projectile {
    /// Entity id.
    pub id: EntityId,
    /// Side that fired it.
    pub team: Team,
    /// Current position.
    pub position: Vec2Fixed,
    /// Guidance mode.
    pub guidance: Guidance,
    /// Travel per tick.
    pub speed: Fixed,
    /// Impact effect.
    pub payload: Payload,
    /// Ticks before it expires unresolved.
    pub ttl: u32,
    /// Impacted or expired; removed at the end of the tick.
    pub spent: bool,
}

impl Projectile {
    /// Create a projectile.
    #[must_use]
    pub fn new(
        id: EntityId,
        team: Team,
        position: Vec2Fixed,
        guidance: Guidance,
        speed: Fixed,
        payload: Payload,
        ttl: u32,
    ) -> Self {
        Self {
            id,
            team,
            position,
            guidance,
            speed,
            payload,
            ttl,
            spent: false,
        }
    }

    /// Where the projectile is heading.
    #[must_use]
    pub fn destination(&self) -> Vec2Fixed {
        match self.guidance {
            Guidance::Homing { last_known, .. } => last_known,
            Guidance::Point { destination } | Guidance::Timed { destination, .. } => destination,
        }
    }
}

/// Advance one projectile by a tick, resolving its impact if it arrives.
pub fn update_projectile(
    world: &mut World,
    index: &mut TargetIndex,
    projectile: &mut Projectile,
) -> Result<()> {
    if projectile.spent {
        return Ok(());
    }

    projectile.ttl = projectile.ttl.saturating_sub(1);
    if projectile.ttl == 0 {
        tracing::debug!(projectile = projectile.id, "Projectile expired");
        projectile.spent = true;
        return Ok(());
    }

    match projectile.guidance {
        Guidance::Homing { target, last_known } => {
            let aim = index
                .get(target)
                .filter(|e| e.alive)
                .map_or(last_known, |e| e.position);
            projectile.guidance = Guidance::Homing {
                target,
                last_known: aim,
            };
            let (position, arrived) = projectile.position.step_towards(aim, projectile.speed);
            projectile.position = position;
            if arrived {
                projectile.spent = true;
                let target = index.is_alive(target).then_some(target);
                detonate(world, index, projectile, target, aim)?;
            }
        }
        Guidance::Point { destination } => {
            let (position, arrived) = projectile
                .position
                .step_towards(destination, projectile.speed);
            projectile.position = position;
            if arrived {
                projectile.spent = true;
                detonate(world, index, projectile, None, destination)?;
            }
        }
        Guidance::Timed {
            origin,
            destination,
            launched_at,
            arrives_at,
        } => {
            let span = arrives_at.saturating_sub(launched_at).max(1);
            let elapsed = world.tick.saturating_sub(launched_at).min(span);
            let t = Fixed::from_num(elapsed) / Fixed::from_num(span);
            projectile.position = origin.lerp(destination, t);
        }
    }
    Ok(())
}

/// Apply a projectile's payload at `point`.
pub fn detonate(
    world: &mut World,
    index: &mut TargetIndex,
    projectile: &Projectile,
    target: Option<EntityId>,
    point: Vec2Fixed,
) -> Result<()> {
    match projectile.payload {
        Payload::Weapon(weapon) => {
            if weapon.splash_radius == Fixed::ZERO && target.is_none() {
                return Ok(());
            }
            resolve_impact(world, index, projectile.team, &weapon, target, point)
        }
        Payload::Blast { damage, radius } => {
            let hits = deliver_area(world, index, projectile.team, point, radius, |_| damage)?;
            tracing::debug!(projectile = projectile.id, hits, "Blast resolved");
            world.emit_fx(FxCue::Explosion(ExplosionClass::Large), point);
            world.spawn_effect(EffectKind::Explosion(ExplosionClass::Large), point);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_per_guidance() {
        let point = Vec2Fixed::from_ints(10, 20);
        let shell = Projectile::new(
            1,
            Team::Player,
            Vec2Fixed::ZERO,
            Guidance::Point { destination: point },
            Fixed::from_num(5),
            Payload::Blast {
                damage: 10,
                radius: Fixed::from_num(5),
            },
            100,
        );
        assert_eq!(shell.destination(), point);
        assert!(!shell.spent);
    }
}
