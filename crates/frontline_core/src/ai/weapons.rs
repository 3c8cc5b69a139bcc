//! Special-weapon policy.
//!
//! Every [`THINK_INTERVAL`] ticks the AI scores the player's densest cluster
//! and picks at most one weapon in fixed priority: area strike, stun strike,
//! guided missile. Each weapon has its own charges, cooldown and opening
//! grace period. The guided missile also holds a lock while its projectile
//! is in the world, so a second one cannot launch before the first lands.

use super::analysis::{best_cluster, fortified_position, Cluster, Composition};
use super::difficulty::DifficultyProfile;
use super::SpecialWeapon;
use crate::combat::{stun_area, travel_ticks, TargetIndex};
use crate::components::{EntityId, Team};
use crate::effects::{EffectKind, FxCue, SimEvent};
use crate::error::Result;
use crate::math::{Fixed, Vec2Fixed};
use crate::projectiles::{Guidance, Payload, Projectile};
use crate::scheduler::ScheduledAction;
use crate::world::World;

/// Ticks between weapon decisions.
pub const THINK_INTERVAL: u64 = 120;

/// Fuse between the area strike warning and detonation.
pub const NUKE_FUSE: u64 = 180;
/// Area strike radius.
pub const NUKE_RADIUS: i32 = 220;
/// Area strike damage.
pub const NUKE_DAMAGE: u32 = 400;
/// Cluster size that justifies the area strike.
pub const NUKE_CLUSTER: u32 = 10;

/// Stun strike radius.
pub const EMP_RADIUS: i32 = 160;
/// Stun duration.
pub const EMP_STUN_TICKS: u32 = 240;
/// Cluster size that justifies the stun strike.
pub const EMP_CLUSTER: u32 = 6;
/// Armed player structures that justify the stun strike.
pub const EMP_FORTIFIED: u32 = 2;

/// Guided missile blast radius.
pub const MISSILE_RADIUS: i32 = 90;
/// Guided missile blast damage.
pub const MISSILE_DAMAGE: u32 = 180;
/// Guided missile travel per tick.
pub const MISSILE_SPEED: i32 = 6;
/// Cluster size that justifies the guided missile.
pub const MISSILE_CLUSTER: u32 = 3;

/// Charges, cooldown and grace of one weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponCharge {
    /// Launches left.
    pub charges: u32,
    /// Ticks until the next launch is allowed.
    pub cooldown: u32,
    /// Cooldown started by each launch.
    pub reload: u32,
    /// First tick the weapon may launch.
    pub grace: u64,
}

impl WeaponCharge {
    fn new(charges: u32, reload: u32, grace: u64) -> Self {
        Self {
            charges,
            cooldown: 0,
            reload,
            grace,
        }
    }

    /// Whether a launch is allowed on `tick`.
    #[must_use]
    pub fn ready(&self, tick: u64) -> bool {
        self.charges > 0 && self.cooldown == 0 && tick >= self.grace
    }

    fn consume(&mut self) {
        self.charges = self.charges.saturating_sub(1);
        self.cooldown = self.reload;
    }
}

/// AI special-weapon state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialWeapons {
    /// Area strike.
    pub nuke: WeaponCharge,
    /// Stun strike.
    pub emp: WeaponCharge,
    /// Guided missile.
    pub missile: WeaponCharge,
    missile_lock: Option<EntityId>,
    retaliation_pending: bool,
}

impl SpecialWeapons {
    /// Arsenal for `profile`.
    #[must_use]
    pub fn new(profile: &DifficultyProfile) -> Self {
        Self {
            nuke: WeaponCharge::new(profile.nuke_charges, 5400, 3600),
            emp: WeaponCharge::new(profile.emp_charges, 1800, 1800),
            missile: WeaponCharge::new(profile.missile_charges, 900, 2700),
            missile_lock: None,
            retaliation_pending: false,
        }
    }

    /// Projectile holding the missile lock.
    #[must_use]
    pub fn missile_in_flight(&self) -> Option<EntityId> {
        self.missile_lock
    }

    /// Run one tick of the policy.
    pub fn update(&mut self, world: &mut World, composition: &Composition) -> Result<()> {
        for weapon in [&mut self.nuke, &mut self.emp, &mut self.missile] {
            weapon.cooldown = weapon.cooldown.saturating_sub(1);
        }
        self.release_lock(world);

        let forward_lost = world.events().iter().any(|e| {
            matches!(
                e,
                SimEvent::BuildingDestroyed {
                    team: Team::Enemy,
                    forward_defense: true,
                    ..
                }
            )
        });
        if forward_lost {
            self.retaliation_pending = true;
        }

        if self.retaliation_pending {
            self.retaliation_pending = false;
            if self.nuke.charges > 0 {
                let target = best_cluster(world)
                    .map(|c| c.center)
                    .unwrap_or_else(|| world.tunables().lane_point(60));
                tracing::info!(tick = world.tick, "Forward position lost, retaliating");
                self.launch_nuke(world, target);
                return Ok(());
            }
        }

        if world.tick % THINK_INTERVAL != 0 {
            return Ok(());
        }
        let cluster = best_cluster(world);
        self.choose(world, cluster, composition)
    }

    fn release_lock(&mut self, world: &World) {
        if let Some(id) = self.missile_lock {
            if !world.projectiles.iter().any(|p| p.id == id) {
                tracing::debug!(tick = world.tick, projectile = id, "Missile lock released");
                self.missile_lock = None;
            }
        }
    }

    fn choose(
        &mut self,
        world: &mut World,
        cluster: Option<Cluster>,
        composition: &Composition,
    ) -> Result<()> {
        let tick = world.tick;
        let count = cluster.map_or(0, |c| c.count);

        if let Some(cluster) = cluster.filter(|c| c.count >= NUKE_CLUSTER) {
            if self.nuke.ready(tick) {
                self.launch_nuke(world, cluster.center);
                return Ok(());
            }
        }

        if self.emp.ready(tick) {
            let target = if count >= EMP_CLUSTER {
                cluster.map(|c| c.center)
            } else if composition.fortified >= EMP_FORTIFIED {
                fortified_position(world).or_else(|| cluster.map(|c| c.center))
            } else {
                None
            };
            if let Some(target) = target {
                self.launch_emp(world, target);
                return Ok(());
            }
        }

        if let Some(cluster) = cluster.filter(|c| c.count >= MISSILE_CLUSTER) {
            if self.missile.ready(tick) && self.missile_lock.is_none() {
                self.launch_missile(world, cluster.center);
            }
        }
        Ok(())
    }

    fn announce(world: &mut World, weapon: SpecialWeapon, target: Vec2Fixed) {
        world.stats.special_weapons_fired += 1;
        world.push_event(SimEvent::WeaponLaunched {
            team: Team::Enemy,
            weapon,
            target,
        });
        tracing::info!(
            tick = world.tick,
            ?weapon,
            x = target.x.to_num::<f64>(),
            y = target.y.to_num::<f64>(),
            "Special weapon launched"
        );
    }

    fn launch_nuke(&mut self, world: &mut World, target: Vec2Fixed) {
        self.nuke.consume();
        world.scheduler.schedule(
            world.tick + NUKE_FUSE,
            ScheduledAction::Detonation {
                team: Team::Enemy,
                center: target,
                radius: Fixed::from_num(NUKE_RADIUS),
                damage: NUKE_DAMAGE,
            },
        );
        world.spawn_effect(EffectKind::StrikeMarker, target);
        world.emit_fx(FxCue::StrikeWarning, target);
        Self::announce(world, SpecialWeapon::Nuke, target);
    }

    fn launch_emp(&mut self, world: &mut World, target: Vec2Fixed) {
        self.emp.consume();
        let index = TargetIndex::build(world);
        let stunned = stun_area(
            world,
            &index,
            Team::Enemy,
            target,
            Fixed::from_num(EMP_RADIUS),
            EMP_STUN_TICKS,
        );
        tracing::debug!(tick = world.tick, stunned, "Stun strike resolved");
        Self::announce(world, SpecialWeapon::Emp, target);
    }

    fn launch_missile(&mut self, world: &mut World, target: Vec2Fixed) {
        self.missile.consume();
        let origin = world.base_position(Team::Enemy);
        let id = launch_guided_missile(
            world,
            Team::Enemy,
            origin,
            target,
            Payload::Blast {
                damage: MISSILE_DAMAGE,
                radius: Fixed::from_num(MISSILE_RADIUS),
            },
            Fixed::from_num(MISSILE_SPEED),
        );
        self.missile_lock = Some(id);
        Self::announce(world, SpecialWeapon::Missile, target);
    }
}

/// Launch a timed munition from `origin` to `target` and schedule its impact.
///
/// Returns the projectile id. Shared by the AI and the player's guided
/// missile ability.
pub fn launch_guided_missile(
    world: &mut World,
    team: Team,
    origin: Vec2Fixed,
    target: Vec2Fixed,
    payload: Payload,
    speed: Fixed,
) -> EntityId {
    let id = world.next_id();
    let flight = travel_ticks(origin, target, speed);
    let arrives_at = world.tick + u64::from(flight);
    world.projectiles.push(Projectile::new(
        id,
        team,
        origin,
        Guidance::Timed {
            origin,
            destination: target,
            launched_at: world.tick,
            arrives_at,
        },
        speed,
        payload,
        flight + 60,
    ));
    world
        .scheduler
        .schedule(arrives_at, ScheduledAction::MissileImpact { projectile: id });
    world.emit_fx(FxCue::StrikeWarning, target);
    id
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ai::analysis::assess;
    use crate::ai::difficulty::{profile, Difficulty};
    use crate::catalog::Catalog;

    fn world_with_cluster(size: i32) -> World {
        let mut world = World::new(Arc::new(Catalog::standard()), 5);
        for i in 0..size {
            world.spawn_unit(Team::Player, "infantry", Vec2Fixed::from_ints(1200 + i * 5, 200));
        }
        world
    }

    #[test]
    fn test_missile_waits_for_grace_and_interval() {
        let mut world = world_with_cluster(4);
        let mut weapons = SpecialWeapons::new(&profile(Difficulty::Recruit));
        let composition = assess(&world);

        world.tick = 2640;
        weapons.update(&mut world, &composition).expect("update");
        assert!(weapons.missile_in_flight().is_none());

        world.tick = 2760;
        weapons.update(&mut world, &composition).expect("update");
        assert!(weapons.missile_in_flight().is_some());
        assert_eq!(weapons.missile.charges, 2);
        assert_eq!(world.scheduler.len(), 1);
        assert_eq!(world.stats.special_weapons_fired, 1);
    }

    #[test]
    fn test_missile_lock_outlasts_cooldown() {
        let mut world = world_with_cluster(4);
        let mut weapons = SpecialWeapons::new(&profile(Difficulty::Recruit));
        let composition = assess(&world);

        world.tick = 2760;
        weapons.update(&mut world, &composition).expect("launch");
        let id = weapons.missile_in_flight().expect("locked");

        weapons.missile.cooldown = 0;
        world.tick = 2880;
        weapons.update(&mut world, &composition).expect("update");
        assert_eq!(weapons.missile_in_flight(), Some(id));
        assert_eq!(weapons.missile.charges, 2);

        world.projectiles.clear();
        world.tick = 3000;
        weapons.update(&mut world, &composition).expect("update");
        assert_ne!(weapons.missile_in_flight(), Some(id));
        assert_eq!(weapons.missile.charges, 1);
    }

    #[test]
    fn test_large_cluster_draws_area_strike() {
        let mut world = world_with_cluster(12);
        let mut weapons = SpecialWeapons::new(&profile(Difficulty::Elite));
        let composition = assess(&world);

        world.tick = 3600;
        weapons.update(&mut world, &composition).expect("update");
        assert_eq!(weapons.nuke.charges, 0);
        assert_eq!(weapons.emp.charges, 3);
        assert!(matches!(
            world.scheduler.drain_due(3600 + NUKE_FUSE).as_slice(),
            [ScheduledAction::Detonation { damage: NUKE_DAMAGE, .. }]
        ));
    }

    #[test]
    fn test_forward_loss_triggers_one_retaliation() {
        let mut world = world_with_cluster(2);
        let mut weapons = SpecialWeapons::new(&profile(Difficulty::Elite));
        world.tick = 10;
        world.push_event(SimEvent::BuildingDestroyed {
            id: 99,
            team: Team::Enemy,
            key: "bunker".to_string(),
            headquarters: false,
            forward_defense: true,
        });

        weapons.update(&mut world, &Composition::default()).expect("update");
        assert_eq!(weapons.nuke.charges, 0);
        assert_eq!(world.scheduler.len(), 1);

        world.take_events();
        world.tick = 11;
        weapons.update(&mut world, &Composition::default()).expect("update");
        assert_eq!(world.scheduler.len(), 1);
    }

    #[test]
    fn test_emp_stuns_cluster() {
        let mut world = world_with_cluster(7);
        let mut weapons = SpecialWeapons::new(&profile(Difficulty::Veteran));
        let composition = assess(&world);

        world.tick = 1800;
        weapons.update(&mut world, &composition).expect("update");
        assert_eq!(weapons.emp.charges, 1);
        assert!(world
            .units(Team::Player)
            .iter()
            .all(|u| u.status.is_stunned()));
    }
}
