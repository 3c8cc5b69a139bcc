//! Target acquisition and damage resolution.
//!
//! Updates read a per-tick [`TargetIndex`] snapshot of every unit and
//! building instead of borrowing the collections being updated. The index
//! is kept current as units move and die, so a unit killed earlier in the
//! tick is already excluded from later targeting queries.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;

use crate::catalog::{BehaviorKind, Domain, TurretWeapon, UnitArchetype, UnitCategory};
use crate::components::{EntityId, Team};
use crate::effects::{EffectKind, ExplosionClass, FxCue, SimEvent};
use crate::error::{GameError, Result};
use crate::math::{percent, Fixed, Vec2Fixed};
use crate::projectiles::{Guidance, Payload, Projectile};
use crate::units::BehaviorState;
use crate::world::World;

/// Extra range a sticky target may drift before it is dropped.
pub const STICKY_SLACK: i32 = 20;

/// Stealthed targets are only visible inside this radius.
pub const STEALTH_DETECTION_RADIUS: i32 = 80;

/// Score bonus anti-air attackers give to air targets.
pub const AIR_PREFERENCE_BONUS: i32 = 1000;

/// Score penalty other attackers give to air targets.
pub const AIR_AVOIDANCE_PENALTY: i32 = 400;

/// Score penalty for buildings, so units are preferred.
pub const BUILDING_SCORE_PENALTY: i32 = 200;

// ============================================================================
// Target Index
// ============================================================================

/// Where an entity lives in the world collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Slot in the unit list of a team.
    Unit(Team, usize),
    /// Slot in the building list.
    Building(usize),
}

/// Snapshot of one targetable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetEntry {
    /// Entity id.
    pub id: EntityId,
    /// Owning team.
    pub team: Team,
    /// Collection slot.
    pub locator: Locator,
    /// Current position.
    pub position: Vec2Fixed,
    /// Movement domain (buildings are ground).
    pub domain: Domain,
    /// Unit category; `None` for buildings.
    pub category: Option<UnitCategory>,
    /// Stealthed.
    pub stealth: bool,
    /// Cannot be acquired as a target.
    pub invulnerable: bool,
    /// Ignores all damage.
    pub immune: bool,
    /// Chance in percent to negate a hit.
    pub evasion: u32,
    /// Building or turret with a weapon.
    pub fortified: bool,
    /// Still alive this tick.
    pub alive: bool,
}

impl TargetEntry {
    /// Whether this entry is a building.
    #[must_use]
    pub const fn is_building(&self) -> bool {
        matches!(self.locator, Locator::Building(_))
    }

    /// Whether this entry flies.
    #[must_use]
    pub fn is_air(&self) -> bool {
        self.domain == Domain::Air
    }
}

/// Per-tick lookup of every unit and building.
#[derive(Debug, Clone, Default)]
pub struct TargetIndex {
    entries: Vec<TargetEntry>,
    slots: HashMap<EntityId, usize>,
}

impl TargetIndex {
    /// Snapshot the world: buildings, then player units, then enemy units.
    #[must_use]
    pub fn build(world: &World) -> Self {
        let mut index = Self::default();

        for (slot, building) in world.buildings.iter().enumerate() {
            index.push(TargetEntry {
                id: building.body.id,
                team: building.body.team,
                locator: Locator::Building(slot),
                position: building.body.position,
                domain: Domain::Ground,
                category: None,
                stealth: false,
                invulnerable: false,
                immune: false,
                evasion: 0,
                fortified: building.archetype.weapon.is_some(),
                alive: !building.body.is_dead(),
            });
        }

        for team in [Team::Player, Team::Enemy] {
            for (slot, unit) in world.units(team).iter().enumerate() {
                let archetype = &unit.archetype;
                index.push(TargetEntry {
                    id: unit.body.id,
                    team,
                    locator: Locator::Unit(team, slot),
                    position: unit.body.position,
                    domain: archetype.domain,
                    category: Some(archetype.category),
                    stealth: archetype.stealth,
                    invulnerable: archetype.invulnerable,
                    immune: archetype.invulnerable && archetype.behavior != BehaviorKind::Transport,
                    evasion: archetype.evasion,
                    fortified: archetype.behavior == BehaviorKind::Turret,
                    alive: unit.is_alive(),
                });
            }
        }

        index
    }

    fn push(&mut self, entry: TargetEntry) {
        self.slots.insert(entry.id, self.entries.len());
        self.entries.push(entry);
    }

    /// Look up an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&TargetEntry> {
        self.slots.get(&id).map(|&slot| &self.entries[slot])
    }

    /// Whether the entity exists and is alive.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(|e| e.alive)
    }

    /// All entries in snapshot order.
    #[must_use]
    pub fn entries(&self) -> &[TargetEntry] {
        &self.entries
    }

    /// Living entries hostile to `team`.
    pub fn hostile_to(&self, team: Team) -> impl Iterator<Item = &TargetEntry> {
        self.entries
            .iter()
            .filter(move |e| e.alive && team.is_hostile_to(e.team))
    }

    /// Record a unit's new position.
    pub fn update_position(&mut self, id: EntityId, position: Vec2Fixed) {
        if let Some(&slot) = self.slots.get(&id) {
            self.entries[slot].position = position;
        }
    }

    /// Exclude an entity from all further queries this tick.
    pub fn mark_dead(&mut self, id: EntityId) {
        if let Some(&slot) = self.slots.get(&id) {
            self.entries[slot].alive = false;
        }
    }
}

// ============================================================================
// Weapons and Damage
// ============================================================================

/// Everything targeting and damage need to know about a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponProfile {
    /// Base damage.
    pub damage: u32,
    /// Damage override against air.
    pub air_damage: Option<u32>,
    /// Damage override against ground and buildings.
    pub ground_damage: Option<u32>,
    /// Range.
    pub range: Fixed,
    /// Ticks between shots.
    pub cooldown: u32,
    /// Reaches air targets.
    pub can_hit_air: bool,
    /// Reaches ground targets.
    pub can_hit_ground: bool,
    /// Prefers air targets.
    pub anti_air: bool,
    /// Attacker class for matchup multipliers.
    pub category: UnitCategory,
    /// Area radius at the impact point.
    pub splash_radius: Fixed,
    /// Projectile speed (0 = instant).
    pub projectile_speed: Fixed,
}

impl WeaponProfile {
    /// Weapon carried by a unit archetype.
    #[must_use]
    pub fn from_unit(archetype: &UnitArchetype) -> Self {
        Self {
            damage: archetype.damage,
            air_damage: archetype.air_damage,
            ground_damage: archetype.ground_damage,
            range: archetype.range,
            cooldown: archetype.attack_cooldown(),
            can_hit_air: archetype.can_hit_air,
            can_hit_ground: archetype.can_hit_ground,
            anti_air: archetype.anti_air,
            category: archetype.category,
            splash_radius: archetype.splash_radius,
            projectile_speed: archetype.projectile_speed,
        }
    }

    /// Weapon mounted on a building.
    #[must_use]
    pub fn from_turret(weapon: &TurretWeapon) -> Self {
        Self {
            damage: weapon.damage,
            air_damage: None,
            ground_damage: None,
            range: weapon.range,
            cooldown: weapon.cooldown,
            can_hit_air: weapon.can_hit_air,
            can_hit_ground: weapon.can_hit_ground,
            anti_air: weapon.can_hit_air && !weapon.can_hit_ground,
            category: UnitCategory::Emplacement,
            splash_radius: Fixed::ZERO,
            projectile_speed: Fixed::ZERO,
        }
    }

    /// Whether the weapon can reach the target's domain.
    #[must_use]
    pub fn can_reach(&self, target: &TargetEntry) -> bool {
        if target.is_air() {
            self.can_hit_air
        } else {
            self.can_hit_ground
        }
    }

    /// Damage before matchup multipliers.
    #[must_use]
    pub fn base_damage_against(&self, target: &TargetEntry) -> u32 {
        let override_damage = if target.is_air() {
            self.air_damage
        } else {
            self.ground_damage
        };
        override_damage.unwrap_or(self.damage)
    }

    /// Final damage of one hit on `target`.
    #[must_use]
    pub fn damage_against(&self, target: &TargetEntry) -> u32 {
        let base = self.base_damage_against(target);
        let scaled = Fixed::from_num(base) * matchup_multiplier(self, target);
        scaled.saturating_to_num::<u32>()
    }
}

/// Category-versus-category damage multiplier.
#[must_use]
pub fn matchup_multiplier(weapon: &WeaponProfile, target: &TargetEntry) -> Fixed {
    use UnitCategory as C;

    let value = match (weapon.category, target.category) {
        (C::LightVehicle, _) if weapon.anti_air && !target.is_air() => 50,
        (_, Some(C::Bomber)) if weapon.anti_air => 150,
        (C::AntiArmor, Some(C::Tank)) => 150,
        (C::Artillery, None) => 125,
        (C::Tank, Some(C::Infantry)) => 75,
        (C::Drone, None) => 50,
        _ => 100,
    };
    percent(value)
}

// ============================================================================
// Targeting
// ============================================================================

fn visible_to(target: &TargetEntry, from: Vec2Fixed) -> bool {
    !target.stealth || from.within(target.position, Fixed::from_num(STEALTH_DETECTION_RADIUS))
}

fn can_engage(team: Team, from: Vec2Fixed, weapon: &WeaponProfile, target: &TargetEntry) -> bool {
    target.alive
        && team.is_hostile_to(target.team)
        && !target.invulnerable
        && weapon.can_reach(target)
        && visible_to(target, from)
}

fn target_score(from: Vec2Fixed, weapon: &WeaponProfile, target: &TargetEntry) -> Fixed {
    let mut score = from.distance(target.position);
    if target.is_air() {
        if weapon.anti_air {
            score -= Fixed::from_num(AIR_PREFERENCE_BONUS);
        } else {
            score += Fixed::from_num(AIR_AVOIDANCE_PENALTY);
        }
    }
    if target.is_building() {
        score += Fixed::from_num(BUILDING_SCORE_PENALTY);
    }
    score
}

/// Pick the best hostile target within weapon range.
///
/// Lowest score wins; ties go to the earlier entry (buildings, then units in
/// spawn order).
#[must_use]
pub fn acquire_target(
    index: &TargetIndex,
    team: Team,
    from: Vec2Fixed,
    weapon: &WeaponProfile,
) -> Option<EntityId> {
    if weapon.range <= Fixed::ZERO {
        return None;
    }

    let mut best: Option<(Fixed, EntityId)> = None;
    for target in index.entries() {
        if !can_engage(team, from, weapon, target) || !from.within(target.position, weapon.range) {
            continue;
        }
        let score = target_score(from, weapon, target);
        if best.map_or(true, |(s, _)| score < s) {
            best = Some((score, target.id));
        }
    }
    best.map(|(_, id)| id)
}

/// Whether a previously acquired target may be kept.
#[must_use]
pub fn sticky_target_valid(
    index: &TargetIndex,
    team: Team,
    from: Vec2Fixed,
    weapon: &WeaponProfile,
    target: EntityId,
) -> bool {
    let Some(entry) = index.get(target) else {
        return false;
    };
    can_engage(team, from, weapon, entry)
        && from.within(entry.position, weapon.range + Fixed::from_num(STICKY_SLACK))
}

/// Keep the current target if still valid, otherwise acquire a new one.
#[must_use]
pub fn select_target(
    index: &TargetIndex,
    team: Team,
    from: Vec2Fixed,
    weapon: &WeaponProfile,
    current: Option<EntityId>,
) -> Option<EntityId> {
    match current {
        Some(id) if sticky_target_valid(index, team, from, weapon, id) => Some(id),
        _ => acquire_target(index, team, from, weapon),
    }
}

// ============================================================================
// Hits
// ============================================================================

/// What became of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Target already dead or not hostile.
    Missed,
    /// Invulnerable target ignored the hit.
    Immune,
    /// Evasion roll negated the hit.
    Evaded,
    /// Damage applied.
    Damaged {
        /// Hit points removed.
        dealt: u32,
        /// The hit was lethal.
        killed: bool,
    },
}

/// Apply `damage` from `team` to one entity.
pub fn deliver_hit(
    world: &mut World,
    index: &mut TargetIndex,
    team: Team,
    target: EntityId,
    damage: u32,
) -> Result<HitOutcome> {
    let entry = *index.get(target).ok_or(GameError::EntityNotFound(target))?;
    if !entry.alive || !team.is_hostile_to(entry.team) {
        return Ok(HitOutcome::Missed);
    }
    if entry.immune {
        return Ok(HitOutcome::Immune);
    }
    if entry.evasion > 0 && world.rng().gen_range(0..100) < entry.evasion {
        world.emit_fx(FxCue::Evade, entry.position);
        return Ok(HitOutcome::Evaded);
    }

    let outcome = match entry.locator {
        Locator::Building(slot) => hit_building(world, slot, target, damage)?,
        Locator::Unit(owner, slot) => hit_unit(world, owner, slot, target, damage)?,
    };

    world.stats.record_damage(team, outcome.0);
    world.emit_fx(FxCue::Impact, entry.position);
    if outcome.1 {
        index.mark_dead(target);
    }

    Ok(HitOutcome::Damaged {
        dealt: outcome.0,
        killed: outcome.1,
    })
}

fn hit_building(world: &mut World, slot: usize, id: EntityId, damage: u32) -> Result<(u32, bool)> {
    let building = world
        .buildings
        .get_mut(slot)
        .filter(|b| b.body.id == id)
        .ok_or(GameError::EntityNotFound(id))?;

    let (dealt, died) = building.body.apply_damage(damage);
    if died {
        let team = building.body.team;
        let position = building.body.position;
        let event = SimEvent::BuildingDestroyed {
            id,
            team,
            key: building.archetype.key.clone(),
            headquarters: building.archetype.headquarters,
            forward_defense: building.archetype.forward_defense,
        };
        world.stats.record_building_loss(team);
        world.push_event(event);
        world.emit_fx(FxCue::Explosion(ExplosionClass::Large), position);
        world.spawn_effect(EffectKind::Explosion(ExplosionClass::Large), position);
    }
    Ok((dealt, died))
}

fn hit_unit(
    world: &mut World,
    team: Team,
    slot: usize,
    id: EntityId,
    damage: u32,
) -> Result<(u32, bool)> {
    let tick = world.tick;
    let unit = world
        .units_mut(team)
        .get_mut(slot)
        .filter(|u| u.body.id == id)
        .ok_or(GameError::EntityNotFound(id))?;

    let (dealt, died) = unit.body.apply_damage(damage);
    unit.status.last_damaged = Some(tick);

    let mut release_cargo = false;
    if let BehaviorState::Transport { loaded } = &mut unit.behavior {
        let below_threshold = unit
            .archetype
            .reinforce_below_percent
            .is_some_and(|threshold| unit.body.health.percentage() < threshold);
        if *loaded && (died || below_threshold) {
            *loaded = false;
            release_cargo = true;
        }
    }

    let position = unit.body.position;
    let archetype = Arc::clone(&unit.archetype);

    if release_cargo {
        world.unload_cargo(team, &archetype, position);
    }
    if died {
        world.record_unit_death(team, id, &archetype.key, position);
    }
    Ok((dealt, died))
}

/// Apply area damage around `center` to everything hostile to `team`.
///
/// `damage` computes the hit for each entity in the blast. Returns the number
/// of entities damaged.
pub fn deliver_area<F>(
    world: &mut World,
    index: &mut TargetIndex,
    team: Team,
    center: Vec2Fixed,
    radius: Fixed,
    damage: F,
) -> Result<u32>
where
    F: Fn(&TargetEntry) -> u32,
{
    let victims: Vec<(EntityId, u32)> = index
        .hostile_to(team)
        .filter(|e| center.within(e.position, radius))
        .map(|e| (e.id, damage(e)))
        .collect();

    let mut damaged = 0;
    for (id, amount) in victims {
        if let HitOutcome::Damaged { .. } = deliver_hit(world, index, team, id, amount)? {
            damaged += 1;
        }
    }
    Ok(damaged)
}

/// Stun every hostile unit within `radius`. Buildings are unaffected.
pub fn stun_area(
    world: &mut World,
    index: &TargetIndex,
    team: Team,
    center: Vec2Fixed,
    radius: Fixed,
    ticks: u32,
) -> u32 {
    let mut stunned = 0;
    for entry in index.hostile_to(team) {
        let Locator::Unit(owner, slot) = entry.locator else {
            continue;
        };
        if !center.within(entry.position, radius) {
            continue;
        }
        if let Some(unit) = world.units_mut(owner).get_mut(slot) {
            if unit.body.id == entry.id {
                unit.status.stun(ticks);
                unit.attack.target = None;
                stunned += 1;
            }
        }
    }
    world.emit_fx(FxCue::EmpPulse, center);
    world.spawn_effect(EffectKind::EmpPulse, center);
    stunned
}

/// Resolve a weapon's impact at `point`: area damage with splash, else a single hit.
pub fn resolve_impact(
    world: &mut World,
    index: &mut TargetIndex,
    team: Team,
    weapon: &WeaponProfile,
    target: Option<EntityId>,
    point: Vec2Fixed,
) -> Result<()> {
    if weapon.splash_radius > Fixed::ZERO {
        deliver_area(world, index, team, point, weapon.splash_radius, |e| {
            weapon.damage_against(e)
        })?;
        world.spawn_effect(EffectKind::Explosion(ExplosionClass::Small), point);
        world.emit_fx(FxCue::Explosion(ExplosionClass::Small), point);
        return Ok(());
    }

    if let Some(id) = target {
        if let Some(entry) = index.get(id).copied() {
            deliver_hit(world, index, team, id, weapon.damage_against(&entry))?;
        }
    }
    Ok(())
}

/// Fire at `target`: launch a projectile or hit instantly.
pub fn fire_weapon(
    world: &mut World,
    index: &mut TargetIndex,
    team: Team,
    origin: Vec2Fixed,
    weapon: &WeaponProfile,
    target: EntityId,
) -> Result<()> {
    let Some(entry) = index.get(target).copied() else {
        return Ok(());
    };
    world.emit_fx(FxCue::WeaponFire(weapon.category), origin);

    if weapon.projectile_speed > Fixed::ZERO {
        let id = world.next_id();
        let ttl = travel_ticks(origin, entry.position, weapon.projectile_speed) * 2 + 30;
        world.projectiles.push(Projectile::new(
            id,
            team,
            origin,
            Guidance::Homing {
                target,
                last_known: entry.position,
            },
            weapon.projectile_speed,
            Payload::Weapon(*weapon),
            ttl,
        ));
        return Ok(());
    }

    world.spawn_effect(EffectKind::Muzzle, origin);
    resolve_impact(world, index, team, weapon, Some(target), entry.position)
}

/// Whole ticks needed to cover the distance at `speed`, at least one.
#[must_use]
pub fn travel_ticks(from: Vec2Fixed, to: Vec2Fixed, speed: Fixed) -> u32 {
    if speed <= Fixed::ZERO {
        return 1;
    }
    let ticks = (from.distance(to) / speed).ceil();
    ticks.saturating_to_num::<u32>().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(team: Team, x: i32, category: Option<UnitCategory>) -> TargetEntry {
        TargetEntry {
            id: x as EntityId,
            team,
            locator: match category {
                Some(_) => Locator::Unit(team, 0),
                None => Locator::Building(0),
            },
            position: Vec2Fixed::from_ints(x, 0),
            domain: Domain::Ground,
            category,
            stealth: false,
            invulnerable: false,
            immune: false,
            evasion: 0,
            fortified: false,
            alive: true,
        }
    }

    fn index_of(entries: Vec<TargetEntry>) -> TargetIndex {
        let mut index = TargetIndex::default();
        for e in entries {
            index.push(e);
        }
        index
    }

    fn rifle() -> WeaponProfile {
        WeaponProfile::from_unit(&UnitArchetype::fallback("rifle"))
    }

    #[test]
    fn test_acquire_prefers_nearest_in_range() {
        let index = index_of(vec![
            entry(Team::Enemy, 90, Some(UnitCategory::Infantry)),
            entry(Team::Enemy, 40, Some(UnitCategory::Infantry)),
            entry(Team::Enemy, 300, Some(UnitCategory::Infantry)),
        ]);
        let target = acquire_target(&index, Team::Player, Vec2Fixed::ZERO, &rifle());
        assert_eq!(target, Some(40));
    }

    #[test]
    fn test_acquire_ignores_friendly_neutral_and_out_of_range() {
        let index = index_of(vec![
            entry(Team::Player, 10, Some(UnitCategory::Infantry)),
            entry(Team::Neutral, 20, Some(UnitCategory::Infantry)),
            entry(Team::Enemy, 500, Some(UnitCategory::Infantry)),
        ]);
        assert_eq!(acquire_target(&index, Team::Player, Vec2Fixed::ZERO, &rifle()), None);
    }

    #[test]
    fn test_buildings_rank_behind_units() {
        let index = index_of(vec![
            entry(Team::Enemy, 30, None),
            entry(Team::Enemy, 95, Some(UnitCategory::Infantry)),
        ]);
        let target = acquire_target(&index, Team::Player, Vec2Fixed::ZERO, &rifle());
        assert_eq!(target, Some(95));
    }

    #[test]
    fn test_anti_air_prefers_aircraft() {
        let mut jet = entry(Team::Enemy, 150, Some(UnitCategory::Aircraft));
        jet.domain = Domain::Air;
        let index = index_of(vec![entry(Team::Enemy, 20, Some(UnitCategory::Tank)), jet]);

        let mut weapon = rifle();
        weapon.range = Fixed::from_num(200);
        weapon.can_hit_air = true;
        weapon.anti_air = true;
        assert_eq!(acquire_target(&index, Team::Player, Vec2Fixed::ZERO, &weapon), Some(150));

        weapon.anti_air = false;
        assert_eq!(acquire_target(&index, Team::Player, Vec2Fixed::ZERO, &weapon), Some(20));
    }

    #[test]
    fn test_stealth_needs_detection_radius() {
        let mut hidden = entry(Team::Enemy, 95, Some(UnitCategory::Tank));
        hidden.stealth = true;
        let index = index_of(vec![hidden]);
        assert_eq!(acquire_target(&index, Team::Player, Vec2Fixed::ZERO, &rifle()), None);

        let from = Vec2Fixed::from_ints(30, 0);
        assert_eq!(acquire_target(&index, Team::Player, from, &rifle()), Some(95));
    }

    #[test]
    fn test_sticky_target_survives_slack_then_drops() {
        let mut index = index_of(vec![entry(Team::Enemy, 100, Some(UnitCategory::Infantry))]);
        let weapon = rifle();
        assert!(sticky_target_valid(&index, Team::Player, Vec2Fixed::ZERO, &weapon, 100));

        index.update_position(100, Vec2Fixed::from_ints(115, 0));
        assert!(sticky_target_valid(&index, Team::Player, Vec2Fixed::ZERO, &weapon, 100));
        assert_eq!(acquire_target(&index, Team::Player, Vec2Fixed::ZERO, &weapon), None);

        index.update_position(100, Vec2Fixed::from_ints(125, 0));
        assert!(!sticky_target_valid(&index, Team::Player, Vec2Fixed::ZERO, &weapon, 100));
    }

    #[test]
    fn test_dead_targets_are_dropped() {
        let mut index = index_of(vec![entry(Team::Enemy, 50, Some(UnitCategory::Infantry))]);
        index.mark_dead(50);
        assert!(!sticky_target_valid(&index, Team::Player, Vec2Fixed::ZERO, &rifle(), 50));
        assert!(!index.is_alive(50));
    }

    #[test]
    fn test_matchup_multipliers() {
        let catalog = crate::catalog::Catalog::standard();
        let rockets = WeaponProfile::from_unit(&catalog.resolve_unit("rocket_infantry"));
        let tank = entry(Team::Enemy, 1, Some(UnitCategory::Tank));
        assert_eq!(rockets.damage_against(&tank), 60);

        let jeep = WeaponProfile::from_unit(&catalog.resolve_unit("aa_jeep"));
        assert_eq!(jeep.damage_against(&tank), 7);

        let flak = WeaponProfile::from_unit(&catalog.resolve_unit("aa_tank"));
        let mut bomber = entry(Team::Enemy, 2, Some(UnitCategory::Bomber));
        bomber.domain = Domain::Air;
        assert_eq!(flak.damage_against(&bomber), 45);
        assert_eq!(flak.damage_against(&tank), 8);

        let guns = WeaponProfile::from_unit(&catalog.resolve_unit("artillery"));
        assert_eq!(guns.damage_against(&entry(Team::Enemy, 3, None)), 87);
    }

    fn hp(world: &World, id: EntityId) -> u32 {
        world.unit(id).map_or(0, |u| u.body.health.current)
    }

    #[test]
    fn test_invulnerable_units_shrug_off_hits() {
        let mut world = World::empty(Arc::new(crate::catalog::Catalog::standard()), 11);
        let jet = world.spawn_unit(Team::Enemy, "strike_jet", Vec2Fixed::from_ints(500, 200));
        let mut index = TargetIndex::build(&world);

        let outcome = deliver_hit(&mut world, &mut index, Team::Player, jet, 50).expect("hit");
        assert_eq!(outcome, HitOutcome::Immune);
        assert_eq!(hp(&world, jet), 200);
    }

    #[test]
    fn test_invulnerable_transport_still_takes_damage() {
        let mut world = World::empty(Arc::new(crate::catalog::Catalog::standard()), 11);
        let heli = world.spawn_unit(Team::Enemy, "transport_heli", Vec2Fixed::from_ints(500, 200));
        let mut index = TargetIndex::build(&world);

        let outcome = deliver_hit(&mut world, &mut index, Team::Player, heli, 30).expect("hit");
        assert_eq!(
            outcome,
            HitOutcome::Damaged {
                dealt: 30,
                killed: false
            }
        );
        assert_eq!(hp(&world, heli), 220);

        let hits = deliver_area(
            &mut world,
            &mut index,
            Team::Player,
            Vec2Fixed::from_ints(500, 200),
            Fixed::from_num(50),
            |_| 20,
        )
        .expect("blast");
        assert_eq!(hits, 1);
        assert_eq!(hp(&world, heli), 200);
    }

    #[test]
    fn test_evasion_negates_some_hits() {
        let mut world = World::empty(Arc::new(crate::catalog::Catalog::standard()), 11);
        let drone = world.spawn_unit(Team::Enemy, "drone", Vec2Fixed::from_ints(500, 200));
        let mut index = TargetIndex::build(&world);

        let mut evaded = 0;
        let mut landed = 0;
        for _ in 0..30 {
            match deliver_hit(&mut world, &mut index, Team::Player, drone, 1).expect("hit") {
                HitOutcome::Evaded => evaded += 1,
                HitOutcome::Damaged { dealt: 1, .. } => landed += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert!(evaded > 0, "no hit was evaded");
        assert!(landed > 0, "every hit was evaded");
        assert_eq!(hp(&world, drone), 40 - landed);
    }

    #[test]
    fn test_evasion_rolls_replay_with_seed() {
        let rolls = |seed: u64| {
            let mut world = World::empty(Arc::new(crate::catalog::Catalog::standard()), seed);
            let drone = world.spawn_unit(Team::Enemy, "drone", Vec2Fixed::from_ints(500, 200));
            let mut index = TargetIndex::build(&world);
            (0..20)
                .map(|_| deliver_hit(&mut world, &mut index, Team::Player, drone, 1).expect("hit"))
                .collect::<Vec<_>>()
        };
        assert_eq!(rolls(42), rolls(42));
    }
}
