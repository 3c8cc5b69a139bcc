//! The match state aggregate.
//!
//! [`World`] owns every entity collection, both economies, the deferred
//! action queue, statistics and the seeded RNG. It is created at match start
//! and passed by reference into every update function; nothing else holds
//! match state.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::buildings::Building;
use crate::catalog::{Catalog, Tunables, UnitArchetype, UnitCategory};
use crate::components::{EntityId, Team};
use crate::economy::SideEconomy;
use crate::effects::{Effect, EffectKind, ExplosionClass, FxCue, SimEvent};
use crate::math::{Fixed, Vec2Fixed};
use crate::projectiles::Projectile;
use crate::scheduler::Scheduler;
use crate::units::Unit;

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// The enemy headquarters fell.
    Victory,
    /// The player headquarters fell.
    Defeat,
    /// Both fell on the same tick.
    Draw,
}

/// Running match statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchStats {
    /// Enemy units destroyed.
    pub kills: u32,
    /// Player units destroyed.
    pub losses: u32,
    /// Enemy buildings destroyed.
    pub buildings_destroyed: u32,
    /// Player buildings lost.
    pub buildings_lost: u32,
    /// Units deployed for the player.
    pub player_units_produced: u32,
    /// Units deployed for the enemy.
    pub enemy_units_produced: u32,
    /// Damage dealt by the player side.
    pub player_damage_dealt: u64,
    /// Damage dealt by the enemy side.
    pub enemy_damage_dealt: u64,
    /// Special weapons launched by the AI.
    pub special_weapons_fired: u32,
}

impl MatchStats {
    /// Attribute damage to the attacking side.
    pub fn record_damage(&mut self, attacker: Team, dealt: u32) {
        match attacker {
            Team::Player => self.player_damage_dealt += u64::from(dealt),
            Team::Enemy => self.enemy_damage_dealt += u64::from(dealt),
            Team::Neutral => {}
        }
    }

    /// Count a destroyed unit.
    pub fn record_unit_loss(&mut self, owner: Team) {
        match owner {
            Team::Enemy => self.kills += 1,
            Team::Player => self.losses += 1,
            Team::Neutral => {}
        }
    }

    /// Count a destroyed building.
    pub fn record_building_loss(&mut self, owner: Team) {
        match owner {
            Team::Enemy => self.buildings_destroyed += 1,
            Team::Player => self.buildings_lost += 1,
            Team::Neutral => {}
        }
    }

    /// Count a deployed unit.
    pub fn record_spawn(&mut self, owner: Team) {
        match owner {
            Team::Player => self.player_units_produced += 1,
            Team::Enemy => self.enemy_units_produced += 1,
            Team::Neutral => {}
        }
    }
}

/// Single mutable match state.
#[derive(Debug, Clone)]
pub struct World {
    /// Logical ticks completed.
    pub tick: u64,
    /// Player units.
    pub players: Vec<Unit>,
    /// Enemy units.
    pub enemies: Vec<Unit>,
    /// Scenery units; never updated or targeted.
    pub neutrals: Vec<Unit>,
    /// Buildings of every side.
    pub buildings: Vec<Building>,
    /// Projectiles in flight.
    pub projectiles: Vec<Projectile>,
    /// Transient effects.
    pub effects: Vec<Effect>,
    /// Player economy.
    pub player_economy: SideEconomy,
    /// Enemy economy.
    pub enemy_economy: SideEconomy,
    /// Deferred actions.
    pub scheduler: Scheduler,
    /// Statistics.
    pub stats: MatchStats,
    /// Set once the match is decided.
    pub outcome: Option<MatchOutcome>,
    catalog: Arc<Catalog>,
    events: Vec<SimEvent>,
    spawn_buffer: Vec<Unit>,
    next_id: EntityId,
    rng: ChaCha8Rng,
}

impl World {
    /// A world with economies but no entities.
    #[must_use]
    pub fn empty(catalog: Arc<Catalog>, seed: u64) -> Self {
        Self {
            tick: 0,
            players: Vec::new(),
            enemies: Vec::new(),
            neutrals: Vec::new(),
            buildings: Vec::new(),
            projectiles: Vec::new(),
            effects: Vec::new(),
            player_economy: SideEconomy::new(&catalog),
            enemy_economy: SideEconomy::new(&catalog),
            scheduler: Scheduler::new(),
            stats: MatchStats::default(),
            outcome: None,
            catalog,
            events: Vec::new(),
            spawn_buffer: Vec::new(),
            next_id: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// A world with the standard base layout for both sides.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, seed: u64) -> Self {
        let mut world = Self::empty(catalog, seed);
        world.place_base_layout();
        world
    }

    fn place_base_layout(&mut self) {
        let center = self.tunables().lane_center();
        for team in [Team::Player, Team::Enemy] {
            let hq = self.base_anchor(team);
            let toward_front = team.advance_sign();
            let offset = |dx: i32, dy: i32| {
                Vec2Fixed::new(
                    hq.x + toward_front * Fixed::from_num(dx),
                    center + Fixed::from_num(dy),
                )
            };
            let layout = [
                ("hq", hq),
                ("barracks", offset(160, -110)),
                ("factory", offset(160, 110)),
                ("airfield", offset(300, 0)),
            ];
            for (key, position) in layout {
                self.spawn_building(team, key, position, true);
            }
        }
        let forward = self.tunables().lane_point(60);
        self.spawn_building(Team::Enemy, "bunker", forward, true);
    }

    /// Shared catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Global tunables.
    #[must_use]
    pub fn tunables(&self) -> &Tunables {
        self.catalog.tunables()
    }

    /// Allocate a fresh entity id.
    pub fn next_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Seeded randomness.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Units of `team`.
    #[must_use]
    pub fn units(&self, team: Team) -> &[Unit] {
        match team {
            Team::Player => &self.players,
            Team::Enemy => &self.enemies,
            Team::Neutral => &self.neutrals,
        }
    }

    /// Mutable units of `team`.
    pub fn units_mut(&mut self, team: Team) -> &mut Vec<Unit> {
        match team {
            Team::Player => &mut self.players,
            Team::Enemy => &mut self.enemies,
            Team::Neutral => &mut self.neutrals,
        }
    }

    /// Economy of `team`; neutral shares the player's.
    #[must_use]
    pub fn economy(&self, team: Team) -> &SideEconomy {
        match team {
            Team::Enemy => &self.enemy_economy,
            _ => &self.player_economy,
        }
    }

    /// Mutable economy of `team`; neutral shares the player's.
    pub fn economy_mut(&mut self, team: Team) -> &mut SideEconomy {
        match team {
            Team::Enemy => &mut self.enemy_economy,
            _ => &mut self.player_economy,
        }
    }

    /// Find a unit by id.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.players
            .iter()
            .chain(&self.enemies)
            .chain(&self.neutrals)
            .find(|u| u.body.id == id)
    }

    /// Find a unit by id, mutably.
    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.players
            .iter_mut()
            .chain(&mut self.enemies)
            .chain(&mut self.neutrals)
            .find(|u| u.body.id == id)
    }

    /// Find a building by id.
    #[must_use]
    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.body.id == id)
    }

    /// Living headquarters of `team`.
    #[must_use]
    pub fn hq(&self, team: Team) -> Option<&Building> {
        self.buildings
            .iter()
            .find(|b| b.body.team == team && b.archetype.headquarters && !b.body.is_dead())
    }

    /// Fixed home point of `team` on the center line.
    #[must_use]
    pub fn base_anchor(&self, team: Team) -> Vec2Fixed {
        let tunables = self.tunables();
        let x = match team {
            Team::Enemy => tunables.map_width - tunables.hq_inset,
            _ => tunables.hq_inset,
        };
        Vec2Fixed::new(x, tunables.lane_center())
    }

    /// Nearest point to `point` inside the lane.
    #[must_use]
    pub fn clamp_to_map(&self, point: Vec2Fixed) -> Vec2Fixed {
        let tunables = self.tunables();
        point.clamped(tunables.map_width, tunables.lane_height)
    }

    /// X coordinate of the map edge behind `team`'s base.
    #[must_use]
    pub fn map_edge(&self, team: Team) -> Fixed {
        match team {
            Team::Enemy => self.tunables().map_width,
            _ => Fixed::ZERO,
        }
    }

    /// Headquarters position, or the base anchor once it is gone.
    #[must_use]
    pub fn base_position(&self, team: Team) -> Vec2Fixed {
        self.hq(team)
            .map_or_else(|| self.base_anchor(team), |hq| hq.body.position)
    }

    /// Where units of `category` deploy for `team`.
    #[must_use]
    pub fn production_site(&self, team: Team, category: UnitCategory) -> Vec2Fixed {
        self.buildings
            .iter()
            .find(|b| {
                b.body.team == team
                    && !b.body.is_dead()
                    && b.is_complete()
                    && b.archetype.produces_category(category)
            })
            .map_or_else(|| self.base_position(team), |b| b.body.position)
    }

    /// Build a unit with a fresh id without adding it to the world.
    pub fn make_unit(&mut self, team: Team, key: &str, position: Vec2Fixed) -> Unit {
        let archetype = self.catalog.resolve_unit(key);
        let id = self.next_id();
        Unit::new(id, archetype, team, position)
    }

    /// Add a unit to its team immediately.
    pub fn insert_unit(&mut self, unit: Unit) -> EntityId {
        let id = unit.body.id;
        let team = unit.body.team;
        self.stats.record_spawn(team);
        self.events.push(SimEvent::UnitSpawned {
            id,
            team,
            key: unit.archetype.key.clone(),
        });
        self.units_mut(team).push(unit);
        id
    }

    /// Create and add a unit immediately.
    pub fn spawn_unit(&mut self, team: Team, key: &str, position: Vec2Fixed) -> EntityId {
        let unit = self.make_unit(team, key, position);
        self.insert_unit(unit)
    }

    /// Add a unit at the end of the current update phase.
    pub fn queue_unit(&mut self, unit: Unit) -> EntityId {
        let id = unit.body.id;
        self.spawn_buffer.push(unit);
        id
    }

    /// Create a unit that enters play at the end of the current update phase.
    pub fn queue_spawn(&mut self, team: Team, key: &str, position: Vec2Fixed) -> EntityId {
        let unit = self.make_unit(team, key, position);
        self.queue_unit(unit)
    }

    /// Move queued units into their collections.
    pub fn flush_spawns(&mut self) {
        let pending = std::mem::take(&mut self.spawn_buffer);
        for unit in pending {
            self.insert_unit(unit);
        }
    }

    /// Create a building. Unknown keys are logged and skipped.
    pub fn spawn_building(
        &mut self,
        team: Team,
        key: &str,
        position: Vec2Fixed,
        complete: bool,
    ) -> Option<EntityId> {
        let Some(archetype) = self.catalog.building(key) else {
            tracing::warn!(building = key, "Unknown building key, skipped");
            return None;
        };
        let id = self.next_id();
        self.buildings
            .push(Building::new(id, archetype, team, position, complete));
        Some(id)
    }

    /// Disgorge a transport's cargo around `position`.
    pub fn unload_cargo(&mut self, team: Team, transport: &UnitArchetype, position: Vec2Fixed) {
        let Some(cargo) = &transport.cargo else {
            return;
        };
        let lane = self.tunables().lane_height;
        let spacing = Fixed::from_num(14);
        let half = Fixed::from_num(cargo.count / 2);
        for i in 0..cargo.count {
            let dy = (Fixed::from_num(i) - half) * spacing;
            let y = (position.y + dy).max(Fixed::ZERO).min(lane);
            self.queue_spawn(team, &cargo.key, Vec2Fixed::new(position.x, y));
        }
        tracing::debug!(
            tick = self.tick,
            transport = %transport.key,
            cargo = %cargo.key,
            count = cargo.count,
            "Transport unloaded"
        );
    }

    /// Bookkeeping for a unit destroyed in combat.
    pub fn record_unit_death(&mut self, team: Team, id: EntityId, key: &str, position: Vec2Fixed) {
        self.stats.record_unit_loss(team);
        self.events.push(SimEvent::UnitDestroyed {
            id,
            team,
            key: key.to_string(),
        });
        self.emit_fx(FxCue::Explosion(ExplosionClass::Small), position);
        self.spawn_effect(EffectKind::Explosion(ExplosionClass::Small), position);
    }

    /// Take a unit off the field and return it to its side's stock.
    pub fn return_to_stock(&mut self, unit: &mut Unit) {
        let team = unit.team();
        self.economy_mut(team).return_stock(&unit.archetype.key);
        self.events.push(SimEvent::UnitReturned {
            id: unit.id(),
            team,
            key: unit.archetype.key.clone(),
        });
        unit.retire();
    }

    /// Record an event.
    pub fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Record a play-effect cue.
    pub fn emit_fx(&mut self, cue: FxCue, position: Vec2Fixed) {
        self.events.push(SimEvent::Fx { cue, position });
    }

    /// Start a transient effect.
    pub fn spawn_effect(&mut self, kind: EffectKind, position: Vec2Fixed) {
        self.effects.push(Effect::new(kind, position));
    }

    /// Events recorded so far this tick.
    #[must_use]
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Take the recorded events.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Age transient effects by one tick.
    pub fn update_effects(&mut self) {
        for effect in &mut self.effects {
            effect.update();
        }
    }

    /// Remove dead units and buildings, spent projectiles and expired effects.
    pub fn filter_dead(&mut self) {
        self.players.retain(Unit::is_alive);
        self.enemies.retain(Unit::is_alive);
        self.neutrals.retain(Unit::is_alive);
        self.buildings.retain(|b| !b.body.is_dead());
        self.projectiles.retain(|p| !p.spent);
        self.effects.retain(|e| e.ttl > 0);
    }

    /// Clamp health and supply back into range.
    pub fn clamp_invariants(&mut self) {
        for unit in self
            .players
            .iter_mut()
            .chain(&mut self.enemies)
            .chain(&mut self.neutrals)
        {
            unit.body.health.clamp();
        }
        for building in &mut self.buildings {
            building.body.health.clamp();
        }
        self.player_economy.clamp();
        self.enemy_economy.clamp();
    }

    /// Check invariants that must hold between ticks.
    #[cfg(feature = "debug-validation")]
    pub fn validate(&self) {
        for unit in self.players.iter().chain(&self.enemies) {
            debug_assert!(unit.body.health.current <= unit.body.health.max);
            debug_assert!(unit.body.health.current > 0 || unit.body.is_dead());
        }
        for economy in [&self.player_economy, &self.enemy_economy] {
            debug_assert!(economy.supply() >= Fixed::ZERO);
            debug_assert!(economy.supply() <= Fixed::from_num(economy.max_supply()));
        }
    }

    /// Whether the match is decided.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Deterministic hash of the match state.
    ///
    /// Two worlds built from the same catalog and seed and fed the same
    /// commands hash identically tick for tick.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.next_id.hash(&mut hasher);
        self.rng.get_word_pos().hash(&mut hasher);

        for unit in self.players.iter().chain(&self.enemies) {
            unit.body.hash(&mut hasher);
            unit.attack.hash(&mut hasher);
            unit.command.hash(&mut hasher);
            unit.status.hash(&mut hasher);
            unit.behavior.hash(&mut hasher);
            unit.locked.hash(&mut hasher);
            unit.lifetime.hash(&mut hasher);
        }
        for building in &self.buildings {
            building.body.hash(&mut hasher);
            building.construction.hash(&mut hasher);
            building.attack.hash(&mut hasher);
        }
        for projectile in &self.projectiles {
            projectile.id.hash(&mut hasher);
            projectile.position.hash(&mut hasher);
            projectile.guidance.hash(&mut hasher);
            projectile.ttl.hash(&mut hasher);
        }

        self.player_economy.hash(&mut hasher);
        self.enemy_economy.hash(&mut hasher);
        self.scheduler.hash(&mut hasher);
        self.stats.hash(&mut hasher);
        self.outcome.hash(&mut hasher);

        hasher.finish()
    }
}
