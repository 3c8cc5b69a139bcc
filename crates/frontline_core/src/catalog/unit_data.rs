//! Unit archetype definitions.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Broad unit class used for cooldowns, matchups and production sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitCategory {
    /// Rifle squads.
    Infantry,
    /// Rocket teams and other tank hunters.
    AntiArmor,
    /// Jeeps and other fast wheeled vehicles.
    LightVehicle,
    /// Main battle tanks.
    Tank,
    /// Long-range indirect fire.
    Artillery,
    /// Dedicated anti-air vehicles.
    AntiAir,
    /// Helicopters and fighters.
    Aircraft,
    /// Heavy bombers.
    Bomber,
    /// Remote drones.
    Drone,
    /// Troop carriers.
    Transport,
    /// Engineers, operators and other support units.
    Support,
    /// Fixed weapon emplacements.
    Emplacement,
    /// Targeting abilities bought like units.
    Ability,
}

impl UnitCategory {
    /// Ticks between attacks when an archetype does not override it.
    #[must_use]
    pub const fn default_attack_cooldown(self) -> u32 {
        match self {
            Self::Infantry => 40,
            Self::AntiArmor => 75,
            Self::LightVehicle => 12,
            Self::Tank => 70,
            Self::Artillery => 180,
            Self::AntiAir => 15,
            Self::Aircraft => 30,
            Self::Bomber => 90,
            Self::Drone => 20,
            Self::Transport => 25,
            Self::Support => 45,
            Self::Emplacement => 20,
            Self::Ability => 0,
        }
    }

    /// True for the categories counted as armor by threat analysis.
    #[must_use]
    pub const fn is_armor(self) -> bool {
        matches!(self, Self::Tank | Self::Transport | Self::Artillery)
    }

    /// True for foot soldiers.
    #[must_use]
    pub const fn is_infantry(self) -> bool {
        matches!(self, Self::Infantry | Self::AntiArmor)
    }
}

/// Movement domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Domain {
    /// Moves along the ground.
    #[default]
    Ground,
    /// Flies; only anti-air weapons can reach it.
    Air,
}

/// Per-tick update routine an archetype runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BehaviorKind {
    /// Advance and engage.
    #[default]
    Standard,
    /// Short-lived unit tied to an operator.
    Drone,
    /// Alternates between fighting and controlling a drone.
    DroneOperator,
    /// Carries cargo that is unloaded once.
    Transport,
    /// Constructs buildings.
    Builder,
    /// Never moves; fires at anything in range.
    Turret,
    /// Locked strike craft flying to a designated point.
    Strike,
}

/// Targeting ability bought through production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Calls a strike jet onto the designated point.
    Airstrike,
    /// Fires a delayed-impact missile from headquarters.
    GuidedMissile,
}

/// Units carried by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoSpec {
    /// Archetype key of the carried units.
    pub key: String,
    /// Number of units carried.
    pub count: u32,
}

/// Immutable unit archetype shared by every instance of a unit type.
///
/// # Example RON
///
/// ```ron
/// (
///     key: "tank",
///     name: "Battle Tank",
///     cost: 60,
///     hp: 400,
///     speed: 0.6,
///     range: 150.0,
///     damage: 45,
///     category: Tank,
///     stock: 8,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitArchetype {
    /// Catalog key.
    pub key: String,

    /// Display name.
    pub name: String,

    /// Supply cost.
    pub cost: u32,

    /// Maximum health.
    pub hp: u32,

    /// Distance moved per tick.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,

    /// Weapon range.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,

    /// Base damage per attack.
    #[serde(default)]
    pub damage: u32,

    /// Damage against air targets, replacing `damage` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_damage: Option<u32>,

    /// Damage against ground targets and buildings, replacing `damage` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_damage: Option<u32>,

    /// Ticks between attacks; the category default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_cooldown: Option<u32>,

    /// Ticks before the same type can be ordered again.
    #[serde(default)]
    pub production_cooldown: u32,

    /// Ticks a queued order waits before the unit appears.
    #[serde(default)]
    pub deploy_delay: u32,

    /// Units available per match.
    pub stock: u32,

    /// Unit class.
    pub category: UnitCategory,

    /// Movement domain.
    #[serde(default)]
    pub domain: Domain,

    /// Whether the weapon reaches air targets.
    #[serde(default)]
    pub can_hit_air: bool,

    /// Whether the weapon reaches ground targets and buildings.
    #[serde(default = "default_true")]
    pub can_hit_ground: bool,

    /// Prefers air targets when choosing what to shoot.
    #[serde(default)]
    pub anti_air: bool,

    /// Only visible to attackers inside the detection radius.
    #[serde(default)]
    pub stealth: bool,

    /// Ignores damage and cannot be targeted.
    #[serde(default)]
    pub invulnerable: bool,

    /// Chance in percent to negate an incoming hit.
    #[serde(default)]
    pub evasion: u32,

    /// Area damage radius around the impact point (0 = single target).
    #[serde(default, with = "fixed_serde")]
    pub splash_radius: Fixed,

    /// Projectile travel per tick (0 = instant hit).
    #[serde(default, with = "fixed_serde")]
    pub projectile_speed: Fixed,

    /// Update routine.
    #[serde(default)]
    pub behavior: BehaviorKind,

    /// Footprint width.
    #[serde(default = "default_size", with = "fixed_serde")]
    pub width: Fixed,

    /// Footprint height.
    #[serde(default = "default_size", with = "fixed_serde")]
    pub height: Fixed,

    /// Ticks before the unit expires on its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<u32>,

    /// Units disgorged by a transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cargo: Option<CargoSpec>,

    /// Health percentage below which cargo is released.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinforce_below_percent: Option<u32>,

    /// Drone launched by an operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drone_key: Option<String>,

    /// Targeting ability this entry triggers instead of spawning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability: Option<AbilityKind>,
}

const fn default_true() -> bool {
    true
}

fn default_size() -> Fixed {
    Fixed::from_num(16)
}

impl UnitArchetype {
    /// Generic rifle squad used when a key is missing from the catalog.
    #[must_use]
    pub fn fallback(key: &str) -> Self {
        Self {
            key: key.to_string(),
            name: key.to_string(),
            cost: 20,
            hp: 100,
            speed: Fixed::from_num(0.5),
            range: Fixed::from_num(100),
            damage: 10,
            air_damage: None,
            ground_damage: None,
            attack_cooldown: None,
            production_cooldown: 60,
            deploy_delay: 0,
            stock: 0,
            category: UnitCategory::Infantry,
            domain: Domain::Ground,
            can_hit_air: false,
            can_hit_ground: true,
            anti_air: false,
            stealth: false,
            invulnerable: false,
            evasion: 0,
            splash_radius: Fixed::ZERO,
            projectile_speed: Fixed::ZERO,
            behavior: BehaviorKind::Standard,
            width: default_size(),
            height: default_size(),
            lifetime: None,
            cargo: None,
            reinforce_below_percent: None,
            drone_key: None,
            ability: None,
        }
    }

    /// Effective ticks between attacks.
    #[must_use]
    pub fn attack_cooldown(&self) -> u32 {
        self.attack_cooldown
            .unwrap_or_else(|| self.category.default_attack_cooldown())
    }

    /// True for flying units.
    #[must_use]
    pub fn is_air(&self) -> bool {
        self.domain == Domain::Air
    }

    /// True for entries that arm a targeting ability instead of spawning.
    #[must_use]
    pub fn is_ability(&self) -> bool {
        self.ability.is_some()
    }

    /// True when the unit has any weapon at all.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.damage > 0
            || self.air_damage.is_some_and(|d| d > 0)
            || self.ground_damage.is_some_and(|d| d > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_cooldown_falls_back_to_category() {
        let mut unit = UnitArchetype::fallback("rifles");
        assert_eq!(unit.attack_cooldown(), 40);

        unit.attack_cooldown = Some(5);
        assert_eq!(unit.attack_cooldown(), 5);
    }

    #[test]
    fn test_category_cooldowns_rank_fast_and_slow_fire() {
        assert!(
            UnitCategory::LightVehicle.default_attack_cooldown()
                < UnitCategory::Artillery.default_attack_cooldown()
        );
    }

    #[test]
    fn test_parse_minimal_unit() {
        let text = r#"(
            key: "tank",
            name: "Battle Tank",
            cost: 60,
            hp: 400,
            speed: 0.6,
            range: 150.0,
            damage: 45,
            category: Tank,
            stock: 8,
        )"#;
        let unit: UnitArchetype = ron::from_str(text).expect("valid unit");
        assert_eq!(unit.key, "tank");
        assert_eq!(unit.speed, Fixed::from_num(0.6));
        assert!(unit.can_hit_ground);
        assert!(!unit.can_hit_air);
        assert_eq!(unit.domain, Domain::Ground);
        assert_eq!(unit.width, Fixed::from_num(16));
    }
}
