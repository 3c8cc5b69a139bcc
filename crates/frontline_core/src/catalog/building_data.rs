//! Building archetype definitions.

use serde::{Deserialize, Serialize};

use super::unit_data::UnitCategory;
use crate::math::{fixed_serde, Fixed};

/// Fixed weapon mounted on a building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurretWeapon {
    /// Damage per shot.
    pub damage: u32,
    /// Weapon range.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Ticks between shots.
    pub cooldown: u32,
    /// Reaches air targets.
    #[serde(default)]
    pub can_hit_air: bool,
    /// Reaches ground targets.
    #[serde(default = "default_true")]
    pub can_hit_ground: bool,
}

/// Immutable building archetype.
///
/// # Example RON
///
/// ```ron
/// (
///     key: "barracks",
///     name: "Barracks",
///     cost: 0,
///     hp: 1200,
///     build_time: 600,
///     produces: [Infantry, AntiArmor, Support],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingArchetype {
    /// Catalog key.
    pub key: String,

    /// Display name.
    pub name: String,

    /// Supply cost when built by an engineer.
    #[serde(default)]
    pub cost: u32,

    /// Maximum health.
    pub hp: u32,

    /// Footprint width.
    #[serde(default = "default_footprint", with = "fixed_serde")]
    pub width: Fixed,

    /// Footprint height.
    #[serde(default = "default_footprint", with = "fixed_serde")]
    pub height: Fixed,

    /// Ticks of construction work.
    #[serde(default)]
    pub build_time: u32,

    /// Unit categories deployed from this building.
    #[serde(default)]
    pub produces: Vec<UnitCategory>,

    /// Mounted weapon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<TurretWeapon>,

    /// Losing it loses the match.
    #[serde(default)]
    pub headquarters: bool,

    /// Can be built at most once per match.
    #[serde(default)]
    pub unique: bool,

    /// Forward defensive position the AI reacts to losing.
    #[serde(default)]
    pub forward_defense: bool,

    /// Maximum supply granted on completion.
    #[serde(default)]
    pub supply_bonus: u32,
}

const fn default_true() -> bool {
    true
}

fn default_footprint() -> Fixed {
    Fixed::from_num(60)
}

impl BuildingArchetype {
    /// Whether units of `category` deploy from this building.
    #[must_use]
    pub fn produces_category(&self, category: UnitCategory) -> bool {
        self.produces.contains(&category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_turret_building() {
        let text = r#"(
            key: "bunker",
            name: "Bunker",
            hp: 1500,
            weapon: Some((damage: 20, range: 180.0, cooldown: 30)),
            forward_defense: true,
        )"#;
        let building: BuildingArchetype = ron::from_str(text).expect("valid building");
        let weapon = building.weapon.as_ref().expect("bunker is armed");
        assert!(weapon.can_hit_ground);
        assert!(!weapon.can_hit_air);
        assert!(building.forward_defense);
        assert!(!building.produces_category(UnitCategory::Infantry));
    }
}
