//! Unit and building catalog.
//!
//! The catalog is the read-only key→archetype table consumed by every other
//! module. It can be loaded from RON or built from the standard roster.
//!
//! **Note:** This module contains no IO - it only parses strings. File
//! loading is handled by `frontline_headless`.

mod building_data;
mod standard;
mod tunables;
mod unit_data;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use building_data::{BuildingArchetype, TurretWeapon};
pub use tunables::Tunables;
pub use unit_data::{AbilityKind, BehaviorKind, CargoSpec, Domain, UnitArchetype, UnitCategory};

use crate::error::{GameError, Result};

/// Serialized catalog layout.
///
/// # Example RON
///
/// ```ron
/// (
///     tunables: (
///         starting_supply: 100,
///         max_supply: 400,
///         supply_regen: 0.25,
///         map_width: 3200.0,
///         lane_height: 400.0,
///         hq_inset: 120.0,
///     ),
///     units: [ /* UnitArchetype entries */ ],
///     buildings: [ /* BuildingArchetype entries */ ],
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    /// Global tunables.
    #[serde(default)]
    pub tunables: Tunables,
    /// Unit archetypes.
    pub units: Vec<UnitArchetype>,
    /// Building archetypes.
    #[serde(default)]
    pub buildings: Vec<BuildingArchetype>,
}

/// Read-only archetype lookup shared by a match.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tunables: Tunables,
    units: BTreeMap<String, Arc<UnitArchetype>>,
    buildings: BTreeMap<String, Arc<BuildingArchetype>>,
}

impl Catalog {
    /// Build a catalog from parsed data. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_data(data: CatalogData) -> Self {
        let units = data
            .units
            .into_iter()
            .map(|u| (u.key.clone(), Arc::new(u)))
            .collect();
        let buildings = data
            .buildings
            .into_iter()
            .map(|b| (b.key.clone(), Arc::new(b)))
            .collect();
        Self {
            tunables: data.tunables,
            units,
            buildings,
        }
    }

    /// Parse a catalog from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let data: CatalogData = ron::from_str(text)?;
        Ok(Self::from_data(data))
    }

    /// The built-in roster with default tunables.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_data(CatalogData {
            tunables: Tunables::default(),
            units: standard::units(),
            buildings: standard::buildings(),
        })
    }

    /// Export the catalog back into its serialized layout.
    #[must_use]
    pub fn to_data(&self) -> CatalogData {
        CatalogData {
            tunables: self.tunables.clone(),
            units: self.units.values().map(|u| (**u).clone()).collect(),
            buildings: self.buildings.values().map(|b| (**b).clone()).collect(),
        }
    }

    /// Global tunables.
    #[must_use]
    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// Strict unit lookup.
    pub fn unit(&self, key: &str) -> Result<Arc<UnitArchetype>> {
        self.units
            .get(key)
            .cloned()
            .ok_or_else(|| GameError::UnknownArchetype(key.to_string()))
    }

    /// Unit lookup that never fails: unknown keys get a generic archetype.
    #[must_use]
    pub fn resolve_unit(&self, key: &str) -> Arc<UnitArchetype> {
        match self.units.get(key) {
            Some(unit) => Arc::clone(unit),
            None => {
                tracing::warn!(unit = key, "Unknown unit key, using fallback archetype");
                Arc::new(UnitArchetype::fallback(key))
            }
        }
    }

    /// Building lookup.
    #[must_use]
    pub fn building(&self, key: &str) -> Option<Arc<BuildingArchetype>> {
        self.buildings.get(key).cloned()
    }

    /// Insert or replace a unit archetype.
    pub fn insert_unit(&mut self, unit: UnitArchetype) {
        self.units.insert(unit.key.clone(), Arc::new(unit));
    }

    /// All unit archetypes in key order.
    pub fn units(&self) -> impl Iterator<Item = &Arc<UnitArchetype>> {
        self.units.values()
    }

    /// All building archetypes in key order.
    pub fn buildings(&self) -> impl Iterator<Item = &Arc<BuildingArchetype>> {
        self.buildings.values()
    }

    /// Sanity-check cross references and values.
    ///
    /// Returns one message per problem; an empty list means the catalog is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.tunables.max_supply < self.tunables.starting_supply {
            issues.push("tunables: starting_supply exceeds max_supply".to_string());
        }
        if self.tunables.map_width <= self.tunables.hq_inset * crate::math::Fixed::from_num(2) {
            issues.push("tunables: map too narrow for both headquarters".to_string());
        }

        for unit in self.units.values() {
            if unit.hp == 0 {
                issues.push(format!("unit {}: hp must be positive", unit.key));
            }
            if unit.evasion > 100 {
                issues.push(format!("unit {}: evasion above 100%", unit.key));
            }
            if let Some(cargo) = &unit.cargo {
                if !self.units.contains_key(&cargo.key) {
                    issues.push(format!("unit {}: unknown cargo {}", unit.key, cargo.key));
                }
            }
            if let Some(drone) = &unit.drone_key {
                if !self.units.contains_key(drone) {
                    issues.push(format!("unit {}: unknown drone {}", unit.key, drone));
                }
            }
            if unit.behavior == BehaviorKind::DroneOperator && unit.drone_key.is_none() {
                issues.push(format!("unit {}: operator without drone_key", unit.key));
            }
            let needs_site = unit.stock > 0 && !unit.is_ability();
            if needs_site
                && !self
                    .buildings
                    .values()
                    .any(|b| b.produces_category(unit.category))
            {
                issues.push(format!(
                    "unit {}: no building produces {:?}",
                    unit.key, unit.category
                ));
            }
        }

        if !self.buildings.values().any(|b| b.headquarters) {
            issues.push("buildings: no headquarters defined".to_string());
        }
        for building in self.buildings.values() {
            if building.hp == 0 {
                issues.push(format!("building {}: hp must be positive", building.key));
            }
        }

        issues
    }
}
