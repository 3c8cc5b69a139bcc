//! Buildings: construction progress and mounted weapons.

use std::sync::Arc;

use crate::catalog::BuildingArchetype;
use crate::combat::{fire_weapon, select_target, TargetIndex, WeaponProfile};
use crate::components::{AttackState, Body, EntityId, Team};
use crate::effects::SimEvent;
use crate::error::Result;
use crate::math::Vec2Fixed;
use crate::world::World;

/// Construction state of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Construction {
    /// Work in progress.
    UnderConstruction {
        /// Ticks of work done.
        progress: u32,
    },
    /// Finished and operational.
    Complete,
}

/// A building instance.
#[derive(Debug, Clone)]
pub struct Building {
    /// Shared entity state.
    pub body: Body,
    /// Immutable archetype.
    pub archetype: Arc<BuildingArchetype>,
    /// Construction state.
    pub construction: Construction,
    /// Turret state, when armed.
    pub attack: AttackState,
}

impl Building {
    /// Create a building, either finished or as a fresh construction site.
    #[must_use]
    pub fn new(
        id: EntityId,
        archetype: Arc<BuildingArchetype>,
        team: Team,
        position: Vec2Fixed,
        complete: bool,
    ) -> Self {
        let body = Body::new(
            id,
            position,
            team,
            archetype.hp,
            archetype.width,
            archetype.height,
        );
        let construction = if complete || archetype.build_time == 0 {
            Construction::Complete
        } else {
            Construction::UnderConstruction { progress: 0 }
        };
        Self {
            body,
            archetype,
            construction,
            attack: AttackState::default(),
        }
    }

    /// Whether construction has finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.construction == Construction::Complete
    }

    /// Construction progress in percent.
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        match self.construction {
            Construction::Complete => 100,
            Construction::UnderConstruction { progress } => {
                let total = self.archetype.build_time.max(1);
                progress.min(total) * 100 / total
            }
        }
    }

    /// Advance construction by one tick; returns true on the tick it completes.
    pub fn advance_construction(&mut self) -> bool {
        let Construction::UnderConstruction { progress } = &mut self.construction else {
            return false;
        };
        *progress += 1;
        if *progress >= self.archetype.build_time {
            self.construction = Construction::Complete;
            return true;
        }
        false
    }
}

/// Per-tick building update: construction, then the turret if any.
pub fn update_building(
    world: &mut World,
    index: &mut TargetIndex,
    building: &mut Building,
) -> Result<()> {
    if building.body.is_dead() {
        return Ok(());
    }

    if building.advance_construction() {
        let team = building.body.team;
        let bonus = building.archetype.supply_bonus;
        if bonus > 0 {
            world.economy_mut(team).raise_cap(bonus);
        }
        tracing::debug!(
            building = %building.archetype.key,
            id = building.body.id,
            "Construction complete"
        );
        world.push_event(SimEvent::BuildingCompleted {
            id: building.body.id,
            team,
            key: building.archetype.key.clone(),
        });
    }

    if !building.is_complete() {
        return Ok(());
    }

    let Some(turret) = &building.archetype.weapon else {
        return Ok(());
    };
    let weapon = WeaponProfile::from_turret(turret);
    let team = building.body.team;
    let position = building.body.position;

    building.attack.target = select_target(index, team, position, &weapon, building.attack.target);
    if let Some(target) = building.attack.target {
        if building.attack.is_ready() {
            building.attack.cooldown = weapon.cooldown;
            fire_weapon(world, index, team, position, &weapon, target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_construction_completes_at_build_time() {
        let catalog = Catalog::standard();
        let archetype = catalog.building("aa_site").expect("aa_site");
        let build_time = archetype.build_time;
        let mut site = Building::new(1, archetype, Team::Player, Vec2Fixed::ZERO, false);

        for _ in 1..build_time {
            assert!(!site.advance_construction());
        }
        assert_eq!(site.progress_percent(), (build_time - 1) * 100 / build_time);
        assert!(site.advance_construction());
        assert!(site.is_complete());
        assert!(!site.advance_construction());
    }

    #[test]
    fn test_layout_buildings_start_complete() {
        let catalog = Catalog::standard();
        let hq = Building::new(1, catalog.building("hq").expect("hq"), Team::Enemy, Vec2Fixed::ZERO, true);
        assert!(hq.is_complete());
        assert_eq!(hq.progress_percent(), 100);
    }
}
