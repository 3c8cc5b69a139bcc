//! Opponent AI controller.
//!
//! Runs once per tick after the world has updated. It reads the world and
//! acts only through the same surfaces the player has: the enemy economy's
//! production requests, the command layer, and the deferred action queue.
//!
//! # Parts
//!
//! - [`spawner`]: timer-gated production with counter-biased weighted picks.
//! - [`weapons`]: special-weapon policy over the player's densest cluster.
//! - [`waves`]: HOLD / PUSH / RETREAT front-line state machine.
//! - [`reserve`]: one-shot total-war commitment of remaining stock.

pub mod analysis;
pub mod difficulty;
pub mod reserve;
pub mod spawner;
pub mod waves;
pub mod weapons;

pub use difficulty::{profile, Difficulty, DifficultyProfile};

use serde::{Deserialize, Serialize};

use crate::components::Team;
use crate::error::Result;
use crate::world::World;

use self::reserve::TotalWar;
use self::spawner::Spawner;
use self::waves::WaveController;
use self::weapons::SpecialWeapons;

/// AI special weapons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialWeapon {
    /// Fused wide-area strike.
    Nuke,
    /// Localized stun strike.
    Emp,
    /// Delayed-impact guided munition.
    Missile,
}

/// Phase of the wave controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// Defend the current waypoint.
    Hold,
    /// Advance to the next waypoint.
    Push,
    /// Fall back to the rearmost waypoint.
    Retreat,
}

impl WavePhase {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Hold, Self::Push)
                | (Self::Push, Self::Hold)
                | (Self::Hold | Self::Push, Self::Retreat)
                | (Self::Retreat, Self::Hold)
        )
    }
}

/// The AI side's decision maker.
#[derive(Debug, Clone)]
pub struct AiController {
    difficulty: Difficulty,
    profile: DifficultyProfile,
    /// Production timer.
    pub spawner: Spawner,
    /// Special-weapon arsenal.
    pub weapons: SpecialWeapons,
    /// Front-line state machine.
    pub waves: WaveController,
    /// Total-war latch.
    pub total_war: TotalWar,
}

impl AiController {
    /// Controller for `difficulty`.
    #[must_use]
    pub fn new(difficulty: Difficulty) -> Self {
        let profile = profile(difficulty);
        Self {
            difficulty,
            spawner: Spawner::new(&profile),
            weapons: SpecialWeapons::new(&profile),
            waves: WaveController::new(),
            total_war: TotalWar::default(),
            profile,
        }
    }

    /// Difficulty level.
    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Active profile.
    #[must_use]
    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    /// Run one think cycle.
    ///
    /// Does nothing once the match is decided or the AI headquarters is gone.
    pub fn think(&mut self, world: &mut World) -> Result<()> {
        if world.is_over() || world.hq(Team::Enemy).is_none() {
            return Ok(());
        }

        self.total_war.check(world);

        let composition = analysis::assess(world);
        self.spawner.update(world, &self.profile, &composition);
        self.weapons.update(world, &composition)?;
        self.waves.update(world, &self.profile)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_phase_transitions() {
        use WavePhase::{Hold, Push, Retreat};
        assert!(Hold.can_transition_to(Push));
        assert!(Push.can_transition_to(Hold));
        assert!(Hold.can_transition_to(Retreat));
        assert!(Push.can_transition_to(Retreat));
        assert!(Retreat.can_transition_to(Hold));
        assert!(!Retreat.can_transition_to(Push));
        assert!(!Hold.can_transition_to(Hold));
    }

    #[test]
    fn test_think_is_inert_without_headquarters() {
        let mut world = World::empty(Arc::new(Catalog::standard()), 1);
        let mut ai = AiController::new(Difficulty::Elite);
        for _ in 0..1000 {
            world.tick += 1;
            ai.think(&mut world).expect("think");
        }
        assert_eq!(world.enemy_economy.queue().count(), 0);
        assert!(world.events().is_empty());
    }
}
