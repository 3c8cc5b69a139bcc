//! One-shot "total war" reserve commitment.

use crate::catalog::BehaviorKind;
use crate::components::Team;
use crate::effects::SimEvent;
use crate::scheduler::ScheduledAction;
use crate::world::World;

/// Ticks between staggered reinforcement drops.
pub const REINFORCEMENT_STAGGER: u64 = 20;

/// Tracks whether the reserve has been committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TotalWar {
    fired: bool,
}

impl TotalWar {
    /// Whether the reserve was committed this match.
    #[must_use]
    pub fn fired(&self) -> bool {
        self.fired
    }

    /// Commit the reserve the first time the AI headquarters drops below a
    /// quarter of its health. Returns the number of units scheduled.
    pub fn check(&mut self, world: &mut World) -> Option<u32> {
        if self.fired {
            return None;
        }
        let hq = world.hq(Team::Enemy)?;
        if hq.body.health.current * 4 >= hq.body.health.max {
            return None;
        }
        self.fired = true;

        let reserve = world.enemy_economy.commit_reserve();
        let mut scheduled = 0u32;
        let mut at = world.tick;
        for (key, count) in reserve {
            let archetype = world.catalog().resolve_unit(&key);
            let deployable = !archetype.is_ability()
                && !matches!(archetype.behavior, BehaviorKind::Strike | BehaviorKind::Drone);
            if !deployable {
                world.enemy_economy.set_stock(&key, count);
                continue;
            }
            let position = world.production_site(Team::Enemy, archetype.category);
            for _ in 0..count {
                at += REINFORCEMENT_STAGGER;
                world.scheduler.schedule(
                    at,
                    ScheduledAction::Reinforcement {
                        team: Team::Enemy,
                        key: key.clone(),
                        position,
                    },
                );
                scheduled += 1;
            }
        }

        world.push_event(SimEvent::TotalWar { units: scheduled });
        tracing::info!(tick = world.tick, units = scheduled, "AI committed its reserve");
        Some(scheduled)
    }
}
