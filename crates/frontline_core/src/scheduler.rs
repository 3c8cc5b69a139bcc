//! Deferred actions keyed by logical tick.
//!
//! Fused strikes, missile impacts and staggered reinforcements are queued
//! here and drained by the simulation loop once their tick arrives. Keys are
//! logical ticks, so pausing never makes an action overdue; clearing the
//! queue at match end guarantees nothing fires into a finished match.

use std::collections::BTreeMap;

use crate::components::{EntityId, Team};
use crate::math::{Fixed, Vec2Fixed};

/// An action waiting for its tick.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScheduledAction {
    /// Area strike detonating after its fuse.
    Detonation {
        /// Side that launched it.
        team: Team,
        /// Blast center.
        center: Vec2Fixed,
        /// Blast radius.
        radius: Fixed,
        /// Damage per entity.
        damage: u32,
    },
    /// A timed munition reaching its target.
    MissileImpact {
        /// Projectile carrying the payload.
        projectile: EntityId,
    },
    /// Deploy one unit.
    Reinforcement {
        /// Side receiving it.
        team: Team,
        /// Archetype key.
        key: String,
        /// Deploy point.
        position: Vec2Fixed,
    },
}

/// Ordered queue of deferred actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scheduler {
    pending: BTreeMap<u64, Vec<ScheduledAction>>,
}

impl Scheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to run on tick `at`.
    pub fn schedule(&mut self, at: u64, action: ScheduledAction) {
        self.pending.entry(at).or_default().push(action);
    }

    /// Remove and return every action due at or before `tick`, in order.
    pub fn drain_due(&mut self, tick: u64) -> Vec<ScheduledAction> {
        let later = self.pending.split_off(&(tick + 1));
        let due = std::mem::replace(&mut self.pending, later);
        due.into_values().flatten().collect()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of queued actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Tick of the earliest queued action.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.pending.keys().next().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reinforcement(key: &str) -> ScheduledAction {
        ScheduledAction::Reinforcement {
            team: Team::Enemy,
            key: key.to_string(),
            position: Vec2Fixed::ZERO,
        }
    }

    #[test]
    fn test_drains_in_tick_then_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(20, reinforcement("c"));
        scheduler.schedule(10, reinforcement("a"));
        scheduler.schedule(10, reinforcement("b"));

        assert!(scheduler.drain_due(9).is_empty());
        assert_eq!(
            scheduler.drain_due(15),
            vec![reinforcement("a"), reinforcement("b")]
        );
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.next_due(), Some(20));
        assert_eq!(scheduler.drain_due(20), vec![reinforcement("c")]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_clear_discards_pending() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(5, reinforcement("a"));
        scheduler.clear();
        assert!(scheduler.drain_due(100).is_empty());
    }
}
