//! Difficulty levels and their behavioral profiles.
//!
//! Consolidates every difficulty-dependent AI parameter in one place so the
//! spawner, weapon policy and wave controller read from a single profile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opponent strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Slow cadence, weak counters, missiles only.
    Recruit,
    /// Default.
    #[default]
    Veteran,
    /// Fast cadence, hard counters, full arsenal.
    Elite,
}

impl Difficulty {
    /// All levels, weakest first.
    pub const ALL: [Self; 3] = [Self::Recruit, Self::Veteran, Self::Elite];

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Recruit => "recruit",
            Self::Veteran => "veteran",
            Self::Elite => "elite",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown difficulty '{s}' (expected recruit, veteran or elite)"))
    }
}

const BASE_ROSTER: &[&str] = &["infantry", "rocket_infantry", "aa_jeep", "tank", "apc"];

const VETERAN_ROSTER: &[&str] = &[
    "infantry",
    "rocket_infantry",
    "aa_jeep",
    "tank",
    "apc",
    "artillery",
    "aa_tank",
    "attack_heli",
    "drone_operator",
];

const ELITE_ROSTER: &[&str] = &[
    "infantry",
    "rocket_infantry",
    "aa_jeep",
    "tank",
    "apc",
    "artillery",
    "aa_tank",
    "attack_heli",
    "drone_operator",
    "bomber",
    "specter",
];

/// Behavioral parameters for one difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyProfile {
    /// Ticks between production decisions.
    pub spawn_interval: u32,
    /// Weight added to hard counters, 0..=100.
    pub counter_bias: u32,
    /// Percent of the force left behind when pushing.
    pub hold_back: u32,
    /// Area strike charges.
    pub nuke_charges: u32,
    /// Stun strike charges.
    pub emp_charges: u32,
    /// Guided munition charges.
    pub missile_charges: u32,
    /// Unit keys the AI may produce.
    pub roster: &'static [&'static str],
}

/// Get the profile for `difficulty`.
#[must_use]
pub fn profile(difficulty: Difficulty) -> DifficultyProfile {
    match difficulty {
        Difficulty::Recruit => DifficultyProfile {
            spawn_interval: 300,
            counter_bias: 20,
            hold_back: 40,
            nuke_charges: 0,
            emp_charges: 0,
            missile_charges: 3,
            roster: BASE_ROSTER,
        },
        Difficulty::Veteran => DifficultyProfile {
            spawn_interval: 210,
            counter_bias: 60,
            hold_back: 30,
            nuke_charges: 0,
            emp_charges: 2,
            missile_charges: 4,
            roster: VETERAN_ROSTER,
        },
        Difficulty::Elite => DifficultyProfile {
            spawn_interval: 150,
            counter_bias: 100,
            hold_back: 20,
            nuke_charges: 1,
            emp_charges: 3,
            missile_charges: 6,
            roster: ELITE_ROSTER,
        },
    }
}
