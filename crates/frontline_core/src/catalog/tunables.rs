//! Global match tunables.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Map dimensions and economy rates shared by both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunables {
    /// Supply each side starts with.
    pub starting_supply: u32,
    /// Supply cap before bonuses.
    pub max_supply: u32,
    /// Supply regenerated per tick.
    #[serde(with = "fixed_serde")]
    pub supply_regen: Fixed,
    /// Length of the lane.
    #[serde(with = "fixed_serde")]
    pub map_width: Fixed,
    /// Width of the lane.
    #[serde(with = "fixed_serde")]
    pub lane_height: Fixed,
    /// Distance from each map edge to its headquarters.
    #[serde(with = "fixed_serde")]
    pub hq_inset: Fixed,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            starting_supply: 100,
            max_supply: 400,
            supply_regen: Fixed::from_num(0.25),
            map_width: Fixed::from_num(3200),
            lane_height: Fixed::from_num(400),
            hq_inset: Fixed::from_num(120),
        }
    }
}

impl Tunables {
    /// Y coordinate of the lane's center line.
    #[must_use]
    pub fn lane_center(&self) -> Fixed {
        self.lane_height / Fixed::from_num(2)
    }

    /// Point on the center line at `percent` of the map width.
    #[must_use]
    pub fn lane_point(&self, percent: u32) -> Vec2Fixed {
        Vec2Fixed::new(
            self.map_width * Fixed::from_num(percent) / Fixed::from_num(100),
            self.lane_center(),
        )
    }
}
