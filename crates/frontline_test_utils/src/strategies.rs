//! Proptest strategies for simulation inputs.

use proptest::prelude::*;

use frontline_core::ai::Difficulty;
use frontline_core::commands::UnitCommand;
use frontline_core::math::Vec2Fixed;

/// Player-producible unit keys from the standard catalog.
pub const PRODUCIBLE_KEYS: &[&str] = &[
    "infantry",
    "rocket_infantry",
    "engineer",
    "aa_jeep",
    "tank",
    "apc",
    "artillery",
    "attack_heli",
];

/// Integer lane coordinates inside the standard map.
pub fn lane_coords() -> impl Strategy<Value = (i32, i32)> {
    (0i32..3200, 0i32..400)
}

/// A point inside the standard lane.
pub fn lane_point() -> impl Strategy<Value = Vec2Fixed> {
    lane_coords().prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
}

/// Any unit order.
pub fn unit_command() -> impl Strategy<Value = UnitCommand> {
    prop_oneof![
        Just(UnitCommand::Stop),
        Just(UnitCommand::Retreat),
        Just(UnitCommand::Attack(None)),
        lane_point().prop_map(UnitCommand::Move),
        lane_point().prop_map(|p| UnitCommand::Attack(Some(p))),
    ]
}

/// Any difficulty level.
pub fn difficulty() -> impl Strategy<Value = Difficulty> {
    prop::sample::select(Difficulty::ALL.to_vec())
}

/// A producible unit key, or something the catalog does not know.
pub fn unit_key() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(PRODUCIBLE_KEYS).prop_map(str::to_owned),
        1 => "[a-z]{3,8}",
    ]
}
