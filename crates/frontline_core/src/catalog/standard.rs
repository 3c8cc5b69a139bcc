//! Built-in unit and building roster.

use super::building_data::{BuildingArchetype, TurretWeapon};
use super::unit_data::{
    AbilityKind, BehaviorKind, CargoSpec, Domain, UnitArchetype, UnitCategory,
};
use crate::math::Fixed;

#[allow(clippy::too_many_arguments)]
fn unit(
    key: &str,
    name: &str,
    category: UnitCategory,
    cost: u32,
    hp: u32,
    speed: f64,
    range: u32,
    damage: u32,
    stock: u32,
    production_cooldown: u32,
) -> UnitArchetype {
    UnitArchetype {
        name: name.to_string(),
        cost,
        hp,
        speed: Fixed::from_num(speed),
        range: Fixed::from_num(range),
        damage,
        stock,
        category,
        production_cooldown,
        ..UnitArchetype::fallback(key)
    }
}

fn size(value: u32) -> Fixed {
    Fixed::from_num(value)
}

/// Standard unit roster.
#[must_use]
pub fn units() -> Vec<UnitArchetype> {
    use UnitCategory as C;

    vec![
        unit("infantry", "Rifle Squad", C::Infantry, 20, 100, 0.5, 110, 10, 30, 60),
        UnitArchetype {
            can_hit_air: true,
            ..unit("rocket_infantry", "Rocket Team", C::AntiArmor, 35, 90, 0.45, 140, 40, 20, 120)
        },
        UnitArchetype {
            behavior: BehaviorKind::DroneOperator,
            drone_key: Some("drone".to_string()),
            ..unit("drone_operator", "Drone Operator", C::Support, 45, 80, 0.45, 160, 8, 8, 240)
        },
        UnitArchetype {
            domain: Domain::Air,
            can_hit_air: true,
            evasion: 30,
            lifetime: Some(600),
            behavior: BehaviorKind::Drone,
            width: size(8),
            height: size(8),
            ..unit("drone", "Recon Drone", C::Drone, 0, 40, 1.6, 90, 6, 0, 0)
        },
        UnitArchetype {
            behavior: BehaviorKind::Builder,
            ..unit("engineer", "Engineer", C::Support, 30, 70, 0.55, 0, 0, 6, 180)
        },
        UnitArchetype {
            anti_air: true,
            can_hit_air: true,
            deploy_delay: 30,
            width: size(22),
            ..unit("aa_jeep", "Flak Jeep", C::LightVehicle, 40, 160, 1.1, 170, 14, 12, 120)
        },
        UnitArchetype {
            projectile_speed: Fixed::from_num(8),
            deploy_delay: 60,
            width: size(30),
            height: size(20),
            ..unit("tank", "Battle Tank", C::Tank, 60, 420, 0.6, 150, 45, 10, 240)
        },
        UnitArchetype {
            stealth: true,
            deploy_delay: 60,
            width: size(30),
            height: size(20),
            ..unit("specter", "Specter Tank", C::Tank, 80, 300, 0.8, 140, 40, 4, 360)
        },
        UnitArchetype {
            splash_radius: Fixed::from_num(50),
            projectile_speed: Fixed::from_num(5),
            deploy_delay: 60,
            width: size(30),
            ..unit("artillery", "Howitzer", C::Artillery, 70, 180, 0.35, 420, 70, 6, 360)
        },
        UnitArchetype {
            anti_air: true,
            can_hit_air: true,
            air_damage: Some(30),
            ground_damage: Some(8),
            deploy_delay: 60,
            width: size(28),
            ..unit("aa_tank", "Flak Tank", C::AntiAir, 65, 320, 0.55, 240, 30, 6, 300)
        },
        UnitArchetype {
            behavior: BehaviorKind::Transport,
            cargo: Some(CargoSpec {
                key: "infantry".to_string(),
                count: 4,
            }),
            reinforce_below_percent: Some(50),
            deploy_delay: 45,
            width: size(30),
            ..unit("apc", "Armored Carrier", C::Transport, 55, 350, 0.8, 120, 8, 6, 300)
        },
        UnitArchetype {
            domain: Domain::Air,
            invulnerable: true,
            behavior: BehaviorKind::Transport,
            cargo: Some(CargoSpec {
                key: "rocket_infantry".to_string(),
                count: 3,
            }),
            width: size(34),
            ..unit("transport_heli", "Transport Helicopter", C::Transport, 60, 250, 1.4, 200, 0, 4, 420)
        },
        UnitArchetype {
            domain: Domain::Air,
            can_hit_air: true,
            width: size(30),
            ..unit("attack_heli", "Gunship", C::Aircraft, 75, 260, 1.3, 160, 22, 6, 360)
        },
        UnitArchetype {
            domain: Domain::Air,
            splash_radius: Fixed::from_num(70),
            width: size(40),
            ..unit("bomber", "Heavy Bomber", C::Bomber, 110, 380, 1.0, 60, 120, 3, 900)
        },
        UnitArchetype {
            behavior: BehaviorKind::Turret,
            can_hit_air: true,
            width: size(20),
            ..unit("sentry_gun", "Sentry Gun", C::Emplacement, 40, 300, 0.0, 200, 12, 6, 240)
        },
        UnitArchetype {
            domain: Domain::Air,
            invulnerable: true,
            behavior: BehaviorKind::Strike,
            splash_radius: Fixed::from_num(120),
            width: size(36),
            ..unit("strike_jet", "Strike Jet", C::Aircraft, 0, 200, 4.0, 0, 250, 0, 0)
        },
        UnitArchetype {
            ability: Some(AbilityKind::Airstrike),
            ..unit("airstrike", "Airstrike", C::Ability, 90, 1, 0.0, 0, 0, 3, 1800)
        },
        UnitArchetype {
            ability: Some(AbilityKind::GuidedMissile),
            splash_radius: Fixed::from_num(90),
            projectile_speed: Fixed::from_num(6),
            ..unit("guided_missile", "Guided Missile", C::Ability, 70, 1, 0.0, 0, 180, 4, 900)
        },
    ]
}

fn building(key: &str, name: &str, hp: u32) -> BuildingArchetype {
    BuildingArchetype {
        key: key.to_string(),
        name: name.to_string(),
        cost: 0,
        hp,
        width: size(60),
        height: size(60),
        build_time: 0,
        produces: Vec::new(),
        weapon: None,
        headquarters: false,
        unique: false,
        forward_defense: false,
        supply_bonus: 0,
    }
}

/// Standard building roster.
#[must_use]
pub fn buildings() -> Vec<BuildingArchetype> {
    use UnitCategory as C;

    vec![
        BuildingArchetype {
            headquarters: true,
            produces: vec![C::Support],
            width: size(100),
            height: size(100),
            ..building("hq", "Headquarters", 3000)
        },
        BuildingArchetype {
            produces: vec![C::Infantry, C::AntiArmor, C::Support],
            build_time: 600,
            ..building("barracks", "Barracks", 1200)
        },
        BuildingArchetype {
            produces: vec![
                C::LightVehicle,
                C::Tank,
                C::Artillery,
                C::AntiAir,
                C::Transport,
                C::Emplacement,
            ],
            build_time: 900,
            ..building("factory", "Factory", 1500)
        },
        BuildingArchetype {
            produces: vec![C::Aircraft, C::Bomber, C::Drone],
            build_time: 900,
            ..building("airfield", "Airfield", 1200)
        },
        BuildingArchetype {
            cost: 80,
            build_time: 600,
            forward_defense: true,
            weapon: Some(TurretWeapon {
                damage: 20,
                range: Fixed::from_num(180),
                cooldown: 30,
                can_hit_air: false,
                can_hit_ground: true,
            }),
            width: size(40),
            height: size(40),
            ..building("bunker", "Bunker", 1500)
        },
        BuildingArchetype {
            cost: 60,
            build_time: 480,
            weapon: Some(TurretWeapon {
                damage: 25,
                range: Fixed::from_num(260),
                cooldown: 20,
                can_hit_air: true,
                can_hit_ground: false,
            }),
            width: size(40),
            height: size(40),
            ..building("aa_site", "AA Site", 600)
        },
        BuildingArchetype {
            cost: 100,
            build_time: 900,
            unique: true,
            supply_bonus: 100,
            ..building("logistics_center", "Logistics Center", 800)
        },
    ]
}
