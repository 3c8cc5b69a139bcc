//! # Frontline Core
//!
//! Deterministic simulation core for a two-sided lane battle.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No wall-clock access
//! - No floating-point state (uses fixed-point)
//! - Randomness only from the seeded world RNG
//!
//! Presentation layers read the [`world::World`] after each tick and receive
//! play-effect cues and notices through the [`effects::FxSink`] and
//! [`effects::Notifier`] traits.
//!
//! ## Crate Structure
//!
//! - [`catalog`] - Unit and building archetypes, tunables
//! - [`world`] - The match state aggregate
//! - [`combat`] - Targeting and damage resolution
//! - [`behavior`] - Per-unit update dispatch
//! - [`commands`] - Player and AI orders
//! - [`economy`] - Supply, stock, cooldowns and production
//! - [`construction`] - Worker-driven building construction
//! - [`ai`] - Opponent controller
//! - [`simulation`] - Tick loop and player command surface
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod behavior;
pub mod buildings;
pub mod catalog;
pub mod combat;
pub mod commands;
pub mod components;
pub mod construction;
pub mod economy;
pub mod effects;
pub mod error;
pub mod math;
pub mod projectiles;
pub mod scheduler;
pub mod simulation;
pub mod units;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiController, Difficulty, SpecialWeapon, WavePhase};
    pub use crate::catalog::{
        BehaviorKind, BuildingArchetype, Catalog, UnitArchetype, UnitCategory,
    };
    pub use crate::commands::UnitCommand;
    pub use crate::components::*;
    pub use crate::economy::{ProductionReceipt, SideEconomy};
    pub use crate::effects::{FxCue, FxSink, Notice, NoticeLevel, Notifier, SimEvent};
    pub use crate::error::{GameError, ProductionError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::simulation::{GameSpeed, MatchConfig, Simulation, TickReport};
    pub use crate::units::{BehaviorState, Unit};
    pub use crate::world::{MatchOutcome, MatchStats, World};
}
