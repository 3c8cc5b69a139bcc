//! Simulation events, transient effects and presentation sinks.
//!
//! The core never depends on presentation. It records [`SimEvent`]s while a
//! tick runs; the simulation loop hands them to the optional [`FxSink`] and
//! [`Notifier`] afterwards and returns them in the tick report.

use crate::ai::{SpecialWeapon, WavePhase};
use crate::catalog::UnitCategory;
use crate::components::{EntityId, Team};
use crate::math::Vec2Fixed;
use crate::world::MatchOutcome;

/// Size class of an explosion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExplosionClass {
    /// Shell or rocket impact.
    Small,
    /// Vehicle or building destruction.
    Large,
    /// Strategic strike.
    Nuclear,
}

/// Category tag for a play-effect call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FxCue {
    /// A hit landed.
    Impact,
    /// A hit was dodged.
    Evade,
    /// Something exploded.
    Explosion(ExplosionClass),
    /// A weapon fired.
    WeaponFire(UnitCategory),
    /// Stun pulse.
    EmpPulse,
    /// Incoming strike warning.
    StrikeWarning,
}

/// Kind of transient particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Explosion cloud.
    Explosion(ExplosionClass),
    /// Muzzle flash.
    Muzzle,
    /// Expanding stun ring.
    EmpPulse,
    /// Target marker for a fused strike.
    StrikeMarker,
}

impl EffectKind {
    /// Ticks the effect stays visible.
    #[must_use]
    pub const fn lifetime(self) -> u32 {
        match self {
            Self::Explosion(ExplosionClass::Small) => 20,
            Self::Explosion(ExplosionClass::Large) => 40,
            Self::Explosion(ExplosionClass::Nuclear) => 120,
            Self::Muzzle => 4,
            Self::EmpPulse => 45,
            Self::StrikeMarker => 180,
        }
    }
}

/// Transient visual effect with a tick lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Effect {
    /// Kind.
    pub kind: EffectKind,
    /// Center.
    pub position: Vec2Fixed,
    /// Ticks left.
    pub ttl: u32,
}

impl Effect {
    /// Create an effect with its default lifetime.
    #[must_use]
    pub fn new(kind: EffectKind, position: Vec2Fixed) -> Self {
        Self {
            kind,
            position,
            ttl: kind.lifetime(),
        }
    }

    /// Age by one tick; returns whether the effect is still visible.
    pub fn update(&mut self) -> bool {
        self.ttl = self.ttl.saturating_sub(1);
        self.ttl > 0
    }
}

/// Something notable that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// A unit entered play.
    UnitSpawned {
        /// Unit id.
        id: EntityId,
        /// Owner.
        team: Team,
        /// Archetype key.
        key: String,
    },
    /// A unit was destroyed.
    UnitDestroyed {
        /// Unit id.
        id: EntityId,
        /// Owner.
        team: Team,
        /// Archetype key.
        key: String,
    },
    /// A unit left the battlefield and returned to stock.
    UnitReturned {
        /// Unit id.
        id: EntityId,
        /// Owner.
        team: Team,
        /// Archetype key.
        key: String,
    },
    /// A building finished construction.
    BuildingCompleted {
        /// Building id.
        id: EntityId,
        /// Owner.
        team: Team,
        /// Archetype key.
        key: String,
    },
    /// A building was destroyed.
    BuildingDestroyed {
        /// Building id.
        id: EntityId,
        /// Owner.
        team: Team,
        /// Archetype key.
        key: String,
        /// It was a headquarters.
        headquarters: bool,
        /// It was a forward defensive position.
        forward_defense: bool,
    },
    /// A special weapon was launched.
    WeaponLaunched {
        /// Side that launched it.
        team: Team,
        /// Weapon.
        weapon: SpecialWeapon,
        /// Aim point.
        target: Vec2Fixed,
    },
    /// The AI wave controller changed phase.
    WavePhaseChanged {
        /// Previous phase.
        from: WavePhase,
        /// New phase.
        to: WavePhase,
    },
    /// The AI committed its remaining reserve.
    TotalWar {
        /// Units scheduled for deployment.
        units: u32,
    },
    /// Play-effect cue.
    Fx {
        /// Cue category.
        cue: FxCue,
        /// Where it happened.
        position: Vec2Fixed,
    },
    /// The match was decided.
    MatchEnded(MatchOutcome),
}

/// Receiver of fire-and-forget play-effect calls.
pub trait FxSink {
    /// Play the effect for `cue` at `position`.
    fn play(&mut self, cue: FxCue, position: Vec2Fixed);
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// Confirmation.
    Info,
    /// Declined request.
    Warning,
    /// Something important happened.
    Alert,
}

/// User-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub text: String,
}

impl Notice {
    /// Build a notice.
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Receiver of user-facing notices.
pub trait Notifier {
    /// Show `notice`.
    fn notify(&mut self, notice: &Notice);
}

/// Sink that records everything it is given, for tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    /// Cues played.
    pub cues: Vec<(FxCue, Vec2Fixed)>,
    /// Notices shown.
    pub notices: Vec<Notice>,
}

impl FxSink for RecordingSink {
    fn play(&mut self, cue: FxCue, position: Vec2Fixed) {
        self.cues.push((cue, position));
    }
}

impl Notifier for RecordingSink {
    fn notify(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }
}

/// Sink that logs notices through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(notice = %notice.text),
            NoticeLevel::Warning => tracing::debug!(notice = %notice.text, "declined"),
            NoticeLevel::Alert => tracing::warn!(notice = %notice.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_expires_after_lifetime() {
        let mut effect = Effect::new(EffectKind::Muzzle, Vec2Fixed::ZERO);
        let mut visible_ticks = 0;
        while effect.update() {
            visible_ticks += 1;
        }
        assert_eq!(visible_ticks, EffectKind::Muzzle.lifetime() - 1);
    }
}
