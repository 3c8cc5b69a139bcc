//! Match metrics collection for balance analysis.
//!
//! A [`MetricsCollector`] watches every [`TickReport`] of one match and
//! produces a serializable [`MatchMetrics`]; [`BatchSummary`] aggregates many.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use frontline_core::components::Team;
use frontline_core::effects::SimEvent;
use frontline_core::simulation::{Simulation, TickReport};
use frontline_core::world::{MatchOutcome, MatchStats};

use crate::config::HeadlessConfig;

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchMetrics {
    /// Random seed used.
    pub seed: u64,
    /// Opponent difficulty.
    pub difficulty: String,
    /// Scripted player strategy.
    pub strategy: String,
    /// Ticks played.
    pub duration_ticks: u64,
    /// Result, or `None` if the tick limit was reached first.
    pub outcome: Option<MatchOutcome>,
    /// Core match statistics.
    pub stats: MatchStats,
    /// Player units deployed by type.
    pub player_units: BTreeMap<String, u32>,
    /// Enemy units deployed by type.
    pub enemy_units: BTreeMap<String, u32>,
    /// Structures completed by the player.
    pub player_buildings: BTreeMap<String, u32>,
    /// Special weapons the AI launched, by weapon.
    pub weapons_launched: BTreeMap<String, u32>,
    /// Number of wave phase changes.
    pub wave_changes: u32,
    /// Ticks spent in each wave phase.
    pub wave_ticks: BTreeMap<String, u64>,
    /// Tick the AI committed its reserve.
    pub total_war_tick: Option<u64>,
    /// Largest simultaneous player army.
    pub peak_player_army: u32,
    /// Largest simultaneous enemy army.
    pub peak_enemy_army: u32,
    /// Requests the scripted player had declined.
    pub declined_requests: u32,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl MatchMetrics {
    /// Short result label.
    #[must_use]
    pub fn result_label(&self) -> &'static str {
        match self.outcome {
            Some(MatchOutcome::Victory) => "victory",
            Some(MatchOutcome::Defeat) => "defeat",
            Some(MatchOutcome::Draw) => "draw",
            None => "undecided",
        }
    }
}

/// Accumulates metrics while a match runs.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    metrics: MatchMetrics,
}

impl MetricsCollector {
    /// Start collecting for a match.
    #[must_use]
    pub fn new(config: &HeadlessConfig) -> Self {
        Self {
            metrics: MatchMetrics {
                seed: config.seed,
                difficulty: config.difficulty.to_string(),
                strategy: config.strategy.to_string(),
                ..MatchMetrics::default()
            },
        }
    }

    /// Fold one tick into the metrics.
    pub fn observe(&mut self, report: &TickReport, sim: &Simulation) {
        let metrics = &mut self.metrics;
        for event in &report.events {
            match event {
                SimEvent::UnitSpawned { team, key, .. } => {
                    let table = match team {
                        Team::Enemy => &mut metrics.enemy_units,
                        _ => &mut metrics.player_units,
                    };
                    *table.entry(key.clone()).or_default() += 1;
                }
                SimEvent::BuildingCompleted {
                    team: Team::Player,
                    key,
                    ..
                } => {
                    *metrics.player_buildings.entry(key.clone()).or_default() += 1;
                }
                SimEvent::WeaponLaunched {
                    team: Team::Enemy,
                    weapon,
                    ..
                } => {
                    *metrics
                        .weapons_launched
                        .entry(format!("{weapon:?}"))
                        .or_default() += 1;
                }
                SimEvent::WavePhaseChanged { .. } => metrics.wave_changes += 1,
                SimEvent::TotalWar { .. } => metrics.total_war_tick = Some(report.tick),
                _ => {}
            }
        }

        let phase = sim.ai().waves.phase();
        *metrics.wave_ticks.entry(format!("{phase:?}")).or_default() += 1;

        let world = sim.world();
        let alive = |team: Team| world.units(team).iter().filter(|u| u.is_alive()).count() as u32;
        metrics.peak_player_army = metrics.peak_player_army.max(alive(Team::Player));
        metrics.peak_enemy_army = metrics.peak_enemy_army.max(alive(Team::Enemy));
    }

    /// Close out the match.
    #[must_use]
    pub fn finish(mut self, sim: &Simulation, declined_requests: u32) -> MatchMetrics {
        let world = sim.world();
        self.metrics.duration_ticks = world.tick;
        self.metrics.outcome = world.outcome;
        self.metrics.stats = world.stats.clone();
        self.metrics.declined_requests = declined_requests;
        self.metrics.final_state_hash = sim.state_hash();
        self.metrics
    }
}

/// Summary statistics across multiple matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_games: u32,
    /// Player wins.
    pub victories: u32,
    /// Player losses.
    pub defeats: u32,
    /// Mutual headquarters kills.
    pub draws: u32,
    /// Matches that hit the tick limit.
    pub undecided: u32,
    /// Player win rate over decided matches.
    pub win_rate: f64,
    /// Average match duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest match.
    pub min_duration_ticks: u64,
    /// Longest match.
    pub max_duration_ticks: u64,
    /// Average enemy units killed.
    pub avg_kills: f64,
    /// Average player units lost.
    pub avg_losses: f64,
    /// Average special weapons launched by the AI.
    pub avg_special_weapons: f64,
    /// Share of matches where the AI went to total war.
    pub total_war_rate: f64,
}

impl BatchSummary {
    /// Calculate summary from a list of match metrics.
    #[must_use]
    pub fn from_games(games: &[MatchMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let total = games.len() as f64;
        let mut summary = Self {
            total_games: games.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Self::default()
        };

        let mut duration_sum = 0u64;
        let mut kills = 0u64;
        let mut losses = 0u64;
        let mut weapons = 0u64;
        let mut total_war = 0u32;

        for game in games {
            match game.outcome {
                Some(MatchOutcome::Victory) => summary.victories += 1,
                Some(MatchOutcome::Defeat) => summary.defeats += 1,
                Some(MatchOutcome::Draw) => summary.draws += 1,
                None => summary.undecided += 1,
            }
            duration_sum += game.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.duration_ticks);
            kills += u64::from(game.stats.kills);
            losses += u64::from(game.stats.losses);
            weapons += u64::from(game.stats.special_weapons_fired);
            if game.total_war_tick.is_some() {
                total_war += 1;
            }
        }

        let decided = summary.victories + summary.defeats + summary.draws;
        if decided > 0 {
            summary.win_rate = f64::from(summary.victories) / f64::from(decided);
        }
        summary.avg_duration_ticks = duration_sum as f64 / total;
        summary.avg_kills = kills as f64 / total;
        summary.avg_losses = losses as f64 / total;
        summary.avg_special_weapons = weapons as f64 / total;
        summary.total_war_rate = f64::from(total_war) / total;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(outcome: Option<MatchOutcome>, ticks: u64, kills: u32) -> MatchMetrics {
        MatchMetrics {
            outcome,
            duration_ticks: ticks,
            stats: MatchStats {
                kills,
                ..MatchStats::default()
            },
            ..MatchMetrics::default()
        }
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let games = vec![
            game(Some(MatchOutcome::Victory), 1000, 10),
            game(Some(MatchOutcome::Defeat), 3000, 4),
            game(None, 2000, 7),
        ];
        let summary = BatchSummary::from_games(&games);
        assert_eq!(summary.total_games, 3);
        assert_eq!(summary.victories, 1);
        assert_eq!(summary.defeats, 1);
        assert_eq!(summary.undecided, 1);
        assert!((summary.win_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(summary.min_duration_ticks, 1000);
        assert_eq!(summary.max_duration_ticks, 3000);
        assert!((summary.avg_kills - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(BatchSummary::from_games(&[]), BatchSummary::default());
    }

    #[test]
    fn test_metrics_serialize_to_json() {
        let metrics = game(Some(MatchOutcome::Victory), 10, 1);
        let json = serde_json::to_string(&metrics).expect("encode");
        assert!(json.contains("\"outcome\":\"Victory\""));
        let back: MatchMetrics = serde_json::from_str(&json).expect("decode");
        assert_eq!(back, metrics);
        assert_eq!(back.result_label(), "victory");
    }
}
