//! Single-match runner.
//!
//! Plays one scripted player against the AI with no presentation layer.
//! Notices go to the log; play-effect cues are dropped.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use frontline_core::catalog::Catalog;
use frontline_core::effects::LogNotifier;
use frontline_core::simulation::Simulation;

use crate::config::{HeadlessConfig, HeadlessError};
use crate::metrics::{MatchMetrics, MetricsCollector};
use crate::strategies::ScriptedPlayer;

/// A match in progress.
#[derive(Debug)]
pub struct MatchRunner {
    sim: Simulation,
    player: ScriptedPlayer,
    collector: MetricsCollector,
    max_ticks: u64,
}

impl MatchRunner {
    /// Set up a match with an already loaded catalog.
    #[must_use]
    pub fn new(config: &HeadlessConfig, catalog: Arc<Catalog>) -> Self {
        let mut sim = Simulation::new(catalog, &config.match_config());
        sim.set_notifier(Box::new(LogNotifier));
        Self {
            sim,
            player: ScriptedPlayer::new(config.strategy.strategy()),
            collector: MetricsCollector::new(config),
            max_ticks: config.max_ticks,
        }
    }

    /// The simulation being played.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Advance one tick. Returns false once the match is over or out of time.
    pub fn step(&mut self) -> bool {
        if self.sim.world().is_over() || self.sim.world().tick >= self.max_ticks {
            return false;
        }
        self.player.act(&mut self.sim);
        let report = self.sim.tick();
        self.collector.observe(&report, &self.sim);
        true
    }

    /// Play to the end and return the metrics.
    pub fn run(mut self) -> MatchMetrics {
        while self.step() {}
        let metrics = self.collector.finish(&self.sim, self.player.declined());
        tracing::info!(
            seed = metrics.seed,
            result = metrics.result_label(),
            ticks = metrics.duration_ticks,
            kills = metrics.stats.kills,
            losses = metrics.stats.losses,
            "Match finished"
        );
        metrics
    }
}

/// Load the configured catalog and play one match.
pub fn run_match(config: &HeadlessConfig) -> Result<MatchMetrics, HeadlessError> {
    let catalog = config.load_catalog()?;
    Ok(MatchRunner::new(config, catalog).run())
}

/// Outcome of a repeated-run determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Seed checked.
    pub seed: u64,
    /// Runs performed.
    pub runs: u32,
    /// Final hash of every run.
    pub hashes: Vec<u64>,
    /// All runs agreed.
    pub deterministic: bool,
}

/// Play the same configured match `runs` times and compare final hashes.
pub fn verify_determinism(config: &HeadlessConfig, runs: u32) -> Result<VerifyReport, HeadlessError> {
    let catalog = config.load_catalog()?;
    let hashes: Vec<u64> = (0..runs)
        .map(|_| MatchRunner::new(config, Arc::clone(&catalog)).run().final_state_hash)
        .collect();
    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !deterministic {
        tracing::warn!(seed = config.seed, ?hashes, "Runs diverged");
    }
    Ok(VerifyReport {
        seed: config.seed,
        runs,
        hashes,
        deterministic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::StrategyKind;
    use frontline_core::ai::Difficulty;

    fn short(strategy: StrategyKind) -> HeadlessConfig {
        HeadlessConfig {
            seed: 21,
            difficulty: Difficulty::Veteran,
            max_ticks: 2400,
            strategy,
            ..HeadlessConfig::default()
        }
    }

    #[test]
    fn test_match_stops_at_tick_limit() {
        let metrics = run_match(&short(StrategyKind::Balanced)).expect("run");
        assert!(metrics.duration_ticks <= 2400);
        assert!(metrics.player_units.values().sum::<u32>() > 0);
        assert_eq!(metrics.strategy, "balanced");
    }

    #[test]
    fn test_every_strategy_is_deterministic() {
        for kind in StrategyKind::ALL {
            let report = verify_determinism(&short(kind), 2).expect("verify");
            assert!(report.deterministic, "{kind} diverged: {:?}", report.hashes);
        }
    }

    #[test]
    fn test_step_reports_progress() {
        let config = short(StrategyKind::Rush);
        let mut runner = MatchRunner::new(&config, Arc::new(Catalog::standard()));
        assert!(runner.step());
        assert_eq!(runner.simulation().world().tick, 1);
    }
}
