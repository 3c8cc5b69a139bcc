//! Batch match runner for balance testing.
//!
//! Runs many seeded matches in parallel using rayon and aggregates the
//! results into a [`BatchSummary`].

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{HeadlessConfig, HeadlessError};
use crate::metrics::{BatchSummary, MatchMetrics};
use crate::runner::MatchRunner;

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Per-match settings; `seed` is the first seed of the batch.
    pub base: HeadlessConfig,
    /// Number of matches.
    pub games: u32,
    /// Worker threads (0 = rayon default).
    pub threads: usize,
}

impl BatchConfig {
    /// `games` matches starting from the base config's seed.
    #[must_use]
    pub fn new(base: HeadlessConfig, games: u32) -> Self {
        Self {
            base,
            games,
            threads: 0,
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Per-match metrics, ordered by seed.
    pub games: Vec<MatchMetrics>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), HeadlessError> {
        let io = |source| HeadlessError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(io)
    }
}

/// Run a batch of matches.
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, HeadlessError> {
    let start = Instant::now();
    let catalog = config.base.load_catalog()?;
    let completed = Arc::new(AtomicU32::new(0));

    info!(
        games = config.games,
        seed = config.base.seed,
        difficulty = %config.base.difficulty,
        strategy = %config.base.strategy,
        "Starting batch run"
    );

    let play = |offset: u32| {
        let match_config = HeadlessConfig {
            seed: config.base.seed.wrapping_add(u64::from(offset)),
            ..config.base.clone()
        };
        let metrics = MatchRunner::new(&match_config, Arc::clone(&catalog)).run();
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % 10 == 0 || done == config.games {
            info!(done, total = config.games, "Batch progress");
        }
        metrics
    };

    let games: Vec<MatchMetrics> = if config.threads == 0 {
        (0..config.games).into_par_iter().map(play).collect()
    } else {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
        {
            Ok(pool) => pool.install(|| (0..config.games).into_par_iter().map(play).collect()),
            Err(err) => {
                warn!(%err, "Could not build thread pool, using the global one");
                (0..config.games).into_par_iter().map(play).collect()
            }
        }
    };

    let summary = BatchSummary::from_games(&games);
    Ok(BatchResults {
        config,
        games,
        summary,
        duration_seconds: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::StrategyKind;

    #[test]
    fn test_batch_runs_consecutive_seeds_in_order() {
        let base = HeadlessConfig {
            seed: 100,
            max_ticks: 600,
            strategy: StrategyKind::Rush,
            ..HeadlessConfig::default()
        };
        let results = run_batch(BatchConfig {
            threads: 2,
            ..BatchConfig::new(base, 4)
        })
        .expect("batch");

        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![100, 101, 102, 103]);
        assert_eq!(results.summary.total_games, 4);
        assert_eq!(results.summary.undecided, 4);
    }

    #[test]
    fn test_batch_matches_sequential_runs() {
        let base = HeadlessConfig {
            seed: 7,
            max_ticks: 900,
            ..HeadlessConfig::default()
        };
        let parallel = run_batch(BatchConfig::new(base.clone(), 2)).expect("batch");
        let sequential = crate::runner::run_match(&HeadlessConfig { seed: 8, ..base }).expect("run");
        assert_eq!(parallel.games[1].final_state_hash, sequential.final_state_hash);
    }
}
