//! Run configuration and catalog loading.
//!
//! A [`HeadlessConfig`] is read from a RON file and then patched by CLI
//! overrides. Every field has a default, so an empty `()` file is valid.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use frontline_core::ai::Difficulty;
use frontline_core::catalog::Catalog;
use frontline_core::error::GameError;
use frontline_core::simulation::MatchConfig;

use crate::strategies::StrategyKind;

/// Ten minutes of game time at 60 ticks per second.
pub const DEFAULT_MAX_TICKS: u64 = 36_000;

/// Errors raised by the headless runner.
#[derive(Error, Debug)]
pub enum HeadlessError {
    /// A file could not be read or written.
    #[error("{path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A RON file did not parse.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: ron::error::SpannedError,
    },

    /// The catalog loaded but failed validation.
    #[error("Catalog has {} problem(s): {}", .0.len(), .0.join("; "))]
    InvalidCatalog(Vec<String>),

    /// The core rejected the input.
    #[error(transparent)]
    Game(#[from] GameError),

    /// JSON output could not be produced.
    #[error("Failed to encode results: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Configuration for a headless match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Catalog file; the built-in catalog when absent.
    pub catalog: Option<PathBuf>,
    /// Opponent strength.
    pub difficulty: Difficulty,
    /// Match seed.
    pub seed: u64,
    /// Tick limit before the match is scored as undecided.
    pub max_ticks: u64,
    /// Scripted player behavior.
    pub strategy: StrategyKind,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            difficulty: Difficulty::default(),
            seed: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            strategy: StrategyKind::default(),
        }
    }
}

impl HeadlessConfig {
    /// Load a config from a RON file.
    pub fn load(path: &Path) -> Result<Self, HeadlessError> {
        let text = read(path)?;
        ron::from_str(&text).map_err(|source| HeadlessError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Core match settings for this run.
    #[must_use]
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            seed: self.seed,
            difficulty: self.difficulty,
            ..MatchConfig::default()
        }
    }

    /// The catalog this run plays with.
    pub fn load_catalog(&self) -> Result<Arc<Catalog>, HeadlessError> {
        match &self.catalog {
            Some(path) => load_catalog(path).map(Arc::new),
            None => Ok(Arc::new(Catalog::standard())),
        }
    }
}

/// Read, parse and validate a catalog file.
pub fn load_catalog(path: &Path) -> Result<Catalog, HeadlessError> {
    let text = read(path)?;
    let catalog = Catalog::from_ron_str(&text)?;
    let problems = catalog.validate();
    if !problems.is_empty() {
        return Err(HeadlessError::InvalidCatalog(problems));
    }
    tracing::debug!(path = %path.display(), "Catalog loaded");
    Ok(catalog)
}

/// The built-in catalog as RON text, as a starting point for custom data.
pub fn standard_catalog_ron() -> Result<String, HeadlessError> {
    ron::ser::to_string_pretty(&Catalog::standard().to_data(), ron::ser::PrettyConfig::default())
        .map_err(|err| HeadlessError::Game(GameError::InvalidState(err.to_string())))
}

fn read(path: &Path) -> Result<String, HeadlessError> {
    std::fs::read_to_string(path).map_err(|source| HeadlessError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: HeadlessConfig = ron::from_str("()").expect("parse");
        assert_eq!(config, HeadlessConfig::default());
        assert_eq!(config.max_ticks, DEFAULT_MAX_TICKS);
    }

    #[test]
    fn test_partial_config() {
        let config: HeadlessConfig =
            ron::from_str("(difficulty: Elite, seed: 9, strategy: Rush)").expect("parse");
        assert_eq!(config.difficulty, Difficulty::Elite);
        assert_eq!(config.seed, 9);
        assert_eq!(config.strategy, StrategyKind::Rush);
        assert_eq!(config.match_config().seed, 9);
    }

    #[test]
    fn test_standard_catalog_round_trips_through_ron() {
        let text = standard_catalog_ron().expect("serialize");
        let catalog = Catalog::from_ron_str(&text).expect("parse");
        assert!(catalog.validate().is_empty());
        assert_eq!(catalog.units().count(), Catalog::standard().units().count());
    }

    #[test]
    fn test_missing_catalog_is_io_error() {
        let err = load_catalog(Path::new("/nonexistent/catalog.ron")).expect_err("missing");
        assert!(matches!(err, HeadlessError::Io { .. }));
    }
}
