//! Headless match runner for AI playtesting and CI verification.
//!
//! Runs complete matches with no presentation layer:
//!
//! - **Playtesting**: a scripted player ([`strategies`]) fights the AI
//! - **Balance runs**: seeded batches in parallel ([`batch`])
//! - **CI verification**: catalog validation and determinism checks
//!
//! # Example
//!
//! ```bash
//! # One match, metrics as JSON on stdout
//! cargo run -p frontline_headless -- run --seed 7 --difficulty elite
//!
//! # 200 seeded matches on 8 threads
//! cargo run -p frontline_headless -- batch --games 200 --parallel 8 --output results/batch.json
//!
//! # Check a custom catalog
//! cargo run -p frontline_headless -- validate data/catalog.ron
//! ```

pub mod batch;
pub mod config;
pub mod metrics;
pub mod runner;
pub mod strategies;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use config::{HeadlessConfig, HeadlessError};
pub use metrics::{BatchSummary, MatchMetrics, MetricsCollector};
pub use runner::{run_match, verify_determinism, MatchRunner, VerifyReport};
pub use strategies::{ScriptedPlayer, Strategy, StrategyKind};
