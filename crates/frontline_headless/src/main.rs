//! Headless match runner.
//!
//! Runs matches without graphics and prints results as JSON on stdout.
//! Designed for balance runs, CI testing and determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Run a single match
//! cargo run -p frontline_headless -- run --strategy rush
//!
//! # Run a batch of seeded matches
//! cargo run -p frontline_headless -- batch --games 100 --output results/batch.json
//!
//! # Validate a catalog file, or print the built-in one
//! cargo run -p frontline_headless -- validate data/catalog.ron
//! cargo run -p frontline_headless -- validate --dump
//!
//! # Verify determinism by replaying one seed several times
//! cargo run -p frontline_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! Logs go to stderr; stdout carries only JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use frontline_core::ai::Difficulty;
use frontline_headless::config::{load_catalog, standard_catalog_ron};
use frontline_headless::{
    run_batch, run_match, verify_determinism, BatchConfig, HeadlessConfig, HeadlessError,
    StrategyKind,
};

#[derive(Parser)]
#[command(name = "frontline_headless")]
#[command(about = "Headless lane battle runner for playtesting and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// RON config file with match defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides shared by every match-playing command.
#[derive(clap::Args, Debug, Default)]
struct MatchArgs {
    /// Match seed
    #[arg(long)]
    seed: Option<u64>,

    /// Opponent difficulty (recruit, veteran, elite)
    #[arg(long)]
    difficulty: Option<Difficulty>,

    /// Scripted player strategy (balanced, rush, turtle)
    #[arg(long)]
    strategy: Option<StrategyKind>,

    /// Tick limit per match
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Catalog file to play with
    #[arg(long)]
    catalog: Option<PathBuf>,
}

impl MatchArgs {
    fn apply(self, config: &mut HeadlessConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        if self.catalog.is_some() {
            config.catalog = self.catalog;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single match
    Run {
        #[command(flatten)]
        args: MatchArgs,
    },

    /// Run a batch of matches on consecutive seeds
    Batch {
        #[command(flatten)]
        args: MatchArgs,

        /// Number of matches
        #[arg(short, long, default_value = "100")]
        games: u32,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Write full results here instead of printing the summary only
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a catalog file for errors
    Validate {
        /// Catalog RON file
        path: Option<PathBuf>,

        /// Print the built-in catalog as RON
        #[arg(long, conflicts_with = "path")]
        dump: bool,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        #[command(flatten)]
        args: MatchArgs,

        /// Number of verification runs
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr (stdout is for results)
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(%err, "Command failed");
            eprintln!("FATAL: {err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode, HeadlessError> {
    let mut config = match &cli.config {
        Some(path) => HeadlessConfig::load(path)?,
        None => HeadlessConfig::default(),
    };

    match cli.command {
        Commands::Run { args } => {
            args.apply(&mut config);
            let metrics = run_match(&config)?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Batch {
            args,
            games,
            parallel,
            output,
        } => {
            args.apply(&mut config);
            let results = run_batch(BatchConfig {
                threads: parallel,
                ..BatchConfig::new(config, games)
            })?;
            tracing::info!(
                games = results.games.len(),
                secs = format!("{:.1}", results.duration_seconds),
                "Batch complete"
            );
            if let Some(path) = output {
                results.save(&path)?;
                tracing::info!(path = %path.display(), "Results saved");
            }
            println!("{}", serde_json::to_string_pretty(&results.summary)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { path, dump } => cmd_validate(path, dump),
        Commands::Verify { args, runs } => {
            args.apply(&mut config);
            let report = verify_determinism(&config, runs)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.deterministic {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn cmd_validate(path: Option<PathBuf>, dump: bool) -> Result<ExitCode, HeadlessError> {
    if dump {
        println!("{}", standard_catalog_ron()?);
        return Ok(ExitCode::SUCCESS);
    }
    let Some(path) = path else {
        eprintln!("validate: pass a catalog path or --dump");
        return Ok(ExitCode::FAILURE);
    };
    match load_catalog(&path) {
        Ok(catalog) => {
            let units = catalog.units().count();
            let buildings = catalog.buildings().count();
            tracing::info!(path = %path.display(), units, buildings, "Catalog is valid");
            println!(
                "{}",
                serde_json::json!({ "valid": true, "units": units, "buildings": buildings })
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(HeadlessError::InvalidCatalog(problems)) => {
            println!(
                "{}",
                serde_json::json!({ "valid": false, "problems": problems })
            );
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err),
    }
}
