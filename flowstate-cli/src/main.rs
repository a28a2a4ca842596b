//! FlowState CLI — evaluate regimes and manage persisted state.
//!
//! Commands:
//! - `evaluate`: run one cycle from a JSON snapshot or a directory of CSV series
//! - `state show`: print the persisted regime state
//! - `state reset`: delete the persisted regime state
//! - `config check`: validate a TOML config and print its fingerprint
//! - `config default`: print the default configuration as TOML

mod logging;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use flowstate_core::series::load_snapshot_dir;
use flowstate_core::{
    BtcSnapshot, EngineConfig, FileStateStore, MarketSnapshot, RegimeEngine, StateStore,
};

#[derive(Parser)]
#[command(
    name = "flowstate",
    version,
    about = "FlowState CLI — liquidity regime classification"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one evaluation cycle and print the result as JSON.
    Evaluate {
        /// Path to a TOML config file. Defaults to the built-in indicator set.
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON market snapshot (observations + btc).
        #[arg(long, conflicts_with = "data_dir", required_unless_present = "data_dir")]
        snapshot: Option<PathBuf>,

        /// Directory of `{key}.csv` series plus `btc.csv`.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Regime state file.
        #[arg(long, default_value = "regime_state.json")]
        state: PathBuf,

        /// Evaluation date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Compute the result without saving state.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Inspect or reset persisted regime state.
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Configuration helpers.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Print the persisted state as JSON.
    Show {
        #[arg(long, default_value = "regime_state.json")]
        state: PathBuf,
    },
    /// Delete the persisted state; the next cycle seeds afresh.
    Reset {
        #[arg(long, default_value = "regime_state.json")]
        state: PathBuf,

        /// Actually delete (without this flag, only reports what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a TOML config file.
    Check { path: PathBuf },
    /// Print the default configuration as TOML.
    Default,
}

fn main() -> Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            config,
            snapshot,
            data_dir,
            state,
            date,
            dry_run,
        } => run_evaluate(config, snapshot, data_dir, state, date, dry_run),
        Commands::State { action } => match action {
            StateAction::Show { state } => run_state_show(&state),
            StateAction::Reset { state, confirm } => run_state_reset(&state, confirm),
        },
        Commands::Config { action } => match action {
            ConfigAction::Check { path } => run_config_check(&path),
            ConfigAction::Default => run_config_default(),
        },
    }
}

fn run_evaluate(
    config: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    state: PathBuf,
    date: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let today = date
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--date must be YYYY-MM-DD")?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let snapshot = match (snapshot, data_dir) {
        (Some(path), None) => read_snapshot(&path)?,
        (None, Some(dir)) => load_snapshot_dir(&config, &dir)
            .with_context(|| format!("loading series from {}", dir.display()))?,
        _ => bail!("exactly one of --snapshot or --data-dir is required"),
    };

    let engine = RegimeEngine::new(config, FileStateStore::new(&state))?;
    let result = if dry_run {
        engine.preview(&snapshot.observations, &snapshot.btc, today)?
    } else {
        engine.evaluate_snapshot(&snapshot, today)?
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Read a JSON snapshot, re-deriving the BTC fields from price and average.
fn read_snapshot(path: &Path) -> Result<MarketSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let mut snapshot: MarketSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    snapshot.btc = BtcSnapshot::new(snapshot.btc.price, snapshot.btc.moving_average);
    Ok(snapshot)
}

fn run_state_show(path: &Path) -> Result<()> {
    match FileStateStore::new(path).load()? {
        Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
        None => println!("No regime state at {}", path.display()),
    }
    Ok(())
}

fn run_state_reset(path: &Path, confirm: bool) -> Result<()> {
    let store = FileStateStore::new(path);
    // A corrupt file can still be removed.
    let summary = match store.load() {
        Ok(None) => {
            println!("No regime state at {}", path.display());
            return Ok(());
        }
        Ok(Some(state)) => format!(
            "{} since {}, revision {}",
            state.current_regime, state.regime_start_date, state.revision
        ),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "regime state unreadable");
            "unreadable".to_string()
        }
    };

    if !confirm {
        println!(
            "Would remove {} ({summary}). Re-run with --confirm to delete.",
            path.display()
        );
        return Ok(());
    }

    store.reset()?;
    info!(path = %path.display(), "regime state reset");
    println!("Removed {}", path.display());
    Ok(())
}

fn run_config_check(path: &Path) -> Result<()> {
    let config = EngineConfig::from_file(path)
        .with_context(|| format!("invalid config {}", path.display()))?;
    println!("{}: ok", path.display());
    println!(
        "  indicators: {} (total weight {:.2})",
        config.indicators.len(),
        config.total_weight()
    );
    println!(
        "  thresholds: aggressive >= {}, defensive <= {}, margin {}, confirmation {} cycle(s)",
        config.aggressive_threshold,
        config.defensive_threshold,
        config.override_margin,
        config.confirmation_cycles
    );
    println!("  fingerprint: {}", config.fingerprint());
    Ok(())
}

fn run_config_default() -> Result<()> {
    print!("{}", EngineConfig::default().to_toml()?);
    Ok(())
}
