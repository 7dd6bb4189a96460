//! lockpool: command-line front end for the Lockpool staking ledger.
//!
//! Prints the rate curve for a configuration and replays JSON operation
//! scripts against an in-memory pool.

mod config;
mod script;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use lockpool_core::traits::RateModel;
use lockpool_rate::DecayingRate;
use tracing::{info, warn};

use crate::config::ConfigArgs;
use crate::script::{parse_script, Simulator};

/// Lockpool staking ledger tools.
#[derive(Parser, Debug)]
#[command(name = "lockpool", version, about = "Custodial value-locking ledger tools")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the rate as a function of total locked value.
    Curve(CurveArgs),
    /// Replay a JSON operation script against an in-memory pool.
    ///
    /// Fails if the ledger's bookkeeping is inconsistent after replay. An
    /// insolvent pool (for example after a `drain` step) is reported by the
    /// `surplus` op and is not an error.
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
struct CurveArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Largest total locked value to print (default: just past the floor)
    #[arg(long)]
    max: Option<u128>,

    /// Distance between printed rows (default: max / 20)
    #[arg(long)]
    step: Option<u128>,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// JSON script to replay
    #[arg(long)]
    script: PathBuf,

    /// Write the final records and pool snapshot to this file
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    match cli.command {
        Commands::Curve(args) => curve(args),
        Commands::Simulate(args) => simulate(args),
    }
}

/// Print `locked rate` rows and the floor threshold.
fn curve(args: CurveArgs) -> Result<()> {
    let config = args.config.load()?;
    let model = DecayingRate::from_config(&config).context("Failed to build rate model")?;
    let threshold = model.floor_threshold();

    let max = match (args.max, threshold) {
        (Some(max), _) => max,
        (None, Some(t)) => t.saturating_add(t / 10).max(20),
        (None, None) => bail!("curve never reaches its floor; pass --max"),
    };
    let step = args.step.unwrap_or(max / 20).max(1);
    info!(max, step, "printing rate curve");

    let mut out = std::io::stdout().lock();
    writeln!(out, "{:>24} {:>10}", "total_locked", "rate_bps")?;
    let mut locked: u128 = 0;
    loop {
        writeln!(out, "{:>24} {:>10}", locked, model.rate(locked))?;
        if locked >= max {
            break;
        }
        locked = locked.saturating_add(step).min(max);
    }
    match threshold {
        Some(t) => writeln!(out, "floor of {} bps reached at total_locked = {t}", model.minimum_rate())?,
        None => writeln!(out, "floor of {} bps is never reached", model.minimum_rate())?,
    }
    Ok(())
}

/// Replay a script, printing one JSON line per step.
fn simulate(args: SimulateArgs) -> Result<()> {
    let config = args.config.load()?;
    let raw = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script: {}", args.script.display()))?;
    let script = parse_script(&raw)?;

    let mut sim = Simulator::new(&config, script.start)?;
    let mut out = std::io::stdout().lock();
    for step in &script.steps {
        let outcome = sim.step(step);
        let line = serde_json::to_string(&outcome).context("Failed to encode outcome")?;
        writeln!(out, "{line}")?;
    }

    if let Some(path) = &args.dump {
        let dump = serde_json::to_string_pretty(&sim.dump()).context("Failed to encode dump")?;
        std::fs::write(path, dump)
            .with_context(|| format!("Failed to write dump: {}", path.display()))?;
        info!(path = %path.display(), "wrote pool dump");
    }

    if let Err(violation) = sim.pool().check_bookkeeping() {
        bail!("ledger invariant broken after replay: {violation}");
    }
    if let Err(e) = sim.pool().surplus_yield() {
        warn!(error = %e, "pool is insolvent after replay");
    }
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// `RUST_LOG` takes precedence over `level_str`. Logs go to stderr so stdout
/// stays machine-readable.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}
