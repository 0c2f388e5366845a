//! Backlab CLI — run a single backtest or a parameter sweep.
//!
//! Commands:
//! - `run` — execute one backtest from a TOML spec, print the summary, and
//!   optionally write the raw trade log and equity curve as JSON
//! - `sweep` — execute the spec's parameter grid and print one outcome per
//!   grid point

use anyhow::{Context, Result};
use backlab_core::Engine;
use backlab_runner::{load_csv, run_sweep, RunSpec, SweepSpec};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "backlab", about = "Backlab CLI — deterministic backtest engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a single backtest from a TOML spec file.
    Run {
        /// Path to a TOML run spec.
        #[arg(long)]
        spec: PathBuf,

        /// Directory for trades.json and equity.json. Omit to skip writing.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Execute a parameter sweep from a TOML sweep spec.
    Sweep {
        /// Path to a TOML sweep spec.
        #[arg(long)]
        spec: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { spec, output_dir } => cmd_run(&spec, output_dir.as_deref()),
        Commands::Sweep { spec } => cmd_sweep(&spec),
    }
}

fn cmd_run(spec_path: &std::path::Path, output_dir: Option<&std::path::Path>) -> Result<()> {
    let spec = RunSpec::load(spec_path)
        .with_context(|| format!("loading run spec {}", spec_path.display()))?;
    let data = load_csv(&spec.data_path)
        .with_context(|| format!("loading bars from {}", spec.data_path.display()))?;

    let engine = Engine::new(spec.engine.clone())?;
    let mut strategy = spec.strategy.build();
    let result = engine
        .run(&data, strategy.as_mut())
        .context("backtest run failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "fingerprint": &result.fingerprint,
            "bars": result.bar_count,
            "trades": result.trades.len(),
            "final_equity": result.final_equity,
            "summary": &result.summary,
        }))?
    );

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output dir {}", dir.display()))?;
        std::fs::write(
            dir.join("trades.json"),
            serde_json::to_vec_pretty(&result.trades)?,
        )?;
        std::fs::write(
            dir.join("equity.json"),
            serde_json::to_vec_pretty(&result.equity_curve)?,
        )?;
        eprintln!("wrote trades.json and equity.json to {}", dir.display());
    }
    Ok(())
}

fn cmd_sweep(spec_path: &std::path::Path) -> Result<()> {
    let spec = SweepSpec::load(spec_path)
        .with_context(|| format!("loading sweep spec {}", spec_path.display()))?;
    let data = load_csv(&spec.data_path)
        .with_context(|| format!("loading bars from {}", spec.data_path.display()))?;

    let outcomes = run_sweep(&spec.engine, &spec.axes, &data, &spec.strategy)
        .context("parameter sweep failed")?;

    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    Ok(())
}
