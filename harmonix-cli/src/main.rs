//! Harmonix CLI — stream OHLC bars through the harmonic pattern detector.
//!
//! Commands:
//! - `run` — detect patterns in one CSV file and print the signal events
//! - `batch` — run several files in parallel, one detector per file
//! - `demo` — run on a seeded synthetic random walk
//! - `config` — print the default configuration and its fingerprint

mod detect;
mod loader;
mod synthetic;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing::info;

use harmonix_core::config::DetectorConfig;
use harmonix_core::domain::Timeframe;
use harmonix_core::orchestrator::SignalEvent;

use detect::{describe, run_detector, RunSummary};

#[derive(Parser)]
#[command(
    name = "harmonix",
    about = "Harmonix CLI — harmonic XABCD pattern detection"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, harmonix_core=trace).
    #[arg(long, global = true, default_value = "harmonix=info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect patterns in a CSV file (time,open,high,low,close[,volume]).
    Run {
        /// Path to the bar file.
        #[arg(long)]
        bars: PathBuf,

        /// Path to a TOML detector config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bar timeframe: m1, m5, m15, m30, h1, h4, d1, w1.
        #[arg(long, default_value = "h1")]
        timeframe: Timeframe,

        /// Print events and the summary as JSON lines.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run several bar files in parallel and print one summary per file.
    Batch {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value = "h1")]
        timeframe: Timeframe,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run on a seeded synthetic random walk.
    Demo {
        /// Number of bars to generate.
        #[arg(long, default_value_t = 5_000)]
        bars: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value = "h1")]
        timeframe: Timeframe,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the default configuration as TOML, followed by its fingerprint.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Run {
            bars,
            config,
            timeframe,
            json,
        } => run_file(&bars, config.as_deref(), timeframe, json),
        Commands::Batch {
            files,
            config,
            timeframe,
            json,
        } => run_batch(&files, config.as_deref(), timeframe, json),
        Commands::Demo {
            bars,
            seed,
            config,
            timeframe,
            json,
        } => run_demo(bars, seed, config.as_deref(), timeframe, json),
        Commands::Config => print_default_config(),
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DetectorConfig> {
    let Some(path) = path else {
        return Ok(DetectorConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = DetectorConfig::from_toml_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn run_file(path: &Path, config: Option<&Path>, timeframe: Timeframe, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let series = loader::load_bars(path, timeframe)?;
    if series.is_empty() {
        bail!("{} contains no bars", path.display());
    }
    info!(fingerprint = %config.fingerprint()?, bars = series.len(), "starting run");
    report(&series, &config, json)
}

fn run_demo(
    bars: usize,
    seed: u64,
    config: Option<&Path>,
    timeframe: Timeframe,
    json: bool,
) -> Result<()> {
    if bars == 0 {
        bail!("--bars must be > 0");
    }
    let config = load_config(config)?;
    let series = synthetic::random_walk(bars, seed, timeframe);
    info!(fingerprint = %config.fingerprint()?, seed, bars, "starting demo");
    report(&series, &config, json)
}

fn report(
    series: &harmonix_core::BarSeries,
    config: &DetectorConfig,
    json: bool,
) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut write_error: Option<anyhow::Error> = None;

    let summary = run_detector(series, config, |event: &SignalEvent| {
        if write_error.is_some() {
            return;
        }
        let line = if json {
            serde_json::to_string(event).map_err(anyhow::Error::from)
        } else {
            Ok(describe(event))
        };
        if let Err(e) = line.and_then(|l| writeln!(out, "{l}").map_err(anyhow::Error::from)) {
            write_error = Some(e);
        }
    });
    if let Some(e) = write_error {
        return Err(e);
    }

    print_summary(&mut out, None, &summary, json)
}

fn run_batch(
    files: &[PathBuf],
    config: Option<&Path>,
    timeframe: Timeframe,
    json: bool,
) -> Result<()> {
    let config = load_config(config)?;
    info!(fingerprint = %config.fingerprint()?, files = files.len(), "starting batch");

    let results: Vec<(PathBuf, Result<RunSummary>)> = files
        .par_iter()
        .map(|path| {
            let result = loader::load_bars(path, timeframe)
                .map(|series| run_detector(&series, &config, |_| {}));
            (path.clone(), result)
        })
        .collect();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut failed = 0usize;
    for (path, result) in &results {
        match result {
            Ok(summary) => print_summary(&mut out, Some(path.as_path()), summary, json)?,
            Err(e) => {
                failed += 1;
                eprintln!("Error for {}: {e:#}", path.display());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} files failed", results.len());
    }
    Ok(())
}

fn print_summary(
    out: &mut impl Write,
    path: Option<&Path>,
    summary: &RunSummary,
    json: bool,
) -> Result<()> {
    if json {
        let mut value = serde_json::to_value(summary)?;
        value["event"] = "summary".into();
        if let Some(path) = path {
            value["file"] = path.display().to_string().into();
        }
        writeln!(out, "{value}")?;
        return Ok(());
    }

    let label = path.map(|p| format!("{}: ", p.display())).unwrap_or_default();
    let hit_rate = summary
        .hit_rate()
        .map(|r| format!("{:.1}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    writeln!(
        out,
        "{label}{} bars, {} entries, {} tp, {} sl, {} breakeven, {} open, hit rate {hit_rate}",
        summary.bars,
        summary.entries,
        summary.take_profits,
        summary.stop_losses,
        summary.breakevens,
        summary.open_at_end,
    )?;
    Ok(())
}

fn print_default_config() -> Result<()> {
    let config = DetectorConfig::default();
    print!("{}", config.to_toml_string()?);
    println!("# fingerprint: {}", config.fingerprint()?);
    Ok(())
}
