use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tonelink_core::{
    driver::{self, DriverContext},
    AppConfig, RunFlag, RunSummary, SignalReader, SignalWriter, SystemClock,
};
use tracing_subscriber::EnvFilter;

mod backend;
mod signals;

fn main() -> tonelink_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Encode { path, seconds } => run_encode(&config, &path, seconds),
        Commands::Decode { path } => run_decode(&config, &path),
        Commands::Listen => run_listen(&config),
        Commands::Inspect { path, json } => run_inspect(&config, &path, json),
    };

    if let Err(err) = &result {
        tracing::error!(%err, "run failed");
    }
    result
}

fn run_encode(config: &AppConfig, path: &Path, seconds: Option<u64>) -> tonelink_core::Result<()> {
    tracing::info!(?path, ?seconds, "starting encode mode");

    let mut host = backend::open_host()?;
    let writer = SignalWriter::create(path, config.carriers.sample_rate)?;
    let flag = signals::install()?;
    let limit = seconds.map(|seconds| seconds.saturating_mul(u64::from(config.carriers.sample_rate)));

    let summary = driver::encode(
        &mut host,
        writer,
        DriverContext::new(config, &SystemClock, &flag),
        limit,
    )?;
    log_summary(&summary);
    Ok(())
}

fn run_decode(config: &AppConfig, path: &Path) -> tonelink_core::Result<()> {
    tracing::info!(?path, "starting decode mode");

    let reader = SignalReader::open(path)?;
    let mut host = backend::open_host()?;
    let flag = signals::install()?;

    let summary = driver::replay(
        reader,
        &mut host,
        DriverContext::new(config, &SystemClock, &flag),
    )?;
    log_summary(&summary);
    Ok(())
}

fn run_listen(config: &AppConfig) -> tonelink_core::Result<()> {
    tracing::info!(device = ?config.live.device, "starting listen mode");

    let mut host = backend::open_host()?;
    let mut device = backend::open_capture(config)?;
    let flag = signals::install()?;

    let summary = driver::listen(
        &mut device,
        &mut host,
        DriverContext::new(config, &SystemClock, &flag),
    )?;
    log_summary(&summary);
    Ok(())
}

fn run_inspect(config: &AppConfig, path: &Path, json: bool) -> tonelink_core::Result<()> {
    let report = driver::inspect(SignalReader::open(path)?, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        tracing::info!(
            sample_rate = report.info.sample_rate,
            samples = report.samples,
            duration_secs = report.duration_secs,
            windows = report.windows,
            power_x = report.mean_power.x,
            power_y = report.mean_power.y,
            power_key = report.mean_power.key,
            key_active_fraction = report.key_active_fraction,
            dominant_hz = report.spectrum.dominant_hz,
            "signal report"
        );
    }
    Ok(())
}

fn log_summary(summary: &RunSummary) {
    tracing::info!(
        mode = ?summary.mode,
        exit = ?summary.exit,
        samples = summary.samples,
        windows = summary.windows,
        warps = summary.warps,
        key_transitions = summary.key_transitions,
        xruns = summary.xruns,
        "run complete"
    );
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Carry pointer and key state over audio", long_about = None)]
struct Cli {
    /// JSON configuration file; defaults apply to anything it leaves out.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record pointer and keyboard state into a signal file.
    Encode {
        /// Output WAV file.
        path: PathBuf,
        /// Stop after this many seconds of audio instead of waiting for Ctrl-C.
        #[arg(short, long)]
        seconds: Option<u64>,
    },
    /// Replay a signal file as pointer motion and key events.
    Decode {
        /// Signal file written by `encode`.
        path: PathBuf,
    },
    /// Decode the default audio input in real time.
    Listen,
    /// Summarise a signal file without touching the display.
    Inspect {
        path: PathBuf,
        /// Print the report as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
}
