mod output;

use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use railcross_core::{config::AppConfig, input, simulation};
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::output::ConsoleSink;

#[derive(Debug, StructOpt)]
#[structopt(name = "railcross", about = "Single-track crossing dispatch simulator.")]
struct Opt {
    /// Train descriptor file, one `<direction> <loading> <crossing>` per line.
    #[structopt(name = "FILE", parse(from_os_str))]
    file: PathBuf,

    /// Extra configuration file layered over the user config.
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Write a JSON trace of the run to this path.
    #[structopt(long, parse(from_os_str))]
    trace: Option<PathBuf>,

    /// Also write diagnostics to this file.
    #[structopt(long, parse(from_os_str))]
    log_file: Option<PathBuf>,

    /// Override the wall-clock length of one tenth, in milliseconds.
    #[structopt(long)]
    tick_ms: Option<u64>,

    /// Emit scheduling decisions on stderr.
    #[structopt(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    init_logging(opt.verbose, opt.log_file.as_deref())?;

    let mut config = AppConfig::load_from(opt.config.as_deref())?;
    if let Some(tick_ms) = opt.tick_ms {
        config.simulation.tick_ms = tick_ms;
    }
    let trains = input::load_trains(&opt.file)?;
    info!(path = %opt.file.display(), trains = trains.len(), "Trains loaded");

    let mut sink = ConsoleSink::new(io::stdout());
    let report = simulation::run(&trains, &config.simulation, &mut sink)
        .context("simulation aborted")?;

    if let Some(path) = opt.trace {
        report.persist(&path)?;
        info!(path = %path.display(), "Trace written");
    }
    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .compact()
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
