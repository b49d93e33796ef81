use anyhow::{Context, Result};
use clap::Parser;
use reactsim::config::SimConfig;
use reactsim::core::{Observer, PlotSample, Simulation};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_STEP_CAP: u64 = 20_000;

/// Headless runner: simulate to termination and export the time series.
#[derive(Parser, Debug)]
#[command(name = "reactsim")]
#[command(about = "Reactive hard-sphere gas in a box", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply to anything it omits
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output directory for the exported CSV files
    #[arg(long)]
    out: Option<PathBuf>,
    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many steps even if reagents remain [default: 20000]
    #[arg(long)]
    max_steps: Option<u64>,
    /// Override the initial particle count
    #[arg(long)]
    particles: Option<usize>,
    /// Log progress every N steps (0 disables)
    #[arg(long, default_value_t = 1000)]
    report_every: u64,
    /// Debug-level logging (every collision and reaction)
    #[arg(short, long)]
    verbose: bool,
}

/// Logs a progress line every `every` steps.
struct ProgressLog {
    every: u64,
}

impl Observer for ProgressLog {
    fn plot(&mut self, sample: &PlotSample) {
        if self.every > 0 && sample.step % self.every == 0 {
            info!(
                step = sample.step,
                reagents = sample.reagents,
                products = sample.products,
                temperature = sample.temperature,
                "progress"
            );
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "reactsim=debug" } else { "reactsim=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    // An odd reagent left over can never react, so headless runs always carry a cap.
    config.max_steps = cli.max_steps.or(config.max_steps).or(Some(DEFAULT_STEP_CAP));
    if let Some(n) = cli.particles {
        config.particle_count = n;
    }
    if let Some(out) = cli.out {
        config.export_dir = out;
    }

    let mut sim = Simulation::new(config).context("building simulation")?;
    let mut progress = ProgressLog {
        every: cli.report_every,
    };
    let (reason, paths) = sim
        .run_and_export(&mut progress)
        .context("running simulation")?;

    info!(
        ?reason,
        steps = sim.step_count(),
        reagents = sim.reagent_count(),
        products = sim.product_count(),
        concentration = %paths.concentration.display(),
        temperature = %paths.temperature.display(),
        "done"
    );
    Ok(())
}
