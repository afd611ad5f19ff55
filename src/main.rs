extern crate heatloss;

use anyhow::Context;
use clap::Parser;
use heatloss::core::units::{TimeUnit, WindowLength};
use heatloss::output::FileOutput;
use heatloss::{run_simulation, SimulationConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct HeatLossArgs {
    /// CSV file with `time,temperature` rows
    temperature_file: PathBuf,
    /// JSON simulation config. A built-in house is used when absent.
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Length of one simulation step, overriding the config
    #[arg(long, short)]
    window: Option<f64>,
    #[arg(long, default_value_t = TimeUnit::Day)]
    window_unit: TimeUnit,
    #[arg(long, short, default_value = ".")]
    output_dir: PathBuf,
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = HeatLossArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_reader(BufReader::new(
            File::open(path).with_context(|| format!("Could not open {}", path.display()))?,
        ))?,
        None => SimulationConfig::default(),
    };
    if let Some(magnitude) = args.window {
        config.window_length = WindowLength::new(magnitude, args.window_unit);
    }

    let temperatures = File::open(&args.temperature_file)
        .with_context(|| format!("Could not open {}", args.temperature_file.display()))?;
    let output = FileOutput::new(args.output_dir, "{}.csv".to_string());

    let summary = run_simulation(config, BufReader::new(temperatures), &output)?;
    info!(
        "{} steps over {} h: final heat loss {}, {:.1} kWh lost, electricity cost {}",
        summary.steps,
        summary.simulated_hours,
        summary.final_heat_loss,
        summary.cumulative_heat_loss,
        summary.electricity_cost
    );

    Ok(())
}
