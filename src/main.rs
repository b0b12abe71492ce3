use std::path::PathBuf;

use clap::Parser;
use log::{error, info, warn};

use tracklet_sim::simulation::{
    load_scenario, write_outputs, KinematicEngine, SeededUniform, SimWorld,
};

/// Seed used when TRACKLET_SIM_SEED is not set
const DEFAULT_SEED: u64 = 5489;

#[derive(Parser)]
#[command(name = "tracklet_sim")]
#[command(about = "Crowd simulation that writes ground-truth tracks and per-camera tracklets")]
struct Cli {
    /// Scenario file to load
    #[arg(default_value = "scenarios/example.txt")]
    input_file: PathBuf,

    /// Output prefix; writes <prefix>.csv and <prefix>_cam<N>.csv
    #[arg(default_value = "out")]
    output_prefix: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    info!("Loading environment from {}", cli.input_file.display());
    let scenario = match load_scenario(&cli.input_file) {
        Ok(scenario) => scenario,
        Err(e) => {
            error!("Unable to setup scenario: {}", e);
            std::process::exit(1);
        }
    };

    let seed = seed_from_env();
    let mut world = SimWorld::new(scenario, KinematicEngine::new(), SeededUniform::new(seed));

    if let Err(e) = world.run() {
        error!("Simulation aborted: {:#}", e);
        std::process::exit(1);
    }

    let output = world.finish();

    info!("Writing to {}", cli.output_prefix);
    let report = write_outputs(&cli.output_prefix, &output.tracks, &output.cameras);
    if !report.is_complete() {
        warn!("{} output file(s) could not be written", report.failed.len());
    }

    output.log_summary();
}

/// Read the RNG seed from TRACKLET_SIM_SEED, falling back to the default
fn seed_from_env() -> u64 {
    match std::env::var("TRACKLET_SIM_SEED") {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid TRACKLET_SIM_SEED '{}'", value);
            DEFAULT_SEED
        }),
        Err(_) => DEFAULT_SEED,
    }
}
