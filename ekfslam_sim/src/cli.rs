// ekfslam_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

use crate::simulation::config::Overrides;

/// ekfslam_sim: runs EKF-SLAM scenarios and reports filter consistency.
///
/// This struct defines the command-line arguments accepted by the simulator binary.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/00_loop.toml")]
    pub scenario: PathBuf,

    /// Run every scenario found under this directory instead of `--scenario`.
    #[arg(long)]
    pub scenario_dir: Option<PathBuf>,

    /// Override the scenario's PRNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the scenario's number of steps.
    #[arg(long)]
    pub steps: Option<usize>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            seed: self.seed,
            steps: self.steps,
        }
    }
}
