// ekfslam_sim/src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use ekfslam_sim::cli::Cli;
use ekfslam_sim::prelude::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    // --- 1. Collect scenarios ---
    let paths = match &cli.scenario_dir {
        Some(dir) => discover_scenarios(dir)?,
        None => vec![cli.scenario.clone()],
    };

    // --- 2. Run them ---
    let mut failures = 0;
    for path in &paths {
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());

        let outcome = load_scenario(path, cli.overrides())
            .and_then(|config| run_scenario(&config))
            .with_context(|| format!("scenario {}", path.display()));

        match outcome {
            Ok(report) => report.log(&name),
            Err(e) if paths.len() > 1 => {
                error!("{e:#}");
                failures += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} scenario(s) failed", paths.len());
    }
    info!("Done.");
    Ok(())
}
