// ekfslam_sim/src/simulation/config/mod.rs

//! This module handles loading, discovering, and validating scenario
//! configuration from disk.

pub mod structs;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use ekfslam_core::error::SlamError;
pub use structs::{Robot, ScenarioConfig, Sensor, Simulation, World};

/// Everything that can go wrong before or while running a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to load scenario {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },

    #[error("no scenario files found under {0:?}")]
    NoScenarios(PathBuf),

    #[error("invalid scenario: {0}")]
    Invalid(String),

    #[error("filter error: {0}")]
    Filter(#[from] SlamError),
}

/// Command-line overrides applied on top of the file contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub steps: Option<usize>,
}

impl ScenarioConfig {
    /// Checks everything the filter does not check itself.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.filter.validate()?;
        if !(self.simulation.confidence > 0.0 && self.simulation.confidence < 1.0) {
            return Err(ScenarioError::Invalid(format!(
                "confidence {} must lie in (0, 1)",
                self.simulation.confidence
            )));
        }
        if !(self.sensor.max_range > 0.0) {
            return Err(ScenarioError::Invalid(format!(
                "sensor max_range {} must be positive",
                self.sensor.max_range
            )));
        }
        if !(self.sensor.field_of_view_deg > 0.0 && self.sensor.field_of_view_deg <= 360.0) {
            return Err(ScenarioError::Invalid(format!(
                "field_of_view_deg {} must lie in (0, 360]",
                self.sensor.field_of_view_deg
            )));
        }
        if self.robot.initial_std.iter().any(|s| !(*s >= 0.0)) {
            return Err(ScenarioError::Invalid(
                "initial_std entries must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads a scenario: built-in defaults, then the TOML file, then `overrides`.
pub fn load_scenario(path: &Path, overrides: Overrides) -> Result<ScenarioConfig, ScenarioError> {
    info!("Loading scenario from: {}", path.display());

    let mut config: ScenarioConfig = Figment::from(Serialized::defaults(ScenarioConfig::default()))
        .merge(Toml::file(path))
        .extract()
        .map_err(|e| ScenarioError::Load {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    if let Some(seed) = overrides.seed {
        config.simulation.seed = seed;
    }
    if let Some(steps) = overrides.steps {
        config.simulation.steps = steps;
    }
    config.validate()?;

    match toml::to_string_pretty(&config) {
        Ok(effective) => debug!("Effective scenario:\n{effective}"),
        Err(e) => warn!("Could not render effective scenario: {e}"),
    }
    Ok(config)
}

/// Walks `dir` and returns every `.toml` file, sorted by path.
pub fn discover_scenarios(dir: &Path) -> Result<Vec<PathBuf>, ScenarioError> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            !e.file_type().is_dir() && e.path().extension().map_or(false, |ext| ext == "toml")
        })
        .map(|e| e.into_path())
        .collect();
    found.sort();

    if found.is_empty() {
        return Err(ScenarioError::NoScenarios(dir.to_path_buf()));
    }
    info!("Found {} scenario(s) under {}", found.len(), dir.display());
    Ok(found)
}
