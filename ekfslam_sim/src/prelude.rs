// ekfslam_sim/src/prelude.rs

// Re-export the entire ekfslam_core prelude so you can easily access
// pure types like `SlamState`, `EkfSlam`, `RangeBearing`, etc.
pub use ekfslam_core::prelude::*;

// Re-export common simulation-specific types for easy access.
pub use crate::simulation::config::{
    discover_scenarios, load_scenario, Overrides, ScenarioConfig, ScenarioError,
};
pub use crate::simulation::core::ground_truth::GroundTruthState;
pub use crate::simulation::core::prng::SimulationRng;
pub use crate::simulation::runner::{run_scenario, RunReport, StepRecord};
