// ekfslam_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::association::DataAssociator;
pub use crate::estimation::StateEstimator;
pub use crate::messages::SlamInput;
pub use crate::models::dynamics::MotionModel;
pub use crate::models::measurement::LandmarkMeasurement;

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::config::SlamConfig;
pub use crate::error::{SlamError, SlamResult};
pub use crate::state::{SlamState, StateVariable};
pub use crate::types::{Odometry, Pose, RangeBearing};

// --- Estimation Algorithms ---
pub use crate::estimation::filters::SlamFilter;
pub use crate::estimation::{EkfSlam, UpdateOutcome};
pub use crate::mapping::add_landmarks;

// --- Concrete Model Implementations (Export common ones for convenience) ---
pub use crate::association::GatedNearestNeighbor;
pub use crate::models::dynamics::OdometryMotion;
pub use crate::models::measurement::RangeBearingModel;

// --- Diagnostics ---
pub use crate::diagnostics::{compute_nees, compute_nis, ConsistencyTracker, NeesBreakdown};
