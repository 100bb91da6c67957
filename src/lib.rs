//! Railway platform scheduling.
//!
//! Assigns trains to platforms at their origin station, finds conflicts in
//! the resulting schedule and proposes ranked corrective actions.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Station`, `Train`, `ScheduleEntry`,
//!   `Placement`, `Schedule`, `Conflict`, `Recommendation`, delays and
//!   overrides
//! - **`scheduler`**: `GreedyScheduler` and `IlpScheduler` behind the
//!   `Scheduler` trait, plus KPI and schedule comparison
//! - **`conflicts`**: Platform overlap, headway and priority detection with
//!   an impact summary
//! - **`recommend`**: Conflict-targeted, delay-reduction and load-balancing
//!   recommendations with scoring
//! - **`session`**: `DispatchSession`, the stateful context for overrides,
//!   delays, feasibility checks and what-if scenarios
//! - **`validation`**: Input integrity checks (duplicate IDs, station refs,
//!   platform ranges)
//! - **`config`**, **`dataset`**, **`error`**: TOML settings, JSON input,
//!   error types
//!
//! # Data Flow
//!
//! ```text
//! Dataset -> Scheduler -> Schedule -> ConflictDetector -> RecommendationEngine
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Lusby et al. (2011), "Railway track allocation: models and methods"

pub mod config;
pub mod conflicts;
pub mod dataset;
pub mod error;
pub mod models;
pub mod recommend;
pub mod scheduler;
pub mod session;
pub mod validation;

pub use config::{OptimizerMode, PlannerConfig};
pub use conflicts::{detect_conflicts, ConflictDetector, ImpactReport};
pub use dataset::Dataset;
pub use error::{PlannerError, Result};
pub use recommend::{generate_recommendations, RecommendationEngine};
pub use scheduler::{for_mode, GreedyScheduler, IlpScheduler, Scheduler};
pub use session::DispatchSession;
