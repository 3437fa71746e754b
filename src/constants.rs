//! Pipeline default constants.

/// Default framewise-displacement threshold (same units as the motion
/// series, typically millimeters).
pub const DEFAULT_MOTION_THRESHOLD: f64 = 0.5;

/// Default trailing scrub window: timepoints censored after a violation.
pub const DEFAULT_SCRUB_WINDOW: usize = 2;

/// Default target edge density for adjacency thresholding.
pub const DEFAULT_EDGE_DENSITY: f64 = 0.1;

/// Default L1 penalty for the sparse inverse covariance estimate,
/// on the correlation scale.
pub const DEFAULT_GLASSO_PENALTY: f64 = 0.05;

/// Default maximum sweeps for the graphical lasso outer loop.
pub const DEFAULT_GLASSO_MAX_SWEEPS: usize = 100;

/// Default convergence tolerance for the graphical lasso, relative to
/// the mean absolute off-diagonal covariance.
pub const DEFAULT_GLASSO_TOLERANCE: f64 = 1e-4;

/// Default minimum modularity gain for a node move to be accepted.
pub const DEFAULT_MODULARITY_TOLERANCE: f64 = 1e-7;

/// Default cap on local-moving passes per coarsening level. Guarantees
/// termination of the community search.
pub const DEFAULT_MAX_PASSES: usize = 64;

/// Default floor on timepoints surviving the scrub.
pub const DEFAULT_MIN_RETAINED: usize = 10;

/// Relative singular-value cutoff used for the regression rank check.
pub const RANK_TOLERANCE: f64 = 1e-10;

/// Absolute tolerance for symmetry checks on correlation input.
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;
