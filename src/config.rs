//! Configuration for the connectivity pipeline.

use crate::constants::{
    DEFAULT_EDGE_DENSITY, DEFAULT_GLASSO_MAX_SWEEPS, DEFAULT_GLASSO_PENALTY,
    DEFAULT_GLASSO_TOLERANCE, DEFAULT_MAX_PASSES, DEFAULT_MIN_RETAINED,
    DEFAULT_MODULARITY_TOLERANCE, DEFAULT_MOTION_THRESHOLD, DEFAULT_SCRUB_WINDOW,
};

/// Configuration options for `ConnectivityPipeline`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Motion-magnitude threshold above which a timepoint is a violation
    /// (default: 0.5).
    pub motion_threshold: f64,

    /// Trailing window: number of timepoints censored after each
    /// violation, in addition to the violation itself and the timepoint
    /// immediately before it (default: 2).
    pub scrub_window: usize,

    /// Minimum timepoints that must survive scrubbing (default: 10).
    ///
    /// When regression follows, the effective floor is raised to one more
    /// than the confound count.
    pub min_retained: usize,

    /// Confound columns whose first-order backward difference is
    /// appended to the design before regression (default: none).
    pub derivative_columns: Vec<String>,

    /// Target edge density in (0, 1] for adjacency thresholding
    /// (default: 0.1).
    pub edge_density: f64,

    /// Sparse inverse covariance estimation settings.
    pub glasso: GlassoConfig,

    /// Community detection settings.
    pub modularity: ModularityConfig,
}

/// Settings for the graphical-lasso partial correlation estimator.
#[derive(Debug, Clone)]
pub struct GlassoConfig {
    /// L1 penalty on off-diagonal precision entries, applied on the
    /// correlation scale (default: 0.05). Zero degrades to a
    /// jitter-stabilized inverse.
    pub penalty: f64,

    /// Maximum outer coordinate-descent sweeps (default: 100).
    pub max_sweeps: usize,

    /// Convergence tolerance on the covariance update, relative to the
    /// mean absolute off-diagonal entry (default: 1e-4).
    pub tolerance: f64,
}

/// Settings for modularity-based community detection.
#[derive(Debug, Clone)]
pub struct ModularityConfig {
    /// Optional seed for the local-search node ordering.
    ///
    /// `None` (the default) draws the ordering from entropy, so repeated
    /// runs may return different partitions of equal quality. Fix the
    /// seed for reproducible assignments.
    pub seed: Option<u64>,

    /// Minimum modularity gain for a node move to count as an
    /// improvement (default: 1e-7).
    pub tolerance: f64,

    /// Cap on local-moving passes per coarsening level (default: 64).
    pub max_passes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            motion_threshold: DEFAULT_MOTION_THRESHOLD,
            scrub_window: DEFAULT_SCRUB_WINDOW,
            min_retained: DEFAULT_MIN_RETAINED,
            derivative_columns: Vec::new(),
            edge_density: DEFAULT_EDGE_DENSITY,
            glasso: GlassoConfig::default(),
            modularity: ModularityConfig::default(),
        }
    }
}

impl Default for GlassoConfig {
    fn default() -> Self {
        Self {
            penalty: DEFAULT_GLASSO_PENALTY,
            max_sweeps: DEFAULT_GLASSO_MAX_SWEEPS,
            tolerance: DEFAULT_GLASSO_TOLERANCE,
        }
    }
}

impl Default for ModularityConfig {
    fn default() -> Self {
        Self {
            seed: None,
            tolerance: DEFAULT_MODULARITY_TOLERANCE,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}
