//! Type aliases and common types.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Dense real matrix with runtime dimensions.
///
/// Time-by-unit signal matrices, confound designs, correlation and
/// adjacency matrices all use this representation.
pub type Matrix = DMatrix<f64>;

/// Dense real vector with runtime dimension.
pub type Vector = DVector<f64>;

/// Which nuisance design to regress out of the signal.
///
/// The two variants correspond to the standard analysis fork: removing
/// motion/physiological confounds alone, or additionally removing the
/// mean signal across all units (global signal regression).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfoundSet {
    /// Nuisance columns plus the per-timepoint global mean signal.
    WithGlobalSignal,
    /// Nuisance columns only.
    WithoutGlobalSignal,
}

impl ConfoundSet {
    /// Short name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            ConfoundSet::WithGlobalSignal => "with_global_signal",
            ConfoundSet::WithoutGlobalSignal => "without_global_signal",
        }
    }
}
