//! Result types for a full pipeline run.

use serde::Serialize;

use crate::connectivity::CorrelationEstimate;
use crate::graph::{CommunityAssignment, ComponentReport, ThresholdedGraph};
use crate::signal::{ParcelSignal, RetainMask, ScrubReport, SignalMatrix};
use crate::types::ConfoundSet;
use crate::warnings::RunWarning;

/// Everything the pipeline produces for one confound-set variant.
#[derive(Debug, Clone, Serialize)]
pub struct VariantResult {
    /// Which confound design produced this variant.
    pub confound_set: ConfoundSet,

    /// Residualized vertex-level signal (regression output).
    pub residual: SignalMatrix,

    /// Per-region time series before scrubbing.
    pub parcels: ParcelSignal,

    /// Per-region time series after scrubbing.
    pub parcels_scrubbed: ParcelSignal,

    /// Full (Pearson) correlation estimate with exclusions.
    pub full_correlation: CorrelationEstimate,

    /// Partial (direct-connection) correlation estimate.
    pub partial_correlation: CorrelationEstimate,

    /// Fixed-density binary adjacency over the full correlation.
    pub thresholded: ThresholdedGraph,

    /// Giant component of the thresholded graph.
    pub giant_component: ComponentReport,

    /// Community assignment over the binary adjacency.
    pub communities_binary: CommunityAssignment,

    /// Community assignment over the signed full correlation matrix.
    ///
    /// Q values are not comparable across the two variants; compare the
    /// partitions instead (adjusted Rand index).
    pub communities_signed: CommunityAssignment,
}

/// Bookkeeping for a run: input shapes, counts, warnings, timing.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    /// Timepoints in the input signal.
    pub timepoints: usize,

    /// Vertex-level units in the input signal.
    pub units: usize,

    /// Base confound columns supplied (before derivatives and global
    /// signal).
    pub confounds: usize,

    /// Distinct nonzero region ids in the label assignment.
    pub regions: usize,

    /// NaN entries coerced to zero across both variants' correlation
    /// estimates.
    pub nan_coercions: usize,

    /// Non-fatal conditions resolved during the run.
    pub warnings: Vec<RunWarning>,

    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: f64,
}

/// Complete result of a connectivity pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityResult {
    /// The timepoint retain-mask derived from the motion series.
    pub mask: RetainMask,

    /// Retained/removed counts for the scrub.
    pub scrub: ScrubReport,

    /// Results with global signal regression.
    pub with_global_signal: VariantResult,

    /// Results without global signal regression.
    pub without_global_signal: VariantResult,

    /// Run bookkeeping.
    pub metadata: RunMetadata,
}

impl ConnectivityResult {
    /// The variant produced by the given confound set.
    pub fn variant(&self, set: ConfoundSet) -> &VariantResult {
        match set {
            ConfoundSet::WithGlobalSignal => &self.with_global_signal,
            ConfoundSet::WithoutGlobalSignal => &self.without_global_signal,
        }
    }

    /// Whether any recorded warning is critical.
    pub fn has_critical_warnings(&self) -> bool {
        self.metadata.warnings.iter().any(RunWarning::is_critical)
    }
}
