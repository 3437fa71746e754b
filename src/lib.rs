//! # fconn
//!
//! Estimate functional connectivity between brain regions from
//! regional-activity time series and analyze the resulting graph
//! structure.
//!
//! The pipeline assumes preprocessed, spatially-normalized signals and
//! region definitions already materialized in memory, and provides the
//! reproducible numeric core: confound regression (with and without
//! global-signal removal), motion-based timepoint censoring,
//! parcel-level aggregation, full and partial correlation, fixed-density
//! adjacency thresholding, and modularity-based community detection for
//! binary and signed/weighted graphs.
//!
//! File-format loading, atlas handling, rendering, and orchestration
//! live outside this crate; every stage here consumes and produces
//! in-memory matrices.
//!
//! ## Quick Start
//!
//! ```ignore
//! use fconn::{analyze, ConnectivityPipeline, LabelAssignment};
//!
//! // signal: T x U vertex time series; confounds: T x C nuisance
//! // columns; motion: framewise displacement per timepoint; labels:
//! // region id per vertex.
//! let result = analyze(&signal, &confounds, &motion, &labels)?;
//!
//! println!("{}", fconn::output::terminal::format_result(&result));
//! ```
//!
//! ## Reproducibility
//!
//! Community detection is a randomized local search. Unseeded runs may
//! return different partitions of comparable modularity; fix a seed
//! with [`ConnectivityPipeline::seed`] for identical assignments across
//! runs. Compare partitions between variants with
//! [`adjusted_rand_index`]; the Q values themselves live on different
//! scales and are not comparable.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod constants;
mod error;
mod pipeline;
mod result;
mod types;
mod warnings;

// Functional modules
pub mod connectivity;
pub mod graph;
pub mod layout;
pub mod output;
pub mod signal;

// Re-exports for public API
pub use config::{Config, GlassoConfig, ModularityConfig};
pub use connectivity::{full_correlation, partial_correlation, CorrelationEstimate};
pub use error::{PipelineError, Result};
pub use graph::{
    adjusted_rand_index, connected_components, detect_communities, detect_signed_communities,
    giant_component, threshold_by_density, CommunityAssignment, ComponentReport, Graph,
    ThresholdedGraph,
};
pub use layout::{order_by_network, NetworkOrdering};
pub use pipeline::ConnectivityPipeline;
pub use result::{ConnectivityResult, RunMetadata, VariantResult};
pub use signal::{
    aggregate_parcels, build_design, regress_confounds, ConfoundMatrix, LabelAssignment,
    ParcelSignal, RetainMask, ScrubReport, SignalMatrix,
};
pub use types::{ConfoundSet, Matrix, Vector};
pub use warnings::RunWarning;

/// Convenience function running the full pipeline with default
/// configuration.
///
/// Equivalent to `ConnectivityPipeline::new().run(...)`. Use the
/// builder for non-default thresholds, densities, or a fixed seed.
///
/// # Errors
///
/// Propagates any fatal [`PipelineError`] from the underlying stages.
pub fn analyze(
    signal: &SignalMatrix,
    confounds: &ConfoundMatrix,
    motion: &[f64],
    labels: &LabelAssignment,
) -> Result<ConnectivityResult> {
    ConnectivityPipeline::new().run(signal, confounds, motion, labels)
}
