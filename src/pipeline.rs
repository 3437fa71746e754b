//! Main `ConnectivityPipeline` entry point and builder.

use std::time::Instant;

use crate::config::Config;
use crate::connectivity::{full_correlation, partial_correlation};
use crate::error::{PipelineError, Result};
use crate::graph::{detect_communities, detect_signed_communities, giant_component, threshold_by_density};
use crate::result::{ConnectivityResult, RunMetadata, VariantResult};
use crate::signal::{
    aggregate_parcels, build_design, regress_confounds, ConfoundMatrix, LabelAssignment,
    RetainMask, SignalMatrix,
};
use crate::types::ConfoundSet;
use crate::warnings::RunWarning;

/// Main entry point for connectivity estimation.
///
/// Configure with the builder methods, then call
/// [`run`](ConnectivityPipeline::run) with the in-memory inputs. Each
/// run executes the full stage chain for both confound-set variants:
/// regression → parcel aggregation → scrubbing → full and partial
/// correlation → adjacency thresholding → community detection.
///
/// # Example
///
/// ```ignore
/// use fconn::{ConnectivityPipeline, LabelAssignment};
///
/// let result = ConnectivityPipeline::new()
///     .motion_threshold(0.5)
///     .scrub_window(2)
///     .edge_density(0.1)
///     .seed(42)
///     .run(&signal, &confounds, &motion, &labels)?;
///
/// println!(
///     "binary Q = {:.3} over {} communities",
///     result.without_global_signal.communities_binary.modularity(),
///     result.without_global_signal.communities_binary.communities(),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectivityPipeline {
    config: Config,
}

impl ConnectivityPipeline {
    /// Create with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Create from an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Motion-magnitude threshold for scrubbing.
    pub fn motion_threshold(mut self, threshold: f64) -> Self {
        self.config.motion_threshold = threshold;
        self
    }

    /// Trailing scrub window in timepoints.
    pub fn scrub_window(mut self, window: usize) -> Self {
        self.config.scrub_window = window;
        self
    }

    /// Floor on timepoints surviving the scrub.
    pub fn min_retained(mut self, floor: usize) -> Self {
        self.config.min_retained = floor;
        self
    }

    /// Confound columns that get appended backward-difference
    /// derivative columns before regression.
    pub fn derivative_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.derivative_columns = names.into_iter().map(Into::into).collect();
        self
    }

    /// Target edge density for adjacency thresholding.
    pub fn edge_density(mut self, density: f64) -> Self {
        self.config.edge_density = density;
        self
    }

    /// L1 penalty for the partial correlation estimator.
    pub fn glasso_penalty(mut self, penalty: f64) -> Self {
        self.config.glasso.penalty = penalty;
        self
    }

    /// Seed for the community-detection local search. Unseeded runs
    /// are nondeterministic across invocations.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.modularity.seed = Some(seed);
        self
    }

    /// The current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute the full pipeline.
    ///
    /// `signal` is the raw vertex-level time series, `confounds` the
    /// time-aligned nuisance matrix (no implicit intercept), `motion`
    /// the per-timepoint motion magnitude (e.g. framewise
    /// displacement), and `labels` the unit-to-region assignment.
    ///
    /// Both confound-set variants regress the *same* raw signal; the
    /// pipeline never chains one residualization onto another.
    ///
    /// # Errors
    ///
    /// Any fatal [`PipelineError`] from a stage aborts the run;
    /// non-fatal conditions are recorded on the result's metadata.
    pub fn run(
        &self,
        signal: &SignalMatrix,
        confounds: &ConfoundMatrix,
        motion: &[f64],
        labels: &LabelAssignment,
    ) -> Result<ConnectivityResult> {
        let started = Instant::now();
        let t = signal.timepoints();

        if confounds.timepoints() != t {
            return Err(PipelineError::shape(
                "pipeline inputs",
                (t, confounds.count()),
                (confounds.timepoints(), confounds.count()),
            ));
        }
        if motion.len() != t {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("motion series of length {t}"),
                actual: format!("motion series of length {}", motion.len()),
                context: "pipeline inputs",
            });
        }

        // Scrub mask from the motion series; the floor protects every
        // downstream estimate at once.
        let mask = RetainMask::from_motion(
            motion,
            self.config.motion_threshold,
            self.config.scrub_window,
        );
        mask.require_retained(self.config.min_retained.max(3), "scrub")?;

        // Derivative columns are shared by both variants.
        let derivative_names: Vec<&str> = self
            .config
            .derivative_columns
            .iter()
            .map(String::as_str)
            .collect();
        let base = if derivative_names.is_empty() {
            confounds.clone()
        } else {
            confounds.with_temporal_derivatives(&derivative_names)?
        };

        let mut warnings = Vec::new();
        let mut nan_coercions = 0;

        let with_global_signal = self.run_variant(
            signal,
            &base,
            ConfoundSet::WithGlobalSignal,
            &mask,
            labels,
            &mut warnings,
            &mut nan_coercions,
        )?;
        let without_global_signal = self.run_variant(
            signal,
            &base,
            ConfoundSet::WithoutGlobalSignal,
            &mask,
            labels,
            &mut warnings,
            &mut nan_coercions,
        )?;

        let scrub = mask.report();
        let metadata = RunMetadata {
            timepoints: t,
            units: signal.units(),
            confounds: confounds.count(),
            regions: labels.region_ids().len(),
            nan_coercions,
            warnings,
            elapsed_ms: started.elapsed().as_secs_f64() * 1e3,
        };

        Ok(ConnectivityResult {
            mask,
            scrub,
            with_global_signal,
            without_global_signal,
            metadata,
        })
    }

    /// One confound-set variant: regression through community
    /// detection.
    #[allow(clippy::too_many_arguments)]
    fn run_variant(
        &self,
        signal: &SignalMatrix,
        base: &ConfoundMatrix,
        set: ConfoundSet,
        mask: &RetainMask,
        labels: &LabelAssignment,
        warnings: &mut Vec<RunWarning>,
        nan_coercions: &mut usize,
    ) -> Result<VariantResult> {
        let design = build_design(base, set, signal)?;
        let residual = regress_confounds(signal, &design)?;

        let parcels = aggregate_parcels(&residual, labels)?;
        let parcels_scrubbed = parcels.apply_mask(mask)?;

        let full = full_correlation(&parcels_scrubbed)?;
        let partial = partial_correlation(&parcels_scrubbed, &self.config.glasso)?;
        *nan_coercions += full.nan_coercions() + partial.nan_coercions();
        if !full.excluded().is_empty() {
            warnings.push(RunWarning::DegenerateSignal {
                region_ids: full.excluded().to_vec(),
            });
        }

        let thresholded = threshold_by_density(&full, self.config.edge_density)?;
        if let Some(warning) = thresholded.density_warning() {
            warnings.push(warning);
        }

        let graph = thresholded.graph();
        let giant = giant_component(&graph);

        let communities_binary =
            detect_communities(thresholded.adjacency(), &self.config.modularity)?;
        let communities_signed =
            detect_signed_communities(full.matrix(), &self.config.modularity)?;

        Ok(VariantResult {
            confound_set: set,
            residual,
            parcels,
            parcels_scrubbed,
            full_correlation: full,
            partial_correlation: partial,
            thresholded,
            giant_component: giant,
            communities_binary,
            communities_signed,
        })
    }
}
