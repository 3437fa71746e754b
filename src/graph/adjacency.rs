//! Percentile-based adjacency thresholding.

use serde::{Deserialize, Serialize};

use crate::connectivity::CorrelationEstimate;
use crate::error::{PipelineError, Result};
use crate::graph::Graph;
use crate::types::Matrix;
use crate::warnings::RunWarning;

/// A binary adjacency matrix at a fixed target edge density.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdedGraph {
    adjacency: Matrix,
    cutoff: f64,
    requested_density: f64,
    realized_density: f64,
}

impl ThresholdedGraph {
    /// The 0/1 adjacency matrix (symmetric, zero diagonal).
    pub fn adjacency(&self) -> &Matrix {
        &self.adjacency
    }

    /// The correlation value at the percentile cutoff.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Density the caller asked for.
    pub fn requested_density(&self) -> f64 {
        self.requested_density
    }

    /// Fraction of off-diagonal entries actually set. Ties at the
    /// cutoff are excluded by the strict-inequality policy, so this
    /// never exceeds the request.
    pub fn realized_density(&self) -> f64 {
        self.realized_density
    }

    /// The undirected graph over all region indices, isolated nodes
    /// included.
    pub fn graph(&self) -> Graph {
        // Adjacency is symmetric with zero diagonal by construction.
        Graph::from_adjacency(&self.adjacency)
            .expect("thresholded adjacency is square and symmetric")
    }

    /// Warning to record when the request was not exactly achievable.
    pub fn density_warning(&self) -> Option<RunWarning> {
        // Exact achievement of d among C(n,2) pairs is the common case
        // only when d*C(n,2) is integral and cutoff ties are absent.
        if self.realized_density + f64::EPSILON < self.requested_density {
            Some(RunWarning::PercentileUnachievable {
                requested: self.requested_density,
                realized: self.realized_density,
            })
        } else {
            None
        }
    }
}

/// Threshold a correlation matrix into a fixed-density adjacency.
///
/// The cutoff is the value at the `(100 − 100·density)`-th percentile
/// of the strictly-upper-triangular entries, rounded down to the
/// nearest selectable rank; an edge is kept iff its correlation is
/// strictly greater than the cutoff. Ties at the cutoff are excluded,
/// which means the realized density can fall slightly below the
/// request; the shortfall is reported, never silently absorbed.
///
/// # Errors
///
/// * [`PipelineError::InvalidConfig`] when `density` is outside (0, 1].
/// * [`PipelineError::InsufficientData`] when the estimate has fewer
///   than 2 regions (no off-diagonal entries to rank).
pub fn threshold_by_density(
    estimate: &CorrelationEstimate,
    density: f64,
) -> Result<ThresholdedGraph> {
    if !(density > 0.0 && density <= 1.0) {
        return Err(PipelineError::InvalidConfig {
            what: format!("edge density must be in (0, 1], got {density}"),
        });
    }
    let matrix = estimate.matrix();
    let r = matrix.nrows();
    if r < 2 {
        return Err(PipelineError::InsufficientData {
            retained: r,
            required: 2,
            stage: "adjacency thresholding",
        });
    }

    // Rank the strictly-upper-triangular entries.
    let mut values = Vec::with_capacity(r * (r - 1) / 2);
    for i in 0..r {
        for j in (i + 1)..r {
            values.push(matrix[(i, j)]);
        }
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let cutoff = density_cutoff(&values, density);

    let mut adjacency = Matrix::zeros(r, r);
    let mut kept = 0usize;
    for i in 0..r {
        for j in (i + 1)..r {
            if matrix[(i, j)] > cutoff {
                adjacency[(i, j)] = 1.0;
                adjacency[(j, i)] = 1.0;
                kept += 1;
            }
        }
    }

    Ok(ThresholdedGraph {
        adjacency,
        cutoff,
        requested_density: density,
        realized_density: kept as f64 / values.len() as f64,
    })
}

/// Percentile cutoff for a target density over pre-sorted values.
///
/// Selectable densities are k/P for k edges out of P ranked pairs; the
/// request rounds down to the nearest selectable value, and the cutoff
/// is the order statistic below which at most k entries remain strictly
/// greater. Rounding down (never to the nearest) is what keeps the
/// realized density from ever overshooting the request.
fn density_cutoff(sorted: &[f64], density: f64) -> f64 {
    let n = sorted.len();
    // Small epsilon absorbs representation error in density * n
    // (e.g. 0.3 * 10 falling just below 3.0).
    let k = (density * n as f64 + 1e-9).floor() as usize;
    if k >= n {
        return f64::NEG_INFINITY;
    }
    sorted[n - k - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate_from(matrix: Matrix) -> CorrelationEstimate {
        let ids: Vec<u32> = (1..=matrix.nrows() as u32).collect();
        CorrelationEstimate::new(matrix, ids, vec![], 0)
    }

    fn ramp_correlations(r: usize) -> Matrix {
        // Distinct off-diagonal values, no ties.
        let mut m = Matrix::zeros(r, r);
        let mut v = 0.0;
        for i in 0..r {
            for j in (i + 1)..r {
                v += 0.01;
                m[(i, j)] = v;
                m[(j, i)] = v;
            }
        }
        m
    }

    #[test]
    fn realized_never_exceeds_requested() {
        let est = estimate_from(ramp_correlations(10));
        for &density in &[0.05, 0.1, 0.25, 0.5, 0.9, 1.0] {
            let thresholded = threshold_by_density(&est, density).unwrap();
            assert!(
                thresholded.realized_density() <= density + 1e-12,
                "density {density} overshot: {}",
                thresholded.realized_density()
            );
        }
    }

    #[test]
    fn diagonal_always_zero() {
        let est = estimate_from(ramp_correlations(6));
        let thresholded = threshold_by_density(&est, 0.3).unwrap();
        for i in 0..6 {
            assert_eq!(thresholded.adjacency()[(i, i)], 0.0);
        }
    }

    #[test]
    fn ties_fall_below_request_and_warn() {
        // All off-diagonal values equal: cutoff ties everywhere, strict
        // inequality keeps nothing.
        let mut m = Matrix::from_element(5, 5, 0.7);
        for i in 0..5 {
            m[(i, i)] = 0.0;
        }
        let est = estimate_from(m);
        let thresholded = threshold_by_density(&est, 0.5).unwrap();
        assert_eq!(thresholded.realized_density(), 0.0);
        assert!(matches!(
            thresholded.density_warning(),
            Some(RunWarning::PercentileUnachievable { .. })
        ));
    }

    #[test]
    fn no_warning_when_exact() {
        // 10 pairs, density 0.3 keeps exactly the top 3 distinct values.
        let est = estimate_from(ramp_correlations(5));
        let thresholded = threshold_by_density(&est, 0.3).unwrap();
        assert!((thresholded.realized_density() - 0.3).abs() < 1e-12);
        assert!(thresholded.density_warning().is_none());
    }

    #[test]
    fn bad_density_rejected() {
        let est = estimate_from(ramp_correlations(4));
        assert!(threshold_by_density(&est, 0.0).is_err());
        assert!(threshold_by_density(&est, 1.5).is_err());
    }

    #[test]
    fn full_density_keeps_every_edge() {
        let est = estimate_from(ramp_correlations(5));
        let thresholded = threshold_by_density(&est, 1.0).unwrap();
        assert!((thresholded.realized_density() - 1.0).abs() < 1e-12);
        assert!(thresholded.density_warning().is_none());
    }
}
