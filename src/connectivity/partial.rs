//! Partial correlation via sparse inverse covariance estimation.
//!
//! Direct (conditional-on-all-other-regions) association is read off
//! the precision matrix: ρ_ij = −Θ_ij / √(Θ_ii·Θ_jj). The precision is
//! estimated with a graphical lasso (block coordinate descent over
//! columns with an inner soft-threshold lasso solve), which keeps the
//! estimate well-conditioned when the region count approaches the
//! timepoint count.

use crate::config::GlassoConfig;
use crate::connectivity::{non_degenerate_columns, CorrelationEstimate};
use crate::error::{PipelineError, Result};
use crate::signal::ParcelSignal;
use crate::types::Matrix;

/// Inner lasso coordinate-descent tolerance.
const INNER_TOLERANCE: f64 = 1e-7;

/// Inner lasso coordinate-descent iteration cap.
const INNER_MAX_ITERATIONS: usize = 500;

/// Partial correlation between every pair of non-degenerate regions.
///
/// Zero-variance columns are excluded exactly as in
/// [`full_correlation`](crate::connectivity::full_correlation), so the
/// kept-id lists of the two estimators agree and external region tables
/// filtered by either stay aligned. The diagonal is forced to 0.
///
/// # Errors
///
/// [`PipelineError::InsufficientData`] when fewer than 2 non-degenerate
/// regions remain or when the retained timepoint count does not exceed
/// the region count (T > R is required for a stable estimate).
pub fn partial_correlation(
    parcels: &ParcelSignal,
    config: &GlassoConfig,
) -> Result<CorrelationEstimate> {
    let t = parcels.timepoints();
    let (kept_cols, kept_ids, excluded) = non_degenerate_columns(parcels);
    let k = kept_cols.len();

    if k < 2 {
        return Err(PipelineError::InsufficientData {
            retained: k,
            required: 2,
            stage: "partial correlation",
        });
    }
    if t <= k {
        return Err(PipelineError::InsufficientData {
            retained: t,
            required: k + 1,
            stage: "partial correlation",
        });
    }

    let empirical = empirical_correlation(parcels.data(), &kept_cols);
    let precision = if config.penalty > 0.0 {
        graphical_lasso(&empirical, config)
    } else {
        jittered_inverse(&empirical)
    };

    // Partial correlation from the precision matrix; diagonal zero.
    let mut matrix = Matrix::zeros(k, k);
    let mut nan_coercions = 0;
    for i in 0..k {
        for j in (i + 1)..k {
            let denom = (precision[(i, i)] * precision[(j, j)]).sqrt();
            let value = -precision[(i, j)] / denom;
            let value = if value.is_finite() {
                value
            } else {
                nan_coercions += 1;
                0.0
            };
            matrix[(i, j)] = value;
            matrix[(j, i)] = value;
        }
    }

    Ok(CorrelationEstimate::new(
        matrix,
        kept_ids,
        excluded,
        nan_coercions,
    ))
}

/// Empirical correlation matrix over the kept columns (unit diagonal).
fn empirical_correlation(data: &Matrix, kept_cols: &[usize]) -> Matrix {
    let t = data.nrows();
    let k = kept_cols.len();

    // Standardize each kept column to zero mean, unit norm.
    let mut standardized = Matrix::zeros(t, k);
    for (out_col, &col) in kept_cols.iter().enumerate() {
        let mean = data.column(col).sum() / t as f64;
        let mut norm = 0.0;
        for row in 0..t {
            let v = data[(row, col)] - mean;
            standardized[(row, out_col)] = v;
            norm += v * v;
        }
        let norm = norm.sqrt();
        for row in 0..t {
            standardized[(row, out_col)] /= norm;
        }
    }

    let mut corr = standardized.transpose() * standardized;
    // Clamp numerical drift; the diagonal is exactly 1 by construction.
    for i in 0..k {
        corr[(i, i)] = 1.0;
    }
    corr
}

/// Precision estimate by inverting a diagonally-jittered correlation
/// matrix. Used when the L1 penalty is zero.
fn jittered_inverse(corr: &Matrix) -> Matrix {
    let k = corr.nrows();
    let mut jitter = (corr.trace() / k as f64) * 1e-8;
    loop {
        let mut stabilized = corr.clone();
        for i in 0..k {
            stabilized[(i, i)] += jitter;
        }
        if let Some(chol) = stabilized.cholesky() {
            return chol.inverse();
        }
        // Grow until the diagonal dominates any negative eigenvalue.
        jitter *= 10.0;
    }
}

/// Graphical lasso: block coordinate descent on the covariance estimate
/// W with an inner lasso solve per column (Friedman, Hastie &
/// Tibshirani 2008). Returns the precision matrix.
fn graphical_lasso(corr: &Matrix, config: &GlassoConfig) -> Matrix {
    let p = corr.nrows();
    let rho = config.penalty;

    // W starts at the empirical matrix with the penalty on the diagonal.
    let mut w = corr.clone();
    for i in 0..p {
        w[(i, i)] += rho;
    }

    // Lasso coefficients per column, global row indexing, zero diagonal.
    let mut beta = Matrix::zeros(p, p);

    // Convergence threshold relative to the mean absolute off-diagonal.
    let mut offdiag_sum = 0.0;
    for i in 0..p {
        for j in 0..p {
            if i != j {
                offdiag_sum += corr[(i, j)].abs();
            }
        }
    }
    let offdiag_mean = if p > 1 {
        offdiag_sum / (p * (p - 1)) as f64
    } else {
        0.0
    };
    let threshold = config.tolerance * offdiag_mean.max(f64::MIN_POSITIVE);

    for _sweep in 0..config.max_sweeps {
        let mut max_change = 0.0_f64;

        for j in 0..p {
            // Global indices of the p-1 rows besides j.
            let others: Vec<usize> = (0..p).filter(|&i| i != j).collect();

            // Inner lasso on W11 · β ≈ s12 with soft thresholding,
            // warm-started from the previous sweep's coefficients.
            let mut b: Vec<f64> = others.iter().map(|&i| beta[(i, j)]).collect();
            for _iter in 0..INNER_MAX_ITERATIONS {
                let mut inner_change = 0.0_f64;
                for (kk, &gk) in others.iter().enumerate() {
                    let mut residual = corr[(gk, j)];
                    for (ll, &gl) in others.iter().enumerate() {
                        if ll != kk {
                            residual -= w[(gk, gl)] * b[ll];
                        }
                    }
                    let updated = soft_threshold(residual, rho) / w[(gk, gk)];
                    inner_change = inner_change.max((updated - b[kk]).abs());
                    b[kk] = updated;
                }
                if inner_change < INNER_TOLERANCE {
                    break;
                }
            }

            // w12 = W11 · β; write back into row/column j.
            for (kk, &gk) in others.iter().enumerate() {
                let mut value = 0.0;
                for (ll, &gl) in others.iter().enumerate() {
                    value += w[(gk, gl)] * b[ll];
                }
                max_change = max_change.max((value - w[(gk, j)]).abs());
                w[(gk, j)] = value;
                w[(j, gk)] = value;
                beta[(gk, j)] = b[kk];
            }
        }

        if max_change < threshold {
            break;
        }
    }

    // Recover the precision matrix from W and the lasso coefficients:
    // θ_jj = 1/(w_jj − w12ᵗβ), θ_ij = −β_ij·θ_jj.
    let mut precision = Matrix::zeros(p, p);
    for j in 0..p {
        let mut dot = 0.0;
        for i in 0..p {
            if i != j {
                dot += w[(i, j)] * beta[(i, j)];
            }
        }
        let theta_jj = 1.0 / (w[(j, j)] - dot);
        precision[(j, j)] = theta_jj;
        for i in 0..p {
            if i != j {
                precision[(i, j)] = -beta[(i, j)] * theta_jj;
            }
        }
    }

    // Exact symmetry for downstream consumers.
    (&precision + precision.transpose()) * 0.5
}

fn soft_threshold(value: f64, penalty: f64) -> f64 {
    if value > penalty {
        value - penalty
    } else if value < -penalty {
        value + penalty
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{aggregate_parcels, LabelAssignment, SignalMatrix};

    fn parcels_from(data: Matrix) -> ParcelSignal {
        let units = data.ncols();
        let signal = SignalMatrix::new(data).unwrap();
        let labels: Vec<u32> = (1..=units as u32).collect();
        aggregate_parcels(&signal, &LabelAssignment::new(labels)).unwrap()
    }

    /// A → B → C chain: A and C correlate marginally but are
    /// conditionally independent given B, so the A–C partial
    /// correlation should be much weaker than the A–B and B–C ones.
    fn chain_signal(t: usize) -> Matrix {
        // Incommensurate frequencies stand in for independent noise.
        Matrix::from_fn(t, 3, |r, c| {
            let x = r as f64;
            let a = (x * 0.7).sin();
            let b = a + (x * 1.3).cos();
            match c {
                0 => a,
                1 => b,
                _ => b + (x * 2.1 + 0.5).sin(),
            }
        })
    }

    #[test]
    fn chain_structure_recovered() {
        let parcels = parcels_from(chain_signal(200));
        let est = partial_correlation(&parcels, &GlassoConfig::default()).unwrap();

        let ab = est.matrix()[(0, 1)].abs();
        let bc = est.matrix()[(1, 2)].abs();
        let ac = est.matrix()[(0, 2)].abs();
        assert!(ab > ac, "A-B ({ab}) should dominate A-C ({ac})");
        assert!(bc > ac, "B-C ({bc}) should dominate A-C ({ac})");
    }

    #[test]
    fn symmetric_zero_diagonal() {
        let parcels = parcels_from(chain_signal(150));
        let est = partial_correlation(&parcels, &GlassoConfig::default()).unwrap();
        for i in 0..est.regions() {
            assert_eq!(est.matrix()[(i, i)], 0.0);
            for j in 0..est.regions() {
                let diff = (est.matrix()[(i, j)] - est.matrix()[(j, i)]).abs();
                assert!(diff < 1e-12);
            }
        }
    }

    #[test]
    fn zero_penalty_uses_plain_inverse() {
        let parcels = parcels_from(chain_signal(120));
        let config = GlassoConfig {
            penalty: 0.0,
            ..GlassoConfig::default()
        };
        let est = partial_correlation(&parcels, &config).unwrap();
        assert_eq!(est.regions(), 3);
        assert_eq!(est.nan_coercions(), 0);
    }

    #[test]
    fn requires_more_timepoints_than_regions() {
        let data = Matrix::from_fn(3, 4, |r, c| ((r * 3 + c * 7) % 13) as f64);
        let parcels = parcels_from(data);
        let err = partial_correlation(&parcels, &GlassoConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData { required: 5, .. }
        ));
    }

    #[test]
    fn exclusion_matches_full_path() {
        let data = Matrix::from_fn(50, 3, |r, c| match c {
            0 => (r as f64 * 0.3).sin(),
            1 => 7.0,
            _ => (r as f64 * 0.3).cos(),
        });
        let parcels = parcels_from(data);
        let partial = partial_correlation(&parcels, &GlassoConfig::default()).unwrap();
        let full = crate::connectivity::full_correlation(&parcels).unwrap();
        assert_eq!(partial.excluded(), full.excluded());
        assert_eq!(partial.region_ids(), full.region_ids());
    }
}
