//! Ordinary least-squares confound regression.

use crate::constants::RANK_TOLERANCE;
use crate::error::{PipelineError, Result};
use crate::signal::{ConfoundMatrix, SignalMatrix};
use crate::types::ConfoundSet;

/// Assemble the design matrix for a named confound-set variant.
///
/// `WithoutGlobalSignal` uses the confound columns as given;
/// `WithGlobalSignal` appends the per-timepoint mean across all signal
/// units. No intercept is added implicitly; a constant or cosine-basis
/// drift column must already be part of the confound set if baseline
/// removal is wanted.
pub fn build_design(
    confounds: &ConfoundMatrix,
    set: ConfoundSet,
    signal: &SignalMatrix,
) -> Result<ConfoundMatrix> {
    match set {
        ConfoundSet::WithoutGlobalSignal => Ok(confounds.clone()),
        ConfoundSet::WithGlobalSignal => confounds.with_global_signal(signal),
    }
}

/// Remove nuisance variance from a signal matrix.
///
/// Computes the residual R = S − X·β where β is the least-squares
/// solution of X·β ≈ S over all signal columns at once, via singular
/// value decomposition. Regression is always against the raw signal;
/// chaining residualizations reintroduces artifact and is not supported
/// by this API.
///
/// # Errors
///
/// * [`PipelineError::ShapeMismatch`] when signal and design disagree on
///   the timepoint count.
/// * [`PipelineError::DegenerateRegression`] when the confound count
///   reaches the timepoint count or the design is numerically
///   rank-deficient. The residual is never silently inf/NaN.
pub fn regress_confounds(
    signal: &SignalMatrix,
    design: &ConfoundMatrix,
) -> Result<SignalMatrix> {
    let t = signal.timepoints();
    let c = design.count();

    if design.timepoints() != t {
        return Err(PipelineError::shape(
            "confound regression",
            (t, c),
            (design.timepoints(), c),
        ));
    }
    if c == 0 {
        return Err(PipelineError::InvalidConfig {
            what: "confound design has no columns".to_string(),
        });
    }

    let x = design.data().clone();
    let svd = x.svd(true, true);

    // Rank from singular values against a relative cutoff.
    let max_sv = svd
        .singular_values
        .iter()
        .cloned()
        .fold(0.0_f64, f64::max);
    let eps = max_sv * RANK_TOLERANCE;
    let rank = svd
        .singular_values
        .iter()
        .filter(|&&sv| sv > eps)
        .count();

    if c >= t || rank < c {
        return Err(PipelineError::DegenerateRegression {
            confounds: c,
            timepoints: t,
            rank,
        });
    }

    let beta = svd
        .solve(signal.data(), eps)
        .map_err(|_| PipelineError::DegenerateRegression {
            confounds: c,
            timepoints: t,
            rank,
        })?;

    let residual = signal.data() - design.data() * beta;

    // Validated construction guards against non-finite residuals.
    SignalMatrix::new(residual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Matrix;

    fn toy_signal(t: usize, u: usize) -> SignalMatrix {
        // Deterministic, full-variance synthetic signal.
        let data = Matrix::from_fn(t, u, |r, c| {
            ((r * 7 + c * 13) % 17) as f64 + 0.25 * ((r + 1) * (c + 2)) as f64
        });
        SignalMatrix::new(data).unwrap()
    }

    fn toy_confounds(t: usize) -> ConfoundMatrix {
        let data = Matrix::from_fn(t, 2, |r, c| {
            if c == 0 {
                (r as f64 * 0.37).sin()
            } else {
                r as f64 / t as f64
            }
        });
        ConfoundMatrix::new(data, vec!["motion".into(), "drift".into()]).unwrap()
    }

    #[test]
    fn residual_is_orthogonal_to_design() {
        let signal = toy_signal(40, 5);
        let design = toy_confounds(40);
        let residual = regress_confounds(&signal, &design).unwrap();

        let xtr = design.data().transpose() * residual.data();
        let scale = design.data().amax() * signal.data().amax();
        for v in xtr.iter() {
            assert!(
                v.abs() / scale < 1e-8,
                "residual not orthogonal to design: {v}"
            );
        }
    }

    #[test]
    fn too_many_confounds_rejected() {
        let signal = toy_signal(4, 3);
        let data = Matrix::from_fn(4, 4, |r, c| ((r + 1) * (c + 3)) as f64 % 5.0);
        let names = (0..4).map(|i| format!("c{i}")).collect();
        let design = ConfoundMatrix::new(data, names).unwrap();
        let err = regress_confounds(&signal, &design).unwrap_err();
        assert!(matches!(err, PipelineError::DegenerateRegression { .. }));
    }

    #[test]
    fn rank_deficient_design_rejected() {
        let signal = toy_signal(20, 3);
        // Second column is an exact multiple of the first.
        let base = Matrix::from_fn(20, 1, |r, _| (r as f64 * 0.11).cos());
        let mut data = Matrix::zeros(20, 2);
        data.set_column(0, &base.column(0).into_owned());
        data.set_column(1, &(base.column(0).into_owned() * 2.0));
        let design =
            ConfoundMatrix::new(data, vec!["a".into(), "a2".into()]).unwrap();
        let err = regress_confounds(&signal, &design).unwrap_err();
        match err {
            PipelineError::DegenerateRegression { rank, confounds, .. } => {
                assert!(rank < confounds);
            }
            other => panic!("expected degenerate regression, got {other:?}"),
        }
    }

    #[test]
    fn gsr_design_carries_global_column() {
        let signal = toy_signal(30, 4);
        let confounds = toy_confounds(30);
        let design =
            build_design(&confounds, ConfoundSet::WithGlobalSignal, &signal).unwrap();
        assert_eq!(design.count(), confounds.count() + 1);
        assert!(design.names().iter().any(|n| n == "global_signal"));

        let plain =
            build_design(&confounds, ConfoundSet::WithoutGlobalSignal, &signal).unwrap();
        assert_eq!(plain.count(), confounds.count());
    }
}
