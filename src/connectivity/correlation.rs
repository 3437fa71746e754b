//! Full (Pearson) correlation estimation.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::signal::ParcelSignal;
use crate::types::Matrix;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Variance below which a region column counts as degenerate.
const VARIANCE_FLOOR: f64 = 1e-12;

/// A pairwise dependence estimate over non-degenerate regions.
///
/// The matrix is square and symmetric with a zero diagonal. Row/column
/// k corresponds to `region_ids()[k]`; regions excluded as degenerate
/// are listed separately so external tables can be filtered to match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationEstimate {
    matrix: Matrix,
    region_ids: Vec<u32>,
    excluded: Vec<u32>,
    nan_coercions: usize,
}

impl CorrelationEstimate {
    pub(crate) fn new(
        matrix: Matrix,
        region_ids: Vec<u32>,
        excluded: Vec<u32>,
        nan_coercions: usize,
    ) -> Self {
        Self {
            matrix,
            region_ids,
            excluded,
            nan_coercions,
        }
    }

    /// The R×R dependence matrix (symmetric, zero diagonal).
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Region id behind each row/column.
    pub fn region_ids(&self) -> &[u32] {
        &self.region_ids
    }

    /// Region ids excluded as degenerate (zero variance).
    pub fn excluded(&self) -> &[u32] {
        &self.excluded
    }

    /// Number of NaN entries coerced to zero.
    pub fn nan_coercions(&self) -> usize {
        self.nan_coercions
    }

    /// Number of regions in the estimate.
    pub fn regions(&self) -> usize {
        self.matrix.nrows()
    }

    /// Project an external per-region table onto the kept regions, in
    /// this estimate's row/column order.
    ///
    /// Excluded regions are dropped from the view, so indices into the
    /// returned vector align exactly with the matrix. A region id
    /// missing from the table yields `None` at its position.
    pub fn align_table<'a, T>(
        &self,
        table: &'a std::collections::HashMap<u32, T>,
    ) -> Vec<Option<&'a T>> {
        self.region_ids.iter().map(|id| table.get(id)).collect()
    }
}

/// Centered column and its standard deviation, precomputed per region.
struct ColumnStats {
    centered: Vec<f64>,
    norm: f64,
}

fn column_stats(data: &Matrix, col: usize) -> ColumnStats {
    let t = data.nrows();
    let mean = data.column(col).sum() / t as f64;
    let centered: Vec<f64> = (0..t).map(|row| data[(row, col)] - mean).collect();
    let norm = centered.iter().map(|v| v * v).sum::<f64>().sqrt();
    ColumnStats { centered, norm }
}

/// Population variance of a column.
fn column_variance(data: &Matrix, col: usize) -> f64 {
    let t = data.nrows();
    let mean = data.column(col).sum() / t as f64;
    data.column(col)
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        / t as f64
}

/// Split the parcel columns into kept and degenerate sets.
///
/// A column is degenerate when it was flagged by the aggregator (no
/// member units) or its variance is numerically zero. Returns the kept
/// column indices, the kept region ids, and the excluded region ids.
pub(crate) fn non_degenerate_columns(
    parcels: &ParcelSignal,
) -> (Vec<usize>, Vec<u32>, Vec<u32>) {
    let mut kept_cols = Vec::new();
    let mut kept_ids = Vec::new();
    let mut excluded = Vec::new();
    for col in 0..parcels.regions() {
        let flagged = parcels.degenerate().contains(&col);
        if flagged || column_variance(parcels.data(), col) < VARIANCE_FLOOR {
            excluded.push(parcels.region_ids()[col]);
        } else {
            kept_cols.push(col);
            kept_ids.push(parcels.region_ids()[col]);
        }
    }
    (kept_cols, kept_ids, excluded)
}

/// Pearson correlation between every pair of non-degenerate regions.
///
/// Degenerate (zero-variance) columns are excluded before estimation
/// and their ids recorded on the result. The diagonal is forced to 0,
/// since self-correlation carries no information for graph construction, and
/// any NaN from residual numerical edge cases is coerced to 0 with the
/// coercion count kept observable.
///
/// # Errors
///
/// [`PipelineError::InsufficientData`] with fewer than 3 timepoints or
/// fewer than 2 non-degenerate regions.
pub fn full_correlation(parcels: &ParcelSignal) -> Result<CorrelationEstimate> {
    let t = parcels.timepoints();
    if t < 3 {
        return Err(PipelineError::InsufficientData {
            retained: t,
            required: 3,
            stage: "full correlation",
        });
    }

    let (kept_cols, kept_ids, excluded) = non_degenerate_columns(parcels);
    let k = kept_cols.len();
    if k < 2 {
        return Err(PipelineError::InsufficientData {
            retained: k,
            required: 2,
            stage: "full correlation",
        });
    }

    let stats: Vec<ColumnStats> = kept_cols
        .iter()
        .map(|&col| column_stats(parcels.data(), col))
        .collect();

    // Upper-triangular pair products; symmetric fill below.
    let pairs: Vec<(usize, usize)> = (0..k)
        .flat_map(|i| ((i + 1)..k).map(move |j| (i, j)))
        .collect();

    let correlate = |&(i, j): &(usize, usize)| -> f64 {
        let a = &stats[i];
        let b = &stats[j];
        let dot: f64 = a
            .centered
            .iter()
            .zip(b.centered.iter())
            .map(|(x, y)| x * y)
            .sum();
        dot / (a.norm * b.norm)
    };

    #[cfg(feature = "parallel")]
    let values: Vec<f64> = pairs.par_iter().map(correlate).collect();

    #[cfg(not(feature = "parallel"))]
    let values: Vec<f64> = pairs.iter().map(correlate).collect();

    let mut matrix = Matrix::zeros(k, k);
    let mut nan_coercions = 0;
    for (&(i, j), &value) in pairs.iter().zip(values.iter()) {
        let value = if value.is_finite() {
            value
        } else {
            nan_coercions += 1;
            0.0
        };
        matrix[(i, j)] = value;
        matrix[(j, i)] = value;
    }

    Ok(CorrelationEstimate::new(
        matrix,
        kept_ids,
        excluded,
        nan_coercions,
    ))
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

    #[test]
    fn perfect_correlation_and_anticorrelation() {
        let data = Matrix::from_fn(8, 3, |r, c| {
            let x = r as f64;
            match c {
                0 => x,
                1 => 2.0 * x + 1.0,
                _ => -x,
            }
        });
        let est = full_correlation(&parcels_from(data)).unwrap();
        assert!((est.matrix()[(0, 1)] - 1.0).abs() < 1e-10);
        assert!((est.matrix()[(0, 2)] + 1.0).abs() < 1e-10);
        assert_eq!(est.nan_coercions(), 0);
    }

    #[test]
    fn symmetric_with_zero_diagonal() {
        let data = Matrix::from_fn(12, 4, |r, c| ((r * 5 + c * 3) % 11) as f64);
        let est = full_correlation(&parcels_from(data)).unwrap();
        for i in 0..est.regions() {
            assert_eq!(est.matrix()[(i, i)], 0.0);
            for j in 0..est.regions() {
                let diff = (est.matrix()[(i, j)] - est.matrix()[(j, i)]).abs();
                assert!(diff < 1e-12);
            }
        }
    }

    #[test]
    fn constant_region_excluded() {
        let data = Matrix::from_fn(10, 3, |r, c| match c {
            0 => r as f64,
            1 => 4.2,
            _ => (r as f64).powi(2),
        });
        let est = full_correlation(&parcels_from(data)).unwrap();
        assert_eq!(est.regions(), 2);
        assert_eq!(est.excluded(), &[2]);
        assert_eq!(est.region_ids(), &[1, 3]);
    }

    #[test]
    fn external_table_aligns_with_kept_regions() {
        use std::collections::HashMap;

        let data = Matrix::from_fn(10, 3, |r, c| match c {
            0 => r as f64,
            1 => 4.2,
            _ => (r as f64).powi(2),
        });
        let est = full_correlation(&parcels_from(data)).unwrap();

        let mut table = HashMap::new();
        table.insert(1, "precuneus".to_string());
        table.insert(2, "insula".to_string());
        table.insert(3, "amygdala".to_string());

        // Region 2 is constant and excluded; the aligned view skips it.
        let aligned = est.align_table(&table);
        assert_eq!(aligned.len(), est.regions());
        assert_eq!(aligned[0], Some(&"precuneus".to_string()));
        assert_eq!(aligned[1], Some(&"amygdala".to_string()));
    }

    #[test]
    fn too_few_regions_rejected() {
        let data = Matrix::from_fn(10, 2, |r, c| if c == 0 { r as f64 } else { 1.0 });
        let err = full_correlation(&parcels_from(data)).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { .. }));
    }

    #[test]
    fn too_few_timepoints_rejected() {
        let data = Matrix::from_fn(2, 3, |r, c| (r + c) as f64);
        let err = full_correlation(&parcels_from(data)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData { required: 3, .. }
        ));
    }
}
