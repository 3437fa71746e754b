//! Validated signal and confound matrices.

use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::types::{Matrix, Vector};

/// A time-by-unit activity matrix.
///
/// Rows are timepoints in acquisition order, columns are units (vertices
/// before aggregation, regions after). Dimensions are fixed for the
/// lifetime of the value and every entry is finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalMatrix {
    data: Matrix,
}

impl SignalMatrix {
    /// Wrap a matrix, rejecting non-finite entries.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NonFiniteSignal`] with the offending
    /// entry count if any value is NaN or infinite.
    pub fn new(data: Matrix) -> Result<Self> {
        let count = data.iter().filter(|v| !v.is_finite()).count();
        if count > 0 {
            return Err(PipelineError::NonFiniteSignal { count });
        }
        Ok(Self { data })
    }

    /// Wrap a matrix, replacing non-finite entries with 0.0.
    ///
    /// Returns the wrapped matrix and the number of entries replaced,
    /// so the caller can record the fill as a
    /// [`crate::warnings::RunWarning::NonFiniteFilled`].
    pub fn zero_filled(mut data: Matrix) -> (Self, usize) {
        let mut count = 0;
        for v in data.iter_mut() {
            if !v.is_finite() {
                *v = 0.0;
                count += 1;
            }
        }
        (Self { data }, count)
    }

    /// Number of timepoints (rows).
    pub fn timepoints(&self) -> usize {
        self.data.nrows()
    }

    /// Number of units (columns).
    pub fn units(&self) -> usize {
        self.data.ncols()
    }

    /// Borrow the underlying matrix.
    pub fn data(&self) -> &Matrix {
        &self.data
    }

    /// Consume into the underlying matrix.
    pub fn into_inner(self) -> Matrix {
        self.data
    }

    /// Per-timepoint mean across all units (the global signal).
    pub fn global_signal(&self) -> Vector {
        let u = self.units() as f64;
        Vector::from_iterator(
            self.timepoints(),
            self.data.row_iter().map(|row| row.sum() / u),
        )
    }
}

/// A time-by-confound nuisance matrix with named columns.
///
/// Rows align one-to-one with a [`SignalMatrix`]. Column names are
/// unique; selection is a pure projection that never reorders rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfoundMatrix {
    data: Matrix,
    names: Vec<String>,
}

impl ConfoundMatrix {
    /// Build from a matrix and one name per column.
    ///
    /// # Errors
    ///
    /// [`PipelineError::BadConfoundName`] on duplicate names,
    /// [`PipelineError::ShapeMismatch`] when the name count differs from
    /// the column count.
    pub fn new(data: Matrix, names: Vec<String>) -> Result<Self> {
        if names.len() != data.ncols() {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{} column names", data.ncols()),
                actual: format!("{} column names", names.len()),
                context: "confound construction",
            });
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(PipelineError::BadConfoundName { name: name.clone() });
            }
        }
        Ok(Self { data, names })
    }

    /// Number of timepoints (rows).
    pub fn timepoints(&self) -> usize {
        self.data.nrows()
    }

    /// Number of confound columns.
    pub fn count(&self) -> usize {
        self.data.ncols()
    }

    /// Column names, in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Borrow the underlying matrix.
    pub fn data(&self) -> &Matrix {
        &self.data
    }

    /// Index of a named column.
    fn index_of(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| PipelineError::BadConfoundName {
                name: name.to_string(),
            })
    }

    /// A single named column as a vector.
    pub fn column(&self, name: &str) -> Result<Vector> {
        let idx = self.index_of(name)?;
        Ok(self.data.column(idx).into_owned())
    }

    /// Project onto a subset of named columns, preserving row order.
    pub fn select(&self, names: &[&str]) -> Result<ConfoundMatrix> {
        let mut cols = Vec::with_capacity(names.len());
        for name in names {
            cols.push(self.index_of(name)?);
        }
        let data = Matrix::from_fn(self.timepoints(), cols.len(), |r, c| {
            self.data[(r, cols[c])]
        });
        ConfoundMatrix::new(data, names.iter().map(|s| s.to_string()).collect())
    }

    /// Append, for each named source column, its first-order backward
    /// difference as a new column named `{name}_dt`.
    ///
    /// The first timepoint's derivative is defined as zero. Derivatives
    /// are computed from the column values at call time, so re-deriving
    /// after a selection always reflects the current source.
    pub fn with_temporal_derivatives(&self, names: &[&str]) -> Result<ConfoundMatrix> {
        let t = self.timepoints();
        let mut data = self.data.clone();
        let mut all_names = self.names.clone();

        for name in names {
            let idx = self.index_of(name)?;
            let src = self.data.column(idx);
            let mut deriv = Vector::zeros(t);
            for row in 1..t {
                deriv[row] = src[row] - src[row - 1];
            }
            let last = data.ncols();
            data = data.insert_column(last, 0.0);
            data.set_column(last, &deriv);
            all_names.push(format!("{name}_dt"));
        }
        ConfoundMatrix::new(data, all_names)
    }

    /// Append the per-timepoint mean across all signal units as a
    /// column named `global_signal`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ShapeMismatch`] when the signal's timepoint
    /// count differs from this matrix's.
    pub fn with_global_signal(&self, signal: &SignalMatrix) -> Result<ConfoundMatrix> {
        if signal.timepoints() != self.timepoints() {
            return Err(PipelineError::shape(
                "global signal append",
                (self.timepoints(), 1),
                (signal.timepoints(), 1),
            ));
        }
        let gs = signal.global_signal();
        let last = self.data.ncols();
        let mut data = self.data.clone().insert_column(last, 0.0);
        data.set_column(last, &gs);
        let mut names = self.names.clone();
        names.push("global_signal".to_string());
        ConfoundMatrix::new(data, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite() {
        let mut m = Matrix::zeros(4, 2);
        m[(2, 1)] = f64::NAN;
        let err = SignalMatrix::new(m).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NonFiniteSignal { count: 1 }
        ));
    }

    #[test]
    fn zero_fill_counts_replacements() {
        let mut m = Matrix::zeros(3, 3);
        m[(0, 0)] = f64::NAN;
        m[(1, 2)] = f64::INFINITY;
        let (signal, filled) = SignalMatrix::zero_filled(m);
        assert_eq!(filled, 2);
        assert_eq!(signal.data()[(0, 0)], 0.0);
        assert_eq!(signal.data()[(1, 2)], 0.0);
    }

    #[test]
    fn global_signal_is_row_mean() {
        let m = Matrix::from_row_slice(2, 2, &[1.0, 3.0, 5.0, 7.0]);
        let signal = SignalMatrix::new(m).unwrap();
        let gs = signal.global_signal();
        assert!((gs[0] - 2.0).abs() < 1e-12);
        assert!((gs[1] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_names_rejected() {
        let m = Matrix::zeros(4, 2);
        let err = ConfoundMatrix::new(m, vec!["fd".into(), "fd".into()]).unwrap_err();
        assert!(matches!(err, PipelineError::BadConfoundName { .. }));
    }

    #[test]
    fn select_projects_columns_in_request_order() {
        let m = Matrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let conf =
            ConfoundMatrix::new(m, vec!["a".into(), "b".into(), "c".into()]).unwrap();
        let sub = conf.select(&["c", "a"]).unwrap();
        assert_eq!(sub.names(), &["c".to_string(), "a".to_string()]);
        assert_eq!(sub.data()[(0, 0)], 3.0);
        assert_eq!(sub.data()[(1, 1)], 4.0);
    }

    #[test]
    fn derivative_first_row_is_zero() {
        let m = Matrix::from_row_slice(3, 1, &[1.0, 4.0, 9.0]);
        let conf = ConfoundMatrix::new(m, vec!["fd".into()]).unwrap();
        let with_dt = conf.with_temporal_derivatives(&["fd"]).unwrap();
        let dt = with_dt.column("fd_dt").unwrap();
        assert_eq!(dt[0], 0.0);
        assert!((dt[1] - 3.0).abs() < 1e-12);
        assert!((dt[2] - 5.0).abs() < 1e-12);
    }
}
