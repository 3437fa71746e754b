//! Motion-based timepoint censoring.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::types::Matrix;

/// Counts of retained vs. removed timepoints for a scrub.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScrubReport {
    /// Timepoints before censoring.
    pub total: usize,
    /// Timepoints kept.
    pub retained: usize,
    /// Timepoints censored.
    pub removed: usize,
}

/// Boolean keep-mask over timepoints, derived from a motion series.
///
/// A timepoint is censored when any timepoint from one before a
/// threshold violation through `window` after it (clipped to the valid
/// range) violates the threshold. The one-before lead-in covers
/// backward smearing introduced by interpolation and filtering in
/// upstream preprocessing.
///
/// Applying a mask selects matching rows in order; it never reorders,
/// interpolates, or mutates in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetainMask {
    mask: Vec<bool>,
}

impl RetainMask {
    /// Build a mask from a motion-magnitude series.
    ///
    /// Index t is `false` iff some t' in `[t−1, t+window]` (inclusive,
    /// clipped to `[0, len−1]`) has `motion[t'] > threshold`.
    pub fn from_motion(motion: &[f64], threshold: f64, window: usize) -> Self {
        let len = motion.len();
        let mut mask = vec![true; len];
        for (t, &value) in motion.iter().enumerate() {
            if value > threshold {
                let start = t.saturating_sub(1);
                let end = (t + window).min(len.saturating_sub(1));
                for slot in &mut mask[start..=end] {
                    *slot = false;
                }
            }
        }
        Self { mask }
    }

    /// A mask that keeps every one of `len` timepoints.
    pub fn keep_all(len: usize) -> Self {
        Self {
            mask: vec![true; len],
        }
    }

    /// Mask length (timepoint count).
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    /// Whether the mask covers zero timepoints.
    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Number of timepoints kept.
    pub fn retained(&self) -> usize {
        self.mask.iter().filter(|&&keep| keep).count()
    }

    /// The mask entries, one per timepoint; `true` = keep.
    pub fn as_slice(&self) -> &[bool] {
        &self.mask
    }

    /// Retained/removed counts.
    pub fn report(&self) -> ScrubReport {
        let retained = self.retained();
        ScrubReport {
            total: self.len(),
            retained,
            removed: self.len() - retained,
        }
    }

    /// Select the retained rows of a time-aligned matrix.
    ///
    /// Row order is preserved exactly; an all-`true` mask returns a
    /// value equal to the input.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ShapeMismatch`] when the matrix row count
    /// differs from the mask length.
    pub fn apply(&self, matrix: &Matrix) -> Result<Matrix> {
        if matrix.nrows() != self.len() {
            return Err(PipelineError::shape(
                "retain mask application",
                (self.len(), matrix.ncols()),
                (matrix.nrows(), matrix.ncols()),
            ));
        }
        let rows: Vec<usize> = self
            .mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        Ok(matrix.select_rows(rows.iter()))
    }

    /// Fail with [`PipelineError::InsufficientData`] when fewer than
    /// `required` timepoints survive.
    pub fn require_retained(&self, required: usize, stage: &'static str) -> Result<()> {
        let retained = self.retained();
        if retained < required {
            return Err(PipelineError::InsufficientData {
                retained,
                required,
                stage,
            });
        }
        Ok(())
    }
}
