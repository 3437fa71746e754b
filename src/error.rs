//! Fatal error taxonomy for the connectivity pipeline.
//!
//! Every fatal condition aborts the enclosing stage and carries enough
//! context (shapes, counts) to diagnose without re-running. Non-fatal
//! conditions are not errors; they are resolved locally and reported as
//! [`crate::warnings::RunWarning`] metadata.

use thiserror::Error;

/// Errors that abort a pipeline stage.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The confound design cannot support a least-squares solution:
    /// either there are at least as many confounds as timepoints, or the
    /// design matrix is rank-deficient.
    #[error(
        "degenerate regression: {confounds} confounds over {timepoints} timepoints (rank {rank})"
    )]
    DegenerateRegression {
        /// Number of confound columns in the design.
        confounds: usize,
        /// Number of timepoints in the design.
        timepoints: usize,
        /// Numerical rank of the design matrix.
        rank: usize,
    },

    /// Too few timepoints remain for reliable downstream estimation.
    #[error("insufficient data at {stage}: {retained} timepoints retained, {required} required")]
    InsufficientData {
        /// Timepoints available after the offending step.
        retained: usize,
        /// Minimum the stage needs.
        required: usize,
        /// Which stage refused to proceed.
        stage: &'static str,
    },

    /// A matrix-pair operation received incompatible dimensions, or a
    /// square-matrix operation received a non-square or non-symmetric
    /// input.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Description of the expected shape.
        expected: String,
        /// Description of the shape received.
        actual: String,
        /// The operation that rejected the input.
        context: &'static str,
    },

    /// A signal matrix contained non-finite entries at validated
    /// construction.
    #[error("signal contains {count} non-finite entries; resolve (zero-fill) before the pipeline")]
    NonFiniteSignal {
        /// Number of NaN/inf entries found.
        count: usize,
    },

    /// A confound column name was requested that the matrix does not
    /// carry, or a duplicate name was supplied at construction.
    #[error("unknown or duplicate confound column: {name}")]
    BadConfoundName {
        /// The offending column name.
        name: String,
    },

    /// A configuration value is outside its documented domain.
    #[error("invalid configuration: {what}")]
    InvalidConfig {
        /// Description of the violation.
        what: String,
    },
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Build a `ShapeMismatch` from two (rows, cols) pairs.
    pub(crate) fn shape(
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        PipelineError::ShapeMismatch {
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_counts() {
        let err = PipelineError::InsufficientData {
            retained: 4,
            required: 10,
            stage: "scrub",
        };
        let msg = err.to_string();
        assert!(msg.contains('4'));
        assert!(msg.contains("10"));
        assert!(msg.contains("scrub"));
    }

    #[test]
    fn shape_helper_formats_dims() {
        let err = PipelineError::shape("regression", (100, 8), (90, 8));
        assert!(err.to_string().contains("100x8"));
        assert!(err.to_string().contains("90x8"));
    }
}
