//! Non-fatal conditions resolved locally and reported as metadata.

use serde::{Deserialize, Serialize};

/// Warning raised during a pipeline run.
///
/// Warnings never abort a stage; each is handled by a documented policy
/// (exclusion, strict-inequality cutoff) and recorded on the run
/// metadata for the caller to inspect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunWarning {
    /// One or more regions had zero variance and were excluded from
    /// correlation estimation.
    DegenerateSignal {
        /// Region ids excluded from the estimate.
        region_ids: Vec<u32>,
    },

    /// The requested edge density could not be achieved exactly because
    /// of ties at the percentile cutoff; the strict-inequality policy
    /// produced the nearest achievable density below the request.
    PercentileUnachievable {
        /// Density the caller asked for.
        requested: f64,
        /// Density actually realized.
        realized: f64,
    },

    /// Non-finite entries were zero-filled at signal construction.
    NonFiniteFilled {
        /// Number of entries replaced with 0.0.
        count: usize,
    },
}

impl RunWarning {
    /// Whether this warning indicates results should be treated with
    /// suspicion rather than routine bookkeeping.
    pub fn is_critical(&self) -> bool {
        match self {
            RunWarning::DegenerateSignal { region_ids } => !region_ids.is_empty(),
            RunWarning::PercentileUnachievable { .. } => false,
            RunWarning::NonFiniteFilled { count } => *count > 0,
        }
    }

    /// Human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            RunWarning::DegenerateSignal { region_ids } => {
                format!(
                    "{} zero-variance region(s) excluded from correlation: {:?}",
                    region_ids.len(),
                    region_ids
                )
            }
            RunWarning::PercentileUnachievable { requested, realized } => {
                format!(
                    "requested edge density {:.4} not exactly achievable; realized {:.4} \
                     (ties at the cutoff are excluded)",
                    requested, realized
                )
            }
            RunWarning::NonFiniteFilled { count } => {
                format!("{} non-finite signal entries were zero-filled", count)
            }
        }
    }
}
