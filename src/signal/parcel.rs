//! Parcel-level signal aggregation.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::signal::{RetainMask, SignalMatrix};
use crate::types::Matrix;

/// Unit-to-region assignment.
///
/// One region id per unit; id 0 is reserved for unassigned/background
/// units and is excluded from aggregated outputs. Ids need not be
/// contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelAssignment {
    labels: Vec<u32>,
    universe: Option<Vec<u32>>,
}

impl LabelAssignment {
    /// Assignment whose region universe is exactly the distinct nonzero
    /// ids observed in `labels`.
    pub fn new(labels: Vec<u32>) -> Self {
        Self {
            labels,
            universe: None,
        }
    }

    /// Assignment with an explicitly declared region universe.
    ///
    /// Ids in `universe` that no unit carries still produce an output
    /// column (all zeros, flagged degenerate), which keeps downstream
    /// row/column indices aligned with external region tables. Units
    /// labeled with an id outside the universe are ignored by the
    /// aggregator.
    pub fn with_universe(labels: Vec<u32>, universe: Vec<u32>) -> Self {
        Self {
            labels,
            universe: Some(universe),
        }
    }

    /// Number of units covered by the assignment.
    pub fn units(&self) -> usize {
        self.labels.len()
    }

    /// Per-unit region ids.
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Distinct nonzero region ids in ascending order.
    ///
    /// With a declared universe, that universe (sorted, deduplicated,
    /// zero removed); otherwise the ids observed in the labels.
    pub fn region_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = match &self.universe {
            Some(universe) => universe.clone(),
            None => self.labels.clone(),
        };
        ids.retain(|&id| id != 0);
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Per-region aggregated time series.
///
/// Columns are ordered by ascending region id; `region_ids` records the
/// id behind each column so exclusions downstream keep indices aligned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelSignal {
    data: Matrix,
    region_ids: Vec<u32>,
    degenerate: Vec<usize>,
}

impl ParcelSignal {
    /// Number of timepoints (rows).
    pub fn timepoints(&self) -> usize {
        self.data.nrows()
    }

    /// Number of regions (columns).
    pub fn regions(&self) -> usize {
        self.data.ncols()
    }

    /// Borrow the region-by-time matrix (timepoints × regions).
    pub fn data(&self) -> &Matrix {
        &self.data
    }

    /// Region id behind each column, ascending.
    pub fn region_ids(&self) -> &[u32] {
        &self.region_ids
    }

    /// Column indices flagged degenerate (no member units).
    pub fn degenerate(&self) -> &[usize] {
        &self.degenerate
    }

    /// Column index of a region id, if present.
    pub fn column_of(&self, region_id: u32) -> Option<usize> {
        self.region_ids.iter().position(|&id| id == region_id)
    }

    /// Censor timepoints, keeping region metadata.
    pub fn apply_mask(&self, mask: &RetainMask) -> Result<ParcelSignal> {
        Ok(ParcelSignal {
            data: mask.apply(&self.data)?,
            region_ids: self.region_ids.clone(),
            degenerate: self.degenerate.clone(),
        })
    }
}

/// Collapse per-unit signal into per-region means.
///
/// Each output entry is the arithmetic mean, over all units assigned to
/// that region, of the signal at that timepoint. Region id 0 is
/// excluded. Regions declared in the universe but carrying no units
/// yield an all-zero column flagged degenerate; correlation estimation
/// excludes those columns rather than correlating them.
///
/// # Errors
///
/// [`PipelineError::ShapeMismatch`] when the label count differs from
/// the signal's unit count.
pub fn aggregate_parcels(
    signal: &SignalMatrix,
    assignment: &LabelAssignment,
) -> Result<ParcelSignal> {
    let t = signal.timepoints();
    let u = signal.units();
    if assignment.units() != u {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{u} unit labels"),
            actual: format!("{} unit labels", assignment.units()),
            context: "parcel aggregation",
        });
    }

    let region_ids = assignment.region_ids();
    let r = region_ids.len();

    // Member units per output column.
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); r];
    for (unit, &label) in assignment.labels().iter().enumerate() {
        if label == 0 {
            continue;
        }
        if let Ok(col) = region_ids.binary_search(&label) {
            members[col].push(unit);
        }
    }

    let mut data = Matrix::zeros(t, r);
    let mut degenerate = Vec::new();
    for (col, units) in members.iter().enumerate() {
        if units.is_empty() {
            degenerate.push(col);
            continue;
        }
        let n = units.len() as f64;
        for row in 0..t {
            let sum: f64 = units.iter().map(|&unit| signal.data()[(row, unit)]).sum();
            data[(row, col)] = sum / n;
        }
    }

    Ok(ParcelSignal {
        data,
        region_ids,
        degenerate,
    })
}
