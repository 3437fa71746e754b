//! Network-label reordering for downstream display.
//!
//! Given an external network label per node, produces an ordering that
//! groups same-label nodes contiguously plus the positions of the
//! boundaries between groups. This is the only layout-facing logic in
//! the crate; it lives here because its boundary bookkeeping is shared
//! with nothing else and the matrix-edge cases are easy to get wrong.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::types::Matrix;

/// A grouping permutation over nodes, by network label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkOrdering {
    order: Vec<usize>,
    boundaries: Vec<usize>,
    groups: Vec<(String, usize)>,
}

impl NetworkOrdering {
    /// The permutation: `order()[k]` is the original index of the node
    /// at display position `k`.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Positions where a new label group starts, in display
    /// coordinates. The leading 0 and the total length are omitted:
    /// a single-group ordering has no boundaries, `g` groups yield
    /// `g − 1` entries, and nothing ever points one past the matrix
    /// edge.
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    /// Group labels with their sizes, in display order.
    pub fn groups(&self) -> &[(String, usize)] {
        &self.groups
    }

    /// Number of nodes covered by the ordering.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the ordering covers zero nodes.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Reorder a square matrix by the permutation (rows and columns).
    ///
    /// # Errors
    ///
    /// [`PipelineError::ShapeMismatch`] when the matrix dimension
    /// differs from the ordering length.
    pub fn permute(&self, matrix: &Matrix) -> Result<Matrix> {
        self.check_dims(matrix)?;
        let n = self.len();
        Ok(Matrix::from_fn(n, n, |i, j| {
            matrix[(self.order[i], self.order[j])]
        }))
    }

    /// Undo [`permute`](Self::permute): scatter entries back to their
    /// original positions. `inverse_permute(permute(m)) == m` exactly.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ShapeMismatch`] when the matrix dimension
    /// differs from the ordering length.
    pub fn inverse_permute(&self, matrix: &Matrix) -> Result<Matrix> {
        self.check_dims(matrix)?;
        let n = self.len();
        let mut inverse = vec![0usize; n];
        for (position, &original) in self.order.iter().enumerate() {
            inverse[original] = position;
        }
        Ok(Matrix::from_fn(n, n, |i, j| {
            matrix[(inverse[i], inverse[j])]
        }))
    }

    fn check_dims(&self, matrix: &Matrix) -> Result<()> {
        let n = self.len();
        if matrix.nrows() != n || matrix.ncols() != n {
            return Err(PipelineError::shape(
                "network reordering",
                (n, n),
                (matrix.nrows(), matrix.ncols()),
            ));
        }
        Ok(())
    }
}

/// Build the grouping permutation for one network label per node.
///
/// Nodes are ordered by label (lexicographic) and, within a label, by
/// original index (a stable sort), so the relative order of same-label
/// nodes survives.
pub fn order_by_network(networks: &[String]) -> NetworkOrdering {
    let mut order: Vec<usize> = (0..networks.len()).collect();
    order.sort_by(|&a, &b| networks[a].cmp(&networks[b]).then(a.cmp(&b)));

    let mut boundaries = Vec::new();
    let mut groups: Vec<(String, usize)> = Vec::new();
    for (position, &node) in order.iter().enumerate() {
        let label = &networks[node];
        match groups.last_mut() {
            Some((current, size)) if *current == *label => *size += 1,
            _ => {
                if position > 0 {
                    boundaries.push(position);
                }
                groups.push((label.clone(), 1));
            }
        }
    }

    NetworkOrdering {
        order,
        boundaries,
        groups,
    }
}
