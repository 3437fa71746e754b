//! Graph construction and graph-theoretic analysis.
//!
//! A correlation matrix becomes a fixed-density binary adjacency via a
//! percentile cutoff, then an undirected [`Graph`] over all region
//! indices (isolated nodes included). Community structure is extracted
//! by modularity maximization in binary and signed/weighted variants.

mod adjacency;
mod component;
mod modularity;

pub use adjacency::{threshold_by_density, ThresholdedGraph};
pub use component::{connected_components, giant_component, ComponentReport};
pub use modularity::{
    adjusted_rand_index, detect_communities, detect_signed_communities, CommunityAssignment,
};

use serde::{Deserialize, Serialize};

use crate::constants::SYMMETRY_TOLERANCE;
use crate::error::{PipelineError, Result};
use crate::types::Matrix;

/// An undirected graph over region indices.
///
/// Stored as a symmetric weight matrix with a zero diagonal; a binary
/// graph simply carries 0/1 weights. Constructed once per adjacency or
/// weight matrix and never mutated; component extraction produces
/// derived node lists that own their data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    weights: Matrix,
}

impl Graph {
    /// Build from a 0/1 adjacency matrix.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ShapeMismatch`] on non-square or non-symmetric
    /// input.
    pub fn from_adjacency(adjacency: &Matrix) -> Result<Self> {
        Self::from_weights(adjacency)
    }

    /// Build from a symmetric weight matrix (weights may be signed).
    ///
    /// The diagonal is forced to zero; self-loops carry no information
    /// for the analyses this graph supports.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ShapeMismatch`] on non-square or non-symmetric
    /// input.
    pub fn from_weights(weights: &Matrix) -> Result<Self> {
        check_square_symmetric(weights, "graph construction")?;
        let mut weights = weights.clone();
        for i in 0..weights.nrows() {
            weights[(i, i)] = 0.0;
        }
        Ok(Self { weights })
    }

    /// Number of nodes.
    pub fn nodes(&self) -> usize {
        self.weights.nrows()
    }

    /// The symmetric weight matrix.
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// Number of undirected edges (nonzero weight pairs).
    pub fn edge_count(&self) -> usize {
        let n = self.nodes();
        let mut count = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                if self.weights[(i, j)] != 0.0 {
                    count += 1;
                }
            }
        }
        count
    }

    /// Neighbors of a node (indices with nonzero weight).
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        (0..self.nodes())
            .filter(|&j| j != node && self.weights[(node, j)] != 0.0)
            .collect()
    }

    /// An owned subgraph over the given nodes, in the given order.
    pub fn subgraph(&self, nodes: &[usize]) -> Graph {
        let weights = Matrix::from_fn(nodes.len(), nodes.len(), |i, j| {
            self.weights[(nodes[i], nodes[j])]
        });
        Graph { weights }
    }
}

/// Reject non-square or non-symmetric matrices.
pub(crate) fn check_square_symmetric(matrix: &Matrix, context: &'static str) -> Result<()> {
    if matrix.nrows() != matrix.ncols() {
        return Err(PipelineError::shape(
            context,
            (matrix.nrows(), matrix.nrows()),
            (matrix.nrows(), matrix.ncols()),
        ));
    }
    for i in 0..matrix.nrows() {
        for j in (i + 1)..matrix.ncols() {
            if (matrix[(i, j)] - matrix[(j, i)]).abs() > SYMMETRY_TOLERANCE {
                return Err(PipelineError::ShapeMismatch {
                    expected: "symmetric matrix".to_string(),
                    actual: format!(
                        "asymmetry {:.3e} at ({i}, {j})",
                        (matrix[(i, j)] - matrix[(j, i)]).abs()
                    ),
                    context,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_square() {
        let m = Matrix::zeros(3, 4);
        assert!(matches!(
            Graph::from_weights(&m),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn rejects_asymmetric() {
        let mut m = Matrix::zeros(3, 3);
        m[(0, 1)] = 1.0;
        assert!(matches!(
            Graph::from_weights(&m),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn diagonal_forced_to_zero() {
        let mut m = Matrix::zeros(2, 2);
        m[(0, 0)] = 5.0;
        let graph = Graph::from_weights(&m).unwrap();
        assert_eq!(graph.weights()[(0, 0)], 0.0);
    }

    #[test]
    fn neighbors_and_edges() {
        let mut m = Matrix::zeros(3, 3);
        m[(0, 1)] = 1.0;
        m[(1, 0)] = 1.0;
        let graph = Graph::from_adjacency(&m).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.neighbors(0), vec![1]);
        assert!(graph.neighbors(2).is_empty());
    }
}
