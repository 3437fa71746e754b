//! Modularity-based community detection.
//!
//! Both variants run the same multilevel local search: repeatedly move
//! nodes to the neighboring community with the best modularity gain,
//! then coarsen the graph by collapsing communities into super-nodes,
//! until no move improves the objective. The search is a randomized
//! heuristic (modularity maximization is NP-hard), so unseeded runs
//! may return different partitions of comparable quality.
//!
//! The objective is computed over a two-layer decomposition of the
//! weight matrix into its positive and negative parts, each normalized
//! by its own total weight; with no negative entries this reduces
//! exactly to Newman–Girvan modularity, and with signed input negative
//! weights push their endpoints into different communities. Q values
//! from the two variants live on different scales and are not
//! comparable; compare partitions instead (see
//! [`adjusted_rand_index`]).

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::config::ModularityConfig;
use crate::error::{PipelineError, Result};
use crate::graph::check_square_symmetric;
use crate::types::Matrix;

/// A node-to-community partition with its achieved modularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityAssignment {
    labels: Vec<usize>,
    modularity: f64,
    communities: usize,
    levels: usize,
    passes: usize,
}

impl CommunityAssignment {
    /// Community id per node, compacted to `0..communities()` in order
    /// of first appearance. Labeling is arbitrary across runs unless
    /// the search was seeded.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// The achieved modularity Q.
    pub fn modularity(&self) -> f64 {
        self.modularity
    }

    /// Number of communities in the partition.
    pub fn communities(&self) -> usize {
        self.communities
    }

    /// Coarsening levels the search went through.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Total local-moving passes across all levels.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

/// Binary/weighted modularity maximization over non-negative weights.
///
/// Operates on a 0/1 adjacency matrix (non-negative weights are
/// accepted and treated as edge strengths).
///
/// # Errors
///
/// * [`PipelineError::ShapeMismatch`] on non-square or non-symmetric
///   input.
/// * [`PipelineError::InvalidConfig`] on negative weights; use
///   [`detect_signed_communities`] for signed matrices.
pub fn detect_communities(
    adjacency: &Matrix,
    config: &ModularityConfig,
) -> Result<CommunityAssignment> {
    check_square_symmetric(adjacency, "community detection")?;
    if adjacency.iter().any(|&w| w < 0.0) {
        return Err(PipelineError::InvalidConfig {
            what: "binary modularity requires non-negative weights; \
                   use the signed variant for signed matrices"
                .to_string(),
        });
    }
    Ok(multilevel(adjacency, config))
}

/// Signed/weighted modularity maximization.
///
/// Operates on a real-valued symmetric weight matrix, typically the
/// raw correlation matrix rather than a thresholded adjacency, so
/// anti-correlation structure participates in the partition instead of
/// being discarded.
///
/// # Errors
///
/// [`PipelineError::ShapeMismatch`] on non-square or non-symmetric
/// input.
pub fn detect_signed_communities(
    weights: &Matrix,
    config: &ModularityConfig,
) -> Result<CommunityAssignment> {
    check_square_symmetric(weights, "signed community detection")?;
    Ok(multilevel(weights, config))
}

/// Positive/negative layer split of a weight matrix.
struct Layers {
    /// Positive strengths per node (row sums of the positive part).
    strength_pos: Vec<f64>,
    /// Negative strengths per node (row sums of the negative part,
    /// stored as magnitudes).
    strength_neg: Vec<f64>,
    /// Total positive weight over ordered pairs (2m⁺).
    total_pos: f64,
    /// Total negative weight over ordered pairs (2m⁻).
    total_neg: f64,
}

impl Layers {
    fn of(weights: &Matrix) -> Self {
        let n = weights.nrows();
        let mut strength_pos = vec![0.0; n];
        let mut strength_neg = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                let w = weights[(i, j)];
                if w > 0.0 {
                    strength_pos[i] += w;
                } else {
                    strength_neg[i] -= w;
                }
            }
        }
        let total_pos = strength_pos.iter().sum();
        let total_neg = strength_neg.iter().sum();
        Self {
            strength_pos,
            strength_neg,
            total_pos,
            total_neg,
        }
    }
}

/// The full multilevel search over a validated weight matrix.
fn multilevel(weights: &Matrix, config: &ModularityConfig) -> CommunityAssignment {
    let n = weights.nrows();
    let mut rng = match config.seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_entropy(),
    };

    // Node-to-community mapping on the original graph.
    let mut mapping: Vec<usize> = (0..n).collect();
    let mut current = weights.clone();
    let mut levels = 0;
    let mut passes = 0;

    // Degenerate graphs (no nodes, or no weight at all) partition into
    // singletons with Q = 0.
    if n > 0 && weights.iter().any(|&w| w != 0.0) {
        loop {
            let outcome = local_move(&current, config, &mut rng);
            passes += outcome.passes;
            if !outcome.moved {
                break;
            }
            levels += 1;

            let (compact, communities) = compact_labels(&outcome.community);
            for slot in mapping.iter_mut() {
                *slot = compact[*slot];
            }
            if communities == current.nrows() {
                break;
            }
            current = aggregate(&current, &compact, communities);
        }
    }

    let (labels, communities) = compact_labels(&mapping);
    let modularity = modularity_of(weights, &labels);
    CommunityAssignment {
        labels,
        modularity,
        communities,
        levels,
        passes,
    }
}

struct MoveOutcome {
    community: Vec<usize>,
    passes: usize,
    moved: bool,
}

/// One level of local moving: each node repeatedly joins the candidate
/// community with the highest modularity gain until a full pass makes
/// no move or the pass cap is hit.
fn local_move(
    weights: &Matrix,
    config: &ModularityConfig,
    rng: &mut Xoshiro256PlusPlus,
) -> MoveOutcome {
    let n = weights.nrows();
    let layers = Layers::of(weights);
    let scale = layers.total_pos + layers.total_neg;

    let mut community: Vec<usize> = (0..n).collect();
    let mut tot_pos = layers.strength_pos.clone();
    let mut tot_neg = layers.strength_neg.clone();
    let mut sizes = vec![1usize; n];

    let mut order: Vec<usize> = (0..n).collect();
    let mut passes = 0;
    let mut moved = false;

    for _pass in 0..config.max_passes {
        passes += 1;
        order.shuffle(rng);
        let mut moves = 0;

        for &node in &order {
            let home = community[node];

            // Weights from this node to each adjacent community,
            // excluding the self-loop.
            let mut link_pos: HashMap<usize, f64> = HashMap::new();
            let mut link_neg: HashMap<usize, f64> = HashMap::new();
            for j in 0..n {
                if j == node {
                    continue;
                }
                let w = weights[(node, j)];
                if w > 0.0 {
                    *link_pos.entry(community[j]).or_insert(0.0) += w;
                } else if w < 0.0 {
                    *link_neg.entry(community[j]).or_insert(0.0) -= w;
                }
            }

            // Remove the node from its community before comparing.
            tot_pos[home] -= layers.strength_pos[node];
            tot_neg[home] -= layers.strength_neg[node];
            sizes[home] -= 1;

            let gain_of = |c: usize| -> f64 {
                let pos = if layers.total_pos > 0.0 {
                    link_pos.get(&c).copied().unwrap_or(0.0)
                        - layers.strength_pos[node] * tot_pos[c] / layers.total_pos
                } else {
                    0.0
                };
                let neg = if layers.total_neg > 0.0 {
                    link_neg.get(&c).copied().unwrap_or(0.0)
                        - layers.strength_neg[node] * tot_neg[c] / layers.total_neg
                } else {
                    0.0
                };
                2.0 * (pos - neg) / scale
            };

            let mut best = home;
            let mut best_gain = gain_of(home);
            for &c in link_pos.keys().chain(link_neg.keys()) {
                let gain = gain_of(c);
                if gain > best_gain + config.tolerance {
                    best = c;
                    best_gain = gain;
                }
            }
            // Isolation: an empty community is a candidate too; with
            // negative links this can beat every adjacent community.
            if best_gain < -config.tolerance {
                if let Some(empty) = sizes.iter().position(|&s| s == 0) {
                    if gain_of(empty) > best_gain + config.tolerance {
                        best = empty;
                    }
                }
            }

            tot_pos[best] += layers.strength_pos[node];
            tot_neg[best] += layers.strength_neg[node];
            sizes[best] += 1;
            community[node] = best;
            if best != home {
                moves += 1;
            }
        }

        if moves == 0 {
            break;
        }
        moved = true;
    }

    MoveOutcome {
        community,
        passes,
        moved,
    }
}

/// Renumber labels to `0..k` in order of first appearance.
fn compact_labels(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    let mut next = 0;
    let compact = labels
        .iter()
        .map(|&label| {
            *remap.entry(label).or_insert_with(|| {
                let id = next;
                next += 1;
                id
            })
        })
        .collect();
    (compact, next)
}

/// Collapse communities into super-nodes, summing weights. Internal
/// weight lands on the diagonal as a self-loop so totals are preserved
/// across levels.
fn aggregate(weights: &Matrix, compact: &[usize], communities: usize) -> Matrix {
    let n = weights.nrows();
    let mut agg = Matrix::zeros(communities, communities);
    for i in 0..n {
        for j in 0..n {
            agg[(compact[i], compact[j])] += weights[(i, j)];
        }
    }
    agg
}

/// Modularity of a partition over the original weight matrix, using
/// the two-layer signed decomposition. Reduces to Newman–Girvan Q when
/// no weights are negative.
fn modularity_of(weights: &Matrix, labels: &[usize]) -> f64 {
    let n = weights.nrows();
    if n == 0 {
        return 0.0;
    }
    let layers = Layers::of(weights);
    let scale = layers.total_pos + layers.total_neg;
    if scale == 0.0 {
        return 0.0;
    }

    let communities = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut internal_pos = 0.0;
    let mut internal_neg = 0.0;
    let mut tot_pos = vec![0.0; communities];
    let mut tot_neg = vec![0.0; communities];

    for i in 0..n {
        tot_pos[labels[i]] += layers.strength_pos[i];
        tot_neg[labels[i]] += layers.strength_neg[i];
        for j in 0..n {
            if labels[i] == labels[j] {
                let w = weights[(i, j)];
                if w > 0.0 {
                    internal_pos += w;
                } else {
                    internal_neg -= w;
                }
            }
        }
    }

    let pos = if layers.total_pos > 0.0 {
        internal_pos - tot_pos.iter().map(|t| t * t).sum::<f64>() / layers.total_pos
    } else {
        0.0
    };
    let neg = if layers.total_neg > 0.0 {
        internal_neg - tot_neg.iter().map(|t| t * t).sum::<f64>() / layers.total_neg
    } else {
        0.0
    };
    (pos - neg) / scale
}

/// Adjusted Rand index between two partitions of the same node set.
///
/// 1.0 for identical partitions, near 0 for independent ones; can go
/// slightly negative for partitions worse than chance agreement.
///
/// # Panics
///
/// Panics if the partitions cover different numbers of nodes.
pub fn adjusted_rand_index(a: &[usize], b: &[usize]) -> f64 {
    assert_eq!(
        a.len(),
        b.len(),
        "partitions must cover the same node set"
    );
    let n = a.len();
    if n < 2 {
        return 1.0;
    }

    let mut contingency: HashMap<(usize, usize), f64> = HashMap::new();
    let mut rows: HashMap<usize, f64> = HashMap::new();
    let mut cols: HashMap<usize, f64> = HashMap::new();
    for (&x, &y) in a.iter().zip(b.iter()) {
        *contingency.entry((x, y)).or_insert(0.0) += 1.0;
        *rows.entry(x).or_insert(0.0) += 1.0;
        *cols.entry(y).or_insert(0.0) += 1.0;
    }

    let comb2 = |x: f64| x * (x - 1.0) / 2.0;
    let index: f64 = contingency.values().map(|&v| comb2(v)).sum();
    let row_sum: f64 = rows.values().map(|&v| comb2(v)).sum();
    let col_sum: f64 = cols.values().map(|&v| comb2(v)).sum();
    let expected = row_sum * col_sum / comb2(n as f64);
    let max_index = (row_sum + col_sum) / 2.0;

    let denominator = max_index - expected;
    if denominator.abs() < 1e-12 {
        return 1.0;
    }
    (index - expected) / denominator
}
