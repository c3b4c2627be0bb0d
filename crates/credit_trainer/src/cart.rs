//! CART (Classification and Regression Tree) builder
//!
//! Grows a single classification tree with Gini impurity and exact-greedy
//! threshold search over a random subset of features at each node.
//! When the subset holds no valid split, further features are drawn until
//! one does or all have been tried.

use credit_core::{Node, Tree};
use rand::seq::SliceRandom;

use crate::dataset::N_CLASSES;
use crate::deterministic::{LcgRng, SplitTieBreaker};

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features examined per node
    pub max_features: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: usize::MAX,
        }
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    /// Weighted impurity decrease
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: f64, gain: f64) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
        }
    }

    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

/// Minimum gain for a split to be worth making
const MIN_GAIN: f64 = 1e-12;

/// Build a classification tree over a (possibly repeated) sample of rows
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    targets: &'a [usize],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(features: &'a [Vec<f64>], targets: &'a [usize], config: TreeConfig) -> Self {
        assert_eq!(features.len(), targets.len());

        let feature_count = features.first().map_or(0, Vec::len);

        Self {
            config,
            features,
            targets,
            feature_count,
        }
    }

    /// Build a tree from the given row indices (duplicates allowed)
    pub fn build(&self, indices: Vec<usize>, rng: &mut LcgRng) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(indices, 0, &mut nodes, rng);
        Tree::new(nodes)
    }

    /// Recursively build tree nodes in pre-order; returns the node index
    fn build_node(
        &self,
        indices: Vec<usize>,
        depth: usize,
        nodes: &mut Vec<Node>,
        rng: &mut LcgRng,
    ) -> i32 {
        let current_idx = nodes.len() as i32;
        let counts = self.class_counts(&indices);
        let n = indices.len();

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if pure
            || depth >= self.config.max_depth
            || n < self.config.min_samples_split
            || n < 2 * self.config.min_samples_leaf
        {
            nodes.push(Node::leaf(current_idx, distribution(&counts)));
            return current_idx;
        }

        let split = match self.find_best_split(&indices, &counts, rng) {
            Some(s) => s,
            None => {
                nodes.push(Node::leaf(current_idx, distribution(&counts)));
                return current_idx;
            }
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.features[i][split.feature_idx] <= split.threshold);

        // Reserve space for current node
        nodes.push(Node::internal(
            current_idx,
            split.feature_idx as i32,
            split.threshold,
            0,
            0,
        ));

        let left_idx = self.build_node(left_indices, depth + 1, nodes, rng);
        let right_idx = self.build_node(right_indices, depth + 1, nodes, rng);

        nodes[current_idx as usize].left = left_idx;
        nodes[current_idx as usize].right = right_idx;

        current_idx
    }

    /// Exact-greedy search over features in random order.
    ///
    /// At least `max_features` features are examined; constant or useless
    /// features do not count against that budget while no split is found.
    fn find_best_split(
        &self,
        indices: &[usize],
        parent_counts: &[usize; N_CLASSES],
        rng: &mut LcgRng,
    ) -> Option<SplitCandidate> {
        if self.feature_count == 0 {
            return None;
        }
        let k = self.config.max_features.clamp(1, self.feature_count);
        let mut candidates: Vec<usize> = (0..self.feature_count).collect();
        candidates.shuffle(rng);

        let n = indices.len();
        let parent_impurity = weighted_gini(parent_counts, n);
        let min_leaf = self.config.min_samples_leaf;

        let mut best: Option<SplitCandidate> = None;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

        for (visited, feature_idx) in candidates.into_iter().enumerate() {
            // Past the first k features, keep drawing only until a split exists
            if visited >= k && best.is_some() {
                break;
            }

            sorted.clear();
            sorted.extend(
                indices
                    .iter()
                    .map(|&i| (self.features[i][feature_idx], self.targets[i])),
            );
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = [0usize; N_CLASSES];
            for pos in 0..n - 1 {
                left[sorted[pos].1] += 1;

                let (value, next) = (sorted[pos].0, sorted[pos + 1].0);
                if value == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let mut right = *parent_counts;
                for (r, l) in right.iter_mut().zip(&left) {
                    *r -= l;
                }

                let gain = parent_impurity
                    - weighted_gini(&left, n_left)
                    - weighted_gini(&right, n_right);
                if gain <= MIN_GAIN {
                    continue;
                }

                let candidate = SplitCandidate::new(feature_idx, midpoint(value, next), gain);
                if best.as_ref().map_or(true, |b| candidate.beats(b)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    fn class_counts(&self, indices: &[usize]) -> [usize; N_CLASSES] {
        let mut counts = [0usize; N_CLASSES];
        for &i in indices {
            counts[self.targets[i]] += 1;
        }
        counts
    }
}

/// Gini impurity scaled by node size: n * (1 - sum p_k^2)
fn weighted_gini(counts: &[usize; N_CLASSES], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    let sum_sq: f64 = counts.iter().map(|&c| (c as f64) * (c as f64)).sum();
    n - sum_sq / n
}

/// Threshold between two adjacent distinct values; stays below `hi`
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi {
        lo
    } else {
        mid
    }
}

fn distribution(counts: &[usize; N_CLASSES]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![1.0 / N_CLASSES as f64; N_CLASSES];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<usize>) {
        let features = vec![
            vec![1.0, 100.0],
            vec![2.0, 300.0],
            vec![3.0, 200.0],
            vec![4.0, 100.0],
            vec![10.0, 300.0],
            vec![11.0, 200.0],
            vec![12.0, 100.0],
            vec![13.0, 300.0],
        ];
        let targets = vec![0, 0, 0, 0, 1, 1, 1, 1];
        (features, targets)
    }

    fn full_config() -> TreeConfig {
        TreeConfig {
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    #[test]
    fn test_simple_tree() {
        let (features, targets) = separable();
        let builder = CartBuilder::new(&features, &targets, full_config());
        let tree = builder.build((0..8).collect(), &mut LcgRng::new(42));

        // One split on feature 0 between 4 and 10 separates the classes
        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.nodes[0].feature_idx, 0);
        assert_eq!(tree.nodes[0].threshold, 7.0);
        assert_eq!(tree.evaluate(&[2.5, 0.0]), Some(&[1.0, 0.0][..]));
        assert_eq!(tree.evaluate(&[12.5, 0.0]), Some(&[0.0, 1.0][..]));
        assert!(tree.validate(2, 2).is_ok());
    }

    #[test]
    fn test_leaf_only_tree() {
        let features = vec![vec![1.0], vec![2.0]];
        let targets = vec![1, 1];

        let builder = CartBuilder::new(&features, &targets, TreeConfig::default());
        let tree = builder.build(vec![0, 1], &mut LcgRng::new(1));

        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].leaf, Some(vec![0.0, 1.0]));
    }

    #[test]
    fn test_min_samples_split_stops_growth() {
        let (features, targets) = separable();
        let config = TreeConfig {
            min_samples_split: 9,
            ..full_config()
        };
        let tree = CartBuilder::new(&features, &targets, config).build((0..8).collect(), &mut LcgRng::new(3));
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].leaf, Some(vec![0.5, 0.5]));
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let features: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64]).collect();
        let targets = vec![1, 0, 0, 0, 0, 0];
        let config = TreeConfig {
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 2,
            max_features: 1,
        };
        let tree = CartBuilder::new(&features, &targets, config).build((0..6).collect(), &mut LcgRng::new(5));

        // Isolating row 0 would create a 1-sample leaf
        if !tree.nodes[0].is_leaf() {
            assert!(tree.nodes[0].threshold > 1.0);
        }
    }

    #[test]
    fn test_depth_limit() {
        let features: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let targets: Vec<usize> = (0..32).map(|i| i % 2).collect();
        let config = TreeConfig {
            max_depth: 2,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 1,
        };
        let tree = CartBuilder::new(&features, &targets, config).build((0..32).collect(), &mut LcgRng::new(9));
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_build_is_deterministic() {
        let (features, targets) = separable();
        let builder = CartBuilder::new(&features, &targets, full_config());
        let rows = vec![0, 0, 1, 3, 4, 5, 5, 7];
        let a = builder.build(rows.clone(), &mut LcgRng::new(11));
        let b = builder.build(rows, &mut LcgRng::new(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_informative_feature_found_among_constants() {
        // Only feature 7 varies; most 4-feature draws miss it, so the builder
        // has to keep drawing until it reaches it
        let features: Vec<Vec<f64>> = (0..40)
            .map(|i| {
                let mut row = vec![1.0; 20];
                row[7] = i as f64;
                row
            })
            .collect();
        let targets: Vec<usize> = (0..40).map(|i| usize::from(i >= 20)).collect();
        let config = TreeConfig {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: 4,
        };
        let builder = CartBuilder::new(&features, &targets, config);

        for seed in 0..20 {
            let tree = builder.build((0..40).collect(), &mut LcgRng::new(seed));
            assert_eq!(tree.nodes[0].feature_idx, 7, "seed {seed}");
            assert_eq!(tree.nodes[0].threshold, 19.5);

            assert_eq!(tree.evaluate(&features[3]), Some(&[1.0, 0.0][..]));
            assert_eq!(tree.evaluate(&features[35]), Some(&[0.0, 1.0][..]));
        }
    }

    #[test]
    fn test_helpers() {
        assert_eq!(weighted_gini(&[5, 5], 10), 5.0);
        assert_eq!(weighted_gini(&[10, 0], 10), 0.0);
        assert_eq!(midpoint(1.0, 2.0), 1.5);
        assert_eq!(distribution(&[1, 3]), vec![0.25, 0.75]);
    }
}
