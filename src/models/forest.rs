// RandomForest - bagged CART trees with Gini impurity
//
// Each tree is grown on a bootstrap sample and considers sqrt(n_features)
// randomly chosen features per split. Forest probabilities are the mean of
// the leaf class frequencies reached in every tree.
//
// Trees are stored as flat node arrays with child indices so persisted
// artifacts never nest deeper than one level.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, TrainingError};
use crate::models::{check_width, ClassifierModel};

/// Forest hyper-parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single CART classification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    n_features: usize,
    n_classes: usize,
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree on the rows selected by `indices`
    fn grow(
        rows: &[Vec<f64>],
        labels: &[usize],
        indices: Vec<usize>,
        n_classes: usize,
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = rows[0].len();
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let mut builder = TreeBuilder {
            rows,
            labels,
            n_classes,
            max_features,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            rng,
            nodes: Vec::new(),
        };
        builder.grow(indices, 0);

        Self {
            n_features,
            n_classes,
            nodes: builder.nodes,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Leaf class distribution reached by `row`
    fn leaf_distribution(&self, row: &[f64]) -> Result<&[f64], ArtifactError> {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { distribution }) => return Ok(distribution),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).ok_or_else(|| corrupt("split feature out of range"))?;
                    let next = if *value <= *threshold { *left } else { *right };
                    // Children always follow their parent, so the walk terminates
                    if next <= index {
                        return Err(corrupt("child index does not follow its parent"));
                    }
                    index = next;
                }
                None => return Err(corrupt("dangling node index")),
            }
        }
    }
}

impl DecisionTree {
    /// Structural checks on a deserialized tree
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { distribution } => {
                    if distribution.len() != self.n_classes {
                        return Err(format!(
                            "leaf {} has {} classes, expected {}",
                            index,
                            distribution.len(),
                            self.n_classes
                        ));
                    }
                    if distribution.iter().any(|p| !p.is_finite() || *p < 0.0) {
                        return Err(format!("leaf {} has an invalid distribution", index));
                    }
                }
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= self.n_features {
                        return Err(format!(
                            "node {} splits on feature {} of {}",
                            index, feature, self.n_features
                        ));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!(
                                "node {} has child index {} outside ({}, {})",
                                index,
                                child,
                                index,
                                self.nodes.len()
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn incompatible(reason: String) -> ArtifactError {
    ArtifactError::Incompatible {
        artifact: "random_forest_model".to_string(),
        reason,
    }
}

fn corrupt(reason: &str) -> ArtifactError {
    ArtifactError::Corrupt {
        artifact: "random_forest_model".to_string(),
        reason: reason.to_string(),
    }
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    max_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&indices);
        let node_index = self.nodes.len();
        self.nodes.push(leaf(&counts, indices.len()));

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || indices.len() < self.min_samples_split {
            return node_index;
        }

        let Some((feature, threshold)) = self.best_split(&indices, &counts) else {
            return node_index;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.rows[i][feature] <= threshold);
        let left = self.grow(left, depth + 1);
        let right = self.grow(right, depth + 1);
        self.nodes[node_index] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        node_index
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in indices {
            counts[self.labels[i]] += 1;
        }
        counts
    }

    /// Lowest weighted Gini split over a random feature subset, falling
    /// back to every feature when the subset has no usable threshold
    fn best_split(&mut self, indices: &[usize], counts: &[usize]) -> Option<(usize, f64)> {
        let n_features = self.rows[0].len();
        if n_features == 0 {
            return None;
        }
        let mut candidates =
            rand::seq::index::sample(&mut *self.rng, n_features, self.max_features).into_vec();
        candidates.sort_unstable();

        if let Some((feature, threshold, _)) = self.scan_features(&candidates, indices, counts) {
            return Some((feature, threshold));
        }
        let all: Vec<usize> = (0..n_features).collect();
        self.scan_features(&all, indices, counts)
            .map(|(feature, threshold, _)| (feature, threshold))
    }

    fn scan_features(
        &self,
        features: &[usize],
        indices: &[usize],
        counts: &[usize],
    ) -> Option<(usize, f64, f64)> {
        let n = indices.len();
        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted = indices.to_vec();

        for &feature in features {
            sorted.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut left_counts = vec![0usize; self.n_classes];
            for pos in 0..n - 1 {
                left_counts[self.labels[sorted[pos]]] += 1;
                let here = self.rows[sorted[pos]][feature];
                let next = self.rows[sorted[pos + 1]][feature];
                if here >= next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                let right_counts: Vec<usize> =
                    counts.iter().zip(&left_counts).map(|(t, l)| t - l).collect();
                let impurity = (n_left as f64 * gini(&left_counts, n_left)
                    + n_right as f64 * gini(&right_counts, n_right))
                    / n as f64;

                if best.map_or(true, |(_, _, b)| impurity < b) {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some((feature, threshold, impurity));
                }
            }
        }

        best
    }
}

fn leaf(counts: &[usize], total: usize) -> Node {
    let total = total.max(1) as f64;
    Node::Leaf {
        distribution: counts.iter().map(|&c| c as f64 / total).collect(),
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Ensemble of bootstrap-trained decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> Result<Self, TrainingError> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(TrainingError::InsufficientSamples {
                required: 1,
                collected: rows.len().min(labels.len()),
            });
        }
        if params.n_trees == 0 {
            return Err(TrainingError::InvalidConfig {
                reason: "forest_trees must be at least 1".to_string(),
            });
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(TrainingError::InvalidConfig {
                reason: format!("label {} out of range for {} classes", bad, n_classes),
            });
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = rows.len();
        let trees = (0..params.n_trees)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::grow(rows, labels, bootstrap, n_classes, params, &mut rng)
            })
            .collect();

        Ok(Self {
            n_features: rows[0].len(),
            n_classes,
            trees,
        })
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl ClassifierModel for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(incompatible("forest has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features != self.n_features || tree.n_classes != self.n_classes {
                return Err(incompatible(format!(
                    "tree {} is shaped {}x{}, forest is {}x{}",
                    i, tree.n_features, tree.n_classes, self.n_features, self.n_classes
                )));
            }
            tree.validate()
                .map_err(|reason| incompatible(format!("tree {}: {}", i, reason)))?;
        }
        Ok(())
    }

    fn predict_proba(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        check_width("Random Forest", self.n_features, batch)?;
        if self.trees.is_empty() {
            return Err(corrupt("forest has no trees"));
        }

        batch
            .iter()
            .map(|row| {
                let mut proba = vec![0.0; self.n_classes];
                for tree in &self.trees {
                    let distribution = tree.leaf_distribution(row)?;
                    if distribution.len() != self.n_classes {
                        return Err(corrupt("leaf distribution has wrong class count"));
                    }
                    for (p, d) in proba.iter_mut().zip(distribution) {
                        *p += d;
                    }
                }
                let n_trees = self.trees.len() as f64;
                Ok(proba.into_iter().map(|p| p / n_trees).collect())
            })
            .collect()
    }
}
