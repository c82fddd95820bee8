//! CART decision tree
//!
//! Leaves store the mean target of their rows. For 0/1 labels that mean is
//! the positive-class probability, so the same tree serves as a probability
//! classifier (Gini criterion) and as the regression base learner of the
//! boosting backends (MSE criterion).

use super::classifier::{check_binary_targets, two_column_proba, Classifier, Estimator};
use super::params::ParamValue;
use crate::error::{Result, TimefoldError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

impl TreeNode {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        match self {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Gini impurity over 0/1 labels
    #[default]
    Gini,
    /// Variance of the target
    Mse,
}

impl Criterion {
    /// Impurity from row count, target sum and sum of squares
    fn impurity(&self, count: usize, sum: f64, sq_sum: f64) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let n = count as f64;
        match self {
            Criterion::Gini => {
                let p = sum / n;
                2.0 * p * (1.0 - p)
            }
            Criterion::Mse => (sq_sum / n - (sum / n).powi(2)).max(0.0),
        }
    }
}

/// Tree growth settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn at random per node; all features when `None`
    pub max_features: Option<usize>,
    pub criterion: Criterion,
    pub random_state: u64,
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            random_state: 42,
        }
    }
}

impl DecisionTreeConfig {
    pub fn regressor() -> Self {
        Self {
            criterion: Criterion::Mse,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}

impl Estimator for DecisionTreeConfig {
    type Model = DecisionTree;

    fn build(&self) -> DecisionTree {
        DecisionTree::new(self.clone())
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "max_depth" => self.max_depth = value.expect_optional_usize(name)?,
            "min_samples_split" => self.min_samples_split = value.expect_usize(name)?.max(2),
            "min_samples_leaf" => self.min_samples_leaf = value.expect_usize(name)?.max(1),
            "max_features" => self.max_features = value.expect_optional_usize(name)?,
            "random_state" => self.random_state = value.expect_usize(name)? as u64,
            "criterion" => {
                self.criterion = match value.as_string() {
                    Some("gini") => Criterion::Gini,
                    Some("mse") | Some("squared_error") => Criterion::Mse,
                    _ => return Err(TimefoldError::invalid_parameter(name, value, "expected 'gini' or 'mse'")),
                }
            }
            _ => return Err(TimefoldError::invalid_parameter(name, value, "unknown decision tree parameter")),
        }
        Ok(())
    }
}

/// Decision tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: DecisionTreeConfig,
    root: Option<TreeNode>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new(DecisionTreeConfig::default())
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    pub fn new(config: DecisionTreeConfig) -> Self {
        Self {
            config,
            root: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn config(&self) -> &DecisionTreeConfig {
        &self.config
    }

    /// Grow the tree on arbitrary real-valued targets
    pub fn grow(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(TimefoldError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(TimefoldError::TrainingError("cannot grow a tree on zero rows".to_string()));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_node(x, y, &indices, 0, &mut importances, &mut rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|imp| *imp /= total);
        }
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(())
    }

    fn build_node(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let (sum, sq_sum) = indices
            .iter()
            .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
        let leaf = TreeNode::Leaf {
            value: sum / n_samples as f64,
            n_samples,
        };

        let parent_impurity = self.config.criterion.impurity(n_samples, sum, sq_sum);
        let should_stop = n_samples < self.config.min_samples_split
            || n_samples < 2 * self.config.min_samples_leaf
            || self.config.max_depth.map_or(false, |d| depth >= d)
            || parent_impurity <= 1e-12;
        if should_stop {
            return leaf;
        }

        let features = self.candidate_features(rng);
        let Some(best) = self.find_best_split(x, y, indices, &features, parent_impurity) else {
            return leaf;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature]] <= best.threshold);

        importances[best.feature] += n_samples as f64 * best.gain;

        let left = Box::new(self.build_node(x, y, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_node(x, y, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx: best.feature,
            threshold: best.threshold,
            left,
            right,
            n_samples,
        }
    }

    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        if let Some(k) = self.config.max_features {
            if k < self.n_features {
                features.shuffle(rng);
                features.truncate(k);
            }
        }
        features
    }

    /// Scan candidate features in parallel with a sorted sweep per feature
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
        parent_impurity: f64,
    ) -> Option<BestSplit> {
        let n = indices.len();
        let min_leaf = self.config.min_samples_leaf;
        let criterion = self.config.criterion;
        let (total_sum, total_sq) = indices
            .iter()
            .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));

        features
            .par_iter()
            .filter_map(|&feature| {
                let mut sorted: Vec<(f64, f64)> = indices.iter().map(|&i| (x[[i, feature]], y[i])).collect();
                sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut left_sum = 0.0;
                let mut left_sq = 0.0;
                let mut best: Option<(f64, f64)> = None;

                for pos in 0..n - 1 {
                    let (value, target) = sorted[pos];
                    left_sum += target;
                    left_sq += target * target;

                    let left_count = pos + 1;
                    let right_count = n - left_count;
                    if left_count < min_leaf || right_count < min_leaf || value == sorted[pos + 1].0 {
                        continue;
                    }

                    let weighted = (left_count as f64 * criterion.impurity(left_count, left_sum, left_sq)
                        + right_count as f64
                            * criterion.impurity(right_count, total_sum - left_sum, total_sq - left_sq))
                        / n as f64;
                    let gain = parent_impurity - weighted;
                    if gain > best.map_or(1e-12, |(g, _)| g) {
                        best = Some((gain, (value + sorted[pos + 1].0) / 2.0));
                    }
                }

                best.map(|(gain, threshold)| BestSplit {
                    feature,
                    threshold,
                    gain,
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            // Ties keep the earliest candidate feature
            .fold(None, |acc: Option<BestSplit>, cand| match acc {
                Some(ref a) if a.gain >= cand.gain => acc,
                _ => Some(cand),
            })
    }

    /// Mean target of the leaf each row lands in
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(TimefoldError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(TimefoldError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.rows().into_iter().map(|row| root.predict(row)).collect())
    }

    pub fn importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::depth)
    }

    pub fn n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::n_leaves)
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_binary_targets(x, y)?;
        self.grow(x, y)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(two_column_proba(&self.predict(x)?))
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.feature_importances.clone()
    }
}
