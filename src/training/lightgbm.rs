//! LightGBM-style gradient boosting with leaf-wise tree growth
//!
//! - Leaf-wise (best-first) tree growth instead of level-wise
//! - Optional Gradient-based One-Side Sampling (GOSS)
//! - Balanced class weights, L1/L2 leaf regularisation
//! - Early stopping on validation AUC with truncation to the best round

use super::classifier::{
    check_binary_targets, two_column_proba, BoostingClassifier, Classifier, EarlyStoppingOutcome, Estimator,
};
use super::gradient_boosting::{positive, sigmoid, unit_fraction};
use super::params::ParamValue;
use crate::error::{Result, TimefoldError};
use crate::evaluation::metrics::roc_auc;
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

/// Row sampling strategy per boosting round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostingType {
    /// Plain gradient boosting with optional bagging (`subsample`)
    #[default]
    Gbdt,
    /// Gradient-based One-Side Sampling
    Goss,
}

/// Per-class sample weighting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    /// Every row weighs 1
    None,
    /// Rows weigh `n / (2 * n_class)` so both classes carry equal mass
    #[default]
    Balanced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightGBMConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_leaves: usize,
    pub max_depth: Option<usize>,
    pub min_child_samples: usize,
    pub reg_lambda: f64,
    pub reg_alpha: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub boosting_type: BoostingType,
    /// GOSS: fraction of largest-gradient rows always kept
    pub top_rate: f64,
    /// GOSS: fraction of remaining rows sampled
    pub other_rate: f64,
    pub class_weight: ClassWeight,
    pub random_state: u64,
}

impl Default for LightGBMConfig {
    fn default() -> Self {
        Self {
            n_estimators: 1000,
            learning_rate: 0.01,
            max_leaves: 31,
            max_depth: None,
            min_child_samples: 20,
            reg_lambda: 0.1,
            reg_alpha: 0.1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            boosting_type: BoostingType::Gbdt,
            top_rate: 0.2,
            other_rate: 0.1,
            class_weight: ClassWeight::Balanced,
            random_state: 101,
        }
    }
}

impl Estimator for LightGBMConfig {
    type Model = LightGBMClassifier;

    fn build(&self) -> LightGBMClassifier {
        LightGBMClassifier::new(self.clone())
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "n_estimators" => self.n_estimators = value.expect_usize(name)?.max(1),
            "learning_rate" => self.learning_rate = positive(name, value)?,
            "num_leaves" | "max_leaves" => self.max_leaves = value.expect_usize(name)?.max(2),
            "max_depth" => {
                // Non-positive depth means unlimited
                self.max_depth = match value.as_int() {
                    Some(d) if d <= 0 => None,
                    _ => value.expect_optional_usize(name)?,
                }
            }
            "min_child_samples" => self.min_child_samples = value.expect_usize(name)?.max(1),
            "reg_lambda" => self.reg_lambda = value.expect_float(name)?.max(0.0),
            "reg_alpha" => self.reg_alpha = value.expect_float(name)?.max(0.0),
            "subsample" => self.subsample = unit_fraction(name, value)?,
            "colsample_bytree" => self.colsample_bytree = unit_fraction(name, value)?,
            "top_rate" => self.top_rate = unit_fraction(name, value)?,
            "other_rate" => self.other_rate = unit_fraction(name, value)?,
            "random_state" => self.random_state = value.expect_usize(name)? as u64,
            "boosting_type" => {
                self.boosting_type = match value.as_string() {
                    Some("gbdt") => BoostingType::Gbdt,
                    Some("goss") => BoostingType::Goss,
                    _ => return Err(TimefoldError::invalid_parameter(name, value, "expected 'gbdt' or 'goss'")),
                }
            }
            "class_weight" => {
                self.class_weight = match value.as_string() {
                    Some("balanced") => ClassWeight::Balanced,
                    Some(s) if s.eq_ignore_ascii_case("none") => ClassWeight::None,
                    _ => return Err(TimefoldError::invalid_parameter(name, value, "expected 'balanced' or 'none'")),
                }
            }
            _ => return Err(TimefoldError::invalid_parameter(name, value, "unknown lightgbm parameter")),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum LGBNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<LGBNode>,
        right: Box<LGBNode>,
    },
}

impl LGBNode {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        match self {
            LGBNode::Leaf { value } => *value,
            LGBNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }
}

fn soft_threshold(g: f64, alpha: f64) -> f64 {
    if g.abs() <= alpha {
        0.0
    } else {
        g - alpha * g.signum()
    }
}

/// Gradient statistics and settings shared by one tree's growth
struct TreeGrower<'a> {
    x: &'a Array2<f64>,
    gradients: &'a [f64],
    hessians: &'a [f64],
    features: Vec<usize>,
    config: &'a LightGBMConfig,
}

struct Candidate {
    gain: f64,
    node_id: usize,
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.gain == other.gain
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain.total_cmp(&other.gain)
    }
}

enum NodeSlot {
    Leaf(Vec<usize>),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

impl<'a> TreeGrower<'a> {
    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        indices
            .iter()
            .fold((0.0, 0.0), |(g, h), &i| (g + self.gradients[i], h + self.hessians[i]))
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        let g = soft_threshold(g, self.config.reg_alpha);
        g * g / (h + self.config.reg_lambda)
    }

    fn leaf(&self, indices: &[usize]) -> LGBNode {
        let (g, h) = self.sums(indices);
        LGBNode::Leaf {
            value: -soft_threshold(g, self.config.reg_alpha) / (h + self.config.reg_lambda),
        }
    }

    fn best_split_for_feature(&self, indices: &[usize], feature: usize) -> Option<(f64, f64, usize, Vec<usize>)> {
        let min_child = self.config.min_child_samples.max(1);
        let mut sorted: Vec<(usize, f64)> = indices.iter().map(|&i| (i, self.x[[i, feature]])).collect();
        sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (total_g, total_h) = self.sums(indices);
        let base = self.score(total_g, total_h);

        let mut left_g = 0.0;
        let mut left_h = 0.0;
        let mut best: Option<(f64, f64, usize)> = None;

        for i in 0..sorted.len() - 1 {
            left_g += self.gradients[sorted[i].0];
            left_h += self.hessians[sorted[i].0];
            if i + 1 < min_child || sorted.len() - i - 1 < min_child || sorted[i].1 == sorted[i + 1].1 {
                continue;
            }

            let gain = self.score(left_g, left_h) + self.score(total_g - left_g, total_h - left_h) - base;
            if gain > best.map_or(1e-12, |b| b.0) {
                best = Some((gain, (sorted[i].1 + sorted[i + 1].1) / 2.0, i + 1));
            }
        }

        best.map(|(gain, threshold, pos)| (gain, threshold, pos, sorted.into_iter().map(|(i, _)| i).collect()))
    }

    fn find_candidate(&self, node_id: usize, indices: &[usize]) -> Option<Candidate> {
        if indices.len() < 2 * self.config.min_child_samples.max(1) {
            return None;
        }
        self.features
            .par_iter()
            .filter_map(|&feature| {
                self.best_split_for_feature(indices, feature)
                    .map(|(gain, threshold, pos, order)| (feature, gain, threshold, pos, order))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .fold(None, |acc: Option<(usize, f64, f64, usize, Vec<usize>)>, cand| {
                if acc.as_ref().map_or(false, |a| a.1 >= cand.1) {
                    acc
                } else {
                    Some(cand)
                }
            })
            .map(|(feature, gain, threshold, pos, mut order)| {
                let right = order.split_off(pos);
                Candidate {
                    gain,
                    node_id,
                    feature,
                    threshold,
                    left: order,
                    right,
                }
            })
    }

    /// Grow leaf-wise, always splitting the leaf with the largest gain
    ///
    /// Returns the tree and the features used by its splits.
    fn grow(&self, indices: Vec<usize>) -> (LGBNode, Vec<usize>) {
        let max_depth = self.config.max_depth.unwrap_or(usize::MAX);
        let mut nodes = vec![NodeSlot::Leaf(Vec::new())];
        let mut depths = vec![0usize];
        let mut heap = BinaryHeap::new();
        let mut used_features = Vec::new();

        if max_depth > 0 {
            if let Some(root) = self.find_candidate(0, &indices) {
                heap.push(root);
            }
        }
        nodes[0] = NodeSlot::Leaf(indices);

        let mut n_leaves = 1;
        while n_leaves < self.config.max_leaves {
            let Some(split) = heap.pop() else { break };

            let depth = depths[split.node_id] + 1;
            let left_id = nodes.len();
            let right_id = left_id + 1;

            for (child_id, child) in [(left_id, &split.left), (right_id, &split.right)] {
                if depth < max_depth {
                    if let Some(candidate) = self.find_candidate(child_id, child) {
                        heap.push(candidate);
                    }
                }
            }

            nodes.push(NodeSlot::Leaf(split.left));
            nodes.push(NodeSlot::Leaf(split.right));
            depths.push(depth);
            depths.push(depth);
            nodes[split.node_id] = NodeSlot::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: left_id,
                right: right_id,
            };
            used_features.push(split.feature);
            n_leaves += 1;
        }

        (self.assemble(&nodes, 0), used_features)
    }

    fn assemble(&self, nodes: &[NodeSlot], id: usize) -> LGBNode {
        match &nodes[id] {
            NodeSlot::Leaf(indices) => self.leaf(indices),
            NodeSlot::Split {
                feature,
                threshold,
                left,
                right,
            } => LGBNode::Split {
                feature: *feature,
                threshold: *threshold,
                left: Box::new(self.assemble(nodes, *left)),
                right: Box::new(self.assemble(nodes, *right)),
            },
        }
    }
}

/// GOSS: keep the top gradients, sample the rest and up-weight them
fn goss_sample(
    gradients: &mut [f64],
    hessians: &mut [f64],
    top_rate: f64,
    other_rate: f64,
    rng: &mut Xoshiro256PlusPlus,
) -> Vec<usize> {
    let n = gradients.len();
    let n_top = ((n as f64 * top_rate).ceil() as usize).min(n);
    let n_other = ((n as f64 * other_rate).ceil() as usize).min(n - n_top);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| gradients[b].abs().total_cmp(&gradients[a].abs()));
    let mut rest = order.split_off(n_top);
    rest.shuffle(rng);
    rest.truncate(n_other);

    if n_other > 0 {
        let amplify = (1.0 - top_rate) / other_rate;
        for &i in &rest {
            gradients[i] *= amplify;
            hessians[i] *= amplify;
        }
    }
    order.extend(rest);
    order
}

fn bagging_sample(n: usize, subsample: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let k = ((n as f64 * subsample).ceil() as usize).clamp(1, n);
    let mut idx: Vec<usize> = (0..n).collect();
    if k < n {
        idx.shuffle(rng);
        idx.truncate(k);
    }
    idx
}

/// Raw-score running totals for one evaluated data set
struct EvalSet<'a> {
    x: &'a Array2<f64>,
    y: &'a Array1<f64>,
    raw: Array1<f64>,
}

impl<'a> EvalSet<'a> {
    fn new(x: &'a Array2<f64>, y: &'a Array1<f64>, init: f64) -> Self {
        Self {
            x,
            y,
            raw: Array1::from_elem(x.nrows(), init),
        }
    }

    fn add_tree(&mut self, tree: &LGBNode, learning_rate: f64) {
        for (raw, row) in self.raw.iter_mut().zip(self.x.rows()) {
            *raw += learning_rate * tree.predict(row);
        }
    }

    fn auc(&self) -> Result<f64> {
        roc_auc(self.y, &self.raw)
    }
}

/// Leaf-wise gradient boosting classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightGBMClassifier {
    pub config: LightGBMConfig,
    trees: Vec<LGBNode>,
    split_features: Vec<Vec<usize>>,
    base_prediction: f64,
    n_features: usize,
}

impl LightGBMClassifier {
    pub fn new(config: LightGBMConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            split_features: Vec::new(),
            base_prediction: 0.0,
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn sample_weights(&self, y: &Array1<f64>) -> Array1<f64> {
        match self.config.class_weight {
            ClassWeight::None => Array1::ones(y.len()),
            ClassWeight::Balanced => {
                let n = y.len() as f64;
                let pos = y.iter().filter(|&&v| v > 0.5).count() as f64;
                let neg = n - pos;
                y.mapv(|v| if v > 0.5 { n / (2.0 * pos) } else { n / (2.0 * neg) })
            }
        }
    }

    /// Boost for up to `n_estimators` rounds; `on_round` sees the base score
    /// and each new tree, and returns `false` to stop
    fn boost<F>(&mut self, x: &Array2<f64>, y: &Array1<f64>, mut on_round: F) -> Result<()>
    where
        F: FnMut(usize, f64, &LGBNode) -> Result<bool>,
    {
        check_binary_targets(x, y)?;
        let n = x.nrows();
        self.n_features = x.ncols();
        self.trees.clear();
        self.split_features.clear();

        let weights = self.sample_weights(y);
        let weighted_pos = weights.iter().zip(y.iter()).map(|(w, t)| w * t).sum::<f64>() / weights.sum();
        self.base_prediction = (weighted_pos / (1.0 - weighted_pos)).ln();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);
        let n_selected = ((self.n_features as f64 * self.config.colsample_bytree).ceil() as usize).clamp(1, self.n_features.max(1));
        let mut raw = Array1::from_elem(n, self.base_prediction);

        for round in 0..self.config.n_estimators {
            let mut gradients = Vec::with_capacity(n);
            let mut hessians = Vec::with_capacity(n);
            for i in 0..n {
                let p = sigmoid(raw[i]);
                gradients.push(weights[i] * (p - y[i]));
                hessians.push((weights[i] * p * (1.0 - p)).max(1e-16));
            }

            let indices = match self.config.boosting_type {
                BoostingType::Goss => goss_sample(
                    &mut gradients,
                    &mut hessians,
                    self.config.top_rate,
                    self.config.other_rate,
                    &mut rng,
                ),
                BoostingType::Gbdt => bagging_sample(n, self.config.subsample, &mut rng),
            };

            let mut features: Vec<usize> = (0..self.n_features).collect();
            if n_selected < self.n_features {
                features.shuffle(&mut rng);
                features.truncate(n_selected);
            }

            let grower = TreeGrower {
                x,
                gradients: &gradients,
                hessians: &hessians,
                features,
                config: &self.config,
            };
            let (tree, used) = grower.grow(indices);

            for (r, row) in raw.iter_mut().zip(x.rows()) {
                *r += self.config.learning_rate * tree.predict(row);
            }

            let keep_going = on_round(round, self.base_prediction, &tree)?;
            self.trees.push(tree);
            self.split_features.push(used);
            if !keep_going {
                break;
            }
        }
        Ok(())
    }

    fn predict_raw(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(TimefoldError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(TimefoldError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                self.base_prediction
                    + self
                        .trees
                        .iter()
                        .map(|t| self.config.learning_rate * t.predict(row))
                        .sum::<f64>()
            })
            .collect())
    }
}

impl Classifier for LightGBMClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.boost(x, y, |_, _, _| Ok(true))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(two_column_proba(&self.predict_raw(x)?.mapv(sigmoid)))
    }

    /// Number of splits using each feature
    fn feature_importances(&self) -> Option<Array1<f64>> {
        if self.trees.is_empty() {
            return None;
        }
        let mut counts = Array1::<f64>::zeros(self.n_features);
        for &feature in self.split_features.iter().flatten() {
            counts[feature] += 1.0;
        }
        Some(counts)
    }
}

impl BoostingClassifier for LightGBMClassifier {
    fn fit_with_validation(
        &mut self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_valid: &Array2<f64>,
        y_valid: &Array1<f64>,
        early_stopping_rounds: usize,
    ) -> Result<EarlyStoppingOutcome> {
        check_binary_targets(x_valid, y_valid)
            .map_err(|e| TimefoldError::TrainingError(format!("invalid validation set: {}", e)))?;
        if x_valid.ncols() != x_train.ncols() {
            return Err(TimefoldError::ShapeError {
                expected: format!("{} validation features", x_train.ncols()),
                actual: format!("{} validation features", x_valid.ncols()),
            });
        }

        let learning_rate = self.config.learning_rate;
        let mut train: Option<EvalSet> = None;
        let mut valid: Option<EvalSet> = None;
        let mut best = EarlyStoppingOutcome {
            best_iteration: 0,
            best_train_auc: f64::NAN,
            best_valid_auc: f64::NEG_INFINITY,
        };

        self.boost(x_train, y_train, |round, base, tree| {
            let train_set = train.get_or_insert_with(|| EvalSet::new(x_train, y_train, base));
            let valid_set = valid.get_or_insert_with(|| EvalSet::new(x_valid, y_valid, base));
            train_set.add_tree(tree, learning_rate);
            valid_set.add_tree(tree, learning_rate);

            let valid_auc = valid_set.auc()?;
            if valid_auc > best.best_valid_auc {
                best = EarlyStoppingOutcome {
                    best_iteration: round + 1,
                    best_train_auc: train_set.auc()?,
                    best_valid_auc: valid_auc,
                };
            }
            Ok(round + 1 - best.best_iteration < early_stopping_rounds.max(1))
        })?;

        self.trees.truncate(best.best_iteration);
        self.split_features.truncate(best.best_iteration);
        debug!(
            best_iteration = best.best_iteration,
            train_auc = best.best_train_auc,
            valid_auc = best.best_valid_auc,
            "Early stopping finished"
        );
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_classification_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((100, 2), (0..200).map(|i| (i as f64) / 100.0).collect()).unwrap();
        let y = Array1::from_vec((0..100).map(|i| if i < 50 { 0.0 } else { 1.0 }).collect());
        (x, y)
    }

    fn small_config() -> LightGBMConfig {
        LightGBMConfig {
            n_estimators: 30,
            learning_rate: 0.1,
            max_leaves: 8,
            min_child_samples: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = LightGBMConfig::default();
        assert_eq!(config.n_estimators, 1000);
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.class_weight, ClassWeight::Balanced);
        assert_eq!(config.random_state, 101);
        // Row bagging is off unless asked for
        assert_eq!(config.subsample, 1.0);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.random_state);
        assert_eq!(bagging_sample(10, config.subsample, &mut rng), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_bagging_draws_distinct_rows() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mut rows = bagging_sample(10, 0.8, &mut rng);
        assert_eq!(rows.len(), 8);
        rows.sort_unstable();
        rows.dedup();
        assert_eq!(rows.len(), 8);
    }

    #[test]
    fn test_lightgbm_classifier() {
        let (x, y) = make_classification_data();
        let mut model = small_config().build();
        model.fit(&x, &y).unwrap();
        let positive = model.predict_positive(&x).unwrap();
        let acc = positive
            .iter()
            .zip(y.iter())
            .filter(|(&p, &t)| (p >= 0.5) == (t > 0.5))
            .count() as f64
            / 100.0;
        assert!(acc > 0.9, "Accuracy too low: {}", acc);
    }

    #[test]
    fn test_lightgbm_predict_proba() {
        let (x, y) = make_classification_data();
        let mut model = small_config().build();
        model.fit(&x, &y).unwrap();
        let proba = model.predict_proba(&x).unwrap();
        assert_eq!(proba.ncols(), 2);
        for i in 0..proba.nrows() {
            assert!((proba[[i, 0]] + proba[[i, 1]] - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_lightgbm_goss() {
        let (x, y) = make_classification_data();
        let config = LightGBMConfig {
            boosting_type: BoostingType::Goss,
            top_rate: 0.3,
            other_rate: 0.2,
            ..small_config()
        };
        let mut model = config.build();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_trees(), 30);
    }

    #[test]
    fn test_split_count_importances() {
        let (x, y) = make_classification_data();
        let mut model = small_config().build();
        model.fit(&x, &y).unwrap();
        let importances = model.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!(importances.iter().all(|&v| v >= 0.0 && v.fract() == 0.0));
        assert!(importances.sum() > 0.0);
    }

    #[test]
    fn test_early_stopping_truncates() {
        let (x, y) = make_classification_data();
        let train_rows: Vec<usize> = (0..100).filter(|i| i % 4 != 0).collect();
        let valid_rows: Vec<usize> = (0..100).filter(|i| i % 4 == 0).collect();
        let x_train = x.select(ndarray::Axis(0), &train_rows);
        let y_train = y.select(ndarray::Axis(0), &train_rows);
        let x_valid = x.select(ndarray::Axis(0), &valid_rows);
        let y_valid = y.select(ndarray::Axis(0), &valid_rows);

        let config = LightGBMConfig {
            n_estimators: 200,
            ..small_config()
        };
        let mut model = config.build();
        let outcome = model
            .fit_with_validation(&x_train, &y_train, &x_valid, &y_valid, 5)
            .unwrap();

        // Separable data: validation AUC plateaus early
        assert!(outcome.best_iteration >= 1);
        assert!(outcome.best_iteration < 200);
        assert_eq!(model.n_trees(), outcome.best_iteration);
        assert!(outcome.best_valid_auc > 0.95);
    }

    #[test]
    fn test_single_class_validation_rejected() {
        let (x, y) = make_classification_data();
        let mut model = small_config().build();
        let x_valid = x.slice(ndarray::s![0..10, ..]).to_owned();
        let y_valid = Array1::zeros(10);
        let err = model.fit_with_validation(&x, &y, &x_valid, &y_valid, 10).unwrap_err();
        assert!(matches!(err, TimefoldError::TrainingError(_)));
    }

    #[test]
    fn test_set_param() {
        let mut config = LightGBMConfig::default();
        config.set_param("num_leaves", &ParamValue::Int(15)).unwrap();
        config.set_param("max_depth", &ParamValue::Int(-1)).unwrap();
        config.set_param("boosting_type", &ParamValue::from("goss")).unwrap();
        assert_eq!(config.max_leaves, 15);
        assert_eq!(config.max_depth, None);
        assert_eq!(config.boosting_type, BoostingType::Goss);
        assert!(config.set_param("class_weight", &ParamValue::from("auto")).is_err());
    }
}
