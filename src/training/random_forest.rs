//! Random forest classifier

use super::classifier::{check_binary_targets, two_column_proba, Classifier, Estimator};
use super::decision_tree::{Criterion, DecisionTree, DecisionTreeConfig};
use super::params::ParamValue;
use crate::error::{Result, TimefoldError};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for features considered per split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    Fraction(f64),
    Fixed(usize),
    All,
}

impl MaxFeatures {
    fn resolve(&self, n_features: usize) -> usize {
        match *self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }
}

/// Forest settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub random_state: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: 42,
        }
    }
}

impl RandomForestConfig {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
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

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}

impl Estimator for RandomForestConfig {
    type Model = RandomForest;

    fn build(&self) -> RandomForest {
        RandomForest::new(self.clone())
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "n_estimators" => self.n_estimators = value.expect_usize(name)?.max(1),
            "max_depth" => self.max_depth = value.expect_optional_usize(name)?,
            "min_samples_split" => self.min_samples_split = value.expect_usize(name)?.max(2),
            "min_samples_leaf" => self.min_samples_leaf = value.expect_usize(name)?.max(1),
            "bootstrap" => self.bootstrap = value.expect_bool(name)?,
            "random_state" => self.random_state = value.expect_usize(name)? as u64,
            "max_features" => {
                self.max_features = match value {
                    ParamValue::String(s) if s == "sqrt" => MaxFeatures::Sqrt,
                    ParamValue::String(s) if s == "log2" => MaxFeatures::Log2,
                    ParamValue::String(s) if s.eq_ignore_ascii_case("none") => MaxFeatures::All,
                    ParamValue::Int(n) if *n > 0 => MaxFeatures::Fixed(*n as usize),
                    ParamValue::Float(f) if *f > 0.0 && *f <= 1.0 => MaxFeatures::Fraction(*f),
                    _ => {
                        return Err(TimefoldError::invalid_parameter(
                            name,
                            value,
                            "expected 'sqrt', 'log2', 'none', a positive count or a fraction in (0, 1]",
                        ))
                    }
                }
            }
            _ => return Err(TimefoldError::invalid_parameter(name, value, "unknown random forest parameter")),
        }
        Ok(())
    }
}

/// Bagged ensemble of probability trees
///
/// Trees grow in parallel on bootstrap samples, each seeded from
/// `random_state + tree index`. Class probabilities are the mean of the
/// trees' leaf probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: RandomForestConfig,
    trees: Vec<DecisionTree>,
    feature_importances: Option<Array1<f64>>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(RandomForestConfig::default())
    }
}

impl RandomForest {
    pub fn new(config: RandomForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_importances: None,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn tree_config(&self, n_features: usize, seed: u64) -> DecisionTreeConfig {
        DecisionTreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some(self.config.max_features.resolve(n_features)),
            criterion: Criterion::Gini,
            random_state: seed,
        }
    }

    fn compute_feature_importances(&mut self, n_features: usize) {
        let mut total = Array1::<f64>::zeros(n_features);
        for tree in &self.trees {
            if let Some(imp) = tree.importances() {
                total += imp;
            }
        }
        let sum = total.sum();
        if sum > 0.0 {
            total /= sum;
        }
        self.feature_importances = Some(total);
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_binary_targets(x, y)?;
        let n_samples = x.nrows();
        let n_features = x.ncols();
        let base_seed = self.config.random_state;

        let trees: Result<Vec<DecisionTree>> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if self.config.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot = y.select(Axis(0), &sample_indices);

                let mut tree = DecisionTree::new(self.tree_config(n_features, seed));
                tree.grow(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        self.compute_feature_importances(n_features);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(TimefoldError::ModelNotFitted);
        }

        let per_tree: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<_>>()?;

        let mut positive = Array1::<f64>::zeros(x.nrows());
        for preds in &per_tree {
            positive += preds;
        }
        positive /= per_tree.len() as f64;
        Ok(two_column_proba(&positive))
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.feature_importances.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.2],
            [1.0, 1.0],
            [1.1, 1.1],
            [1.2, 1.2],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_classifier() {
        let (x, y) = separable();
        let mut rf = RandomForestConfig::new(10).with_random_state(42).build();
        rf.fit(&x, &y).unwrap();

        let positive = rf.predict_positive(&x).unwrap();
        let correct = positive
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count();
        assert!(correct >= 5, "only {} of 6 correct", correct);
    }

    #[test]
    fn test_predict_proba_rows_sum_to_one() {
        let (x, y) = separable();
        let mut rf = RandomForestConfig::new(10).build();
        rf.fit(&x, &y).unwrap();

        let proba = rf.predict_proba(&x).unwrap();
        assert_eq!(proba.shape(), &[6, 2]);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seeded_fits_are_reproducible() {
        let (x, y) = separable();
        let config = RandomForestConfig::new(8).with_random_state(7);
        let mut a = config.build();
        let mut b = config.build();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_feature_importances_normalized() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut rf = RandomForestConfig::new(10)
            .with_max_features(MaxFeatures::All)
            .build();
        rf.fit(&x, &y).unwrap();

        let importances = Classifier::feature_importances(&rf).unwrap();
        assert_eq!(importances.len(), 2);
        assert!(importances[0] >= importances[1]);
        assert!((importances.sum() - 1.0).abs() < 1e-9 || importances.sum() == 0.0);
    }

    #[test]
    fn test_set_param() {
        let mut config = RandomForestConfig::default();
        config.set_param("n_estimators", &ParamValue::Int(25)).unwrap();
        config.set_param("max_features", &ParamValue::from("log2")).unwrap();
        assert_eq!(config.n_estimators, 25);
        assert_eq!(config.max_features, MaxFeatures::Log2);
        assert!(config.set_param("max_features", &ParamValue::Float(1.5)).is_err());
        assert!(config.set_param("learning_rate", &ParamValue::Float(0.1)).is_err());
    }
}
