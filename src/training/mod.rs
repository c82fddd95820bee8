//! Classifier backends and hyperparameter search
//!
//! Provides:
//! - The `Classifier` / `BoostingClassifier` capability traits and the
//!   `Estimator` trait for building fresh models per fold
//! - Decision trees and Random Forests
//! - Gradient boosting and LightGBM-style leaf-wise boosting with early stopping
//! - Parameter grids and exhaustive grid search

pub mod classifier;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod lightgbm;
pub mod params;
pub mod random_forest;
pub mod search;

pub use classifier::{BoostingClassifier, Classifier, EarlyStoppingOutcome, Estimator};
pub use decision_tree::{Criterion, DecisionTree, DecisionTreeConfig, TreeNode};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use lightgbm::{BoostingType, ClassWeight, LightGBMClassifier, LightGBMConfig};
pub use params::{format_params, ParamGrid, ParamSet, ParamValue};
pub use random_forest::{MaxFeatures, RandomForest, RandomForestConfig};
pub use search::{CandidateScore, GridSearch, GridSearchResult};
