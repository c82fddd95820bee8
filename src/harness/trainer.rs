//! Out-of-fold training loop

use super::buffer::OutOfFoldBuffer;
use super::config::HarnessConfig;
use super::frame::PredictionFrame;
use super::result::{BoostingDiagnostics, ModelRunResult, ValidationScores};
use crate::data::Dataset;
use crate::error::{Result, TimefoldError};
use crate::evaluation::metrics::{accuracy, weighted_f1, weighted_precision, weighted_recall};
use crate::evaluation::{benchmark_target, binarize_at};
use crate::preprocessing::{prepare_targets, EmaSmoother};
use crate::splits::instantiate_splits;
use crate::training::params::format_params;
use crate::training::{BoostingClassifier, Classifier, Estimator, GridSearch, ParamGrid};
use ndarray::{Array1, Array2, Axis};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Train and test slices of one fold
pub struct FoldData {
    pub fold: usize,
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<f64>,
}

/// Drives fit/evaluate cycles over time-aware folds
///
/// Each fold builds a fresh model from the same estimator configuration, fits
/// on the fold's training rows and writes predictions for its test rows. Any
/// fold error aborts the whole run.
pub struct OutOfFoldTrainer<'a> {
    dataset: &'a Dataset,
    config: &'a HarnessConfig,
}

impl<'a> OutOfFoldTrainer<'a> {
    /// Validate the configuration against the dataset
    pub fn new(dataset: &'a Dataset, config: &'a HarnessConfig) -> Result<Self> {
        config.validate()?;
        if config.split_method.requires_groups() && dataset.groups().map_or(true, |g| g.is_empty()) {
            return Err(TimefoldError::ConfigError(format!(
                "split method '{}' requires a non-empty grouping frame",
                config.split_method
            )));
        }
        if dataset.n_rows() == 0 {
            return Err(TimefoldError::DataError("dataset has no rows".to_string()));
        }
        Ok(Self { dataset, config })
    }

    /// Run with a generic classifier backend
    pub fn run<E: Estimator>(&self, estimator: &E, grid: Option<&ParamGrid>) -> Result<ModelRunResult> {
        self.execute(estimator, grid, |model, data| model.fit(&data.x_train, &data.y_train))
    }

    /// Run with a boosting backend, early-stopping every fold on its test slice
    ///
    /// Holdout rows, when the dataset has them, are scored by every fold's model
    /// and averaged.
    pub fn run_boosting<E>(&self, estimator: &E, grid: Option<&ParamGrid>) -> Result<ModelRunResult>
    where
        E: Estimator,
        E::Model: BoostingClassifier,
    {
        let rounds = self.config.early_stopping_rounds;
        let holdout = self.dataset.holdout();
        let mut diagnostics = BoostingDiagnostics::default();
        let mut holdout_sum = holdout.map(|h| Array1::<f64>::zeros(h.nrows()));

        let mut result = self.execute(estimator, grid, |model, data| {
            let outcome = model.fit_with_validation(&data.x_train, &data.y_train, &data.x_test, &data.y_test, rounds)?;
            info!(
                fold = data.fold,
                best_iteration = outcome.best_iteration,
                train_auc = outcome.best_train_auc,
                validation_auc = outcome.best_valid_auc,
                "Early stopping"
            );
            diagnostics.best_iterations.push(outcome.best_iteration);
            diagnostics.train_auc.push(outcome.best_train_auc);
            diagnostics.validation_auc.push(outcome.best_valid_auc);

            if let (Some(x_holdout), Some(sum)) = (holdout, holdout_sum.as_mut()) {
                *sum += &model.predict_positive(x_holdout)?;
            }
            Ok(())
        })?;

        diagnostics.holdout_predictions = holdout_sum.map(|sum| sum / result.n_folds as f64);
        result.boosting = Some(diagnostics);
        Ok(result)
    }

    fn execute<E, F>(&self, estimator: &E, grid: Option<&ParamGrid>, mut fit_fold: F) -> Result<ModelRunResult>
    where
        E: Estimator,
        F: FnMut(&mut E::Model, &FoldData) -> Result<()>,
    {
        let start = Instant::now();
        let config = self.config;
        let features = self.dataset.features();
        let x = features.values();
        let groups = self.dataset.groups();
        let n_rows = self.dataset.n_rows();

        let targets = prepare_targets(self.dataset.target(), config.labeled, config.ema_gamma)?;
        let y = &targets.smoothed;

        let benchmark = config.benchmarks.then(|| benchmark_target(y, groups));

        let (outer, inner) = instantiate_splits(
            n_rows,
            config.n_splits,
            groups,
            config.split_method,
            &config.walk_forward,
        )?;

        let (estimator, best_params) = match grid.filter(|g| !g.is_empty()) {
            Some(grid) => {
                let search = GridSearch::fit(estimator, grid, inner, x, y)?;
                (estimator.with_params(&search.best_params)?, Some(search.best_params))
            }
            None => (estimator.clone(), None),
        };

        let train_smoother = if config.smooth_train_targets {
            Some(EmaSmoother::new(config.ema_gamma_train)?)
        } else {
            None
        };

        let mut buffer = OutOfFoldBuffer::new(n_rows);
        let mut scores = ValidationScores::default();
        let mut importance_sum = Array1::<f64>::zeros(features.n_features());
        let mut any_importances = false;
        let mut n_folds = 0;

        for (i, split) in outer.enumerate() {
            let fold = i + 1;
            let y_train = y.select(Axis(0), &split.train_indices);
            let data = FoldData {
                fold,
                x_train: features.select_rows(&split.train_indices),
                y_train: match &train_smoother {
                    Some(smoother) => smoother.smooth_labels(&y_train),
                    None => y_train,
                },
                x_test: features.select_rows(&split.test_indices),
                y_test: y.select(Axis(0), &split.test_indices),
            };
            debug!(
                fold,
                train_rows = data.x_train.nrows(),
                test_rows = data.x_test.nrows(),
                "Fitting fold"
            );

            let mut model = estimator.build();
            fit_fold(&mut model, &data)?;

            let probabilities = model.predict_positive(&data.x_test)?;
            let threshold = match &config.threshold_search {
                Some(search) => search.search(&data.y_test, &probabilities)?,
                None => config.fixed_threshold,
            };
            let predictions = binarize_at(&probabilities, threshold);
            buffer.write_fold(fold, &split.test_indices, &probabilities, threshold, &predictions)?;

            let fold_accuracy = accuracy(&data.y_test, &predictions);
            scores.push(
                weighted_precision(&data.y_test, &predictions),
                weighted_recall(&data.y_test, &predictions),
                fold_accuracy,
                weighted_f1(&data.y_test, &predictions),
            );

            if let Some(importances) = model.feature_importances() {
                if importances.len() != importance_sum.len() {
                    return Err(TimefoldError::ShapeError {
                        expected: format!("{} feature importances", importance_sum.len()),
                        actual: format!("{} feature importances", importances.len()),
                    });
                }
                importance_sum += &importances;
                any_importances = true;
            }

            info!(
                fold,
                train_rows = data.x_train.nrows(),
                test_rows = data.x_test.nrows(),
                threshold,
                accuracy = fold_accuracy,
                "Fold complete"
            );
            n_folds = fold;
        }

        if n_folds == 0 {
            return Err(TimefoldError::TrainingError(format!(
                "split method '{}' produced no folds for {} rows",
                config.split_method, n_rows
            )));
        }

        let importances = if any_importances {
            let mut pairs: Vec<(String, f64)> = features
                .names()
                .iter()
                .cloned()
                .zip(importance_sum.iter().map(|v| v / n_folds as f64))
                .collect();
            pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
            pairs
        } else {
            Vec::new()
        };

        let uncovered_rows = buffer.uncovered_rows();
        if uncovered_rows > 0 {
            warn!(uncovered_rows, n_rows, "Rows never tested by any fold have no out-of-fold prediction");
        }

        let predictions = PredictionFrame::from_buffer(
            buffer,
            y,
            groups.map(|g| g.entities().to_vec()),
            &config.ticker,
            &config.label,
        );

        let elapsed_secs = start.elapsed().as_secs_f64();
        info!(
            label = %config.label,
            folds = n_folds,
            elapsed_secs,
            precision = scores.mean_precision(),
            recall = scores.mean_recall(),
            accuracy = scores.mean_accuracy(),
            f1 = scores.mean_f1(),
            best_params = %best_params.as_ref().map(format_params).unwrap_or_default(),
            "Run complete"
        );
        for (name, value) in importances.iter().take(5) {
            debug!(feature = %name, importance = value, "Top feature");
        }

        Ok(ModelRunResult {
            predictions,
            importances,
            scores,
            best_params,
            boosting: None,
            n_folds,
            uncovered_rows,
            n_targets_changed: targets.n_changed,
            benchmark,
            elapsed_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureMatrix;
    use crate::splits::SplitMethod;
    use crate::training::{DecisionTreeConfig, EarlyStoppingOutcome, LightGBMConfig, ParamValue};
    use ndarray::s;
    use std::sync::{Arc, Mutex};

    type Fits = Arc<Mutex<Vec<(Array1<f64>, Array1<f64>)>>>;

    /// Records the train and validation labels of every fold it is fitted on
    #[derive(Clone, Default)]
    struct RecordingEstimator {
        fits: Fits,
    }

    struct RecordingModel {
        fits: Fits,
    }

    impl Estimator for RecordingEstimator {
        type Model = RecordingModel;

        fn build(&self) -> RecordingModel {
            RecordingModel {
                fits: Arc::clone(&self.fits),
            }
        }

        fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
            Err(TimefoldError::invalid_parameter(name, value, "no parameters"))
        }
    }

    impl Classifier for RecordingModel {
        fn fit(&mut self, _x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
            self.fits.lock().unwrap().push((y.clone(), Array1::zeros(0)));
            Ok(())
        }

        fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
            Ok(Array2::from_elem((x.nrows(), 2), 0.5))
        }
    }

    impl BoostingClassifier for RecordingModel {
        fn fit_with_validation(
            &mut self,
            _x_train: &Array2<f64>,
            y_train: &Array1<f64>,
            _x_valid: &Array2<f64>,
            y_valid: &Array1<f64>,
            _early_stopping_rounds: usize,
        ) -> Result<EarlyStoppingOutcome> {
            self.fits.lock().unwrap().push((y_train.clone(), y_valid.clone()));
            Ok(EarlyStoppingOutcome {
                best_iteration: 1,
                best_train_auc: 0.5,
                best_valid_auc: 0.5,
            })
        }
    }

    /// 50 alternating labels starting with 1
    fn alternating_dataset() -> (Dataset, Array1<f64>) {
        let x = Array2::from_shape_fn((50, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(50, |i| if i % 2 == 0 { 1.0 } else { 0.0 });
        (Dataset::new(FeatureMatrix::unnamed(x), y.clone()).unwrap(), y)
    }

    fn step_dataset(n: usize) -> Dataset {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { (i % 2) as f64 } else { (i % 7) as f64 });
        let y = Array1::from_shape_fn(n, |i| if i % 2 == 1 { 1.0 } else { -1.0 });
        Dataset::new(FeatureMatrix::unnamed(x), y).unwrap()
    }

    #[test]
    fn test_generic_run() {
        let dataset = step_dataset(50);
        let config = HarnessConfig::new().with_n_splits(4).with_label("tree");
        let result = OutOfFoldTrainer::new(&dataset, &config)
            .unwrap()
            .run(&DecisionTreeConfig::default(), None)
            .unwrap();

        assert_eq!(result.n_folds, 4);
        assert_eq!(result.scores.n_folds(), 4);
        // 50 / (4 + 1) leading rows are training-only
        assert_eq!(result.uncovered_rows, 10);
        assert!((result.scores.mean_accuracy() - 1.0).abs() < 1e-12);
        assert_eq!(result.importances[0].0, "feature_0");
        assert!(result.boosting.is_none());
    }

    #[test]
    fn test_train_smoothing_changes_train_labels_only() {
        let (dataset, y) = alternating_dataset();
        let config = HarnessConfig::new()
            .with_labeled(true)
            .with_n_splits(4)
            .with_train_smoothing(0.5);
        let estimator = RecordingEstimator::default();
        OutOfFoldTrainer::new(&dataset, &config)
            .unwrap()
            .run_boosting(&estimator, None)
            .unwrap();

        let smoother = EmaSmoother::new(0.5).unwrap();
        let fits = estimator.fits.lock().unwrap();
        assert_eq!(fits.len(), 4);
        for (k, (y_train, y_valid)) in fits.iter().enumerate() {
            let test_start = 10 * (k + 1);
            let raw_train = y.slice(s![..test_start]).to_owned();
            assert_eq!(y_train, &smoother.smooth_labels(&raw_train));
            // ema[0] = 0.5 does not clear the 0.5 cutoff, so the leading 1 flips
            assert_ne!(y_train, &raw_train, "fold {} trained on raw labels", k + 1);
            assert_eq!(y_valid, &y.slice(s![test_start..test_start + 10]).to_owned());
        }
    }

    #[test]
    fn test_train_labels_untouched_without_smoothing() {
        let (dataset, y) = alternating_dataset();
        let config = HarnessConfig::new().with_labeled(true).with_n_splits(4);
        let estimator = RecordingEstimator::default();
        OutOfFoldTrainer::new(&dataset, &config)
            .unwrap()
            .run(&estimator, None)
            .unwrap();

        let fits = estimator.fits.lock().unwrap();
        assert_eq!(fits.len(), 4);
        for (k, (y_train, _)) in fits.iter().enumerate() {
            assert_eq!(y_train, &y.slice(s![..10 * (k + 1)]).to_owned());
        }
    }

    #[test]
    fn test_train_smoothing_default_gamma_is_pass_through() {
        let (dataset, y) = alternating_dataset();
        let mut config = HarnessConfig::new().with_labeled(true).with_n_splits(4);
        config.smooth_train_targets = true;
        let estimator = RecordingEstimator::default();
        OutOfFoldTrainer::new(&dataset, &config)
            .unwrap()
            .run(&estimator, None)
            .unwrap();

        let fits = estimator.fits.lock().unwrap();
        for (k, (y_train, _)) in fits.iter().enumerate() {
            assert_eq!(y_train, &y.slice(s![..10 * (k + 1)]).to_owned());
        }
    }

    #[test]
    fn test_panel_method_without_groups_fails_fast() {
        let dataset = step_dataset(20);
        let config = HarnessConfig::new().with_split_method(SplitMethod::Panel);
        let err = OutOfFoldTrainer::new(&dataset, &config).err().unwrap();
        assert!(matches!(err, TimefoldError::ConfigError(_)));
    }

    #[test]
    fn test_no_folds_is_error() {
        let dataset = step_dataset(30);
        let config = HarnessConfig::new().with_split_method(SplitMethod::TimeSeriesRecursive);
        // Default walk-forward needs 252 training rows
        let err = OutOfFoldTrainer::new(&dataset, &config)
            .unwrap()
            .run(&DecisionTreeConfig::default(), None)
            .unwrap_err();
        assert!(matches!(err, TimefoldError::TrainingError(_)));
    }

    #[test]
    fn test_boosting_run_records_diagnostics() {
        let x = Array2::from_shape_fn((80, 2), |(i, j)| if j == 0 { (i % 2) as f64 } else { i as f64 });
        let y = Array1::from_shape_fn(80, |i| (i % 2) as f64);
        let holdout = Array2::from_shape_fn((3, 2), |(i, _)| i as f64);
        let dataset = Dataset::new(FeatureMatrix::unnamed(x), y)
            .unwrap()
            .with_holdout(holdout)
            .unwrap();
        let config = HarnessConfig::new()
            .with_labeled(true)
            .with_n_splits(3)
            .with_early_stopping_rounds(5);
        let lgbm = LightGBMConfig {
            n_estimators: 50,
            learning_rate: 0.1,
            min_child_samples: 2,
            ..Default::default()
        };

        let result = OutOfFoldTrainer::new(&dataset, &config)
            .unwrap()
            .run_boosting(&lgbm, None)
            .unwrap();
        let boosting = result.boosting.unwrap();
        assert_eq!(boosting.best_iterations.len(), 3);
        assert!(boosting.best_iterations.iter().all(|&it| it >= 1 && it <= 50));
        let holdout = boosting.holdout_predictions.unwrap();
        assert_eq!(holdout.len(), 3);
        assert!(holdout.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}
