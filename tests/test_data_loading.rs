//! Integration tests for CSV loading into datasets and prediction export

use std::io::Write;
use tempfile::NamedTempFile;
use timefold::data::{ColumnSelection, DataLoader};
use timefold::harness::{HarnessConfig, OutOfFoldTrainer};
use timefold::splits::SplitMethod;
use timefold::training::DecisionTreeConfig;
use timefold::TimefoldError;

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn panel_csv(n_days: usize) -> String {
    let mut csv = String::from("ticker,date_of_transaction,momentum,volume,target\n");
    for day in 0..n_days {
        for (e, ticker) in ["AAPL", "MSFT"].iter().enumerate() {
            let sign = if day % 2 == 0 { 1.0 } else { -1.0 };
            csv.push_str(&format!(
                "{},2020-01-{:02},{},{},{}\n",
                ticker,
                day + 1,
                sign * (1.0 + e as f64 * 0.1),
                100 + day * 10 + e,
                sign * 0.02
            ));
        }
    }
    csv
}

#[test]
fn test_load_panel_dataset() {
    let file = write_csv(&panel_csv(5));
    let loader = DataLoader::new();
    let df = loader.load_csv(file.path()).unwrap();
    assert_eq!(df.height(), 10);

    let selection = ColumnSelection::new("target")
        .with_entity("ticker")
        .with_time("date_of_transaction");
    let dataset = loader.dataset_from_frame(&df, &selection).unwrap();

    assert_eq!(dataset.n_rows(), 10);
    assert_eq!(dataset.features().names(), &["momentum".to_string(), "volume".to_string()]);
    let groups = dataset.groups().unwrap();
    assert_eq!(groups.entities()[1], "MSFT");
    // Both tickers on the same date share a time identifier
    assert_eq!(groups.times()[0], groups.times()[1]);
    assert_eq!(groups.times()[2] - groups.times()[0], 1);
}

#[test]
fn test_explicit_feature_selection() {
    let file = write_csv(&panel_csv(3));
    let loader = DataLoader::new();
    let df = loader.load_csv(file.path()).unwrap();
    let selection = ColumnSelection::new("target").with_features(vec!["volume".to_string()]);
    let dataset = loader.dataset_from_frame(&df, &selection).unwrap();
    assert_eq!(dataset.features().n_features(), 1);
    assert!(dataset.groups().is_none());
}

#[test]
fn test_missing_target_column() {
    let file = write_csv("a,b\n1,2\n3,4\n");
    let loader = DataLoader::new();
    let df = loader.load_csv(file.path()).unwrap();
    let err = loader
        .dataset_from_frame(&df, &ColumnSelection::new("target"))
        .unwrap_err();
    assert!(matches!(err, TimefoldError::ColumnNotFound(_)));
}

#[test]
fn test_holdout_uses_training_columns() {
    let train = write_csv(&panel_csv(4));
    let holdout = write_csv("volume,momentum,extra\n5,0.5,9\n6,-0.5,9\n");
    let loader = DataLoader::new();
    let dataset = loader
        .dataset_from_frame(&loader.load_csv(train.path()).unwrap(), &ColumnSelection::new("target"))
        .unwrap();
    let x = loader
        .holdout_from_frame(&loader.load_csv(holdout.path()).unwrap(), &dataset)
        .unwrap();
    assert_eq!(x.shape(), &[2, 2]);
    // Columns follow the training order: momentum, volume
    assert_eq!(x[[0, 0]], 0.5);
    assert_eq!(x[[0, 1]], 5.0);
}

#[test]
fn test_csv_to_prediction_file() {
    let file = write_csv(&panel_csv(30));
    let loader = DataLoader::new();
    let df = loader.load_csv(file.path()).unwrap();
    let selection = ColumnSelection::new("target")
        .with_entity("ticker")
        .with_time("date_of_transaction");
    let dataset = loader.dataset_from_frame(&df, &selection).unwrap();

    let config = HarnessConfig::new()
        .with_split_method(SplitMethod::Panel)
        .with_n_splits(4)
        .with_label("tree");
    let result = OutOfFoldTrainer::new(&dataset, &config)
        .unwrap()
        .run(&DecisionTreeConfig::default(), None)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("predictions.csv");
    result.predictions.write_csv(&out).unwrap();

    let written = loader.load_csv(&out).unwrap();
    assert_eq!(written.height(), 60);
    assert!(written.column("entity").is_ok());
    assert_eq!(written.column("probability").unwrap().null_count(), result.uncovered_rows);
}
