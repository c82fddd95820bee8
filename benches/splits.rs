use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use timefold::data::{Dataset, FeatureMatrix, PanelFrame};
use timefold::harness::{HarnessConfig, OutOfFoldTrainer};
use timefold::splits::{instantiate_splits, SplitMethod, WalkForwardConfig};
use timefold::training::RandomForestConfig;

fn create_panel(n_days: usize, n_entities: usize) -> PanelFrame {
    let mut entities = Vec::with_capacity(n_days * n_entities);
    let mut times = Vec::with_capacity(n_days * n_entities);
    for day in 0..n_days {
        for e in 0..n_entities {
            entities.push(format!("E{}", e));
            times.push(day as i64);
        }
    }
    PanelFrame::new(entities, times).unwrap()
}

fn create_dataset(n_rows: usize, n_features: usize) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 2.0 - 1.0);
    let y = Array1::from_shape_fn(n_rows, |i| x[[i, 0]] + 0.1 * rng.gen::<f64>());
    Dataset::new(FeatureMatrix::unnamed(x), y).unwrap()
}

fn bench_split_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("splits");

    for n_days in [500, 2000].iter() {
        let groups = create_panel(*n_days, 20);
        let n_rows = groups.len();

        for method in [SplitMethod::TimeSeries, SplitMethod::Panel, SplitMethod::PanelWindow] {
            group.bench_with_input(
                BenchmarkId::new(method.as_str(), n_days),
                &groups,
                |b, groups| {
                    b.iter(|| {
                        let (folds, _) = instantiate_splits(
                            n_rows,
                            5,
                            Some(groups),
                            method,
                            &WalkForwardConfig::default(),
                        )
                        .unwrap();
                        black_box(folds.map(|s| s.test_indices.len()).sum::<usize>())
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_out_of_fold_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("out_of_fold");
    group.sample_size(10);

    let dataset = create_dataset(2000, 10);
    let config = HarnessConfig::new().with_n_splits(4);
    let estimator = RandomForestConfig::new(20).with_max_depth(8);

    group.bench_function("random_forest_ts", |b| {
        b.iter(|| {
            OutOfFoldTrainer::new(black_box(&dataset), &config)
                .unwrap()
                .run(&estimator, None)
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_split_generation, bench_out_of_fold_run);
criterion_main!(benches);
