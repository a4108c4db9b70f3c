//! Benchmarks for smoothing filter performance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use head_orientation::filters::{
    exponential::ExponentialFilter, median::MedianFilter, moving_average::MovingAverageFilter, NoFilter,
    OrientationFilter,
};

fn benchmark_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    // Test data - simulating a noisy orientation signal
    let test_data: Vec<f64> = (0..100)
        .map(|i| {
            let t = f64::from(i) * 0.1;
            0.8 * t.sin() + 0.05 * (rand::random::<f64>() - 0.5)
        })
        .collect();

    let filter_configs = vec![
        ("no_filter", Box::new(NoFilter) as Box<dyn OrientationFilter>),
        ("moving_average_5", Box::new(MovingAverageFilter::new(5))),
        ("moving_average_15", Box::new(MovingAverageFilter::new(15))),
        ("median_5", Box::new(MedianFilter::new(5))),
        ("median_9", Box::new(MedianFilter::new(9))),
        ("exponential_0.5", Box::new(ExponentialFilter::new(0.5))),
    ];

    for (name, mut filter) in filter_configs {
        group.bench_with_input(BenchmarkId::new("single_update", name), &test_data[0], |b, &value| {
            b.iter(|| black_box(filter.apply(black_box(value))));
        });

        group.bench_with_input(BenchmarkId::new("sequence_100", name), &test_data, |b, data| {
            b.iter(|| {
                filter.reset();
                for &value in data {
                    black_box(filter.apply(black_box(value)));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_median_sorting(c: &mut Criterion) {
    let mut group = c.benchmark_group("median_sorting");

    for window_size in [5, 9, 15, 21] {
        let mut median = MedianFilter::new(window_size);

        group.bench_with_input(BenchmarkId::new("window_size", window_size), &window_size, |b, &size| {
            b.iter(|| {
                median.reset();
                for i in 0..size {
                    black_box(median.apply(black_box(i as f64)));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_filters, benchmark_median_sorting);
criterion_main!(benches);
