use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::polygon;
use rainwater_potential::analyzers::RainwaterAnalyzer;
use rainwater_potential::models::{
    CategoryThresholds, Dataset, Footprint, PrecipitationRecord, PrecipitationSource,
};
use rainwater_potential::processors::{PotentialClassifier, VolumeCalculator};

// Synthetic footprints with a spread of roof areas
fn create_test_dataset(count: usize) -> Dataset {
    (0..count)
        .map(|i| {
            let offset = i as f64 * 0.0002;
            let outline = polygon![
                (x: 9.31 + offset, y: 48.70),
                (x: 9.3101 + offset, y: 48.70),
                (x: 9.3101 + offset, y: 48.7001),
                (x: 9.31 + offset, y: 48.7001),
                (x: 9.31 + offset, y: 48.70),
            ];
            let area = 40.0 + ((i * 37) % 500) as f64;
            Footprint::from_polygon(outline, area).with_building_tag("house")
        })
        .collect()
}

fn precipitation() -> PrecipitationRecord {
    PrecipitationRecord::new(812.3, 2023, PrecipitationSource::Configured)
        .unwrap_or_else(|e| panic!("invalid benchmark precipitation: {}", e))
}

fn benchmark_volume_calculator(c: &mut Criterion) {
    let dataset = create_test_dataset(5_000);
    let calculator = VolumeCalculator::new(&precipitation());

    c.bench_function("volume_calculator", |b| {
        b.iter(|| {
            let mut working = dataset.clone();
            calculator.apply(&mut working).ok();
            black_box(VolumeCalculator::total_liters(&working))
        })
    });
}

fn benchmark_thresholds(c: &mut Criterion) {
    let volumes: Vec<f64> = (0..10_000).map(|i| ((i * 7919) % 10_000) as f64).collect();

    c.bench_function("category_thresholds", |b| {
        b.iter(|| black_box(CategoryThresholds::from_volumes(&volumes)))
    });
}

fn benchmark_classify_and_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_and_aggregate_by_size");
    let calculator = VolumeCalculator::new(&precipitation());

    for &size in &[100, 1_000, 10_000] {
        let mut dataset = create_test_dataset(size);
        calculator.apply(&mut dataset).ok();

        group.bench_with_input(BenchmarkId::new("footprints", size), &dataset, |b, dataset| {
            b.iter(|| {
                let mut working = dataset.clone();
                let report = PotentialClassifier::new()
                    .classify(&mut working)
                    .and_then(|thresholds| RainwaterAnalyzer::new().analyze(&working, &thresholds));
                black_box(report.map(|r| r.total_volume_liters).unwrap_or(0.0))
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_volume_calculator,
    benchmark_thresholds,
    benchmark_classify_and_aggregate
);
criterion_main!(benches);
