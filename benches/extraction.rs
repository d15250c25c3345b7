use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spatio_temporal_hulls::{
    hull::FeatureSet,
    Batch, Coloring, FeatureMode, HullField, IsosurfaceExtractor, Marching,
};

/// A solid ball of labels, the worst realistic case for surface size.
fn ball(n: usize) -> HullField {
    let c = (n as f32 - 1.0) / 2.0;
    let r2 = (n as f32 / 3.0).powi(2);
    HullField::from_shape_fn((n, n, n), |(z, y, x)| {
        let d2 = (x as f32 - c).powi(2) + (y as f32 - c).powi(2) + (z as f32 - c).powi(2);
        if d2 <= r2 {
            255.0 - d2
        } else {
            0.0
        }
    })
}

/// A bright sphere moving along x.
fn moving_sphere(frames: usize, n: usize) -> Batch {
    let c = n as f32 / 2.0;
    Batch::from_shape_fn((frames, n, n, n), |(t, z, y, x)| {
        let cx = 2.0 + t as f32;
        let d2 = (x as f32 - cx).powi(2) + (y as f32 - c).powi(2) + (z as f32 - c).powi(2);
        if d2 <= 9.0 {
            1.0
        } else {
            0.0
        }
    })
}

fn bench_marching_cubes(c: &mut Criterion) {
    let mut group = c.benchmark_group("marching_cubes");
    for n in [32usize, 64] {
        let field = ball(n);
        let mut extractor = IsosurfaceExtractor::new(Marching::Cubes);
        group.bench_with_input(BenchmarkId::from_parameter(n), &field, |b, field| {
            b.iter(|| {
                let mesh = extractor.extract(black_box(field.view()), Coloring::ByValue);
                black_box(mesh.face_count())
            })
        });
    }
    group.finish();
}

fn bench_feature_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_field");
    let batch = moving_sphere(8, 32);
    for mode in [FeatureMode::Full, FeatureMode::Diagonal, FeatureMode::Motion] {
        let features = FeatureSet::new(mode, [3, 3, 3, 3], true).unwrap();
        group.bench_with_input(BenchmarkId::new("mode", format!("{:?}", mode)), &batch, |b, batch| {
            b.iter(|| black_box(features.evaluate(black_box(batch.view()))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_marching_cubes, bench_feature_field);
criterion_main!(benches);
