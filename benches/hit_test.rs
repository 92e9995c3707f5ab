use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crossline::editor::{HitTester, Line, SurfacePoint, SurfaceSize, ToleranceBand};

fn bench_classify(c: &mut Criterion) {
    let size = SurfaceSize::new(1920.0, 1080.0);
    let line = Line::new(0.1, 0.3, 0.9, 0.7);
    let tester = HitTester::with_band(ToleranceBand::default());
    let pointers: Vec<SurfacePoint> = (0..1_000)
        .map(|i| {
            let t = i as f64 / 1_000.0;
            SurfacePoint::new(t * size.width, (1.0 - t) * size.height)
        })
        .collect();

    c.bench_function("classify_1k_pointers", |b| {
        b.iter(|| {
            pointers
                .iter()
                .filter(|p| tester.classify(black_box(**p), &line, size).is_some())
                .count()
        })
    });
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
