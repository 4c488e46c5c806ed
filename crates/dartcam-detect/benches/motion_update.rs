use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dartcam_core::GrayImage;
use dartcam_detect::{
    BlobClusterer, HullTriangle, MotionAnalyzer, MotionParams, StrikeRegistry, TipEstimator,
};
use std::time::{Duration, Instant};

fn textured(w: usize, h: usize, shift: usize) -> GrayImage {
    let data = (0..w * h)
        .map(|i| {
            let (x, y) = (i % w, i / w);
            (((x + shift) * 7 + y * 13) % 200) as u8
        })
        .collect();
    GrayImage::from_raw(w, h, data).expect("buffer")
}

fn bench_motion(c: &mut Criterion) {
    let background = textured(640, 480, 0);
    let mut frame = background.clone();
    for y in 200..260 {
        for x in 300..330 {
            frame.set(x, y, 255);
        }
    }

    c.bench_function("motion_update_640x480", |b| {
        let mut analyzer = MotionAnalyzer::new(MotionParams::default()).expect("params");
        let mut registry = StrikeRegistry::default();
        let base = Instant::now();
        analyzer.update(&background, base, &mut registry);
        let mut k = 1u32;
        b.iter(|| {
            let now = base + Duration::from_millis(33 * k as u64);
            k += 1;
            black_box(analyzer.update(black_box(&frame), now, &mut registry).motion_level)
        })
    });

    let mut analyzer = MotionAnalyzer::new(MotionParams::default()).expect("params");
    let mut registry = StrikeRegistry::default();
    let base = Instant::now();
    analyzer.update(&background, base, &mut registry);
    let mask = analyzer
        .update(&frame, base + Duration::from_millis(33), &mut registry)
        .mask;
    let clusterer = BlobClusterer::default();
    let tip = HullTriangle::default();

    c.bench_function("cluster_and_tip", |b| {
        b.iter(|| {
            let group = clusterer.largest(black_box(&mask));
            black_box(group.and_then(|g| tip.estimate(&g.merged_points())))
        })
    });
}

criterion_group!(benches, bench_motion);
criterion_main!(benches);
