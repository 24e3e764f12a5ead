use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use data_augmentation::transforms::vision::{Brightness, Crop, CropMode, Flip, FlipAxis, Noise};
use data_augmentation::transforms::{BaseTransform, Stream, TransformParams};
use data_augmentation::{DataContainer, Frame, Item, KeyPoints};
use image::{DynamicImage, GrayImage, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Benchmarks for `Stream` throughput over one image + mask + keypoints
/// sample.
///
/// This measures:
/// 1. Dispatch overhead: a geometric-only stream on tiny images
/// 2. Pixel work: photometric and noise stages on growing images
///
/// To run these, use:
/// ```bash
/// cargo bench --bench stream_bench
/// ```

/// Square image sides swept by the pixel-work benchmark.
const SIDES: [u32; 3] = [32, 128, 512];

fn make_sample(side: u32) -> DataContainer {
    let kpts = KeyPoints::new(vec![[1.0, 1.0], [side as f32 - 2.0, 0.0]], Frame::new(side, side))
        .expect("valid keypoints");
    DataContainer::from_items(vec![
        Item::Image(DynamicImage::ImageRgb8(RgbImage::new(side, side))),
        Item::Mask(GrayImage::new(side, side)),
        Item::KeyPoints(kpts),
        Item::from(1_i64),
    ])
}

fn geometric_stream() -> Stream {
    Stream::new()
        .push(Flip::new(FlipAxis::Horizontal).with_params(TransformParams::always()))
        .push(Flip::new(FlipAxis::Vertical).with_params(TransformParams::default()))
}

fn pixel_stream(side: u32) -> Stream {
    Stream::new()
        .push(
            Crop::new(Some(Frame::new(side / 2, side / 2)), CropMode::Random)
                .expect("valid crop")
                .with_params(TransformParams::always()),
        )
        .push(Brightness::new((-30.0, 30.0)).expect("valid range").with_params(TransformParams::always()))
        .push(Noise::new((0.1, 0.3)).expect("valid range").with_params(TransformParams::always()))
}

/// Measure per-call overhead of decide + dispatch
fn bench_dispatch(c: &mut Criterion) {
    let stream = geometric_stream();
    let dc = make_sample(4);
    let mut rng = StdRng::seed_from_u64(0);
    c.bench_function("geometric stream 4x4", |b| {
        b.iter(|| black_box(stream.call(&dc, &mut rng).expect("stream call")))
    });
}

/// Measure stream calls with per-pixel stages
fn bench_pixel_work(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pixel Stages");
    for &side in &SIDES {
        let stream = pixel_stream(side);
        let dc = make_sample(side);
        let mut rng = StdRng::seed_from_u64(0);
        group.throughput(Throughput::Elements(u64::from(side) * u64::from(side)));

        group.bench_with_input(BenchmarkId::new("crop+brightness+noise", side), &dc, |b, dc| {
            b.iter(|| black_box(stream.call(dc, &mut rng).expect("stream call")))
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(2))
        .measurement_time(std::time::Duration::from_secs(5))
        .sample_size(50);
    targets = bench_dispatch, bench_pixel_work
);
criterion_main!(benches);
