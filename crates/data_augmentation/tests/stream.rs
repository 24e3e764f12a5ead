//! Composition tests for `Stream` and `SelectiveStream`.
//!
//! Tests cover:
//! - Nesting streams is the same as flattening them
//! - Seeded reproducibility through the thread-local generator
//! - Spatial consistency between images, masks and keypoints
//! - Failure propagation and chaining into the exporter

mod common;
use common::*;

use data_augmentation::{
    error_kind,
    rng::{init_rng, reset_rng},
    transforms::{
        vision::{Brightness, Crop, CropMode, Flip, FlipAxis, Noise, Rotate90, HSV},
        BaseTransform, SelectiveStream, Stream, Transform, TransformParams,
    },
    DataContainer, ErrorKind, Export, ExportOptions, Exported, Frame, Item, KeyPoints,
};

use anyhow::{bail, Result};
use image::{DynamicImage, GrayImage, Luma};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Common Helper Functions
// ============================================================================

/// A 6x5 dark image with one bright marker, a matching mask and a
/// keypoint on the marker.
fn marked_sample() -> Result<DataContainer> {
    let mut img = GrayImage::new(6, 5);
    img.put_pixel(4, 1, Luma([255]));
    let kpts = KeyPoints::new(vec![[4.0, 1.0]], Frame::new(5, 6))?;
    DataContainer::new(
        vec![
            Item::Image(DynamicImage::ImageLuma8(img.clone())),
            Item::Mask(img),
            Item::KeyPoints(kpts),
            Item::from(0_i64),
        ],
        "IMPL",
    )
}

fn marker(img: &GrayImage) -> Option<[f32; 2]> {
    img.enumerate_pixels()
        .find(|(_, _, px)| px[0] == 255)
        .map(|(x, y, _)| [x as f32, y as f32])
}

fn always() -> TransformParams {
    TransformParams::always()
}

fn noisy_stages() -> Result<Vec<Box<dyn BaseTransform>>> {
    let stages: Vec<Box<dyn BaseTransform>> = vec![
        Box::new(Brightness::new((-40.0, 40.0))?.with_params(always())),
        Box::new(Crop::new(Some(Frame::new(4, 4)), CropMode::Random)?.with_params(always())),
        Box::new(Noise::new((0.2, 0.6))?.with_params(always())),
    ];
    Ok(stages)
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn test_nested_stream_equals_flat_stream() -> Result<()> {
    let dc = DataContainer::from_image(img_6x6());

    let flat = Stream::from_transforms(noisy_stages()?);
    let mut stages = noisy_stages()?;
    let rest = stages.split_off(1);
    stages.push(Box::new(Stream::from_transforms(rest)));
    let nested = Stream::from_transforms(stages);

    for seed in 0..5 {
        let a = flat.call(&dc, &mut StdRng::seed_from_u64(seed))?;
        let b = nested.call(&dc, &mut StdRng::seed_from_u64(seed))?;
        assert_eq!(a, b);
    }
    Ok(())
}

#[test]
fn test_empty_stream_is_identity() -> Result<()> {
    let dc = marked_sample()?;
    assert_eq!(Stream::new().call(&dc, &mut rng())?, dc);
    Ok(())
}

#[test]
fn test_spatial_items_stay_consistent() -> Result<()> {
    let stream = Stream::new()
        .push(Flip::new(FlipAxis::Horizontal).with_params(TransformParams::new(Some(0.5))?))
        .push(Rotate90::new(1).with_params(TransformParams::new(Some(0.5))?))
        .push(Flip::new(FlipAxis::Vertical).with_params(TransformParams::new(Some(0.5))?))
        .push(Crop::new(Some(Frame::new(3, 3)), CropMode::Random)?.with_params(always()));
    let dc = marked_sample()?;

    let mut rng = rng();
    for _ in 0..50 {
        let out = stream.call(&dc, &mut rng)?;
        let (Some(Item::Image(img)), Some(Item::Mask(mask)), Some(Item::KeyPoints(kpts))) =
            (out.item(0), out.item(1), out.item(2))
        else {
            bail!("unexpected layout {}", out.codes());
        };
        let img = img.to_luma8();
        assert_eq!(img, *mask);
        assert_eq!(kpts.frame(), Frame::new(3, 3));

        let [x, y] = kpts.points()[0];
        match marker(&img) {
            Some(found) => assert_eq!(found, [x, y]),
            None => assert!(x < 0.0 || y < 0.0 || x >= 3.0 || y >= 3.0),
        }
        assert_eq!(out.item(3), dc.item(3));
    }
    Ok(())
}

#[test]
fn test_failing_stage_aborts_with_context() -> Result<()> {
    let stream = Stream::new()
        .push(Flip::new(FlipAxis::Horizontal).with_params(always()))
        .push(HSV::new((10.0, 10.0), (0.0, 0.0), (0.0, 0.0))?.with_params(always()));
    let err = stream.call(&DataContainer::from_image(img_3x3()), &mut rng()).unwrap_err();

    assert_eq!(error_kind(&err), Some(ErrorKind::Value));
    assert!(format!("{err:#}").contains("Stream stage 1 (HSV) failed"));
    Ok(())
}

// ============================================================================
// Seeding
// ============================================================================

#[test]
fn test_thread_rng_reproducibility() -> Result<()> {
    let stream = Stream::from_transforms(noisy_stages()?);
    let dc = DataContainer::from_image(img_6x6());

    init_rng(7, 0);
    let first = stream.apply(dc.clone())?;
    init_rng(7, 0);
    let second = stream.apply(dc.clone())?;
    init_rng(7, 1);
    let other = stream.apply(dc.clone())?;
    reset_rng();

    assert_eq!(first, second);
    assert_ne!(first, other);
    Ok(())
}

#[test]
fn test_stream_chains_into_export() -> Result<()> {
    let stream = Stream::new().push(Flip::new(FlipAxis::Horizontal).with_params(always()));
    let pipeline = stream.then(Export::new(ExportOptions::builder().return_tensor(true).build())?);

    let out = pipeline.apply(marked_sample()?)?;
    let Exported::Dict(map) = out else { bail!("expected a dict") };
    let keys: Vec<_> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["image", "keypoints", "label", "mask"]);
    Ok(())
}

// ============================================================================
// SelectiveStream
// ============================================================================

#[test]
fn test_selective_stream_zero_weight_never_runs() -> Result<()> {
    let selective = SelectiveStream::new(
        vec![
            Box::new(Brightness::new((50.0, 50.0))?.with_params(always())),
            Box::new(Flip::new(FlipAxis::Horizontal).with_params(always())),
        ],
        1,
        Some(vec![0.0, 1.0]),
    )?;
    let flip = Flip::new(FlipAxis::Horizontal).with_params(always());
    let dc = marked_sample()?;

    let mut rng = rng();
    let expected = flip.call(&dc, &mut rng)?;
    for _ in 0..20 {
        assert_eq!(selective.call(&dc, &mut rng)?, expected);
    }
    Ok(())
}

#[test]
fn test_selective_stream_with_nothing_selected_is_identity() -> Result<()> {
    let selective = SelectiveStream::new(noisy_stages()?, 0, None)?;
    let dc = DataContainer::from_image(img_6x6());
    assert_eq!(selective.call(&dc, &mut rng())?, dc);
    Ok(())
}

#[test]
fn test_selective_stream_rejects_bad_config() -> Result<()> {
    let err = SelectiveStream::new(noisy_stages()?, 4, None).unwrap_err();
    assert_eq!(error_kind(&err), Some(ErrorKind::Value));

    let err = SelectiveStream::new(noisy_stages()?, 1, Some(vec![1.0, 1.0])).unwrap_err();
    assert_eq!(error_kind(&err), Some(ErrorKind::Value));

    let err = SelectiveStream::new(noisy_stages()?, 1, Some(vec![-1.0, 1.0, 1.0])).unwrap_err();
    assert_eq!(error_kind(&err), Some(ErrorKind::Value));
    Ok(())
}
