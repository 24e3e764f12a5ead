#![allow(dead_code)]

use data_augmentation::{Frame, KeyPoints};

use anyhow::Result;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn gray(width: u32, height: u32, rows: &[u8]) -> DynamicImage {
    let mut img = GrayImage::new(width, height);
    for (i, &v) in rows.iter().enumerate() {
        let (x, y) = (i as u32 % width, i as u32 / width);
        img.put_pixel(x, y, Luma([v]));
    }
    DynamicImage::ImageLuma8(img)
}

pub fn img_2x2() -> DynamicImage {
    gray(2, 2, &[1, 0, 1, 1])
}

pub fn img_3x3() -> DynamicImage {
    gray(3, 3, &[0, 1, 1, 0, 0, 1, 0, 0, 1])
}

/// Three rows, four columns.
pub fn img_3x4() -> DynamicImage {
    gray(4, 3, &[0, 1, 1, 1, 0, 0, 1, 1, 1, 0, 0, 1])
}

pub fn img_6x6() -> DynamicImage {
    let mut img = GrayImage::new(6, 6);
    for y in 0..6 {
        for x in 0..6 {
            img.put_pixel(x, y, Luma([u8::from(x > y)]));
        }
    }
    DynamicImage::ImageLuma8(img)
}

/// Mirror-asymmetric RGB image with 0/128 values in every channel.
pub fn img_3x3_rgb() -> DynamicImage {
    let pattern = [[0, 1, 1], [0, 0, 1], [0, 0, 1]];
    let mut img = RgbImage::new(3, 3);
    for (y, row) in pattern.iter().enumerate() {
        for (x, &v) in row.iter().enumerate() {
            img.put_pixel(x as u32, y as u32, Rgb([v * 128; 3]));
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// Corners of a 3x3 frame.
pub fn kpts_3x3() -> Result<KeyPoints> {
    KeyPoints::from_pixels(&[[0, 0], [0, 2], [2, 2], [2, 0]], Frame::new(3, 3))
}
