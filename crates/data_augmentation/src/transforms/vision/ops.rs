//! Pixel kernels shared by the vision transforms.
//!
//! Kernels work on 8-bit Luma, LumaA, Rgb and Rgba images. Alpha is
//! never modified. Other layouts are rejected rather than converted.

use crate::error::TransformError;
use anyhow::{bail, Result};
use image::{DynamicImage, ImageBuffer, Pixel};
use rand::{Rng, RngCore};

/// Draws uniformly from `[lo, hi]`; a degenerate range returns `lo`
/// without touching the generator.
pub fn uniform(rng: &mut dyn RngCore, (lo, hi): (f64, f64)) -> f64 {
    if lo >= hi {
        lo
    } else {
        rng.random_range(lo..=hi)
    }
}

fn map_buffer<P>(
    buf: &ImageBuffer<P, Vec<u8>>,
    color_channels: usize,
    mut f: impl FnMut(u32, u32, usize, u8) -> u8,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let mut out = buf.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        for (c, v) in pixel.channels_mut().iter_mut().take(color_channels).enumerate() {
            *v = f(x, y, c, *v);
        }
    }
    out
}

/// Rewrites every colour subpixel with `f(x, y, channel, value)`.
pub fn map_subpixels(
    img: &DynamicImage,
    f: impl FnMut(u32, u32, usize, u8) -> u8,
) -> Result<DynamicImage> {
    Ok(match img {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(map_buffer(buf, 1, f)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(map_buffer(buf, 1, f)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(map_buffer(buf, 3, f)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(map_buffer(buf, 3, f)),
        other => bail!(TransformError::pixel_format(format!("{:?}", other.color()))),
    })
}

/// Applies a 256-entry lookup table to every colour subpixel.
pub fn apply_lut(img: &DynamicImage, lut: &[u8; 256]) -> Result<DynamicImage> {
    map_subpixels(img, |_, _, _, v| lut[v as usize])
}

pub fn build_lut(f: impl Fn(f64) -> f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (v, slot) in lut.iter_mut().enumerate() {
        *slot = f(v as f64).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

fn rgb_to_hsv([r, g, b]: [f32; 3]) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    [h, s, max]
}

fn hsv_to_rgb([h, s, v]: [f32; 3]) -> [f32; 3] {
    let c = v * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [r + m, g + m, b + m]
}

fn shift_pixel(rgb: [u8; 3], dh: f32, ds: f32, dv: f32) -> [u8; 3] {
    let [h, s, v] = rgb_to_hsv(rgb.map(|c| c as f32 / 255.0));
    let shifted = [
        h + dh,
        (s + ds / 255.0).clamp(0.0, 1.0),
        (v + dv / 255.0).clamp(0.0, 1.0),
    ];
    hsv_to_rgb(shifted).map(|c| (c * 255.0).round().clamp(0.0, 255.0) as u8)
}

/// Shifts hue (degrees), saturation and value (both on a 0..255 scale).
/// Only RGB and RGBA images carry hue.
pub fn shift_hsv(img: &DynamicImage, dh: f32, ds: f32, dv: f32) -> Result<DynamicImage> {
    Ok(match img {
        DynamicImage::ImageRgb8(buf) => {
            let mut out = buf.clone();
            for pixel in out.pixels_mut() {
                pixel.0 = shift_pixel(pixel.0, dh, ds, dv);
            }
            DynamicImage::ImageRgb8(out)
        }
        DynamicImage::ImageRgba8(buf) => {
            let mut out = buf.clone();
            for pixel in out.pixels_mut() {
                let [r, g, b, a] = pixel.0;
                let [r, g, b] = shift_pixel([r, g, b], dh, ds, dv);
                pixel.0 = [r, g, b, a];
            }
            DynamicImage::ImageRgba8(out)
        }
        other => bail!(TransformError::pixel_format(format!(
            "HSV shift needs an RGB image, got {:?}",
            other.color()
        ))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_hsv_round_trip_is_stable() {
        for rgb in [[255, 0, 0], [12, 200, 77], [128, 128, 128], [0, 0, 0]] {
            assert_eq!(shift_pixel(rgb, 0.0, 0.0, 0.0), rgb);
        }
    }

    #[test]
    fn test_hue_rotation_of_red() {
        assert_eq!(shift_pixel([255, 0, 0], 120.0, 0.0, 0.0), [0, 255, 0]);
        assert_eq!(shift_pixel([255, 0, 0], -120.0, 0.0, 0.0), [0, 0, 255]);
    }

    #[test]
    fn test_saturation_colours_gray() {
        let out = shift_pixel([128, 128, 128], 0.0, 50.0, 0.0);
        assert_eq!(out[0], 128);
        assert!(out[1] < 128 && out[2] < 128);
    }

    #[test]
    fn test_lut_leaves_alpha() -> Result<()> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 40])));
        let out = apply_lut(&img, &build_lut(|v| v * 2.0))?;
        assert_eq!(out.as_bytes(), &[20, 40, 60, 40]);
        Ok(())
    }

    #[test]
    fn test_kernels_reject_float_images() {
        let img = DynamicImage::ImageRgb32F(image::Rgb32FImage::new(1, 1));
        assert!(map_subpixels(&img, |_, _, _, v| v).is_err());
        let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(1, 1, Luma([3])));
        assert!(shift_hsv(&gray, 10.0, 0.0, 0.0).is_err());
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([1, 2, 3])));
        assert!(shift_hsv(&rgb, 10.0, 0.0, 0.0).is_ok());
    }
}
