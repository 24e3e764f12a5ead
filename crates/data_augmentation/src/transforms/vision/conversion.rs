use crate::error::TransformError;
use crate::keypoints::KeyPoints;
use crate::transforms::Transform;
use anyhow::{ensure, Context, Result};
use image::{DynamicImage, GenericImageView, GrayImage};
use tch::{Kind, Tensor};

// ============================================================================
// ToTensor
// ============================================================================

/// Converts an image to a channel-first f32 tensor in [0.0, 1.0] range.
///
/// Channel Handling
/// | Input Format  | Output Shape |
/// |---------------|--------------|
/// | Grayscale (L) | `[1, H, W]`  |
/// | Gray + alpha  | `[2, H, W]`  |
/// | RGB           | `[3, H, W]`  |
/// | RGBA          | `[4, H, W]`  |
/// | Other         | `[3, H, W]`  |
#[derive(Debug, Clone, Copy)]
pub struct ToTensor;

impl Transform<DynamicImage, Tensor> for ToTensor {
    fn apply(&self, img: DynamicImage) -> Result<Tensor> {
        let (width, height) = img.dimensions();
        ensure!(
            width > 0 && height > 0,
            TransformError::geometry(format!("image dimensions must be positive, got {width}x{height}"))
        );

        let (h, w) = (height as i64, width as i64);
        let tensor = match img {
            DynamicImage::ImageLuma8(img) => Tensor::from_slice(img.as_raw()).reshape(&[h, w, 1]),
            DynamicImage::ImageLumaA8(img) => Tensor::from_slice(img.as_raw()).reshape(&[h, w, 2]),
            DynamicImage::ImageRgb8(img) => Tensor::from_slice(img.as_raw()).reshape(&[h, w, 3]),
            DynamicImage::ImageRgba8(img) => Tensor::from_slice(img.as_raw()).reshape(&[h, w, 4]),
            other => Tensor::from_slice(other.to_rgb8().as_raw()).reshape(&[h, w, 3]),
        };

        // Pixel buffers are interleaved; move channels to the front.
        tensor
            .permute(&[2, 0, 1])
            .to_kind(Kind::Float)
            .f_div_scalar(255.0)
            .context("Failed to scale tensor values")
    }
}

/// Raw mask values as a `[1, H, W]` f32 tensor.
pub fn mask_to_tensor(mask: &GrayImage) -> Tensor {
    let (width, height) = mask.dimensions();
    Tensor::from_slice(mask.as_raw())
        .reshape(&[1, height as i64, width as i64])
        .to_kind(Kind::Float)
}

/// Keypoints as an `[N, 2]` f32 tensor, optionally divided by the frame.
pub fn keypoints_to_tensor(kpts: &KeyPoints, scale: bool) -> Tensor {
    let points = if scale {
        kpts.normalized()
    } else {
        kpts.points().to_vec()
    };
    let flat: Vec<f32> = points.into_iter().flatten().collect();
    Tensor::from_slice(&flat).reshape(&[kpts.len() as i64, 2])
}

// ============================================================================
// Normalize
// ============================================================================

/// Normalizes tensors using channel-wise statistics.
///
/// A single mean/std value applies to every channel; otherwise the
/// dimensions must match the input tensor's number of channels.
///
/// # Mathematical Operation:
/// ```text
/// output[c,h,w] = (input[c,h,w] - mean[c]) / std[c]
/// ```
#[derive(Debug, Clone)]
pub struct Normalize {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Normalize {
    pub fn new(mean: &[f32], std: &[f32]) -> Result<Self> {
        ensure!(
            !mean.is_empty(),
            TransformError::ExportOptions("normalization mean cannot be empty".into())
        );
        ensure!(
            mean.len() == std.len(),
            TransformError::ExportOptions(format!(
                "mean has {} values but std has {}",
                mean.len(),
                std.len()
            ))
        );
        ensure!(
            std.iter().all(|&s| s != 0.0 && s.is_finite()),
            TransformError::ExportOptions("std entries must be finite and non-zero".into())
        );
        Ok(Self {
            mean: mean.to_vec(),
            std: std.to_vec(),
        })
    }

    fn stats(&self, num_channels: i64) -> Result<(Vec<f32>, Vec<f32>)> {
        if self.mean.len() == 1 {
            let n = num_channels as usize;
            return Ok((vec![self.mean[0]; n], vec![self.std[0]; n]));
        }
        ensure!(
            num_channels as usize == self.mean.len(),
            TransformError::ExportOptions(format!(
                "input has {} channels but normalization expects {}",
                num_channels,
                self.mean.len()
            ))
        );
        Ok((self.mean.clone(), self.std.clone()))
    }
}

impl Transform<Tensor, Tensor> for Normalize {
    fn apply(&self, tensor: Tensor) -> Result<Tensor> {
        let (num_channels, _height, _width) = tensor
            .size3()
            .context("Input must be 3D tensor [C, H, W]")?;
        let (mean, std) = self.stats(num_channels)?;

        let mean_t = Tensor::from_slice(&mean)
            .reshape(&[num_channels, 1, 1])
            .to_kind(tensor.kind());
        let std_t = Tensor::from_slice(&std)
            .reshape(&[num_channels, 1, 1])
            .to_kind(tensor.kind());

        Ok((tensor - mean_t) / std_t)
    }
}
