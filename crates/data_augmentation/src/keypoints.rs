use crate::error::TransformError;
use anyhow::{bail, ensure, Result};
use std::fmt;

/// Spatial extent of an item, as `(height, width)` in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    pub height: u32,
    pub width: u32,
}

impl Frame {
    pub const fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    /// Frame after a quarter turn: height and width swap.
    pub const fn transposed(self) -> Self {
        Self {
            height: self.width,
            width: self.height,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// A set of 2D keypoints together with the frame they are defined in.
///
/// Coordinates are `[x, y]` pairs in pixel units of `frame`. Geometric
/// transforms update both the coordinates and the frame, so a keypoint
/// set always stays consistent with the image it annotates.
///
/// # Example
/// ```ignore
/// let kpts = KeyPoints::new(vec![[0.0, 0.0], [2.0, 2.0]], Frame::new(3, 3))?;
/// let flipped = kpts.flip_horizontal();
/// assert_eq!(flipped.points()[0], [2.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPoints {
    points: Vec<[f32; 2]>,
    frame: Frame,
}

impl KeyPoints {
    /// Creates a keypoint set. The frame must be non-empty and all
    /// coordinates finite.
    pub fn new(points: Vec<[f32; 2]>, frame: Frame) -> Result<Self> {
        ensure!(
            frame.height > 0 && frame.width > 0,
            TransformError::geometry(format!("keypoint frame must be non-empty, got {frame}"))
        );
        if let Some(bad) = points.iter().position(|p| !p[0].is_finite() || !p[1].is_finite()) {
            bail!(TransformError::geometry(format!(
                "keypoint {bad} has non-finite coordinates {:?}",
                points[bad]
            )));
        }
        Ok(Self { points, frame })
    }

    /// Creates a keypoint set from integer pixel coordinates.
    pub fn from_pixels(points: &[[i32; 2]], frame: Frame) -> Result<Self> {
        Self::new(
            points.iter().map(|&[x, y]| [x as f32, y as f32]).collect(),
            frame,
        )
    }

    pub fn points(&self) -> &[[f32; 2]] {
        &self.points
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mirrors the points left to right: `x' = width - 1 - x`.
    pub fn flip_horizontal(&self) -> Self {
        let w = self.frame.width as f32;
        self.map_points(self.frame, |[x, y]| [w - 1.0 - x, y])
    }

    /// Mirrors the points top to bottom: `y' = height - 1 - y`.
    pub fn flip_vertical(&self) -> Self {
        let h = self.frame.height as f32;
        self.map_points(self.frame, |[x, y]| [x, h - 1.0 - y])
    }

    /// Rotates by `k` quarter turns clockwise, matching `image`'s `rotate90`.
    pub fn rotate90(&self, k: u8) -> Self {
        (0..k % 4).fold(self.clone(), |kpts, _| {
            let h = kpts.frame.height as f32;
            kpts.map_points(kpts.frame.transposed(), |[x, y]| [h - 1.0 - y, x])
        })
    }

    /// Moves the points into the coordinate system of a crop window whose
    /// top-left corner is `(x0, y0)` and whose extent is `window`.
    /// Points falling outside the window are kept as they are.
    pub fn crop(&self, x0: u32, y0: u32, window: Frame) -> Self {
        let (dx, dy) = (x0 as f32, y0 as f32);
        self.map_points(window, |[x, y]| [x - dx, y - dy])
    }

    /// Coordinates divided by the frame extent.
    pub fn normalized(&self) -> Vec<[f32; 2]> {
        let (w, h) = (self.frame.width as f32, self.frame.height as f32);
        self.points.iter().map(|&[x, y]| [x / w, y / h]).collect()
    }

    fn map_points(&self, frame: Frame, f: impl Fn([f32; 2]) -> [f32; 2]) -> Self {
        Self {
            points: self.points.iter().copied().map(f).collect(),
            frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{error_kind, ErrorKind};

    fn square() -> KeyPoints {
        KeyPoints::from_pixels(&[[0, 0], [0, 2], [2, 2], [2, 0]], Frame::new(3, 3)).unwrap()
    }

    #[test]
    fn test_flip_horizontal_keeps_frame() {
        let flipped = square().flip_horizontal();
        assert_eq!(flipped.points(), &[[2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]);
        assert_eq!(flipped.frame(), Frame::new(3, 3));
    }

    #[test]
    fn test_rotate90_transposes_frame() -> Result<()> {
        let kpts = KeyPoints::from_pixels(&[[0, 0], [3, 1]], Frame::new(2, 4))?;
        let rotated = kpts.rotate90(1);
        assert_eq!(rotated.frame(), Frame::new(4, 2));
        assert_eq!(rotated.points(), &[[1.0, 0.0], [0.0, 3.0]]);
        assert_eq!(kpts.rotate90(4), kpts);
        Ok(())
    }

    #[test]
    fn test_crop_shifts_points_and_frame() {
        let cropped = square().crop(1, 1, Frame::new(2, 2));
        assert_eq!(cropped.frame(), Frame::new(2, 2));
        assert_eq!(cropped.points()[2], [1.0, 1.0]);
    }

    #[test]
    fn test_rejects_empty_frame_and_nan() {
        let err = KeyPoints::new(vec![], Frame::new(0, 3)).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Value));

        let err = KeyPoints::new(vec![[f32::NAN, 1.0]], Frame::new(3, 3)).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Value));
    }
}
