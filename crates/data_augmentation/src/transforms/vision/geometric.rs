use crate::container::ItemType;
use crate::error::TransformError;
use crate::keypoints::{Frame, KeyPoints};
use crate::params::{ParamValue, Params};
use crate::transforms::base::{Descriptor, TransformParams};
use crate::transforms::registry::FromParams;
use crate::transforms::typed::{base_params, Handlers, Targets, TypedTransform};
use anyhow::{bail, ensure, Result};
use image::{imageops, DynamicImage, GrayImage};
use rand::{Rng, RngCore};

const SPATIAL: &[ItemType] = &[ItemType::Image, ItemType::Mask, ItemType::KeyPoints];

// ============================================================================
// Flip
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
    Both,
}

impl FlipAxis {
    /// `1` horizontal, `0` vertical, `-1` both.
    pub fn from_code(code: i64) -> Result<Self> {
        Ok(match code {
            1 => Self::Horizontal,
            0 => Self::Vertical,
            -1 => Self::Both,
            other => bail!(TransformError::parameter_value(
                "axis",
                format!("expected 1, 0 or -1, got {other}")
            )),
        })
    }

    fn horizontal(self) -> bool {
        matches!(self, Self::Horizontal | Self::Both)
    }

    fn vertical(self) -> bool {
        matches!(self, Self::Vertical | Self::Both)
    }
}

pub(crate) static FLIP: Descriptor = Descriptor {
    name: "Flip",
    params: &["p", "data_indices", "axis"],
    item_types: SPATIAL,
    data_dependent: false,
};

/// Mirrors images, masks and keypoints along one or both axes.
#[derive(Debug, Clone)]
pub struct Flip {
    params: TransformParams,
    axis: FlipAxis,
}

impl Flip {
    pub fn new(axis: FlipAxis) -> Self {
        Self {
            params: TransformParams::default(),
            axis,
        }
    }

    pub fn with_params(mut self, params: TransformParams) -> Self {
        self.params = params;
        self
    }

    pub fn axis(&self) -> FlipAxis {
        self.axis
    }

    fn image(&self, img: &DynamicImage, _: &()) -> Result<DynamicImage> {
        Ok(match self.axis {
            FlipAxis::Horizontal => img.fliph(),
            FlipAxis::Vertical => img.flipv(),
            FlipAxis::Both => img.rotate180(),
        })
    }

    fn mask(&self, mask: &GrayImage, _: &()) -> Result<GrayImage> {
        Ok(match self.axis {
            FlipAxis::Horizontal => imageops::flip_horizontal(mask),
            FlipAxis::Vertical => imageops::flip_vertical(mask),
            FlipAxis::Both => imageops::rotate180(mask),
        })
    }

    fn keypoints(&self, kpts: &KeyPoints, _: &()) -> Result<KeyPoints> {
        let mut out = kpts.clone();
        if self.axis.horizontal() {
            out = out.flip_horizontal();
        }
        if self.axis.vertical() {
            out = out.flip_vertical();
        }
        Ok(out)
    }
}

impl FromParams for Flip {
    fn from_params(params: &Params) -> Result<Self> {
        let base = base_params(&FLIP, params)?;
        let axis = FlipAxis::from_code(params.int_or("axis", 1)?)?;
        Ok(Self::new(axis).with_params(base))
    }
}

impl TypedTransform for Flip {
    type State = ();

    fn descriptor() -> &'static Descriptor {
        &FLIP
    }

    fn handlers() -> Handlers<Self, ()> {
        Handlers {
            image: Some(Self::image),
            mask: Some(Self::mask),
            keypoints: Some(Self::keypoints),
            label: None,
        }
    }

    fn params(&self) -> &TransformParams {
        &self.params
    }

    fn sample(&self, _: &Targets<'_>, _: &mut dyn RngCore) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Rotate90
// ============================================================================

pub(crate) static ROTATE90: Descriptor = Descriptor {
    name: "Rotate90",
    params: &["p", "data_indices", "k"],
    item_types: SPATIAL,
    data_dependent: false,
};

/// Rotates by `k` quarter turns clockwise. Keypoint frames are transposed
/// for odd `k`.
#[derive(Debug, Clone)]
pub struct Rotate90 {
    params: TransformParams,
    k: u8,
}

impl Rotate90 {
    /// Negative `k` counts counter-clockwise turns.
    pub fn new(k: i64) -> Self {
        Self {
            params: TransformParams::default(),
            k: k.rem_euclid(4) as u8,
        }
    }

    pub fn with_params(mut self, params: TransformParams) -> Self {
        self.params = params;
        self
    }

    pub fn turns(&self) -> u8 {
        self.k
    }

    fn image(&self, img: &DynamicImage, _: &()) -> Result<DynamicImage> {
        Ok(match self.k {
            1 => img.rotate90(),
            2 => img.rotate180(),
            3 => img.rotate270(),
            _ => img.clone(),
        })
    }

    fn mask(&self, mask: &GrayImage, _: &()) -> Result<GrayImage> {
        Ok(match self.k {
            1 => imageops::rotate90(mask),
            2 => imageops::rotate180(mask),
            3 => imageops::rotate270(mask),
            _ => mask.clone(),
        })
    }

    fn keypoints(&self, kpts: &KeyPoints, _: &()) -> Result<KeyPoints> {
        Ok(kpts.rotate90(self.k))
    }
}

impl FromParams for Rotate90 {
    fn from_params(params: &Params) -> Result<Self> {
        let base = base_params(&ROTATE90, params)?;
        Ok(Self::new(params.int_or("k", 1)?).with_params(base))
    }
}

impl TypedTransform for Rotate90 {
    type State = ();

    fn descriptor() -> &'static Descriptor {
        &ROTATE90
    }

    fn handlers() -> Handlers<Self, ()> {
        Handlers {
            image: Some(Self::image),
            mask: Some(Self::mask),
            keypoints: Some(Self::keypoints),
            label: None,
        }
    }

    fn params(&self) -> &TransformParams {
        &self.params
    }

    fn sample(&self, _: &Targets<'_>, _: &mut dyn RngCore) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Crop
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropMode {
    Center,
    Random,
}

impl CropMode {
    /// `"c"` center, `"r"` random.
    pub fn from_code(code: &str) -> Result<Self> {
        Ok(match code {
            "c" => Self::Center,
            "r" => Self::Random,
            other => bail!(TransformError::parameter_value(
                "crop_mode",
                format!("expected \"c\" or \"r\", got {other:?}")
            )),
        })
    }
}

/// Top-left corner and extent of one crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x0: u32,
    pub y0: u32,
    pub frame: Frame,
}

pub(crate) static CROP: Descriptor = Descriptor {
    name: "Crop",
    params: &["p", "data_indices", "crop_to", "crop_mode"],
    item_types: SPATIAL,
    data_dependent: true,
};

/// Cuts the same window out of every targeted image, mask and keypoint set.
///
/// The window is placed once per call from the shared frame, so all
/// targeted items must agree on their `(height, width)`.
#[derive(Debug, Clone)]
pub struct Crop {
    params: TransformParams,
    crop_to: Option<Frame>,
    mode: CropMode,
}

impl Crop {
    /// `crop_to = None` leaves items untouched. A window needs a non-zero
    /// height and width.
    pub fn new(crop_to: Option<Frame>, mode: CropMode) -> Result<Self> {
        if let Some(window) = crop_to {
            ensure!(
                window.height > 0 && window.width > 0,
                TransformError::parameter_value("crop_to", format!("extent must be positive, got {window}"))
            );
        }
        Ok(Self {
            params: TransformParams::default(),
            crop_to,
            mode,
        })
    }

    pub fn with_params(mut self, params: TransformParams) -> Self {
        self.params = params;
        self
    }

    fn image(&self, img: &DynamicImage, window: &Option<CropWindow>) -> Result<DynamicImage> {
        Ok(match window {
            Some(w) => img.crop_imm(w.x0, w.y0, w.frame.width, w.frame.height),
            None => img.clone(),
        })
    }

    fn mask(&self, mask: &GrayImage, window: &Option<CropWindow>) -> Result<GrayImage> {
        Ok(match window {
            Some(w) => imageops::crop_imm(mask, w.x0, w.y0, w.frame.width, w.frame.height).to_image(),
            None => mask.clone(),
        })
    }

    fn keypoints(&self, kpts: &KeyPoints, window: &Option<CropWindow>) -> Result<KeyPoints> {
        Ok(match window {
            Some(w) => kpts.crop(w.x0, w.y0, w.frame),
            None => kpts.clone(),
        })
    }
}

/// `None` | `n` for a square | `(height, width)`.
fn crop_extent(params: &Params) -> Result<Option<Frame>> {
    let positive = |v: &ParamValue| -> Result<u32> {
        match v {
            ParamValue::Int(n) if *n > 0 && *n <= u32::MAX as i64 => Ok(*n as u32),
            ParamValue::Int(n) => bail!(TransformError::parameter_value(
                "crop_to",
                format!("extent must be positive, got {n}")
            )),
            other => bail!(TransformError::parameter_type("crop_to", "an int", other.kind_name())),
        }
    };
    match params.get("crop_to") {
        None | Some(ParamValue::None) => Ok(None),
        Some(n @ ParamValue::Int(_)) => {
            let side = positive(n)?;
            Ok(Some(Frame::new(side, side)))
        }
        Some(ParamValue::Tuple(pair)) => {
            ensure!(
                pair.len() == 2,
                TransformError::parameter_value("crop_to", format!("expected (height, width), got {} values", pair.len()))
            );
            Ok(Some(Frame::new(positive(&pair[0])?, positive(&pair[1])?)))
        }
        Some(other) => bail!(TransformError::parameter_type(
            "crop_to",
            "an int or a (height, width) tuple",
            other.kind_name()
        )),
    }
}

impl FromParams for Crop {
    fn from_params(params: &Params) -> Result<Self> {
        let base = base_params(&CROP, params)?;
        let mode = CropMode::from_code(params.str_or("crop_mode", "c")?)?;
        Ok(Self::new(crop_extent(params)?, mode)?.with_params(base))
    }
}

impl TypedTransform for Crop {
    type State = Option<CropWindow>;

    fn descriptor() -> &'static Descriptor {
        &CROP
    }

    fn handlers() -> Handlers<Self, Option<CropWindow>> {
        Handlers {
            image: Some(Self::image),
            mask: Some(Self::mask),
            keypoints: Some(Self::keypoints),
            label: None,
        }
    }

    fn params(&self) -> &TransformParams {
        &self.params
    }

    fn sample(&self, targets: &Targets<'_>, rng: &mut dyn RngCore) -> Result<Option<CropWindow>> {
        let (Some(window), Some(frame)) = (self.crop_to, targets.frame) else {
            return Ok(None);
        };
        ensure!(
            window.height <= frame.height && window.width <= frame.width,
            TransformError::geometry(format!("crop {window} does not fit in frame {frame}"))
        );
        let (slack_x, slack_y) = (frame.width - window.width, frame.height - window.height);
        let (x0, y0) = match self.mode {
            CropMode::Center => (slack_x / 2, slack_y / 2),
            CropMode::Random => (rng.random_range(0..=slack_x), rng.random_range(0..=slack_y)),
        };
        Ok(Some(CropWindow { x0, y0, frame: window }))
    }
}
