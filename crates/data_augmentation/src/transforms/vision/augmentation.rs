//! Noise augmentations whose random field spans every targeted image.
//!
//! Both transforms are data-dependent: the field is drawn once at the
//! shared frame and applied to every targeted image, so images of mixed
//! sizes are rejected before anything is sampled.

use crate::container::ItemType;
use crate::keypoints::Frame;
use crate::params::{check_range, Params};
use crate::transforms::base::{Descriptor, TransformParams};
use crate::transforms::registry::FromParams;
use crate::transforms::typed::{base_params, Handlers, Targets, TypedTransform};
use crate::transforms::vision::ops::{map_subpixels, uniform};
use anyhow::Result;
use image::DynamicImage;
use rand::{Rng, RngCore};

const IMAGES: &[ItemType] = &[ItemType::Image];

/// Per-pixel values laid out row-major over a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T> {
    frame: Frame,
    values: Vec<T>,
}

impl<T: Copy> Field<T> {
    fn from_fn(frame: Frame, mut f: impl FnMut() -> T) -> Self {
        let len = frame.height as usize * frame.width as usize;
        Self {
            frame,
            values: (0..len).map(|_| f()).collect(),
        }
    }

    fn at(&self, x: u32, y: u32) -> T {
        self.values[y as usize * self.frame.width as usize + x as usize]
    }
}

// ============================================================================
// Noise
// ============================================================================

pub(crate) static NOISE: Descriptor = Descriptor {
    name: "Noise",
    params: &["p", "data_indices", "gain_range"],
    item_types: IMAGES,
    data_dependent: true,
};

/// Blends images with a uniform noise field: `v' = v * (1 - g) + n * g`.
#[derive(Debug, Clone)]
pub struct Noise {
    params: TransformParams,
    gain_range: (f64, f64),
}

impl Noise {
    /// `gain_range` must lie within `[0, 1]`.
    pub fn new(gain_range: (f64, f64)) -> Result<Self> {
        Ok(Self {
            params: TransformParams::default(),
            gain_range: check_range("gain_range", gain_range, 0.0, 1.0)?,
        })
    }

    pub fn with_params(mut self, params: TransformParams) -> Self {
        self.params = params;
        self
    }

    fn image(&self, img: &DynamicImage, state: &Option<(f32, Field<u8>)>) -> Result<DynamicImage> {
        let Some((gain, field)) = state else {
            return Ok(img.clone());
        };
        map_subpixels(img, |x, y, _, v| {
            let blended = v as f32 * (1.0 - gain) + field.at(x, y) as f32 * gain;
            blended.round().clamp(0.0, 255.0) as u8
        })
    }
}

impl FromParams for Noise {
    fn from_params(params: &Params) -> Result<Self> {
        let base = base_params(&NOISE, params)?;
        let gain_range = params.range("gain_range", (0.0, 0.1), 0.0, 1.0)?;
        Ok(Self::new(gain_range)?.with_params(base))
    }
}

impl TypedTransform for Noise {
    type State = Option<(f32, Field<u8>)>;

    fn descriptor() -> &'static Descriptor {
        &NOISE
    }

    fn handlers() -> Handlers<Self, Self::State> {
        Handlers {
            image: Some(Self::image),
            ..Handlers::none()
        }
    }

    fn params(&self) -> &TransformParams {
        &self.params
    }

    fn sample(&self, targets: &Targets<'_>, rng: &mut dyn RngCore) -> Result<Self::State> {
        let Some(frame) = targets.frame else {
            return Ok(None);
        };
        let gain = uniform(rng, self.gain_range) as f32;
        let field = Field::from_fn(frame, || rng.random::<u8>());
        Ok(Some((gain, field)))
    }
}

// ============================================================================
// SaltAndPepper
// ============================================================================

pub(crate) static SALT_AND_PEPPER: Descriptor = Descriptor {
    name: "SaltAndPepper",
    params: &["p", "data_indices", "gain_range", "salt_p"],
    item_types: IMAGES,
    data_dependent: true,
};

/// Forces a random share of pixels to white (salt) or black (pepper).
///
/// The share is drawn from `gain_range`; each affected pixel is salt with
/// probability drawn from `salt_p`. Alpha is left untouched.
#[derive(Debug, Clone)]
pub struct SaltAndPepper {
    params: TransformParams,
    gain_range: (f64, f64),
    salt_p: (f64, f64),
}

impl SaltAndPepper {
    /// Both ranges must lie within `[0, 1]`.
    pub fn new(gain_range: (f64, f64), salt_p: (f64, f64)) -> Result<Self> {
        Ok(Self {
            params: TransformParams::default(),
            gain_range: check_range("gain_range", gain_range, 0.0, 1.0)?,
            salt_p: check_range("salt_p", salt_p, 0.0, 1.0)?,
        })
    }

    pub fn with_params(mut self, params: TransformParams) -> Self {
        self.params = params;
        self
    }

    fn image(&self, img: &DynamicImage, state: &Option<Field<Option<u8>>>) -> Result<DynamicImage> {
        let Some(field) = state else {
            return Ok(img.clone());
        };
        map_subpixels(img, |x, y, _, v| field.at(x, y).unwrap_or(v))
    }
}

impl FromParams for SaltAndPepper {
    fn from_params(params: &Params) -> Result<Self> {
        let base = base_params(&SALT_AND_PEPPER, params)?;
        let gain_range = params.range("gain_range", (0.0, 0.1), 0.0, 1.0)?;
        let salt_p = params.range("salt_p", (0.5, 0.5), 0.0, 1.0)?;
        Ok(Self::new(gain_range, salt_p)?.with_params(base))
    }
}

impl TypedTransform for SaltAndPepper {
    type State = Option<Field<Option<u8>>>;

    fn descriptor() -> &'static Descriptor {
        &SALT_AND_PEPPER
    }

    fn handlers() -> Handlers<Self, Self::State> {
        Handlers {
            image: Some(Self::image),
            ..Handlers::none()
        }
    }

    fn params(&self) -> &TransformParams {
        &self.params
    }

    fn sample(&self, targets: &Targets<'_>, rng: &mut dyn RngCore) -> Result<Self::State> {
        let Some(frame) = targets.frame else {
            return Ok(None);
        };
        let gain = uniform(rng, self.gain_range);
        let salt = uniform(rng, self.salt_p);
        let field = Field::from_fn(frame, || {
            if !rng.random_bool(gain) {
                None
            } else if rng.random_bool(salt) {
                Some(u8::MAX)
            } else {
                Some(0)
            }
        });
        Ok(Some(field))
    }
}
