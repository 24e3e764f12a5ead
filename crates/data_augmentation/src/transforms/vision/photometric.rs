use crate::container::ItemType;
use crate::params::{check_range, Params};
use crate::transforms::base::{Descriptor, TransformParams};
use crate::transforms::registry::FromParams;
use crate::transforms::typed::{base_params, Handlers, Targets, TypedTransform};
use crate::transforms::vision::ops::{apply_lut, build_lut, shift_hsv, uniform};
use anyhow::Result;
use image::DynamicImage;
use rand::RngCore;

const IMAGES: &[ItemType] = &[ItemType::Image];

const BRIGHTNESS_BOUNDS: (f64, f64) = (-255.0, 255.0);
const CONTRAST_BOUNDS: (f64, f64) = (0.0, 10.0);
const GAMMA_BOUNDS: (f64, f64) = (0.01, 10.0);
const HUE_BOUNDS: (f64, f64) = (-180.0, 180.0);
const SV_BOUNDS: (f64, f64) = (-255.0, 255.0);

// ============================================================================
// Brightness
// ============================================================================

pub(crate) static BRIGHTNESS: Descriptor = Descriptor {
    name: "Brightness",
    params: &["p", "data_indices", "brightness_range"],
    item_types: IMAGES,
    data_dependent: false,
};

/// Adds one offset, drawn from `brightness_range`, to every colour channel.
#[derive(Debug, Clone)]
pub struct Brightness {
    params: TransformParams,
    range: (f64, f64),
}

impl Brightness {
    pub fn new(range: (f64, f64)) -> Result<Self> {
        let (min, max) = BRIGHTNESS_BOUNDS;
        Ok(Self {
            params: TransformParams::default(),
            range: check_range("brightness_range", range, min, max)?,
        })
    }

    pub fn with_params(mut self, params: TransformParams) -> Self {
        self.params = params;
        self
    }

    fn image(&self, img: &DynamicImage, offset: &i32) -> Result<DynamicImage> {
        Ok(img.brighten(*offset))
    }
}

impl FromParams for Brightness {
    fn from_params(params: &Params) -> Result<Self> {
        let base = base_params(&BRIGHTNESS, params)?;
        let range = params.range("brightness_range", (0.0, 0.0), BRIGHTNESS_BOUNDS.0, BRIGHTNESS_BOUNDS.1)?;
        Ok(Self::new(range)?.with_params(base))
    }
}

impl TypedTransform for Brightness {
    type State = i32;

    fn descriptor() -> &'static Descriptor {
        &BRIGHTNESS
    }

    fn handlers() -> Handlers<Self, i32> {
        Handlers {
            image: Some(Self::image),
            ..Handlers::none()
        }
    }

    fn params(&self) -> &TransformParams {
        &self.params
    }

    fn sample(&self, _: &Targets<'_>, rng: &mut dyn RngCore) -> Result<i32> {
        Ok(uniform(rng, self.range).round() as i32)
    }
}

// ============================================================================
// Contrast
// ============================================================================

pub(crate) static CONTRAST: Descriptor = Descriptor {
    name: "Contrast",
    params: &["p", "data_indices", "contrast_range"],
    item_types: IMAGES,
    data_dependent: false,
};

/// Multiplies every colour channel by a factor from `contrast_range`.
#[derive(Debug, Clone)]
pub struct Contrast {
    params: TransformParams,
    range: (f64, f64),
}

impl Contrast {
    pub fn new(range: (f64, f64)) -> Result<Self> {
        let (min, max) = CONTRAST_BOUNDS;
        Ok(Self {
            params: TransformParams::default(),
            range: check_range("contrast_range", range, min, max)?,
        })
    }

    pub fn with_params(mut self, params: TransformParams) -> Self {
        self.params = params;
        self
    }

    fn image(&self, img: &DynamicImage, lut: &[u8; 256]) -> Result<DynamicImage> {
        apply_lut(img, lut)
    }
}

impl FromParams for Contrast {
    fn from_params(params: &Params) -> Result<Self> {
        let base = base_params(&CONTRAST, params)?;
        let range = params.range("contrast_range", (1.0, 1.0), CONTRAST_BOUNDS.0, CONTRAST_BOUNDS.1)?;
        Ok(Self::new(range)?.with_params(base))
    }
}

impl TypedTransform for Contrast {
    type State = [u8; 256];

    fn descriptor() -> &'static Descriptor {
        &CONTRAST
    }

    fn handlers() -> Handlers<Self, [u8; 256]> {
        Handlers {
            image: Some(Self::image),
            ..Handlers::none()
        }
    }

    fn params(&self) -> &TransformParams {
        &self.params
    }

    fn sample(&self, _: &Targets<'_>, rng: &mut dyn RngCore) -> Result<[u8; 256]> {
        let factor = uniform(rng, self.range);
        Ok(build_lut(|v| v * factor))
    }
}

// ============================================================================
// GammaCorrection
// ============================================================================

pub(crate) static GAMMA_CORRECTION: Descriptor = Descriptor {
    name: "GammaCorrection",
    params: &["p", "data_indices", "gamma_range"],
    item_types: IMAGES,
    data_dependent: false,
};

/// `v' = 255 * (v / 255) ^ gamma`, with gamma drawn from `gamma_range`.
#[derive(Debug, Clone)]
pub struct GammaCorrection {
    params: TransformParams,
    range: (f64, f64),
}

impl GammaCorrection {
    pub fn new(range: (f64, f64)) -> Result<Self> {
        let (min, max) = GAMMA_BOUNDS;
        Ok(Self {
            params: TransformParams::default(),
            range: check_range("gamma_range", range, min, max)?,
        })
    }

    pub fn with_params(mut self, params: TransformParams) -> Self {
        self.params = params;
        self
    }

    fn image(&self, img: &DynamicImage, lut: &[u8; 256]) -> Result<DynamicImage> {
        apply_lut(img, lut)
    }
}

impl FromParams for GammaCorrection {
    fn from_params(params: &Params) -> Result<Self> {
        let base = base_params(&GAMMA_CORRECTION, params)?;
        let range = params.range("gamma_range", (1.0, 1.0), GAMMA_BOUNDS.0, GAMMA_BOUNDS.1)?;
        Ok(Self::new(range)?.with_params(base))
    }
}

impl TypedTransform for GammaCorrection {
    type State = [u8; 256];

    fn descriptor() -> &'static Descriptor {
        &GAMMA_CORRECTION
    }

    fn handlers() -> Handlers<Self, [u8; 256]> {
        Handlers {
            image: Some(Self::image),
            ..Handlers::none()
        }
    }

    fn params(&self) -> &TransformParams {
        &self.params
    }

    fn sample(&self, _: &Targets<'_>, rng: &mut dyn RngCore) -> Result<[u8; 256]> {
        let gamma = uniform(rng, self.range);
        Ok(build_lut(|v| 255.0 * (v / 255.0).powf(gamma)))
    }
}

// ============================================================================
// HSV
// ============================================================================

pub(crate) static HSV_SHIFT: Descriptor = Descriptor {
    name: "HSV",
    params: &["p", "data_indices", "h_range", "s_range", "v_range"],
    item_types: IMAGES,
    data_dependent: false,
};

/// Shifts hue in degrees, saturation and value on a 0..255 scale.
///
/// Grayscale images carry no hue and fail with a value error.
#[derive(Debug, Clone)]
pub struct HSV {
    params: TransformParams,
    h_range: (f64, f64),
    s_range: (f64, f64),
    v_range: (f64, f64),
}

impl HSV {
    pub fn new(h_range: (f64, f64), s_range: (f64, f64), v_range: (f64, f64)) -> Result<Self> {
        Ok(Self {
            params: TransformParams::default(),
            h_range: check_range("h_range", h_range, HUE_BOUNDS.0, HUE_BOUNDS.1)?,
            s_range: check_range("s_range", s_range, SV_BOUNDS.0, SV_BOUNDS.1)?,
            v_range: check_range("v_range", v_range, SV_BOUNDS.0, SV_BOUNDS.1)?,
        })
    }

    pub fn with_params(mut self, params: TransformParams) -> Self {
        self.params = params;
        self
    }

    fn image(&self, img: &DynamicImage, &[dh, ds, dv]: &[f32; 3]) -> Result<DynamicImage> {
        shift_hsv(img, dh, ds, dv)
    }
}

impl FromParams for HSV {
    fn from_params(params: &Params) -> Result<Self> {
        let base = base_params(&HSV_SHIFT, params)?;
        let h_range = params.range("h_range", (0.0, 0.0), HUE_BOUNDS.0, HUE_BOUNDS.1)?;
        let s_range = params.range("s_range", (0.0, 0.0), SV_BOUNDS.0, SV_BOUNDS.1)?;
        let v_range = params.range("v_range", (0.0, 0.0), SV_BOUNDS.0, SV_BOUNDS.1)?;
        Ok(Self::new(h_range, s_range, v_range)?.with_params(base))
    }
}

impl TypedTransform for HSV {
    type State = [f32; 3];

    fn descriptor() -> &'static Descriptor {
        &HSV_SHIFT
    }

    fn handlers() -> Handlers<Self, [f32; 3]> {
        Handlers {
            image: Some(Self::image),
            ..Handlers::none()
        }
    }

    fn params(&self) -> &TransformParams {
        &self.params
    }

    fn sample(&self, _: &Targets<'_>, rng: &mut dyn RngCore) -> Result<[f32; 3]> {
        Ok([
            uniform(rng, self.h_range) as f32,
            uniform(rng, self.s_range) as f32,
            uniform(rng, self.v_range) as f32,
        ])
    }
}
