//! src/transforms/vision/mod.rs
//!
//! Leaf transforms over image-like items.
//!
//! # Module Organization
//!
//! ```text
//! transforms/vision/
//! ├── geometric.rs     → Spatial transformations (flip, rotate90, crop)
//! ├── photometric.rs   → Color and appearance (brightness, contrast, gamma, HSV)
//! ├── augmentation.rs  → Shared-field noise (noise, salt and pepper)
//! ├── conversion.rs    → Format conversions (image → tensor, normalize)
//! └── ops.rs           → Pixel kernels
//! ```
//!
//! Geometric transforms keep images, masks and keypoints of one sample
//! consistent; photometric and noise transforms only touch images.
//!
//! ```ignore
//! use data_augmentation::transforms::{BaseTransform, Stream, TransformParams};
//! use data_augmentation::transforms::vision::{Flip, FlipAxis, Brightness};
//!
//! let stream = Stream::new()
//!     .push(Flip::new(FlipAxis::Horizontal))
//!     .push(Brightness::new((-20.0, 20.0))?.with_params(TransformParams::always()));
//! let out = stream.call(&container, &mut rng)?;
//! ```

pub mod augmentation;
pub mod conversion;
pub mod geometric;
pub mod ops;
pub mod photometric;

pub use augmentation::{Noise, SaltAndPepper};
pub use conversion::{Normalize, ToTensor};
pub use geometric::{Crop, CropMode, CropWindow, Flip, FlipAxis, Rotate90};
pub use photometric::{Brightness, Contrast, GammaCorrection, HSV};
