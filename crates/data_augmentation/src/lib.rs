//! Typed-container transform composition for perception data.
//!
//! One sample's images, masks, keypoints and labels travel together in a
//! [`DataContainer`]. Transforms decide once per call whether to act, draw
//! their random state once, and route each targeted item to a per-type
//! handler, so spatial edits stay consistent across every item of the
//! sample.
//!
//! ```text
//! RawData ──wrap──→ DataContainer ──Stream──→ DataContainer ──Export──→ Exported
//! ```

pub mod container;
pub mod error;
pub mod export;
pub mod keypoints;
pub mod params;
pub mod rng;
pub mod transforms;

pub use container::{wrap, DataContainer, Item, ItemType, Label, RawData};
pub use error::{error_kind, ErrorKind, TransformError};
pub use export::{Export, ExportOptions, Exported, ExportedItem};
pub use keypoints::{Frame, KeyPoints};
pub use params::{ParamValue, Params};
pub use transforms::{BaseTransform, SelectiveStream, Stream, Transform, TransformParams};
