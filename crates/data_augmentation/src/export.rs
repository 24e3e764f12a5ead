//! src/export.rs
//!
//! Converts a transformed `DataContainer` into its output layout.
//!
//! Example:
//! ```ignore
//! let options = ExportOptions::builder()
//!     .return_tensor(true)
//!     .normalize(vec![0.5], vec![0.25])
//!     .build();
//! let exported = Export::new(options)?.apply(container)?;
//! ```

use crate::container::{DataContainer, Item, ItemType, Label};
use crate::error::TransformError;
use crate::keypoints::KeyPoints;
use crate::transforms::vision::conversion::{keypoints_to_tensor, mask_to_tensor};
pub use crate::transforms::vision::{Normalize, ToTensor};
use crate::transforms::{Chain, Transform};
use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage};
use std::collections::BTreeMap;
use tch::Tensor;
use tracing::debug;

/// Output layout of an exported container.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Convert items to tensors (default: false)
    pub return_tensor: bool,
    /// Key items by kind instead of returning them in order (default: true)
    pub as_dict: bool,
    /// Per-channel mean; a single value broadcasts
    pub mean: Option<Vec<f32>>,
    /// Per-channel std; must accompany `mean`
    pub std: Option<Vec<f32>>,
    /// Divide keypoint tensors by the frame extent (default: true)
    pub scale_keypoints: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            return_tensor: false,
            as_dict: true,
            mean: None,
            std: None,
            scale_keypoints: true,
        }
    }
}

impl ExportOptions {
    pub fn builder() -> ExportOptionsBuilder {
        ExportOptionsBuilder::default()
    }
}

/// Builder for ExportOptions with method chaining
#[derive(Default)]
pub struct ExportOptionsBuilder {
    options: ExportOptions,
}

impl ExportOptionsBuilder {
    pub fn return_tensor(mut self, return_tensor: bool) -> Self {
        self.options.return_tensor = return_tensor;
        self
    }

    pub fn as_dict(mut self, as_dict: bool) -> Self {
        self.options.as_dict = as_dict;
        self
    }

    /// Normalize image tensors with these statistics
    pub fn normalize(mut self, mean: Vec<f32>, std: Vec<f32>) -> Self {
        self.options.mean = Some(mean);
        self.options.std = Some(std);
        self
    }

    pub fn scale_keypoints(mut self, scale: bool) -> Self {
        self.options.scale_keypoints = scale;
        self
    }

    pub fn build(self) -> ExportOptions {
        self.options
    }
}

/// One exported item.
#[derive(Debug)]
pub enum ExportedItem {
    Tensor(Tensor),
    Image(DynamicImage),
    Mask(GrayImage),
    KeyPoints(KeyPoints),
    Label(Label),
}

impl ExportedItem {
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Self::Tensor(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&DynamicImage> {
        match self {
            Self::Image(img) => Some(img),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum Exported {
    /// Keyed `image`, `image_1`, ..., `mask`, `keypoints`, `label`.
    Dict(BTreeMap<String, ExportedItem>),
    /// Container order.
    Tuple(Vec<ExportedItem>),
    /// A one-item container exported without keys.
    Single(ExportedItem),
}

impl Exported {
    pub fn get(&self, key: &str) -> Option<&ExportedItem> {
        match self {
            Self::Dict(map) => map.get(key),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Dict(map) => map.len(),
            Self::Tuple(items) => items.len(),
            Self::Single(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dict keys for the given item types: the first of each kind takes the
/// bare field name, later ones get `_1`, `_2`, ...
pub fn export_keys(item_types: impl IntoIterator<Item = ItemType>) -> Vec<String> {
    let mut seen: BTreeMap<ItemType, usize> = BTreeMap::new();
    item_types
        .into_iter()
        .map(|item_type| {
            let count = seen.entry(item_type).or_insert(0);
            let key = match *count {
                0 => item_type.field_name().to_string(),
                n => format!("{}_{n}", item_type.field_name()),
            };
            *count += 1;
            key
        })
        .collect()
}

/// Validated exporter.
#[derive(Debug)]
pub struct Export {
    options: ExportOptions,
    image_pipeline: Option<Chain<ToTensor, Normalize, Tensor>>,
}

impl Export {
    pub fn new(options: ExportOptions) -> Result<Self> {
        let image_pipeline = match (&options.mean, &options.std) {
            (Some(mean), Some(std)) => Some(ToTensor.then(Normalize::new(mean, std)?)),
            (None, None) => None,
            _ => {
                return Err(TransformError::ExportOptions(
                    "mean and std must be given together".into(),
                )
                .into())
            }
        };
        Ok(Self {
            options,
            image_pipeline,
        })
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    fn image_tensor(&self, img: DynamicImage) -> Result<Tensor> {
        match &self.image_pipeline {
            Some(pipeline) => pipeline.apply(img),
            None => ToTensor.apply(img),
        }
    }

    fn export_item(&self, item: Item) -> Result<ExportedItem> {
        if !self.options.return_tensor {
            return Ok(match item {
                Item::Image(img) => ExportedItem::Image(img),
                Item::Mask(mask) => ExportedItem::Mask(mask),
                Item::KeyPoints(kpts) => ExportedItem::KeyPoints(kpts),
                Item::Label(label) => ExportedItem::Label(label),
            });
        }
        Ok(match item {
            Item::Image(img) => ExportedItem::Tensor(self.image_tensor(img)?),
            Item::Mask(mask) => ExportedItem::Tensor(mask_to_tensor(&mask)),
            Item::KeyPoints(kpts) => {
                ExportedItem::Tensor(keypoints_to_tensor(&kpts, self.options.scale_keypoints))
            }
            Item::Label(Label::Int(v)) => ExportedItem::Tensor(Tensor::from(v)),
            Item::Label(Label::Float(v)) => ExportedItem::Tensor(Tensor::from(v)),
            Item::Label(label @ Label::Text(_)) => ExportedItem::Label(label),
        })
    }
}

impl Transform<DataContainer, Exported> for Export {
    fn apply(&self, data: DataContainer) -> Result<Exported> {
        debug!(
            items = data.len(),
            return_tensor = self.options.return_tensor,
            as_dict = self.options.as_dict,
            "export"
        );
        let keys = export_keys(data.iter().map(|(_, item_type)| item_type));
        let mut items = data
            .into_items()
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                self.export_item(item)
                    .with_context(|| format!("Failed to export item {i}"))
            })
            .collect::<Result<Vec<_>>>()?;

        if self.options.as_dict {
            return Ok(Exported::Dict(keys.into_iter().zip(items).collect()));
        }
        Ok(match items.len() {
            1 => Exported::Single(items.remove(0)),
            _ => Exported::Tuple(items),
        })
    }
}
