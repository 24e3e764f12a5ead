use crate::container::{DataContainer, Item, ItemType, Label};
use crate::keypoints::{Frame, KeyPoints};
use crate::params::Params;
use crate::transforms::base::{BaseTransform, Descriptor, TransformParams};
use crate::transforms::data_dependent::common_frame;
use anyhow::Result;
use image::{DynamicImage, GrayImage};
use rand::RngCore;
use std::fmt;

pub type ImageHandler<T, S> = fn(&T, &DynamicImage, &S) -> Result<DynamicImage>;
pub type MaskHandler<T, S> = fn(&T, &GrayImage, &S) -> Result<GrayImage>;
pub type KeyPointsHandler<T, S> = fn(&T, &KeyPoints, &S) -> Result<KeyPoints>;
pub type LabelHandler<T, S> = fn(&T, &Label, &S) -> Result<Label>;

/// Explicit mapping from item type to handler.
///
/// A missing entry means items of that type pass through untouched.
pub struct Handlers<T, S> {
    pub image: Option<ImageHandler<T, S>>,
    pub mask: Option<MaskHandler<T, S>>,
    pub keypoints: Option<KeyPointsHandler<T, S>>,
    pub label: Option<LabelHandler<T, S>>,
}

impl<T, S> Handlers<T, S> {
    /// A table with no handlers.
    pub const fn none() -> Self {
        Self {
            image: None,
            mask: None,
            keypoints: None,
            label: None,
        }
    }

    pub fn supports(&self, item_type: ItemType) -> bool {
        match item_type {
            ItemType::Image => self.image.is_some(),
            ItemType::Mask => self.mask.is_some(),
            ItemType::KeyPoints => self.keypoints.is_some(),
            ItemType::Label => self.label.is_some(),
        }
    }

    fn handle(&self, owner: &T, item: &Item, state: &S) -> Result<Option<Item>> {
        Ok(match item {
            Item::Image(img) => match self.image {
                Some(f) => Some(Item::Image(f(owner, img, state)?)),
                None => None,
            },
            Item::Mask(mask) => match self.mask {
                Some(f) => Some(Item::Mask(f(owner, mask, state)?)),
                None => None,
            },
            Item::KeyPoints(kpts) => match self.keypoints {
                Some(f) => Some(Item::KeyPoints(f(owner, kpts, state)?)),
                None => None,
            },
            Item::Label(label) => match self.label {
                Some(f) => Some(Item::Label(f(owner, label, state)?)),
                None => None,
            },
        })
    }

    /// Runs the registered handler on every targeted position and copies
    /// all other items. Any handler failure discards the whole result.
    pub fn dispatch(
        &self,
        owner: &T,
        data: &DataContainer,
        indices: &[usize],
        state: &S,
    ) -> Result<DataContainer> {
        let items = data
            .items()
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let transformed = if indices.contains(&i) {
                    self.handle(owner, item, state)?
                } else {
                    None
                };
                Ok(transformed.unwrap_or_else(|| item.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(data.with_items(items))
    }
}

/// What a typed transform sees when it samples its per-call state.
#[derive(Debug, Clone, Copy)]
pub struct Targets<'a> {
    pub data: &'a DataContainer,
    pub indices: &'a [usize],
    /// Common frame of the targeted spatial items. Only gathered for
    /// data-dependent transforms, and `None` when nothing spatial is targeted.
    pub frame: Option<Frame>,
}

/// A transform that acts through a per-type [`Handlers`] table.
///
/// `sample` draws the call's random state once; every handler invoked in
/// that call receives the same state. Implementors get [`BaseTransform`]
/// for free.
pub trait TypedTransform: Send + Sync + fmt::Debug + Sized {
    type State;

    fn descriptor() -> &'static Descriptor;

    fn handlers() -> Handlers<Self, Self::State>;

    fn params(&self) -> &TransformParams;

    fn sample(&self, targets: &Targets<'_>, rng: &mut dyn RngCore) -> Result<Self::State>;
}

impl<T: TypedTransform> BaseTransform for T {
    fn descriptor(&self) -> &'static Descriptor {
        <T as TypedTransform>::descriptor()
    }

    fn params(&self) -> &TransformParams {
        TypedTransform::params(self)
    }

    fn apply_to(
        &self,
        data: &DataContainer,
        indices: &[usize],
        rng: &mut dyn RngCore,
    ) -> Result<DataContainer> {
        let handlers = T::handlers();
        let descriptor = <T as TypedTransform>::descriptor();
        let frame = if descriptor.data_dependent {
            common_frame(descriptor.name, data, indices, |t| handlers.supports(t))?
        } else {
            None
        };
        let targets = Targets {
            data,
            indices,
            frame,
        };
        let state = self.sample(&targets, rng)?;
        handlers.dispatch(self, data, indices, &state)
    }
}

/// Validates the shared keyword surface of a typed transform: unknown
/// names first, then `p` and `data_indices`.
pub fn base_params(descriptor: &Descriptor, params: &Params) -> Result<TransformParams> {
    params.check_names(descriptor.name, descriptor.params)?;
    TransformParams::from_params(params)
}
