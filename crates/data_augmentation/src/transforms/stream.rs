use crate::container::{DataContainer, ItemType};
use crate::error::TransformError;
use crate::rng::with_rng;
use crate::transforms::base::{BaseTransform, Descriptor, TransformParams};
use crate::transforms::Transform;
use anyhow::{ensure, Context, Result};
use rand::distr::{weighted::WeightedIndex, Distribution};
use rand::seq::index;
use rand::RngCore;
use std::borrow::Cow;
use tracing::{debug, trace};

static STREAM: Descriptor = Descriptor {
    name: "Stream",
    params: &[],
    item_types: &ItemType::ALL,
    data_dependent: false,
};

static SELECTIVE_STREAM: Descriptor = Descriptor {
    name: "SelectiveStream",
    params: &[],
    item_types: &ItemType::ALL,
    data_dependent: false,
};

/// Threads a container through `stages` in order. The first stage reads
/// the caller's container; later stages read the previous output.
fn run_stages<'a>(
    stream: &'static str,
    stages: impl Iterator<Item = &'a dyn BaseTransform>,
    data: &DataContainer,
    rng: &mut dyn RngCore,
) -> Result<DataContainer> {
    let mut current = Cow::Borrowed(data);
    for (stage, transform) in stages.enumerate() {
        trace!(stream, stage, transform = transform.name(), "stage");
        let next = transform.call(&current, rng).with_context(|| {
            format!("{stream} stage {stage} ({}) failed", transform.name())
        })?;
        current = Cow::Owned(next);
    }
    Ok(current.into_owned())
}

// ============================================================================
// Stream
// ============================================================================

/// Sequential composition of transforms.
///
/// A `Stream` is itself a [`BaseTransform`] that always activates, so
/// streams nest: `Stream[a, Stream[b, c]]` behaves like `Stream[a, b, c]`.
/// An empty stream is the identity. The first failing stage aborts the
/// call; later stages never run.
///
/// # Example
/// ```ignore
/// let stream = Stream::new()
///     .push(Flip::new(FlipAxis::Horizontal).with_params(TransformParams::new(Some(0.5))?))
///     .push(Brightness::new((-20.0, 20.0))?);
/// let augmented = stream.call(&container, &mut rng)?;
/// ```
#[derive(Debug)]
pub struct Stream {
    transforms: Vec<Box<dyn BaseTransform>>,
    params: TransformParams,
}

impl Stream {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
            params: TransformParams::always(),
        }
    }

    pub fn from_transforms(transforms: Vec<Box<dyn BaseTransform>>) -> Self {
        Self {
            transforms,
            params: TransformParams::always(),
        }
    }

    /// Appends a stage.
    pub fn push(mut self, transform: impl BaseTransform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn transforms(&self) -> &[Box<dyn BaseTransform>] {
        &self.transforms
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseTransform for Stream {
    fn descriptor(&self) -> &'static Descriptor {
        &STREAM
    }

    fn params(&self) -> &TransformParams {
        &self.params
    }

    fn apply_to(
        &self,
        data: &DataContainer,
        _indices: &[usize],
        rng: &mut dyn RngCore,
    ) -> Result<DataContainer> {
        run_stages(
            STREAM.name,
            self.transforms.iter().map(|t| t.as_ref()),
            data,
            rng,
        )
    }
}

/// Draws from the thread-local generator (see [`crate::rng`]).
impl Transform<DataContainer, DataContainer> for Stream {
    fn apply(&self, input: DataContainer) -> Result<DataContainer> {
        with_rng(|rng| self.call(&input, rng))
    }
}

// ============================================================================
// SelectiveStream
// ============================================================================

/// Applies `n` distinct members per call, chosen at random and run in the
/// order they were drawn.
///
/// Without `probs` every member is equally likely; with `probs` members
/// are drawn by weight, without replacement.
#[derive(Debug)]
pub struct SelectiveStream {
    transforms: Vec<Box<dyn BaseTransform>>,
    n: usize,
    probs: Option<Vec<f64>>,
    params: TransformParams,
}

impl SelectiveStream {
    pub fn new(
        transforms: Vec<Box<dyn BaseTransform>>,
        n: usize,
        probs: Option<Vec<f64>>,
    ) -> Result<Self> {
        ensure!(
            n <= transforms.len(),
            TransformError::parameter_value(
                "n",
                format!("cannot select {n} of {} transforms", transforms.len())
            )
        );
        if let Some(probs) = &probs {
            ensure!(
                probs.len() == transforms.len(),
                TransformError::parameter_value(
                    "probs",
                    format!("{} weights for {} transforms", probs.len(), transforms.len())
                )
            );
            ensure!(
                probs.iter().all(|w| w.is_finite() && *w >= 0.0),
                TransformError::parameter_value("probs", "weights must be finite and non-negative")
            );
            let positive = probs.iter().filter(|w| **w > 0.0).count();
            ensure!(
                positive >= n,
                TransformError::parameter_value(
                    "probs",
                    format!("only {positive} transforms have positive weight, {n} requested")
                )
            );
        }
        Ok(Self {
            transforms,
            n,
            probs,
            params: TransformParams::always(),
        })
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Draws the members to run for one call.
    fn pick(&self, rng: &mut dyn RngCore) -> Result<Vec<usize>> {
        let Some(probs) = &self.probs else {
            return Ok(index::sample(rng, self.transforms.len(), self.n).into_vec());
        };
        let mut weights = probs.clone();
        let mut picked = Vec::with_capacity(self.n);
        for _ in 0..self.n {
            let distribution = WeightedIndex::new(&weights)
                .map_err(|e| TransformError::parameter_value("probs", e.to_string()))?;
            let i = distribution.sample(rng);
            weights[i] = 0.0;
            picked.push(i);
        }
        Ok(picked)
    }
}

impl BaseTransform for SelectiveStream {
    fn descriptor(&self) -> &'static Descriptor {
        &SELECTIVE_STREAM
    }

    fn params(&self) -> &TransformParams {
        &self.params
    }

    fn apply_to(
        &self,
        data: &DataContainer,
        _indices: &[usize],
        rng: &mut dyn RngCore,
    ) -> Result<DataContainer> {
        let picked = self.pick(rng)?;
        debug!(?picked, "selective stream picked members");
        run_stages(
            SELECTIVE_STREAM.name,
            picked.iter().map(|&i| self.transforms[i].as_ref()),
            data,
            rng,
        )
    }
}

impl Transform<DataContainer, DataContainer> for SelectiveStream {
    fn apply(&self, input: DataContainer) -> Result<DataContainer> {
        with_rng(|rng| self.call(&input, rng))
    }
}
