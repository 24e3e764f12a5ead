use crate::container::{wrap, DataContainer, ItemType, RawData};
use crate::export::{Export, ExportOptions, Exported};
use crate::params::{validate_probability, Params, DEFAULT_PROBABILITY};
use crate::transforms::Transform;
use anyhow::Result;
use rand::{Rng, RngCore};
use std::fmt;
use tracing::trace;

/// Static description of what a transform accepts and touches.
///
/// Replaces constructor introspection: generic checks query the
/// descriptor instead of discovering parameters at runtime.
#[derive(Debug)]
pub struct Descriptor {
    pub name: &'static str,
    /// Parameter names accepted by `from_params`.
    pub params: &'static [&'static str],
    /// Item types with a registered handler.
    pub item_types: &'static [ItemType],
    /// Whether targeted items must share one frame.
    pub data_dependent: bool,
}

impl Descriptor {
    pub fn accepts(&self, param: &str) -> bool {
        self.params.contains(&param)
    }

    pub fn supports(&self, item_type: ItemType) -> bool {
        self.item_types.contains(&item_type)
    }
}

/// Activation probability and targeted positions shared by every transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformParams {
    p: f64,
    data_indices: Option<Vec<usize>>,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            p: DEFAULT_PROBABILITY,
            data_indices: None,
        }
    }
}

impl TransformParams {
    /// `None` resolves to 0.5. Out-of-range probabilities are rejected.
    pub fn new(p: Option<f64>) -> Result<Self> {
        Ok(Self {
            p: validate_probability(p.unwrap_or(DEFAULT_PROBABILITY))?,
            data_indices: None,
        })
    }

    /// Always activates and targets every position.
    pub fn always() -> Self {
        Self {
            p: 1.0,
            data_indices: None,
        }
    }

    /// Restricts the transform to the given container positions.
    pub fn with_indices(mut self, indices: impl Into<Vec<usize>>) -> Self {
        self.data_indices = Some(indices.into());
        self
    }

    /// Reads `p` and `data_indices` from the keyword surface.
    pub fn from_params(params: &Params) -> Result<Self> {
        Ok(Self {
            p: params.probability()?,
            data_indices: params.data_indices()?,
        })
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn data_indices(&self) -> Option<&[usize]> {
        self.data_indices.as_deref()
    }

    /// One Bernoulli draw per call.
    pub fn decide(&self, rng: &mut dyn RngCore) -> bool {
        rng.random_bool(self.p)
    }

    /// Positions a call may touch; indices past `len` are dropped.
    pub fn effective_indices(&self, len: usize) -> Vec<usize> {
        match &self.data_indices {
            Some(indices) => indices.iter().copied().filter(|&i| i < len).collect(),
            None => (0..len).collect(),
        }
    }
}

/// The contract every transform implements.
///
/// A call follows two states, decided independently each time:
///
/// ```text
///            ┌── Bernoulli(p) fails ──→ Skipped: value-equal copy of input
/// call(dc) ──┤
///            └── Bernoulli(p) holds ──→ Applied: apply_to(dc, effective indices)
/// ```
///
/// `apply_to` must return a container with the input's length and type
/// codes, changing only the positions it supports inside `indices`.
pub trait BaseTransform: Send + Sync + fmt::Debug {
    fn descriptor(&self) -> &'static Descriptor;

    fn params(&self) -> &TransformParams;

    /// Applies the transform to the given positions, drawing any per-call
    /// randomness from `rng` once.
    fn apply_to(
        &self,
        data: &DataContainer,
        indices: &[usize],
        rng: &mut dyn RngCore,
    ) -> Result<DataContainer>;

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Decides whether to activate, then applies to the effective index set.
    fn call(&self, data: &DataContainer, rng: &mut dyn RngCore) -> Result<DataContainer> {
        let params = self.params();
        if !params.decide(rng) {
            trace!(transform = self.name(), "skipped");
            return Ok(data.clone());
        }
        let indices = params.effective_indices(data.len());
        trace!(transform = self.name(), ?indices, "applied");
        self.apply_to(data, &indices, rng)
    }

    /// Wraps `input`, calls the transform and exports the result.
    fn run(
        &self,
        input: RawData,
        options: &ExportOptions,
        rng: &mut dyn RngCore,
    ) -> Result<Exported> {
        let data = wrap(input)?;
        let out = self.call(&data, rng)?;
        Export::new(options.clone())?.apply(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_none_probability_becomes_half() -> Result<()> {
        assert_eq!(TransformParams::new(None)?.p(), 0.5);
        assert!(TransformParams::new(Some(-0.1)).is_err());
        Ok(())
    }

    #[test]
    fn test_effective_indices() {
        let all = TransformParams::always();
        assert_eq!(all.effective_indices(3), vec![0, 1, 2]);

        let some = TransformParams::always().with_indices(vec![0, 4, 9]);
        assert_eq!(some.effective_indices(7), vec![0, 4]);
    }

    #[test]
    fn test_decide_extremes() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let never = TransformParams::new(Some(0.0))?;
        let always = TransformParams::new(Some(1.0))?;
        for _ in 0..100 {
            assert!(!never.decide(&mut rng));
            assert!(always.decide(&mut rng));
        }
        Ok(())
    }
}
