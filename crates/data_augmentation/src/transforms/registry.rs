//! Static table of the leaf transforms constructible from keyword
//! parameters.
//!
//! Generic checks (parameter validation, identity at `p = 0`) iterate this
//! table instead of discovering transform types at runtime.

use crate::error::TransformError;
use crate::params::Params;
use crate::transforms::base::{BaseTransform, Descriptor};
use crate::transforms::typed::TypedTransform;
use crate::transforms::vision::{
    Brightness, Contrast, Crop, Flip, GammaCorrection, Noise, Rotate90, SaltAndPepper, HSV,
};
use anyhow::Result;

/// Construction from the dynamic keyword surface.
pub trait FromParams: Sized {
    fn from_params(params: &Params) -> Result<Self>;
}

type Builder = fn(&Params) -> Result<Box<dyn BaseTransform>>;

/// One constructible transform: its capability descriptor and a builder.
#[derive(Clone, Copy)]
pub struct Entry {
    descriptor: fn() -> &'static Descriptor,
    build: Builder,
}

impl Entry {
    pub fn descriptor(&self) -> &'static Descriptor {
        (self.descriptor)()
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    pub fn build(&self, params: &Params) -> Result<Box<dyn BaseTransform>> {
        (self.build)(params)
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Entry").field(&self.name()).finish()
    }
}

fn build<T>(params: &Params) -> Result<Box<dyn BaseTransform>>
where
    T: TypedTransform + FromParams + 'static,
{
    Ok(Box::new(T::from_params(params)?))
}

macro_rules! entries {
    ($($t:ty),* $(,)?) => {
        [$(Entry {
            descriptor: <$t as TypedTransform>::descriptor,
            build: build::<$t>,
        }),*]
    };
}

static REGISTRY: [Entry; 9] = entries![
    Flip,
    Rotate90,
    Crop,
    Brightness,
    Contrast,
    GammaCorrection,
    HSV,
    Noise,
    SaltAndPepper,
];

/// Every registered transform, in a stable order.
pub fn registry() -> &'static [Entry] {
    &REGISTRY
}

pub fn lookup(name: &str) -> Option<&'static Entry> {
    REGISTRY.iter().find(|entry| entry.name() == name)
}

/// Builds the named transform from keyword parameters.
pub fn build_transform(name: &str, params: &Params) -> Result<Box<dyn BaseTransform>> {
    let entry = lookup(name).ok_or_else(|| TransformError::UnknownTransform(name.to_string()))?;
    entry.build(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{error_kind, ErrorKind};

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = registry().iter().map(Entry::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), registry().len());
    }

    #[test]
    fn test_every_entry_builds_with_defaults() -> Result<()> {
        for entry in registry() {
            let t = entry.build(&Params::new())?;
            assert_eq!(t.name(), entry.name());
            assert_eq!(t.params().p(), 0.5);
            assert!(entry.descriptor().accepts("p"));
            assert!(entry.descriptor().accepts("data_indices"));
        }
        Ok(())
    }

    #[test]
    fn test_unknown_names() {
        let err = build_transform("Blur", &Params::new()).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Value));

        let err = build_transform("Flip", &Params::new().set("angle", 3_i64)).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Type));
    }
}
