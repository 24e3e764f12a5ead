//! Value-level pipeline stages: a container goes in, a container or an
//! export comes out.

use anyhow::{Context, Result};
use std::any::type_name;
use std::marker::PhantomData;

/// One deterministic stage of a sample pipeline, mapping `I` to `O`.
///
/// In this crate `I` is a [`DataContainer`] and `O` is either another
/// container or an [`Exported`] value. A [`Stream`] applies itself through
/// the thread-local generator, so a seeded stream followed by [`Export`]
/// is a single `Transform<DataContainer, Exported>`:
///
/// ```ignore
/// let pipeline = stream.then(Export::new(ExportOptions::builder().return_tensor(true).build())?);
/// let exported = pipeline.apply(container)?;
/// ```
///
/// Stages compose with `then` when the output of one is the input of the
/// next. Per-item randomised operations implement [`BaseTransform`].
///
/// [`DataContainer`]: crate::container::DataContainer
/// [`Exported`]: crate::export::Exported
/// [`Export`]: crate::export::Export
/// [`Stream`]: crate::transforms::Stream
/// [`BaseTransform`]: crate::transforms::BaseTransform
pub trait Transform<I, O>: Send + Sync {
    fn apply(&self, input: I) -> Result<O>;

    #[inline]
    fn then<T, M>(self, next: T) -> Chain<Self, T, O>
    where
        Self: Sized,
        T: Transform<O, M>,
        O: Send,
        M: Send,
    {
        Chain::new(self, next)
    }
}

/// Two stages run back to back; `M` is the hand-over type.
#[derive(Debug)]
pub struct Chain<A, B, M> {
    first: A,
    second: B,
    _marker: PhantomData<fn() -> M>,
}

impl<A, B, M> Chain<A, B, M> {
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            _marker: PhantomData,
        }
    }
}

/// Last path segment of a type name, without generic arguments.
fn stage_name<T>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl<I, M, O, A, B> Transform<I, O> for Chain<A, B, M>
where
    A: Transform<I, M>,
    B: Transform<M, O>,
    M: Send,
{
    fn apply(&self, input: I) -> Result<O> {
        let mid = self
            .first
            .apply(input)
            .with_context(|| format!("Pipeline stage {} failed", stage_name::<A>()))?;
        self.second
            .apply(mid)
            .with_context(|| format!("Pipeline stage {} failed", stage_name::<B>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{DataContainer, Item, Label};
    use anyhow::bail;

    struct AppendLabel(i64);
    impl Transform<DataContainer, DataContainer> for AppendLabel {
        fn apply(&self, input: DataContainer) -> Result<DataContainer> {
            let mut items = input.into_items();
            items.push(Item::from(self.0));
            Ok(DataContainer::from_items(items))
        }
    }

    struct CountItems;
    impl Transform<DataContainer, usize> for CountItems {
        fn apply(&self, input: DataContainer) -> Result<usize> {
            Ok(input.len())
        }
    }

    struct Reject;
    impl Transform<DataContainer, DataContainer> for Reject {
        fn apply(&self, _: DataContainer) -> Result<DataContainer> {
            bail!("rejected")
        }
    }

    #[test]
    fn test_then_preserves_order() -> Result<()> {
        let pipeline = AppendLabel(1).then(AppendLabel(2));
        let out = pipeline.apply(DataContainer::from_items(Vec::new()))?;
        assert_eq!(out.codes(), "LL");
        assert_eq!(out.item(1), Some(&Item::Label(Label::Int(2))));
        Ok(())
    }

    #[test]
    fn test_chain_changes_output_type() -> Result<()> {
        let chain = Chain::new(AppendLabel(7), CountItems);
        assert_eq!(chain.apply(DataContainer::from_items(Vec::new()))?, 1);
        Ok(())
    }

    #[test]
    fn test_chain_error_context() {
        let chain = Chain::new(AppendLabel(0), Reject);
        let err = chain.apply(DataContainer::from_items(Vec::new())).unwrap_err();
        let msg = format!("{err:#}");

        assert!(msg.contains("Pipeline stage Reject failed"));
        assert!(!msg.contains("AppendLabel"));
        assert!(msg.contains("rejected"));
    }
}
