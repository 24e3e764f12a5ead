//! Cross-item checks for transforms whose random state spans several items.
//!
//! A data-dependent transform (noise fields, crop windows) samples one
//! state at the size of the targeted items, so those items must agree on
//! their frame. The check runs before sampling and before any handler.

use crate::container::{DataContainer, ItemType};
use crate::error::TransformError;
use crate::keypoints::Frame;
use anyhow::{bail, Result};

/// Returns the frame shared by every targeted item whose type passes
/// `relevant`, or `None` if no such item is targeted.
///
/// Fails with a value error naming the first two positions that disagree.
pub fn common_frame(
    transform: &'static str,
    data: &DataContainer,
    indices: &[usize],
    relevant: impl Fn(ItemType) -> bool,
) -> Result<Option<Frame>> {
    let mut reference: Option<(usize, Frame)> = None;
    for &i in indices {
        let Some((item, item_type)) = data.get(i) else {
            continue;
        };
        if !relevant(item_type) {
            continue;
        }
        let Some(frame) = item.frame() else {
            continue;
        };
        match reference {
            None => reference = Some((i, frame)),
            Some((first, first_frame)) if first_frame != frame => {
                bail!(TransformError::FrameMismatch {
                    transform,
                    first,
                    first_frame: first_frame.to_string(),
                    second: i,
                    second_frame: frame.to_string(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(reference.map(|(_, frame)| frame))
}
