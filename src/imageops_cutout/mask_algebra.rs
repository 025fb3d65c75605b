use crate::imageops_cutout::mask::{Mask, BACKGROUND, FOREGROUND};

/// How an incoming selection combines with the running one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MergeOp {
    /// Foreground where either mask is foreground
    Add,
    /// Foreground where the existing mask is and the incoming one is not
    Subtract,
}

/// Merges an incoming mask into the running selection.
///
/// With no existing mask the incoming one is returned unchanged. When the
/// dimensions differ the incoming mask is resampled (nearest neighbour) onto
/// the existing one first. `Subtract` is not commutative: callers fold
/// gestures strictly in the order the user made them.
///
/// # Examples
///
/// ```
/// use imageops_cutout::{merge, Mask, MergeOp};
///
/// let left = Mask::from_fn(4, 1, |x, _| x < 2);
/// let right = Mask::from_fn(4, 1, |x, _| x >= 2);
///
/// let both = merge(Some(&left), &right, MergeOp::Add);
/// assert_eq!(both.foreground_count(), 4);
///
/// let only_right = merge(Some(&both), &left, MergeOp::Subtract);
/// assert_eq!(only_right, right);
/// ```
pub fn merge(existing: Option<&Mask>, incoming: &Mask, op: MergeOp) -> Mask {
    let Some(existing) = existing else {
        return incoming.clone();
    };

    let (width, height) = existing.dimensions();
    let resampled;
    let incoming = if incoming.dimensions() == (width, height) {
        incoming
    } else {
        resampled = incoming.resize_nearest(width, height);
        &resampled
    };

    let combined = existing
        .as_image()
        .iter()
        .zip(incoming.as_image().iter())
        .map(|(&current, &new)| {
            let (current, new) = (current != BACKGROUND, new != BACKGROUND);
            let selected = match op {
                MergeOp::Add => current || new,
                MergeOp::Subtract => current && !new,
            };
            if selected {
                FOREGROUND
            } else {
                BACKGROUND
            }
        })
        .collect();

    Mask::from_raw(width, height, combined).unwrap_or_else(|_| existing.clone())
}

/// Left fold of [`merge`] over a gesture sequence.
pub fn merge_all<'a, I>(gestures: I) -> Option<Mask>
where
    I: IntoIterator<Item = (&'a Mask, MergeOp)>,
{
    gestures
        .into_iter()
        .fold(None, |running, (mask, op)| Some(merge(running.as_ref(), mask, op)))
}
