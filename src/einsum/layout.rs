//! Moving between labeled n-D layouts and the 3-axis product layout.

use std::collections::HashMap;

use super::labels::{check_unique, fmt_labels, Label};
use super::shapes::ExtentMap;
use crate::error::{EinsumError, EinsumResult};
use crate::ops::ArrayOps;

/// Reorder the axes of `arr` from label order `from` to label order `to`.
///
/// Both lists must hold the same labels, each exactly once. An identity
/// reordering returns the input unchanged.
pub fn transpose_labels<A: ArrayOps, L: Label>(arr: &A, from: &[L], to: &[L]) -> EinsumResult<A> {
    check_unique(from, "transpose source")?;
    check_unique(to, "transpose target")?;

    let position: HashMap<L, usize> = from.iter().enumerate().map(|(i, &l)| (l, i)).collect();
    let perm: Option<Vec<usize>> = to.iter().map(|l| position.get(l).copied()).collect();
    let perm = match perm {
        Some(perm) if from.len() == to.len() => perm,
        _ => {
            return Err(EinsumError::LabelMismatch {
                from: fmt_labels(from),
                to: fmt_labels(to),
            })
        }
    };

    if perm.iter().enumerate().all(|(i, &p)| i == p) {
        return Ok(arr.clone());
    }
    Ok(arr.permute_axes(&perm))
}

/// Bring `arr` into `[|g0|, |g1|, |g2|]` layout.
///
/// The axes are first ordered as `g0 ++ g1 ++ g2`, then each group is merged
/// into a single axis whose extent is the product of its labels' extents.
/// An empty group becomes an axis of extent 1, so the result always has
/// exactly three axes.
pub fn pack<A: ArrayOps, L: Label>(
    arr: &A,
    labels: &[L],
    groups: [&[L]; 3],
    extents: &ExtentMap<L>,
) -> EinsumResult<A> {
    let order: Vec<L> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let ordered = transpose_labels(arr, labels, &order)?;

    let shape: Vec<usize> = groups.iter().map(|g| extents.group_size(g)).collect();
    Ok(ordered.reshaped(&shape))
}

/// Inverse of [`pack`]: split merged axes back into one axis per label of
/// `current`, then reorder to `desired`.
pub fn unpack<A: ArrayOps, L: Label>(
    arr: &A,
    current: &[L],
    desired: &[L],
    extents: &ExtentMap<L>,
) -> EinsumResult<A> {
    let shape = extents.extents_of(current);
    let split = if arr.dims() == shape {
        arr.clone()
    } else {
        arr.reshaped(&shape)
    };
    transpose_labels(&split, current, desired)
}
