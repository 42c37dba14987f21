//! Up-front reduction of axes no other party needs.

use std::collections::HashSet;

use super::labels::Label;
use crate::ops::ArrayOps;

/// Sum away every axis of `arr` whose label appears in none of `keep`.
///
/// All such axes are reduced in a single `sum_over` call. Returns the
/// reduced array and its surviving labels in their original relative order.
/// When nothing needs summing the input is returned as-is (shared, not copied).
pub fn sum_unique_axes<A: ArrayOps, L: Label>(arr: &A, labels: &[L], keep: &[&[L]]) -> (A, Vec<L>) {
    let keep: HashSet<L> = keep.iter().flat_map(|ix| ix.iter().copied()).collect();

    let (summed, kept): (Vec<(usize, L)>, Vec<(usize, L)>) = labels
        .iter()
        .copied()
        .enumerate()
        .partition(|(_, l)| !keep.contains(l));

    let kept: Vec<L> = kept.into_iter().map(|(_, l)| l).collect();
    if summed.is_empty() {
        return (arr.clone(), kept);
    }

    let axes: Vec<usize> = summed.iter().map(|&(axis, _)| axis).collect();
    (arr.sum_over(&axes), kept)
}
