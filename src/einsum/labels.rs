//! Set algebra over subscript labels.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{EinsumError, EinsumResult};

/// A symbol naming one tensor axis (`char` for string subscripts, or any
/// small copyable key such as `usize`).
pub trait Label: Copy + Eq + Hash + Debug {}

impl<L: Copy + Eq + Hash + Debug> Label for L {}

pub(crate) fn fmt_label<L: Label>(label: &L) -> String {
    format!("{:?}", label)
}

pub(crate) fn fmt_labels<L: Label>(labels: &[L]) -> String {
    format!("{:?}", labels)
}

/// Fail if `labels` contains the same label twice.
///
/// Repeated labels would mean diagonal extraction, which is not supported.
pub fn check_unique<L: Label>(labels: &[L], operand: &'static str) -> EinsumResult<()> {
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(*label) {
            return Err(EinsumError::RepeatedLabel {
                label: fmt_label(label),
                operand,
            });
        }
    }
    Ok(())
}

/// Fail if some output label is carried by none of the inputs.
pub fn check_output_covered<L: Label>(inputs: &[&[L]], out: &[L]) -> EinsumResult<()> {
    let available: HashSet<L> = inputs.iter().flat_map(|ix| ix.iter().copied()).collect();
    match out.iter().find(|l| !available.contains(*l)) {
        Some(label) => Err(EinsumError::OutputLabelNotInInputs {
            label: fmt_label(label),
        }),
        None => Ok(()),
    }
}

/// Role of every label in a two-operand contraction.
///
/// Each list keeps the order in which its labels first appear in operand
/// `a` (or `b`, for the lists that only concern `b`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPartition<L: Label> {
    /// In both operands and in the output: batch axes.
    pub shared_kept: Vec<L>,
    /// In both operands but not in the output: the contracted axes.
    pub shared_summed: Vec<L>,
    /// Only in `a`, kept in the output.
    pub a_free: Vec<L>,
    /// Only in `b`, kept in the output.
    pub b_free: Vec<L>,
    /// Only in `a` and absent from the output: summed away up front.
    pub a_reduced: Vec<L>,
    /// Only in `b` and absent from the output: summed away up front.
    pub b_reduced: Vec<L>,
}

impl<L: Label> LabelPartition<L> {
    /// Validate the three label lists and classify every label.
    pub fn new(a: &[L], b: &[L], out: &[L]) -> EinsumResult<Self> {
        check_unique(a, "operand a")?;
        check_unique(b, "operand b")?;
        check_unique(out, "output")?;
        check_output_covered(&[a, b], out)?;

        let a_set: HashSet<L> = a.iter().copied().collect();
        let b_set: HashSet<L> = b.iter().copied().collect();
        let out_set: HashSet<L> = out.iter().copied().collect();

        let mut partition = Self {
            shared_kept: Vec::new(),
            shared_summed: Vec::new(),
            a_free: Vec::new(),
            b_free: Vec::new(),
            a_reduced: Vec::new(),
            b_reduced: Vec::new(),
        };

        for &l in a {
            match (b_set.contains(&l), out_set.contains(&l)) {
                (true, true) => partition.shared_kept.push(l),
                (true, false) => partition.shared_summed.push(l),
                (false, true) => partition.a_free.push(l),
                (false, false) => partition.a_reduced.push(l),
            }
        }
        for &l in b.iter().filter(|l| !a_set.contains(*l)) {
            if out_set.contains(&l) {
                partition.b_free.push(l);
            } else {
                partition.b_reduced.push(l);
            }
        }

        Ok(partition)
    }

    /// Label order of the raw batched product: `shared_kept ++ a_free ++ b_free`.
    pub fn product_labels(&self) -> Vec<L> {
        self.shared_kept
            .iter()
            .chain(&self.a_free)
            .chain(&self.b_free)
            .copied()
            .collect()
    }

    /// True when nothing is left to sum away before the product.
    pub fn is_reduced(&self) -> bool {
        self.a_reduced.is_empty() && self.b_reduced.is_empty()
    }
}
