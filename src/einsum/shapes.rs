//! Extent bookkeeping: which size every label has.

use std::collections::HashMap;

use super::labels::{fmt_label, Label};
use crate::error::{EinsumError, EinsumResult};

/// Fail unless `labels` names every axis of a tensor with extents `dims`.
pub fn check_rank<L: Label>(dims: &[usize], labels: &[L], operand: &'static str) -> EinsumResult<()> {
    if dims.len() != labels.len() {
        return Err(EinsumError::RankMismatch {
            operand,
            labels: labels.len(),
            ndim: dims.len(),
        });
    }
    Ok(())
}

/// Mapping from label to axis extent, filled once per contraction.
#[derive(Debug, Clone)]
pub struct ExtentMap<L: Label> {
    extents: HashMap<L, usize>,
}

impl<L: Label> Default for ExtentMap<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Label> ExtentMap<L> {
    pub fn new() -> Self {
        Self {
            extents: HashMap::new(),
        }
    }

    /// Build the map from several `(dims, labels)` operands, in order.
    ///
    /// The first operand to mention a label fixes its extent; any later
    /// disagreement is a [`EinsumError::ShapeMismatch`] naming that label.
    pub fn from_operands(operands: &[(&[usize], &[L])]) -> EinsumResult<Self> {
        let mut map = Self::new();
        for (dims, labels) in operands {
            map.record(dims, labels)?;
        }
        Ok(map)
    }

    /// Record the extents of one operand.
    pub fn record(&mut self, dims: &[usize], labels: &[L]) -> EinsumResult<()> {
        for (&label, &extent) in labels.iter().zip(dims) {
            match self.extents.get(&label) {
                Some(&expected) if expected != extent => {
                    return Err(EinsumError::ShapeMismatch {
                        label: fmt_label(&label),
                        expected,
                        got: extent,
                    });
                }
                Some(_) => {}
                None => {
                    self.extents.insert(label, extent);
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, label: &L) -> Option<usize> {
        self.extents.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.extents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    /// Extents of `labels`, in order.
    ///
    /// # Panics
    ///
    /// Panics if a label was never recorded.
    pub fn extents_of(&self, labels: &[L]) -> Vec<usize> {
        labels
            .iter()
            .map(|l| {
                self.get(l)
                    .unwrap_or_else(|| panic!("No extent recorded for label {:?}", l))
            })
            .collect()
    }

    /// Number of elements spanned by `labels` (1 for an empty group).
    pub fn group_size(&self, labels: &[L]) -> usize {
        self.extents_of(labels).into_iter().product()
    }
}
