//! The array capability the einsum engine is written against.
//!
//! The engine never touches tensor storage directly. Anything implementing
//! [`ArrayOps`] can be contracted: plain [`Tensor`]s, or tracked
//! [`Var`](crate::autodiff::Var)s whose operations are recorded for
//! reverse-mode differentiation.

use crate::algebra::Scalar;
use crate::backend::Backend;
use crate::error::EinsumResult;
use crate::tensor::Tensor;

/// Shape-level and product operations needed to realise a contraction.
///
/// Every method returns a new array and leaves `self` untouched.
pub trait ArrayOps: Clone {
    /// Extent of every axis.
    fn dims(&self) -> Vec<usize>;

    /// Reorder axes; `axes[i]` is the source axis of result axis `i`.
    fn permute_axes(&self, axes: &[usize]) -> Self;

    /// Reinterpret the element sequence with a new shape of equal size.
    fn reshaped(&self, shape: &[usize]) -> Self;

    /// Sum over all listed axes in a single reduction.
    fn sum_over(&self, axes: &[usize]) -> Self;

    /// Two-axis matrix product.
    fn matmul2(&self, other: &Self) -> EinsumResult<Self>;

    /// Three-axis batched matrix product with a thread-count hint.
    fn batched_matmul3(&self, other: &Self, threads: usize) -> EinsumResult<Self>;
}

impl<T: Scalar, B: Backend> ArrayOps for Tensor<T, B> {
    fn dims(&self) -> Vec<usize> {
        self.shape().to_vec()
    }

    fn permute_axes(&self, axes: &[usize]) -> Self {
        self.permute(axes)
    }

    fn reshaped(&self, shape: &[usize]) -> Self {
        self.reshape(shape)
    }

    fn sum_over(&self, axes: &[usize]) -> Self {
        self.sum_axes(axes)
    }

    fn matmul2(&self, other: &Self) -> EinsumResult<Self> {
        self.matmul(other)
    }

    fn batched_matmul3(&self, other: &Self, threads: usize) -> EinsumResult<Self> {
        self.batched_matmul(other, threads)
    }
}
