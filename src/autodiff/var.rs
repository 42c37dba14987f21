//! Tensors tracked on a tape.

use super::graph::{NodeId, Tape};
use super::rules::{
    AddBackward, BatchedMatmulBackward, BroadcastBackward, MatmulBackward, MulBackward,
    PermuteBackward, ReshapeBackward, Saved, SumBackward,
};
use crate::algebra::Scalar;
use crate::backend::Backend;
use crate::error::EinsumResult;
use crate::ops::ArrayOps;
use crate::tensor::Tensor;

/// A tensor whose operations are recorded on a [`Tape`].
///
/// `Var` implements [`ArrayOps`], so every contraction in this crate can be
/// run on tracked values and differentiated with [`grad`](super::grad).
#[derive(Clone)]
pub struct Var<T: Scalar, B: Backend> {
    tape: Tape<T, B>,
    id: NodeId,
    value: Tensor<T, B>,
    requires_grad: bool,
}

impl<T: Scalar, B: Backend> Var<T, B> {
    pub(crate) fn from_parts(
        tape: Tape<T, B>,
        id: NodeId,
        value: Tensor<T, B>,
        requires_grad: bool,
    ) -> Self {
        Self {
            tape,
            id,
            value,
            requires_grad,
        }
    }

    pub fn value(&self) -> &Tensor<T, B> {
        &self.value
    }

    pub fn into_value(self) -> Tensor<T, B> {
        self.value
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tape(&self) -> &Tape<T, B> {
        &self.tape
    }

    /// Whether gradients flow through this value.
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// Tracked [`Tensor::permute`].
    pub fn permute(&self, axes: &[usize]) -> Self {
        let value = self.value.permute(axes);
        let mut inverse = vec![0; axes.len()];
        for (i, &axis) in axes.iter().enumerate() {
            inverse[axis] = i;
        }
        self.tape.record(
            value,
            PermuteBackward {
                input: self.id,
                inverse,
            },
            self.requires_grad,
        )
    }

    /// Tracked [`Tensor::reshape`].
    pub fn reshape(&self, shape: &[usize]) -> Self {
        let value = self.value.reshape(shape);
        self.tape.record(
            value,
            ReshapeBackward {
                input: self.id,
                input_shape: self.shape().to_vec(),
            },
            self.requires_grad,
        )
    }

    /// Tracked [`Tensor::sum_axes`].
    pub fn sum_axes(&self, axes: &[usize]) -> Self {
        let value = self.value.sum_axes(axes);
        self.tape.record(
            value,
            SumBackward {
                input: self.id,
                input_shape: self.shape().to_vec(),
                axes: axes.to_vec(),
            },
            self.requires_grad,
        )
    }

    /// Sum of all elements as a 0-dimensional value.
    pub fn sum(&self) -> Self {
        let axes: Vec<usize> = (0..self.value.ndim()).collect();
        self.sum_axes(&axes)
    }

    /// Tracked [`Tensor::broadcast_to`].
    pub fn broadcast_to(&self, target: &[usize]) -> Self {
        let value = self.value.broadcast_to(target);
        self.tape.record(
            value,
            BroadcastBackward {
                input: self.id,
                input_shape: self.shape().to_vec(),
            },
            self.requires_grad,
        )
    }

    /// Tracked elementwise product.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ or the operands live on different tapes.
    pub fn mul(&self, other: &Self) -> Self {
        self.assert_same_tape(other);
        let value = self.value.mul(&other.value);
        self.tape.record(
            value,
            MulBackward {
                a: Saved::of(self),
                b: Saved::of(other),
            },
            self.requires_grad || other.requires_grad,
        )
    }

    /// Tracked elementwise sum.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ or the operands live on different tapes.
    pub fn add(&self, other: &Self) -> Self {
        self.assert_same_tape(other);
        let value = self.value.add(&other.value);
        self.tape.record(
            value,
            AddBackward {
                a: self.id,
                b: other.id,
            },
            self.requires_grad || other.requires_grad,
        )
    }

    /// Tracked 2-D matrix product.
    pub fn matmul(&self, other: &Self) -> EinsumResult<Self> {
        self.tape.check_same(&other.tape)?;
        let value = self.value.matmul(&other.value)?;
        Ok(self.tape.record(
            value,
            MatmulBackward {
                a: Saved::of(self),
                b: Saved::of(other),
            },
            self.requires_grad || other.requires_grad,
        ))
    }

    /// Tracked batched matrix product `(batch, m, k) × (batch, k, n)`.
    ///
    /// Its gradients are batched products themselves, computed with the
    /// same thread hint.
    pub fn batched_matmul(&self, other: &Self, threads: usize) -> EinsumResult<Self> {
        self.tape.check_same(&other.tape)?;
        let value = self.value.batched_matmul(&other.value, threads)?;
        Ok(self.tape.record(
            value,
            BatchedMatmulBackward {
                a: Saved::of(self),
                b: Saved::of(other),
                threads,
            },
            self.requires_grad || other.requires_grad,
        ))
    }

    fn assert_same_tape(&self, other: &Self) {
        assert!(
            self.tape.same_as(&other.tape),
            "Cannot combine variables from different tapes"
        );
    }
}

impl<T: Scalar, B: Backend> std::fmt::Debug for Var<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Var")
            .field("id", &self.id)
            .field("shape", &self.value.shape())
            .field("requires_grad", &self.requires_grad)
            .finish()
    }
}

impl<T: Scalar, B: Backend> ArrayOps for Var<T, B> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Cpu;
    use crate::error::EinsumError;

    #[test]
    fn test_values_match_tensor_ops() {
        let tape = Tape::<f64, Cpu>::new();
        let data: Vec<f64> = (0..6).map(|x| x as f64).collect();
        let t = Tensor::<f64, Cpu>::from_data(&data, &[2, 3]);
        let x = tape.var(t.clone());

        assert_eq!(x.permute(&[1, 0]).value().to_vec(), t.permute(&[1, 0]).to_vec());
        assert_eq!(x.reshape(&[3, 2]).shape(), &[3, 2]);
        assert_eq!(x.sum_axes(&[1]).value().to_vec(), t.sum_axes(&[1]).to_vec());
        assert_eq!(x.sum().value().to_vec(), vec![15.0]);
    }

    #[test]
    fn test_requires_grad_propagates() {
        let tape = Tape::<f64, Cpu>::new();
        let x = tape.var(Tensor::from_data(&[1.0, 2.0], &[2]));
        let c = tape.constant(Tensor::from_data(&[3.0, 4.0], &[2]));

        assert!(x.add(&c).requires_grad());
        assert!(!c.add(&c).requires_grad());
    }

    #[test]
    fn test_matmul_rejects_other_tape() {
        let t1 = Tape::<f64, Cpu>::new();
        let t2 = Tape::<f64, Cpu>::new();
        let a = t1.var(Tensor::zeros(&[2, 2]));
        let b = t2.var(Tensor::zeros(&[2, 2]));

        assert!(matches!(a.matmul(&b), Err(EinsumError::Autodiff { .. })));
        assert!(matches!(
            a.batched_matmul(&b, 1),
            Err(EinsumError::Autodiff { .. })
        ));
    }
}
