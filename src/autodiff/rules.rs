//! Backward rules for every recorded operation.

use super::graph::{GradFn, NodeId, Tape};
use super::var::Var;
use crate::algebra::Scalar;
use crate::backend::Backend;
use crate::error::EinsumResult;
use crate::tensor::Tensor;

/// An operand saved for the backward pass.
///
/// Only the node id and the value are kept; storing the `Var` itself would
/// make the tape own a handle to itself.
#[derive(Debug, Clone)]
pub(crate) struct Saved<T: Scalar, B: Backend> {
    id: NodeId,
    value: Tensor<T, B>,
}

impl<T: Scalar, B: Backend> Saved<T, B> {
    pub(crate) fn of(var: &Var<T, B>) -> Self {
        Self {
            id: var.id(),
            value: var.value().clone(),
        }
    }

    fn bind(&self, tape: &Tape<T, B>) -> Var<T, B> {
        tape.rebind(self.id, &self.value)
    }

    fn requires_grad(&self, tape: &Tape<T, B>) -> bool {
        tape.requires_grad(self.id)
    }
}

#[derive(Debug)]
pub(crate) struct PermuteBackward {
    pub input: NodeId,
    pub inverse: Vec<usize>,
}

impl<T: Scalar, B: Backend> GradFn<T, B> for PermuteBackward {
    fn backward(&self, _: &Tape<T, B>, grad: &Var<T, B>) -> EinsumResult<Vec<(NodeId, Var<T, B>)>> {
        Ok(vec![(self.input, grad.permute(&self.inverse))])
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.input]
    }

    fn name(&self) -> &'static str {
        "permute"
    }
}

#[derive(Debug)]
pub(crate) struct ReshapeBackward {
    pub input: NodeId,
    pub input_shape: Vec<usize>,
}

impl<T: Scalar, B: Backend> GradFn<T, B> for ReshapeBackward {
    fn backward(&self, _: &Tape<T, B>, grad: &Var<T, B>) -> EinsumResult<Vec<(NodeId, Var<T, B>)>> {
        Ok(vec![(self.input, grad.reshape(&self.input_shape))])
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.input]
    }

    fn name(&self) -> &'static str {
        "reshape"
    }
}

/// Summing spreads the gradient evenly back over the reduced axes.
#[derive(Debug)]
pub(crate) struct SumBackward {
    pub input: NodeId,
    pub input_shape: Vec<usize>,
    pub axes: Vec<usize>,
}

impl<T: Scalar, B: Backend> GradFn<T, B> for SumBackward {
    fn backward(&self, _: &Tape<T, B>, grad: &Var<T, B>) -> EinsumResult<Vec<(NodeId, Var<T, B>)>> {
        // Reinsert the reduced axes with extent 1; column-major order is unchanged
        let kept_shape: Vec<usize> = self
            .input_shape
            .iter()
            .enumerate()
            .map(|(axis, &extent)| if self.axes.contains(&axis) { 1 } else { extent })
            .collect();
        let spread = grad.reshape(&kept_shape).broadcast_to(&self.input_shape);
        Ok(vec![(self.input, spread)])
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.input]
    }

    fn name(&self) -> &'static str {
        "sum_axes"
    }
}

#[derive(Debug)]
pub(crate) struct BroadcastBackward {
    pub input: NodeId,
    pub input_shape: Vec<usize>,
}

impl<T: Scalar, B: Backend> GradFn<T, B> for BroadcastBackward {
    fn backward(&self, _: &Tape<T, B>, grad: &Var<T, B>) -> EinsumResult<Vec<(NodeId, Var<T, B>)>> {
        let expanded: Vec<usize> = self
            .input_shape
            .iter()
            .zip(grad.shape())
            .enumerate()
            .filter(|(_, (from, to))| from != to)
            .map(|(axis, _)| axis)
            .collect();
        let folded = grad.sum_axes(&expanded).reshape(&self.input_shape);
        Ok(vec![(self.input, folded)])
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.input]
    }

    fn name(&self) -> &'static str {
        "broadcast_to"
    }
}

#[derive(Debug)]
pub(crate) struct MulBackward<T: Scalar, B: Backend> {
    pub a: Saved<T, B>,
    pub b: Saved<T, B>,
}

impl<T: Scalar, B: Backend> GradFn<T, B> for MulBackward<T, B> {
    fn backward(
        &self,
        tape: &Tape<T, B>,
        grad: &Var<T, B>,
    ) -> EinsumResult<Vec<(NodeId, Var<T, B>)>> {
        let mut grads = Vec::with_capacity(2);
        if self.a.requires_grad(tape) {
            grads.push((self.a.id, grad.mul(&self.b.bind(tape))));
        }
        if self.b.requires_grad(tape) {
            grads.push((self.b.id, grad.mul(&self.a.bind(tape))));
        }
        Ok(grads)
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.a.id, self.b.id]
    }

    fn name(&self) -> &'static str {
        "mul"
    }
}

#[derive(Debug)]
pub(crate) struct AddBackward {
    pub a: NodeId,
    pub b: NodeId,
}

impl<T: Scalar, B: Backend> GradFn<T, B> for AddBackward {
    fn backward(
        &self,
        tape: &Tape<T, B>,
        grad: &Var<T, B>,
    ) -> EinsumResult<Vec<(NodeId, Var<T, B>)>> {
        Ok([self.a, self.b]
            .into_iter()
            .filter(|&id| tape.requires_grad(id))
            .map(|id| (id, grad.clone()))
            .collect())
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.a, self.b]
    }

    fn name(&self) -> &'static str {
        "add"
    }
}

/// `C = A B`: `dA = G Bᵀ`, `dB = Aᵀ G`.
#[derive(Debug)]
pub(crate) struct MatmulBackward<T: Scalar, B: Backend> {
    pub a: Saved<T, B>,
    pub b: Saved<T, B>,
}

impl<T: Scalar, B: Backend> GradFn<T, B> for MatmulBackward<T, B> {
    fn backward(
        &self,
        tape: &Tape<T, B>,
        grad: &Var<T, B>,
    ) -> EinsumResult<Vec<(NodeId, Var<T, B>)>> {
        let mut grads = Vec::with_capacity(2);
        if self.a.requires_grad(tape) {
            let bt = self.b.bind(tape).permute(&[1, 0]);
            grads.push((self.a.id, grad.matmul(&bt)?));
        }
        if self.b.requires_grad(tape) {
            let at = self.a.bind(tape).permute(&[1, 0]);
            grads.push((self.b.id, at.matmul(grad)?));
        }
        Ok(grads)
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.a.id, self.b.id]
    }

    fn name(&self) -> &'static str {
        "matmul"
    }
}

/// Batched form of [`MatmulBackward`]; the gradients are batched products
/// with the last two axes of the saved operand swapped.
#[derive(Debug)]
pub(crate) struct BatchedMatmulBackward<T: Scalar, B: Backend> {
    pub a: Saved<T, B>,
    pub b: Saved<T, B>,
    pub threads: usize,
}

impl<T: Scalar, B: Backend> GradFn<T, B> for BatchedMatmulBackward<T, B> {
    fn backward(
        &self,
        tape: &Tape<T, B>,
        grad: &Var<T, B>,
    ) -> EinsumResult<Vec<(NodeId, Var<T, B>)>> {
        let mut grads = Vec::with_capacity(2);
        if self.a.requires_grad(tape) {
            let bt = self.b.bind(tape).permute(&[0, 2, 1]);
            grads.push((self.a.id, grad.batched_matmul(&bt, self.threads)?));
        }
        if self.b.requires_grad(tape) {
            let at = self.a.bind(tape).permute(&[0, 2, 1]);
            grads.push((self.b.id, at.batched_matmul(grad, self.threads)?));
        }
        Ok(grads)
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.a.id, self.b.id]
    }

    fn name(&self) -> &'static str {
        "batched_matmul"
    }
}
