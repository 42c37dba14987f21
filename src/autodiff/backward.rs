//! Backward pass execution for reverse-mode automatic differentiation.

use std::collections::HashMap;

use tracing::trace;

use super::graph::NodeId;
use super::var::Var;
use crate::algebra::Scalar;
use crate::backend::Backend;
use crate::error::{EinsumError, EinsumResult};
use crate::tensor::Tensor;

/// Gradients of `sum(output)` with respect to each of `wrt`.
///
/// Equivalent to [`grad_with_seed`] with an all-ones seed. The returned
/// gradients are recorded on the same tape, so they can be differentiated
/// again. An input the output does not depend on gets a zero gradient.
///
/// # Example
///
/// ```rust
/// use einsum2::autodiff::{grad, Tape};
/// use einsum2::{einsum2_str, ContractOptions, Cpu, Tensor};
///
/// let tape = Tape::<f64, Cpu>::new();
/// let a = tape.var(Tensor::from_data(&[1.0, 2.0], &[2]));
/// let b = tape.var(Tensor::from_data(&[3.0, 4.0], &[2]));
///
/// let dot = einsum2_str("k,k->", &a, &b, &ContractOptions::default()).unwrap();
/// let grads = grad(&dot, &[&a, &b]).unwrap();
///
/// assert_eq!(grads[0].value().to_vec(), vec![3.0, 4.0]);
/// assert_eq!(grads[1].value().to_vec(), vec![1.0, 2.0]);
/// ```
pub fn grad<T: Scalar, B: Backend>(
    output: &Var<T, B>,
    wrt: &[&Var<T, B>],
) -> EinsumResult<Vec<Var<T, B>>> {
    let seed = output.value().full_like(output.shape(), T::one());
    grad_with_seed(output, &seed, wrt)
}

/// Vector-Jacobian product: gradients of `Σ seed ⊙ output` with respect to
/// each of `wrt`.
///
/// # Errors
///
/// Fails if `seed` does not have the shape of `output`, or if some variable
/// in `wrt` was recorded on another tape.
pub fn grad_with_seed<T: Scalar, B: Backend>(
    output: &Var<T, B>,
    seed: &Tensor<T, B>,
    wrt: &[&Var<T, B>],
) -> EinsumResult<Vec<Var<T, B>>> {
    let tape = output.tape();
    for var in wrt {
        tape.check_same(var.tape())?;
    }
    if seed.shape() != output.shape() {
        return Err(EinsumError::autodiff(format!(
            "seed shape {:?} does not match output shape {:?}",
            seed.shape(),
            output.shape()
        )));
    }

    let mut grads: HashMap<NodeId, Var<T, B>> = HashMap::new();
    grads.insert(output.id(), tape.constant(seed.clone()));

    // Every consumer of a node was created after it, so by the time a node
    // is visited its gradient is complete.
    for index in (0..=output.id().index()).rev() {
        let id = NodeId::from_index(index);
        let Some(grad_output) = grads.get(&id).cloned() else {
            continue;
        };
        let Some(grad_fn) = tape.grad_fn(id) else {
            continue;
        };

        trace!(node = index, op = grad_fn.name(), inputs = ?grad_fn.inputs(), "backward");
        for (input, input_grad) in grad_fn.backward(tape, &grad_output)? {
            let total = match grads.remove(&input) {
                Some(previous) => previous.add(&input_grad),
                None => input_grad,
            };
            grads.insert(input, total);
        }
    }

    Ok(wrt
        .iter()
        .map(|var| match grads.get(&var.id()) {
            Some(g) => g.clone(),
            None => tape.constant(var.value().full_like(var.shape(), T::zero())),
        })
        .collect())
}
