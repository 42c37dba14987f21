//! Reverse-mode automatic differentiation for contractions.
//!
//! A [`Tape`] records every operation applied to its [`Var`]s. Because `Var`
//! implements [`ArrayOps`](crate::ArrayOps), the einsum functions run on
//! tracked values unchanged, and [`grad`] walks the tape backwards.
//!
//! Contractions with batch axes are recorded as a batched matrix product,
//! whose backward rules are batched products themselves:
//!
//! ```text
//! C = A ⊗ B              (batch, m, k) × (batch, k, n)
//! dA = G ⊗ Bᵀ            transpose of the last two axes
//! dB = Aᵀ ⊗ G
//! ```
//!
//! Gradients are recorded like any other value, so higher derivatives come
//! from calling [`grad`] again.
//!
//! # Example
//!
//! ```rust
//! use einsum2::autodiff::{grad, Tape};
//! use einsum2::{einsum2_str, ContractOptions, Cpu, Tensor};
//!
//! let tape = Tape::<f64, Cpu>::new();
//! let a = tape.var(Tensor::from_data(&[1.0, 2.0, 3.0, 4.0], &[1, 2, 2]));
//! let b = tape.var(Tensor::from_data(&[1.0, 0.0, 0.0, 1.0], &[1, 2, 2]));
//!
//! let c = einsum2_str("bij,bjk->bik", &a, &b, &ContractOptions::default()).unwrap();
//! let grads = grad(&c, &[&a]).unwrap();
//!
//! // dΣC/dA[b,i,j] = Σ_k B[b,j,k]
//! assert_eq!(grads[0].value().to_vec(), vec![1.0, 1.0, 1.0, 1.0]);
//! ```

mod backward;
mod graph;
mod rules;
mod var;

pub use backward::{grad, grad_with_seed};
pub use graph::{GradFn, NodeId, Tape};
pub use var::Var;
