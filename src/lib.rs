//! # einsum2
//!
//! Two-operand Einstein summation realised as a single batched matrix product.
//!
//! ## Features
//!
//! - **Explicit subscripts**: `"bij,bjk->bik"` strings or label lists of any hashable type
//! - **One kernel**: every contraction is packed into `(batch, m, k) × (batch, k, n)`
//! - **Parallel batches**: batch slices are spread over a configurable number of threads
//!   without changing the result
//! - **Differentiable**: contractions run unchanged on tracked [`autodiff::Var`]s,
//!   including higher-order gradients
//! - **Zero-copy views**: Stride-based tensor with efficient permute/reshape
//!
//! ## Quick Start
//!
//! ```rust
//! use einsum2::{einsum1_str, einsum2_str, ContractOptions, Cpu, Tensor};
//!
//! // Column-major: [[1,3],[2,4]]
//! let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
//! let b = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
//!
//! // C[i,k] = Σ_j A[i,j] × B[j,k]
//! let c = einsum2_str("ij,jk->ik", &a, &b, &ContractOptions::default()).unwrap();
//! assert_eq!(c.to_vec(), vec![7.0, 10.0, 15.0, 22.0]);
//!
//! // Single operand: sum and transpose
//! let row_sums = einsum1_str("ij->i", &a).unwrap();
//! assert_eq!(row_sums.to_vec(), vec![4.0, 6.0]);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         User API                            │
//! │   einsum2(a, ia, b, ib, iy, options) → A                   │
//! │   Einsum::parse("ij,jk->ik")?.execute(&a, &b)              │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Einsum Engine                          │
//! │   LabelPartition → sum lonely axes → ExtentMap              │
//! │   pack → (batched) matmul → unpack                          │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   ArrayOps dispatch                         │
//! │   Tensor<T, B>: strided views, Backend GEMM                 │
//! │   Var<T, B>:    same ops, recorded on a Tape                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod algebra;
pub mod autodiff;
pub mod backend;
pub mod einsum;
pub mod error;
pub mod ops;
pub mod tensor;

// Re-exports
pub use algebra::Scalar;
pub use backend::{Backend, Cpu};
pub use einsum::{
    einsum1, einsum1_str, einsum2, einsum2_str, matmul, ContractOptions, EinBuilder, Einsum,
    Label, LabelPartition,
};
pub use error::{EinsumError, EinsumResult, ErrorCategory};
pub use ops::ArrayOps;
pub use tensor::Tensor;
