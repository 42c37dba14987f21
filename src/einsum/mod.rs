//! Two-operand Einstein summation.
//!
//! Every contraction goes through the same pipeline: validate and classify
//! the labels, sum away axes that only one operand carries, pack both
//! operands into a 3-axis `(batch, rows, K)` / `(batch, K, cols)` layout,
//! run one (batched) matrix product, and unpack into the output order.

mod builder;
mod engine;
mod labels;
mod layout;
mod reduce;
mod shapes;

pub use builder::{ContractOptions, EinBuilder};
pub use engine::Einsum;
pub use labels::{check_output_covered, check_unique, Label, LabelPartition};
pub use layout::{pack, transpose_labels, unpack};
pub use reduce::sum_unique_axes;
pub use shapes::{check_rank, ExtentMap};

use crate::error::EinsumResult;
use crate::ops::ArrayOps;

/// Contract two arrays given explicit label lists.
///
/// # Example
///
/// ```rust
/// use einsum2::{einsum2, ContractOptions, Cpu, Tensor};
///
/// let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0], &[3]);
/// let b = Tensor::<f64, Cpu>::from_data(&[4.0, 5.0, 6.0], &[3]);
///
/// let dot = einsum2(&a, &[0usize], &b, &[0], &[], &ContractOptions::default()).unwrap();
/// assert_eq!(dot.to_vec(), vec![32.0]);
/// ```
pub fn einsum2<A, L>(
    a: &A,
    ia: &[L],
    b: &A,
    ib: &[L],
    iy: &[L],
    options: &ContractOptions,
) -> EinsumResult<A>
where
    A: ArrayOps,
    L: Label,
{
    Einsum::new(ia.to_vec(), ib.to_vec(), iy.to_vec())
        .with_options(*options)
        .execute(a, b)
}

/// Contract two arrays given a `"<a>,<b>-><out>"` subscript string.
///
/// # Example
///
/// ```rust
/// use einsum2::{einsum2_str, ContractOptions, Cpu, Tensor};
///
/// let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
/// let b = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
///
/// // C[i,k] = Σ_j A[i,j] × B[j,k]
/// let c = einsum2_str("ij,jk->ik", &a, &b, &ContractOptions::default()).unwrap();
/// assert_eq!(c.to_vec(), vec![7.0, 10.0, 15.0, 22.0]);
/// ```
pub fn einsum2_str<A: ArrayOps>(
    subscripts: &str,
    a: &A,
    b: &A,
    options: &ContractOptions,
) -> EinsumResult<A> {
    Einsum::parse(subscripts)?.with_options(*options).execute(a, b)
}

/// Sum every axis missing from `iy`, then reorder to `iy`.
pub fn einsum1<A: ArrayOps, L: Label>(a: &A, ia: &[L], iy: &[L]) -> EinsumResult<A> {
    engine::reduce_transpose(a, ia, iy)
}

/// String form of [`einsum1`], e.g. `"ijk->ki"`.
///
/// # Example
///
/// ```rust
/// use einsum2::{einsum1_str, Cpu, Tensor};
///
/// // [[1,3,5],[2,4,6]]
/// let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
/// let col_sums = einsum1_str("ij->j", &a).unwrap();
/// assert_eq!(col_sums.to_vec(), vec![3.0, 7.0, 11.0]);
/// ```
pub fn einsum1_str<A: ArrayOps>(subscripts: &str, a: &A) -> EinsumResult<A> {
    let (ia, iy) = engine::parse_unary(subscripts)?;
    engine::reduce_transpose(a, &ia, &iy)
}

/// Batched matrix product `(I, J, K) × (I, K, L) → (I, J, L)`.
pub fn matmul<A: ArrayOps>(a: &A, b: &A, threads: usize) -> EinsumResult<A> {
    let options = ContractOptions::new().with_threads(threads);
    einsum2_str("ijk,ikl->ijl", a, b, &options)
}
