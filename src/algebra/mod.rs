//! Scalar types supported by tensors.
//!
//! Contractions here always use ordinary arithmetic `(+, ×)`, so the only
//! algebraic capability a scalar has to bring is a dense column-major GEMM.
//! Both supported types dispatch to faer.

use std::fmt::Debug;
use std::iter::Sum;
use std::ops::AddAssign;

use faer::linalg::matmul::matmul;
use faer::{Accum, MatMut, MatRef, Par};
use num_traits::Float;

/// Marker trait for scalar types that can be used in tensors.
pub trait Scalar:
    Copy + Clone + Send + Sync + Default + Debug + 'static + Float + AddAssign + Sum
{
    /// Column-major GEMM: `C[m, n] = A[m, k] @ B[k, n]`.
    ///
    /// Always runs sequentially; parallelism is applied one level up, across
    /// batch slices, so the summation order never depends on a thread count.
    fn gemm(a: &[Self], m: usize, k: usize, b: &[Self], n: usize) -> Vec<Self>;
}

macro_rules! impl_scalar {
    ($t:ty) => {
        impl Scalar for $t {
            fn gemm(a: &[$t], m: usize, k: usize, b: &[$t], n: usize) -> Vec<$t> {
                let mut c = vec![0.0 as $t; m * n];
                if m == 0 || n == 0 {
                    return c;
                }
                let a_mat = MatRef::from_column_major_slice(a, m, k);
                let b_mat = MatRef::from_column_major_slice(b, k, n);
                let c_mat = MatMut::from_column_major_slice_mut(&mut c, m, n);
                matmul(c_mat, Accum::Replace, a_mat, b_mat, 1.0 as $t, Par::Seq);
                c
            }
        }
    };
}

impl_scalar!(f32);
impl_scalar!(f64);
