//! Matrix products: the native kernel boundary.

use super::Tensor;
use crate::algebra::Scalar;
use crate::backend::Backend;
use crate::error::{EinsumError, EinsumResult};

impl<T: Scalar, B: Backend> Tensor<T, B> {
    /// Plain matrix product of two 2-D tensors.
    ///
    /// # Example
    ///
    /// ```rust
    /// use einsum2::{Cpu, Tensor};
    ///
    /// let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    /// let b = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    ///
    /// // C[i,j] = Σ_k A[i,k] × B[k,j]
    /// let c = a.matmul(&b).unwrap();
    /// assert_eq!(c.to_vec(), vec![7.0, 10.0, 15.0, 22.0]);
    /// ```
    pub fn matmul(&self, other: &Self) -> EinsumResult<Self> {
        if self.ndim() != 2 || other.ndim() != 2 {
            return Err(EinsumError::kernel(format!(
                "matmul requires 2D tensors, got {:?} and {:?}",
                self.shape, other.shape
            )));
        }
        if self.shape[1] != other.shape[0] {
            return Err(EinsumError::kernel(format!(
                "matmul dimension mismatch: {:?} × {:?}",
                self.shape, other.shape
            )));
        }

        let (m, k, n) = (self.shape[0], self.shape[1], other.shape[1]);
        let a = self.contiguous_storage();
        let b = other.contiguous_storage();
        let c = self.backend.gemm(&a, m, k, &b, n);

        Ok(Self::from_storage(c, &[m, n], self.backend.clone()))
    }

    /// Batched matrix product: `(batch, m, k) × (batch, k, n) → (batch, m, n)`.
    ///
    /// Each batch slice of the result is the ordinary matrix product of the
    /// corresponding slices. `threads` is forwarded to the backend kernel
    /// and has no effect on the values.
    pub fn batched_matmul(&self, other: &Self, threads: usize) -> EinsumResult<Self> {
        if threads == 0 {
            return Err(EinsumError::config("thread count must be at least 1"));
        }
        if self.ndim() != 3 || other.ndim() != 3 {
            return Err(EinsumError::kernel(format!(
                "batched matmul requires 3D tensors, got {:?} and {:?}",
                self.shape, other.shape
            )));
        }
        if self.shape[0] != other.shape[0] || self.shape[2] != other.shape[1] {
            return Err(EinsumError::kernel(format!(
                "batched matmul dimension mismatch: {:?} × {:?}",
                self.shape, other.shape
            )));
        }

        let (batch, m, k, n) = (self.shape[0], self.shape[1], self.shape[2], other.shape[2]);

        // Column-major [m, k, batch] puts each batch slice in one contiguous block
        let a = self.permute(&[1, 2, 0]).contiguous_storage();
        let b = other.permute(&[1, 2, 0]).contiguous_storage();
        let c = self.backend.gemm_batched(&a, batch, m, k, &b, n, threads);

        Ok(Self::from_storage(c, &[m, n, batch], self.backend.clone()).permute(&[2, 0, 1]))
    }
}
