//! Backend trait definitions.

use std::fmt::Debug;

use crate::algebra::Scalar;

/// Storage trait for tensor data.
pub trait Storage<T: Scalar>: Clone + Send + Sync + Sized {
    /// Number of elements in storage.
    fn len(&self) -> usize;

    /// Check if storage is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy all data to a Vec.
    fn to_vec(&self) -> Vec<T>;

    /// Borrow the data as a slice.
    fn as_slice(&self) -> &[T];
}

/// Backend trait for tensor execution.
///
/// This is the boundary to the native kernels: the einsum engine only ever
/// reaches compute through [`Backend::gemm`] and [`Backend::gemm_batched`].
pub trait Backend: Clone + Debug + Send + Sync + 'static {
    /// Storage type for this backend.
    type Storage<T: Scalar>: Storage<T>;

    /// Backend name for debugging.
    fn name() -> &'static str;

    /// Allocate zero-initialized storage.
    fn alloc<T: Scalar>(&self, len: usize) -> Self::Storage<T>;

    /// Create storage from slice.
    #[allow(clippy::wrong_self_convention)]
    fn from_slice<T: Scalar>(&self, data: &[T]) -> Self::Storage<T>;

    /// Take ownership of a vector as storage.
    #[allow(clippy::wrong_self_convention)]
    fn from_vec<T: Scalar>(&self, data: Vec<T>) -> Self::Storage<T>;

    /// Copy strided data to contiguous (column-major) storage.
    fn copy_strided<T: Scalar>(
        &self,
        src: &Self::Storage<T>,
        shape: &[usize],
        strides: &[usize],
        offset: usize,
    ) -> Self::Storage<T>;

    /// Plain matrix product of column-major `a[m, k]` and `b[k, n]`.
    fn gemm<T: Scalar>(
        &self,
        a: &Self::Storage<T>,
        m: usize,
        k: usize,
        b: &Self::Storage<T>,
        n: usize,
    ) -> Self::Storage<T>;

    /// Batched matrix product.
    ///
    /// `a` holds `batch` consecutive column-major `m × k` slices, `b` holds
    /// `batch` consecutive `k × n` slices; the result holds `batch`
    /// consecutive `m × n` slices. `threads` is a work-distribution hint and
    /// never changes the values produced.
    #[allow(clippy::too_many_arguments)]
    fn gemm_batched<T: Scalar>(
        &self,
        a: &Self::Storage<T>,
        batch: usize,
        m: usize,
        k: usize,
        b: &Self::Storage<T>,
        n: usize,
        threads: usize,
    ) -> Self::Storage<T>;
}
