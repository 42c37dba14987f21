//! Stride-based tensor type with zero-copy views.
//!
//! The [`Tensor`] type supports:
//! - Zero-copy `permute`, `reshape` (when contiguous) and `broadcast_to`
//! - Automatic contiguous copy when needed for GEMM
//! - A single-pass reduction over any set of axes
//!
//! Every operation returns a new tensor; storage is shared through an `Arc`
//! and never written after construction, so views cannot alias surprisingly.

mod ops;

use std::sync::Arc;

use crate::algebra::Scalar;
use crate::backend::{Backend, Storage};

/// A multi-dimensional tensor with stride-based layout.
///
/// Data is stored in column-major (Fortran) order.
///
/// # Type Parameters
///
/// * `T` - The scalar element type (f32, f64)
/// * `B` - The backend type
///
/// # Example
///
/// ```rust
/// use einsum2::{Cpu, Tensor};
///
/// let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
/// let b = a.permute(&[1, 0]); // Zero-copy transpose
/// let c = b.contiguous(); // Make contiguous copy
/// assert_eq!(c.shape(), &[3, 2]);
/// ```
#[derive(Clone)]
pub struct Tensor<T: Scalar, B: Backend> {
    /// Shared storage (reference counted)
    storage: Arc<B::Storage<T>>,

    /// Shape of this view
    shape: Vec<usize>,

    /// Strides for each dimension (in elements)
    strides: Vec<usize>,

    /// Offset into storage
    offset: usize,

    /// Backend instance
    backend: B,
}

impl<T: Scalar, B: Backend> Tensor<T, B> {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a tensor from column-major data with the given shape.
    pub fn from_data(data: &[T], shape: &[usize]) -> Self
    where
        B: Default,
    {
        Self::from_data_with_backend(data, shape, B::default())
    }

    /// Create a tensor from data with explicit backend.
    pub fn from_data_with_backend(data: &[T], shape: &[usize], backend: B) -> Self {
        let storage = backend.from_slice(data);
        Self::from_storage(storage, shape, backend)
    }

    /// Create a tensor that takes ownership of column-major data.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Self
    where
        B: Default,
    {
        let backend = B::default();
        let storage = backend.from_vec(data);
        Self::from_storage(storage, shape, backend)
    }

    /// Create a 0-dimensional tensor holding one value.
    pub fn scalar(value: T) -> Self
    where
        B: Default,
    {
        Self::from_vec(vec![value], &[])
    }

    /// Create a zero-filled tensor.
    pub fn zeros(shape: &[usize]) -> Self
    where
        B: Default,
    {
        Self::zeros_with_backend(shape, B::default())
    }

    /// Create a zero-filled tensor with explicit backend.
    pub fn zeros_with_backend(shape: &[usize], backend: B) -> Self {
        let numel: usize = shape.iter().product();
        let storage = backend.alloc(numel);
        Self::from_storage(storage, shape, backend)
    }

    /// Create a tensor filled with `value`, on the same backend as `self`.
    pub fn full_like(&self, shape: &[usize], value: T) -> Self {
        let numel: usize = shape.iter().product();
        let storage = self.backend.from_vec(vec![value; numel]);
        Self::from_storage(storage, shape, self.backend.clone())
    }

    /// Create a tensor from storage with given shape.
    ///
    /// The storage must be contiguous and have exactly `shape.iter().product()` elements.
    pub fn from_storage(storage: B::Storage<T>, shape: &[usize], backend: B) -> Self {
        let numel: usize = shape.iter().product();
        assert_eq!(
            storage.len(),
            numel,
            "Storage length {} doesn't match shape {:?} (expected {})",
            storage.len(),
            shape,
            numel
        );

        Self {
            storage: Arc::new(storage),
            shape: shape.to_vec(),
            strides: compute_contiguous_strides(shape),
            offset: 0,
            backend,
        }
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Get the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the strides of the tensor.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Get the number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get the total number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Get the backend.
    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Check if the tensor is contiguous in memory (column-major).
    pub fn is_contiguous(&self) -> bool {
        if self.offset != 0 {
            return false;
        }
        self.strides == compute_contiguous_strides(&self.shape)
    }

    // ========================================================================
    // Data Access
    // ========================================================================

    /// Copy all data to a Vec, in column-major order.
    pub fn to_vec(&self) -> Vec<T> {
        if self.is_contiguous() {
            self.storage.to_vec()
        } else {
            self.contiguous().storage.to_vec()
        }
    }

    /// Read one element by multi-index.
    pub fn get(&self, index: &[usize]) -> T {
        assert_eq!(index.len(), self.ndim(), "Index {:?} has wrong rank for shape {:?}", index, self.shape);
        let mut pos = self.offset;
        for (dim, (&i, &stride)) in index.iter().zip(self.strides.iter()).enumerate() {
            assert!(i < self.shape[dim], "Index {:?} out of bounds for shape {:?}", index, self.shape);
            pos += i * stride;
        }
        self.storage.as_slice()[pos]
    }

    /// Contiguous storage (copies only when this is a non-contiguous view).
    pub(crate) fn contiguous_storage(&self) -> Arc<B::Storage<T>> {
        if self.is_contiguous() {
            Arc::clone(&self.storage)
        } else {
            self.contiguous().storage
        }
    }

    // ========================================================================
    // View Operations (zero-copy)
    // ========================================================================

    /// Permute dimensions (zero-copy).
    ///
    /// `axes[i]` names the source axis that becomes axis `i`.
    pub fn permute(&self, axes: &[usize]) -> Self {
        assert_eq!(
            axes.len(),
            self.ndim(),
            "Permutation axes length {} doesn't match ndim {}",
            axes.len(),
            self.ndim()
        );

        let mut seen = vec![false; self.ndim()];
        for &ax in axes {
            assert!(ax < self.ndim(), "Axis {} out of range for ndim {}", ax, self.ndim());
            assert!(!seen[ax], "Duplicate axis {} in permutation", ax);
            seen[ax] = true;
        }

        Self {
            storage: Arc::clone(&self.storage),
            shape: axes.iter().map(|&i| self.shape[i]).collect(),
            strides: axes.iter().map(|&i| self.strides[i]).collect(),
            offset: self.offset,
            backend: self.backend.clone(),
        }
    }

    /// Reshape to a new shape (zero-copy if contiguous).
    pub fn reshape(&self, new_shape: &[usize]) -> Self {
        let new_numel: usize = new_shape.iter().product();
        assert_eq!(
            self.numel(),
            new_numel,
            "Cannot reshape from {:?} ({} elements) to {:?} ({} elements)",
            self.shape,
            self.numel(),
            new_shape,
            new_numel
        );

        if self.is_contiguous() {
            Self {
                storage: Arc::clone(&self.storage),
                shape: new_shape.to_vec(),
                strides: compute_contiguous_strides(new_shape),
                offset: self.offset,
                backend: self.backend.clone(),
            }
        } else {
            self.contiguous().reshape(new_shape)
        }
    }

    /// Expand size-1 axes to `target` (zero-copy, stride 0).
    ///
    /// `target` must have the same rank; every axis either already matches
    /// or has extent 1.
    pub fn broadcast_to(&self, target: &[usize]) -> Self {
        assert_eq!(
            target.len(),
            self.ndim(),
            "Cannot broadcast {:?} to {:?}: rank differs",
            self.shape,
            target
        );

        let strides = self
            .shape
            .iter()
            .zip(target)
            .zip(&self.strides)
            .map(|((&from, &to), &stride)| {
                assert!(
                    from == to || from == 1,
                    "Cannot broadcast {:?} to {:?}",
                    self.shape,
                    target
                );
                if from == to {
                    stride
                } else {
                    0
                }
            })
            .collect();

        Self {
            storage: Arc::clone(&self.storage),
            shape: target.to_vec(),
            strides,
            offset: self.offset,
            backend: self.backend.clone(),
        }
    }

    /// Make tensor contiguous in memory.
    ///
    /// If already contiguous, returns a clone (shared storage).
    /// Otherwise, copies data to a new contiguous buffer.
    pub fn contiguous(&self) -> Self {
        if self.is_contiguous() {
            return self.clone();
        }
        let storage = self
            .backend
            .copy_strided(&self.storage, &self.shape, &self.strides, self.offset);
        Self {
            storage: Arc::new(storage),
            shape: self.shape.clone(),
            strides: compute_contiguous_strides(&self.shape),
            offset: 0,
            backend: self.backend.clone(),
        }
    }

    // ========================================================================
    // Reduction and Elementwise Operations
    // ========================================================================

    /// Sum all elements.
    pub fn sum(&self) -> T {
        self.to_vec().into_iter().sum()
    }

    /// Sum over every axis in `axes` in one pass.
    ///
    /// The result keeps the remaining axes in their original relative order.
    /// Summing over no axes returns the tensor unchanged; summing over all
    /// axes returns a 0-dimensional tensor.
    pub fn sum_axes(&self, axes: &[usize]) -> Self {
        if axes.is_empty() {
            return self.clone();
        }

        let mut reduced = vec![false; self.ndim()];
        for &axis in axes {
            assert!(axis < self.ndim(), "Axis {} out of bounds for {}D tensor", axis, self.ndim());
            assert!(!reduced[axis], "Duplicate axis {} in reduction", axis);
            reduced[axis] = true;
        }

        let new_shape: Vec<usize> = self
            .shape
            .iter()
            .zip(&reduced)
            .filter(|(_, &r)| !r)
            .map(|(&s, _)| s)
            .collect();
        let new_strides = compute_contiguous_strides(&new_shape);

        // Stride of each input axis inside the output (0 for reduced axes)
        let mut out_strides = vec![0usize; self.ndim()];
        let mut kept = 0;
        for dim in 0..self.ndim() {
            if !reduced[dim] {
                out_strides[dim] = new_strides[kept];
                kept += 1;
            }
        }

        let data = self.to_vec();
        let mut result = vec![T::zero(); new_shape.iter().product()];
        let mut coords = vec![0usize; self.ndim()];
        let mut out_idx = 0usize;
        for &val in &data {
            result[out_idx] += val;

            // Column-major increment, keeping out_idx in step with coords
            for dim in 0..self.ndim() {
                coords[dim] += 1;
                out_idx += out_strides[dim];
                if coords[dim] < self.shape[dim] {
                    break;
                }
                out_idx -= out_strides[dim] * coords[dim];
                coords[dim] = 0;
            }
        }

        self.with_data(result, &new_shape)
    }

    /// Elementwise product of two tensors of identical shape.
    pub fn mul(&self, other: &Self) -> Self {
        self.zip_with(other, |x, y| x * y)
    }

    /// Elementwise sum of two tensors of identical shape.
    pub fn add(&self, other: &Self) -> Self {
        self.zip_with(other, |x, y| x + y)
    }

    /// Multiply every element by `factor`.
    pub fn scale(&self, factor: T) -> Self {
        let data = self.to_vec().into_iter().map(|x| x * factor).collect();
        self.with_data(data, &self.shape)
    }

    fn zip_with(&self, other: &Self, f: impl Fn(T, T) -> T) -> Self {
        assert_eq!(
            self.shape, other.shape,
            "Elementwise shape mismatch: {:?} vs {:?}",
            self.shape, other.shape
        );
        let data = self
            .to_vec()
            .into_iter()
            .zip(other.to_vec())
            .map(|(x, y)| f(x, y))
            .collect();
        self.with_data(data, &self.shape)
    }

    fn with_data(&self, data: Vec<T>, shape: &[usize]) -> Self {
        let storage = self.backend.from_vec(data);
        Self::from_storage(storage, shape, self.backend.clone())
    }
}

/// Compute contiguous strides for column-major (Fortran) layout.
///
/// For shape [m, n], returns strides [1, m] (first dimension is contiguous).
pub fn compute_contiguous_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return vec![];
    }

    let mut strides = vec![1; shape.len()];
    for i in 1..shape.len() {
        strides[i] = strides[i - 1] * shape[i - 1];
    }
    strides
}

impl<T: Scalar, B: Backend> std::fmt::Debug for Tensor<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .field("contiguous", &self.is_contiguous())
            .field("backend", &B::name())
            .finish()
    }
}
