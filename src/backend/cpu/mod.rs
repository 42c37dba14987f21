//! CPU backend implementation.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use super::traits::{Backend, Storage};
use crate::algebra::Scalar;

/// CPU backend using Vec storage.
#[derive(Clone, Debug, Default)]
pub struct Cpu;

impl<T: Scalar> Storage<T> for Vec<T> {
    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline]
    fn to_vec(&self) -> Vec<T> {
        self.clone()
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        self
    }
}

impl Backend for Cpu {
    type Storage<T: Scalar> = Vec<T>;

    fn name() -> &'static str {
        "cpu"
    }

    fn alloc<T: Scalar>(&self, len: usize) -> Vec<T> {
        vec![T::zero(); len]
    }

    fn from_slice<T: Scalar>(&self, data: &[T]) -> Vec<T> {
        data.to_vec()
    }

    fn from_vec<T: Scalar>(&self, data: Vec<T>) -> Vec<T> {
        data
    }

    fn copy_strided<T: Scalar>(
        &self,
        src: &Vec<T>,
        shape: &[usize],
        strides: &[usize],
        offset: usize,
    ) -> Vec<T> {
        let numel: usize = shape.iter().product();
        let mut dst = vec![T::zero(); numel];

        let mut indices = vec![0usize; shape.len()];
        for dst_elem in dst.iter_mut() {
            let src_offset: usize = offset
                + indices
                    .iter()
                    .zip(strides.iter())
                    .map(|(i, s)| i * s)
                    .sum::<usize>();

            *dst_elem = src[src_offset];

            // Increment indices (column-major order: first dimension first)
            for dim in 0..shape.len() {
                indices[dim] += 1;
                if indices[dim] < shape[dim] {
                    break;
                }
                indices[dim] = 0;
            }
        }

        dst
    }

    fn gemm<T: Scalar>(&self, a: &Vec<T>, m: usize, k: usize, b: &Vec<T>, n: usize) -> Vec<T> {
        tracing::trace!(m, k, n, "cpu gemm");
        T::gemm(a, m, k, b, n)
    }

    fn gemm_batched<T: Scalar>(
        &self,
        a: &Vec<T>,
        batch: usize,
        m: usize,
        k: usize,
        b: &Vec<T>,
        n: usize,
        threads: usize,
    ) -> Vec<T> {
        tracing::trace!(batch, m, k, n, threads, "cpu batched gemm");

        let a_stride = m * k;
        let b_stride = k * n;
        let c_stride = m * n;
        let mut c = vec![T::zero(); batch * c_stride];
        if c_stride == 0 {
            return c;
        }

        let slice_product = |(idx, c_slice): (usize, &mut [T])| {
            let a_slice = &a[idx * a_stride..(idx + 1) * a_stride];
            let b_slice = &b[idx * b_stride..(idx + 1) * b_stride];
            c_slice.copy_from_slice(&T::gemm(a_slice, m, k, b_slice, n));
        };

        if threads <= 1 || batch <= 1 {
            c.chunks_mut(c_stride).enumerate().for_each(slice_product);
            return c;
        }

        match ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| {
                c.par_chunks_mut(c_stride)
                    .enumerate()
                    .for_each(slice_product)
            }),
            Err(err) => {
                tracing::debug!(%err, "falling back to sequential batched gemm");
                c.chunks_mut(c_stride).enumerate().for_each(slice_product);
            }
        }

        c
    }
}
