//! Backend abstractions for kernel execution.
//!
//! This module defines the [`Backend`] trait and its implementation:
//! - [`Cpu`]: faer GEMM per matrix, batch slices spread over a rayon pool

mod cpu;
mod traits;

pub use cpu::Cpu;
pub use traits::{Backend, Storage};
