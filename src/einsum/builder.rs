//! Options and builder pattern for einsum construction.

use super::labels::Label;
use super::Einsum;
use crate::error::{EinsumError, EinsumResult};

/// Execution options shared by every contraction.
///
/// # Example
///
/// ```rust
/// use einsum2::ContractOptions;
///
/// let options = ContractOptions::new().with_threads(4).with_fast_path(false);
/// assert_eq!(options.threads, 4);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractOptions {
    /// Worker threads for the batched product (hint only, never changes values).
    pub threads: usize,

    /// Use a plain matrix product whenever there are no batch axes.
    pub use_fast_path: bool,
}

impl Default for ContractOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            use_fast_path: true,
        }
    }
}

impl ContractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_fast_path(mut self, use_fast_path: bool) -> Self {
        self.use_fast_path = use_fast_path;
        self
    }

    /// Reject a zero thread count.
    pub fn validate(&self) -> EinsumResult<()> {
        if self.threads == 0 {
            return Err(EinsumError::config("thread count must be at least 1"));
        }
        Ok(())
    }
}

/// Builder for constructing einsum specifications.
///
/// # Example
///
/// ```rust
/// use einsum2::EinBuilder;
///
/// let ein = EinBuilder::new()
///     .input(&[0usize, 1, 2])  // A[b,i,j]
///     .input(&[0, 2, 3])       // B[b,j,k]
///     .output(&[0, 1, 3])      // C[b,i,k]
///     .threads(2)
///     .build()
///     .unwrap();
///
/// assert_eq!(ein.options.threads, 2);
/// ```
#[derive(Debug, Clone)]
pub struct EinBuilder<L: Label = char> {
    ixs: Vec<Vec<L>>,
    iy: Option<Vec<L>>,
    options: ContractOptions,
}

impl<L: Label> Default for EinBuilder<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Label> EinBuilder<L> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            ixs: Vec::new(),
            iy: None,
            options: ContractOptions::default(),
        }
    }

    /// Add an input tensor specification.
    pub fn input(mut self, indices: &[L]) -> Self {
        self.ixs.push(indices.to_vec());
        self
    }

    /// Set the output specification.
    pub fn output(mut self, indices: &[L]) -> Self {
        self.iy = Some(indices.to_vec());
        self
    }

    /// Set the thread hint for the batched product.
    pub fn threads(mut self, threads: usize) -> Self {
        self.options.threads = threads;
        self
    }

    /// Enable or disable the plain matmul path.
    pub fn fast_path(mut self, enabled: bool) -> Self {
        self.options.use_fast_path = enabled;
        self
    }

    /// Replace all options at once.
    pub fn options(mut self, options: ContractOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the einsum specification.
    ///
    /// Fails unless exactly two inputs and an output were given and the
    /// options are valid. Labels are checked when the contraction runs.
    pub fn build(self) -> EinsumResult<Einsum<L>> {
        let iy = self
            .iy
            .ok_or_else(|| EinsumError::parse("output subscripts not specified"))?;
        self.options.validate()?;

        let mut ixs = self.ixs.into_iter();
        match (ixs.next(), ixs.next(), ixs.next()) {
            (Some(ia), Some(ib), None) => Ok(Einsum::new(ia, ib, iy).with_options(self.options)),
            _ => Err(EinsumError::parse("exactly two input specifications are required")),
        }
    }
}
