//! Error types for einsum operations.

use thiserror::Error;

/// Coarse classification of an [`EinsumError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request needs a feature this crate does not provide (diagonal extraction).
    Unsupported,
    /// The subscripts themselves are malformed or inconsistent.
    InvalidSpecification,
    /// Operand extents disagree with each other or with their labels.
    ShapeMismatch,
    /// Invalid options or misuse of the differentiation tape.
    Configuration,
}

/// Errors that can occur while parsing, validating or executing a contraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EinsumError {
    /// A label occurs twice in one label list.
    #[error("not implemented: repeated subscript {label} in {operand}")]
    RepeatedLabel { label: String, operand: &'static str },

    /// An output label is carried by neither input.
    #[error("output subscript {label} must be contained within input subscripts")]
    OutputLabelNotInInputs { label: String },

    /// A transpose was asked to map between two different label sets.
    #[error("input and output subscripts don't match: {from} vs {to}")]
    LabelMismatch { from: String, to: String },

    /// Malformed subscript string.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The same label has different extents on the two operands.
    #[error("shape mismatch for subscript {label}: expected {expected}, got {got}")]
    ShapeMismatch {
        label: String,
        expected: usize,
        got: usize,
    },

    /// A label list does not have one label per tensor axis.
    #[error("{operand} has {labels} subscripts but {ndim} dimensions")]
    RankMismatch {
        operand: &'static str,
        labels: usize,
        ndim: usize,
    },

    /// A matrix product kernel was handed non-conforming operands.
    #[error("matmul shape error: {message}")]
    KernelShape { message: String },

    /// Invalid contraction options.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Misuse of the differentiation tape.
    #[error("autodiff error: {message}")]
    Autodiff { message: String },
}

impl EinsumError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn kernel(message: impl Into<String>) -> Self {
        Self::KernelShape {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn autodiff(message: impl Into<String>) -> Self {
        Self::Autodiff {
            message: message.into(),
        }
    }

    /// Which family of failure this is.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RepeatedLabel { .. } => ErrorCategory::Unsupported,
            Self::OutputLabelNotInInputs { .. } | Self::LabelMismatch { .. } | Self::Parse { .. } => {
                ErrorCategory::InvalidSpecification
            }
            Self::ShapeMismatch { .. } | Self::RankMismatch { .. } | Self::KernelShape { .. } => {
                ErrorCategory::ShapeMismatch
            }
            Self::InvalidConfig { .. } | Self::Autodiff { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Result type for einsum operations.
pub type EinsumResult<T> = Result<T, EinsumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = EinsumError::RepeatedLabel {
            label: "'i'".into(),
            operand: "operand a",
        };
        assert_eq!(err.category(), ErrorCategory::Unsupported);
        assert_eq!(err.to_string(), "not implemented: repeated subscript 'i' in operand a");

        assert_eq!(EinsumError::parse("x").category(), ErrorCategory::InvalidSpecification);
        assert_eq!(EinsumError::kernel("x").category(), ErrorCategory::ShapeMismatch);
        assert_eq!(EinsumError::config("x").category(), ErrorCategory::Configuration);
    }
}
