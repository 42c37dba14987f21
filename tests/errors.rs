//! Failure modes: every invalid request is rejected before any product runs.

use einsum2::{
    einsum1_str, einsum2, einsum2_str, ContractOptions, Cpu, Einsum, EinsumError, ErrorCategory,
    Tensor,
};

fn opts() -> ContractOptions {
    ContractOptions::default()
}

// ============================================================================
// Unsupported Operations
// ============================================================================

#[test]
fn test_diagonal_single_operand() {
    let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);

    let err = einsum1_str("ii->i", &a).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Unsupported);
    assert!(matches!(err, EinsumError::RepeatedLabel { ref label, .. } if label == "'i'"));
    assert!(err.to_string().starts_with("not implemented"));
}

#[test]
fn test_diagonal_in_any_list() {
    let a = Tensor::<f64, Cpu>::zeros(&[2, 2]);
    let v = Tensor::<f64, Cpu>::zeros(&[2]);

    for (subscripts, x, y) in [("ii,i->i", &a, &v), ("i,jj->ij", &v, &a), ("i,j->ii", &v, &v)] {
        let err = einsum2_str(subscripts, x, y, &opts()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Unsupported, "{subscripts}");
    }
}

// ============================================================================
// Invalid Specifications
// ============================================================================

#[test]
fn test_output_label_not_in_inputs() {
    let a = Tensor::<f64, Cpu>::zeros(&[2, 3]);
    let b = Tensor::<f64, Cpu>::zeros(&[3, 4]);

    let err = einsum2_str("ab,bc->d", &a, &b, &opts()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidSpecification);
    assert_eq!(
        err,
        EinsumError::OutputLabelNotInInputs {
            label: "'d'".to_string()
        }
    );
}

#[test]
fn test_single_operand_output_not_in_input() {
    let a = Tensor::<f64, Cpu>::zeros(&[2, 3]);
    let err = einsum1_str("ij->ik", &a).unwrap_err();
    assert!(matches!(err, EinsumError::OutputLabelNotInInputs { .. }));
}

#[test]
fn test_malformed_subscripts() {
    let a = Tensor::<f64, Cpu>::zeros(&[2]);

    for bad in ["i,i", "i->i", "i,i,i->i", "i,i->i->i"] {
        let err = einsum2_str(bad, &a, &a, &opts()).unwrap_err();
        assert!(matches!(err, EinsumError::Parse { .. }), "{bad}");
        assert_eq!(err.category(), ErrorCategory::InvalidSpecification);
    }
}

// ============================================================================
// Shape Mismatches
// ============================================================================

#[test]
fn test_shared_label_extent_mismatch() {
    // ab,ba->ab with both operands (2, 3): b is 3 on the first, 2 on the second
    let a = Tensor::<f64, Cpu>::zeros(&[2, 3]);
    let b = Tensor::<f64, Cpu>::zeros(&[2, 3]);

    let err = einsum2_str("ab,ba->ab", &a, &b, &opts()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::ShapeMismatch);
    assert_eq!(
        err,
        EinsumError::ShapeMismatch {
            label: "'b'".to_string(),
            expected: 3,
            got: 2
        }
    );
}

#[test]
fn test_labels_do_not_match_rank() {
    let a = Tensor::<f64, Cpu>::zeros(&[2, 3]);
    let b = Tensor::<f64, Cpu>::zeros(&[3]);

    let err = einsum2(&a, &[0usize], &b, &[1], &[0], &opts()).unwrap_err();
    assert!(matches!(err, EinsumError::RankMismatch { operand: "operand a", .. }));
    assert_eq!(err.category(), ErrorCategory::ShapeMismatch);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_zero_threads() {
    let a = Tensor::<f64, Cpu>::zeros(&[2, 2, 2]);
    let options = ContractOptions::new().with_threads(0);

    let err = einsum2_str("bij,bjk->bik", &a, &a, &options).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn test_failure_leaves_request_reusable() {
    let ein = Einsum::parse("ij,jk->ik").unwrap();
    let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    let wrong = Tensor::<f64, Cpu>::zeros(&[3, 2]);

    assert!(ein.execute(&a, &wrong).is_err());
    assert_eq!(ein.execute(&a, &a).unwrap().to_vec(), vec![7.0, 10.0, 15.0, 22.0]);
    assert_eq!(a.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
}
