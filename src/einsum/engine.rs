//! Einsum request record and its execution.

use std::str::FromStr;

use tracing::debug;

use super::builder::ContractOptions;
use super::labels::{check_output_covered, check_unique, Label, LabelPartition};
use super::layout::{pack, transpose_labels, unpack};
use super::reduce::sum_unique_axes;
use super::shapes::{check_rank, ExtentMap};
use crate::error::{EinsumError, EinsumResult};
use crate::ops::ArrayOps;

/// A two-operand contraction `ia, ib -> iy` together with its options.
///
/// Built either from label lists ([`Einsum::new`]) or from a subscript
/// string ([`Einsum::parse`]); both produce the same record.
///
/// # Example
///
/// ```rust
/// use einsum2::{Cpu, Einsum, Tensor};
///
/// let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
/// let b = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
///
/// // C[i,k] = Σ_j A[i,j] × B[j,k]
/// let ein = Einsum::parse("ij,jk->ik").unwrap();
/// let c = ein.execute(&a, &b).unwrap();
/// assert_eq!(c.to_vec(), vec![7.0, 10.0, 15.0, 22.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Einsum<L: Label = char> {
    /// Labels of the first operand
    pub ia: Vec<L>,

    /// Labels of the second operand
    pub ib: Vec<L>,

    /// Output labels, in result axis order
    pub iy: Vec<L>,

    /// Thread hint and product-path policy
    pub options: ContractOptions,
}

impl<L: Label> Einsum<L> {
    /// Create a contraction from explicit label lists with default options.
    pub fn new(ia: Vec<L>, ib: Vec<L>, iy: Vec<L>) -> Self {
        Self {
            ia,
            ib,
            iy,
            options: ContractOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ContractOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate the labels and classify them.
    pub fn partition(&self) -> EinsumResult<LabelPartition<L>> {
        LabelPartition::new(&self.ia, &self.ib, &self.iy)
    }

    /// Contract `a` and `b`.
    ///
    /// Axes carried by only one operand and absent from the output are summed
    /// first. The two operands are then packed into `(batch, rows, K)` and
    /// `(batch, K, cols)`, multiplied, and the product is unpacked into the
    /// output label order.
    pub fn execute<A: ArrayOps>(&self, a: &A, b: &A) -> EinsumResult<A> {
        self.options.validate()?;
        check_rank(&a.dims(), &self.ia, "operand a")?;
        check_rank(&b.dims(), &self.ib, "operand b")?;
        let initial = self.partition()?;
        if !initial.is_reduced() {
            debug!(
                a_reduced = ?initial.a_reduced,
                b_reduced = ?initial.b_reduced,
                "summing axes needed by neither the other operand nor the output"
            );
        }

        let (a, ia) = sum_unique_axes(a, &self.ia, &[&self.ib, &self.iy]);
        let (b, ib) = sum_unique_axes(b, &self.ib, &[&ia, &self.iy]);
        let partition = LabelPartition::new(&ia, &ib, &self.iy)?;

        let mut extents = ExtentMap::new();
        extents.record(&a.dims(), &ia)?;
        extents.record(&b.dims(), &ib)?;

        let kept = &partition.shared_kept[..];
        let summed = &partition.shared_summed[..];
        let a_packed = pack(&a, &ia, [kept, &partition.a_free[..], summed], &extents)?;
        let b_packed = pack(&b, &ib, [kept, summed, &partition.b_free[..]], &extents)?;

        let (a_dims, b_dims) = (a_packed.dims(), b_packed.dims());
        debug!(
            batch = ?partition.shared_kept,
            rows = ?partition.a_free,
            contracted = ?partition.shared_summed,
            cols = ?partition.b_free,
            a_packed = ?a_dims,
            b_packed = ?b_dims,
            "contraction layout"
        );

        let product = if self.options.use_fast_path && kept.is_empty() {
            debug!("no batch axes, using plain matmul");
            let a2 = a_packed.reshaped(&[a_dims[1], a_dims[2]]);
            let b2 = b_packed.reshaped(&[b_dims[1], b_dims[2]]);
            a2.matmul2(&b2)?
        } else {
            debug!(threads = self.options.threads, "using batched matmul");
            a_packed.batched_matmul3(&b_packed, self.options.threads)?
        };

        unpack(&product, &partition.product_labels(), &self.iy, &extents)
    }
}

impl Einsum<char> {
    /// Parse `"<a>,<b>-><out>"`, one character per label.
    ///
    /// The output part is required and may be empty (`"k,k->"`).
    pub fn parse(subscripts: &str) -> EinsumResult<Self> {
        let (inputs, output) = split_arrow(subscripts)?;
        let operands: Vec<&str> = inputs.split(',').collect();
        if operands.len() != 2 {
            return Err(EinsumError::parse(format!(
                "expected two comma-separated operands in {:?}, got {}",
                subscripts,
                operands.len()
            )));
        }
        Ok(Self::new(
            subscript_chars(operands[0]),
            subscript_chars(operands[1]),
            subscript_chars(output),
        ))
    }
}

impl FromStr for Einsum<char> {
    type Err = EinsumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Sum every axis absent from `iy`, then reorder to `iy`.
///
/// Single-operand counterpart of [`Einsum::execute`]; no product is involved.
pub fn reduce_transpose<A: ArrayOps, L: Label>(arr: &A, ia: &[L], iy: &[L]) -> EinsumResult<A> {
    check_rank(&arr.dims(), ia, "operand")?;
    check_unique(ia, "operand")?;
    check_unique(iy, "output")?;
    check_output_covered(&[ia], iy)?;

    let (reduced, labels) = sum_unique_axes(arr, ia, &[iy]);
    transpose_labels(&reduced, &labels, iy)
}

/// Parse `"<a>-><out>"` into its two label lists.
pub fn parse_unary(subscripts: &str) -> EinsumResult<(Vec<char>, Vec<char>)> {
    let (input, output) = split_arrow(subscripts)?;
    if input.contains(',') {
        return Err(EinsumError::parse(format!(
            "expected a single operand in {:?}",
            subscripts
        )));
    }
    Ok((subscript_chars(input), subscript_chars(output)))
}

fn split_arrow(subscripts: &str) -> EinsumResult<(&str, &str)> {
    match subscripts.split_once("->") {
        Some((_, output)) if output.contains("->") => Err(EinsumError::parse(format!(
            "more than one '->' in {:?}",
            subscripts
        ))),
        Some(parts) => Ok(parts),
        None => Err(EinsumError::parse(format!(
            "output subscripts must be given explicitly with '->' in {:?}",
            subscripts
        ))),
    }
}

fn subscript_chars(s: &str) -> Vec<char> {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Cpu;
    use crate::tensor::Tensor;

    #[test]
    fn test_parse() {
        let ein = Einsum::parse("ij,jk->ik").unwrap();
        assert_eq!(ein.ia, vec!['i', 'j']);
        assert_eq!(ein.ib, vec!['j', 'k']);
        assert_eq!(ein.iy, vec!['i', 'k']);
        assert_eq!(ein, "ij, jk -> ik".parse::<Einsum>().unwrap());

        let dot = Einsum::parse("k,k->").unwrap();
        assert!(dot.iy.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["ij,jk", "ij->i", "a,b,c->a", "a,b->a->b"] {
            let err = Einsum::parse(bad).unwrap_err();
            assert!(matches!(err, EinsumError::Parse { .. }), "{bad}: {err}");
        }
    }

    #[test]
    fn test_execute_matmul() {
        // [[1,3],[2,4]] @ [[5,7],[6,8]] = [[23,31],[34,46]]
        let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let b = Tensor::<f64, Cpu>::from_data(&[5.0, 6.0, 7.0, 8.0], &[2, 2]);

        let c = Einsum::parse("ij,jk->ik").unwrap().execute(&a, &b).unwrap();
        assert_eq!(c.to_vec(), vec![23.0, 34.0, 31.0, 46.0]);

        // Transposed output: C^T
        let ct = Einsum::parse("ij,jk->ki").unwrap().execute(&a, &b).unwrap();
        assert_eq!(ct.to_vec(), vec![23.0, 31.0, 34.0, 46.0]);
    }

    #[test]
    fn test_execute_outer_product() {
        let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0], &[2]);
        let b = Tensor::<f64, Cpu>::from_data(&[3.0, 4.0, 5.0], &[3]);

        let c = Einsum::parse("i,j->ij").unwrap().execute(&a, &b).unwrap();
        assert_eq!(c.shape(), &[2, 3]);
        assert_eq!(c.to_vec(), vec![3.0, 6.0, 4.0, 8.0, 5.0, 10.0]);
    }

    #[test]
    fn test_execute_sums_lonely_axes() {
        // ij,k->i : j and k only ever get summed
        let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let b = Tensor::<f64, Cpu>::from_data(&[1.0, 1.0, 1.0], &[3]);

        let c = Einsum::parse("ij,k->i").unwrap().execute(&a, &b).unwrap();
        assert_eq!(c.to_vec(), vec![12.0, 18.0]);
    }

    #[test]
    fn test_execute_scalars() {
        let a = Tensor::<f64, Cpu>::scalar(3.0);
        let b = Tensor::<f64, Cpu>::scalar(-2.0);

        let c = Einsum::parse(",->").unwrap().execute(&a, &b).unwrap();
        assert_eq!(c.ndim(), 0);
        assert_eq!(c.to_vec(), vec![-6.0]);

        let v = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0], &[2]);
        let scaled = Einsum::parse(",i->i").unwrap().execute(&a, &v).unwrap();
        assert_eq!(scaled.to_vec(), vec![3.0, 6.0]);
    }

    #[test]
    fn test_execute_rank_mismatch() {
        let a = Tensor::<f64, Cpu>::zeros(&[2, 2]);
        let b = Tensor::<f64, Cpu>::zeros(&[2]);

        let err = Einsum::parse("ijk,k->i").unwrap().execute(&a, &b).unwrap_err();
        assert!(matches!(
            err,
            EinsumError::RankMismatch {
                operand: "operand a",
                labels: 3,
                ndim: 2
            }
        ));
    }

    #[test]
    fn test_execute_rejects_zero_threads() {
        let a = Tensor::<f64, Cpu>::zeros(&[2]);
        let ein = Einsum::parse("i,i->")
            .unwrap()
            .with_options(ContractOptions::new().with_threads(0));
        assert!(matches!(ein.execute(&a, &a), Err(EinsumError::InvalidConfig { .. })));
    }

    #[test]
    fn test_reduce_transpose() {
        // [[1,3,5],[2,4,6]]
        let a = Tensor::<f64, Cpu>::from_data(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);

        let t = reduce_transpose(&a, &['i', 'j'], &['j', 'i']).unwrap();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.to_vec(), vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);

        let rows = reduce_transpose(&a, &['i', 'j'], &['i']).unwrap();
        assert_eq!(rows.to_vec(), vec![9.0, 12.0]);

        let total = reduce_transpose::<_, char>(&a, &['i', 'j'], &[]).unwrap();
        assert_eq!(total.to_vec(), vec![21.0]);
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(parse_unary("ij->ji").unwrap(), (vec!['i', 'j'], vec!['j', 'i']));
        assert!(parse_unary("ij,jk->ik").is_err());
        assert!(parse_unary("ij").is_err());
    }
}
