//! Gradient verification against central finite differences.
//!
//! For a contraction C = ein(A, B) and fixed random weights W, the tape
//! gradient of Σ W ⊙ C must match the numerical derivative for both operands,
//! on both product paths, and again for gradients of gradients.

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use einsum2::autodiff::{grad, grad_with_seed, Tape};
use einsum2::{einsum2_str, ContractOptions, Cpu, Einsum, Tensor};

type T64 = Tensor<f64, Cpu>;

// ============================================================================
// Helpers
// ============================================================================

fn extent(label: char) -> usize {
    match label {
        'b' | 'j' => 3,
        'k' => 4,
        _ => 2,
    }
}

fn random_tensor(rng: &mut StdRng, labels: &[char]) -> T64 {
    let shape: Vec<usize> = labels.iter().map(|&l| extent(l)).collect();
    let numel: usize = shape.iter().product();
    let data: Vec<f64> = (0..numel).map(|_| rng.gen_range(-1.0..1.0)).collect();
    Tensor::from_data(&data, &shape)
}

fn weighted_sum(out: &T64, weights: &T64) -> f64 {
    out.mul(weights).sum()
}

/// Central differences of `f` at `x`, one entry per element.
fn finite_diff(x: &T64, f: impl Fn(&T64) -> f64) -> Vec<f64> {
    let h = 1e-6;
    let data = x.to_vec();
    (0..data.len())
        .map(|i| {
            let mut plus = data.clone();
            let mut minus = data.clone();
            plus[i] += h;
            minus[i] -= h;
            let fp = f(&T64::from_data(&plus, x.shape()));
            let fm = f(&T64::from_data(&minus, x.shape()));
            (fp - fm) / (2.0 * h)
        })
        .collect()
}

fn assert_close(actual: &[f64], expected: &[f64], epsilon: f64) {
    assert_eq!(actual.len(), expected.len());
    for (x, y) in actual.iter().zip(expected) {
        assert_abs_diff_eq!(*x, *y, epsilon = epsilon);
    }
}

fn check_first_order(subscripts: &str, options: ContractOptions, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let ein = Einsum::parse(subscripts).unwrap().with_options(options);
    let a0 = random_tensor(&mut rng, &ein.ia);
    let b0 = random_tensor(&mut rng, &ein.ib);
    let w = random_tensor(&mut rng, &ein.iy);

    let tape = Tape::new();
    let a = tape.var(a0.clone());
    let b = tape.var(b0.clone());
    let out = ein.execute(&a, &b).unwrap();
    let grads = grad_with_seed(&out, &w, &[&a, &b]).unwrap();

    assert_eq!(grads[0].shape(), a0.shape(), "{subscripts}");
    assert_eq!(grads[1].shape(), b0.shape(), "{subscripts}");

    let num_a = finite_diff(&a0, |x| weighted_sum(&ein.execute(x, &b0).unwrap(), &w));
    let num_b = finite_diff(&b0, |x| weighted_sum(&ein.execute(&a0, x).unwrap(), &w));
    assert_close(&grads[0].value().to_vec(), &num_a, 1e-6);
    assert_close(&grads[1].value().to_vec(), &num_b, 1e-6);
}

// ============================================================================
// First Order
// ============================================================================

const CASES: &[&str] = &[
    "ij,jk->ik",
    "ij,jk->ki",
    "bij,bjk->bik",
    "bij,bjk->kbi",
    "k,k->",
    "i,j->ji",
    "ab,ab->ab",
    "bixj,bjyk->bki",
    "bij,bj->ib",
];

#[test]
fn test_first_order_fast_path() {
    for (n, subscripts) in CASES.iter().enumerate() {
        check_first_order(subscripts, ContractOptions::default(), n as u64);
    }
}

#[test]
fn test_first_order_batched_path() {
    let options = ContractOptions::new().with_fast_path(false);
    for (n, subscripts) in CASES.iter().enumerate() {
        check_first_order(subscripts, options, 100 + n as u64);
    }
}

#[test]
fn test_first_order_with_threads() {
    let options = ContractOptions::new().with_threads(3);
    check_first_order("bij,bjk->bik", options, 7);
    check_first_order("bixj,bjyk->bki", options, 8);
}

#[test]
fn test_batched_matmul_gradient_closed_form() {
    // dΣC/dA[b,i,j] = Σ_k B[b,j,k] and dΣC/dB[b,j,k] = Σ_i A[b,i,j]
    let mut rng = StdRng::seed_from_u64(21);
    let a0 = random_tensor(&mut rng, &['b', 'i', 'j']);
    let b0 = random_tensor(&mut rng, &['b', 'j', 'k']);

    let tape = Tape::new();
    let a = tape.var(a0.clone());
    let b = tape.var(b0.clone());
    let c = einsum2_str("bij,bjk->bik", &a, &b, &ContractOptions::default()).unwrap();
    let grads = grad(&c, &[&a, &b]).unwrap();

    let (nb, ni, nj, nk) = (extent('b'), extent('i'), extent('j'), extent('k'));
    for bb in 0..nb {
        for i in 0..ni {
            for j in 0..nj {
                let expected: f64 = (0..nk).map(|k| b0.get(&[bb, j, k])).sum();
                assert_abs_diff_eq!(grads[0].value().get(&[bb, i, j]), expected, epsilon = 1e-12);
            }
        }
        for j in 0..nj {
            for k in 0..nk {
                let expected: f64 = (0..ni).map(|i| a0.get(&[bb, i, j])).sum();
                assert_abs_diff_eq!(grads[1].value().get(&[bb, j, k]), expected, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn test_constant_operand_gets_no_gradient_work() {
    let mut rng = StdRng::seed_from_u64(4);
    let a0 = random_tensor(&mut rng, &['i', 'j']);
    let b0 = random_tensor(&mut rng, &['j', 'k']);

    let tape = Tape::new();
    let a = tape.var(a0);
    let b = tape.constant(b0.clone());
    let c = einsum2_str("ij,jk->ik", &a, &b, &ContractOptions::default()).unwrap();
    let grads = grad(&c, &[&a, &b]).unwrap();

    // Σ_k B[j,k] for every i
    let row: Vec<f64> = (0..extent('j'))
        .map(|j| (0..extent('k')).map(|k| b0.get(&[j, k])).sum())
        .collect();
    for i in 0..extent('i') {
        for (j, expected) in row.iter().enumerate() {
            assert_abs_diff_eq!(grads[0].value().get(&[i, j]), *expected, epsilon = 1e-12);
        }
    }
    assert!(grads[1].value().to_vec().iter().all(|&x| x == 0.0));
}

// ============================================================================
// Second Order
// ============================================================================

/// Σ V ⊙ ∂(Σ W ⊙ ein(X, X))/∂X, computed on a fresh tape.
///
/// Labels i, m, n share one extent so X can fill both operand slots.
fn directional_first_grad(ein: &Einsum, x0: &T64, w: &T64, v: &T64) -> f64 {
    let tape = Tape::new();
    let x = tape.var(x0.clone());
    let out = ein.execute(&x, &x).unwrap();
    let g = grad_with_seed(&out, w, &[&x]).unwrap();
    weighted_sum(g[0].value(), v)
}

fn check_second_order(subscripts: &str, options: ContractOptions, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let ein = Einsum::parse(subscripts).unwrap().with_options(options);
    let x0 = random_tensor(&mut rng, &ein.ia);
    let w = random_tensor(&mut rng, &ein.iy);
    let v = random_tensor(&mut rng, &ein.ia);

    let tape = Tape::new();
    let x = tape.var(x0.clone());
    let out = ein.execute(&x, &x).unwrap();
    let first = grad_with_seed(&out, &w, &[&x]).unwrap();
    let second = grad_with_seed(&first[0], &v, &[&x]).unwrap();

    let numerical = finite_diff(&x0, |x| directional_first_grad(&ein, x, &w, &v));
    assert_close(&second[0].value().to_vec(), &numerical, 1e-5);
}

#[test]
fn test_second_order_plain_matmul() {
    // X X for square X: both product operands are the same variable
    check_second_order("im,mn->in", ContractOptions::default(), 31);
}

#[test]
fn test_second_order_batched() {
    check_second_order("bim,bmn->bin", ContractOptions::default(), 32);
    check_second_order("bim,bmn->nib", ContractOptions::new().with_threads(2), 33);
}

#[test]
fn test_second_order_forced_batched_path() {
    let options = ContractOptions::new().with_fast_path(false);
    check_second_order("im,mn->ni", options, 34);
}

#[test]
fn test_mixed_second_derivative() {
    // For C = A B, ∂/∂B of Σ V ⊙ ∂(Σ W ⊙ C)/∂A is Σ_i V[i,j] W[i,k]
    let mut rng = StdRng::seed_from_u64(35);
    let a0 = random_tensor(&mut rng, &['i', 'j']);
    let b0 = random_tensor(&mut rng, &['j', 'k']);
    let w = random_tensor(&mut rng, &['i', 'k']);
    let v = random_tensor(&mut rng, &['i', 'j']);

    let tape = Tape::new();
    let a = tape.var(a0);
    let b = tape.var(b0);
    let c = einsum2_str("ij,jk->ik", &a, &b, &ContractOptions::default()).unwrap();
    let ga = grad_with_seed(&c, &w, &[&a]).unwrap();
    let mixed = grad_with_seed(&ga[0], &v, &[&a, &b]).unwrap();

    // Σ W ⊙ A B is bilinear, so nothing flows back into A
    assert!(mixed[0].value().to_vec().iter().all(|&x| x == 0.0));

    let expected = einsum2_str("ij,ik->jk", &v, &w, &ContractOptions::default()).unwrap();
    assert_close(&mixed[1].value().to_vec(), &expected.to_vec(), 1e-12);
}
