//! Common test utilities for formula integration tests
#![allow(dead_code)]

use keform::{Formula, Var};

pub const EPSILON: f64 = 1e-9;

/// Tolerance for comparisons against central finite differences.
pub const FD_TOLERANCE: f64 = 1e-5;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

pub fn vec_approx_eq(a: &[f64], b: &[f64]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| approx_eq(*x, *y))
}

/// The variables used across tests: `x_i` (3), `y_j` (3), `b_j` (2), `p` (1).
pub struct Leaves {
    pub vars: [Var; 4],
    pub x: Formula,
    pub y: Formula,
    pub b: Formula,
    pub p: Formula,
}

impl Leaves {
    pub fn new() -> Self {
        let vars = [
            Var::vi(0, 3).unwrap(),
            Var::vj(1, 3).unwrap(),
            Var::vj(2, 2).unwrap(),
            Var::pm(3, 1).unwrap(),
        ];
        Self {
            vars,
            x: Formula::var(vars[0]),
            y: Formula::var(vars[1]),
            b: Formula::var(vars[2]),
            p: Formula::var(vars[3]),
        }
    }
}

/// A sample point for [`Leaves`], slot `i` holding the value of variable `i`.
pub fn sample_point() -> Vec<Vec<f64>> {
    vec![
        vec![0.3, -0.5, 0.8],
        vec![0.1, 0.4, -0.2],
        vec![1.5, -0.7],
        vec![0.9],
    ]
}

pub fn eval_at(f: &Formula, inputs: &[Vec<f64>]) -> Vec<f64> {
    let slices: Vec<&[f64]> = inputs.iter().map(Vec::as_slice).collect();
    f.eval(&slices).unwrap()
}

/// Central finite difference of `sum_j g_j * f_j` with respect to each component of `v`.
pub fn numeric_vjp(f: &Formula, v: &Var, g: &[f64], inputs: &[Vec<f64>]) -> Vec<f64> {
    let eps = 1e-6;
    (0..v.dim)
        .map(|k| {
            let mut plus = inputs.to_vec();
            plus[v.index][k] += eps;
            let mut minus = inputs.to_vec();
            minus[v.index][k] -= eps;

            let fp = eval_at(f, &plus);
            let fm = eval_at(f, &minus);
            fp.iter()
                .zip(&fm)
                .zip(g)
                .map(|((a, b), gj)| gj * (a - b) / (2.0 * eps))
                .sum()
        })
        .collect()
}
