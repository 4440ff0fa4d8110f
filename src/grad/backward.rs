//! Entry points for differentiation
//!
//! This module provides `grad()` and friends, which synthesise the gradient of
//! a formula as a new formula.

use log::debug;

use crate::error::Result;
use crate::formula::{Formula, Var};

use super::context::Differentiator;

// ============================================================================
// Gradient Functions
// ============================================================================

/// Gradient of `f` with respect to `v`, chain-composed with upstream gradient `g`.
///
/// `g` must have the dimension of `f`; the result has the dimension of `v`.
///
/// # Example
///
/// ```
/// use keform::{grad, Formula, Var};
///
/// let x = Var::vi(0, 1).unwrap();
/// let f = Formula::var(x).square();
/// let g = Formula::cst(1.0, 1).unwrap();
///
/// let df = grad(&f, &x, &g).unwrap();  // 2 * x
/// assert_eq!(df.eval(&[&[3.0]]).unwrap(), vec![6.0]);
/// ```
pub fn grad(f: &Formula, v: &Var, g: &Formula) -> Result<Formula> {
    Differentiator::from_env().grad(f, v, g)
}

/// Gradients of `f` with respect to several variables, sharing one cache.
///
/// Returns gradients in the same order as `vars`.
pub fn grads(f: &Formula, vars: &[&Var], g: &Formula) -> Result<Vec<Formula>> {
    let mut d = Differentiator::from_env();
    vars.iter().map(|v| d.grad(f, v, g)).collect()
}

/// Gradient of `f` with respect to `v` seeded with the all-ones upstream gradient.
pub fn grad_unit(f: &Formula, v: &Var) -> Result<Formula> {
    let seed = Formula::cst(1.0, f.dim())?;
    debug!("unit seed of dimension {}", f.dim());
    grad(f, v, &seed)
}

// ============================================================================
// Extension Trait for Formula
// ============================================================================

/// Extension trait to differentiate a formula in method position.
pub trait Differentiable {
    /// Gradient with respect to `v`, chain-composed with upstream gradient `g`.
    fn grad(&self, v: &Var, g: &Formula) -> Result<Formula>;

    /// Gradient with respect to `v` with an all-ones upstream gradient.
    fn grad_unit(&self, v: &Var) -> Result<Formula>;
}

impl Differentiable for Formula {
    fn grad(&self, v: &Var, g: &Formula) -> Result<Formula> {
        grad(self, v, g)
    }

    fn grad_unit(&self, v: &Var) -> Result<Formula> {
        grad_unit(self, v)
    }
}

impl Formula {
    /// `∂(self)/∂v` applied to upstream gradient `g`.
    pub fn diff_t(&self, v: &Var, g: &Formula) -> Result<Formula> {
        grad(self, v, g)
    }
}

// ============================================================================
// Tests
// ============================================================================
