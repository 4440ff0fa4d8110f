//! Automatic differentiation module
//!
//! This module provides reverse-mode automatic differentiation of formulas.
//!
//! # Overview
//!
//! The gradient computation follows the source transformation approach:
//! - `grad()` builds a new formula representing the gradient
//! - The gradient formula can be evaluated, lowered or differentiated again
//!   like any other formula
//! - No numerical approximation is involved at any point
//!
//! # Example
//!
//! ```
//! use keform::{Differentiable, Formula, Var};
//!
//! let x = Var::vi(0, 1).unwrap();
//! let f = Formula::var(x).square();
//!
//! let df = f.grad_unit(&x).unwrap();   // 2x
//! let ddf = df.grad_unit(&x).unwrap(); // 2
//! assert_eq!(ddf.eval(&[&[5.0]]).unwrap(), vec![2.0]);
//! ```
//!
//! # Supported Operations
//!
//! With upstream gradient `g`:
//!
//! ## Leaves
//! - `Var(i)`: `g` if `i` is the target, zero otherwise
//! - `Zero`, `Cst`, `IntCst`: zero
//!
//! ## Unary Operations
//! - `minus(a)`: `∂a = -g`
//! - `square(a)`: `2 * ∂a(a * g)`
//! - `pow(a, n)`: `n * ∂a(a^(n-1) * g)`
//! - `inv(a)`: `∂a = -(1/a)² * g`
//! - `exp(a)`: `∂a = exp(a) * g`
//! - `log(a)`: `∂a = g / a`
//! - `sin(a)`: `∂a = cos(a) * g`
//! - `cos(a)`: `∂a = -sin(a) * g`
//! - `sqrt(a)`: `∂a = g / (2 * sqrt(a))`
//! - `abs(a)`: `∂a = sign(a) * g`
//! - `sum(a)`: `∂a = sumT(g)`
//! - `sumT(a)`: `∂a = sum(g)`
//! - `clamp(a)`: `∂a = [lo <= a <= hi] * g`
//! - `elem(a, m)`: `∂a = elemT(g, m)`, and `elemT(a, m)`: `∂a = elem(g, m)`
//! - `extract(a, start)`: `∂a = extractT(g, start)`, and the reverse for `extractT`
//!
//! ## Binary Operations
//! - `add(a, b)`: `∂a = g`, `∂b = g`
//! - `sub(a, b)`: `∂a = g`, `∂b = -g`
//! - `mul(a, b)`: `∂a = b * g`, `∂b = a * g`
//! - `div(a, b)`: `∂a = g / b`, `∂b = -(a / b²) * g`
//! - `scal(s, b)`: `∂s = sum(b * g)`, `∂b = s * g`
//! - `scalprod(a, b)`: `∂a = g * b`, `∂b = g * a`
//! - `concat(a, b)`: `∂a`, `∂b` are the leading and trailing slices of `g`
//!
//! When an operand of dimension 1 was broadcast, its gradient is contracted
//! back to dimension 1 with `sum` (or a scalar product for `mul`).

mod backward;
mod context;
mod rules;

// Re-export main API
pub use backward::{grad, grad_unit, grads, Differentiable};
pub use context::Differentiator;
