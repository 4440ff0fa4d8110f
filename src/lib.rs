//! Keform: symbolic kernel formulas
//!
//! Keform builds elementwise vector formulas (distances, radial basis
//! functions, ...) that an execution engine later evaluates densely over large
//! point sets, and derives their gradients symbolically at construction time.
//!
//! # Architecture
//!
//! Keform provides:
//! - **dim**: Static output dimensions and per-operator broadcasting contracts
//! - **formula**: Immutable formula trees and the operator catalog
//! - **eval**: The per-node evaluation contract and a reference evaluator
//! - **grad**: Reverse-mode differentiation producing new formulas
//! - **config**: Differentiation engine settings
//!
//! Lowering formulas into executable kernels, reductions over point sets and
//! memory management live outside this crate and consume the contract exposed
//! here: `dim()`, `identifier()`, `operation()` and `diff_t()`.
//!
//! # Example
//!
//! ```
//! use keform::prelude::*;
//!
//! let x = Var::vi(0, 3).unwrap();
//! let y = Var::vj(1, 3).unwrap();
//! let b = Var::vj(2, 1).unwrap();
//!
//! // exp(-|x - y|²) * b
//! let k = Formula::gaussian_kernel(&x.into(), &y.into(), &b.into()).unwrap();
//! let dk_dx = k.grad_unit(&x).unwrap();
//!
//! assert_eq!(dk_dx.dim(), 3);
//! ```

// ============================================================================
// Core Modules
// ============================================================================

pub mod config;
pub mod dim;
pub mod error;
pub mod eval;
pub mod formula;
pub mod grad;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::GradConfig;
pub use error::{FormulaError, Result};
pub use eval::{Bindings, Evaluator};
pub use formula::{BinaryOp, Formula, FormulaOp, UnaryOp, Var, VarCategory};
pub use grad::{grad, grad_unit, grads, Differentiable, Differentiator};

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module with commonly used types and traits
pub mod prelude {
    // Formulas
    pub use crate::formula::{BinaryOp, Formula, UnaryOp, Var, VarCategory};

    // Differentiation
    pub use crate::grad::{grad, grad_unit, Differentiable};

    // Evaluation
    pub use crate::eval::{Bindings, Evaluator};

    pub use crate::error::FormulaError;
}
