//! Error types for formula construction and evaluation
//!
//! Every error here is structural: it is raised while a formula is being
//! composed (or while inputs are bound for the reference evaluator), never
//! halfway through evaluating or differentiating a valid formula.

use thiserror::Error;

/// Errors raised while composing, differentiating or binding formulas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Two operands violate the broadcasting contract of a binary operator.
    #[error("Dimension mismatch in {op}: {lhs} vs {rhs}")]
    DimensionMismatch {
        op: &'static str,
        lhs: usize,
        rhs: usize,
    },

    /// An operator received an operand whose dimension it cannot accept.
    #[error("Invalid dimension for {op}: {dim}")]
    InvalidDimension { op: &'static str, dim: usize },

    /// The upstream gradient does not have the dimension of the formula it seeds.
    #[error("Upstream gradient has dimension {found}, expected {expected}")]
    GradientDimension { expected: usize, found: usize },

    /// Two variable leaves share an index but disagree on dimension or category.
    #[error("Variable {index} declared as {first} and {second}")]
    VariableConflict {
        index: usize,
        first: String,
        second: String,
    },

    /// A component range does not fit in the operand (or output) dimension.
    #[error("{op}: {len} components from {start} out of range for dimension {dim}")]
    OutOfRange {
        op: &'static str,
        start: usize,
        len: usize,
        dim: usize,
    },

    /// `Pow` exponent whose derivative exponent `n - 1` is not representable.
    #[error("Unsupported exponent for Pow: {0}")]
    InvalidExponent(i32),

    /// `ClampInt` bounds are out of order.
    #[error("Invalid clamp bounds: [{low}, {high}]")]
    InvalidClamp { low: i32, high: i32 },

    /// The differentiation engine went deeper than the configured limit.
    #[error("Differentiation exceeded maximum depth {0}")]
    DepthExceeded(usize),

    /// No value was bound for a variable slot.
    #[error("Missing input for variable {index}")]
    MissingInput { index: usize },

    /// A bound input does not have the variable's dimension.
    #[error("Input {index} has length {found}, expected {expected}")]
    InputLength {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FormulaError>;
