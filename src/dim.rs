//! Dimension model
//!
//! Every formula node carries a static output dimension (`DIM`) computed once
//! at construction. Binary operators resolve their output dimension through a
//! [`Broadcast`] contract; each operator picks its own contract explicitly
//! instead of sharing one general rule.

use crate::error::{FormulaError, Result};

/// Broadcasting contract of a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Broadcast {
    /// Both operands must have the same dimension.
    Equal,
    /// Equal dimensions, or either operand of dimension 1 broadcast to the other.
    Either,
    /// The left operand must have dimension 1; the output takes the right operand's dimension.
    LhsScalar,
    /// Equal dimensions, contracted to a single output component.
    Contract,
    /// Any dimensions; the output holds the left operand's components followed by the right's.
    Stack,
}

impl Broadcast {
    /// Resolve the output dimension for operands of dimension `lhs` and `rhs`.
    pub fn resolve(self, op: &'static str, lhs: usize, rhs: usize) -> Result<usize> {
        check_positive(op, lhs)?;
        check_positive(op, rhs)?;

        let mismatch = || FormulaError::DimensionMismatch { op, lhs, rhs };
        match self {
            Broadcast::Equal if lhs == rhs => Ok(lhs),
            Broadcast::Either if lhs == rhs || rhs == 1 => Ok(lhs),
            Broadcast::Either if lhs == 1 => Ok(rhs),
            Broadcast::LhsScalar if lhs == 1 => Ok(rhs),
            Broadcast::LhsScalar => Err(FormulaError::InvalidDimension { op, dim: lhs }),
            Broadcast::Contract if lhs == rhs => Ok(1),
            Broadcast::Stack => Ok(lhs + rhs),
            _ => Err(mismatch()),
        }
    }
}

/// Reject zero-length outputs.
pub fn check_positive(op: &'static str, dim: usize) -> Result<usize> {
    if dim == 0 {
        return Err(FormulaError::InvalidDimension { op, dim });
    }
    Ok(dim)
}

/// Require an operand of exactly `expected` components.
pub fn require(op: &'static str, dim: usize, expected: usize) -> Result<usize> {
    if dim != expected {
        return Err(FormulaError::InvalidDimension { op, dim });
    }
    Ok(dim)
}

/// Require `start..start + len` to be a non-empty range inside `0..dim`.
pub fn check_range(op: &'static str, start: usize, len: usize, dim: usize) -> Result<()> {
    let fits = start.checked_add(len).is_some_and(|end| end <= dim);
    if len == 0 || !fits {
        return Err(FormulaError::OutOfRange { op, start, len, dim });
    }
    Ok(())
}

/// Index of component `k` in an operand of dimension `dim` broadcast to a wider output.
#[inline]
pub fn broadcast_index(dim: usize, k: usize) -> usize {
    if dim == 1 { 0 } else { k }
}
