//! Binary operator catalog: broadcasting contract and forward rule

use num_traits::Float;

use crate::dim::{broadcast_index, Broadcast};
use crate::error::Result;

/// Operators combining two sub-formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Mult,
    Divide,
    /// Scalar (left, `DIM = 1`) times vector (right).
    Scal,
    /// Scalar product; output `DIM = 1`.
    Scalprod,
    /// Left components followed by right components.
    Concat,
}

impl BinaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Subtract => "Subtract",
            BinaryOp::Mult => "Mult",
            BinaryOp::Divide => "Divide",
            BinaryOp::Scal => "Scal",
            BinaryOp::Scalprod => "Scalprod",
            BinaryOp::Concat => "Concat",
        }
    }

    /// Broadcasting contract of this operator.
    ///
    /// - `Add`, `Subtract`, `Mult`, `Divide`: equal dimensions, or either side of dimension 1
    /// - `Scal`: left operand of dimension 1
    /// - `Scalprod`: equal dimensions, contracted to 1
    /// - `Concat`: any dimensions, stacked
    pub fn broadcast(&self) -> Broadcast {
        match self {
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Mult | BinaryOp::Divide => {
                Broadcast::Either
            }
            BinaryOp::Scal => Broadcast::LhsScalar,
            BinaryOp::Scalprod => Broadcast::Contract,
            BinaryOp::Concat => Broadcast::Stack,
        }
    }

    /// Output dimension for operands of dimension `lhs` and `rhs`.
    pub fn dim(&self, lhs: usize, rhs: usize) -> Result<usize> {
        self.broadcast().resolve(self.name(), lhs, rhs)
    }

    fn scalar<T: Float>(&self, a: T, b: T) -> T {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Mult | BinaryOp::Scal | BinaryOp::Scalprod => a * b,
            BinaryOp::Divide => a / b,
            BinaryOp::Concat => unreachable!("Concat is not elementwise"),
        }
    }

    /// Write the result for operand values `a` and `b` into `out`.
    ///
    /// Operands of length 1 are broadcast over `out`.
    pub fn apply<T: Float>(&self, out: &mut [T], a: &[T], b: &[T]) {
        match self {
            BinaryOp::Scalprod => {
                out[0] = a
                    .iter()
                    .zip(b)
                    .fold(T::zero(), |acc, (&x, &y)| acc + x * y);
            }
            BinaryOp::Concat => {
                let (left, right) = out.split_at_mut(a.len());
                left.copy_from_slice(a);
                right.copy_from_slice(b);
            }
            _ => {
                for (k, o) in out.iter_mut().enumerate() {
                    let x = a[broadcast_index(a.len(), k)];
                    let y = b[broadcast_index(b.len(), k)];
                    *o = self.scalar(x, y);
                }
            }
        }
    }
}
