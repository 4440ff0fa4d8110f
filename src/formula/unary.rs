//! Unary operator catalog: output dimension and forward rule
//!
//! The derivative rule of each operator lives in [`crate::grad`].

use std::fmt;

use num_traits::Float;

use crate::dim::{check_positive, check_range, require};
use crate::error::{FormulaError, Result};

/// Operators applied to a single sub-formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Minus,
    /// `x * x`
    Square,
    /// `x^n` for an integer exponent.
    Pow(i32),
    /// `1 / x`
    Inv,
    Exp,
    Log,
    Sin,
    Cos,
    Sqrt,
    Abs,
    /// `-1`, `0` or `1`.
    Sign,
    /// Sum of all components; output dimension 1.
    Sum,
    /// Adjoint of `Sum`: replicates a scalar over `d` components.
    SumT(usize),
    /// Clamp each component into `[a, b]`.
    ClampInt(i32, i32),
    /// `1` where `a <= x <= b`, `0` elsewhere (derivative indicator of `ClampInt`).
    DiffClampInt(i32, i32),
    /// Component `m`; output dimension 1.
    Elem(usize),
    /// Adjoint of `Elem`: a scalar placed at component `m` of `d` zeros.
    ElemT(usize, usize),
    /// Components `start..start + len`.
    Extract(usize, usize),
    /// Adjoint of `Extract`: the operand placed at `start` in `d` zeros.
    ExtractT(usize, usize),
}

impl UnaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            UnaryOp::Minus => "Minus",
            UnaryOp::Square => "Sq",
            UnaryOp::Pow(_) => "Pow",
            UnaryOp::Inv => "Inv",
            UnaryOp::Exp => "Exp",
            UnaryOp::Log => "Log",
            UnaryOp::Sin => "Sin",
            UnaryOp::Cos => "Cos",
            UnaryOp::Sqrt => "Sqrt",
            UnaryOp::Abs => "Abs",
            UnaryOp::Sign => "Sign",
            UnaryOp::Sum => "Sum",
            UnaryOp::SumT(_) => "SumT",
            UnaryOp::ClampInt(..) => "ClampInt",
            UnaryOp::DiffClampInt(..) => "DiffClampInt",
            UnaryOp::Elem(_) => "Elem",
            UnaryOp::ElemT(..) => "ElemT",
            UnaryOp::Extract(..) => "Extract",
            UnaryOp::ExtractT(..) => "ExtractT",
        }
    }

    /// Whether component `k` of the output depends only on component `k` of the input.
    pub fn is_elementwise(&self) -> bool {
        !matches!(
            self,
            UnaryOp::Sum
                | UnaryOp::SumT(_)
                | UnaryOp::Elem(_)
                | UnaryOp::ElemT(..)
                | UnaryOp::Extract(..)
                | UnaryOp::ExtractT(..)
        )
    }

    /// Whether a zero operand always yields a zero output.
    pub(crate) fn preserves_zero(&self) -> bool {
        matches!(self, UnaryOp::Minus) || !self.is_elementwise()
    }

    /// Output dimension for an operand of dimension `input`.
    pub fn dim(&self, input: usize) -> Result<usize> {
        match self {
            UnaryOp::Sum => Ok(1),
            UnaryOp::SumT(d) => {
                require("SumT", input, 1)?;
                check_positive("SumT", *d)
            }
            UnaryOp::Elem(m) => {
                check_range("Elem", *m, 1, input)?;
                Ok(1)
            }
            UnaryOp::ElemT(m, d) => {
                require("ElemT", input, 1)?;
                check_range("ElemT", *m, 1, *d)?;
                Ok(*d)
            }
            UnaryOp::Extract(start, len) => {
                check_range("Extract", *start, *len, input)?;
                Ok(*len)
            }
            UnaryOp::ExtractT(start, d) => {
                check_range("ExtractT", *start, input, *d)?;
                Ok(*d)
            }
            // the derivative rule needs `n - 1`
            UnaryOp::Pow(i32::MIN) => Err(FormulaError::InvalidExponent(i32::MIN)),
            _ => Ok(input),
        }
    }

    /// Forward rule for elementwise operators.
    fn scalar<T: Float>(&self, x: T) -> T {
        match *self {
            UnaryOp::Minus => -x,
            UnaryOp::Square => x * x,
            UnaryOp::Pow(n) => x.powi(n),
            UnaryOp::Inv => x.recip(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Log => x.ln(),
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Abs => x.abs(),
            UnaryOp::Sign => {
                if x > T::zero() {
                    T::one()
                } else if x < T::zero() {
                    -T::one()
                } else {
                    T::zero()
                }
            }
            UnaryOp::ClampInt(a, b) => {
                let (a, b) = (int_to_float::<T>(a), int_to_float::<T>(b));
                if x < a {
                    a
                } else if x > b {
                    b
                } else {
                    x
                }
            }
            UnaryOp::DiffClampInt(a, b) => {
                let (a, b) = (int_to_float::<T>(a), int_to_float::<T>(b));
                if x < a || x > b { T::zero() } else { T::one() }
            }
            UnaryOp::Sum
            | UnaryOp::SumT(_)
            | UnaryOp::Elem(_)
            | UnaryOp::ElemT(..)
            | UnaryOp::Extract(..)
            | UnaryOp::ExtractT(..) => unreachable!("{} is not elementwise", self.name()),
        }
    }

    /// Write the result for operand values `x` into `out`.
    pub fn apply<T: Float>(&self, out: &mut [T], x: &[T]) {
        match self {
            UnaryOp::Sum => out[0] = x.iter().fold(T::zero(), |acc, &v| acc + v),
            UnaryOp::SumT(_) => out.fill(x[0]),
            UnaryOp::Elem(m) => out[0] = x[*m],
            UnaryOp::ElemT(m, _) => {
                out.fill(T::zero());
                out[*m] = x[0];
            }
            UnaryOp::Extract(start, len) => out.copy_from_slice(&x[*start..*start + *len]),
            UnaryOp::ExtractT(start, _) => {
                out.fill(T::zero());
                out[*start..*start + x.len()].copy_from_slice(x);
            }
            _ => {
                for (o, &v) in out.iter_mut().zip(x) {
                    *o = self.scalar(v);
                }
            }
        }
    }

    /// Extra identifier parameters following the operand, e.g. `,3` for `Pow(x,3)`.
    pub(crate) fn fmt_params(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Pow(n) => write!(f, ",{n}"),
            UnaryOp::SumT(d) | UnaryOp::Elem(d) => write!(f, ",{d}"),
            UnaryOp::ElemT(a, b) | UnaryOp::Extract(a, b) | UnaryOp::ExtractT(a, b) => {
                write!(f, ",{a},{b}")
            }
            UnaryOp::ClampInt(a, b) | UnaryOp::DiffClampInt(a, b) => write!(f, ",{a},{b}"),
            _ => Ok(()),
        }
    }
}

pub(crate) fn int_to_float<T: Float>(n: i32) -> T {
    num_traits::cast::<i32, T>(n).unwrap_or_else(T::nan)
}
