//! Formula representation
//!
//! A formula is an immutable tree of nodes. Each node has a static output
//! dimension, a structural identifier, a forward rule (see [`crate::eval`]) and
//! a derivative rule (see [`crate::grad`]).
//!
//! # Operator catalog
//!
//! ## Leaves
//! - `Var(i)`: reads input slot `i`
//! - `Zero`, `Cst(c)`, `IntCst(n)`
//!
//! ## Unary (`UnaryOp`)
//! - elementwise: `Minus`, `Square`, `Pow(n)`, `Inv`, `Exp`, `Log`, `Sin`, `Cos`,
//!   `Sqrt`, `Abs`, `Sign`, `ClampInt(a, b)`, `DiffClampInt(a, b)`
//! - dimension changing: `Sum` (to 1), `SumT(d)` (1 to `d`)
//! - selection: `Elem(m)`, `Extract(start, len)` and their adjoints `ElemT(m, d)`,
//!   `ExtractT(start, d)`, which zero-fill a wider output
//!
//! ## Binary (`BinaryOp`)
//! - `Add`, `Subtract`, `Mult`, `Divide`: equal dimensions or a scalar side
//! - `Scal`: scalar left operand times vector
//! - `Scalprod`: scalar product
//! - `Concat`: stacks both operands
//!
//! Weighted squared norms (`weighted_sqnorm`, `weighted_sqdist`) are built from
//! these and need no rule of their own.

mod binary;
mod builder;
mod node;
mod op;
mod ops;
mod unary;

pub use binary::BinaryOp;
pub use node::{Formula, FormulaInner, NodeKey};
pub use op::{FormulaOp, Var, VarCategory};
pub use unary::UnaryOp;

pub(crate) use unary::int_to_float;
