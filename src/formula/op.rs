use std::fmt;
use std::hash::{Hash, Hasher};

use crate::dim::check_positive;
use crate::error::Result;
use crate::formula::{BinaryOp, UnaryOp};

/// Which axis of the kernel a variable is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VarCategory {
    /// Indexed by the first point set (`x_i`).
    I,
    /// Indexed by the second point set (`y_j`).
    J,
    /// Shared by every pair of points.
    Param,
}

impl VarCategory {
    /// Numeric code used in identifiers.
    pub fn code(self) -> u8 {
        match self {
            VarCategory::I => 0,
            VarCategory::J => 1,
            VarCategory::Param => 2,
        }
    }
}

/// A variable leaf: reads input slot `index`, a vector of `dim` components.
///
/// Two variables are the same variable iff their indices match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var {
    pub index: usize,
    pub dim: usize,
    pub cat: VarCategory,
}

impl Var {
    pub fn new(index: usize, dim: usize, cat: VarCategory) -> Result<Self> {
        check_positive("Var", dim)?;
        Ok(Self { index, dim, cat })
    }

    /// Variable indexed by the first point set.
    pub fn vi(index: usize, dim: usize) -> Result<Self> {
        Self::new(index, dim, VarCategory::I)
    }

    /// Variable indexed by the second point set.
    pub fn vj(index: usize, dim: usize) -> Result<Self> {
        Self::new(index, dim, VarCategory::J)
    }

    /// Parameter shared by all points.
    pub fn pm(index: usize, dim: usize) -> Result<Self> {
        Self::new(index, dim, VarCategory::Param)
    }

    /// Whether `other` refers to the same input slot.
    pub fn is_same(&self, other: &Var) -> bool {
        self.index == other.index
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Var({},{},{})", self.index, self.dim, self.cat.code())
    }
}

/// The operation performed by a formula node.
///
/// Leaves (`Var`, `Zero`, `Cst`, `IntCst`) have no sources; `Unary` nodes have
/// one and `Binary` nodes have two.
#[derive(Debug, Clone, Copy)]
pub enum FormulaOp {
    Var(Var),
    /// All-zero vector.
    Zero,
    /// A scalar replicated over every component.
    Cst(f64),
    /// Integer constant, always of dimension 1.
    IntCst(i32),
    Unary(UnaryOp),
    Binary(BinaryOp),
}

impl FormulaOp {
    pub fn is_leaf(&self) -> bool {
        !matches!(self, FormulaOp::Unary(_) | FormulaOp::Binary(_))
    }

    /// Short operator name used in identifiers and log messages.
    pub fn name(&self) -> &'static str {
        match self {
            FormulaOp::Var(_) => "Var",
            FormulaOp::Zero => "Zero",
            FormulaOp::Cst(_) => "Cst",
            FormulaOp::IntCst(_) => "IntCst",
            FormulaOp::Unary(op) => op.name(),
            FormulaOp::Binary(op) => op.name(),
        }
    }
}

// Cst is compared bitwise so that structurally identical trees hash and compare equal.
impl PartialEq for FormulaOp {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FormulaOp::Var(a), FormulaOp::Var(b)) => a == b,
            (FormulaOp::Zero, FormulaOp::Zero) => true,
            (FormulaOp::Cst(a), FormulaOp::Cst(b)) => a.to_bits() == b.to_bits(),
            (FormulaOp::IntCst(a), FormulaOp::IntCst(b)) => a == b,
            (FormulaOp::Unary(a), FormulaOp::Unary(b)) => a == b,
            (FormulaOp::Binary(a), FormulaOp::Binary(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FormulaOp {}

impl Hash for FormulaOp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FormulaOp::Var(v) => v.hash(state),
            FormulaOp::Zero => {}
            FormulaOp::Cst(c) => c.to_bits().hash(state),
            FormulaOp::IntCst(n) => n.hash(state),
            FormulaOp::Unary(op) => op.hash(state),
            FormulaOp::Binary(op) => op.hash(state),
        }
    }
}
