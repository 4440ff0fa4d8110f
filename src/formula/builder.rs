//! Formula constructors
//!
//! Every constructor checks the operator's dimension contract before the node
//! exists, so a malformed formula can never be built. Zero formulas are folded
//! where composition yields them directly (`0 + F = F`, `0 * F = 0`, ...);
//! nothing else is simplified.

use crate::dim::{check_positive, require};
use crate::error::{FormulaError, Result};
use crate::formula::{BinaryOp, Formula, FormulaOp, UnaryOp, Var};

// ============================================================================
// Leaves
// ============================================================================

impl Formula {
    /// Variable leaf.
    pub fn var(v: Var) -> Self {
        Formula::from_parts(FormulaOp::Var(v), vec![], v.dim)
    }

    /// All-zero formula of dimension `dim`.
    pub fn zero(dim: usize) -> Result<Self> {
        check_positive("Zero", dim)?;
        Ok(Formula::from_parts(FormulaOp::Zero, vec![], dim))
    }

    /// `value` replicated over `dim` components.
    pub fn cst(value: f64, dim: usize) -> Result<Self> {
        check_positive("Cst", dim)?;
        Ok(Formula::from_parts(FormulaOp::Cst(value), vec![], dim))
    }

    /// Integer constant of dimension 1.
    pub fn int_cst(n: i32) -> Self {
        Formula::from_parts(FormulaOp::IntCst(n), vec![], 1)
    }
}

impl From<Var> for Formula {
    fn from(v: Var) -> Self {
        Formula::var(v)
    }
}

impl From<i32> for Formula {
    fn from(n: i32) -> Self {
        Formula::int_cst(n)
    }
}

// ============================================================================
// Unary operators
// ============================================================================

impl Formula {
    /// Apply a unary operator, checking its dimension rule.
    pub fn unary(op: UnaryOp, f: &Formula) -> Result<Self> {
        let dim = op.dim(f.dim())?;
        if let UnaryOp::ClampInt(low, high) | UnaryOp::DiffClampInt(low, high) = op {
            if low > high {
                return Err(FormulaError::InvalidClamp { low, high });
            }
        }
        // linear operators keep a zero operand zero
        if f.is_zero() && op.preserves_zero() {
            return Formula::zero(dim);
        }
        Ok(Formula::from_parts(FormulaOp::Unary(op), vec![f.clone()], dim))
    }

    /// Elementwise operators cannot fail: the output keeps the operand's dimension.
    fn elementwise(&self, op: UnaryOp) -> Self {
        debug_assert!(op.is_elementwise());
        if self.is_zero() && op == UnaryOp::Minus {
            return self.clone();
        }
        Formula::from_parts(FormulaOp::Unary(op), vec![self.clone()], self.dim())
    }

    pub fn minus(&self) -> Self {
        self.elementwise(UnaryOp::Minus)
    }

    pub fn square(&self) -> Self {
        self.elementwise(UnaryOp::Square)
    }

    /// `x^n`. `n = i32::MIN` is rejected: its derivative exponent `n - 1` overflows.
    pub fn pow(&self, n: i32) -> Result<Self> {
        Formula::unary(UnaryOp::Pow(n), self)
    }

    pub fn inv(&self) -> Self {
        self.elementwise(UnaryOp::Inv)
    }

    pub fn exp(&self) -> Self {
        self.elementwise(UnaryOp::Exp)
    }

    pub fn log(&self) -> Self {
        self.elementwise(UnaryOp::Log)
    }

    pub fn sin(&self) -> Self {
        self.elementwise(UnaryOp::Sin)
    }

    pub fn cos(&self) -> Self {
        self.elementwise(UnaryOp::Cos)
    }

    pub fn sqrt(&self) -> Self {
        self.elementwise(UnaryOp::Sqrt)
    }

    pub fn abs(&self) -> Self {
        self.elementwise(UnaryOp::Abs)
    }

    pub fn sign(&self) -> Self {
        self.elementwise(UnaryOp::Sign)
    }

    /// Sum of all components (dimension 1).
    pub fn sum(&self) -> Self {
        if self.is_zero() {
            return Formula::from_parts(FormulaOp::Zero, vec![], 1);
        }
        Formula::from_parts(FormulaOp::Unary(UnaryOp::Sum), vec![self.clone()], 1)
    }

    /// Replicate a dimension-1 formula over `dim` components.
    pub fn sum_t(&self, dim: usize) -> Result<Self> {
        Formula::unary(UnaryOp::SumT(dim), self)
    }

    /// Clamp each component into `[low, high]`.
    pub fn clamp_int(&self, low: i32, high: i32) -> Result<Self> {
        Formula::unary(UnaryOp::ClampInt(low, high), self)
    }

    /// `1` inside `[low, high]`, `0` outside.
    pub fn diff_clamp_int(&self, low: i32, high: i32) -> Result<Self> {
        Formula::unary(UnaryOp::DiffClampInt(low, high), self)
    }

    /// Component `m` (dimension 1).
    pub fn elem(&self, m: usize) -> Result<Self> {
        Formula::unary(UnaryOp::Elem(m), self)
    }

    /// A dimension-1 formula placed at component `m` of a `dim`-vector of zeros.
    pub fn elem_t(&self, m: usize, dim: usize) -> Result<Self> {
        Formula::unary(UnaryOp::ElemT(m, dim), self)
    }

    /// Components `start..start + len`.
    pub fn extract(&self, start: usize, len: usize) -> Result<Self> {
        Formula::unary(UnaryOp::Extract(start, len), self)
    }

    /// This formula placed at component `start` of a `dim`-vector of zeros.
    pub fn extract_t(&self, start: usize, dim: usize) -> Result<Self> {
        Formula::unary(UnaryOp::ExtractT(start, dim), self)
    }
}

// ============================================================================
// Binary operators
// ============================================================================

impl Formula {
    /// Combine two formulas, checking the operator's broadcasting contract.
    pub fn binary(op: BinaryOp, lhs: &Formula, rhs: &Formula) -> Result<Self> {
        let dim = op.dim(lhs.dim(), rhs.dim())?;

        match op {
            BinaryOp::Add => {
                if lhs.is_zero() {
                    return rhs.broadcast_to(dim);
                }
                if rhs.is_zero() {
                    return lhs.broadcast_to(dim);
                }
            }
            BinaryOp::Subtract => {
                if rhs.is_zero() {
                    return lhs.broadcast_to(dim);
                }
                if lhs.is_zero() {
                    return rhs.minus().broadcast_to(dim);
                }
            }
            BinaryOp::Mult | BinaryOp::Scal | BinaryOp::Scalprod => {
                if lhs.is_zero() || rhs.is_zero() {
                    return Formula::zero(dim);
                }
            }
            BinaryOp::Concat => {
                if lhs.is_zero() && rhs.is_zero() {
                    return Formula::zero(dim);
                }
            }
            // 0 / x is only zero where x != 0; keep it as written
            BinaryOp::Divide => {}
        }

        Ok(Formula::from_parts(
            FormulaOp::Binary(op),
            vec![lhs.clone(), rhs.clone()],
            dim,
        ))
    }

    /// Replicate a dimension-1 formula to `dim`, or return it unchanged if it already fits.
    fn broadcast_to(&self, dim: usize) -> Result<Self> {
        if self.dim() == dim {
            return Ok(self.clone());
        }
        self.sum_t(dim)
    }

    pub fn try_add(&self, rhs: &Formula) -> Result<Self> {
        Formula::binary(BinaryOp::Add, self, rhs)
    }

    pub fn try_sub(&self, rhs: &Formula) -> Result<Self> {
        Formula::binary(BinaryOp::Subtract, self, rhs)
    }

    pub fn try_mul(&self, rhs: &Formula) -> Result<Self> {
        Formula::binary(BinaryOp::Mult, self, rhs)
    }

    pub fn try_div(&self, rhs: &Formula) -> Result<Self> {
        Formula::binary(BinaryOp::Divide, self, rhs)
    }

    /// `self` (dimension 1) times `rhs`.
    pub fn scal(&self, rhs: &Formula) -> Result<Self> {
        Formula::binary(BinaryOp::Scal, self, rhs)
    }

    /// Scalar product with `rhs`.
    pub fn scalprod(&self, rhs: &Formula) -> Result<Self> {
        Formula::binary(BinaryOp::Scalprod, self, rhs)
    }

    /// Components of `self` followed by those of `rhs`.
    pub fn concat(&self, rhs: &Formula) -> Result<Self> {
        Formula::binary(BinaryOp::Concat, self, rhs)
    }
}

// ============================================================================
// Derived formulas
// ============================================================================

impl Formula {
    /// `<F, F>`
    pub fn sqnorm2(&self) -> Result<Self> {
        self.scalprod(self)
    }

    /// `sqrt(<F, F>)`
    pub fn norm2(&self) -> Result<Self> {
        Ok(self.sqnorm2()?.sqrt())
    }

    /// `F / |F|`
    pub fn normalize(&self) -> Result<Self> {
        self.norm2()?.inv().scal(self)
    }

    /// `|X - Y|^2`
    pub fn sqdist(&self, rhs: &Formula) -> Result<Self> {
        self.try_sub(rhs)?.sqnorm2()
    }

    /// `S * <F, F>` for a scalar weight `S`.
    pub fn sqnorm_iso(s: &Formula, f: &Formula) -> Result<Self> {
        require("SqNormIso", s.dim(), 1)?;
        s.try_mul(&f.sqnorm2()?)
    }

    /// `sum(S * F²)` for per-component weights `S`.
    pub fn sqnorm_diag(s: &Formula, f: &Formula) -> Result<Self> {
        if s.dim() != f.dim() {
            return Err(FormulaError::DimensionMismatch {
                op: "SqNormDiag",
                lhs: s.dim(),
                rhs: f.dim(),
            });
        }
        Ok(s.try_mul(&f.square())?.sum())
    }

    /// Weighted squared norm of `F`: isotropic for a scalar `A`, diagonal when
    /// `A` has `F`'s dimension.
    pub fn weighted_sqnorm(a: &Formula, f: &Formula) -> Result<Self> {
        if a.dim() == 1 {
            Formula::sqnorm_iso(a, f)
        } else {
            Formula::sqnorm_diag(a, f)
        }
    }

    /// Weighted squared distance `weighted_sqnorm(A, X - Y)`.
    pub fn weighted_sqdist(a: &Formula, x: &Formula, y: &Formula) -> Result<Self> {
        Formula::weighted_sqnorm(a, &x.try_sub(y)?)
    }

    /// Gaussian radial basis function kernel `exp(-|X - Y|^2) * B`.
    pub fn gaussian_kernel(x: &Formula, y: &Formula, b: &Formula) -> Result<Self> {
        x.sqdist(y)?.minus().exp().try_mul(b)
    }
}
