//! VJP (Vector-Jacobian Product) rules for automatic differentiation
//!
//! This module defines the derivative rule of each operator. Every rule is
//! written only in terms of the operands' own gradients (through
//! [`Differentiator::diff`]) and ordinary formula composition, so its result
//! is exact and can be differentiated again.
//!
//! The upstream gradient handed to each operand is built by a separate,
//! non-recursive function, which keeps the frames on the recursion path small.

use crate::error::{FormulaError, Result};
use crate::formula::{BinaryOp, Formula, UnaryOp, Var};

use super::context::Differentiator;

// ============================================================================
// Leaves
// ============================================================================

/// `Var(i)`: the upstream gradient if `i` is the target, zero otherwise.
pub(crate) fn var_vjp(leaf: &Var, v: &Var, g: &Formula) -> Result<Formula> {
    if !leaf.is_same(v) {
        return Formula::zero(v.dim);
    }
    if leaf.dim != v.dim || leaf.cat != v.cat {
        return Err(FormulaError::VariableConflict {
            index: v.index,
            first: leaf.to_string(),
            second: v.to_string(),
        });
    }
    Ok(g.clone())
}

// ============================================================================
// Unary VJP
// ============================================================================

/// Gradient passed down to the operand, and an integer factor applied to the
/// operand's result.
struct Upstream {
    grad: Formula,
    factor: Option<i32>,
}

impl Upstream {
    fn plain(grad: Formula) -> Option<Self> {
        Some(Self { grad, factor: None })
    }

    fn scaled(grad: Formula, n: i32) -> Option<Self> {
        Some(Self {
            grad,
            factor: Some(n),
        })
    }
}

/// Gradient of `op(f)` with respect to `v`, given upstream gradient `g`.
pub(crate) fn unary_vjp(
    d: &mut Differentiator,
    op: UnaryOp,
    f: &Formula,
    v: &Var,
    g: &Formula,
) -> Result<Formula> {
    let Some(upstream) = unary_upstream(op, f, g)? else {
        return Formula::zero(v.dim);
    };
    let df = d.diff(f, v, &upstream.grad)?;
    match upstream.factor {
        Some(n) => Formula::int_cst(n).scal(&df),
        None => Ok(df),
    }
}

/// `None` for operators whose derivative vanishes.
fn unary_upstream(op: UnaryOp, f: &Formula, g: &Formula) -> Result<Option<Upstream>> {
    let grad = match op {
        // -x: ∂f = -g
        UnaryOp::Minus => g.minus(),

        // x²: 2 * ∂f(f * g)
        UnaryOp::Square => return Ok(Upstream::scaled(f.try_mul(g)?, 2)),

        // x⁰ is constant
        UnaryOp::Pow(0) => return Ok(None),

        // xⁿ: n * ∂f(f^(n-1) * g)
        UnaryOp::Pow(n) => {
            let m = n.checked_sub(1).ok_or(FormulaError::InvalidExponent(n))?;
            return Ok(Upstream::scaled(f.pow(m)?.try_mul(g)?, n));
        }

        // 1/x: ∂f = -(1/x)² * g
        UnaryOp::Inv => f.inv().square().try_mul(g)?.minus(),

        // exp(x): ∂f = exp(x) * g
        UnaryOp::Exp => f.exp().try_mul(g)?,

        // log(x): ∂f = g / x
        UnaryOp::Log => g.try_div(f)?,

        // sin(x): ∂f = cos(x) * g
        UnaryOp::Sin => f.cos().try_mul(g)?,

        // cos(x): ∂f = -sin(x) * g
        UnaryOp::Cos => f.sin().try_mul(g)?.minus(),

        // sqrt(x): ∂f = g / (2 * sqrt(x))
        UnaryOp::Sqrt => g.try_div(&Formula::int_cst(2).scal(&f.sqrt())?)?,

        // |x|: ∂f = sign(x) * g
        UnaryOp::Abs => f.sign().try_mul(g)?,

        // piecewise constant
        UnaryOp::Sign | UnaryOp::DiffClampInt(..) => return Ok(None),

        // sum(x): ∂f = g replicated over f's components
        UnaryOp::Sum => g.sum_t(f.dim())?,

        // sumT(x): ∂f = sum(g)
        UnaryOp::SumT(_) => g.sum(),

        // clamp(x, a, b): ∂f = [a <= x <= b] * g
        UnaryOp::ClampInt(low, high) => f.diff_clamp_int(low, high)?.try_mul(g)?,

        // selections and their adjoints swap roles
        UnaryOp::Elem(m) => g.elem_t(m, f.dim())?,
        UnaryOp::ElemT(m, _) => g.elem(m)?,
        UnaryOp::Extract(start, _) => g.extract_t(start, f.dim())?,
        UnaryOp::ExtractT(start, _) => g.extract(start, f.dim())?,
    };
    Ok(Upstream::plain(grad))
}

// ============================================================================
// Binary VJP
// ============================================================================

/// Gradient of `op(f, h)` with respect to `v`, given upstream gradient `g`.
///
/// Each operand is differentiated with its own upstream gradient and the two
/// contributions are summed.
pub(crate) fn binary_vjp(
    d: &mut Differentiator,
    op: BinaryOp,
    f: &Formula,
    h: &Formula,
    v: &Var,
    g: &Formula,
) -> Result<Formula> {
    let (grad_f, grad_h) = binary_upstream(op, f, h, g)?;
    let df = d.diff(f, v, &grad_f)?;
    let dh = d.diff(h, v, &grad_h)?;
    df.try_add(&dh)
}

fn binary_upstream(
    op: BinaryOp,
    f: &Formula,
    h: &Formula,
    g: &Formula,
) -> Result<(Formula, Formula)> {
    let grads = match op {
        // add(a, b): ∂a = g, ∂b = g
        BinaryOp::Add => (reduce_to(g, f.dim()), reduce_to(g, h.dim())),

        // sub(a, b): ∂a = g, ∂b = -g
        BinaryOp::Subtract => (reduce_to(g, f.dim()), reduce_to(&g.minus(), h.dim())),

        // mul(a, b): ∂a = b * g, ∂b = a * g
        BinaryOp::Mult => (contract(h, g, f.dim())?, contract(f, g, h.dim())?),

        // div(a, b): ∂a = g / b, ∂b = -(a / b²) * g
        BinaryOp::Divide => {
            let grad_f = reduce_to(&g.try_div(h)?, f.dim());
            let grad_h = f.try_div(&h.square())?.try_mul(g)?.minus();
            (grad_f, reduce_to(&grad_h, h.dim()))
        }

        // scal(s, b): ∂s = sum(b * g), ∂b = s * g
        BinaryOp::Scal => (h.try_mul(g)?.sum(), f.scal(g)?),

        // <a, b>: ∂a = g * b, ∂b = g * a
        BinaryOp::Scalprod => (g.scal(h)?, g.scal(f)?),

        // concat(a, b): each operand receives its own slice of g
        BinaryOp::Concat => (g.extract(0, f.dim())?, g.extract(f.dim(), h.dim())?),
    };
    Ok(grads)
}

/// Contract a broadcast gradient back onto a dimension-1 operand.
fn reduce_to(grad: &Formula, dim: usize) -> Formula {
    if grad.dim() == dim {
        grad.clone()
    } else {
        grad.sum()
    }
}

/// `other * g`, contracted with a scalar product when the operand was broadcast.
fn contract(other: &Formula, g: &Formula, dim: usize) -> Result<Formula> {
    if g.dim() == dim {
        other.try_mul(g)
    } else {
        g.scalprod(other)
    }
}
