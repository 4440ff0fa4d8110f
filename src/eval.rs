//! Forward evaluation
//!
//! [`Formula::operation`] is the per-node data-plane contract: given the
//! already evaluated operand buffers it writes the node's own output. Every
//! output component is computed independently, so an execution engine may
//! evaluate components and points in parallel.
//!
//! [`Evaluator`] is a reference single-point interpreter built on top of it.
//! It is meant for diagnostics and tests, not for dense evaluation.

use log::trace;
use num_traits::Float;
use rustc_hash::FxHashMap;

use crate::error::{FormulaError, Result};
use crate::formula::{int_to_float, Formula, FormulaOp, NodeKey};

// ============================================================================
// Per-node operation
// ============================================================================

impl Formula {
    /// Write this node's output into `out` (length `dim()`).
    ///
    /// `operands` holds the outputs of [`Formula::sources`] in order. For a
    /// `Var` leaf it holds the single bound input value instead; other leaves
    /// take no operands.
    pub fn operation<T: Float>(&self, out: &mut [T], operands: &[&[T]]) {
        debug_assert_eq!(out.len(), self.dim());
        match self.op() {
            FormulaOp::Var(_) => out.copy_from_slice(operands[0]),
            FormulaOp::Zero => out.fill(T::zero()),
            FormulaOp::Cst(c) => out.fill(num_traits::cast::<f64, T>(*c).unwrap_or_else(T::nan)),
            FormulaOp::IntCst(n) => out.fill(int_to_float(*n)),
            FormulaOp::Unary(op) => op.apply(out, operands[0]),
            FormulaOp::Binary(op) => op.apply(out, operands[0], operands[1]),
        }
    }
}

// ============================================================================
// Input bindings
// ============================================================================

/// Values bound to variable slots for one evaluation point.
#[derive(Debug, Clone)]
pub struct Bindings<'a, T> {
    slots: FxHashMap<usize, &'a [T]>,
}

impl<T> Default for Bindings<'_, T> {
    fn default() -> Self {
        Self {
            slots: FxHashMap::default(),
        }
    }
}

impl<'a, T> Bindings<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind slot `i` to `inputs[i]`.
    pub fn from_slices(inputs: &[&'a [T]]) -> Self {
        let slots = inputs.iter().copied().enumerate().collect();
        Self { slots }
    }

    /// Bind `value` to variable slot `index`.
    pub fn bind(mut self, index: usize, value: &'a [T]) -> Self {
        self.slots.insert(index, value);
        self
    }

    pub fn get(&self, index: usize) -> Option<&'a [T]> {
        self.slots.get(&index).copied()
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Single-point evaluator with per-node memoisation.
///
/// Shared sub-formulas (the same allocation reached twice) are evaluated once.
pub struct Evaluator<'a, T> {
    bindings: Bindings<'a, T>,
    cache: FxHashMap<NodeKey, (Formula, Vec<T>)>,
}

impl<'a, T: Float> Evaluator<'a, T> {
    pub fn new(bindings: Bindings<'a, T>) -> Self {
        Self {
            bindings,
            cache: FxHashMap::default(),
        }
    }

    /// Evaluate `formula` at the bound point.
    ///
    /// Bindings are checked against every variable of the formula before any
    /// node is evaluated.
    pub fn evaluate(&mut self, formula: &Formula) -> Result<Vec<T>> {
        for v in formula.variables() {
            let value = self
                .bindings
                .get(v.index)
                .ok_or(FormulaError::MissingInput { index: v.index })?;
            if value.len() != v.dim {
                return Err(FormulaError::InputLength {
                    index: v.index,
                    expected: v.dim,
                    found: value.len(),
                });
            }
        }
        self.eval_node(formula)
    }

    fn eval_node(&mut self, node: &Formula) -> Result<Vec<T>> {
        if let Some((_, value)) = self.cache.get(&node.key()) {
            return Ok(value.clone());
        }

        let mut out = vec![T::zero(); node.dim()];
        match node.op() {
            FormulaOp::Var(v) => {
                let input = self
                    .bindings
                    .get(v.index)
                    .ok_or(FormulaError::MissingInput { index: v.index })?;
                if input.len() != v.dim {
                    return Err(FormulaError::InputLength {
                        index: v.index,
                        expected: v.dim,
                        found: input.len(),
                    });
                }
                node.operation(&mut out, &[input]);
            }
            _ => {
                let operands = node
                    .sources()
                    .iter()
                    .map(|src| self.eval_node(src))
                    .collect::<Result<Vec<_>>>()?;
                let views: Vec<&[T]> = operands.iter().map(Vec::as_slice).collect();
                node.operation(&mut out, &views);
            }
        }

        trace!("eval {} -> {} components", node.op().name(), out.len());
        self.cache.insert(node.key(), (node.clone(), out.clone()));
        Ok(out)
    }
}

impl Formula {
    /// Evaluate at one point, binding variable slot `i` to `inputs[i]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use keform::{Formula, Var};
    ///
    /// let x = Formula::var(Var::vi(0, 1).unwrap());
    /// assert_eq!(x.square().eval(&[&[3.0]]).unwrap(), vec![9.0]);
    /// ```
    pub fn eval<T: Float>(&self, inputs: &[&[T]]) -> Result<Vec<T>> {
        Evaluator::new(Bindings::from_slices(inputs)).evaluate(self)
    }
}
