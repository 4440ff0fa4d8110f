//! Differentiation context
//!
//! This module provides the `Differentiator`, which owns the configuration and
//! the caches used while a gradient formula is being synthesised.

use log::{debug, trace};
use rustc_hash::FxHashMap;

use crate::config::GradConfig;
use crate::error::{FormulaError, Result};
use crate::formula::{Formula, FormulaOp, NodeKey, Var};

use super::rules;

// ============================================================================
// Differentiator
// ============================================================================

/// Stateful differentiation engine.
///
/// # How it works
///
/// 1. `diff(f, v, g)` checks that the upstream gradient `g` has `f`'s dimension
/// 2. Subtrees that never read `v` yield the zero formula directly (when pruning)
/// 3. Otherwise the node's derivative rule is applied, recursing into the operands
///    with the upstream gradients the rule derives from `g`
/// 4. Results are cached per (node, gradient, variable), so a sub-formula reached
///    twice with the same gradient is differentiated once and stays shared
///
/// Recursion follows the structure of `f`, so a formula deeper than
/// [`GradConfig::max_depth`] is rejected with `DepthExceeded` before any rule runs.
///
/// Cache entries hold clones of their key formulas, which keeps the
/// allocations (and therefore the pointer keys) alive for the lifetime of the
/// `Differentiator`.
pub struct Differentiator {
    config: GradConfig,
    results: FxHashMap<(NodeKey, NodeKey, Var), CachedGrad>,
    dependencies: FxHashMap<(NodeKey, usize), (Formula, bool)>,
    depth: usize,
}

struct CachedGrad {
    _node: Formula,
    _grad: Formula,
    result: Formula,
}

impl Default for Differentiator {
    fn default() -> Self {
        Self::new(GradConfig::default())
    }
}

impl Differentiator {
    pub fn new(config: GradConfig) -> Self {
        Self {
            config,
            results: FxHashMap::default(),
            dependencies: FxHashMap::default(),
            depth: 0,
        }
    }

    /// Create a differentiator configured from the environment.
    pub fn from_env() -> Self {
        Self::new(GradConfig::from_env())
    }

    pub fn config(&self) -> &GradConfig {
        &self.config
    }

    /// Number of cached (node, gradient) results.
    pub fn num_cached(&self) -> usize {
        self.results.len()
    }

    /// Gradient of `f` with respect to `v`, chain-composed with upstream gradient `g`.
    ///
    /// `g` must have `f`'s dimension; the result has `v`'s dimension.
    pub fn grad(&mut self, f: &Formula, v: &Var, g: &Formula) -> Result<Formula> {
        debug!("grad of {} w.r.t. {v}", f.op().name());
        if f.depth() >= self.config.max_depth {
            return Err(FormulaError::DepthExceeded(self.config.max_depth));
        }
        let result = self.diff(f, v, g)?;
        debug!(
            "grad w.r.t. {v} done: {} nodes, depth {}",
            result.node_count(),
            result.depth()
        );
        Ok(result)
    }

    /// Recursive step, called by the derivative rules on operands.
    ///
    /// Only the depth bookkeeping stays in this frame; checks, cache lookups
    /// and logging live in helpers that return before recursing.
    pub(crate) fn diff(&mut self, f: &Formula, v: &Var, g: &Formula) -> Result<Formula> {
        if let Some(done) = self.resolve(f, v, g)? {
            return Ok(done);
        }

        if self.depth >= self.config.max_depth {
            return Err(FormulaError::DepthExceeded(self.config.max_depth));
        }
        self.depth += 1;
        let result = self.apply_rule(f, v, g);
        self.depth -= 1;

        let result = result?;
        self.store(f, v, g, &result);
        Ok(result)
    }

    /// Answer `diff` without applying a rule: zero for pruned subtrees, or a cached result.
    fn resolve(&mut self, f: &Formula, v: &Var, g: &Formula) -> Result<Option<Formula>> {
        if g.dim() != f.dim() {
            return Err(FormulaError::GradientDimension {
                expected: f.dim(),
                found: g.dim(),
            });
        }

        if self.config.prune && !self.depends_on(f, v) {
            trace!("{} does not read {v}, gradient is zero", f.op().name());
            return Formula::zero(v.dim).map(Some);
        }

        if self.config.memoize {
            if let Some(cached) = self.results.get(&(f.key(), g.key(), *v)) {
                trace!("cache hit for {}", f.op().name());
                return Ok(Some(cached.result.clone()));
            }
        }
        Ok(None)
    }

    fn store(&mut self, f: &Formula, v: &Var, g: &Formula, result: &Formula) {
        debug_assert_eq!(result.dim(), v.dim, "gradient must have the variable's dimension");
        trace!("d{}/d{v} -> {}", f.op().name(), result.op().name());

        if self.config.memoize {
            self.results.insert(
                (f.key(), g.key(), *v),
                CachedGrad {
                    _node: f.clone(),
                    _grad: g.clone(),
                    result: result.clone(),
                },
            );
        }
    }

    fn apply_rule(&mut self, f: &Formula, v: &Var, g: &Formula) -> Result<Formula> {
        match f.op() {
            FormulaOp::Var(w) => rules::var_vjp(w, v, g),
            FormulaOp::Zero | FormulaOp::Cst(_) | FormulaOp::IntCst(_) => Formula::zero(v.dim),
            FormulaOp::Unary(op) => rules::unary_vjp(self, *op, &f.sources()[0], v, g),
            FormulaOp::Binary(op) => {
                let src = f.sources();
                rules::binary_vjp(self, *op, &src[0], &src[1], v, g)
            }
        }
    }

    /// Whether `f` reads the slot of `v`, cached per node.
    ///
    /// Walks the tree with an explicit stack: a node is resolved once all of
    /// its sources are.
    fn depends_on(&mut self, f: &Formula, v: &Var) -> bool {
        let mut stack = vec![(f.clone(), false)];
        while let Some((node, expanded)) = stack.pop() {
            let key = (node.key(), v.index);
            if self.dependencies.contains_key(&key) {
                continue;
            }
            let found = if let Some(w) = node.as_var() {
                w.is_same(v)
            } else if expanded {
                node.sources().iter().any(|src| self.cached_dependency(src, v))
            } else {
                let sources: Vec<Formula> = node.sources().to_vec();
                stack.push((node, true));
                stack.extend(sources.into_iter().map(|src| (src, false)));
                continue;
            };
            self.dependencies.insert(key, (node, found));
        }
        self.cached_dependency(f, v)
    }

    fn cached_dependency(&self, f: &Formula, v: &Var) -> bool {
        self.dependencies
            .get(&(f.key(), v.index))
            .is_some_and(|(_, found)| *found)
    }
}
