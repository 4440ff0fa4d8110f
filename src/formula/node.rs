use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::formula::{FormulaOp, Var};

/// Identity of a node allocation, used as a cache key.
pub type NodeKey = *const FormulaInner;

/// The data held by a single formula node.
#[derive(Debug)]
pub struct FormulaInner {
    pub(crate) op: FormulaOp,
    pub(crate) src: Vec<Formula>,
    pub(crate) dim: usize,
    pub(crate) depth: usize,
}

// Deep chains would otherwise be freed recursively, one stack frame per level.
impl Drop for FormulaInner {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.src);
        while let Some(Formula(node)) = stack.pop() {
            if let Some(mut inner) = Arc::into_inner(node) {
                stack.append(&mut inner.src);
            }
        }
    }
}

/// An immutable formula tree.
///
/// Cloning is cheap: sub-formulas are reference counted and shared, never
/// mutated. Equality and hashing are structural, so two independently built
/// trees with the same shape compare equal.
///
/// # Examples
///
/// ```
/// use keform::{Formula, Var};
///
/// let x = Formula::var(Var::vi(0, 3).unwrap());
/// let y = Formula::var(Var::vj(1, 3).unwrap());
/// let d = (&x - &y).square();
///
/// assert_eq!(d.dim(), 3);
/// assert_eq!(d.identifier(), "Sq(Subtract(Var(0,3,0),Var(1,3,1)))");
/// ```
#[derive(Clone)]
pub struct Formula(pub(crate) Arc<FormulaInner>);

impl Formula {
    /// Wrap an already validated node. Callers check dimensions beforehand.
    pub(crate) fn from_parts(op: FormulaOp, src: Vec<Formula>, dim: usize) -> Self {
        let depth = src.iter().map(|s| s.depth() + 1).max().unwrap_or(0);
        Formula(Arc::new(FormulaInner {
            op,
            src,
            dim,
            depth,
        }))
    }

    pub fn op(&self) -> &FormulaOp {
        &self.0.op
    }

    /// Operand sub-formulas: none for leaves, one or two for composites.
    pub fn sources(&self) -> &[Formula] {
        &self.0.src
    }

    /// Static output dimension.
    pub fn dim(&self) -> usize {
        self.0.dim
    }

    /// Length of the longest path to a leaf.
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.0.op.is_leaf()
    }

    /// Whether this is the zero formula.
    pub fn is_zero(&self) -> bool {
        matches!(self.0.op, FormulaOp::Zero)
    }

    /// The variable read by this node, if it is a variable leaf.
    pub fn as_var(&self) -> Option<&Var> {
        match &self.0.op {
            FormulaOp::Var(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn key(&self) -> NodeKey {
        Arc::as_ptr(&self.0)
    }

    /// Canonical structural string of this formula.
    pub fn identifier(&self) -> String {
        self.to_string()
    }

    /// Number of distinct node allocations reachable from this formula.
    pub fn node_count(&self) -> usize {
        let mut seen = FxHashSet::default();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if seen.insert(node.key()) {
                stack.extend(node.sources());
            }
        }
        seen.len()
    }

    /// Distinct variables read by this formula, ordered by index.
    ///
    /// When the same index appears with different declarations, the first one
    /// found is reported.
    pub fn variables(&self) -> Vec<Var> {
        let mut found: FxHashMap<usize, Var> = FxHashMap::default();
        let mut seen = FxHashSet::default();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if !seen.insert(node.key()) {
                continue;
            }
            if let Some(v) = node.as_var() {
                found.entry(v.index).or_insert(*v);
            }
            stack.extend(node.sources());
        }
        let mut vars: Vec<Var> = found.into_values().collect();
        vars.sort_by_key(|v| v.index);
        vars
    }

    /// Whether a leaf reading the same slot as `v` appears in this formula.
    pub fn contains_var(&self, v: &Var) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if !seen.insert(node.key()) {
                continue;
            }
            if node.as_var().is_some_and(|w| w.is_same(v)) {
                return true;
            }
            stack.extend(node.sources());
        }
        false
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.op {
            FormulaOp::Var(v) => write!(f, "{v}"),
            FormulaOp::Zero => write!(f, "Zero({})", self.dim()),
            FormulaOp::Cst(c) => write!(f, "Cst({c:?},{})", self.dim()),
            FormulaOp::IntCst(n) => write!(f, "IntCst({n})"),
            FormulaOp::Unary(op) => {
                write!(f, "{}({}", op.name(), self.0.src[0])?;
                op.fmt_params(f)?;
                write!(f, ")")
            }
            FormulaOp::Binary(op) => {
                write!(f, "{}({},{})", op.name(), self.0.src[0], self.0.src[1])
            }
        }
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formula")
            .field("op", &self.0.op)
            .field("src", &self.0.src)
            .field("dim", &self.0.dim)
            .finish()
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.dim == other.0.dim && self.0.op == other.0.op && self.0.src == other.0.src)
    }
}

impl Eq for Formula {}

impl Hash for Formula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.op.hash(state);
        self.0.dim.hash(state);
        self.0.src.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::VarCategory;
    use std::collections::HashSet;

    fn x() -> Formula {
        Formula::var(Var::vi(0, 2).unwrap())
    }

    fn y() -> Formula {
        Formula::var(Var::vj(1, 2).unwrap())
    }

    #[test]
    fn test_structural_equality() {
        let a = &x() * &y();
        let b = &x() * &y();
        let c = &y() * &x();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Formula> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_identifier() {
        let f = (&x() + &y()).exp().sum();
        assert_eq!(f.identifier(), "Sum(Exp(Add(Var(0,2,0),Var(1,2,1))))");
        assert_eq!(f.dim(), 1);
        assert_eq!(Formula::int_cst(2).identifier(), "IntCst(2)");
        assert_eq!(Formula::zero(3).unwrap().identifier(), "Zero(3)");
        assert_eq!(Formula::cst(0.5, 2).unwrap().identifier(), "Cst(0.5,2)");
        assert_eq!(x().pow(3).unwrap().identifier(), "Pow(Var(0,2,0),3)");
    }

    #[test]
    fn test_depth_and_node_count() {
        let a = x();
        let sq = a.square();
        let f = &sq + &sq;
        assert_eq!(a.depth(), 0);
        assert_eq!(f.depth(), 2);
        // shared `sq` is counted once
        assert_eq!(f.node_count(), 3);
    }

    #[test]
    fn test_variables_and_contains() {
        let p = Formula::var(Var::pm(5, 1).unwrap());
        let f = p.scal(&(&y() * &x())).unwrap();
        let vars = f.variables();
        assert_eq!(
            vars.iter().map(|v| v.index).collect::<Vec<_>>(),
            vec![0, 1, 5]
        );
        assert_eq!(vars[2].cat, VarCategory::Param);
        assert!(f.contains_var(&Var::vi(1, 2).unwrap()));
        assert!(!f.contains_var(&Var::vi(2, 2).unwrap()));
    }

    #[test]
    fn test_drop_deep_chain() {
        let mut f = x();
        for _ in 0..200_000 {
            f = f.sin();
        }
        assert_eq!(f.depth(), 200_000);
        drop(f);
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Formula>();
    }
}
