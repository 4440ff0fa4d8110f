mod common;

use common::{eval_at, init_logger, sample_point, vec_approx_eq, Leaves};
use keform::config::DEFAULT_MAX_DEPTH;
use keform::{
    grad, grads, Differentiable, Differentiator, Formula, FormulaError, GradConfig, Var,
};
use rstest::rstest;

// ============================================================================
// Forward correctness
// ============================================================================

#[test]
fn test_square_forward() {
    let x = Formula::var(Var::vi(0, 1).unwrap());
    assert_eq!(x.square().eval(&[&[3.0]]).unwrap(), vec![9.0]);
}

#[test]
fn test_square_forward_matches_operand() {
    let l = Leaves::new();
    let f = (&l.x - &l.y).sin();
    let point = sample_point();

    let base = eval_at(&f, &point);
    let squared = eval_at(&f.square(), &point);
    let expected: Vec<f64> = base.iter().map(|v| v * v).collect();
    assert!(vec_approx_eq(&squared, &expected));
}

// ============================================================================
// Chain rule (Square)
// ============================================================================

/// Operands whose Jacobian w.r.t. the target is diagonal or whose output is
/// scalar, so that `∂(F²)·g = 2F ⊙ ∂F·g` holds componentwise.
#[rstest]
#[case::identity(|l: &Leaves| l.x.clone(), 0)]
#[case::elementwise(|l: &Leaves| (&l.x * &l.y).exp(), 0)]
#[case::difference(|l: &Leaves| &l.x - &l.y, 1)]
#[case::scalar_of_vector(|l: &Leaves| l.x.sqdist(&l.y).unwrap(), 0)]
#[case::scalar_param(|l: &Leaves| l.p.sin(), 3)]
fn test_square_chain_rule(#[case] build: fn(&Leaves) -> Formula, #[case] wrt: usize) {
    init_logger();
    let l = Leaves::new();
    let f = build(&l);
    let v = l.vars[wrt];

    // seed: a parameter slot holding g
    let seed_var = Var::pm(4, f.dim()).unwrap();
    let g = Formula::var(seed_var);
    let mut point = sample_point();
    point.push((0..f.dim()).map(|k| 0.5 + k as f64).collect());

    let lhs = eval_at(&grad(&f.square(), &v, &g).unwrap(), &point);
    let df = eval_at(&grad(&f, &v, &g).unwrap(), &point);
    let fx = eval_at(&f, &point);

    let rhs: Vec<f64> = if fx.len() == 1 {
        df.iter().map(|d| 2.0 * fx[0] * d).collect()
    } else {
        df.iter().zip(&fx).map(|(d, f)| 2.0 * f * d).collect()
    };
    assert!(vec_approx_eq(&lhs, &rhs), "{lhs:?} vs {rhs:?}");
}

// ============================================================================
// Zero-gradient law
// ============================================================================

#[rstest]
#[case::other_variable(|l: &Leaves| l.y.exp())]
#[case::constant(|_: &Leaves| Formula::cst(2.5, 3).unwrap())]
#[case::int_constant(|_: &Leaves| Formula::int_cst(4))]
#[case::composite(|l: &Leaves| (&l.y * &l.y).sum().scal(&l.b).unwrap())]
#[case::kernel_without_x(|l: &Leaves| Formula::gaussian_kernel(&l.y, &l.y, &l.b).unwrap())]
fn test_zero_gradient_law(#[case] build: fn(&Leaves) -> Formula) {
    let l = Leaves::new();
    let f = build(&l);
    let x = l.vars[0];

    for seed in [0.0, 1.0, -3.5] {
        let g = Formula::cst(seed, f.dim()).unwrap();
        let df = f.grad(&x, &g).unwrap();
        assert_eq!(df.dim(), x.dim);
        assert!(df.is_zero());
        assert_eq!(eval_at(&df, &sample_point()), vec![0.0; 3]);
    }
}

// ============================================================================
// Identity gradient law
// ============================================================================

#[rstest]
#[case(Var::vi(0, 1).unwrap())]
#[case(Var::vj(2, 4).unwrap())]
#[case(Var::pm(7, 2).unwrap())]
fn test_identity_gradient_law(#[case] v: Var) {
    let g = Formula::var(Var::pm(10, v.dim).unwrap()).exp();
    let df = Formula::var(v).grad(&v, &g).unwrap();
    assert_eq!(df, g);
}

// ============================================================================
// Linearity
// ============================================================================

#[rstest]
#[case(|l: &Leaves| l.x.square(), |l: &Leaves| (&l.x * &l.y).sin())]
#[case(|l: &Leaves| l.x.exp(), |l: &Leaves| l.y.clone())]
#[case(|l: &Leaves| l.p.scal(&l.x).unwrap(), |l: &Leaves| l.x.pow(3).unwrap())]
fn test_linearity(#[case] build_f: fn(&Leaves) -> Formula, #[case] build_h: fn(&Leaves) -> Formula) {
    let l = Leaves::new();
    let (f, h) = (build_f(&l), build_h(&l));
    let x = l.vars[0];
    let g = Formula::cst(0.75, 3).unwrap();
    let point = sample_point();

    let sum = eval_at(&(&f + &h).grad(&x, &g).unwrap(), &point);
    let df = eval_at(&f.grad(&x, &g).unwrap(), &point);
    let dh = eval_at(&h.grad(&x, &g).unwrap(), &point);
    let expected: Vec<f64> = df.iter().zip(&dh).map(|(a, b)| a + b).collect();
    assert!(vec_approx_eq(&sum, &expected));
}

// ============================================================================
// Higher order
// ============================================================================

#[rstest]
#[case(-2.0)]
#[case(0.0)]
#[case(5.0)]
fn test_second_derivative_of_square(#[case] x0: f64) {
    let x = Var::vi(0, 1).unwrap();
    let f = Formula::var(x).square();

    let df = f.grad_unit(&x).unwrap();
    assert_eq!(df.eval(&[&[x0]]).unwrap(), vec![2.0 * x0]);

    let ddf = df.grad_unit(&x).unwrap();
    assert_eq!(ddf.eval(&[&[x0]]).unwrap(), vec![2.0]);
}

#[rstest]
#[case(-1.5)]
#[case(0.5)]
#[case(2.0)]
fn test_third_derivative_of_cube(#[case] x0: f64) {
    let x = Var::vi(0, 1).unwrap();
    let f = Formula::var(x).pow(3).unwrap();

    let d1 = f.grad_unit(&x).unwrap();
    let d2 = d1.grad_unit(&x).unwrap();
    let d3 = d2.grad_unit(&x).unwrap();

    assert!(vec_approx_eq(&d1.eval(&[&[x0]]).unwrap(), &[3.0 * x0 * x0]));
    assert!(vec_approx_eq(&d2.eval(&[&[x0]]).unwrap(), &[6.0 * x0]));
    assert!(vec_approx_eq(&d3.eval(&[&[x0]]).unwrap(), &[6.0]));
}

#[test]
fn test_gradient_is_differentiable_wrt_other_variable() {
    // ∂²(x*y)/∂x∂y = 1
    let l = Leaves::new();
    let (x, y) = (l.vars[0], l.vars[1]);
    let f = (&l.x * &l.y).sum();

    let dx = f.grad_unit(&x).unwrap();
    let g = Formula::cst(1.0, 3).unwrap();
    let dxy = dx.grad(&y, &g).unwrap();
    assert_eq!(eval_at(&dxy, &sample_point()), vec![1.0; 3]);
}

// ============================================================================
// Targets sharing a slot
// ============================================================================

#[test]
fn test_grads_rejects_conflicting_declarations() {
    let f = Formula::var(Var::vi(0, 2).unwrap()).exp();
    let g = Formula::cst(1.0, 2).unwrap();
    let narrow = Var::vi(0, 2).unwrap();
    let wide = Var::vi(0, 3).unwrap();

    assert!(matches!(
        grads(&f, &[&narrow, &wide], &g),
        Err(FormulaError::VariableConflict { index: 0, .. })
    ));

    // a matching declaration after a conflicting one still succeeds
    let mut d = Differentiator::default();
    assert!(d.grad(&f, &wide, &g).is_err());
    assert_eq!(d.grad(&f, &narrow, &g).unwrap().dim(), 2);
}

// ============================================================================
// Exponent range
// ============================================================================

#[rstest]
#[case(i32::MIN + 2)]
#[case(i32::MAX)]
fn test_extreme_exponents_differentiate(#[case] n: i32) {
    let x = Var::vi(0, 1).unwrap();
    let f = Formula::var(x).pow(n).unwrap();
    let df = f.grad_unit(&x).unwrap();
    assert_eq!(df.dim(), 1);
    assert!(df.identifier().starts_with(&format!("Scal(IntCst({n}),")));
}

#[test]
fn test_min_exponent_rejected() {
    let x = Var::vi(0, 1).unwrap();
    let fx = Formula::var(x);
    assert_eq!(
        fx.pow(i32::MIN).unwrap_err(),
        FormulaError::InvalidExponent(i32::MIN)
    );

    // its derivative would need the rejected exponent
    let f = fx.pow(i32::MIN + 1).unwrap();
    assert_eq!(
        f.grad_unit(&x).unwrap_err(),
        FormulaError::InvalidExponent(i32::MIN)
    );
}

// ============================================================================
// Recursion depth
// ============================================================================

fn sin_chain(v: Var, depth: usize) -> Formula {
    let mut f = Formula::var(v);
    for _ in 0..depth {
        f = f.sin();
    }
    f
}

#[rstest]
#[case::pruned(true)]
#[case::unpruned(false)]
fn test_deep_formula_reports_depth_exceeded(#[case] prune: bool) {
    init_logger();
    let x = Var::vi(0, 1).unwrap();
    let f = sin_chain(x, 8_000);
    let g = Formula::cst(1.0, 1).unwrap();

    let mut d = Differentiator::new(GradConfig::builder().prune(prune).build());
    assert_eq!(
        d.grad(&f, &x, &g).unwrap_err(),
        FormulaError::DepthExceeded(DEFAULT_MAX_DEPTH)
    );
    assert_eq!(
        Differentiator::default().grad(&f, &x, &g).unwrap_err(),
        FormulaError::DepthExceeded(DEFAULT_MAX_DEPTH)
    );
}

#[test]
fn test_formula_just_under_depth_limit() {
    let x = Var::vi(0, 1).unwrap();
    let n = DEFAULT_MAX_DEPTH - 1;
    let f = sin_chain(x, n);
    let g = Formula::cst(1.0, 1).unwrap();

    let df = Differentiator::default().grad(&f, &x, &g).unwrap();
    assert_eq!(df.dim(), 1);

    // d/dx sin(sin(...(x))) is the product of cos over the inner values
    let x0 = 0.7;
    let (mut value, mut expected) = (x0, 1.0);
    for _ in 0..n {
        expected *= f64::cos(value);
        value = value.sin();
    }
    let got = df.eval(&[&[x0]]).unwrap();
    assert!((got[0] - expected).abs() < 1e-9, "{} vs {expected}", got[0]);
}
