//! Operator overloading for `Formula`
//!
//! These are sugar over the `try_*` constructors.
//!
//! # Panics
//!
//! Each binary operator panics when the operands violate the operator's
//! dimension contract. Use [`Formula::try_add`] and friends to get the error
//! as a value instead.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::formula::Formula;

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $try_method:ident) => {
        impl $trait<&Formula> for &Formula {
            type Output = Formula;

            fn $method(self, rhs: &Formula) -> Formula {
                match self.$try_method(rhs) {
                    Ok(f) => f,
                    Err(e) => panic!("{e}"),
                }
            }
        }

        impl $trait<Formula> for Formula {
            type Output = Formula;

            fn $method(self, rhs: Formula) -> Formula {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&Formula> for Formula {
            type Output = Formula;

            fn $method(self, rhs: &Formula) -> Formula {
                (&self).$method(rhs)
            }
        }

        impl $trait<Formula> for &Formula {
            type Output = Formula;

            fn $method(self, rhs: Formula) -> Formula {
                self.$method(&rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, try_add);
impl_binary_op!(Sub, sub, try_sub);
impl_binary_op!(Mul, mul, try_mul);
impl_binary_op!(Div, div, try_div);

impl Neg for &Formula {
    type Output = Formula;

    fn neg(self) -> Formula {
        self.minus()
    }
}

impl Neg for Formula {
    type Output = Formula;

    fn neg(self) -> Formula {
        self.minus()
    }
}
