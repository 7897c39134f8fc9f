//! The canonical form behind [`normalize`]: every expression becomes a single
//! fraction of multivariate polynomials, fully combined and deterministically
//! ordered, so that symbolic equality is a structural comparison.

use crate::algebra::{
    expr::{Expression, Symbol},
    poly::{Monomial, Poly},
    BinaryOperation,
};
use num_rational::BigRational;
use num_traits::{One, Signed};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// A ceiling on how large a normalized expression may grow.
///
/// Symbolic normalization can blow up without bound on adversarial input
/// (think `(x + 1)^9999`); runs that cross the ceiling abort with
/// [`NormalizeError::TermLimitExceeded`] instead of spinning forever.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Limits {
    /// Maximum number of terms allowed in a numerator or denominator.
    pub max_terms: usize,
}

impl Default for Limits {
    fn default() -> Self { Limits { max_terms: 10_000 } }
}

/// Things that can go wrong while normalizing an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// The expression divides by something that simplifies to zero.
    DivisionByZero,
    /// An intermediate result grew past [`Limits::max_terms`].
    TermLimitExceeded { limit: usize },
}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::DivisionByZero => {
                write!(f, "the expression divides by zero")
            },
            NormalizeError::TermLimitExceeded { limit } => write!(
                f,
                "the expression grew past the {} term complexity limit",
                limit
            ),
        }
    }
}

impl Error for NormalizeError {}

/// Normalize an expression with the default [`Limits`].
///
/// The result is fully simplified and combined over a single common
/// denominator, with terms rendered in a fixed canonical order. Idempotent:
/// normalizing a normalized expression returns it unchanged.
pub fn normalize(expr: &Expression) -> Result<Expression, NormalizeError> {
    normalize_within(expr, &Limits::default())
}

/// Normalize an expression, aborting if it grows past `limits`.
pub fn normalize_within(
    expr: &Expression,
    limits: &Limits,
) -> Result<Expression, NormalizeError> {
    Ok(NormalForm::from_expression(expr, limits)?.to_expression())
}

/// Are two expressions equal after normalization?
///
/// Expressions that fail to normalize compare unequal to everything.
pub fn equals(a: &Expression, b: &Expression) -> bool {
    match (normalize(a), normalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// A rational function `num/den` in canonical form.
///
/// Invariants: `den` is never zero; the polynomial GCD of `num` and `den` is
/// cancelled; `den` is `1` whenever it is constant; otherwise `den` is monic
/// under the graded-lex term order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalForm {
    num: Poly,
    den: Poly,
}

impl NormalForm {
    pub fn from_expression(
        expr: &Expression,
        limits: &Limits,
    ) -> Result<Self, NormalizeError> {
        match expr {
            Expression::Number(value) => Ok(NormalForm {
                num: Poly::constant(value.clone()),
                den: Poly::one(),
            }),
            Expression::Symbol(symbol) => Ok(NormalForm {
                num: Poly::variable(symbol.clone()),
                den: Poly::one(),
            }),
            Expression::Negate(inner) => {
                let inner = NormalForm::from_expression(inner, limits)?;
                Ok(NormalForm {
                    num: inner.num.neg(),
                    den: inner.den,
                })
            },
            Expression::Binary { left, right, op } => {
                let left = NormalForm::from_expression(left, limits)?;
                let right = NormalForm::from_expression(right, limits)?;

                match op {
                    BinaryOperation::Plus => left.add(&right, limits),
                    BinaryOperation::Minus => left.sub(&right, limits),
                    BinaryOperation::Times => left.mul(&right, limits),
                    BinaryOperation::Divide => left.div(&right, limits),
                }
            },
            Expression::Power { base, exponent } => {
                NormalForm::from_expression(base, limits)?
                    .pow(*exponent, limits)
            },
        }
    }

    fn one() -> Self {
        NormalForm {
            num: Poly::one(),
            den: Poly::one(),
        }
    }

    fn add(&self, other: &Self, limits: &Limits) -> Result<Self, NormalizeError> {
        reduced(
            self.num.mul(&other.den).add(&other.num.mul(&self.den)),
            self.den.mul(&other.den),
            limits,
        )
    }

    fn sub(&self, other: &Self, limits: &Limits) -> Result<Self, NormalizeError> {
        reduced(
            self.num.mul(&other.den).sub(&other.num.mul(&self.den)),
            self.den.mul(&other.den),
            limits,
        )
    }

    fn mul(&self, other: &Self, limits: &Limits) -> Result<Self, NormalizeError> {
        reduced(
            self.num.mul(&other.num),
            self.den.mul(&other.den),
            limits,
        )
    }

    fn div(&self, other: &Self, limits: &Limits) -> Result<Self, NormalizeError> {
        reduced(
            self.num.mul(&other.den),
            self.den.mul(&other.num),
            limits,
        )
    }

    fn pow(&self, exponent: i32, limits: &Limits) -> Result<Self, NormalizeError> {
        if exponent == 0 {
            return Ok(NormalForm::one());
        }

        let base = if exponent < 0 {
            // 1/self, re-reduced so the denominator invariants hold
            reduced(self.den.clone(), self.num.clone(), limits)?
        } else {
            self.clone()
        };

        let mut result = NormalForm::one();
        for _ in 0..exponent.abs() {
            result = result.mul(&base, limits)?;
        }

        Ok(result)
    }

    /// Rebuild a canonical AST: terms in descending graded-lex order,
    /// subtraction for negative coefficients, `num/den` only when the
    /// denominator is not `1`.
    pub fn to_expression(&self) -> Expression {
        if self.den.is_one() {
            poly_to_expression(&self.num)
        } else {
            poly_to_expression(&self.num) / poly_to_expression(&self.den)
        }
    }
}

/// Put a raw `num/den` pair into canonical form.
fn reduced(
    num: Poly,
    den: Poly,
    limits: &Limits,
) -> Result<NormalForm, NormalizeError> {
    if den.is_zero() {
        return Err(NormalizeError::DivisionByZero);
    }

    if num.is_zero() {
        return Ok(NormalForm {
            num,
            den: Poly::one(),
        });
    }

    // cancel the monomial content the two sides share
    let shared = num.content().gcd(&den.content());
    let (num, den) = if shared.is_one() {
        (num, den)
    } else {
        (num.div_content(&shared), den.div_content(&shared))
    };

    // cancel the full polynomial GCD
    let (num, den) = if den.constant_value().is_some() {
        (num, den)
    } else {
        let common = num.gcd(&den);
        if common.constant_value().is_some() {
            (num, den)
        } else {
            (
                num.exact_div(&common)
                    .expect("The GCD divides the numerator"),
                den.exact_div(&common)
                    .expect("The GCD divides the denominator"),
            )
        }
    };

    let form = if let Some(value) = den.constant_value() {
        NormalForm {
            num: num.scale(&value.recip()),
            den: Poly::one(),
        }
    } else {
        // coprime by now: settle for a monic denominator
        let leading = den
            .leading()
            .expect("A non-constant polynomial has a leading term")
            .1
            .clone();
        let inverse = leading.recip();
        NormalForm {
            num: num.scale(&inverse),
            den: den.scale(&inverse),
        }
    };

    if form.num.term_count() > limits.max_terms
        || form.den.term_count() > limits.max_terms
    {
        return Err(NormalizeError::TermLimitExceeded {
            limit: limits.max_terms,
        });
    }

    Ok(form)
}

fn poly_to_expression(poly: &Poly) -> Expression {
    let mut sum: Option<Expression> = None;

    for (monomial, coefficient) in poly.terms().rev() {
        let positive = coefficient.is_positive();
        let term = term_expression(monomial, &coefficient.abs());

        sum = Some(match (sum, positive) {
            (None, true) => term,
            (None, false) => -term,
            (Some(sum), true) => sum + term,
            (Some(sum), false) => sum - term,
        });
    }

    sum.unwrap_or_else(|| Expression::integer(0))
}

/// `coefficient * symbol^exp * ...` for a positive coefficient, left-nested.
fn term_expression(
    monomial: &Monomial,
    coefficient: &BigRational,
) -> Expression {
    let mut factors = monomial.iter().map(|(symbol, exponent)| {
        symbol_power(symbol.clone(), exponent)
    });

    let mut term = if coefficient.is_one() {
        match factors.next() {
            Some(first) => first,
            None => return Expression::Number(coefficient.clone()),
        }
    } else {
        Expression::Number(coefficient.clone())
    };

    for factor in factors {
        term = term * factor;
    }

    term
}

fn symbol_power(symbol: Symbol, exponent: u32) -> Expression {
    if exponent == 1 {
        Expression::Symbol(symbol)
    } else {
        Expression::Power {
            base: Box::new(Expression::Symbol(symbol)),
            exponent: exponent as i32,
        }
    }
}
