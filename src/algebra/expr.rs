use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed;
use smol_str::SmolStr;
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    ops::{Add, Div, Mul, Neg, Sub},
    str::FromStr,
};

/// A name appearing in an expression - an unknown or a free parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(SmolStr);

impl Symbol {
    pub fn named<S: Into<SmolStr>>(name: S) -> Self { Symbol(name.into()) }

    pub fn as_str(&self) -> &str { self.0.as_str() }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A symbolic expression over exact rational numbers and named symbols.
///
/// Construction (by the parser or by the operator overloads below) never
/// simplifies anything; [`normalize`][crate::algebra::normalize] is always an
/// explicit step.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(BigRational),
    Symbol(Symbol),
    /// An expression involving two operands.
    Binary {
        left: Box<Expression>,
        right: Box<Expression>,
        op: BinaryOperation,
    },
    /// Negate the expression.
    Negate(Box<Expression>),
    /// An integer power of a base expression.
    Power {
        base: Box<Expression>,
        exponent: i32,
    },
}

impl Expression {
    pub fn integer(value: i64) -> Self {
        Expression::Number(BigRational::from_integer(BigInt::from(value)))
    }

    pub fn symbol(name: &str) -> Self {
        Expression::Symbol(Symbol::named(name))
    }

    /// Is this expression the literal number zero?
    ///
    /// A structural check, meaningful on normalized expressions.
    pub fn is_zero(&self) -> bool {
        match self {
            Expression::Number(n) => num_traits::Zero::is_zero(n),
            _ => false,
        }
    }

    /// Is this expression the literal number one?
    pub fn is_one(&self) -> bool {
        match self {
            Expression::Number(n) => num_traits::One::is_one(n),
            _ => false,
        }
    }

    /// Binding strength used when deciding where parentheses are needed.
    fn precedence(&self) -> u8 {
        match self {
            Expression::Number(n) => {
                if n.is_negative() {
                    PREC_NEGATE
                } else if num_traits::One::is_one(n.denom()) {
                    PREC_ATOM
                } else {
                    // a fraction renders as "p/q"
                    PREC_FACTOR
                }
            },
            Expression::Symbol(_) => PREC_ATOM,
            Expression::Binary { op, .. } => op.precedence(),
            Expression::Negate(_) => PREC_NEGATE,
            Expression::Power { .. } => PREC_POWER,
        }
    }
}

const PREC_TERM: u8 = 1;
const PREC_NEGATE: u8 = 2;
const PREC_FACTOR: u8 = 3;
const PREC_POWER: u8 = 4;
const PREC_ATOM: u8 = 5;

/// An operation that can be applied to two arguments.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BinaryOperation {
    Plus,
    Minus,
    Times,
    Divide,
}

impl BinaryOperation {
    fn precedence(self) -> u8 {
        match self {
            BinaryOperation::Plus | BinaryOperation::Minus => PREC_TERM,
            BinaryOperation::Times | BinaryOperation::Divide => PREC_FACTOR,
        }
    }

    /// Does `a op (b op c)` mean something different from `(a op b) op c`?
    fn right_operand_needs_parens(self) -> bool {
        match self {
            BinaryOperation::Minus | BinaryOperation::Divide => true,
            BinaryOperation::Plus | BinaryOperation::Times => false,
        }
    }
}

// define some operator overloads to make constructing an expression easier.

impl Add for Expression {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        Expression::Binary {
            left: Box::new(self),
            right: Box::new(rhs),
            op: BinaryOperation::Plus,
        }
    }
}

impl Sub for Expression {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        Expression::Binary {
            left: Box::new(self),
            right: Box::new(rhs),
            op: BinaryOperation::Minus,
        }
    }
}

impl Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        Expression::Binary {
            left: Box::new(self),
            right: Box::new(rhs),
            op: BinaryOperation::Times,
        }
    }
}

impl Div for Expression {
    type Output = Expression;

    fn div(self, rhs: Expression) -> Expression {
        Expression::Binary {
            left: Box::new(self),
            right: Box::new(rhs),
            op: BinaryOperation::Divide,
        }
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Self::Output { Expression::Negate(Box::new(self)) }
}

impl FromStr for Expression {
    type Err = crate::algebra::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::algebra::parse(s)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(value) => write!(f, "{}", value),
            Expression::Symbol(symbol) => write!(f, "{}", symbol),
            Expression::Binary { left, right, op } => {
                let precedence = op.precedence();
                write_operand(left, precedence, f)?;

                let op_text = match op {
                    BinaryOperation::Plus => " + ",
                    BinaryOperation::Minus => " - ",
                    BinaryOperation::Times => "*",
                    BinaryOperation::Divide => "/",
                };
                write!(f, "{}", op_text)?;

                let right_minimum = if op.right_operand_needs_parens() {
                    precedence + 1
                } else {
                    precedence
                };
                write_operand(right, right_minimum, f)
            },
            Expression::Negate(inner) => {
                write!(f, "-")?;
                write_operand(inner, PREC_FACTOR, f)
            },
            Expression::Power { base, exponent } => {
                write_operand(base, PREC_ATOM, f)?;
                if *exponent < 0 {
                    write!(f, "^({})", exponent)
                } else {
                    write!(f, "^{}", exponent)
                }
            },
        }
    }
}

/// Write a sub-expression, parenthesised when its own binding strength is too
/// weak for the position it appears in.
fn write_operand(
    expr: &Expression,
    minimum: u8,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    if expr.precedence() < minimum {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rational(numer: i64, denom: i64) -> Expression {
        Expression::Number(BigRational::new(
            BigInt::from(numer),
            BigInt::from(denom),
        ))
    }

    #[test]
    fn display() {
        let x = Expression::symbol("x");
        let y = Expression::symbol("y");
        let inputs = vec![
            (Expression::integer(3), "3"),
            (rational(3, 4), "3/4"),
            (Expression::integer(-5), "-5"),
            (-Expression::integer(5), "-5"),
            (x.clone(), "x"),
            (-x.clone(), "-x"),
            (-(x.clone() + Expression::integer(1)), "-(x + 1)"),
            (Expression::integer(1) + Expression::integer(1), "1 + 1"),
            (x.clone() - Expression::integer(1), "x - 1"),
            (Expression::integer(2) * x.clone(), "2*x"),
            (rational(3, 4) * x.clone(), "3/4*x"),
            (Expression::integer(-2) * x.clone(), "(-2)*x"),
            (
                (Expression::integer(1) + Expression::integer(2))
                    / Expression::integer(3),
                "(1 + 2)/3",
            ),
            // a - (b - c) keeps its parentheses
            (
                x.clone() - (y.clone() - Expression::integer(1)),
                "x - (y - 1)",
            ),
            // a/(b*c) keeps its parentheses
            (x.clone() / (y.clone() * Expression::integer(2)), "x/(y*2)"),
            (
                Expression::Power {
                    base: Box::new(x.clone()),
                    exponent: 2,
                },
                "x^2",
            ),
            (
                Expression::Power {
                    base: Box::new(x.clone() + y.clone()),
                    exponent: 3,
                },
                "(x + y)^3",
            ),
            (
                Expression::Power {
                    base: Box::new(rational(3, 4)),
                    exponent: 2,
                },
                "(3/4)^2",
            ),
            (
                Expression::Power {
                    base: Box::new(x.clone()),
                    exponent: -1,
                },
                "x^(-1)",
            ),
            (
                Expression::integer(2) * x.clone() + Expression::integer(3),
                "2*x + 3",
            ),
        ];

        for (expr, should_be) in inputs {
            let got = expr.to_string();
            assert_eq!(got, should_be);
        }
    }

    #[test]
    fn literal_checks_are_structural() {
        assert!(Expression::integer(0).is_zero());
        assert!(Expression::integer(1).is_one());
        assert!(!Expression::symbol("x").is_zero());
        // an unnormalized zero is not the literal zero
        let zero_in_disguise =
            Expression::symbol("x") - Expression::symbol("x");
        assert!(!zero_in_disguise.is_zero());
    }

    #[test]
    fn symbols_order_by_name() {
        let mut symbols = vec![
            Symbol::named("y"),
            Symbol::named("a"),
            Symbol::named("x"),
        ];
        symbols.sort();

        let names: Vec<_> = symbols.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["a", "x", "y"]);
    }
}
