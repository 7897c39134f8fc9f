//! Multivariate polynomials over the rationals, the representation behind
//! the canonical "single fraction" form.

use crate::algebra::expr::Symbol;
use num_rational::BigRational;
use num_traits::Zero;
use std::{cmp::Ordering, collections::BTreeMap};

/// A product of symbols raised to positive integer powers, e.g. `x^2*y`.
///
/// Ordered by graded lexicographic order: higher total degree first, ties
/// broken by the exponent on the alphabetically-earliest symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Monomial {
    // invariant: no zero exponents are stored
    exponents: BTreeMap<Symbol, u32>,
}

impl Monomial {
    pub fn one() -> Self {
        Monomial {
            exponents: BTreeMap::new(),
        }
    }

    pub fn variable(symbol: Symbol) -> Self {
        let mut exponents = BTreeMap::new();
        exponents.insert(symbol, 1);
        Monomial { exponents }
    }

    pub fn is_one(&self) -> bool { self.exponents.is_empty() }

    pub fn degree(&self) -> u64 {
        self.exponents.values().map(|&e| u64::from(e)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, u32)> + '_ {
        self.exponents.iter().map(|(symbol, &exp)| (symbol, exp))
    }

    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut exponents = self.exponents.clone();

        for (symbol, exp) in other.iter() {
            *exponents.entry(symbol.clone()).or_insert(0) += exp;
        }

        Monomial { exponents }
    }

    /// Split off the exponent carried by one symbol.
    fn split(&self, symbol: &Symbol) -> (u32, Monomial) {
        let mut exponents = self.exponents.clone();
        let exponent = exponents.remove(symbol).unwrap_or(0);
        (exponent, Monomial { exponents })
    }

    /// `self / other`, or `None` when some exponent would go negative.
    pub fn try_div(&self, other: &Monomial) -> Option<Monomial> {
        let mut exponents = self.exponents.clone();

        for (symbol, exp) in other.iter() {
            let remaining = exponents.get_mut(symbol)?;
            if *remaining < exp {
                return None;
            }
            *remaining -= exp;
            if *remaining == 0 {
                exponents.remove(symbol);
            }
        }

        Some(Monomial { exponents })
    }

    /// The variable-wise minimum of two monomials.
    pub fn gcd(&self, other: &Monomial) -> Monomial {
        let mut exponents = BTreeMap::new();

        for (symbol, exp) in self.iter() {
            if let Some(&other_exp) = other.exponents.get(symbol) {
                exponents.insert(symbol.clone(), exp.min(other_exp));
            }
        }

        Monomial { exponents }
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Monomial {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.degree().cmp(&other.degree()) {
            Ordering::Equal => {},
            unequal => return unequal,
        }

        // equal degree: a higher exponent on an earlier symbol wins
        let mut lhs = self.exponents.iter().peekable();
        let mut rhs = other.exponents.iter().peekable();

        loop {
            match (lhs.peek(), rhs.peek()) {
                (None, None) => return Ordering::Equal,
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (Some((left, _)), Some((right, _))) if left < right => {
                    return Ordering::Greater
                },
                (Some((left, _)), Some((right, _))) if left > right => {
                    return Ordering::Less
                },
                (Some((_, left)), Some((_, right))) if left != right => {
                    return left.cmp(right)
                },
                _ => {
                    lhs.next();
                    rhs.next();
                },
            }
        }
    }
}

/// A multivariate polynomial with exact rational coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Poly {
    // invariant: no zero coefficients are stored
    terms: BTreeMap<Monomial, BigRational>,
}

impl Poly {
    pub fn zero() -> Self {
        Poly {
            terms: BTreeMap::new(),
        }
    }

    pub fn one() -> Self {
        Poly::constant(num_traits::One::one())
    }

    pub fn constant(value: BigRational) -> Self {
        let mut poly = Poly::zero();
        poly.add_term(Monomial::one(), value);
        poly
    }

    pub fn variable(symbol: Symbol) -> Self {
        let mut poly = Poly::zero();
        poly.add_term(Monomial::variable(symbol), num_traits::One::one());
        poly
    }

    pub fn term(monomial: Monomial, coefficient: BigRational) -> Self {
        let mut poly = Poly::zero();
        poly.add_term(monomial, coefficient);
        poly
    }

    pub fn is_zero(&self) -> bool { self.terms.is_empty() }

    pub fn is_one(&self) -> bool {
        match self.constant_value() {
            Some(value) => num_traits::One::is_one(&value),
            None => false,
        }
    }

    /// The value of a constant polynomial, `None` when any symbol appears.
    pub fn constant_value(&self) -> Option<BigRational> {
        match self.terms.len() {
            0 => Some(BigRational::zero()),
            1 => {
                let (monomial, coefficient) = self
                    .terms
                    .iter()
                    .next()
                    .expect("There is exactly one term");
                if monomial.is_one() {
                    Some(coefficient.clone())
                } else {
                    None
                }
            },
            _ => None,
        }
    }

    pub fn term_count(&self) -> usize { self.terms.len() }

    /// Terms in ascending monomial order.
    pub fn terms(
        &self,
    ) -> impl DoubleEndedIterator<Item = (&Monomial, &BigRational)> + '_ {
        self.terms.iter()
    }

    /// The greatest term under the monomial order.
    pub fn leading(&self) -> Option<(&Monomial, &BigRational)> {
        self.terms.iter().next_back()
    }

    fn add_term(&mut self, monomial: Monomial, coefficient: BigRational) {
        if coefficient.is_zero() {
            return;
        }

        let updated = match self.terms.get(&monomial) {
            Some(existing) => existing + &coefficient,
            None => coefficient,
        };

        if updated.is_zero() {
            self.terms.remove(&monomial);
        } else {
            self.terms.insert(monomial, updated);
        }
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let mut sum = self.clone();
        for (monomial, coefficient) in other.terms() {
            sum.add_term(monomial.clone(), coefficient.clone());
        }
        sum
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        let mut difference = self.clone();
        for (monomial, coefficient) in other.terms() {
            difference.add_term(monomial.clone(), -coefficient.clone());
        }
        difference
    }

    pub fn neg(&self) -> Poly {
        let mut negated = Poly::zero();
        for (monomial, coefficient) in self.terms() {
            negated.add_term(monomial.clone(), -coefficient.clone());
        }
        negated
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        let mut product = Poly::zero();

        for (left_monomial, left_coefficient) in self.terms() {
            for (right_monomial, right_coefficient) in other.terms() {
                product.add_term(
                    left_monomial.mul(right_monomial),
                    left_coefficient * right_coefficient,
                );
            }
        }

        product
    }

    /// Multiply every coefficient by a non-zero rational.
    pub fn scale(&self, factor: &BigRational) -> Poly {
        debug_assert!(!factor.is_zero());

        let mut scaled = Poly::zero();
        for (monomial, coefficient) in self.terms() {
            scaled.add_term(monomial.clone(), coefficient * factor);
        }
        scaled
    }

    /// `self / divisor` when the division is exact, `None` otherwise.
    ///
    /// Repeated leading-term division; the remainder's leading monomial
    /// strictly decreases every round, so the loop terminates.
    pub fn exact_div(&self, divisor: &Poly) -> Option<Poly> {
        let (divisor_monomial, divisor_coefficient) = match divisor.leading() {
            Some(leading) => (leading.0.clone(), leading.1.clone()),
            None => return None,
        };

        let mut remainder = self.clone();
        let mut quotient = Poly::zero();

        while let Some((monomial, coefficient)) = remainder.leading() {
            let quotient_monomial = monomial.try_div(&divisor_monomial)?;
            let quotient_coefficient = coefficient / &divisor_coefficient;

            let term = Poly::term(quotient_monomial, quotient_coefficient);
            remainder = remainder.sub(&term.mul(divisor));
            quotient = quotient.add(&term);
        }

        Some(quotient)
    }

    /// The monomial dividing every term, e.g. `x` for `x^2 + x*y`.
    pub fn content(&self) -> Monomial {
        let mut monomials = self.terms.keys();

        let first = match monomials.next() {
            Some(monomial) => monomial.clone(),
            None => return Monomial::one(),
        };

        monomials.fold(first, |gcd, monomial| gcd.gcd(monomial))
    }

    /// Divide every term by a monomial known to divide the whole polynomial.
    pub fn div_content(&self, content: &Monomial) -> Poly {
        let mut quotient = Poly::zero();

        for (monomial, coefficient) in self.terms() {
            let reduced = monomial
                .try_div(content)
                .expect("The content divides every term");
            quotient.add_term(reduced, coefficient.clone());
        }

        quotient
    }

    /// The greatest common divisor of two polynomials, up to a constant
    /// factor.
    ///
    /// Primitive Euclidean algorithm: view both polynomials as univariate in
    /// one of their symbols with polynomial coefficients, split off the
    /// coefficient contents (recursing into the remaining symbols), and run
    /// a pseudo-remainder sequence on the primitive parts.
    pub fn gcd(&self, other: &Poly) -> Poly {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }

        let symbol = match self
            .first_symbol()
            .or_else(|| other.first_symbol())
        {
            Some(symbol) => symbol,
            // two non-zero constants only share units
            None => return Poly::one(),
        };

        let lhs = self.univariate_in(&symbol);
        let rhs = other.univariate_in(&symbol);

        let lhs_content = uni_content(&lhs);
        let rhs_content = uni_content(&rhs);
        let shared_content = lhs_content.gcd(&rhs_content);

        let primitive = primitive_gcd(
            uni_divide(&lhs, &lhs_content),
            uni_divide(&rhs, &rhs_content),
        );

        from_univariate(primitive, &symbol).mul(&shared_content)
    }

    fn first_symbol(&self) -> Option<Symbol> {
        self.terms
            .keys()
            .flat_map(|monomial| {
                monomial.iter().map(|(symbol, _)| symbol.clone())
            })
            .min()
    }

    /// View of the polynomial as univariate in `symbol`, exponent to
    /// coefficient, where the coefficients live in the remaining symbols.
    fn univariate_in(&self, symbol: &Symbol) -> UniPoly {
        let mut coefficients = UniPoly::new();

        for (monomial, coefficient) in self.terms() {
            let (exponent, rest) = monomial.split(symbol);
            coefficients
                .entry(exponent)
                .or_insert_with(Poly::zero)
                .add_term(rest, coefficient.clone());
        }

        coefficients
    }
}

/// A polynomial viewed as univariate in some agreed-upon symbol.
///
/// Invariant: no zero coefficients are stored.
type UniPoly = BTreeMap<u32, Poly>;

fn uni_degree(p: &UniPoly) -> u32 {
    p.keys().next_back().copied().unwrap_or(0)
}

/// The GCD of all the coefficients.
fn uni_content(p: &UniPoly) -> Poly {
    let mut coefficients = p.values();

    let first = match coefficients.next() {
        Some(coefficient) => coefficient.clone(),
        None => return Poly::one(),
    };

    coefficients.fold(first, |gcd, coefficient| gcd.gcd(coefficient))
}

/// Divide every coefficient by a polynomial known to divide them all.
fn uni_divide(p: &UniPoly, divisor: &Poly) -> UniPoly {
    if divisor.is_one() {
        return p.clone();
    }

    p.iter()
        .map(|(&exponent, coefficient)| {
            let quotient = coefficient
                .exact_div(divisor)
                .expect("The content divides every coefficient");
            (exponent, quotient)
        })
        .collect()
}

fn uni_scale(p: &UniPoly, factor: &Poly) -> UniPoly {
    p.iter()
        .map(|(&exponent, coefficient)| (exponent, coefficient.mul(factor)))
        .collect()
}

fn uni_shift(p: &UniPoly, by: u32) -> UniPoly {
    p.iter()
        .map(|(&exponent, coefficient)| (exponent + by, coefficient.clone()))
        .collect()
}

fn uni_sub(a: &UniPoly, b: &UniPoly) -> UniPoly {
    let mut difference = a.clone();

    for (&exponent, coefficient) in b {
        let updated = match difference.get(&exponent) {
            Some(existing) => existing.sub(coefficient),
            None => coefficient.neg(),
        };

        if updated.is_zero() {
            difference.remove(&exponent);
        } else {
            difference.insert(exponent, updated);
        }
    }

    difference
}

/// The pseudo-remainder of `a` by a non-zero `b`.
///
/// Each round replaces `a` with `lc(b)*a - lc(a)*x^(deg a - deg b)*b`; the
/// leading terms cancel exactly, so the degree strictly decreases.
fn pseudo_remainder(a: &UniPoly, b: &UniPoly) -> UniPoly {
    let divisor_degree = uni_degree(b);
    let divisor_lead = b[&divisor_degree].clone();

    let mut remainder = a.clone();

    while !remainder.is_empty() {
        let degree = uni_degree(&remainder);
        if degree < divisor_degree {
            break;
        }

        let lead = remainder[&degree].clone();
        remainder = uni_sub(
            &uni_scale(&remainder, &divisor_lead),
            &uni_shift(&uni_scale(b, &lead), degree - divisor_degree),
        );
    }

    remainder
}

/// Euclid's algorithm on primitive polynomials, re-primitivizing each
/// pseudo-remainder.
fn primitive_gcd(mut a: UniPoly, mut b: UniPoly) -> UniPoly {
    loop {
        if b.is_empty() {
            return a;
        }

        if uni_degree(&a) < uni_degree(&b) {
            std::mem::swap(&mut a, &mut b);
            continue;
        }

        let remainder = pseudo_remainder(&a, &b);
        let remainder = uni_divide(&remainder, &uni_content(&remainder));
        a = b;
        b = remainder;
    }
}

fn from_univariate(coefficients: UniPoly, symbol: &Symbol) -> Poly {
    let mut poly = Poly::zero();

    for (exponent, coefficient) in coefficients {
        let mut exponents = BTreeMap::new();
        if exponent > 0 {
            exponents.insert(symbol.clone(), exponent);
        }
        let power = Monomial { exponents };

        for (monomial, value) in coefficient.terms() {
            poly.add_term(power.mul(monomial), value.clone());
        }
    }

    poly
}
