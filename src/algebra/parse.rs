use crate::algebra::{BinaryOperation, Expression, Symbol};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::One;
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    iter::Peekable,
    ops::Range,
};

/// Parse an [`Expression`] tree from some text.
///
/// Whitespace around the input is ignored and the empty string parses to the
/// additive identity, `0`, matching how an empty form field is treated.
pub fn parse(s: &str) -> Result<Expression, ParseError> {
    let s = s.trim();

    if s.is_empty() {
        return Ok(Expression::integer(0));
    }

    Parser::new(s).parse()
}

/// A simple recursive descent parser for converting a string into an
/// expression tree.
///
/// The grammar:
///
/// ```text
/// expression := term (("+" | "-") term)*
///
/// term       := factor (("*" | "/") factor)*
///
/// factor     := "-" factor
///             | power
///
/// power      := atom ("^" exponent)?
///
/// atom       := IDENTIFIER
///             | NUMBER
///             | "(" expression ")"
///
/// exponent   := "(" "-"? INTEGER ")"
///             | "-"? INTEGER
/// ```
///
/// `+`, `-`, `*` and `/` chains associate to the left. Exponents are integer
/// literals because the engine works in the field of rational functions,
/// where a symbolic exponent has no meaning.
#[derive(Debug, Clone)]
pub(crate) struct Parser<'a> {
    tokens: Peekable<Tokens<'a>>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Parser {
            tokens: Tokens::new(src).peekable(),
        }
    }

    pub(crate) fn parse(mut self) -> Result<Expression, ParseError> {
        let expr = self.expression()?;

        match self.tokens.next() {
            None => Ok(expr),
            Some(Ok(Token { kind, span, .. })) => {
                Err(ParseError::UnexpectedToken {
                    found: kind,
                    span,
                    expected: &[],
                })
            },
            Some(Err(e)) => Err(e),
        }
    }

    fn peek(&mut self) -> Option<TokenKind> {
        self.tokens
            .peek()
            .and_then(|result| result.as_ref().ok())
            .map(|tok| tok.kind)
    }

    fn advance(&mut self) -> Result<Token<'a>, ParseError> {
        match self.tokens.next() {
            Some(result) => result,
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.term()?;

        while let Some(kind) = self.peek() {
            let op = match kind {
                TokenKind::Plus => BinaryOperation::Plus,
                TokenKind::Minus => BinaryOperation::Minus,
                _ => break,
            };
            let _ = self.advance()?;
            let right = self.term()?;
            left = Expression::Binary {
                left: Box::new(left),
                right: Box::new(right),
                op,
            };
        }

        Ok(left)
    }

    fn term(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.factor()?;

        while let Some(kind) = self.peek() {
            let op = match kind {
                TokenKind::Times => BinaryOperation::Times,
                TokenKind::Divide => BinaryOperation::Divide,
                _ => break,
            };
            let _ = self.advance()?;
            let right = self.factor()?;
            left = Expression::Binary {
                left: Box::new(left),
                right: Box::new(right),
                op,
            };
        }

        Ok(left)
    }

    fn factor(&mut self) -> Result<Expression, ParseError> {
        if self.peek() == Some(TokenKind::Minus) {
            let _ = self.advance()?;
            let operand = self.factor()?;
            return Ok(Expression::Negate(Box::new(operand)));
        }

        self.power()
    }

    fn power(&mut self) -> Result<Expression, ParseError> {
        let base = self.atom()?;

        if self.peek() == Some(TokenKind::Caret) {
            let _ = self.advance()?;
            let exponent = self.exponent()?;
            return Ok(Expression::Power {
                base: Box::new(base),
                exponent,
            });
        }

        Ok(base)
    }

    fn atom(&mut self) -> Result<Expression, ParseError> {
        let expected = &[
            TokenKind::Number,
            TokenKind::Identifier,
            TokenKind::OpenParen,
        ];

        match self.peek() {
            Some(TokenKind::Number) => {
                let token = self.advance()?;
                return Ok(Expression::Number(number_from_token(&token)));
            },
            Some(TokenKind::Identifier) => {
                let token = self.advance()?;
                return Ok(Expression::Symbol(Symbol::named(token.text)));
            },
            Some(TokenKind::OpenParen) => {
                let _ = self.advance()?;
                let expr = self.expression()?;
                let close_paren = self.advance()?;

                if close_paren.kind == TokenKind::CloseParen {
                    return Ok(expr);
                } else {
                    return Err(ParseError::UnexpectedToken {
                        found: close_paren.kind,
                        span: close_paren.span,
                        expected: &[TokenKind::CloseParen],
                    });
                }
            },
            _ => {},
        }

        // we couldn't parse the atom, return a nice error
        match self.tokens.next() {
            Some(Ok(Token { span, kind, .. })) => {
                Err(ParseError::UnexpectedToken {
                    found: kind,
                    expected,
                    span,
                })
            },
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }

    /// An optionally negated integer literal, possibly parenthesised the way
    /// [`Display`] writes negative exponents (`x^(-1)`).
    fn exponent(&mut self) -> Result<i32, ParseError> {
        if self.peek() == Some(TokenKind::OpenParen) {
            let _ = self.advance()?;
            let value = self.signed_exponent()?;
            let close_paren = self.advance()?;

            if close_paren.kind != TokenKind::CloseParen {
                return Err(ParseError::UnexpectedToken {
                    found: close_paren.kind,
                    span: close_paren.span,
                    expected: &[TokenKind::CloseParen],
                });
            }

            return Ok(value);
        }

        self.signed_exponent()
    }

    fn signed_exponent(&mut self) -> Result<i32, ParseError> {
        let negative = if self.peek() == Some(TokenKind::Minus) {
            let _ = self.advance()?;
            true
        } else {
            false
        };

        let token = self.advance()?;

        if token.kind != TokenKind::Number {
            return Err(ParseError::UnexpectedToken {
                found: token.kind,
                span: token.span,
                expected: &[TokenKind::Number],
            });
        }

        match integer_exponent(token.text) {
            Some(value) if negative => Ok(-value),
            Some(value) => Ok(value),
            None => Err(ParseError::NonIntegerExponent {
                text: token.text.to_string(),
                span: token.span,
            }),
        }
    }
}

/// Convert a `Number` token into an exact rational, turning a decimal like
/// `3.14` into `157/50`.
fn number_from_token(token: &Token<'_>) -> BigRational {
    debug_assert_eq!(token.kind, TokenKind::Number);

    let (integral, fractional) = match token.text.find('.') {
        Some(index) => (&token.text[..index], &token.text[index + 1..]),
        None => (token.text, ""),
    };

    let mut numer: BigInt = integral
        .parse()
        .expect("Guaranteed to be digits by the lexer");
    let mut denom = BigInt::one();

    for digit in fractional.chars() {
        let value = digit.to_digit(10).expect("Guaranteed by the lexer");
        numer = numer * 10 + BigInt::from(value);
        denom *= 10;
    }

    BigRational::new(numer, denom)
}

fn integer_exponent(text: &str) -> Option<i32> {
    let rational = number_from_token(&Token {
        text,
        span: 0..text.len(),
        kind: TokenKind::Number,
    });

    if !rational.is_integer() {
        return None;
    }

    rational.numer().to_string().parse().ok()
}

/// Possible errors that may occur while parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    InvalidCharacter {
        character: char,
        index: usize,
    },
    UnexpectedEndOfInput,
    UnexpectedToken {
        found: TokenKind,
        span: Range<usize>,
        expected: &'static [TokenKind],
    },
    NonIntegerExponent {
        text: String,
        span: Range<usize>,
    },
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidCharacter { character, index } => {
                write!(f, "invalid character {:?} at offset {}", character, index)
            },
            ParseError::UnexpectedEndOfInput => {
                write!(f, "unexpected end of input")
            },
            ParseError::UnexpectedToken {
                found,
                span,
                expected,
            } => {
                write!(f, "unexpected {:?} at offset {}", found, span.start)?;
                if !expected.is_empty() {
                    let names: Vec<_> =
                        expected.iter().map(|kind| format!("{:?}", kind)).collect();
                    write!(f, " (expected {})", names.join(" or "))?;
                }
                Ok(())
            },
            ParseError::NonIntegerExponent { text, .. } => {
                write!(f, "\"{}\" is not a valid integer exponent", text)
            },
        }
    }
}

impl Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
struct Tokens<'a> {
    src: &'a str,
    cursor: usize,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self { Tokens { src, cursor: 0 } }

    fn rest(&self) -> &'a str { &self.src[self.cursor..] }

    fn peek(&self) -> Option<char> { self.rest().chars().next() }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    fn chomp(
        &mut self,
        kind: TokenKind,
    ) -> Option<Result<Token<'a>, ParseError>> {
        let start = self.cursor;
        self.advance()?;
        let end = self.cursor;

        let tok = Token {
            text: &self.src[start..end],
            span: start..end,
            kind,
        };

        Some(Ok(tok))
    }

    fn take_while<P>(
        &mut self,
        mut predicate: P,
    ) -> Option<(&'a str, Range<usize>)>
    where
        P: FnMut(char) -> bool,
    {
        let start = self.cursor;

        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }

            self.advance();
        }

        let end = self.cursor;

        if start != end {
            let text = &self.src[start..end];
            Some((text, start..end))
        } else {
            None
        }
    }

    fn chomp_integer(&mut self) -> &'a str {
        let (text, _) = self.take_while(|c| c.is_ascii_digit()).unwrap();
        text
    }

    fn chomp_number(&mut self) -> Token<'a> {
        let start = self.cursor;
        self.chomp_integer();

        if self.peek() == Some('.') {
            // skip past the decimal
            self.advance();

            let digits_to_go =
                self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false);
            if digits_to_go {
                self.chomp_integer();
            }
        }

        let end = self.cursor;

        Token::from_text(self.src, start..end, TokenKind::Number)
    }

    fn chomp_identifier(&mut self) -> Token<'a> {
        let mut seen_first_character = false;

        let (_, span) = self
            .take_while(|c| {
                if seen_first_character {
                    c.is_alphanumeric() || c == '_'
                } else {
                    seen_first_character = true;
                    c.is_alphabetic() || c == '_'
                }
            })
            .expect("We know there should be at least 1 character");

        Token::from_text(self.src, span, TokenKind::Identifier)
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            return match self.peek()? {
                space if space.is_whitespace() => {
                    self.advance();
                    continue;
                },
                '(' => self.chomp(TokenKind::OpenParen),
                ')' => self.chomp(TokenKind::CloseParen),
                '+' => self.chomp(TokenKind::Plus),
                '-' => self.chomp(TokenKind::Minus),
                '*' => self.chomp(TokenKind::Times),
                '/' => self.chomp(TokenKind::Divide),
                '^' => self.chomp(TokenKind::Caret),
                '_' | 'a'..='z' | 'A'..='Z' => {
                    Some(Ok(self.chomp_identifier()))
                },
                '0'..='9' => Some(Ok(self.chomp_number())),
                other => Some(Err(ParseError::InvalidCharacter {
                    character: other,
                    index: self.cursor,
                })),
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token<'a> {
    text: &'a str,
    span: Range<usize>,
    kind: TokenKind,
}

impl<'a> Token<'a> {
    fn from_text(
        src: &'a str,
        span: Range<usize>,
        kind: TokenKind,
    ) -> Self {
        Token {
            text: &src[span.clone()],
            span,
            kind,
        }
    }
}

/// The kinds of token that can appear in an [`Expression`]'s text form.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TokenKind {
    Identifier,
    Number,
    OpenParen,
    CloseParen,
    Plus,
    Minus,
    Times,
    Divide,
    Caret,
}


#[cfg(test)]
mod parser_tests {
    use super::*;

    macro_rules! parser_test {
        ($name:ident, $src:expr) => {
            parser_test!($name, $src, $src);
        };
        ($name:ident, $src:expr, $should_be:expr) => {
            #[test]
            fn $name() {
                let got = parse($src).unwrap();

                let round_tripped = got.to_string();
                assert_eq!(round_tripped, $should_be);
            }
        };
    }

    parser_test!(simple_integer, "1");
    parser_test!(one_plus_one, "1 + 1");
    parser_test!(one_plus_one_times_three, "1 + 1*3");
    parser_test!(one_plus_one_all_times_three, "(1 + 1)*3");
    parser_test!(negative_one, "-1");
    parser_test!(negative_one_plus_x, "-1 + x");
    parser_test!(number_in_parens, "(1)", "1");
    parser_test!(x_squared, "x^2");
    parser_test!(whole_sum_squared, "(x + y)^2");
    parser_test!(negative_exponent, "x^(-1)");
    parser_test!(empty_input_is_zero, "", "0");
    parser_test!(blank_input_is_zero, "   ", "0");
    parser_test!(decimal_is_exact, "3.14", "157/50");

    #[test]
    fn sums_and_quotients_associate_left() {
        let inputs = vec![
            // (1 - 2) - 3, not 1 - (2 - 3)
            ("1 - 2 - 3", "1 - 2 - 3"),
            ("8/4/2", "8/4/2"),
            ("a - b + c", "a - b + c"),
            ("3/4*x", "3/4*x"),
        ];

        for (src, should_be) in inputs {
            let got = parse(src).unwrap();
            assert_eq!(got.to_string(), should_be);
        }

        // the shape, not just the rendering: 1 - 2 - 3 = (1 - 2) - 3
        let got = parse("1 - 2 - 3").unwrap();
        let should_be = (Expression::integer(1) - Expression::integer(2))
            - Expression::integer(3);
        assert_eq!(got, should_be);
    }

    #[test]
    fn power_binds_tighter_than_unary_minus() {
        let got = parse("-x^2").unwrap();
        let should_be = -Expression::Power {
            base: Box::new(Expression::symbol("x")),
            exponent: 2,
        };
        assert_eq!(got, should_be);
    }

    #[test]
    fn symbolic_exponents_are_rejected() {
        let err = parse("x^y").unwrap_err();
        match err {
            ParseError::UnexpectedToken { found, .. } => {
                assert_eq!(found, TokenKind::Identifier)
            },
            other => panic!("Expected UnexpectedToken, got {:?}", other),
        }
    }

    #[test]
    fn trailing_input_is_an_error() {
        assert!(parse("1 1").is_err());
        assert!(parse("x )").is_err());
    }

    #[test]
    fn invalid_characters_are_reported_with_their_offset() {
        let err = parse("x + $").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidCharacter {
                character: '$',
                index: 4,
            }
        );
    }
}
