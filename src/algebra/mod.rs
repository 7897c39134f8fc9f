//! The symbolic algebra system.

mod expr;
mod normal;
mod parse;
mod poly;

pub use expr::{BinaryOperation, Expression, Symbol};
pub use normal::{
    equals, normalize, normalize_within, Limits, NormalizeError,
};
pub use parse::{parse, ParseError, TokenKind};
